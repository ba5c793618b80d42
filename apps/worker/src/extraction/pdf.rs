use super::ExtractionError;

/// Text layer of a PDF held in memory. Line cleanup happens in the caller.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractionError::Pdf("missing %PDF header".to_string()));
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
}
