use std::io::{Cursor, Read};

use roxmltree::{Document, Node};
use zip::ZipArchive;

use super::ExtractionError;

const BODY_PART: &str = "word/document.xml";

/// Text of a `.docx`: header and footer lines first (each distinct line once),
/// then one line per body paragraph.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a valid ZIP archive: {e}")))?;

    let mut margin_parts: Vec<String> = archive
        .file_names()
        .filter(|name| is_margin_part(name))
        .map(str::to_string)
        .collect();
    // Headers before footers.
    margin_parts.sort_by_key(|name| (name.starts_with("word/footer"), name.clone()));

    let mut lines: Vec<String> = Vec::new();
    for part in &margin_parts {
        let xml = read_part(&mut archive, part)?;
        for line in paragraph_lines(&xml)? {
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }

    let body = read_part(&mut archive, BODY_PART)?;
    lines.extend(paragraph_lines(&body)?);

    Ok(lines.join("\n"))
}

fn is_margin_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    (file.starts_with("header") || file.starts_with("footer"))
        && file.ends_with(".xml")
        && !file.contains('/')
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut xml = String::new();
    archive
        .by_name(name)
        .map_err(|e| ExtractionError::Docx(format!("missing {name}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("cannot read {name}: {e}")))?;
    Ok(xml)
}

/// Non-empty trimmed text of every outermost `w:p`, in document order.
fn paragraph_lines(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let doc = Document::parse(xml)
        .map_err(|e| ExtractionError::Docx(format!("invalid XML: {e}")))?;

    Ok(doc
        .descendants()
        .filter(|node| is_element(node, "p") && !has_paragraph_ancestor(node))
        .map(|p| paragraph_text(&p).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Runs concatenated, hyperlink runs included; tabs and breaks kept.
fn paragraph_text(p: &Node) -> String {
    let mut text = String::new();
    for node in p.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or_default()),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn has_paragraph_ancestor(node: &Node) -> bool {
    node.ancestors().skip(1).any(|a| is_element(&a, "p"))
}

fn is_element(node: &Node, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub(crate) fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn wrap(root: &str, paragraphs: &str) -> String {
        format!(r#"<?xml version="1.0"?><w:{root} xmlns:w="{W_NS}">{paragraphs}</w:{root}>"#)
    }

    fn simple_paragraphs(lines: &[&str]) -> String {
        lines
            .iter()
            .map(|l| {
                if l.is_empty() {
                    "<w:p/>".to_string()
                } else {
                    format!(r#"<w:p><w:r><w:t xml:space="preserve">{l}</w:t></w:r></w:p>"#)
                }
            })
            .collect()
    }

    pub(crate) fn body(lines: &[&str]) -> String {
        wrap("document", &format!("<w:body>{}</w:body>", simple_paragraphs(lines)))
    }

    #[test]
    fn test_paragraph_per_line() {
        let bytes = build_docx(&[(BODY_PART, body(&["EXPERIENCE", "", "Acme Corp"]).as_str())]);
        assert_eq!(extract_docx_text(&bytes).unwrap(), "EXPERIENCE\nAcme Corp");
    }

    #[test]
    fn test_runs_tabs_breaks_and_hyperlinks() {
        let xml = wrap(
            "document",
            r#"<w:body><w:p>
                <w:r><w:t>Jane</w:t></w:r><w:r><w:t xml:space="preserve"> Doe</w:t></w:r>
                <w:r><w:tab/><w:t>Engineer</w:t><w:br/><w:t>Berlin</w:t></w:r>
                <w:hyperlink><w:r><w:t> | site.dev</w:t></w:r></w:hyperlink>
            </w:p></w:body>"#,
        );
        let bytes = build_docx(&[(BODY_PART, xml.as_str())]);
        assert_eq!(
            extract_docx_text(&bytes).unwrap(),
            "Jane Doe\tEngineer\nBerlin | site.dev"
        );
    }

    #[test]
    fn test_headers_and_footers_prepended_once() {
        let header = wrap("hdr", &simple_paragraphs(&["Jane Doe", "jane@example.com"]));
        let footer = wrap("ftr", &simple_paragraphs(&["Jane Doe"]));
        let bytes = build_docx(&[
            (BODY_PART, body(&["SKILLS", "Rust"]).as_str()),
            ("word/header1.xml", header.as_str()),
            ("word/footer1.xml", footer.as_str()),
        ]);
        assert_eq!(
            extract_docx_text(&bytes).unwrap(),
            "Jane Doe\njane@example.com\nSKILLS\nRust"
        );
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_docx_text(b"plain text").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(msg) if msg.contains("ZIP")));
    }

    #[test]
    fn test_missing_body_part() {
        let bytes = build_docx(&[("word/styles.xml", "<styles/>")]);
        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(msg) if msg.contains("word/document.xml")));
    }

    #[test]
    fn test_margin_part_names() {
        assert!(is_margin_part("word/header2.xml"));
        assert!(is_margin_part("word/footer1.xml"));
        assert!(!is_margin_part("word/_rels/header1.xml.rels"));
        assert!(!is_margin_part("word/document.xml"));
    }
}
