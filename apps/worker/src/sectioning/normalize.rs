//! Text Normalizer: repairs extraction artifacts and builds the whitespace-blind
//! index that anchor matching runs on.
//!
//! Two outputs, always produced together by [`NormalizedText::new`]:
//! - `text`: the cleaned document (line endings, NBSP, dashes, PDF line-break repairs)
//! - `index`: the cleaned text with all whitespace removed and uppercased, plus
//!   offset tables in both directions

/// Cleans raw extracted text.
///
/// - `\r\n` / `\r` → `\n`
/// - NBSP → space, en/em dash → `-`
/// - `P\nroduct` → `Product` (single letter, newline, lowercase letter)
/// - `202\n2` → `2022` (digit, newline, digit)
pub fn clean_text(raw: &str) -> String {
    let unified: Vec<char> = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .map(|c| match c {
            '\u{00A0}' => ' ',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();

    let mut out = String::with_capacity(unified.len());
    for (i, &c) in unified.iter().enumerate() {
        if c == '\n' && is_broken_line(&unified, i) {
            continue;
        }
        out.push(c);
    }
    out
}

/// True when the newline at `i` splits a word or a number and should be dropped.
fn is_broken_line(chars: &[char], i: usize) -> bool {
    let (Some(&prev), Some(&next)) = (i.checked_sub(1).and_then(|p| chars.get(p)), chars.get(i + 1))
    else {
        return false;
    };

    if prev.is_ascii_digit() && next.is_ascii_digit() {
        return true;
    }

    // The letter before the newline must stand alone at a word start.
    let letter_starts_word = i < 2 || !is_word_char(chars[i - 2]);
    prev.is_ascii_alphabetic() && letter_starts_word && next.is_ascii_lowercase()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Collapses runs of 3+ newlines to a single blank line and trims the ends.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Whitespace-stripped, uppercased form of `s`. Used for both the document index
/// and every needle matched against it.
pub fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Whitespace-blind view of a text with offset maps back into it.
///
/// All offsets are byte offsets. `norm_to_raw` has one entry per byte of
/// `norm`; `raw_to_norm` has `raw.len() + 1` entries and is monotonic.
#[derive(Debug, Clone)]
pub struct NormIndex {
    norm: String,
    norm_to_raw: Vec<usize>,
    raw_to_norm: Vec<usize>,
}

impl NormIndex {
    pub fn build(raw: &str) -> Self {
        let mut norm = String::with_capacity(raw.len());
        let mut norm_to_raw = Vec::with_capacity(raw.len());
        let mut raw_to_norm = vec![0usize; raw.len() + 1];

        for (ri, ch) in raw.char_indices() {
            raw_to_norm[ri] = norm.len();
            if !ch.is_whitespace() {
                for upper in ch.to_uppercase() {
                    let before = norm.len();
                    norm.push(upper);
                    norm_to_raw.extend(std::iter::repeat(ri).take(norm.len() - before));
                }
            }
            // Continuation bytes point past this char so a search starting
            // mid-char never rematches it.
            for slot in &mut raw_to_norm[ri + 1..ri + ch.len_utf8()] {
                *slot = norm.len();
            }
        }
        raw_to_norm[raw.len()] = norm.len();

        Self {
            norm,
            norm_to_raw,
            raw_to_norm,
        }
    }

    /// The whitespace-stripped, uppercased text.
    pub fn as_str(&self) -> &str {
        &self.norm
    }

    pub fn raw_len(&self) -> usize {
        self.raw_to_norm.len() - 1
    }

    /// Normalized offset for a raw offset, clamped to the raw length.
    pub fn to_norm(&self, raw_offset: usize) -> usize {
        self.raw_to_norm[raw_offset.min(self.raw_len())]
    }

    /// Raw offset of the character that produced normalized position `norm_offset`.
    pub fn to_raw(&self, norm_offset: usize) -> Option<usize> {
        self.norm_to_raw.get(norm_offset).copied()
    }

    /// True when the squashed `needle` occurs anywhere in the index.
    pub fn contains(&self, needle: &str) -> bool {
        let needle = squash(needle);
        !needle.is_empty() && self.norm.contains(&needle)
    }
}

/// Cleaned document text plus its index. Built once per parse and passed
/// explicitly to every stage.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    pub index: NormIndex,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let text = collapse_blank_lines(&clean_text(raw));
        let index = NormIndex::build(&text);
        Self { text, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_unified() {
        assert_eq!(clean_text("Ab\r\nCd\rEf"), "Ab\nCd\nEf");
    }

    #[test]
    fn test_unified_break_after_single_letter_is_joined() {
        // CRLF becomes LF first, then the single-letter repair applies.
        assert_eq!(clean_text("a\r\nb"), "ab");
        assert_eq!(clean_text("a\r\nb\rc"), "abc");
    }

    #[test]
    fn test_nbsp_and_dashes() {
        assert_eq!(clean_text("2019\u{2013}2021\u{00A0}x\u{2014}y"), "2019-2021 x-y");
    }

    #[test]
    fn test_single_letter_line_break_repaired() {
        assert_eq!(clean_text("P\nroduct Owner"), "Product Owner");
        assert_eq!(clean_text("Senior P\nroduct"), "Senior Product");
    }

    #[test]
    fn test_word_end_line_break_kept() {
        // "Owner" ends a word; the next line is a new sentence.
        assert_eq!(clean_text("Owner\nled teams"), "Owner\nled teams");
        assert_eq!(clean_text("P\nROFESSIONAL"), "P\nROFESSIONAL");
    }

    #[test]
    fn test_split_year_repaired() {
        assert_eq!(clean_text("Since 202\n2"), "Since 2022");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("\n\na\n\n\n\nb\n"), "a\n\nb");
    }

    #[test]
    fn test_squash() {
        assert_eq!(squash(" Professional \n Summary "), "PROFESSIONALSUMMARY");
        assert_eq!(squash("   "), "");
    }

    #[test]
    fn test_empty_index() {
        let idx = NormIndex::build("");
        assert_eq!(idx.as_str(), "");
        assert_eq!(idx.raw_len(), 0);
        assert_eq!(idx.to_norm(0), 0);
        assert_eq!(idx.to_raw(0), None);
    }

    #[test]
    fn test_index_maps_back_to_raw() {
        let raw = "ab  c\nd";
        let idx = NormIndex::build(raw);
        assert_eq!(idx.as_str(), "ABCD");
        assert_eq!(idx.to_raw(2), Some(4));
        assert_eq!(idx.to_raw(3), Some(6));
        assert_eq!(idx.to_norm(3), 2);
        assert_eq!(idx.to_norm(raw.len()), 4);
    }

    #[test]
    fn test_index_multibyte_offsets() {
        let raw = "é x";
        let idx = NormIndex::build(raw);
        assert_eq!(idx.as_str(), "ÉX");
        // 'é' is two bytes; a search starting inside it begins after it.
        assert_eq!(idx.to_norm(1), "É".len());
        assert_eq!(idx.to_raw("É".len()), Some(3));
    }

    #[test]
    fn test_contains_ignores_whitespace_and_case() {
        let idx = NormIndex::build("P\nROFESSIONAL  summary");
        assert!(idx.contains("Professional Summary"));
        assert!(!idx.contains(""));
        assert!(!idx.contains("Education"));
    }

    #[test]
    fn test_normalized_text_is_trimmed() {
        let n = NormalizedText::new("\r\n  EXPERIENCE\r\n\r\n\r\n\r\nDid things.  ");
        assert_eq!(n.text, "EXPERIENCE\n\nDid things.");
        assert_eq!(n.index.raw_len(), n.text.len());
    }
}
