//! Heading detection and removal of the heading a section restates at its top.

use crate::sectioning::normalize::squash;

/// Lines this short are treated as headings (stray initials, bullets).
const TINY_LINE_LEN: usize = 2;
/// Lines longer than this are never headings.
const MAX_HEADING_LEN: usize = 60;
/// Fraction of letters that must be uppercase for an all-caps heading.
const UPPERCASE_RATIO: f64 = 0.85;
/// A restated heading may be split across at most this many lines.
const MAX_HEADING_LINES: usize = 3;

/// Words that mark a line as a résumé heading when the line is short.
const HEADING_VOCABULARY: &[&str] = &[
    "summary",
    "skills",
    "experience",
    "education",
    "certifications",
    "publications",
    "patents",
    "projects",
];

/// Short line that is mostly uppercase or mentions a common résumé heading.
pub fn looks_like_heading(line: &str) -> bool {
    let s = line.trim();
    if s.is_empty() {
        return false;
    }
    let len = s.chars().count();
    if len <= TINY_LINE_LEN {
        return true;
    }
    if len > MAX_HEADING_LEN {
        return false;
    }

    let (letters, upper) = s
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(n, u), c| (n + 1, u + usize::from(c.is_uppercase())));
    if letters > 0 && upper as f64 / letters as f64 >= UPPERCASE_RATIO {
        return true;
    }

    let lower = s.to_lowercase();
    HEADING_VOCABULARY.iter().any(|w| lower.contains(w))
}

/// Drops the heading a section body begins with.
///
/// The heading may be broken across up to three lines (`P\nROFESSIONAL SUMMARY`):
/// if the squashed first 1..=3 lines contain the squashed `start_anchor`, those
/// lines go. Otherwise a first line that [`looks_like_heading`] goes. Blank lines
/// directly after the heading go with it. The result is trimmed.
pub fn strip_restated_heading(text: &str, start_anchor: Option<&str>) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = text.lines().collect();

    let anchor = start_anchor.map(squash).filter(|a| !a.is_empty());
    if let Some(anchor) = anchor {
        let mut head = String::new();
        for (k, line) in lines.iter().take(MAX_HEADING_LINES).enumerate() {
            head.push_str(&squash(line));
            if head.contains(&anchor) {
                return body_after(&lines, k + 1);
            }
        }
    }

    if looks_like_heading(lines[0]) {
        return body_after(&lines, 1);
    }
    text.to_string()
}

fn body_after(lines: &[&str], skip: usize) -> String {
    lines
        .iter()
        .skip(skip)
        .skip_while(|l| l.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_caps_is_heading() {
        assert!(looks_like_heading("PROFESSIONAL EXPERIENCE"));
        assert!(looks_like_heading("  WORK & STUDY  "));
    }

    #[test]
    fn test_vocabulary_is_heading() {
        assert!(looks_like_heading("Core Skills"));
        assert!(looks_like_heading("Selected Projects"));
    }

    #[test]
    fn test_tiny_line_is_heading() {
        assert!(looks_like_heading("P"));
        assert!(looks_like_heading("•"));
    }

    #[test]
    fn test_body_lines_are_not_headings() {
        assert!(!looks_like_heading(""));
        assert!(!looks_like_heading("Built a payments platform in Rust"));
        assert!(!looks_like_heading(
            "Led the skills assessment programme for 40 engineers across three offices"
        ));
    }

    #[test]
    fn test_strip_heading_on_first_line() {
        let out = strip_restated_heading("EXPERIENCE\nDid things.", Some("EXPERIENCE"));
        assert_eq!(out, "Did things.");
    }

    #[test]
    fn test_strip_broken_heading_across_lines() {
        let text = "P\nROFESSIONAL\nSUMMARY\n\nSeasoned engineer.";
        let out = strip_restated_heading(text, Some("Professional Summary"));
        assert_eq!(out, "Seasoned engineer.");
    }

    #[test]
    fn test_strip_falls_back_to_heading_shape() {
        let out = strip_restated_heading("WORK HISTORY\n\n\nAcme Corp", Some("Employment"));
        assert_eq!(out, "Acme Corp");
    }

    #[test]
    fn test_keeps_body_without_heading() {
        let text = "Acme Corp, 2019-2021\nShipped things.";
        assert_eq!(strip_restated_heading(text, None), text);
    }

    #[test]
    fn test_heading_only_section_is_empty() {
        assert_eq!(strip_restated_heading("  EDUCATION \n\n", Some("EDUCATION")), "");
        assert_eq!(strip_restated_heading("   ", Some("EDUCATION")), "");
    }
}
