//! Schema-less splitter: cuts a résumé at lines that look like section headings.
//!
//! Independent of the schema pipeline; the no-schema path of `/parse` still
//! returns a single `unknown` section.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::section::SectionNode;

const MAX_HEADLINE_LEN: usize = 60;
const UPPERCASE_RATIO: f64 = 0.85;
/// The same heading repeated within this many lines is one heading.
const REPEAT_WINDOW: usize = 2;

const HEADER_TITLE: &str = "Header";
const NO_HEADINGS_TITLE: &str = "Experience";

const KNOWN_HEADINGS: &[&str] = &[
    "SUMMARY",
    "PROFESSIONAL SUMMARY",
    "PROFILE",
    "ABOUT",
    "HIGHLIGHTS",
    "CORE COMPETENCIES",
    "SKILLS",
    "TECHNICAL SKILLS",
    "TECHNOLOGIES",
    "EXPERIENCE",
    "WORK EXPERIENCE",
    "PROFESSIONAL EXPERIENCE",
    "EMPLOYMENT HISTORY",
    "CAREER HISTORY",
    "PROJECTS",
    "SELECTED PROJECTS",
    "EDUCATION",
    "CERTIFICATIONS",
    "LICENSES",
    "PUBLICATIONS",
    "PATENTS",
    "AWARDS",
    "ACHIEVEMENTS",
    "VOLUNTEER",
    "VOLUNTEER EXPERIENCE",
    "LEADERSHIP",
    "LANGUAGES",
    "INTERESTS",
    "ADDITIONAL INFORMATION",
];

static BULLET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[•\-\*]+\s*").expect("bullet pattern is valid"));
static TITLE_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,4}:?$").expect("title case pattern is valid")
});
static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern is valid"));
static INNER_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b-\b").expect("hyphen pattern is valid"));
static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Singapore|Hong Kong|Shanghai|New York|London)\b")
        .expect("location pattern is valid")
});

/// Splits `raw` at detected headings. Returns no sections for blank input.
pub fn split_by_headlines(raw: &str) -> Vec<SectionNode> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.split('\n').collect();

    let headings = dedup_repeats(
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| headline_title(line).map(|title| (i, title)))
            .collect(),
    );

    let Some(&(first_line, _)) = headings.first() else {
        return vec![section("s1".to_string(), NO_HEADINGS_TITLE, text.trim())];
    };

    let mut sections = Vec::with_capacity(headings.len() + 1);

    let preamble = join_lines(&lines, 0, first_line);
    if !preamble.is_empty() {
        sections.push(section("s0".to_string(), HEADER_TITLE, &preamble));
    }

    for (n, (line_idx, title)) in headings.iter().enumerate() {
        let end = headings.get(n + 1).map_or(lines.len(), |(next, _)| *next);
        let body = join_lines(&lines, line_idx + 1, end);
        // Ids count every heading, including the ones dropped below.
        if !body.is_empty() {
            sections.push(section(format!("s{}", n + 1), title, &body));
        }
    }

    sections
}

/// The section title for `line` if it reads as a heading.
fn headline_title(line: &str) -> Option<String> {
    let original = line.trim();
    if original.is_empty() || original.chars().count() > MAX_HEADLINE_LEN {
        return None;
    }

    let candidate = normalize_candidate(original);
    if candidate.is_empty() {
        return None;
    }
    if KNOWN_HEADINGS.contains(&candidate.as_str()) {
        return Some(title_case(&candidate));
    }

    let formatted = original.ends_with(':')
        || uppercase_ratio(original) >= UPPERCASE_RATIO
        || TITLE_CASE.is_match(original);
    if !formatted {
        return None;
    }

    // "Acme Corp 2019-2022" is a job line, not a heading.
    if YEAR.is_match(original) && INNER_HYPHEN.is_match(original) {
        return None;
    }
    // City lines sit under job entries.
    if LOCATION.is_match(original) {
        return None;
    }

    Some(original.trim_end_matches(':').trim().to_string())
}

/// Uppercased form without bullet prefix, trailing colon or repeated spaces.
fn normalize_candidate(line: &str) -> String {
    let stripped = BULLET_PREFIX.replace(line.trim(), "");
    let stripped = stripped.strip_suffix(':').unwrap_or(&stripped);
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn uppercase_ratio(line: &str) -> f64 {
    let letters: Vec<char> = line.chars().filter(char::is_ascii_alphabetic).collect();
    if letters.is_empty() {
        return 0.0;
    }
    let upper = letters.iter().filter(|c| c.is_ascii_uppercase()).count();
    upper as f64 / letters.len() as f64
}

/// "WORK EXPERIENCE" → "Work Experience".
fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup_repeats(headings: Vec<(usize, String)>) -> Vec<(usize, String)> {
    let mut kept: Vec<(usize, String)> = Vec::with_capacity(headings.len());
    for (line_idx, title) in headings {
        if let Some((last_idx, last_title)) = kept.last() {
            if last_title.eq_ignore_ascii_case(&title) && line_idx - last_idx <= REPEAT_WINDOW {
                continue;
            }
        }
        kept.push((line_idx, title));
    }
    kept
}

fn join_lines(lines: &[&str], from: usize, to: usize) -> String {
    lines
        .get(from..to)
        .map(|chunk| chunk.join("\n").trim().to_string())
        .unwrap_or_default()
}

fn section(id: String, title: &str, text: &str) -> SectionNode {
    SectionNode::leaf(id, title.to_string(), text.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(sections: &[SectionNode]) -> Vec<(&str, &str)> {
        sections
            .iter()
            .map(|s| (s.id.as_str(), s.title.as_str()))
            .collect()
    }

    #[test]
    fn test_splits_on_known_headings_with_header() {
        let raw = "jane@example.com\n+1 555 0100\n\nWORK EXPERIENCE\nAcme, engineer\n\nEducation:\nBSc";
        let sections = split_by_headlines(raw);
        assert_eq!(
            titles(&sections),
            vec![("s0", "Header"), ("s1", "Work Experience"), ("s2", "Education")]
        );
        assert_eq!(sections[0].text, "jane@example.com\n+1 555 0100");
        assert_eq!(sections[1].text, "Acme, engineer");
        assert_eq!(sections[2].text, "BSc");
        assert!(sections.iter().all(|s| !s.is_group && s.parent_id.is_none()));
    }

    #[test]
    fn test_bullet_prefixed_heading() {
        let sections = split_by_headlines("• Skills\nrust, go");
        assert_eq!(titles(&sections), vec![("s1", "Skills")]);
        assert_eq!(sections[0].text, "rust, go");
    }

    #[test]
    fn test_formatted_line_becomes_heading() {
        let sections = split_by_headlines("Open Source Work\nmaintainer of things");
        assert_eq!(titles(&sections), vec![("s1", "Open Source Work")]);
    }

    #[test]
    fn test_date_range_line_is_not_heading() {
        assert_eq!(headline_title("ACME CORP 2019-2022"), None);
        assert_eq!(headline_title("ACME CORP 2019"), Some("ACME CORP 2019".to_string()));
    }

    #[test]
    fn test_location_line_is_not_heading() {
        assert_eq!(headline_title("New York"), None);
        assert_eq!(headline_title("HONG KONG"), None);
        assert_eq!(headline_title("london:"), None);
    }

    #[test]
    fn test_location_line_stays_in_job_body() {
        let sections = split_by_headlines("EXPERIENCE\nAcme Corp\nNew York\nbuilt payments");
        // "Experience" has no body before "Acme Corp" and is dropped.
        assert_eq!(titles(&sections), vec![("s2", "Acme Corp")]);
        assert_eq!(sections[0].text, "New York\nbuilt payments");
    }

    #[test]
    fn test_long_and_prose_lines_are_not_headings() {
        assert_eq!(headline_title(&"A".repeat(61)), None);
        assert_eq!(headline_title("built a compiler in rust"), None);
    }

    #[test]
    fn test_repeated_heading_collapses() {
        let sections = split_by_headlines("SKILLS\nSKILLS\nrust");
        assert_eq!(titles(&sections), vec![("s1", "Skills")]);
        assert_eq!(sections[0].text, "SKILLS\nrust");
    }

    #[test]
    fn test_empty_sections_dropped_ids_kept() {
        let sections = split_by_headlines("SUMMARY\n\nPROJECTS\nA compiler");
        assert_eq!(titles(&sections), vec![("s2", "Projects")]);
    }

    #[test]
    fn test_no_headings_returns_single_section() {
        let sections = split_by_headlines("just some prose here\nand more prose\n");
        assert_eq!(titles(&sections), vec![("s1", "Experience")]);
        assert_eq!(sections[0].text, "just some prose here\nand more prose");
    }

    #[test]
    fn test_blank_input() {
        assert!(split_by_headlines("  \n ").is_empty());
    }
}
