use serde::{Deserialize, Serialize};

pub const UNKNOWN_ID: &str = "unknown";
pub const UNKNOWN_TITLE: &str = "UNKNOWN";

/// One node of the segmented document. Groups are structural and always carry
/// empty text; leaves carry the sliced, heading-stripped body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}

impl SectionNode {
    pub fn group(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            text: String::new(),
            parent_id: None,
            is_group: true,
        }
    }

    pub fn leaf(id: String, title: String, text: String, parent_id: Option<String>) -> Self {
        Self {
            id,
            title,
            text,
            parent_id,
            is_group: false,
        }
    }

    /// The catch-all node holding the whole document.
    pub fn unknown(raw_text: &str) -> Self {
        Self::leaf(
            UNKNOWN_ID.to_string(),
            UNKNOWN_TITLE.to_string(),
            raw_text.to_string(),
            None,
        )
    }
}
