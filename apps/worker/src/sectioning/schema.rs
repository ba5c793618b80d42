//! Schema ingestion: turns a user-supplied schema document into one canonical
//! representation.
//!
//! Every tolerated spelling (`parentId`/`parent_id`, `anchors.start`/flat `start`,
//! string-or-list candidates, numeric ids) is resolved here so the matching code
//! only ever sees [`Schema`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Fields that locate a section in the document.
const LOCATOR_KEYS: &[&str] = &[
    "anchor", "anchors", "pattern", "regex", "match", "start", "end", "start_idx", "end_idx",
];

/// Flat fields whose values count as declared anchors for the applicability check.
const FLAT_ANCHOR_KEYS: &[&str] = &["start", "end", "anchor", "pattern", "match"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// The schema source could not be read or decoded at all.
    #[error("schema parse error: {0}")]
    Parse(String),

    /// The schema decoded but is not usable (missing/empty `sections`, bad `groups`).
    #[error("schema shape error: {0}")]
    Shape(String),
}

/// A structural node. Never carries text.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDef {
    pub id: String,
    pub title: String,
}

/// A text-bearing section with its boundary candidates in priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafDef {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub start: Vec<String>,
    pub end: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaLocatorStats {
    pub leaf_count: usize,
    pub leaf_with_locator: usize,
    pub leaf_missing_parent: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub groups: Vec<GroupDef>,
    pub leaves: Vec<LeafDef>,
    /// Every literal anchor string declared anywhere in the schema.
    pub declared_anchors: Vec<String>,
    pub locator_stats: SchemaLocatorStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn to_trimmed(&self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSchema {
    groups: Option<Vec<RawGroup>>,
    sections: Vec<RawSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGroup {
    id: Option<Scalar>,
    title: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSection {
    id: Option<Scalar>,
    title: Option<Scalar>,
    #[serde(rename = "parentId", alias = "parent_id")]
    parent_id: Option<Scalar>,
    #[serde(rename = "isGroup", alias = "is_group")]
    is_group: Option<bool>,
    anchors: Option<Value>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

impl RawSection {
    fn field(&self, key: &str) -> Option<&Value> {
        match key {
            "anchors" => self.anchors.as_ref(),
            _ => self.rest.get(key),
        }
    }

    /// Candidates for one boundary. An `anchors` object is authoritative when
    /// present; otherwise the flat field, and for starts the flat `anchor`.
    fn candidates(&self, which: &str) -> Vec<String> {
        if let Some(Value::Object(anchors)) = &self.anchors {
            return anchors.get(which).map(candidate_list).unwrap_or_default();
        }
        if let Some(v) = self.rest.get(which).filter(|v| !v.is_null()) {
            return candidate_list(v);
        }
        if which == "start" {
            if let Some(v) = self.rest.get("anchor") {
                return candidate_list(v);
            }
        }
        Vec::new()
    }

    fn has_locator(&self) -> bool {
        LOCATOR_KEYS
            .iter()
            .any(|k| self.field(k).is_some_and(|v| !is_blank_value(v)))
    }

    fn declared_anchors(&self) -> Vec<String> {
        let mut out: Vec<String> = FLAT_ANCHOR_KEYS
            .iter()
            .filter_map(|k| self.rest.get(*k))
            .flat_map(candidate_list)
            .collect();
        if let Some(Value::Object(anchors)) = &self.anchors {
            for which in ["start", "end"] {
                if let Some(v) = anchors.get(which) {
                    out.extend(candidate_list(v));
                }
            }
        }
        out
    }
}

/// Normalizes a candidate value to a list of non-empty trimmed strings.
fn candidate_list(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => non_empty(s.trim()).into_iter().collect(),
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => non_empty(s.trim()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn is_blank_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ingestion
// ────────────────────────────────────────────────────────────────────────────

/// Rejects schemas that cannot drive a split.
fn validate_shape(value: &Value) -> Result<(), SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::Shape("schema must be a JSON object".to_string()))?;

    match obj.get("sections") {
        Some(Value::Array(sections)) if !sections.is_empty() => {}
        _ => {
            return Err(SchemaError::Shape(
                "schema must contain non-empty 'sections' list".to_string(),
            ))
        }
    }

    match obj.get("groups") {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(SchemaError::Shape(
            "'groups' must be a list if present".to_string(),
        )),
    }
}

impl Schema {
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        if source.trim().is_empty() {
            return Err(SchemaError::Parse("schema JSON is empty".to_string()));
        }
        let value: Value = serde_json::from_str(source)
            .map_err(|e| SchemaError::Parse(format!("invalid schema JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        validate_shape(&value)?;
        let raw: RawSchema = serde_json::from_value(value)
            .map_err(|e| SchemaError::Shape(format!("invalid schema entry: {e}")))?;

        let mut groups: Vec<GroupDef> = raw
            .groups
            .unwrap_or_default()
            .into_iter()
            .filter_map(|g| {
                let id = g.id.as_ref().map(Scalar::to_trimmed).unwrap_or_default();
                if id.is_empty() {
                    warn!("Skipping schema group without id");
                    return None;
                }
                let title = title_or_id(g.title.as_ref(), &id);
                Some(GroupDef { id, title })
            })
            .collect();

        let mut leaves = Vec::new();
        let mut declared_anchors = Vec::new();
        let mut stats = SchemaLocatorStats::default();

        for sec in &raw.sections {
            declared_anchors.extend(sec.declared_anchors());

            let id = sec.id.as_ref().map(Scalar::to_trimmed).unwrap_or_default();
            let title = title_or_id(sec.title.as_ref(), &id);
            let parent_id = sec
                .parent_id
                .as_ref()
                .map(Scalar::to_trimmed)
                .filter(|p| !p.is_empty());

            if sec.is_group.unwrap_or(false) {
                if !id.is_empty() {
                    groups.push(GroupDef { id, title });
                }
                continue;
            }

            stats.leaf_count += 1;
            if sec.has_locator() {
                stats.leaf_with_locator += 1;
            }
            if parent_id.is_none() {
                stats.leaf_missing_parent += 1;
            }

            if id.is_empty() {
                warn!("Skipping schema section without id (title: {title:?})");
                continue;
            }

            leaves.push(LeafDef {
                id,
                title,
                parent_id,
                start: sec.candidates("start"),
                end: sec.candidates("end"),
            });
        }

        debug!(
            groups = groups.len(),
            leaves = leaves.len(),
            anchors = declared_anchors.len(),
            "Schema ingested: {:?}",
            stats
        );

        Ok(Schema {
            groups,
            leaves,
            declared_anchors,
            locator_stats: stats,
        })
    }
}

fn title_or_id(title: Option<&Scalar>, id: &str) -> String {
    title
        .map(Scalar::to_trimmed)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| id.to_string())
}

/// Loads a schema file. Anything that stops the file from decoding is a parse error.
pub async fn load_schema_file(path: &Path) -> Result<Schema, SchemaError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let source = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SchemaError::Parse(format!("schema file not found: {name}"))
        } else {
            SchemaError::Parse(format!("cannot read schema file {name}: {e}"))
        }
    })?;

    Schema::from_json_str(&source).map_err(|e| match e {
        SchemaError::Parse(msg) => SchemaError::Parse(format!("{msg} (file: {name})")),
        shape => shape,
    })
}
