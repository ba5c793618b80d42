use std::path::{Path, PathBuf};

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::display_name;
use crate::models::section::SectionNode;
use crate::sectioning::diagnostics::{ParseDiagnostics, SchemaSource};
use crate::sectioning::headlines::split_by_headlines;
use crate::sectioning::pipeline::{segment, ParseError, Segmentation};
use crate::sectioning::schema::{load_schema_file, Schema, SchemaError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub file_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub file_path: String,
    /// Inline schema object. Wins over `schema_path` when non-empty.
    #[serde(default, alias = "cv_schema")]
    pub schema: Option<Value>,
    #[serde(default)]
    pub schema_path: Option<String>,
    /// Label for logs only.
    #[serde(default)]
    pub schema_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw_text: String,
    pub sections: Vec<SectionNode>,
    pub diagnostics: ParseDiagnostics,
}

impl ParseResponse {
    fn success(raw_text: String, seg: Segmentation) -> Self {
        Self {
            ok: true,
            error: None,
            raw_text,
            sections: seg.sections,
            diagnostics: seg.diagnostics,
        }
    }

    fn failure(raw_text: String, err: &ParseError, source: &SchemaSource) -> Self {
        Self {
            ok: false,
            error: Some(err.to_string()),
            raw_text,
            sections: Vec::new(),
            diagnostics: ParseDiagnostics::failed(err, source),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HeadlineSplitRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeadlineSplitResponse {
    pub ok: bool,
    pub sections: Vec<SectionNode>,
}

/// POST /extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let path = require_path(&req.file_path)?;
    let request_id = Uuid::new_v4();
    info!(%request_id, file = %display_name(path), "Extract request");

    let response = match state.extractor.extract(path).await {
        Ok(raw_text) => {
            info!(%request_id, chars = raw_text.chars().count(), "Extract ok");
            ExtractResponse {
                ok: true,
                error: None,
                raw_text,
            }
        }
        Err(e) => {
            warn!(%request_id, error = %e, "Extract failed");
            ExtractResponse {
                ok: false,
                error: Some(format!("extract failed: {e}")),
                raw_text: String::new(),
            }
        }
    };
    Ok(Json(response))
}

/// POST /parse
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let path = require_path(&req.file_path)?;
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        file = %display_name(path),
        schema_name = req.schema_name.as_deref().unwrap_or("-"),
        "Parse request"
    );

    let raw_text = match state.extractor.extract(path).await {
        Ok(text) => text,
        Err(e) => {
            let err = ParseError::from(e);
            warn!(%request_id, error = %err, "Parse failed: document unreadable");
            let source = requested_source(&req, &state.config.schema_dir);
            return Ok(Json(ParseResponse::failure(String::new(), &err, &source)));
        }
    };

    let (schema, source) = match resolve_schema(&req, &state.config.schema_dir).await {
        Ok(resolved) => resolved,
        Err((e, source)) => {
            let err = ParseError::from(e);
            warn!(%request_id, error = %err, "Parse failed: schema unusable");
            return Ok(Json(ParseResponse::failure(raw_text, &err, &source)));
        }
    };

    let task_text = raw_text.clone();
    let task_source = source.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        segment(&task_text, schema.as_ref(), &task_source)
    })
    .await;

    Ok(Json(parse_response(request_id, raw_text, outcome, &source)))
}

fn parse_response(
    request_id: Uuid,
    raw_text: String,
    outcome: Result<Result<Segmentation, ParseError>, JoinError>,
    source: &SchemaSource,
) -> ParseResponse {
    match outcome {
        Ok(Ok(seg)) => {
            info!(%request_id, mode = ?seg.mode, sections = seg.sections.len(), "Parse ok");
            ParseResponse::success(raw_text, seg)
        }
        Ok(Err(err)) => {
            warn!(%request_id, error = %err, "Parse failed");
            ParseResponse::failure(raw_text, &err, source)
        }
        Err(join_err) => {
            let err = ParseError::SplitterCrash(join_err.to_string());
            warn!(%request_id, error = %err, "Parse task aborted");
            ParseResponse::failure(raw_text, &err, source)
        }
    }
}

/// POST /split/headlines
pub async fn handle_split_headlines(
    Json(req): Json<HeadlineSplitRequest>,
) -> Result<Json<HeadlineSplitResponse>, AppError> {
    let sections = tokio::task::spawn_blocking(move || split_by_headlines(&req.raw_text))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("headline split task failed: {e}")))?;
    Ok(Json(HeadlineSplitResponse {
        ok: !sections.is_empty(),
        sections,
    }))
}

fn require_path(file_path: &str) -> Result<&Path, AppError> {
    let trimmed = file_path.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("file_path is required".to_string()));
    }
    Ok(Path::new(trimmed))
}

/// Where the schema would come from, without loading it.
fn requested_source(req: &ParseRequest, schema_dir: &Path) -> SchemaSource {
    if req.schema.as_ref().is_some_and(|v| !is_blank(v)) {
        return SchemaSource::Inline;
    }
    match non_blank_path(req) {
        Some(schema_path) => {
            SchemaSource::File(display_name(&resolve_under(schema_dir, schema_path)))
        }
        None => SchemaSource::None,
    }
}

fn non_blank_path(req: &ParseRequest) -> Option<&str> {
    req.schema_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Inline schema first, then `schema_path` (relative paths resolve against
/// `schema_dir`), else no schema.
async fn resolve_schema(
    req: &ParseRequest,
    schema_dir: &Path,
) -> Result<(Option<Schema>, SchemaSource), (SchemaError, SchemaSource)> {
    if let Some(inline) = req.schema.as_ref().filter(|v| !is_blank(v)) {
        let source = SchemaSource::Inline;
        return match Schema::from_value(inline.clone()) {
            Ok(schema) => Ok((Some(schema), source)),
            Err(e) => Err((e, source)),
        };
    }

    let Some(schema_path) = non_blank_path(req) else {
        return Ok((None, SchemaSource::None));
    };

    let path = resolve_under(schema_dir, schema_path);
    let source = SchemaSource::File(display_name(&path));
    match load_schema_file(&path).await {
        Ok(schema) => Ok((Some(schema), source)),
        Err(e) => Err((e, source)),
    }
}

fn resolve_under(dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
