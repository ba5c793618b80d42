use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Document reader. `DocumentExtractor` in production; tests swap in a stub.
    pub extractor: Arc<dyn TextExtractor>,
}
