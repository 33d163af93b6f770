use std::sync::Arc;

use crate::config::Config;
use crate::dataset::CharacterStore;
use crate::document::DocumentRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stroke and pronunciation data, loaded once at startup and read-only afterwards.
    pub store: Arc<CharacterStore>,
    /// Page-to-PDF backend. Default: `Html2PdfClient` pointed at `RENDERER_URL`.
    pub renderer: Arc<dyn DocumentRenderer>,
}
