//! Axum route handlers for practice sheet generation.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::document::{assemble, OutputFormat};
use crate::errors::AppError;
use crate::sheet::{generate_pages, SheetOptions};
use crate::state::AppState;

const DEFAULT_TILE_SIZE: i64 = 10;
const DEFAULT_REPEATS: i64 = 3;
const DEFAULT_ACTION: &str = "preview";

/// Fields of the index page form. Empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    pub chars: Option<String>,
    pub size: Option<String>,
    pub nr: Option<String>,
    pub action: Option<String>,
    pub hints: Option<String>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// HTML checkbox semantics: only an explicit "on"-style value counts as checked.
fn checkbox(field: &Option<String>) -> bool {
    non_empty(field).is_some_and(|v| {
        ["1", "on", "true"]
            .iter()
            .any(|accepted| v.eq_ignore_ascii_case(accepted))
    })
}

fn parse_int(name: &str, field: &Option<String>, default: i64) -> Result<i64, AppError> {
    match non_empty(field) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(format!("{name} must be an integer, got {raw:?}"))),
    }
}

/// POST /gen_strokes
///
/// Validates the form, generates every page, then assembles the requested output.
/// Output format and parameters are checked before any generation work.
pub async fn handle_gen_strokes(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, AppError> {
    let chars: Vec<char> = form
        .chars
        .as_deref()
        .ok_or_else(|| AppError::Validation("Missing \"chars\" argument.".to_string()))?
        .trim()
        .chars()
        .collect();

    let format: OutputFormat = non_empty(&form.action).unwrap_or(DEFAULT_ACTION).parse()?;
    let options = SheetOptions::new(
        parse_int("size", &form.size, DEFAULT_TILE_SIZE)?,
        parse_int("nr", &form.nr, DEFAULT_REPEATS)?,
        checkbox(&form.hints),
    )?;

    let store = state.store.clone();
    let max_tiles = state.config.max_tiles;
    let pages = tokio::task::spawn_blocking(move || {
        generate_pages(&store, &chars, &options, max_tiles, rand::thread_rng())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in generation: {e}")))??;

    let document = assemble(format, &pages, state.renderer.as_ref()).await?;

    Ok((
        [(header::CONTENT_TYPE, document.format.content_type())],
        document.body,
    )
        .into_response())
}
