mod config;
mod dataset;
mod document;
mod errors;
mod routes;
mod sheet;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dataset::CharacterStore;
use crate::document::Html2PdfClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stroke-sheets v{}", env!("CARGO_PKG_VERSION"));

    // Load the character dataset once; it is read-only afterwards
    let store = CharacterStore::load(
        Path::new(&config.graphics_path),
        Path::new(&config.dictionary_path),
    )
    .with_context(|| {
        format!(
            "loading dataset from {} and {}",
            config.graphics_path, config.dictionary_path
        )
    })?;
    if store.is_empty() {
        warn!(
            "Character dataset at {} is empty; every sheet request will fail",
            config.graphics_path
        );
    } else {
        info!("Character dataset loaded ({} characters)", store.len());
    }

    let renderer = Html2PdfClient::new(
        config.renderer_url.clone(),
        Duration::from_secs(config.renderer_timeout_secs),
    )?;
    info!("PDF renderer client initialized ({})", renderer.endpoint());

    let state = AppState {
        config: config.clone(),
        store: Arc::new(store),
        renderer: Arc::new(renderer),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
