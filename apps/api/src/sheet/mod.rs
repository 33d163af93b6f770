// Practice sheet engine: tile sequencing, page packing, SVG rendering.
// Pure and synchronous; handlers run it inside tokio::task::spawn_blocking.

pub mod handlers;
pub mod header;
pub mod packer;
pub mod sequencer;
pub mod tile;

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::dataset::CharacterStore;

pub use packer::{GridGeometry, PagePacker, RenderedPage};
pub use sequencer::TileSequence;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("Unknown character: {0:?}")]
    UnknownCharacter(char),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Validated generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    pub geometry: GridGeometry,
    pub repeats: usize,
    pub recall_hints: bool,
}

impl SheetOptions {
    /// Checks raw user values before any work starts.
    pub fn new(tile_size: i64, repeats: i64, recall_hints: bool) -> Result<Self, SheetError> {
        if tile_size <= 0 {
            return Err(SheetError::InvalidConfiguration(format!(
                "tile size must be positive, got {tile_size}"
            )));
        }
        if repeats < 0 {
            return Err(SheetError::InvalidConfiguration(format!(
                "repeat count must not be negative, got {repeats}"
            )));
        }
        let tile_size = u32::try_from(tile_size).map_err(|_| {
            SheetError::InvalidConfiguration(format!("tile size {tile_size} is too large"))
        })?;
        let repeats = usize::try_from(repeats).map_err(|_| {
            SheetError::InvalidConfiguration(format!("repeat count {repeats} is too large"))
        })?;

        Ok(Self {
            geometry: GridGeometry::new(tile_size)?,
            repeats,
            recall_hints,
        })
    }
}

/// Runs the whole pipeline: sequence → pack → render.
///
/// `max_tiles` bounds the work up front; input whose tile count exceeds it is rejected
/// before a single tile is built.
pub fn generate_pages<R: Rng>(
    store: &CharacterStore,
    characters: &[char],
    options: &SheetOptions,
    max_tiles: usize,
    rng: R,
) -> Result<Vec<RenderedPage>, SheetError> {
    if characters.is_empty() {
        return Err(SheetError::InvalidConfiguration(
            "no characters requested".to_string(),
        ));
    }

    let tiles = TileSequence::new(store, characters, options.repeats, rng)?
        .with_recall_hints(options.recall_hints);
    let total = tiles.total();
    if total > max_tiles {
        return Err(SheetError::InvalidConfiguration(format!(
            "request needs {total} tiles, the limit is {max_tiles}"
        )));
    }

    let pages: Vec<RenderedPage> = PagePacker::new(options.geometry, tiles)
        .map(packer::Page::finish)
        .collect();

    info!(
        characters = characters.len(),
        tiles = total,
        pages = pages.len(),
        tile_size = options.geometry.tile_size(),
        repeats = options.repeats,
        "Practice sheet generated"
    );
    Ok(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
