//! Character dataset: stroke paths and pronunciations, loaded once at startup.
//!
//! Source files are the makemeahanzi JSON-lines dumps:
//! - `graphics.txt`: `{"character": "一", "strokes": ["M 518 382 Q ...", ...], ...}`
//! - `dictionary.txt`: `{"character": "一", "pinyin": ["yī"], ...}`
//!
//! The store is immutable after construction and shared as `Arc<CharacterStore>`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::sheet::SheetError;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One character with its strokes in authoring order.
///
/// Stroke paths are opaque SVG path data in a 1024×1024 box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub glyph: char,
    pub strokes: Vec<String>,
    pub pronunciation: Option<String>,
}

impl Character {
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }
}

/// Read-only lookup table keyed by character.
#[derive(Debug, Default)]
pub struct CharacterStore {
    characters: HashMap<char, Character>,
}

#[derive(Debug, Deserialize)]
struct GraphicsLine {
    character: String,
    strokes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DictionaryLine {
    character: String,
    #[serde(default)]
    pinyin: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Construction
// ────────────────────────────────────────────────────────────────────────────

impl CharacterStore {
    /// Builds a store from already-parsed characters. Later duplicates win.
    #[cfg(test)]
    pub fn from_characters(characters: impl IntoIterator<Item = Character>) -> Self {
        Self {
            characters: characters.into_iter().map(|c| (c.glyph, c)).collect(),
        }
    }

    /// Loads `graphics.txt` and `dictionary.txt`.
    ///
    /// Only characters present in the graphics file are kept; the dictionary contributes
    /// the first listed pinyin reading where one exists.
    pub fn load(graphics_path: &Path, dictionary_path: &Path) -> Result<Self> {
        let mut pronunciations: HashMap<char, String> = HashMap::new();
        for_each_line(dictionary_path, |line| {
            let entry: DictionaryLine = serde_json::from_str(line)?;
            if let (Some(glyph), Some(reading)) =
                (single_char(&entry.character), entry.pinyin.into_iter().next())
            {
                pronunciations.insert(glyph, reading);
            }
            Ok(())
        })?;

        let mut characters = HashMap::new();
        let mut skipped = 0usize;
        for_each_line(graphics_path, |line| {
            let entry: GraphicsLine = serde_json::from_str(line)?;
            match single_char(&entry.character) {
                Some(glyph) => {
                    characters.insert(
                        glyph,
                        Character {
                            glyph,
                            strokes: entry.strokes,
                            pronunciation: pronunciations.remove(&glyph),
                        },
                    );
                }
                None => skipped += 1,
            }
            Ok(())
        })?;

        if skipped > 0 {
            warn!(skipped, "Skipped graphics entries that are not a single character");
        }
        info!(
            characters = characters.len(),
            "Character dataset loaded from {}",
            graphics_path.display()
        );

        Ok(Self { characters })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Lookup
    // ────────────────────────────────────────────────────────────────────────

    /// Returns the character or `SheetError::UnknownCharacter`.
    pub fn lookup(&self, glyph: char) -> Result<&Character, SheetError> {
        self.characters
            .get(&glyph)
            .ok_or(SheetError::UnknownCharacter(glyph))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

fn for_each_line(path: &Path, mut f: impl FnMut(&str) -> Result<()>) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("Failed to open dataset file {}", path.display()))?;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        f(&line).with_context(|| format!("{}:{}: malformed entry", path.display(), idx + 1))?;
    }
    Ok(())
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test fixtures
// ────────────────────────────────────────────────────────────────────────────

/// Synthetic dataset shared by the unit tests of every module.
#[cfg(test)]
pub mod fixtures {
    use super::{Character, CharacterStore};

    /// (character, stroke count, pinyin)
    const SAMPLE: &[(char, usize, &str)] = &[
        ('一', 1, "yī"),
        ('二', 2, "èr"),
        ('三', 3, "sān"),
        ('四', 5, "sì"),
        ('五', 4, "wǔ"),
        ('六', 4, "liù"),
        ('七', 2, "qī"),
        ('八', 2, "bā"),
        ('九', 2, "jiǔ"),
        ('十', 2, "shí"),
        ('上', 3, "shàng"),
        ('下', 3, "xià"),
        ('人', 2, "rén"),
        ('大', 3, "dà"),
        ('小', 3, "xiǎo"),
        ('中', 4, "zhōng"),
        ('了', 2, "le"),
        ('个', 3, "gè"),
        ('么', 3, "me"),
        ('习', 3, "xí"),
        ('书', 4, "shū"),
        ('买', 6, "mǎi"),
        ('亮', 9, "liàng"),
        ('谢', 12, "xiè"),
        ('不', 4, "bù"),
        ('东', 5, "dōng"),
        ('些', 8, "xiē"),
        ('京', 8, "jīng"),
        ('什', 4, "shén"),
    ];

    pub fn stroke_path(glyph: char, n: usize) -> String {
        format!("M {} {} L {} {} Z", n * 10, glyph as u32 % 1000, n * 10 + 100, 512)
    }

    pub fn sample_character(glyph: char, strokes: usize, pinyin: Option<&str>) -> Character {
        Character {
            glyph,
            strokes: (0..strokes).map(|n| stroke_path(glyph, n)).collect(),
            pronunciation: pinyin.map(str::to_string),
        }
    }

    pub fn sample_store() -> CharacterStore {
        CharacterStore::from_characters(
            SAMPLE
                .iter()
                .map(|&(glyph, strokes, pinyin)| sample_character(glyph, strokes, Some(pinyin))),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
