//! Tiles: one teaching instance of a character, and its SVG rendering.
//!
//! A `TileSpec` carries only pedagogical content (which strokes, which focus, which label).
//! Placement on a page is a packing concern: the packer turns a spec into a
//! `PositionedTile`, which is the only thing that can be rendered.

use crate::dataset::Character;

/// Left/top guide line width for an ordinary tile.
pub const DEFAULT_EDGE_WIDTH: u32 = 10;
/// Left/top guide line width where the neighbouring tile belongs to another group.
pub const THICK_EDGE_WIDTH: u32 = 30;

const FOCUS_STROKE_WIDTH: u32 = 20;
const CONTEXT_STROKE_WIDTH: u32 = 10;

// ────────────────────────────────────────────────────────────────────────────
// TileSpec
// ────────────────────────────────────────────────────────────────────────────

/// Immutable description of what a tile teaches.
///
/// Strokes drawn are `character.strokes[skip..stop]`; `skip <= stop <= stroke_count`
/// holds for every constructed spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSpec<'a> {
    character: &'a Character,
    group: usize,
    focus: usize,
    skip: usize,
    stop: usize,
    show_pronunciation: bool,
    exclude_from_header: bool,
}

impl<'a> TileSpec<'a> {
    /// `stop: None` draws through the last stroke. Out-of-range bounds are clamped.
    pub fn new(
        character: &'a Character,
        group: usize,
        focus: usize,
        skip: usize,
        stop: Option<usize>,
    ) -> Self {
        let count = character.stroke_count();
        let stop = stop.map_or(count, |s| s.min(count));
        Self {
            character,
            group,
            focus,
            skip: skip.min(stop),
            stop,
            show_pronunciation: false,
            exclude_from_header: false,
        }
    }

    /// A blank recall tile: no strokes, not listed in the page header.
    pub fn recall(character: &'a Character, group: usize) -> Self {
        Self {
            exclude_from_header: true,
            ..Self::new(character, group, 0, 0, Some(0))
        }
    }

    pub fn with_pronunciation(mut self, show: bool) -> Self {
        self.show_pronunciation = show;
        self
    }

    pub fn character(&self) -> &'a Character {
        self.character
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn stop(&self) -> usize {
        self.stop
    }

    pub fn shows_pronunciation(&self) -> bool {
        self.show_pronunciation
    }

    pub fn excluded_from_header(&self) -> bool {
        self.exclude_from_header
    }

    /// `(index, path)` for every stroke this tile draws.
    pub fn drawn_strokes(&self) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let character: &'a Character = self.character;
        let skip = self.skip();
        character.strokes[skip..self.stop()]
            .iter()
            .enumerate()
            .map(move |(i, path)| (skip + i, path.as_str()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PositionedTile
// ────────────────────────────────────────────────────────────────────────────

/// A tile placed on a page. Built only by the page packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedTile<'a> {
    spec: TileSpec<'a>,
    x: u32,
    y: u32,
    edge: u32,
    left_width: u32,
    top_width: u32,
}

impl<'a> PositionedTile<'a> {
    pub(super) fn new(spec: TileSpec<'a>, x: u32, y: u32, edge: u32) -> Self {
        Self {
            spec,
            x,
            y,
            edge,
            left_width: DEFAULT_EDGE_WIDTH,
            top_width: DEFAULT_EDGE_WIDTH,
        }
    }

    pub(super) fn thicken_left(&mut self) {
        self.left_width = THICK_EDGE_WIDTH;
    }

    pub(super) fn thicken_top(&mut self) {
        self.top_width = THICK_EDGE_WIDTH;
    }

    pub fn spec(&self) -> &TileSpec<'a> {
        &self.spec
    }

    pub fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn edge(&self) -> u32 {
        self.edge
    }

    pub fn left_width(&self) -> u32 {
        self.left_width
    }

    pub fn top_width(&self) -> u32 {
        self.top_width
    }

    /// Renders the tile as a nested SVG fragment positioned in page units.
    ///
    /// Guide lines live in a 256-unit box scaled ×4 onto the 1024 viewBox; stroke paths
    /// are authored y-up, so the stroke layer is flipped and shifted down by 900.
    pub fn render(&self) -> String {
        let spec = self.spec();
        let label = if spec.shows_pronunciation() {
            spec.character().pronunciation.as_deref().unwrap_or("")
        } else {
            ""
        };
        let (x, y) = self.position();
        let edge = self.edge();

        let mut out = String::with_capacity(1024 + 128 * spec.character().stroke_count());
        out.push_str(&format!(
            r#"<svg x="{x}" y="{y}" width="{edge}" height="{edge}"><svg version="1.1" viewBox="0 0 1024 1024" xmlns="http://www.w3.org/2000/svg">"#
        ));
        out.push_str(&format!(
            r#"<text x="50" y="950" font-size="300px">{}</text>"#,
            escape_xml(label)
        ));
        out.push_str(&format!(
            concat!(
                r#"<g stroke="black" stroke-width="2" transform="scale(4, 4)">"#,
                r#"<line x1="0" y1="0" x2="0" y2="256" stroke-width="{left}"></line>"#,
                r#"<line x1="0" y1="0" x2="256" y2="256"></line>"#,
                r#"<line x1="256" y1="0" x2="0" y2="256"></line>"#,
                r#"<line x1="256" y1="0" x2="0" y2="0" stroke-width="{top}"></line>"#,
                r#"<line x1="256" y1="0" x2="256" y2="256"></line>"#,
                r#"<line x1="128" y1="0" x2="128" y2="256"></line>"#,
                r#"<line x1="0" y1="128" x2="256" y2="128"></line>"#,
                r#"<line x1="0" y1="256" x2="256" y2="256"></line>"#,
                r#"</g>"#,
                r#"<g transform="scale(1, -1) translate(0, -900)">"#,
            ),
            left = self.left_width(),
            top = self.top_width(),
        ));
        for (index, path) in spec.drawn_strokes() {
            let width = if index <= spec.focus() {
                FOCUS_STROKE_WIDTH
            } else {
                CONTEXT_STROKE_WIDTH
            };
            out.push_str(&format!(
                r#"<path d="{}" stroke="black" stroke-width="{width}" fill="white"></path>"#,
                escape_xml(path)
            ));
        }
        out.push_str("</g></svg></svg>");
        out
    }
}

/// Escapes text for use in SVG element content and double-quoted attributes.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
