//! Page Packer: places the tile stream onto fixed-size grid pages.
//!
//! # Grid rules
//! - Page is `PAGE_WIDTH × PAGE_HEIGHT` units; `cells_per_row = width / tile_size`,
//!   `total_rows = height / tile_size`.
//! - Cells are enumerated row-major over `cells_per_row * (total_rows - 1)` slots, and
//!   enumeration stops at the first row with `row + 3 > total_rows`. The net effect is a
//!   bottom margin; both rules are kept as-is so pages match existing printouts.
//! - A tile at `(col, row)` is drawn at `x = col * tile_size`, `y = (row + 1) * tile_size`;
//!   the top row is left for the header.
//! - The left/top guide line of a tile is thickened when the neighbour on that side belongs
//!   to another group.

use tracing::debug;

use crate::sheet::header::Header;
use crate::sheet::tile::{PositionedTile, TileSpec};
use crate::sheet::SheetError;

pub const PAGE_WIDTH: u32 = 200;
pub const PAGE_HEIGHT: u32 = 300;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    tile_size: u32,
    cells_per_row: u32,
    total_rows: u32,
}

impl GridGeometry {
    /// Fails for a zero tile size or one too large to leave a single usable cell.
    pub fn new(tile_size: u32) -> Result<Self, SheetError> {
        if tile_size == 0 {
            return Err(SheetError::InvalidConfiguration(
                "tile size must be positive".to_string(),
            ));
        }
        let geometry = Self {
            tile_size,
            cells_per_row: PAGE_WIDTH / tile_size,
            total_rows: PAGE_HEIGHT / tile_size,
        };
        if geometry.capacity() == 0 {
            return Err(SheetError::InvalidConfiguration(format!(
                "tile size {tile_size} leaves no room for a tile on a {PAGE_WIDTH}x{PAGE_HEIGHT} page"
            )));
        }
        Ok(geometry)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn cells_per_row(&self) -> u32 {
        self.cells_per_row
    }

    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// `(col, row)` for every usable cell, in fill order.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> {
        let per_row = self.cells_per_row();
        let total_rows = self.total_rows();
        let slots = per_row * total_rows.saturating_sub(1);
        (0..slots)
            .map(move |i| (i % per_row, i / per_row))
            .take_while(move |&(_, row)| row + 3 <= total_rows)
    }

    /// Usable cells per page.
    pub fn capacity(&self) -> usize {
        self.positions().count()
    }

    /// Page-unit offset of a cell.
    pub fn offset(&self, col: u32, row: u32) -> (u32, u32) {
        (col * self.tile_size, (row + 1) * self.tile_size)
    }

    fn cell_index(&self, col: u32, row: u32) -> usize {
        (row * self.cells_per_row() + col) as usize
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page
// ────────────────────────────────────────────────────────────────────────────

/// One page being filled. Cells are a flat arena indexed by `row * cells_per_row + col`.
#[derive(Debug)]
pub struct Page<'a> {
    number: usize,
    geometry: GridGeometry,
    cells: Vec<Option<PositionedTile<'a>>>,
    header: Header,
    placed: usize,
}

/// A finished page: SVG markup plus what tests and logs need to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub number: usize,
    pub tile_count: usize,
    pub header_lines: Vec<String>,
    pub markup: String,
}

impl<'a> Page<'a> {
    fn new(number: usize, geometry: GridGeometry) -> Self {
        let cells = (geometry.cells_per_row() * geometry.total_rows()) as usize;
        Self {
            number,
            geometry,
            cells: vec![None; cells],
            header: Header::new(),
            placed: 0,
        }
    }

    fn place(&mut self, col: u32, row: u32, spec: TileSpec<'a>) {
        let (x, y) = self.geometry.offset(col, row);
        let mut tile = PositionedTile::new(spec, x, y, self.geometry.tile_size());

        if !tile.spec().excluded_from_header() {
            self.header.observe(tile.spec().character());
        }

        let group = tile.spec().group();
        let differs = |other: Option<&PositionedTile<'_>>| {
            other.is_some_and(|other| other.spec().group() != group)
        };
        if row > 0 && differs(self.tile_at(col, row - 1)) {
            tile.thicken_top();
        }
        if col > 0 && differs(self.tile_at(col - 1, row)) {
            tile.thicken_left();
        }

        let index = self.geometry.cell_index(col, row);
        debug_assert!(self.cells[index].is_none(), "cell ({col}, {row}) placed twice");
        self.cells[index] = Some(tile);
        self.placed += 1;
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn tile_count(&self) -> usize {
        self.placed
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn tile_at(&self, col: u32, row: u32) -> Option<&PositionedTile<'a>> {
        if col >= self.geometry.cells_per_row() || row >= self.geometry.total_rows() {
            return None;
        }
        self.cells[self.geometry.cell_index(col, row)].as_ref()
    }

    /// Placed tiles with their `(col, row)`, in fill order.
    pub fn tiles(&self) -> impl Iterator<Item = ((u32, u32), &PositionedTile<'a>)> + '_ {
        let per_row = self.geometry.cells_per_row();
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let i = i as u32;
            cell.as_ref().map(|tile| ((i % per_row, i / per_row), tile))
        })
    }

    /// Full-page SVG: tiles in fill order, then the header.
    pub fn render(&self) -> String {
        let mut markup = format!(
            r#"<svg width="100%" height="100%" viewBox="0 0 {PAGE_WIDTH} {PAGE_HEIGHT}" version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
        );
        for (_, tile) in self.tiles() {
            markup.push_str(&tile.render());
        }
        markup.push_str(&self.header.render(self.number));
        markup.push_str("</svg>");
        markup
    }

    pub fn finish(self) -> RenderedPage {
        RenderedPage {
            number: self.number,
            tile_count: self.placed,
            header_lines: self.header.lines().into_iter().map(str::to_string).collect(),
            markup: self.render(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Packer
// ────────────────────────────────────────────────────────────────────────────

/// Pulls tiles one cell at a time and yields each page once it is full or the stream ends.
///
/// A page is only started when at least one more tile exists; after the stream runs dry
/// the packer yields nothing further.
pub struct PagePacker<I: Iterator> {
    geometry: GridGeometry,
    tiles: std::iter::Peekable<I>,
    pages: usize,
    exhausted: bool,
}

impl<I: Iterator> PagePacker<I> {
    pub fn new(geometry: GridGeometry, tiles: I) -> Self {
        Self {
            geometry,
            tiles: tiles.peekable(),
            pages: 0,
            exhausted: false,
        }
    }
}

impl<'a, I: Iterator<Item = TileSpec<'a>>> Iterator for PagePacker<I> {
    type Item = Page<'a>;

    fn next(&mut self) -> Option<Page<'a>> {
        if self.exhausted || self.tiles.peek().is_none() {
            self.exhausted = true;
            return None;
        }

        self.pages += 1;
        let mut page = Page::new(self.pages, self.geometry);
        for (col, row) in self.geometry.positions() {
            let Some(spec) = self.tiles.next() else {
                self.exhausted = true;
                break;
            };
            page.place(col, row, spec);
        }

        debug!(
            page = page.number(),
            tiles = page.tile_count(),
            characters = page.header().characters().len(),
            header_wrapped = page.header().is_wrapped(),
            last = self.exhausted,
            "Packed page"
        );
        Some(page)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{sample_character, sample_store};
    use crate::dataset::Character;
    use crate::sheet::sequencer::TileSequence;
    use crate::sheet::tile::{DEFAULT_EDGE_WIDTH, THICK_EDGE_WIDTH};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn specs<'a>(c: &'a Character, groups: &[usize]) -> Vec<TileSpec<'a>> {
        groups
            .iter()
            .map(|&g| TileSpec::new(c, g, 0, 0, None))
            .collect()
    }

    // ── geometry ────────────────────────────────────────────────────────────

    #[test]
    fn test_geometry_tile_12() {
        let g = GridGeometry::new(12).unwrap();
        assert_eq!(g.cells_per_row(), 16);
        assert_eq!(g.total_rows(), 25);
        // Rows 0..=22 are usable (row + 3 <= 25).
        assert_eq!(g.capacity(), 16 * 23);
        assert_eq!(g.positions().last(), Some((15, 22)));
    }

    #[test]
    fn test_geometry_tile_30() {
        let g = GridGeometry::new(30).unwrap();
        assert_eq!(g.cells_per_row(), 6);
        assert_eq!(g.total_rows(), 10);
        assert_eq!(g.capacity(), 6 * 8);
    }

    #[test]
    fn test_geometry_positions_row_major() {
        let g = GridGeometry::new(50).unwrap();
        // 4 per row, 6 rows total, rows 0..=3 usable.
        let positions: Vec<_> = g.positions().collect();
        assert_eq!(positions.len(), 16);
        assert_eq!(&positions[..5], &[(0, 0), (1, 0), (2, 0), (3, 0), (0, 1)]);
    }

    #[test]
    fn test_geometry_largest_valid_tile() {
        let g = GridGeometry::new(100).unwrap();
        assert_eq!(g.positions().collect::<Vec<_>>(), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_geometry_rejects_zero_and_oversized() {
        assert!(matches!(
            GridGeometry::new(0),
            Err(SheetError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GridGeometry::new(101),
            Err(SheetError::InvalidConfiguration(_))
        ));
        assert!(GridGeometry::new(500).is_err());
    }

    #[test]
    fn test_geometry_offset_skips_top_row() {
        let g = GridGeometry::new(12).unwrap();
        assert_eq!(g.offset(0, 0), (0, 12));
        assert_eq!(g.offset(3, 2), (36, 36));
    }

    // ── packing ─────────────────────────────────────────────────────────────

    #[test]
    fn test_positions_unique_and_in_bounds() {
        let store = sample_store();
        let chars: Vec<char> = "谢亮买书中".chars().collect();
        let seq = TileSequence::new(&store, &chars, 2, StdRng::seed_from_u64(3)).unwrap();
        let g = GridGeometry::new(20).unwrap();
        let capacity = g.capacity();
        let pages: Vec<_> = PagePacker::new(g, seq).collect();
        assert!(pages.len() >= 2);

        for page in &pages {
            let mut seen = HashSet::new();
            for ((col, row), tile) in page.tiles() {
                assert!(seen.insert((col, row)));
                assert!(col < g.cells_per_row());
                assert!(row + 3 <= g.total_rows());
                assert_eq!(tile.position(), g.offset(col, row));
                assert_eq!(tile.edge(), 20);
            }
            assert!(page.tile_count() <= capacity);
        }
    }

    #[test]
    fn test_page_counts_add_up() {
        let c = sample_character('谢', 12, Some("xiè"));
        let tiles = specs(&c, &[0; 100]);
        let g = GridGeometry::new(30).unwrap();
        let pages: Vec<_> = PagePacker::new(g, tiles.into_iter()).collect();
        let counts: Vec<usize> = pages.iter().map(Page::tile_count).collect();
        assert_eq!(counts, vec![48, 48, 4]);
        let numbers: Vec<usize> = pages.iter().map(Page::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_exact_fill_has_no_trailing_empty_page() {
        let c = sample_character('一', 1, None);
        let g = GridGeometry::new(30).unwrap();
        let tiles = specs(&c, &vec![0; g.capacity() * 2]);
        let mut packer = PagePacker::new(g, tiles.into_iter());
        assert_eq!(packer.next().map(|p| p.tile_count()), Some(48));
        assert_eq!(packer.next().map(|p| p.tile_count()), Some(48));
        assert!(packer.next().is_none());
        assert!(packer.next().is_none());
    }

    #[test]
    fn test_empty_stream_has_no_pages() {
        let g = GridGeometry::new(30).unwrap();
        let mut packer = PagePacker::new(g, std::iter::empty());
        assert!(packer.next().is_none());
    }

    #[test]
    fn test_packer_pulls_only_what_fits() {
        let c = sample_character('一', 1, None);
        let g = GridGeometry::new(30).unwrap();
        let mut source = specs(&c, &[0; 60]).into_iter();
        let page = PagePacker::new(g, source.by_ref()).next().unwrap();
        assert_eq!(page.tile_count(), 48);
        assert_eq!(source.len(), 12);
    }

    // ── borders ─────────────────────────────────────────────────────────────

    #[test]
    fn test_border_thickened_iff_neighbour_group_differs() {
        let c = sample_character('一', 1, None);
        let g = GridGeometry::new(50).unwrap(); // 4 per row
        // Row 0: groups 0 0 1 1 ; Row 1: 1 1 1 2
        let tiles = specs(&c, &[0, 0, 1, 1, 1, 1, 1, 2]);
        let page = PagePacker::new(g, tiles.into_iter()).next().unwrap();

        let widths = |col, row| {
            let t = page.tile_at(col, row).unwrap();
            (t.left_width(), t.top_width())
        };
        let (d, t) = (DEFAULT_EDGE_WIDTH, THICK_EDGE_WIDTH);
        // First row/column never thicken from a missing neighbour.
        assert_eq!(widths(0, 0), (d, d));
        assert_eq!(widths(1, 0), (d, d));
        assert_eq!(widths(2, 0), (t, d));
        assert_eq!(widths(3, 0), (d, d));
        assert_eq!(widths(0, 1), (d, t));
        assert_eq!(widths(1, 1), (d, t));
        assert_eq!(widths(2, 1), (d, d));
        assert_eq!(widths(3, 1), (t, t));
    }

    #[test]
    fn test_groups_compare_by_identity_not_content() {
        let store = sample_store();
        // Repeats 0: every character is its own group, even when repeated.
        let chars: Vec<char> = "一一".chars().collect();
        let seq = TileSequence::new(&store, &chars, 0, StdRng::seed_from_u64(0)).unwrap();
        let page = PagePacker::new(GridGeometry::new(50).unwrap(), seq)
            .next()
            .unwrap();
        assert_eq!(page.tile_at(1, 0).unwrap().left_width(), THICK_EDGE_WIDTH);
    }

    // ── header / render ─────────────────────────────────────────────────────

    #[test]
    fn test_header_skips_recall_tiles() {
        let a = sample_character('一', 1, Some("yī"));
        let b = sample_character('二', 2, Some("èr"));
        let tiles = vec![
            TileSpec::recall(&b, 0),
            TileSpec::new(&a, 0, 0, 0, None),
            TileSpec::recall(&b, 0),
        ];
        let page = PagePacker::new(GridGeometry::new(30).unwrap(), tiles.into_iter())
            .next()
            .unwrap();
        assert_eq!(page.header().characters(), &['一']);
    }

    #[test]
    fn test_finish_renders_tiles_then_header() {
        let a = sample_character('一', 1, Some("yī"));
        let tiles = specs(&a, &[0, 0, 0]);
        let page = PagePacker::new(GridGeometry::new(30).unwrap(), tiles.into_iter())
            .next()
            .unwrap();
        let rendered = page.finish();
        assert_eq!(rendered.number, 1);
        assert_eq!(rendered.tile_count, 3);
        assert_eq!(rendered.header_lines, vec!["一 (yī)".to_string()]);
        assert!(rendered
            .markup
            .starts_with(r#"<svg width="100%" height="100%" viewBox="0 0 200 300""#));
        assert!(rendered.markup.ends_with("</tspan></text></svg>"));
        assert_eq!(rendered.markup.matches(r#"<svg x="#).count(), 3);
        let header_at = rendered.markup.find("<text x=\"0\" y=\"5\"").unwrap();
        let last_tile_at = rendered.markup.rfind("<svg x=").unwrap();
        assert!(last_tile_at < header_at);
    }
}
