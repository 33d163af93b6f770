//! Tile Sequencer: expands a character sequence into the ordered stream of practice tiles.
//!
//! # Order
//! Characters are processed in groups of `CHUNK_SIZE` (1 when `repeats == 0`). For every
//! stroke `n` of every character in a group, three phases are emitted, each `repeats` times:
//! 1. isolated: strokes `0..=n`, pronunciation on the very first tile of the character
//! 2. whole character: all strokes, stroke `n` and earlier in bold
//! 3. in context: strokes after `n` only
//!
//! After each group, a recall batch repeats each of its characters `repeats * 2` times in
//! shuffled order, drawn as blank tiles. With `repeats == 0` there is one whole-character tile
//! per stroke and no recall batch.
//!
//! `TileSequence` is a plain iterator: nothing is built until the packer asks for it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::{Character, CharacterStore};
use crate::sheet::tile::TileSpec;
use crate::sheet::SheetError;

/// Characters per group when repetitions are enabled.
pub const CHUNK_SIZE: usize = 4;

pub fn chunk_size(repeats: usize) -> usize {
    if repeats == 0 {
        1
    } else {
        CHUNK_SIZE
    }
}

/// Exact number of tiles `TileSequence` yields for these characters.
pub fn expected_tile_count(characters: &[&Character], repeats: usize) -> usize {
    let strokes: usize = characters.iter().map(|c| c.stroke_count()).sum();
    if repeats == 0 {
        return strokes;
    }
    let phase_tiles = strokes.saturating_mul(3).saturating_mul(repeats);
    let recall_tiles = characters.len().saturating_mul(repeats).saturating_mul(2);
    phase_tiles.saturating_add(recall_tiles)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Isolated,
    Whole,
    Context,
}

/// Lazy, single-pass tile stream.
pub struct TileSequence<'a, R> {
    groups: Vec<Vec<&'a Character>>,
    repeats: usize,
    recall_hints: bool,
    rng: R,
    total: usize,
    emitted: usize,
    // Cursor
    group: usize,
    member: usize,
    stroke: usize,
    phase: Phase,
    rep: usize,
    recall: Option<std::vec::IntoIter<&'a Character>>,
}

impl<'a, R: Rng> TileSequence<'a, R> {
    /// Resolves every character up front, so an unknown character fails before any tile
    /// exists.
    pub fn new(
        store: &'a CharacterStore,
        characters: &[char],
        repeats: usize,
        rng: R,
    ) -> Result<Self, SheetError> {
        let resolved = characters
            .iter()
            .map(|&c| store.lookup(c))
            .collect::<Result<Vec<_>, _>>()?;

        let total = expected_tile_count(&resolved, repeats);
        let groups = resolved
            .chunks(chunk_size(repeats))
            .map(<[_]>::to_vec)
            .collect();

        Ok(Self {
            groups,
            repeats,
            recall_hints: false,
            rng,
            total,
            emitted: 0,
            group: 0,
            member: 0,
            stroke: 0,
            phase: Phase::Isolated,
            rep: 0,
            recall: None,
        })
    }

    /// Shows the pronunciation on recall tiles.
    pub fn with_recall_hints(mut self, hints: bool) -> Self {
        self.recall_hints = hints;
        self
    }

    /// Total tiles this sequence yields from the start.
    pub fn total(&self) -> usize {
        self.total
    }

    fn stroke_tile(&self, character: &'a Character) -> TileSpec<'a> {
        let n = self.stroke;
        if self.repeats == 0 {
            return TileSpec::new(character, self.group, n, 0, None);
        }
        match self.phase {
            // Only the first tile of a character gets a label, where it is least likely
            // to overlap strokes.
            Phase::Isolated => TileSpec::new(character, self.group, n, 0, Some(n + 1))
                .with_pronunciation(n == 0 && self.rep == 0),
            Phase::Whole => TileSpec::new(character, self.group, n, 0, None),
            Phase::Context => TileSpec::new(character, self.group, n, n + 1, None),
        }
    }

    fn advance(&mut self) {
        if self.repeats == 0 {
            self.stroke += 1;
            return;
        }
        self.rep += 1;
        if self.rep < self.repeats {
            return;
        }
        self.rep = 0;
        self.phase = match self.phase {
            Phase::Isolated => Phase::Whole,
            Phase::Whole => Phase::Context,
            Phase::Context => {
                self.stroke += 1;
                Phase::Isolated
            }
        };
    }

    fn start_recall(&mut self) {
        let members = &self.groups[self.group];
        let mut pool: Vec<&'a Character> = members
            .iter()
            .copied()
            .cycle()
            .take(members.len().saturating_mul(self.repeats).saturating_mul(2))
            .collect();
        pool.shuffle(&mut self.rng);
        self.recall = Some(pool.into_iter());
    }

    fn next_group(&mut self) {
        self.group += 1;
        self.member = 0;
        self.stroke = 0;
        self.phase = Phase::Isolated;
        self.rep = 0;
    }
}

impl<'a, R: Rng> Iterator for TileSequence<'a, R> {
    type Item = TileSpec<'a>;

    fn next(&mut self) -> Option<TileSpec<'a>> {
        loop {
            if let Some(queue) = self.recall.as_mut() {
                if let Some(character) = queue.next() {
                    self.emitted += 1;
                    return Some(
                        TileSpec::recall(character, self.group)
                            .with_pronunciation(self.recall_hints),
                    );
                }
                self.recall = None;
                self.next_group();
                continue;
            }

            let character = self.groups.get(self.group)?.get(self.member).copied();
            let Some(character) = character else {
                if self.repeats == 0 {
                    self.next_group();
                } else {
                    self.start_recall();
                }
                continue;
            };

            if self.stroke >= character.stroke_count() {
                self.member += 1;
                self.stroke = 0;
                continue;
            }

            let tile = self.stroke_tile(character);
            self.advance();
            self.emitted += 1;
            return Some(tile);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.emitted);
        (remaining, Some(remaining))
    }
}

impl<'a, R: Rng> ExactSizeIterator for TileSequence<'a, R> {}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
