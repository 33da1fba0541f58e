//! Matching game for active recall over term/definition pairs.
//!
//! Every pair yields two tiles. The player clicks one tile, then another:
//! tiles from the same pair become matched, anything else is flagged as a
//! mismatch that the caller reverts after [`MISMATCH_REVERT_DELAY`].

use crate::error::SelectionError;
use crate::types::MatchingPair;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How long a mismatched pair stays visible before it is reverted.
pub const MISMATCH_REVERT_DELAY: Duration = Duration::from_millis(800);

/// Source of board generations, shared by every engine in the process.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Which side of a pair a tile shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Term,
    Definition,
}

/// Stable tile identity: the owning pair plus the side it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub pair_index: usize,
    pub kind: TileKind,
}

impl TileId {
    pub fn term(pair_index: usize) -> Self {
        Self {
            pair_index,
            kind: TileKind::Term,
        }
    }

    pub fn definition(pair_index: usize) -> Self {
        Self {
            pair_index,
            kind: TileKind::Definition,
        }
    }

    /// Parse the `term-N` / `def-N` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (prefix, index) = s.trim().split_once('-')?;
        let pair_index = index.parse().ok()?;
        match prefix {
            "term" => Some(Self::term(pair_index)),
            "def" => Some(Self::definition(pair_index)),
            _ => None,
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TileKind::Term => write!(f, "term-{}", self.pair_index),
            TileKind::Definition => write!(f, "def-{}", self.pair_index),
        }
    }
}

/// Tile display status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    Unselected,
    Selected,
    Matched,
    Mismatched,
}

impl Default for TileStatus {
    fn default() -> Self {
        Self::Unselected
    }
}

/// A clickable tile on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub text: String,
    pub kind: TileKind,
    pub pair_index: usize,
    pub status: TileStatus,
}

/// A revert the caller must apply once the mismatch delay has elapsed.
///
/// Targets two specific tiles on one specific board, so applying it late or
/// twice is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingRevert {
    generation: u64,
    tiles: [TileId; 2],
}

impl PendingRevert {
    /// The previously selected tile and the mismatched tile.
    pub fn tiles(&self) -> [TileId; 2] {
        self.tiles
    }

    /// Board generation the revert belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of a tile click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectOutcome {
    Selected,
    Deselected,
    Matched { complete: bool },
    Mismatched(PendingRevert),
}

/// Matching game state.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    pairs: Vec<MatchingPair>,
    tiles: Vec<Tile>,
    selected: Option<TileId>,
    generation: u64,
}

impl MatchingEngine {
    /// Create a game with a freshly shuffled board.
    pub fn new(pairs: Vec<MatchingPair>) -> Self {
        let mut engine = Self {
            pairs,
            tiles: Vec::new(),
            selected: None,
            generation: 0,
        };
        engine.deal();
        engine
    }

    /// Replace the pairs and deal a new board.
    pub fn initialize(&mut self, pairs: Vec<MatchingPair>) {
        self.pairs = pairs;
        self.deal();
    }

    /// Deal a new board from the same pairs ("play again").
    pub fn reset(&mut self) {
        self.deal();
    }

    fn deal(&mut self) {
        let mut tiles = Vec::with_capacity(self.pairs.len() * 2);
        for (index, pair) in self.pairs.iter().enumerate() {
            tiles.push(Tile {
                id: TileId::term(index),
                text: pair.term.clone(),
                kind: TileKind::Term,
                pair_index: index,
                status: TileStatus::Unselected,
            });
            tiles.push(Tile {
                id: TileId::definition(index),
                text: pair.definition.clone(),
                kind: TileKind::Definition,
                pair_index: index,
                status: TileStatus::Unselected,
            });
        }
        tiles.shuffle(&mut rand::thread_rng());

        self.tiles = tiles;
        self.selected = None;
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
    }

    /// Tiles in display order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn pairs(&self) -> &[MatchingPair] {
        &self.pairs
    }

    /// The tile waiting for its partner, if any.
    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    /// Changes on every deal. No two boards in a process share one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False when there are no pairs; nothing should be rendered then.
    pub fn has_board(&self) -> bool {
        !self.tiles.is_empty()
    }

    /// True when every tile is matched (vacuously true for an empty board).
    pub fn is_complete(&self) -> bool {
        self.tiles.iter().all(|t| t.status == TileStatus::Matched)
    }

    /// Number of matched pairs so far.
    pub fn matched_pairs(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.status == TileStatus::Matched)
            .count()
            / 2
    }

    fn position(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// Handle a click on a tile.
    pub fn select_tile(&mut self, id: TileId) -> Result<SelectOutcome, SelectionError> {
        let clicked = self.position(id).ok_or(SelectionError::UnknownTile(id))?;

        if self.tiles[clicked].status == TileStatus::Matched {
            return Err(SelectionError::TileMatched(id));
        }

        if self.selected == Some(id) {
            self.tiles[clicked].status = TileStatus::Unselected;
            self.selected = None;
            return Ok(SelectOutcome::Deselected);
        }

        let Some(first_id) = self.selected else {
            self.tiles[clicked].status = TileStatus::Selected;
            self.selected = Some(id);
            return Ok(SelectOutcome::Selected);
        };

        let first = self
            .position(first_id)
            .ok_or(SelectionError::UnknownTile(first_id))?;

        if self.tiles[first].pair_index == self.tiles[clicked].pair_index {
            self.tiles[first].status = TileStatus::Matched;
            self.tiles[clicked].status = TileStatus::Matched;
            self.selected = None;
            Ok(SelectOutcome::Matched {
                complete: self.is_complete(),
            })
        } else {
            self.tiles[clicked].status = TileStatus::Mismatched;
            Ok(SelectOutcome::Mismatched(PendingRevert {
                generation: self.generation,
                tiles: [first_id, id],
            }))
        }
    }

    /// Revert a mismatch. Returns whether anything changed.
    ///
    /// Reverts from an earlier board are ignored and matched tiles are never
    /// touched.
    pub fn apply_revert(&mut self, revert: &PendingRevert) -> bool {
        if revert.generation != self.generation {
            return false;
        }

        let mut changed = false;
        for tile in self
            .tiles
            .iter_mut()
            .filter(|t| revert.tiles.contains(&t.id))
        {
            if matches!(tile.status, TileStatus::Selected | TileStatus::Mismatched) {
                tile.status = TileStatus::Unselected;
                changed = true;
            }
        }

        if self.selected.map_or(false, |s| revert.tiles.contains(&s)) {
            self.selected = None;
            changed = true;
        }

        changed
    }
}
