//! Grid representation and the capture rule.

use std::collections::BTreeSet;
use std::fmt;

use smallvec::SmallVec;

use crate::types::{Coord, Direction, Disk, BOARD_SIZE};

/// Glyph used for an empty cell.
const EMPTY_GLYPH: char = '.';
/// Glyph used for a legal target when an overlay is requested.
const TARGET_GLYPH: char = '*';

/// An 8x8 grid of cells, indexed `[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Disk>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// A board with no disks at all.
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// A board holding exactly `disks`. Later entries win on duplicates.
    pub fn from_disks(disks: impl IntoIterator<Item = (Coord, Disk)>) -> Self {
        let mut board = Self::empty();
        for (at, disk) in disks {
            board.set(at, disk);
        }
        board
    }

    /// The canonical opening cross: light on the main diagonal of the
    /// centre square, dark on the anti-diagonal.
    pub fn initial() -> Self {
        let mut board = Self::empty();
        let mid = BOARD_SIZE / 2 - 1;
        board.cells[mid][mid] = Some(Disk::Light);
        board.cells[mid][mid + 1] = Some(Disk::Dark);
        board.cells[mid + 1][mid] = Some(Disk::Dark);
        board.cells[mid + 1][mid + 1] = Some(Disk::Light);
        board
    }

    pub fn get(&self, at: Coord) -> Option<Disk> {
        self.cells[at.y()][at.x()]
    }

    pub(crate) fn set(&mut self, at: Coord, disk: Disk) {
        self.cells[at.y()][at.x()] = Some(disk);
    }

    pub fn count(&self, disk: Disk) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(disk))
            .count()
    }

    /// Rows top to bottom, for renderers.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Disk>; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Directions in which placing `disk` at `at` would capture at least one
    /// opponent disk. Empty when `at` is occupied.
    pub fn capture_directions(&self, at: Coord, disk: Disk) -> SmallVec<[Direction; 8]> {
        let mut dirs = SmallVec::new();
        if self.get(at).is_some() {
            return dirs;
        }
        let opponent = disk.flipped();

        for dir in Direction::ALL {
            let mut cursor = match at.step(dir) {
                Some(c) if self.get(c) == Some(opponent) => c,
                _ => continue,
            };
            loop {
                cursor = match cursor.step(dir) {
                    Some(c) => c,
                    None => break,
                };
                match self.get(cursor) {
                    Some(d) if d == disk => {
                        dirs.push(dir);
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
        dirs
    }

    pub fn is_legal_target(&self, at: Coord, disk: Disk) -> bool {
        !self.capture_directions(at, disk).is_empty()
    }

    pub fn legal_targets(&self, disk: Disk) -> BTreeSet<Coord> {
        Coord::all()
            .filter(|c| self.is_legal_target(*c, disk))
            .collect()
    }

    /// Put `disk` at `at` and flip every captured run. Legality is the
    /// caller's concern; an illegal placement simply flips nothing.
    /// Returns the flipped cells.
    pub(crate) fn place(&mut self, at: Coord, disk: Disk) -> Vec<Coord> {
        let dirs = self.capture_directions(at, disk);
        self.set(at, disk);

        let opponent = disk.flipped();
        let mut flipped = Vec::new();
        for dir in dirs {
            let mut cursor = at.step(dir);
            while let Some(c) = cursor {
                if self.get(c) != Some(opponent) {
                    break;
                }
                self.set(c, disk);
                flipped.push(c);
                cursor = c.step(dir);
            }
        }
        flipped
    }

    /// Text rendering, one row per line. Cells in `targets` are marked when given.
    pub fn render(&self, targets: Option<&BTreeSet<Coord>>) -> String {
        let mut out = String::with_capacity((BOARD_SIZE + 1) * BOARD_SIZE);
        for c in Coord::all() {
            let glyph = match self.get(c) {
                Some(disk) => disk.to_char(),
                None if targets.is_some_and(|t| t.contains(&c)) => TARGET_GLYPH,
                None => EMPTY_GLYPH,
            };
            out.push(glyph);
            if c.x() == BOARD_SIZE - 1 {
                out.push('\n');
            }
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}
