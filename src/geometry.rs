//! Grid coordinates and the rectangle effects are drawn into.
//!
//! Coordinates are 1-based. Column 1 is the leftmost column and row 1 is the *bottom* row of the
//! output area, so row numbers grow upwards. Coordinates outside the output area (including
//! `(0, 0)`) are perfectly valid positions for a character, they are just not drawn.

use crate::error::{Error, Result};
use rand::Rng;

/// A position on the character grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub column: i32,
    pub row: i32,
}

impl Coord {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }
}

/// Euclidean distance between two cells.
pub fn distance(a: Coord, b: Coord) -> f64 {
    let dx = (b.column - a.column) as f64;
    let dy = (b.row - a.row) as f64;
    dx.hypot(dy)
}

/// Linearly interpolate between two cells and round to the nearest cell.
///
/// `t` is not clamped, overshooting easings may land outside the segment.
pub fn lerp(start: Coord, end: Coord, t: f64) -> Coord {
    let column = start.column as f64 + (end.column - start.column) as f64 * t;
    let row = start.row as f64 + (end.row - start.row) as f64 * t;
    Coord::new(column.round() as i32, row.round() as i32)
}

/// The rectangle of the terminal that an effect renders into.
///
/// `bottom` and `left` are 1 for every area the compositor creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputArea {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl OutputArea {
    pub fn new(top: i32, right: i32) -> Self {
        Self {
            top,
            right,
            bottom: 1,
            left: 1,
        }
    }

    /// Number of rows in the area.
    pub fn height(&self) -> i32 {
        (self.top - self.bottom + 1).max(0)
    }

    /// Number of columns in the area.
    pub fn width(&self) -> i32 {
        (self.right - self.left + 1).max(0)
    }

    /// Returns true if the area contains at least one cell.
    pub fn has_extent(&self) -> bool {
        self.height() > 0 && self.width() > 0
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (self.left..=self.right).contains(&coord.column)
            && (self.bottom..=self.top).contains(&coord.row)
    }

    /// The cell closest to the middle of the area.
    pub fn center(&self) -> Coord {
        Coord::new(
            self.left + (self.width() - 1) / 2,
            self.bottom + (self.height() - 1) / 2,
        )
    }

    /// Picks a random coordinate.
    ///
    /// Without `outside_scope` the coordinate is uniformly distributed over the area. With
    /// `outside_scope` it lies strictly outside of it: a random edge is picked and the coordinate
    /// is placed up to a quarter of the area's extent beyond that edge.
    pub fn random_coord<R: Rng + ?Sized>(&self, rng: &mut R, outside_scope: bool) -> Result<Coord> {
        if !self.has_extent() {
            return Err(Error::EmptyOutputArea(*self));
        }
        let column = rng.gen_range(self.left..=self.right);
        let row = rng.gen_range(self.bottom..=self.top);
        if !outside_scope {
            return Ok(Coord::new(column, row));
        }

        let vertical_offset = 1 + rng.gen_range(0..=self.height() / 4);
        let horizontal_offset = 1 + rng.gen_range(0..=self.width() / 4);
        let coord = match rng.gen_range(0..4) {
            0 => Coord::new(column, self.top + vertical_offset),
            1 => Coord::new(column, self.bottom - vertical_offset),
            2 => Coord::new(self.left - horizontal_offset, row),
            _ => Coord::new(self.right + horizontal_offset, row),
        };
        Ok(coord)
    }
}
