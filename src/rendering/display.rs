//! 2D cell buffer covering an output area.
//!
//! The buffer is stored top row first, the order rows are printed in, while callers address
//! cells with bottom-up [`Coord`]s. Coordinates outside of the area are ignored by the setters
//! and return `None` from the getters, since characters routinely travel off-screen.

use crate::geometry::{Coord, OutputArea};
use std::fmt;
use std::fmt::{Debug, Formatter};

/// A 2D buffer of cells covering an [`OutputArea`].
///
/// # Example
///
/// ```rust
/// use tte::geometry::{Coord, OutputArea};
/// use tte::rendering::display::Display;
///
/// let mut display = Display::new(OutputArea::new(2, 3), '.');
/// display.set(Coord::new(1, 1), 'x');
/// let rows: Vec<String> = display.rows().map(|row| row.iter().collect()).collect();
/// assert_eq!(rows, vec!["...", "x.."]);
/// ```
pub struct Display<T> {
    area: OutputArea,
    width: usize,
    height: usize,
    default: T,
    cells: Vec<T>,
}

impl<T: Debug> Debug for Display<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Display {{ width: {}, height: {}, cells: {:?} }}",
            self.width, self.height, self.cells
        )
    }
}

impl<T: Clone> Display<T> {
    /// Creates a buffer for `area` with every cell set to `default`.
    pub fn new(area: OutputArea, default: T) -> Self {
        let width = area.width() as usize;
        let height = area.height() as usize;
        Self {
            area,
            width,
            height,
            default: default.clone(),
            cells: vec![default; width * height],
        }
    }

    /// Resets every cell to the default value.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = self.default.clone();
        }
    }
}

impl<T> Display<T> {
    /// Index into `cells` for a coordinate, or `None` if it lies outside the area.
    #[inline]
    fn get_index(&self, coord: Coord) -> Option<usize> {
        if !self.area.contains(coord) {
            return None;
        }
        let x = (coord.column - self.area.left) as usize;
        let y = (self.area.top - coord.row) as usize;
        Some(y * self.width + x)
    }

    pub fn area(&self) -> OutputArea {
        self.area
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, coord: Coord) -> Option<&T> {
        self.get_index(coord).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut T> {
        self.get_index(coord).map(|idx| &mut self.cells[idx])
    }

    /// Sets the cell at `coord` if it lies inside the area.
    pub fn set(&mut self, coord: Coord, value: T) {
        if let Some(cell) = self.get_mut(coord) {
            *cell = value;
        }
    }

    /// Iterates over the rows, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks panics on a zero chunk size
        self.cells.chunks(self.width.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_map_bottom_up() {
        let mut display = Display::new(OutputArea::new(3, 2), 0);
        display.set(Coord::new(1, 1), 1);
        display.set(Coord::new(2, 3), 2);
        let rows: Vec<Vec<i32>> = display.rows().map(|r| r.to_vec()).collect();
        assert_eq!(rows, vec![vec![0, 2], vec![0, 0], vec![1, 0]]);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut display = Display::new(OutputArea::new(2, 2), 'a');
        for coord in [
            Coord::new(0, 0),
            Coord::new(3, 1),
            Coord::new(1, 3),
            Coord::new(-4, 1),
        ] {
            display.set(coord, 'b');
            assert_eq!(display.get(coord), None);
        }
        assert!(display.rows().flatten().all(|&c| c == 'a'));
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new(OutputArea::new(1, 3), ' ');
        display.set(Coord::new(2, 1), '#');
        assert_eq!(display.get(Coord::new(2, 1)), Some(&'#'));
        display.clear();
        assert_eq!(display.get(Coord::new(2, 1)), Some(&' '));
    }
}
