//! A single drawn cell.

use crate::rendering::color::Color;

/// Represents a single cell of a rendered frame: a symbol and its foreground color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    /// The character to be displayed.
    pub symbol: char,
    /// The foreground color of the symbol.
    pub color: Color,
}

impl Pixel {
    /// Creates a new `Pixel` with the terminal's default color.
    pub fn new(symbol: char) -> Self {
        Self {
            symbol,
            color: Color::Default,
        }
    }

    /// Returns a copy of `self` with a new foreground color.
    pub fn with_color(self, color: Color) -> Self {
        Self {
            symbol: self.symbol,
            color,
        }
    }

    /// An empty cell.
    pub fn blank() -> Self {
        Self::new(' ')
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self::blank()
    }
}
