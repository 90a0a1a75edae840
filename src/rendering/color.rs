//! Colors and gradients.
//!
//! Colors are either 24-bit RGB or an index into the xterm-256 palette. A [`Gradient`] turns a
//! handful of color stops into an evenly interpolated spectrum, which scenes use to animate
//! color transitions and effects use to assign final colors by position.

use crate::error::{Error, Result};
use crate::geometry::{Coord, OutputArea, distance};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SYSTEM_COLORS: [[u8; 3]; 16] = [
    [0, 0, 0],
    [128, 0, 0],
    [0, 128, 0],
    [128, 128, 0],
    [0, 0, 128],
    [128, 0, 128],
    [0, 128, 128],
    [192, 192, 192],
    [128, 128, 128],
    [255, 0, 0],
    [0, 255, 0],
    [255, 255, 0],
    [0, 0, 255],
    [255, 0, 255],
    [0, 255, 255],
    [255, 255, 255],
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// Represents colors for terminal rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Use the terminal's default foreground color.
    #[default]
    Default,
    /// An RGB color.
    Rgb([u8; 3]),
    /// An index into the xterm-256 palette.
    Xterm(u8),
}

impl Color {
    /// Returns the RGB value of the color, or `None` for the default color.
    pub fn rgb(self) -> Option<[u8; 3]> {
        match self {
            Color::Default => None,
            Color::Rgb(rgb) => Some(rgb),
            Color::Xterm(index) => Some(xterm_to_rgb(index)),
        }
    }

    /// Converts the color for output.
    ///
    /// With `xterm_only` RGB colors are approximated by the closest xterm-256 palette entry, for
    /// terminals without true color support.
    pub fn to_crossterm(self, xterm_only: bool) -> Option<crossterm::style::Color> {
        match self {
            Color::Default => None,
            Color::Rgb(rgb) if xterm_only => Some(crossterm::style::Color::AnsiValue(
                rgb_to_xterm(rgb),
            )),
            Color::Rgb([r, g, b]) => Some(crossterm::style::Color::Rgb { r, g, b }),
            Color::Xterm(index) => Some(crossterm::style::Color::AnsiValue(index)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Default => write!(f, "default"),
            Color::Rgb([r, g, b]) => write!(f, "{r:02x}{g:02x}{b:02x}"),
            Color::Xterm(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid color `{0}`, expected an xterm-256 index (0-255) or RGB hex (000000-ffffff)")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(s.to_string()))
            };
            return Ok(Color::Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]));
        }
        trimmed
            .parse::<u8>()
            .map(Color::Xterm)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

/// RGB value of an xterm-256 palette entry.
pub fn xterm_to_rgb(index: u8) -> [u8; 3] {
    match index {
        0..=15 => SYSTEM_COLORS[index as usize],
        16..=231 => {
            let i = index - 16;
            [
                CUBE_LEVELS[(i / 36) as usize],
                CUBE_LEVELS[((i / 6) % 6) as usize],
                CUBE_LEVELS[(i % 6) as usize],
            ]
        }
        _ => {
            let level = 8 + 10 * (index - 232);
            [level, level, level]
        }
    }
}

/// Closest xterm-256 palette entry for an RGB value.
///
/// The 16 system colors are skipped since terminals commonly remap them.
pub fn rgb_to_xterm(rgb: [u8; 3]) -> u8 {
    let dist = |other: [u8; 3]| -> u32 {
        rgb.iter()
            .zip(other)
            .map(|(&a, b)| (a as i32 - b as i32).pow(2) as u32)
            .sum()
    };
    (16..=255u8)
        .min_by_key(|&index| dist(xterm_to_rgb(index)))
        .unwrap_or(16)
}

/// Linearly interpolate between two colors in RGB space.
///
/// The default color has no RGB value and is treated as black.
pub fn lerp_color(a: Color, b: Color, t: f64) -> Color {
    let a = a.rgb().unwrap_or([0, 0, 0]);
    let b = b.rgb().unwrap_or([0, 0, 0]);
    let channel = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * t).round() as u8;
    Color::Rgb([channel(0), channel(1), channel(2)])
}

/// How a gradient is laid over the output area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GradientDirection {
    /// Bottom row to top row.
    #[default]
    Vertical,
    /// Left column to right column.
    Horizontal,
    /// Bottom-left corner to top-right corner.
    Diagonal,
    /// Center outwards.
    Radial,
}

/// An interpolated sequence of colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    spectrum: Vec<Color>,
}

impl Gradient {
    /// Builds a gradient through `stops`.
    ///
    /// `steps[i]` is the number of colors generated between stop `i` and stop `i + 1`; if there
    /// are fewer step counts than stop pairs, the last step count is reused. A single stop yields
    /// a one-color spectrum.
    pub fn new(stops: &[Color], steps: &[usize]) -> Result<Self> {
        let Some(&first) = stops.first() else {
            return Err(Error::EmptyGradient);
        };
        if steps.iter().any(|&s| s == 0) {
            return Err(Error::InvalidGradientSteps);
        }
        let mut spectrum = vec![first];
        for (i, pair) in stops.windows(2).enumerate() {
            let step_count = steps
                .get(i)
                .or(steps.last())
                .copied()
                .ok_or(Error::InvalidGradientSteps)?;
            for step in 1..=step_count {
                spectrum.push(lerp_color(pair[0], pair[1], step as f64 / step_count as f64));
            }
        }
        Ok(Self { spectrum })
    }

    pub fn spectrum(&self) -> &[Color] {
        &self.spectrum
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    pub fn first(&self) -> Color {
        self.spectrum[0]
    }

    pub fn last(&self) -> Color {
        self.spectrum[self.spectrum.len() - 1]
    }

    /// The color at `fraction` of the way through the spectrum.
    pub fn color_at_fraction(&self, fraction: f64) -> Color {
        let max_index = self.spectrum.len() - 1;
        let index = (fraction.clamp(0.0, 1.0) * max_index as f64).round() as usize;
        self.spectrum[index.min(max_index)]
    }

    /// Maps every cell of a `top` x `right` area to a gradient color.
    pub fn build_coordinate_color_mapping(
        &self,
        top: i32,
        right: i32,
        direction: GradientDirection,
    ) -> HashMap<Coord, Color> {
        let area = OutputArea::new(top, right);
        let center = area.center();
        let max_radius = distance(center, Coord::new(1, 1))
            .max(distance(center, Coord::new(right, top)))
            .max(distance(center, Coord::new(1, top)))
            .max(distance(center, Coord::new(right, 1)));
        let fraction = |numerator: i32, denominator: i32| {
            if denominator <= 0 {
                0.0
            } else {
                numerator as f64 / denominator as f64
            }
        };

        let mut mapping = HashMap::with_capacity((top.max(0) * right.max(0)) as usize);
        for row in 1..=top {
            for column in 1..=right {
                let coord = Coord::new(column, row);
                let progress = match direction {
                    GradientDirection::Vertical => fraction(row - 1, top - 1),
                    GradientDirection::Horizontal => fraction(column - 1, right - 1),
                    GradientDirection::Diagonal => fraction(row + column - 2, top + right - 2),
                    GradientDirection::Radial if max_radius > 0.0 => {
                        distance(center, coord) / max_radius
                    }
                    GradientDirection::Radial => 0.0,
                };
                mapping.insert(coord, self.color_at_fraction(progress));
            }
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!("ff9048".parse(), Ok(Color::Rgb([0xff, 0x90, 0x48])));
        assert_eq!("#00D1FF".parse(), Ok(Color::Rgb([0x00, 0xd1, 0xff])));
        assert_eq!("196".parse(), Ok(Color::Xterm(196)));
        assert!("256".parse::<Color>().is_err());
        assert!("fffff".parse::<Color>().is_err());
        assert!("gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for color in [Color::Rgb([1, 2, 255]), Color::Xterm(42)] {
            assert_eq!(color.to_string().parse(), Ok(color));
        }
    }

    #[test]
    fn test_xterm_palette() {
        assert_eq!(xterm_to_rgb(0), [0, 0, 0]);
        assert_eq!(xterm_to_rgb(196), [255, 0, 0]);
        assert_eq!(xterm_to_rgb(232), [8, 8, 8]);
        assert_eq!(xterm_to_rgb(255), [238, 238, 238]);
        assert_eq!(rgb_to_xterm([255, 0, 0]), 196);
        assert_eq!(rgb_to_xterm([250, 2, 3]), 196);
    }

    #[test]
    fn test_gradient_spectrum() {
        let black = Color::Rgb([0, 0, 0]);
        let white = Color::Rgb([255, 255, 255]);
        let gradient = Gradient::new(&[black, white], &[4]).unwrap();
        assert_eq!(gradient.len(), 5);
        assert_eq!(gradient.first(), black);
        assert_eq!(gradient.last(), white);
        assert_eq!(gradient.spectrum()[2], Color::Rgb([128, 128, 128]));
    }

    #[test]
    fn test_gradient_reuses_last_step_count() {
        let stops = ["ff0000", "00ff00", "0000ff"].map(|s| s.parse::<Color>().unwrap());
        let gradient = Gradient::new(&stops, &[3]).unwrap();
        assert_eq!(gradient.len(), 1 + 3 + 3);
        assert_eq!(gradient.spectrum()[3], stops[1]);
        assert_eq!(gradient.last(), stops[2]);

        let gradient = Gradient::new(&stops, &[2, 5]).unwrap();
        assert_eq!(gradient.len(), 1 + 2 + 5);
    }

    #[test]
    fn test_gradient_errors() {
        assert!(matches!(Gradient::new(&[], &[3]), Err(Error::EmptyGradient)));
        assert!(matches!(
            Gradient::new(&[Color::Xterm(1), Color::Xterm(2)], &[0]),
            Err(Error::InvalidGradientSteps)
        ));
        assert!(matches!(
            Gradient::new(&[Color::Xterm(1), Color::Xterm(2)], &[]),
            Err(Error::InvalidGradientSteps)
        ));
        // a single stop needs no step counts
        assert_eq!(Gradient::new(&[Color::Xterm(1)], &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_coordinate_mapping() {
        let red = Color::Rgb([255, 0, 0]);
        let blue = Color::Rgb([0, 0, 255]);
        let gradient = Gradient::new(&[red, blue], &[10]).unwrap();

        let vertical = gradient.build_coordinate_color_mapping(3, 4, GradientDirection::Vertical);
        assert_eq!(vertical.len(), 12);
        assert_eq!(vertical[&Coord::new(2, 1)], red);
        assert_eq!(vertical[&Coord::new(2, 3)], blue);

        let horizontal =
            gradient.build_coordinate_color_mapping(3, 4, GradientDirection::Horizontal);
        assert_eq!(horizontal[&Coord::new(1, 3)], red);
        assert_eq!(horizontal[&Coord::new(4, 1)], blue);

        let diagonal = gradient.build_coordinate_color_mapping(3, 4, GradientDirection::Diagonal);
        assert_eq!(diagonal[&Coord::new(1, 1)], red);
        assert_eq!(diagonal[&Coord::new(4, 3)], blue);

        let radial = gradient.build_coordinate_color_mapping(5, 5, GradientDirection::Radial);
        assert_eq!(radial[&Coord::new(3, 3)], red);
        assert_eq!(radial[&Coord::new(1, 1)], blue);
    }

    #[test]
    fn test_single_row_mapping() {
        let gradient = Gradient::new(&[Color::Xterm(1), Color::Xterm(2)], &[4]).unwrap();
        let mapping = gradient.build_coordinate_color_mapping(1, 3, GradientDirection::Vertical);
        assert!(mapping.values().all(|&c| c == Color::Xterm(1)));
    }
}
