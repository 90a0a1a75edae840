//! Frame composition and terminal output.
//!
//! *   [`FrameBuffer`]: a [`Display`] of [`Pixel`]s plus a layer buffer, used to resolve which
//!     character is visible in a cell.
//! *   [`DisplayRenderer`]: owns the output stream and overwrites the rows of the previous frame
//!     in place. Rows that did not change since the last frame are not written again.

use crate::geometry::{Coord, OutputArea};
use crate::rendering::{display::Display, pixel::Pixel};
use crossterm::cursor::{MoveToColumn, MoveUp, RestorePosition, SavePosition};
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use std::io;
use std::io::Write;

/// How colors are written to the terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// 24-bit colors.
    #[default]
    TrueColor,
    /// Colors are approximated with the xterm-256 palette.
    Xterm256,
    /// No color sequences at all.
    Disabled,
}

/// A frame under construction.
///
/// Pixels are stamped with a layer. A pixel replaces the current content of its cell if its layer
/// is greater than or equal to the layer already stored there, so at equal layers the last
/// stamp wins.
pub struct FrameBuffer {
    display: Display<Pixel>,
    /// Layer of the pixel currently stored in each cell, `i32::MIN` for blank cells.
    layer_buffer: Display<i32>,
}

impl FrameBuffer {
    pub fn new(area: OutputArea) -> Self {
        Self {
            display: Display::new(area, Pixel::blank()),
            layer_buffer: Display::new(area, i32::MIN),
        }
    }

    /// Blanks every cell.
    pub fn reset(&mut self) {
        self.display.clear();
        self.layer_buffer.clear();
    }

    /// Stamps a pixel. Pixels outside of the output area are dropped.
    pub fn render_pixel(&mut self, coord: Coord, pixel: Pixel, layer: i32) {
        let Some(old_layer) = self.layer_buffer.get_mut(coord) else {
            return;
        };
        if layer < *old_layer {
            return;
        }
        *old_layer = layer;
        self.display.set(coord, pixel);
    }

    pub fn get(&self, coord: Coord) -> Option<&Pixel> {
        self.display.get(coord)
    }

    /// Formats the frame, top row first.
    ///
    /// Color sequences are only emitted when the color changes within a row, and every row that
    /// used a color ends with a color reset so rows can be rewritten independently.
    pub fn formatted_rows(&self, color_mode: ColorMode) -> Vec<String> {
        self.display
            .rows()
            .map(|row| {
                let mut line = String::with_capacity(row.len());
                let mut current = None;
                for pixel in row {
                    let color = match color_mode {
                        ColorMode::Disabled => None,
                        ColorMode::TrueColor => pixel.color.to_crossterm(false),
                        ColorMode::Xterm256 => pixel.color.to_crossterm(true),
                    };
                    if color != current {
                        match color {
                            Some(color) => line.push_str(&SetForegroundColor(color).to_string()),
                            None => line.push_str(&ResetColor.to_string()),
                        }
                        current = color;
                    }
                    line.push(pixel.symbol);
                }
                if current.is_some() {
                    line.push_str(&ResetColor.to_string());
                }
                line
            })
            .collect()
    }
}

/// Writes frames to an output sink, rewriting the previous frame in place.
///
/// Every row is written relative to the cursor: save the cursor, move up to the row, move to
/// column 1, print the row and restore the cursor. The cursor therefore stays on the line below
/// the output area for the whole run, which is where [`reserve_output_area`] leaves it.
///
/// [`reserve_output_area`]: DisplayRenderer::reserve_output_area
pub struct DisplayRenderer<W: Write> {
    sink: W,
    /// Rows of the previously printed frame, top row first.
    prev_rows: Vec<String>,
}

impl<W: Write> DisplayRenderer<W> {
    /// Creates a new `DisplayRenderer` with a custom output sink.
    pub fn new_with_sink(sink: W) -> Self {
        Self {
            sink,
            prev_rows: Vec::new(),
        }
    }

    /// Scrolls the terminal so that `height` empty lines are available above the cursor.
    pub fn reserve_output_area(&mut self, height: usize) -> io::Result<()> {
        queue!(self.sink, Print("\n".repeat(height)))?;
        self.sink.flush()
    }

    /// Prints a frame produced by [`Terminal::formatted_output`].
    ///
    /// Only rows that differ from the previous frame are written. If the number of rows changed,
    /// every row is written.
    ///
    /// [`Terminal::formatted_output`]: crate::terminal::Terminal::formatted_output
    pub fn print_frame(&mut self, frame: &str) -> io::Result<()> {
        let rows: Vec<&str> = frame.split('\n').collect();
        let render_everything = rows.len() != self.prev_rows.len();

        for (offset, row) in rows.iter().rev().enumerate() {
            let index = rows.len() - 1 - offset;
            if !render_everything && self.prev_rows[index] == *row {
                continue;
            }
            queue!(
                self.sink,
                SavePosition,
                MoveUp((offset + 1) as u16),
                MoveToColumn(0),
                Print(row),
                RestorePosition
            )?;
        }
        self.sink.flush()?;

        self.prev_rows = rows.into_iter().map(str::to_owned).collect();
        Ok(())
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::color::Color;

    fn plain_rows(buffer: &FrameBuffer) -> Vec<String> {
        buffer.formatted_rows(ColorMode::Disabled)
    }

    #[test]
    fn test_higher_layer_wins() {
        let mut buffer = FrameBuffer::new(OutputArea::new(1, 3));
        buffer.render_pixel(Coord::new(2, 1), Pixel::new('a'), 1);
        buffer.render_pixel(Coord::new(2, 1), Pixel::new('b'), 0);
        assert_eq!(plain_rows(&buffer), vec![" a "]);
        buffer.render_pixel(Coord::new(2, 1), Pixel::new('c'), 2);
        assert_eq!(plain_rows(&buffer), vec![" c "]);
    }

    #[test]
    fn test_equal_layer_last_stamp_wins() {
        let mut buffer = FrameBuffer::new(OutputArea::new(1, 1));
        buffer.render_pixel(Coord::new(1, 1), Pixel::new('a'), 0);
        buffer.render_pixel(Coord::new(1, 1), Pixel::new('b'), 0);
        assert_eq!(plain_rows(&buffer), vec!["b"]);
    }

    #[test]
    fn test_reset_blanks_layers() {
        let mut buffer = FrameBuffer::new(OutputArea::new(1, 1));
        buffer.render_pixel(Coord::new(1, 1), Pixel::new('a'), 5);
        buffer.reset();
        buffer.render_pixel(Coord::new(1, 1), Pixel::new('b'), 0);
        assert_eq!(plain_rows(&buffer), vec!["b"]);
    }

    #[test]
    fn test_colored_rows_reset_at_end() {
        let mut buffer = FrameBuffer::new(OutputArea::new(1, 3));
        let red = Color::Rgb([255, 0, 0]);
        buffer.render_pixel(Coord::new(1, 1), Pixel::new('a').with_color(red), 0);
        buffer.render_pixel(Coord::new(2, 1), Pixel::new('b').with_color(red), 0);
        let rows = buffer.formatted_rows(ColorMode::TrueColor);
        let red_sequence = SetForegroundColor(crossterm::style::Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(rows, vec![format!("{red_sequence}ab{ResetColor} ")]);

        let xterm_rows = buffer.formatted_rows(ColorMode::Xterm256);
        let xterm_red = SetForegroundColor(crossterm::style::Color::AnsiValue(196));
        assert!(xterm_rows[0].starts_with(&xterm_red.to_string()));
    }

    #[test]
    fn test_print_frame_skips_unchanged_rows() {
        let mut renderer = DisplayRenderer::new_with_sink(Vec::new());
        renderer.print_frame("top\nbot").unwrap();
        let first = String::from_utf8(renderer.sink().clone()).unwrap();
        assert!(first.contains("top"));
        assert!(first.contains("bot"));
        // the bottom row is one line above the cursor
        assert!(first.contains(&format!("{}{}bot", MoveUp(1), MoveToColumn(0))));
        assert!(first.contains(&format!("{}{}top", MoveUp(2), MoveToColumn(0))));

        let mut renderer = DisplayRenderer::new_with_sink(Vec::new());
        renderer.print_frame("top\nbot").unwrap();
        let written = renderer.sink().len();
        renderer.print_frame("top\nnew").unwrap();
        let second = String::from_utf8(renderer.sink()[written..].to_vec()).unwrap();
        assert!(second.contains("new"));
        assert!(!second.contains("top"));
    }

    #[test]
    fn test_reserve_output_area() {
        let mut renderer = DisplayRenderer::new_with_sink(Vec::new());
        renderer.reserve_output_area(3).unwrap();
        assert_eq!(renderer.into_sink(), b"\n\n\n".to_vec());
    }
}
