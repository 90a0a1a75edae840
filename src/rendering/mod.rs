//! Rendering of composed frames to the terminal.
//!
//! **Sub-modules:**
//!
//! *   [`color`](crate::rendering::color): [`Color`](color::Color) and
//!     [`Gradient`](color::Gradient).
//! *   [`display`](crate::rendering::display): [`Display`](display::Display), a 2D cell buffer
//!     addressed by [`Coord`](crate::geometry::Coord).
//! *   [`pixel`](crate::rendering::pixel): [`Pixel`](pixel::Pixel), one symbol with its color.
//! *   [`renderer`](crate::rendering::renderer): [`FrameBuffer`](renderer::FrameBuffer), which
//!     resolves overlapping characters by layer, and
//!     [`DisplayRenderer`](renderer::DisplayRenderer), which writes frames to the output stream.
//!
//! **Rendering process:**
//!
//! 1.  The compositor resets a `FrameBuffer` sized to the output area.
//! 2.  Every visible character is stamped with its layer. Higher layers win, and at equal layers
//!     the character stamped last wins.
//! 3.  The buffer is formatted into rows, top row first, with ANSI color sequences.
//! 4.  `DisplayRenderer::print_frame` overwrites the rows that changed since the last frame in
//!     place and flushes once.

pub mod color;
pub mod display;
pub mod pixel;
pub mod renderer;
