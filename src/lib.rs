#![doc = include_str!("../README.md")]

use crossterm::{cursor, execute};
use log::debug;
use std::io;
use std::io::{Stdout, Write, stdout};
use std::time::{Duration, Instant};

pub mod animation;
pub mod character;
pub mod easing;
pub mod effects;
pub mod error;
pub mod events;
pub mod geometry;
pub mod motion;
pub mod rendering;
pub mod seeds;
pub mod terminal;

pub use crate::error::{Error, Result};
use crate::rendering::renderer::DisplayRenderer;
use crate::terminal::Terminal;

/// An animation script driving the characters of a [`Terminal`].
///
/// [`build`](Effect::build) assigns paths, scenes and event rules to the characters. After that
/// [`produce_next_frame`](Effect::produce_next_frame) is called once per tick: it advances the
/// characters and returns the composed frame, or `None` once the effect is finished.
pub trait Effect {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()>;

    fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String>;
}

/// Runs an effect to completion.
///
/// The output area is reserved first, then frames are printed at the configured frame rate
/// until the effect is finished. With a frame rate of 0 frames are printed as fast as possible.
pub fn run_effect<E: Effect + ?Sized, W: Write>(
    effect: &mut E,
    terminal: &mut Terminal,
    renderer: &mut DisplayRenderer<W>,
) -> Result<()> {
    effect.build(terminal)?;
    renderer.reserve_output_area(terminal.output_area().height() as usize)?;

    let nanos_per_frame = match terminal.config().frame_rate {
        0 => 0,
        frame_rate => 1_000_000_000 / frame_rate as u64,
    };
    let frame_duration = Duration::from_nanos(nanos_per_frame);
    // how much longer the last sleep() slept than expected.
    let mut last_overhead = Duration::from_nanos(0);
    let mut frames = 0usize;

    while let Some(frame) = effect.produce_next_frame(terminal) {
        let now = Instant::now();
        renderer.print_frame(&frame)?;
        frames += 1;

        if frame_duration.is_zero() {
            continue;
        }
        // Sleep until the next frame
        let current = Instant::now();
        let remaining_time = frame_duration.saturating_sub(current.duration_since(now));
        // sleep less by last frame's overhead
        let remaining_time = remaining_time.saturating_sub(last_overhead);
        std::thread::sleep(remaining_time);
        let time_slept = Instant::now().duration_since(current);
        last_overhead = time_slept.saturating_sub(remaining_time);
    }
    debug!("effect finished after {frames} frames");
    Ok(())
}

/// Sets up the terminal for an effect by hiding the cursor.
///
/// It is recommended to call `install_panic_handler` after this function, and `terminal_cleanup`
/// after the effect finished.
pub fn terminal_setup() -> io::Result<()> {
    let mut stdout = stdout();
    // don't print cursor
    execute!(stdout, cursor::Hide)
}

/// Resets everything done by `terminal_setup`.
pub fn terminal_cleanup() -> io::Result<()> {
    let mut stdout = stdout();
    execute!(stdout, cursor::Show)
}

/// Installs a panic handler that restores the cursor before panicking.
pub fn install_panic_handler() {
    let old_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |pinfo| {
        // nothing sensible left to do if this fails while panicking
        let _ = terminal_cleanup();
        old_hook(pinfo);
    }));
}

/// Buffer writer that _only_ flushes explicitly.
///
/// The renderer flushes once per frame, so every frame reaches the terminal in one write.
pub struct FrameBufWriter {
    buf: Vec<u8>,
    stdout: Stdout,
}

impl FrameBufWriter {
    pub fn new() -> Self {
        Self {
            buf: vec![],
            stdout: stdout(),
        }
    }
}

impl Default for FrameBufWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for FrameBufWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut lock = self.stdout.lock();
        lock.write_all(&self.buf)?;
        lock.flush()?;
        self.buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalConfig;

    /// Reveals one more character per frame.
    struct Typewriter {
        next: usize,
    }

    impl Effect for Typewriter {
        fn build(&mut self, _terminal: &mut Terminal) -> Result<()> {
            Ok(())
        }

        fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String> {
            let id = terminal.input_characters().get(self.next)?.id();
            terminal.set_character_visibility(id, true);
            self.next += 1;
            Some(terminal.formatted_output())
        }
    }

    #[test]
    fn test_run_effect_prints_every_frame() {
        let config = TerminalConfig {
            no_color: true,
            frame_rate: 0,
            ..Default::default()
        };
        let mut terminal = Terminal::with_dimensions("abc", 80, 24, config).unwrap();
        let mut renderer = DisplayRenderer::new_with_sink(Vec::new());
        run_effect(&mut Typewriter { next: 0 }, &mut terminal, &mut renderer).unwrap();
        let output = String::from_utf8(renderer.into_sink()).unwrap();
        assert!(output.starts_with('\n'));
        for frame in ["a  ", "ab ", "abc"] {
            assert!(output.contains(frame), "missing {frame:?}");
        }
    }
}
