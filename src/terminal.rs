//! The compositor: turns input text into characters and characters into frames.

use crate::character::{CharacterId, EffectCharacter};
use crate::error::{Error, Result};
use crate::geometry::{Coord, OutputArea};
use crate::rendering::renderer::{ColorMode, FrameBuffer};
use clap::Args;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

const FALLBACK_SIZE: (u16, u16) = (80, 24);

// 0 is left to ids created outside of a terminal
static NEXT_TERMINAL_ID: AtomicU32 = AtomicU32::new(1);

/// Options that control how input is laid out and how frames are printed.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Number of spaces a tab expands to.
    #[arg(long, default_value_t = 4)]
    pub tab_width: usize,
    /// Truncate lines wider than the terminal instead of wrapping them.
    #[arg(long)]
    pub no_wrap: bool,
    /// Approximate colors with the xterm-256 palette.
    #[arg(long)]
    pub xterm_colors: bool,
    /// Do not print any colors.
    #[arg(long)]
    pub no_color: bool,
    /// Frames per second, 0 for as fast as possible.
    #[arg(long, default_value_t = 100)]
    pub frame_rate: u32,
    /// Use this width instead of querying the terminal.
    #[arg(long)]
    pub terminal_width: Option<u16>,
    /// Use this height instead of querying the terminal.
    #[arg(long)]
    pub terminal_height: Option<u16>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            no_wrap: false,
            xterm_colors: false,
            no_color: false,
            frame_rate: 100,
            terminal_width: None,
            terminal_height: None,
        }
    }
}

impl TerminalConfig {
    pub fn color_mode(&self) -> ColorMode {
        if self.no_color {
            ColorMode::Disabled
        } else if self.xterm_colors {
            ColorMode::Xterm256
        } else {
            ColorMode::TrueColor
        }
    }
}

/// Orders in which [`Terminal::get_characters_grouped`] sweeps over the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    RowTopToBottom,
    RowBottomToTop,
    ColumnLeftToRight,
    ColumnRightToLeft,
    DiagonalBottomLeftToTopRight,
    DiagonalTopRightToBottomLeft,
    DiagonalTopLeftToBottomRight,
    DiagonalBottomRightToTopLeft,
}

/// Splits `text` into its drawable characters and their input coordinates.
///
/// Tabs are expanded, lines wider than `width` are wrapped (or truncated with `no_wrap`) and
/// spaces are skipped. Row 1 is the last line of the input. Empty lines take no row, lines
/// holding only spaces do.
pub fn decompose(text: &str, width: usize, config: &TerminalConfig) -> Vec<(char, Coord)> {
    let tab = " ".repeat(config.tab_width);
    let width = width.max(1);
    let mut lines: Vec<Vec<char>> = Vec::new();
    for line in text.lines() {
        let line: Vec<char> = line.replace('\t', &tab).chars().collect();
        if line.is_empty() {
            continue;
        }
        if config.no_wrap {
            lines.push(line.into_iter().take(width).collect());
            continue;
        }
        lines.extend(line.chunks(width).map(<[char]>::to_vec));
    }
    let height = lines.len() as i32;
    lines
        .iter()
        .enumerate()
        .flat_map(|(line_index, line)| {
            line.iter()
                .enumerate()
                .filter(|&(_, &symbol)| symbol != ' ')
                .map(move |(column, &symbol)| {
                    (
                        symbol,
                        Coord::new(column as i32 + 1, height - line_index as i32),
                    )
                })
        })
        .collect()
}

/// All characters of an effect and the area they are drawn into.
///
/// Input characters come first, in reading order, followed by characters added with
/// [`add_character`](Terminal::add_character). Characters are drawn in that order, so at equal
/// layers a later character covers an earlier one.
pub struct Terminal {
    id: u32,
    config: TerminalConfig,
    input_width: i32,
    input_height: i32,
    output_area: OutputArea,
    characters: Vec<EffectCharacter>,
    input_count: usize,
    frame: FrameBuffer,
}

impl Terminal {
    /// Lays out `input` for the current terminal, honoring the size overrides in `config`.
    pub fn new(input: &str, config: TerminalConfig) -> Result<Self> {
        let (width, height) = crossterm::terminal::size().unwrap_or(FALLBACK_SIZE);
        let width = config.terminal_width.unwrap_or(width);
        let height = config.terminal_height.unwrap_or(height);
        Self::with_dimensions(input, width as usize, height as usize, config)
    }

    /// Lays out `input` for a terminal of the given size.
    pub fn with_dimensions(
        input: &str,
        width: usize,
        height: usize,
        config: TerminalConfig,
    ) -> Result<Self> {
        let decomposed = decompose(input, width, &config);
        let input_width = decomposed.iter().map(|(_, c)| c.column).max();
        let input_height = decomposed.iter().map(|(_, c)| c.row).max();
        let (Some(input_width), Some(input_height)) = (input_width, input_height) else {
            return Err(Error::EmptyInput);
        };
        let output_area = OutputArea::new((height as i32 - 1).min(input_height), input_width);
        if !output_area.has_extent() {
            return Err(Error::EmptyOutputArea(output_area));
        }

        let id = NEXT_TERMINAL_ID.fetch_add(1, Ordering::Relaxed);
        let characters: Vec<EffectCharacter> = decomposed
            .into_iter()
            .filter(|(_, coord)| coord.row <= output_area.top)
            .enumerate()
            .map(|(index, (symbol, coord))| {
                EffectCharacter::new(CharacterId::in_terminal(id, index), symbol, coord)
            })
            .collect();
        debug!(
            "decomposed input into {} characters, output area {}x{}",
            characters.len(),
            output_area.width(),
            output_area.height()
        );

        Ok(Self {
            id,
            config,
            input_width,
            input_height,
            output_area,
            input_count: characters.len(),
            characters,
            frame: FrameBuffer::new(output_area),
        })
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn output_area(&self) -> OutputArea {
        self.output_area
    }

    /// Width of the widest input line, after wrapping.
    pub fn input_width(&self) -> i32 {
        self.input_width
    }

    /// Number of input lines, after wrapping. May exceed the output area height.
    pub fn input_height(&self) -> i32 {
        self.input_height
    }

    /// Every character, input characters first.
    pub fn characters(&self) -> &[EffectCharacter] {
        &self.characters
    }

    pub fn characters_mut(&mut self) -> &mut [EffectCharacter] {
        &mut self.characters
    }

    /// The characters decomposed from the input text.
    pub fn input_characters(&self) -> &[EffectCharacter] {
        &self.characters[..self.input_count]
    }

    /// `None` for unknown ids, including ids of another terminal.
    pub fn character(&self, id: CharacterId) -> Option<&EffectCharacter> {
        self.slot(id).map(|index| &self.characters[index])
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut EffectCharacter> {
        self.slot(id).map(|index| &mut self.characters[index])
    }

    fn slot(&self, id: CharacterId) -> Option<usize> {
        (id.terminal() == self.id && id.index() < self.characters.len()).then_some(id.index())
    }

    /// Adds a character that is not part of the input, e.g. decoration. It starts invisible at
    /// `coord`, which also serves as its input coordinate.
    pub fn add_character(&mut self, symbol: char, coord: Coord) -> CharacterId {
        let id = CharacterId::in_terminal(self.id, self.characters.len());
        self.characters.push(EffectCharacter::new(id, symbol, coord));
        id
    }

    /// Shows or hides a character. Unknown ids are ignored.
    pub fn set_character_visibility(&mut self, id: CharacterId, visible: bool) {
        if let Some(character) = self.character_mut(id) {
            character.set_visible(visible);
        }
    }

    /// Partitions the input characters into groups swept in the given order.
    ///
    /// Within a group characters are in reading order.
    pub fn get_characters_grouped(&self, grouping: Grouping) -> Vec<Vec<CharacterId>> {
        let key = |coord: Coord| match grouping {
            Grouping::RowTopToBottom => -coord.row,
            Grouping::RowBottomToTop => coord.row,
            Grouping::ColumnLeftToRight => coord.column,
            Grouping::ColumnRightToLeft => -coord.column,
            Grouping::DiagonalBottomLeftToTopRight => coord.column + coord.row,
            Grouping::DiagonalTopRightToBottomLeft => -(coord.column + coord.row),
            Grouping::DiagonalTopLeftToBottomRight => coord.column - coord.row,
            Grouping::DiagonalBottomRightToTopLeft => coord.row - coord.column,
        };
        let mut groups: BTreeMap<i32, Vec<CharacterId>> = BTreeMap::new();
        for character in self.input_characters() {
            groups
                .entry(key(character.input_coord()))
                .or_default()
                .push(character.id());
        }
        groups.into_values().collect()
    }

    /// Composes the current frame: one line per output row, top row first, joined with `\n`.
    pub fn formatted_output(&mut self) -> String {
        self.frame.reset();
        for character in self.characters.iter().filter(|c| c.is_visible()) {
            self.frame.render_pixel(
                character.current_coord(),
                character.animation.current_visual(),
                character.layer,
            );
        }
        self.frame
            .formatted_rows(self.config.color_mode())
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::events::{Action, Event};
    use crate::rendering::color::Color;

    fn plain_config() -> TerminalConfig {
        TerminalConfig {
            no_color: true,
            ..Default::default()
        }
    }

    fn show_all(terminal: &mut Terminal) {
        let ids: Vec<CharacterId> = terminal.characters().iter().map(|c| c.id()).collect();
        for id in ids {
            terminal.set_character_visibility(id, true);
        }
    }

    #[test]
    fn test_single_row_renders() {
        let mut terminal = Terminal::with_dimensions("AB", 80, 24, plain_config()).unwrap();
        let coords: Vec<(char, Coord)> = terminal
            .characters()
            .iter()
            .map(|c| (c.input_symbol(), c.input_coord()))
            .collect();
        assert_eq!(coords, vec![('A', Coord::new(1, 1)), ('B', Coord::new(2, 1))]);
        assert_eq!(terminal.formatted_output(), "  ");
        show_all(&mut terminal);
        assert_eq!(terminal.formatted_output(), "AB");
    }

    #[test]
    fn test_decompose_is_deterministic() {
        let text = "ab c\n\td\n\nxyz";
        let config = TerminalConfig::default();
        assert_eq!(decompose(text, 80, &config), decompose(text, 80, &config));
        assert_eq!(
            decompose(text, 80, &config),
            vec![
                ('a', Coord::new(1, 3)),
                ('b', Coord::new(2, 3)),
                ('c', Coord::new(4, 3)),
                ('d', Coord::new(5, 2)),
                ('x', Coord::new(1, 1)),
                ('y', Coord::new(2, 1)),
                ('z', Coord::new(3, 1)),
            ]
        );
    }

    #[test]
    fn test_empty_lines_take_no_row() {
        let config = TerminalConfig::default();
        assert_eq!(
            decompose("a\n\nb", 80, &config),
            vec![('a', Coord::new(1, 2)), ('b', Coord::new(1, 1))]
        );
        // lines of spaces keep their row
        assert_eq!(
            decompose("a\n  \nb\n\n", 80, &config),
            vec![('a', Coord::new(1, 3)), ('b', Coord::new(1, 1))]
        );
        let terminal = Terminal::with_dimensions("a\n\n\nb", 80, 24, plain_config()).unwrap();
        assert_eq!(terminal.input_height(), 2);
        assert_eq!(terminal.output_area(), OutputArea::new(2, 1));
    }

    #[test]
    fn test_wrapping_and_truncation() {
        let wrapped = decompose("abcde", 2, &TerminalConfig::default());
        assert_eq!(
            wrapped,
            vec![
                ('a', Coord::new(1, 3)),
                ('b', Coord::new(2, 3)),
                ('c', Coord::new(1, 2)),
                ('d', Coord::new(2, 2)),
                ('e', Coord::new(1, 1)),
            ]
        );
        let config = TerminalConfig {
            no_wrap: true,
            ..Default::default()
        };
        assert_eq!(
            decompose("abcde", 2, &config),
            vec![('a', Coord::new(1, 1)), ('b', Coord::new(2, 1))]
        );
    }

    #[test]
    fn test_tab_width() {
        let config = TerminalConfig {
            tab_width: 2,
            ..Default::default()
        };
        assert_eq!(decompose("\tx", 80, &config), vec![('x', Coord::new(3, 1))]);
    }

    #[test]
    fn test_rows_above_terminal_are_dropped() {
        let terminal = Terminal::with_dimensions("a\nb\nc\nd", 80, 3, plain_config()).unwrap();
        assert_eq!(terminal.output_area(), OutputArea::new(2, 1));
        assert_eq!(terminal.input_height(), 4);
        let symbols: String = terminal.characters().iter().map(|c| c.input_symbol()).collect();
        assert_eq!(symbols, "cd");
    }

    #[test]
    fn test_empty_input_and_area() {
        assert!(matches!(
            Terminal::with_dimensions("  \n\n", 80, 24, plain_config()),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            Terminal::with_dimensions("abc", 80, 1, plain_config()),
            Err(Error::EmptyOutputArea(_))
        ));
    }

    #[test]
    fn test_ids_of_another_terminal_are_rejected() {
        let mut ours = Terminal::with_dimensions("ab", 80, 24, plain_config()).unwrap();
        let mut theirs = Terminal::with_dimensions("ab", 80, 24, plain_config()).unwrap();
        let their_id = theirs.input_characters()[0].id();
        assert!(ours.character(their_id).is_none());
        ours.set_character_visibility(their_id, true);
        assert!(ours.characters().iter().all(|c| !c.is_visible()));

        let their_path = theirs
            .character_mut(their_id)
            .unwrap()
            .motion
            .new_path(1.0, Easing::Linear)
            .unwrap()
            .new_waypoint(Coord::new(2, 1))
            .handle();
        let our_id = ours.input_characters()[0].id();
        assert_eq!(our_id.index(), their_id.index());
        let character = ours.character_mut(our_id).unwrap();
        assert!(matches!(
            character.activate_path(their_path),
            Err(Error::ForeignHandle)
        ));
        assert!(matches!(
            character
                .event_handler
                .register_event(Event::PathComplete, their_path, Action::SetLayer(1)),
            Err(Error::ForeignHandle)
        ));
    }

    #[test]
    fn test_layers_and_creation_order() {
        let mut terminal = Terminal::with_dimensions("ab", 80, 24, plain_config()).unwrap();
        let extra = terminal.add_character('#', Coord::new(1, 1));
        show_all(&mut terminal);
        // the added character was created last and wins at equal layers
        assert_eq!(terminal.formatted_output(), "#b");

        let first = terminal.input_characters()[0].id();
        if let Some(character) = terminal.character_mut(first) {
            character.layer = 1;
        }
        assert_eq!(terminal.formatted_output(), "ab");

        terminal.set_character_visibility(first, false);
        assert_eq!(terminal.formatted_output(), "#b");
        assert_eq!(terminal.input_characters().len(), 2);
        assert_eq!(terminal.character(extra).map(|c| c.input_symbol()), Some('#'));
    }

    #[test]
    fn test_characters_outside_area_are_not_drawn() {
        let mut terminal = Terminal::with_dimensions("ab", 80, 24, plain_config()).unwrap();
        show_all(&mut terminal);
        let first = terminal.input_characters()[0].id();
        if let Some(character) = terminal.character_mut(first) {
            character.motion.set_coordinate(Coord::new(0, 5));
        }
        assert_eq!(terminal.formatted_output(), " b");
    }

    #[test]
    fn test_colored_output() {
        let mut terminal =
            Terminal::with_dimensions("a", 80, 24, TerminalConfig::default()).unwrap();
        show_all(&mut terminal);
        let id = terminal.input_characters()[0].id();
        if let Some(character) = terminal.character_mut(id) {
            character.animation.set_appearance('a', Color::Rgb([1, 2, 3]));
        }
        let output = terminal.formatted_output();
        assert!(output.contains("38;2;1;2;3"));
        assert!(output.contains('a'));
    }

    #[test]
    fn test_grouping() {
        let terminal = Terminal::with_dimensions("ab\ncd", 80, 24, plain_config()).unwrap();
        let symbols = |grouping| -> Vec<String> {
            terminal
                .get_characters_grouped(grouping)
                .into_iter()
                .map(|group| {
                    group
                        .into_iter()
                        .filter_map(|id| terminal.character(id))
                        .map(|c| c.input_symbol())
                        .collect()
                })
                .collect()
        };
        assert_eq!(symbols(Grouping::RowTopToBottom), vec!["ab", "cd"]);
        assert_eq!(symbols(Grouping::RowBottomToTop), vec!["cd", "ab"]);
        assert_eq!(symbols(Grouping::ColumnLeftToRight), vec!["ac", "bd"]);
        assert_eq!(symbols(Grouping::ColumnRightToLeft), vec!["bd", "ac"]);
        assert_eq!(symbols(Grouping::DiagonalBottomLeftToTopRight), vec!["c", "ad", "b"]);
        assert_eq!(symbols(Grouping::DiagonalTopRightToBottomLeft), vec!["b", "ad", "c"]);
        assert_eq!(symbols(Grouping::DiagonalTopLeftToBottomRight), vec!["a", "bc", "d"]);
        assert_eq!(symbols(Grouping::DiagonalBottomRightToTopLeft), vec!["d", "bc", "a"]);
    }
}
