//! Ready-made effects.
//!
//! Every effect has a config struct that doubles as its command line arguments (the `Default`
//! impl matches the command line defaults) and implements [`Effect`](crate::Effect).
//!
//! *   [`scattered`]: characters move into place from random positions.
//! *   [`errorcorrect`]: some characters start swapped and are corrected pair by pair.
//! *   [`binarypath`]: binary representations of the characters travel to their home cells.
//! *   [`rain`]: characters fall into place from the top row, bottom rows first.

use crate::character::CharacterId;
use crate::rendering::color::Color;
use crate::terminal::Terminal;

pub mod binarypath;
pub mod errorcorrect;
pub mod rain;
pub mod scattered;

pub(crate) const WHITE: Color = Color::Rgb([0xff, 0xff, 0xff]);

/// Ticks every character in `active` and drops the ones that went dormant.
pub(crate) fn animate(terminal: &mut Terminal, active: &mut Vec<CharacterId>) {
    active.retain(|&id| match terminal.character_mut(id) {
        Some(character) => {
            character.tick();
            character.is_active()
        }
        None => false,
    });
}
