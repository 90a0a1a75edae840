//! Binary representations of each character travel through the terminal towards the home
//! coordinate of the character, moving at right angles.
//!
//! Once all eight (or more) digits of a character have arrived, they are hidden and the character
//! itself appears and fades from white into the base color. When every character is in place a
//! diagonal wipe brightens the text into its final color.

use crate::Effect;
use crate::character::CharacterId;
use crate::easing::Easing;
use crate::effects::{WHITE, animate};
use crate::error::Result;
use crate::geometry::Coord;
use crate::rendering::color::{Color, Gradient};
use crate::seeds;
use crate::terminal::{Grouping, Terminal};
use clap::Args;
use log::{debug, warn};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::VecDeque;

const DEFAULT_BASE_COLOR: Color = Color::Rgb([0x26, 0x5e, 0x3c]);
const DEFAULT_FINAL_COLOR: Color = Color::Rgb([0x45, 0xbf, 0x55]);
const DEFAULT_BINARY_COLORS: [Color; 4] = [
    Color::Rgb([0x04, 0x4e, 0x29]),
    Color::Rgb([0x15, 0x7e, 0x38]),
    Color::Rgb([0x45, 0xbf, 0x55]),
    Color::Rgb([0x95, 0xed, 0x87]),
];

#[derive(Args, Clone, Debug, PartialEq)]
pub struct BinaryPathConfig {
    /// Color of the characters when their binary digits combine in place.
    #[arg(long, default_value_t = DEFAULT_BASE_COLOR)]
    pub base_color: Color,
    /// Colors the binary digits are randomly drawn in.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_BINARY_COLORS)]
    pub binary_colors: Vec<Color>,
    /// Color of the characters after the final wipe.
    #[arg(long, default_value_t = DEFAULT_FINAL_COLOR)]
    pub final_color: Color,
    /// Cells per tick of the binary digits.
    #[arg(long, default_value_t = 1.0)]
    pub movement_speed: f64,
    /// Fraction of the characters whose digits travel at the same time.
    #[arg(long, default_value_t = 0.05)]
    pub active_binary_groups: f64,
    /// Leave the characters in the base color.
    #[arg(long)]
    pub skip_final_wipe: bool,
    /// Seed for the paths and colors of the digits.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for BinaryPathConfig {
    fn default() -> Self {
        Self {
            base_color: DEFAULT_BASE_COLOR,
            binary_colors: DEFAULT_BINARY_COLORS.to_vec(),
            final_color: DEFAULT_FINAL_COLOR,
            movement_speed: 1.0,
            active_binary_groups: 0.05,
            skip_final_wipe: false,
            seed: None,
        }
    }
}

/// The binary digits of one input character.
struct BinaryRepresentation {
    character: CharacterId,
    input_coord: Coord,
    digits: Vec<CharacterId>,
    pending_digits: VecDeque<CharacterId>,
}

impl BinaryRepresentation {
    fn travel_complete(&self, terminal: &Terminal) -> bool {
        self.digits.iter().all(|&id| {
            terminal
                .character(id)
                .is_some_and(|c| c.current_coord() == self.input_coord)
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Travel,
    Wipe,
    Complete,
}

pub struct BinaryPath {
    config: BinaryPathConfig,
    pending: Vec<BinaryRepresentation>,
    travelling: Vec<BinaryRepresentation>,
    max_travelling: usize,
    wipe_groups: VecDeque<Vec<CharacterId>>,
    active: Vec<CharacterId>,
    phase: Phase,
    finished: bool,
    rng: StdRng,
}

impl BinaryPath {
    pub fn new(config: BinaryPathConfig) -> Self {
        let rng = seeds::rng_for(config.seed, "binarypath.release");
        Self {
            config,
            pending: Vec::new(),
            travelling: Vec::new(),
            max_travelling: 1,
            wipe_groups: VecDeque::new(),
            active: Vec::new(),
            phase: Phase::Travel,
            finished: false,
            rng,
        }
    }

    fn travel(&mut self, terminal: &mut Terminal) {
        while self.travelling.len() < self.max_travelling && !self.pending.is_empty() {
            let index = self.rng.gen_range(0..self.pending.len());
            self.travelling.push(self.pending.swap_remove(index));
        }

        let mut arrived = Vec::new();
        for (index, rep) in self.travelling.iter_mut().enumerate() {
            if let Some(digit) = rep.pending_digits.pop_front() {
                terminal.set_character_visibility(digit, true);
                self.active.push(digit);
            } else if rep.travel_complete(terminal) {
                for &digit in &rep.digits {
                    terminal.set_character_visibility(digit, false);
                }
                terminal.set_character_visibility(rep.character, true);
                activate_scene(terminal, rep.character, "collapse_scn");
                self.active.push(rep.character);
                arrived.push(index);
            }
        }
        for index in arrived.into_iter().rev() {
            self.travelling.swap_remove(index);
        }

        if self.active.is_empty() {
            debug!("all binary groups arrived, starting final wipe");
            self.phase = Phase::Wipe;
        }
    }

    fn wipe(&mut self, terminal: &mut Terminal) {
        let next_group = match self.config.skip_final_wipe {
            true => None,
            false => self.wipe_groups.pop_front(),
        };
        let Some(group) = next_group else {
            self.phase = Phase::Complete;
            return;
        };
        for id in group {
            activate_scene(terminal, id, "brighten_scn");
            terminal.set_character_visibility(id, true);
            self.active.push(id);
        }
    }
}

fn activate_scene(terminal: &mut Terminal, id: CharacterId, scene_id: &str) {
    let Some(character) = terminal.character_mut(id) else {
        return;
    };
    let Some(scene) = character.animation.query_scene(scene_id) else {
        return;
    };
    if let Err(err) = character.activate_scene(scene) {
        warn!("could not activate {scene_id} on {id:?}: {err}");
    }
}

/// -1, 0 or 1, moving `from` towards `to`.
fn direction(from: i32, to: i32) -> i32 {
    match from.cmp(&to) {
        Ordering::Greater => -1,
        Ordering::Equal => 0,
        Ordering::Less => 1,
    }
}

/// Builds a right-angled route from `start` to `target`, alternating between vertical and
/// horizontal legs of random length.
fn right_angle_route(
    rng: &mut StdRng,
    start: Coord,
    target: Coord,
    input_width: i32,
) -> Vec<Coord> {
    let max_row_leg = ((input_width as f64 * 0.2) as i32).max(10);
    let mut vertical = rng.gen_bool(0.5);
    let mut route = vec![start];
    let mut last = start;
    while last != target {
        let row_distance = (last.row - target.row).abs();
        let column_distance = (last.column - target.column).abs();
        let next = if vertical && row_distance > 0 {
            let leg = rng.gen_range(1..=row_distance.min(max_row_leg));
            Coord::new(last.column, last.row + leg * direction(last.row, target.row))
        } else if !vertical && column_distance > 0 {
            let leg = rng.gen_range(1..=column_distance.min(4));
            Coord::new(last.column + leg * direction(last.column, target.column), last.row)
        } else {
            target
        };
        vertical = !vertical;
        route.push(next);
        last = next;
    }
    route
}

impl Effect for BinaryPath {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
        self.pending.clear();
        self.travelling.clear();
        self.wipe_groups.clear();
        self.active.clear();
        self.phase = Phase::Travel;
        self.finished = false;

        let config = &self.config;
        let complete_gradient = Gradient::new(&[WHITE, config.base_color], &[10])?;
        let brighten_gradient =
            Gradient::new(&[config.base_color, WHITE, config.final_color], &[25])?;
        let mut route_rng = seeds::rng_for(config.seed, "binarypath.routes");
        let mut color_rng = seeds::rng_for(config.seed, "binarypath.colors");
        let area = terminal.output_area();
        let input_width = terminal.input_width();

        let inputs: Vec<(CharacterId, char, Coord)> = terminal
            .input_characters()
            .iter()
            .map(|c| (c.id(), c.input_symbol(), c.input_coord()))
            .collect();
        for (character, symbol, input_coord) in inputs {
            let start = area.random_coord(&mut route_rng, true)?;
            let route = right_angle_route(&mut route_rng, start, input_coord, input_width);

            let mut digits = Vec::new();
            for bit in format!("{:08b}", symbol as u32).chars() {
                let id = terminal.add_character(bit, start);
                let color = config
                    .binary_colors
                    .choose(&mut color_rng)
                    .copied()
                    .unwrap_or(config.base_color);
                let Some(digit) = terminal.character_mut(id) else {
                    continue;
                };
                let path = digit.motion.new_path(config.movement_speed, Easing::Linear)?;
                for &coord in &route[1..] {
                    path.new_waypoint(coord);
                }
                let path = path.handle();
                digit.activate_path(path)?;
                digit.layer = 1;
                let scene = digit
                    .animation
                    .new_scene()
                    .add_frame(bit, 1, color)?
                    .handle();
                digit.activate_scene(scene)?;
                digits.push(id);
            }

            if let Some(input) = terminal.character_mut(character) {
                let collapse = input.animation.new_scene_with_id("collapse_scn")?;
                collapse.set_easing(Some(Easing::InQuad));
                for &color in complete_gradient.spectrum() {
                    collapse.add_frame(symbol, 10, color)?;
                }
                let brighten = input.animation.new_scene_with_id("brighten_scn")?;
                for &color in brighten_gradient.spectrum() {
                    brighten.add_frame(symbol, 2, color)?;
                }
                brighten.add_frame(symbol, 2, config.final_color)?;
            }

            self.pending.push(BinaryRepresentation {
                character,
                input_coord,
                pending_digits: digits.iter().copied().collect(),
                digits,
            });
        }

        self.max_travelling =
            ((config.active_binary_groups * self.pending.len() as f64) as usize).max(1);
        self.wipe_groups = terminal
            .get_characters_grouped(Grouping::DiagonalTopRightToBottomLeft)
            .into();
        debug!(
            "prepared {} binary groups, {} travelling at once",
            self.pending.len(),
            self.max_travelling
        );
        Ok(())
    }

    fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.phase == Phase::Complete && self.active.is_empty() {
            self.finished = true;
            return Some(terminal.formatted_output());
        }
        if self.phase == Phase::Travel {
            self.travel(terminal);
        }
        if self.phase == Phase::Wipe {
            self.wipe(terminal);
        }
        let frame = terminal.formatted_output();
        animate(terminal, &mut self.active);
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::{run_frames, settled, terminal};
    use clap::Parser;
    use rand::SeedableRng;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: BinaryPathConfig,
    }

    #[test]
    fn test_cli_defaults_match_default() {
        let cli = Cli::try_parse_from(["binarypath"]).unwrap();
        assert_eq!(cli.config, BinaryPathConfig::default());
    }

    #[test]
    fn test_routes_are_right_angled() {
        let mut rng = StdRng::seed_from_u64(1);
        let target = Coord::new(5, 3);
        for start in [Coord::new(-4, 9), Coord::new(30, -2), Coord::new(5, 20)] {
            let route = right_angle_route(&mut rng, start, target, 20);
            assert_eq!(route.first(), Some(&start));
            assert_eq!(route.last(), Some(&target));
            for leg in route.windows(2) {
                assert!(leg[0].row == leg[1].row || leg[0].column == leg[1].column);
            }
        }
    }

    #[test]
    fn test_digits_are_added_per_character() {
        let mut terminal = terminal("ab");
        let mut effect = BinaryPath::new(BinaryPathConfig {
            seed: Some(2),
            ..Default::default()
        });
        effect.build(&mut terminal).unwrap();
        assert_eq!(terminal.input_characters().len(), 2);
        assert_eq!(terminal.characters().len(), 2 + 16);
        let digits: String = terminal.characters()[2..10]
            .iter()
            .map(|c| c.input_symbol())
            .collect();
        assert_eq!(digits, "01100001");
        assert!(terminal.characters()[2..].iter().all(|c| !c.is_visible()));
    }

    #[test]
    fn test_text_is_restored() {
        let mut terminal = terminal("binary\npath");
        let mut effect = BinaryPath::new(BinaryPathConfig {
            seed: Some(4),
            ..Default::default()
        });
        let frames = run_frames(&mut effect, &mut terminal, 50_000);
        assert_eq!(frames.last(), Some(&settled(&terminal)));
        assert!(terminal.characters()[terminal.input_characters().len()..]
            .iter()
            .all(|c| !c.is_visible()));
    }

    #[test]
    fn test_skip_final_wipe_keeps_base_color() {
        let mut terminal = terminal("ok");
        let mut effect = BinaryPath::new(BinaryPathConfig {
            skip_final_wipe: true,
            seed: Some(8),
            ..Default::default()
        });
        run_frames(&mut effect, &mut terminal, 50_000);
        for character in terminal.input_characters() {
            assert_eq!(character.animation.current_visual().color, DEFAULT_BASE_COLOR);
        }
    }
}
