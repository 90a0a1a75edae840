//! Characters fall into place from the top of the output area, bottom rows first.

use crate::Effect;
use crate::character::CharacterId;
use crate::easing::Easing;
use crate::effects::animate;
use crate::error::Result;
use crate::events::{Action, Event};
use crate::geometry::Coord;
use crate::rendering::color::{Color, Gradient, GradientDirection};
use crate::seeds;
use crate::terminal::{Grouping, Terminal};
use clap::Args;
use log::debug;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

const DEFAULT_RAIN_COLORS: [Color; 8] = [
    Color::Rgb([0x00, 0x31, 0x5c]),
    Color::Rgb([0x00, 0x4c, 0x8f]),
    Color::Rgb([0x00, 0x75, 0xdb]),
    Color::Rgb([0x3f, 0x91, 0xd9]),
    Color::Rgb([0x78, 0xb9, 0xf2]),
    Color::Rgb([0x9a, 0xc8, 0xf5]),
    Color::Rgb([0xb8, 0xd8, 0xf8]),
    Color::Rgb([0xe3, 0xef, 0xfc]),
];
const DEFAULT_FINAL_GRADIENT_STOPS: [Color; 3] = [
    Color::Rgb([0x48, 0x8b, 0xff]),
    Color::Rgb([0xb2, 0xe7, 0xde]),
    Color::Rgb([0x57, 0xea, 0xf7]),
];

#[derive(Args, Clone, Debug, PartialEq)]
pub struct RainConfig {
    /// Colors the falling characters are randomly drawn in.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_RAIN_COLORS)]
    pub rain_colors: Vec<Color>,
    /// Symbols shown while a character is falling.
    #[arg(long, default_value = "o.,*|")]
    pub rain_symbols: String,
    /// Lowest falling speed, in cells per tick.
    #[arg(long, default_value_t = 0.33)]
    pub movement_speed_min: f64,
    /// Highest falling speed, in cells per tick.
    #[arg(long, default_value_t = 0.57)]
    pub movement_speed_max: f64,
    #[arg(long, value_enum, default_value_t = Easing::InQuart)]
    pub movement_easing: Easing,
    /// Colors for the final character gradient.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_FINAL_GRADIENT_STOPS)]
    pub final_gradient_stops: Vec<Color>,
    /// Number of gradient steps between each pair of stops.
    #[arg(long, num_args = 1.., default_values_t = [12])]
    pub final_gradient_steps: Vec<usize>,
    #[arg(long, value_enum, default_value_t = GradientDirection::Diagonal)]
    pub final_gradient_direction: GradientDirection,
    /// Seed for the drop order, speeds and rain colors.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            rain_colors: DEFAULT_RAIN_COLORS.to_vec(),
            rain_symbols: "o.,*|".to_string(),
            movement_speed_min: 0.33,
            movement_speed_max: 0.57,
            movement_easing: Easing::InQuart,
            final_gradient_stops: DEFAULT_FINAL_GRADIENT_STOPS.to_vec(),
            final_gradient_steps: vec![12],
            final_gradient_direction: GradientDirection::Diagonal,
            seed: None,
        }
    }
}

pub struct Rain {
    config: RainConfig,
    rows: VecDeque<Vec<CharacterId>>,
    pending: Vec<CharacterId>,
    active: Vec<CharacterId>,
    rng: StdRng,
}

impl Rain {
    pub fn new(config: RainConfig) -> Self {
        let rng = seeds::rng_for(config.seed, "rain.drops");
        Self {
            config,
            rows: VecDeque::new(),
            pending: Vec::new(),
            active: Vec::new(),
            rng,
        }
    }

    /// Releases one to three random characters of the current row.
    fn release_drops(&mut self, terminal: &mut Terminal) {
        if self.pending.is_empty() {
            if let Some(row) = self.rows.pop_front() {
                self.pending = row;
            }
        }
        for _ in 0..self.rng.gen_range(1..=3) {
            if self.pending.is_empty() {
                break;
            }
            let id = self.pending.swap_remove(self.rng.gen_range(0..self.pending.len()));
            let Some(character) = terminal.character_mut(id) else {
                continue;
            };
            let path = character.motion.query_path("fall");
            let scene = character.animation.query_scene("rain");
            if let (Some(path), Some(scene)) = (path, scene) {
                if character.activate_path(path).is_ok() && character.activate_scene(scene).is_ok()
                {
                    terminal.set_character_visibility(id, true);
                    self.active.push(id);
                }
            }
        }
    }
}

impl Effect for Rain {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
        self.rows.clear();
        self.pending.clear();
        self.active.clear();

        let config = &self.config;
        let area = terminal.output_area();
        let final_gradient =
            Gradient::new(&config.final_gradient_stops, &config.final_gradient_steps)?;
        let final_colors = final_gradient.build_coordinate_color_mapping(
            area.top,
            area.right,
            config.final_gradient_direction,
        );
        let rain_symbols: Vec<char> = config.rain_symbols.chars().collect();
        let (speed_min, speed_max) = if config.movement_speed_min <= config.movement_speed_max {
            (config.movement_speed_min, config.movement_speed_max)
        } else {
            (config.movement_speed_max, config.movement_speed_min)
        };
        let mut rng = seeds::rng_for(config.seed, "rain.build");

        let ids: Vec<CharacterId> = terminal.input_characters().iter().map(|c| c.id()).collect();
        for id in ids {
            let Some(character) = terminal.character_mut(id) else {
                continue;
            };
            let symbol = character.input_symbol();
            let input_coord = character.input_coord();
            let final_color = final_colors
                .get(&input_coord)
                .copied()
                .unwrap_or_else(|| final_gradient.last());
            let rain_color = config
                .rain_colors
                .choose(&mut rng)
                .copied()
                .unwrap_or(final_color);
            let rain_symbol = rain_symbols.choose(&mut rng).copied().unwrap_or(symbol);
            let speed = if speed_min < speed_max {
                rng.gen_range(speed_min..=speed_max)
            } else {
                speed_min
            };

            character
                .motion
                .set_coordinate(Coord::new(input_coord.column, area.top));
            let fall = character
                .motion
                .new_path_with_id("fall", speed, config.movement_easing)?
                .new_waypoint(input_coord)
                .handle();
            character
                .animation
                .new_scene_with_id("rain")?
                .add_frame(rain_symbol, 1, rain_color)?;
            let fade_gradient = Gradient::new(&[rain_color, final_color], &[7])?;
            let fade = character
                .animation
                .new_scene()
                .apply_gradient_to_symbols(&fade_gradient, symbol, 3)?
                .handle();
            character
                .event_handler
                .register_event(Event::PathComplete, fall, Action::ActivateScene(fade))?;
        }

        self.rows = terminal
            .get_characters_grouped(Grouping::RowBottomToTop)
            .into();
        debug!("prepared {} rows of rain", self.rows.len());
        Ok(())
    }

    fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String> {
        if self.rows.is_empty() && self.pending.is_empty() && self.active.is_empty() {
            return None;
        }
        self.release_drops(terminal);
        animate(terminal, &mut self.active);
        Some(terminal.formatted_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::{INPUT, run_frames, settled, terminal};
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: RainConfig,
    }

    #[test]
    fn test_cli_defaults_match_default() {
        let cli = Cli::try_parse_from(["rain"]).unwrap();
        assert_eq!(cli.config, RainConfig::default());
    }

    #[test]
    fn test_characters_start_on_top_row() {
        let mut terminal = terminal(INPUT);
        let mut effect = Rain::new(RainConfig {
            seed: Some(1),
            ..Default::default()
        });
        effect.build(&mut terminal).unwrap();
        let top = terminal.output_area().top;
        for character in terminal.input_characters() {
            assert_eq!(character.current_coord().row, top);
            assert!(!character.is_visible());
        }
        // the bottom row falls first
        let first_row = effect.rows.front().unwrap();
        assert!(first_row
            .iter()
            .all(|&id| terminal.character(id).unwrap().input_coord().row == 1));
    }

    #[test]
    fn test_rain_settles() {
        let mut terminal = terminal(INPUT);
        let mut effect = Rain::new(RainConfig {
            seed: Some(6),
            ..Default::default()
        });
        let frames = run_frames(&mut effect, &mut terminal, 20_000);
        assert_eq!(frames.last(), Some(&settled(&terminal)));
    }
}
