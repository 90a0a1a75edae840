//! Move the characters into place from random starting locations.

use crate::Effect;
use crate::character::CharacterId;
use crate::easing::Easing;
use crate::effects::animate;
use crate::error::Result;
use crate::events::{Action, Event};
use crate::geometry::Coord;
use crate::rendering::color::{Color, Gradient, GradientDirection};
use crate::seeds;
use crate::terminal::Terminal;
use clap::Args;
use log::debug;

const DEFAULT_FINAL_GRADIENT_STOPS: [Color; 3] = [
    Color::Rgb([0xff, 0x90, 0x48]),
    Color::Rgb([0xab, 0x9d, 0xff]),
    Color::Rgb([0xbd, 0xff, 0xea]),
];

#[derive(Args, Clone, Debug, PartialEq)]
pub struct ScatteredConfig {
    /// Colors for the character gradient. A single color displays every character in it.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_FINAL_GRADIENT_STOPS)]
    pub final_gradient_stops: Vec<Color>,
    /// Number of gradient steps between each pair of stops.
    #[arg(long, num_args = 1.., default_values_t = [12])]
    pub final_gradient_steps: Vec<usize>,
    /// Number of ticks each gradient step is shown for.
    #[arg(long, default_value_t = 12)]
    pub final_gradient_frames: u32,
    #[arg(long, value_enum, default_value_t = GradientDirection::Vertical)]
    pub final_gradient_direction: GradientDirection,
    /// Cells per tick. Lower speeds take more steps to cover the same distance.
    #[arg(long, default_value_t = 0.5)]
    pub movement_speed: f64,
    #[arg(long, value_enum, default_value_t = Easing::InOutBack)]
    pub movement_easing: Easing,
    /// Seed for the starting positions.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for ScatteredConfig {
    fn default() -> Self {
        Self {
            final_gradient_stops: DEFAULT_FINAL_GRADIENT_STOPS.to_vec(),
            final_gradient_steps: vec![12],
            final_gradient_frames: 12,
            final_gradient_direction: GradientDirection::Vertical,
            movement_speed: 0.5,
            movement_easing: Easing::InOutBack,
            seed: None,
        }
    }
}

pub struct Scattered {
    config: ScatteredConfig,
    active: Vec<CharacterId>,
    started: bool,
}

impl Scattered {
    pub fn new(config: ScatteredConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            started: false,
        }
    }
}

impl Effect for Scattered {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
        self.active.clear();
        self.started = false;
        let config = &self.config;
        let area = terminal.output_area();
        let final_gradient =
            Gradient::new(&config.final_gradient_stops, &config.final_gradient_steps)?;
        let final_colors = final_gradient.build_coordinate_color_mapping(
            area.top,
            area.right,
            config.final_gradient_direction,
        );
        let mut rng = seeds::rng_for(config.seed, "scattered.start");

        let ids: Vec<CharacterId> = terminal.input_characters().iter().map(|c| c.id()).collect();
        for id in ids {
            // too small to scatter in
            let start = if area.right < 2 || area.top < 2 {
                Coord::new(1, 1)
            } else {
                area.random_coord(&mut rng, false)?
            };
            let Some(character) = terminal.character_mut(id) else {
                continue;
            };
            let input_coord = character.input_coord();
            let symbol = character.input_symbol();
            let final_color = final_colors
                .get(&input_coord)
                .copied()
                .unwrap_or_else(|| final_gradient.last());

            character.motion.set_coordinate(start);
            let path = character
                .motion
                .new_path(config.movement_speed, config.movement_easing)?
                .new_waypoint(input_coord)
                .handle();
            let handler = &mut character.event_handler;
            handler.register_event(Event::PathActivated, path, Action::SetLayer(1))?;
            handler.register_event(Event::PathComplete, path, Action::SetLayer(0))?;
            character.activate_path(path)?;

            let char_gradient = Gradient::new(&[final_gradient.first(), final_color], &[10])?;
            let scene = character
                .animation
                .new_scene()
                .apply_gradient_to_symbols(&char_gradient, symbol, config.final_gradient_frames)?
                .handle();
            character.activate_scene(scene)?;

            terminal.set_character_visibility(id, true);
            self.active.push(id);
        }
        debug!("scattered {} characters", self.active.len());
        Ok(())
    }

    fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String> {
        if !self.started {
            self.started = true;
            return Some(terminal.formatted_output());
        }
        if self.active.is_empty() {
            return None;
        }
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
        config: ScatteredConfig,
    }

    #[test]
    fn test_cli_defaults_match_default() {
        let cli = Cli::try_parse_from(["scattered"]).unwrap();
        assert_eq!(cli.config, ScatteredConfig::default());
    }

    #[test]
    fn test_cli_parses_colors() {
        let cli = Cli::try_parse_from([
            "scattered",
            "--final-gradient-stops",
            "#000000",
            "196",
            "--movement-easing",
            "out-bounce",
        ])
        .unwrap();
        assert_eq!(
            cli.config.final_gradient_stops,
            vec![Color::Rgb([0, 0, 0]), Color::Xterm(196)]
        );
        assert_eq!(cli.config.movement_easing, Easing::OutBounce);
    }

    #[test]
    fn test_characters_settle_in_place() {
        let mut terminal = terminal(INPUT);
        let mut effect = Scattered::new(ScatteredConfig {
            seed: Some(3),
            ..Default::default()
        });
        let frames = run_frames(&mut effect, &mut terminal, 10_000);
        assert!(frames.len() > 1);
        assert_eq!(frames.last(), Some(&settled(&terminal)));
        for character in terminal.input_characters() {
            assert_eq!(character.current_coord(), character.input_coord());
            assert_eq!(character.layer, 0);
            assert!(!character.is_active());
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = ScatteredConfig {
            seed: Some(11),
            ..Default::default()
        };
        let mut first = terminal(INPUT);
        let mut second = terminal(INPUT);
        let a = run_frames(&mut Scattered::new(config.clone()), &mut first, 10_000);
        let b = run_frames(&mut Scattered::new(config), &mut second, 10_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_speed_fails_build() {
        let mut terminal = terminal("abc");
        let mut effect = Scattered::new(ScatteredConfig {
            movement_speed: 0.0,
            ..Default::default()
        });
        assert!(effect.build(&mut terminal).is_err());
    }
}
