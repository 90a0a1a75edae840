//! Some characters start in the wrong position and are corrected in sequence.
//!
//! Each swapped pair flashes an error pattern, wipes into a block, travels back home while the
//! block fades from the error color to the correct color, then wipes back into its symbol and
//! fades into its final color. All of this is chained with event rules at build time; the effect
//! only kicks off the error scene of one pair every `swap_delay` ticks.

use crate::Effect;
use crate::animation::SyncMetric;
use crate::character::CharacterId;
use crate::easing::Easing;
use crate::effects::{WHITE, animate};
use crate::error::Result;
use crate::events::{Action, Event, EventSource};
use crate::geometry::Coord;
use crate::rendering::color::{Color, Gradient, GradientDirection};
use crate::seeds;
use crate::terminal::Terminal;
use clap::Args;
use log::{debug, warn};
use rand::Rng;
use std::collections::VecDeque;

const BLOCK_SYMBOL: char = '▓';
const BLOCK_WIPE_START: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BLOCK_WIPE_END: [char; 7] = ['▇', '▆', '▅', '▄', '▃', '▂', '▁'];

const DEFAULT_ERROR_COLOR: Color = Color::Rgb([0xe7, 0x4c, 0x3c]);
const DEFAULT_CORRECT_COLOR: Color = Color::Rgb([0x45, 0xbf, 0x55]);
const DEFAULT_FINAL_GRADIENT_STOPS: [Color; 3] = [
    Color::Rgb([0x8a, 0x00, 0x8a]),
    Color::Rgb([0x00, 0xd1, 0xff]),
    Color::Rgb([0xff, 0xff, 0xff]),
];

#[derive(Args, Clone, Debug, PartialEq)]
pub struct ErrorCorrectConfig {
    /// Fraction of the characters that start in the wrong position, 0.2 swaps 20% of them.
    #[arg(long, default_value_t = 0.1)]
    pub error_pairs: f64,
    /// Number of ticks between the start of two corrections.
    #[arg(long, default_value_t = 10)]
    pub swap_delay: u32,
    /// Color of the characters in the wrong position.
    #[arg(long, default_value_t = DEFAULT_ERROR_COLOR)]
    pub error_color: Color,
    /// Color of the characters once corrected, fading into the final color.
    #[arg(long, default_value_t = DEFAULT_CORRECT_COLOR)]
    pub correct_color: Color,
    /// Colors for the final character gradient.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_FINAL_GRADIENT_STOPS)]
    pub final_gradient_stops: Vec<Color>,
    /// Number of gradient steps between each pair of stops.
    #[arg(long, num_args = 1.., default_values_t = [12])]
    pub final_gradient_steps: Vec<usize>,
    #[arg(long, value_enum, default_value_t = GradientDirection::Vertical)]
    pub final_gradient_direction: GradientDirection,
    /// Cells per tick while moving to the correct position.
    #[arg(long, default_value_t = 0.5)]
    pub movement_speed: f64,
    /// Seed for picking the swapped characters.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for ErrorCorrectConfig {
    fn default() -> Self {
        Self {
            error_pairs: 0.1,
            swap_delay: 10,
            error_color: DEFAULT_ERROR_COLOR,
            correct_color: DEFAULT_CORRECT_COLOR,
            final_gradient_stops: DEFAULT_FINAL_GRADIENT_STOPS.to_vec(),
            final_gradient_steps: vec![12],
            final_gradient_direction: GradientDirection::Vertical,
            movement_speed: 0.5,
            seed: None,
        }
    }
}

pub struct ErrorCorrect {
    config: ErrorCorrectConfig,
    swapped: VecDeque<(CharacterId, CharacterId)>,
    active: Vec<CharacterId>,
    delay_remaining: u32,
    finished: bool,
}

impl ErrorCorrect {
    pub fn new(config: ErrorCorrectConfig) -> Self {
        Self {
            config,
            swapped: VecDeque::new(),
            active: Vec::new(),
            delay_remaining: 0,
            finished: false,
        }
    }

    /// Sets up the scenes, the path home and the rules chaining them for one swapped character.
    fn build_correction(
        &self,
        terminal: &mut Terminal,
        id: CharacterId,
        start: Coord,
        final_color: Color,
    ) -> Result<()> {
        let config = &self.config;
        let Some(character) = terminal.character_mut(id) else {
            return Ok(());
        };
        let symbol = character.input_symbol();
        let input_coord = character.input_coord();

        character.motion.set_coordinate(start);
        let path = character
            .motion
            .new_path_with_id("input_coord", config.movement_speed, Easing::Linear)?
            .new_waypoint(input_coord)
            .handle();

        let animation = &mut character.animation;
        let first_block_wipe = animation.new_scene();
        for block in BLOCK_WIPE_START {
            first_block_wipe.add_frame(block, 3, config.error_color)?;
        }
        let first_block_wipe = first_block_wipe.handle();
        let last_block_wipe = animation.new_scene();
        for block in BLOCK_WIPE_END {
            last_block_wipe.add_frame(block, 3, config.correct_color)?;
        }
        let last_block_wipe = last_block_wipe.handle();

        let error = animation.new_scene_with_id("error")?;
        for _ in 0..10 {
            error
                .add_frame(BLOCK_SYMBOL, 3, config.error_color)?
                .add_frame(symbol, 3, WHITE)?;
        }
        let error = error.handle();

        let correcting_gradient =
            Gradient::new(&[config.error_color, config.correct_color], &[10])?;
        let correcting = animation
            .new_scene()
            .set_sync(Some(SyncMetric::Distance))
            .apply_gradient_to_symbols(&correcting_gradient, '█', 3)?
            .handle();

        let final_gradient = Gradient::new(&[config.correct_color, final_color], &[10])?;
        let final_scene = animation
            .new_scene()
            .apply_gradient_to_symbols(&final_gradient, symbol, 3)?
            .handle();

        let path_source = EventSource::Path(path);
        let rules = [
            (
                Event::SceneComplete,
                EventSource::Scene(error),
                Action::ActivateScene(first_block_wipe),
            ),
            (
                Event::SceneComplete,
                EventSource::Scene(first_block_wipe),
                Action::ActivateScene(correcting),
            ),
            (
                Event::SceneComplete,
                EventSource::Scene(first_block_wipe),
                Action::ActivatePath(path),
            ),
            (Event::PathActivated, path_source, Action::SetLayer(1)),
            (Event::PathComplete, path_source, Action::SetLayer(0)),
            (
                Event::PathComplete,
                path_source,
                Action::ActivateScene(last_block_wipe),
            ),
            (
                Event::SceneComplete,
                EventSource::Scene(last_block_wipe),
                Action::ActivateScene(final_scene),
            ),
        ];
        for (event, source, action) in rules {
            character.event_handler.register_event(event, source, action)?;
        }
        character.animation.set_appearance(symbol, config.error_color);
        Ok(())
    }

    fn start_correction(&mut self, terminal: &mut Terminal, id: CharacterId) {
        let Some(character) = terminal.character_mut(id) else {
            return;
        };
        let Some(error) = character.animation.query_scene("error") else {
            return;
        };
        match character.activate_scene(error) {
            Ok(()) => self.active.push(id),
            Err(err) => warn!("could not start correcting {id:?}: {err}"),
        }
    }
}

impl Effect for ErrorCorrect {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
        self.swapped.clear();
        self.active.clear();
        self.delay_remaining = 0;
        self.finished = false;

        let area = terminal.output_area();
        let final_gradient = Gradient::new(
            &self.config.final_gradient_stops,
            &self.config.final_gradient_steps,
        )?;
        let final_colors = final_gradient.build_coordinate_color_mapping(
            area.top,
            area.right,
            self.config.final_gradient_direction,
        );
        let final_color_of = |terminal: &Terminal, id: CharacterId| {
            terminal
                .character(id)
                .and_then(|c| final_colors.get(&c.input_coord()).copied())
                .unwrap_or_else(|| final_gradient.last())
        };

        let mut remaining: Vec<CharacterId> =
            terminal.input_characters().iter().map(|c| c.id()).collect();
        for &id in &remaining {
            let final_color = final_color_of(terminal, id);
            let Some(character) = terminal.character_mut(id) else {
                continue;
            };
            let symbol = character.input_symbol();
            character.animation.set_appearance(symbol, final_color);
            terminal.set_character_visibility(id, true);
        }

        let mut rng = seeds::rng_for(self.config.seed, "errorcorrect.pairs");
        let pair_count = (self.config.error_pairs * remaining.len() as f64) as usize;
        for _ in 0..pair_count {
            if remaining.len() < 2 {
                break;
            }
            let first = remaining.swap_remove(rng.gen_range(0..remaining.len()));
            let second = remaining.swap_remove(rng.gen_range(0..remaining.len()));
            let (Some(first_coord), Some(second_coord)) = (
                terminal.character(first).map(|c| c.input_coord()),
                terminal.character(second).map(|c| c.input_coord()),
            ) else {
                continue;
            };
            let first_color = final_color_of(terminal, first);
            let second_color = final_color_of(terminal, second);
            self.build_correction(terminal, first, second_coord, first_color)?;
            self.build_correction(terminal, second, first_coord, second_color)?;
            self.swapped.push_back((first, second));
        }
        debug!("swapped {} character pairs", self.swapped.len());
        Ok(())
    }

    fn produce_next_frame(&mut self, terminal: &mut Terminal) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.delay_remaining == 0 {
            if self.swapped.is_empty() && self.active.is_empty() {
                self.finished = true;
                return Some(terminal.formatted_output());
            }
            if let Some((first, second)) = self.swapped.pop_front() {
                self.start_correction(terminal, first);
                self.start_correction(terminal, second);
            }
            self.delay_remaining = self.config.swap_delay.max(1);
        }
        let frame = terminal.formatted_output();
        animate(terminal, &mut self.active);
        self.delay_remaining -= 1;
        Some(frame)
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
        config: ErrorCorrectConfig,
    }

    #[test]
    fn test_cli_defaults_match_default() {
        let cli = Cli::try_parse_from(["errorcorrect"]).unwrap();
        assert_eq!(cli.config, ErrorCorrectConfig::default());
    }

    #[test]
    fn test_swapped_characters_start_in_each_others_place() {
        let mut terminal = terminal(INPUT);
        let mut effect = ErrorCorrect::new(ErrorCorrectConfig {
            error_pairs: 0.2,
            seed: Some(5),
            ..Default::default()
        });
        effect.build(&mut terminal).unwrap();
        assert!(!effect.swapped.is_empty());
        for &(first, second) in &effect.swapped {
            let first = terminal.character(first).unwrap();
            let second = terminal.character(second).unwrap();
            assert_eq!(first.current_coord(), second.input_coord());
            assert_eq!(second.current_coord(), first.input_coord());
            assert!(first.motion.query_path("input_coord").is_some());
            assert!(first.animation.query_scene("error").is_some());
        }
    }

    #[test]
    fn test_all_pairs_are_corrected() {
        let mut terminal = terminal(INPUT);
        let mut effect = ErrorCorrect::new(ErrorCorrectConfig {
            error_pairs: 0.5,
            swap_delay: 3,
            seed: Some(9),
            ..Default::default()
        });
        let frames = run_frames(&mut effect, &mut terminal, 20_000);
        assert_eq!(frames.last(), Some(&settled(&terminal)));
        for character in terminal.input_characters() {
            assert_eq!(character.current_coord(), character.input_coord());
            assert_eq!(character.animation.current_visual().symbol, character.input_symbol());
            assert_eq!(character.layer, 0);
        }
    }

    #[test]
    fn test_waiting_characters_are_dormant() {
        let mut terminal = terminal(INPUT);
        let mut effect = ErrorCorrect::new(ErrorCorrectConfig {
            error_pairs: 0.2,
            seed: Some(5),
            ..Default::default()
        });
        effect.build(&mut terminal).unwrap();
        let swapped: Vec<CharacterId> = effect
            .swapped
            .iter()
            .flat_map(|&(first, second)| [first, second])
            .collect();
        let config = ErrorCorrectConfig::default();
        for character in terminal.input_characters() {
            assert!(!character.is_active());
            assert!(character.is_visible());
            let visual = character.animation.current_visual();
            assert_eq!(visual.symbol, character.input_symbol());
            if swapped.contains(&character.id()) {
                assert_eq!(visual.color, config.error_color);
            } else {
                assert_ne!(visual.color, config.error_color);
            }
        }
    }

    #[test]
    fn test_no_errors_finishes_immediately() {
        let mut terminal = terminal("abc");
        let mut effect = ErrorCorrect::new(ErrorCorrectConfig {
            error_pairs: 0.0,
            ..Default::default()
        });
        let frames = run_frames(&mut effect, &mut terminal, 1);
        assert_eq!(frames, vec!["abc".to_string()]);
    }
}
