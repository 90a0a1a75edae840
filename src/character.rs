//! The animated unit: one symbol with its motion, animation and event rules.

use crate::animation::{Animation, SceneId};
use crate::error::Result;
use crate::events::{Action, EventHandler, EventQueue};
use crate::geometry::Coord;
use crate::motion::{Motion, PathId};
use log::warn;
use smallvec::SmallVec;

/// Identifies a character within a [`Terminal`](crate::terminal::Terminal).
///
/// Ids are handed out in creation order, which is also the order characters are drawn in. Every
/// terminal stamps its own ids, so an id (and the path and scene handles derived from it) is never
/// accepted by a character or terminal it does not belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId {
    terminal: u32,
    index: usize,
}

impl CharacterId {
    /// An id outside of any terminal, for characters built standalone.
    pub const fn new(index: usize) -> Self {
        Self { terminal: 0, index }
    }

    pub(crate) const fn in_terminal(terminal: u32, index: usize) -> Self {
        Self { terminal, index }
    }

    pub(crate) fn terminal(self) -> u32 {
        self.terminal
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// A single character of an effect.
///
/// The input coordinate is where the character sits in the input text and never changes. The
/// current coordinate is driven by [`motion`](EffectCharacter::motion) and the appearance by
/// [`animation`](EffectCharacter::animation). Characters start out invisible.
#[derive(Debug)]
pub struct EffectCharacter {
    id: CharacterId,
    input_symbol: char,
    input_coord: Coord,
    visible: bool,
    /// Draw priority, higher layers are drawn on top.
    pub layer: i32,
    pub motion: Motion,
    pub animation: Animation,
    pub event_handler: EventHandler,
}

impl EffectCharacter {
    pub fn new(id: CharacterId, symbol: char, input_coord: Coord) -> Self {
        Self {
            id,
            input_symbol: symbol,
            input_coord,
            visible: false,
            layer: 0,
            motion: Motion::new(id, input_coord),
            animation: Animation::new(id, symbol),
            event_handler: EventHandler::new(id),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn input_symbol(&self) -> char {
        self.input_symbol
    }

    pub fn input_coord(&self) -> Coord {
        self.input_coord
    }

    pub fn current_coord(&self) -> Coord {
        self.motion.current_coord()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns true while a path or a scene is active. Dormant characters keep their last
    /// position and appearance.
    pub fn is_active(&self) -> bool {
        self.motion.active_path().is_some() || self.animation.active_scene().is_some()
    }

    /// Activates a path and runs the event rules triggered by the activation.
    pub fn activate_path(&mut self, path: PathId) -> Result<()> {
        let mut events = EventQueue::new();
        self.motion.activate_path(path, &mut events)?;
        self.dispatch(&mut events);
        Ok(())
    }

    pub fn deactivate_path(&mut self, path: PathId) {
        self.motion.deactivate_path(path);
    }

    /// Activates a scene and runs the event rules triggered by the activation.
    pub fn activate_scene(&mut self, scene: SceneId) -> Result<()> {
        let mut events = EventQueue::new();
        self.animation.activate_scene(scene, &mut events)?;
        self.dispatch(&mut events);
        Ok(())
    }

    pub fn deactivate_scene(&mut self, scene: SceneId) {
        self.animation.deactivate_scene(scene);
    }

    /// Advances the character by one tick.
    ///
    /// Motion goes first so a synced scene sees the progress after this tick's move. All events
    /// raised along the way, including those raised by actions, are handled before returning.
    pub fn tick(&mut self) {
        let mut events = EventQueue::new();
        self.motion.step(&mut events);
        self.dispatch(&mut events);
        let progress = self.motion.progress();
        self.animation.step(progress, &mut events);
        self.dispatch(&mut events);
    }

    fn dispatch(&mut self, events: &mut EventQueue) {
        while let Some((event, source)) = events.pop_front() {
            let actions: SmallVec<[Action; 2]> =
                SmallVec::from_slice(self.event_handler.actions_for(event, source));
            for action in actions {
                self.apply(action, events);
            }
        }
    }

    fn apply(&mut self, action: Action, events: &mut EventQueue) {
        let result = match action {
            Action::ActivatePath(path) => self.motion.activate_path(path, events),
            Action::DeactivatePath(path) => {
                self.motion.deactivate_path(path);
                Ok(())
            }
            Action::ActivateScene(scene) => self.animation.activate_scene(scene, events),
            Action::DeactivateScene(scene) => {
                self.animation.deactivate_scene(scene);
                Ok(())
            }
            Action::SetLayer(layer) => {
                self.layer = layer;
                Ok(())
            }
            Action::SetCoordinate(coord) => {
                self.motion.set_coordinate(coord);
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!("character {:?}: skipped {action:?}: {err}", self.id);
        }
    }
}
