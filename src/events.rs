//! Per-character event rules.
//!
//! A rule says: when `event` happens to `source` (one of the character's own paths or scenes),
//! run `action`. Rules for the same trigger run in registration order. Both the trigger and the
//! action targets are handles, so a rule can never reach into another character.

use crate::animation::SceneId;
use crate::character::CharacterId;
use crate::error::{Error, Result};
use crate::geometry::Coord;
use crate::motion::PathId;
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

/// Something that happened to a path or scene during activation or a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    PathActivated,
    /// The path reached its last waypoint and started holding in place.
    PathHolding,
    WaypointReached,
    PathComplete,
    SceneActivated,
    SceneComplete,
}

impl Event {
    fn is_path_event(self) -> bool {
        matches!(
            self,
            Event::PathActivated | Event::PathHolding | Event::WaypointReached | Event::PathComplete
        )
    }
}

/// The path or scene an event is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventSource {
    Path(PathId),
    Scene(SceneId),
}

impl EventSource {
    fn owner(self) -> CharacterId {
        match self {
            EventSource::Path(path) => path.owner(),
            EventSource::Scene(scene) => scene.owner(),
        }
    }
}

impl From<PathId> for EventSource {
    fn from(path: PathId) -> Self {
        EventSource::Path(path)
    }
}

impl From<SceneId> for EventSource {
    fn from(scene: SceneId) -> Self {
        EventSource::Scene(scene)
    }
}

/// What to do when a rule fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    ActivatePath(PathId),
    DeactivatePath(PathId),
    ActivateScene(SceneId),
    DeactivateScene(SceneId),
    SetLayer(i32),
    SetCoordinate(Coord),
}

impl Action {
    fn owner(self) -> Option<CharacterId> {
        match self {
            Action::ActivatePath(path) | Action::DeactivatePath(path) => Some(path.owner()),
            Action::ActivateScene(scene) | Action::DeactivateScene(scene) => Some(scene.owner()),
            Action::SetLayer(_) | Action::SetCoordinate(_) => None,
        }
    }
}

/// Events waiting to be dispatched within the current tick.
pub(crate) type EventQueue = VecDeque<(Event, EventSource)>;

/// The rule table of one character.
#[derive(Debug)]
pub struct EventHandler {
    owner: CharacterId,
    rules: HashMap<(Event, EventSource), SmallVec<[Action; 2]>>,
}

impl EventHandler {
    pub(crate) fn new(owner: CharacterId) -> Self {
        Self {
            owner,
            rules: HashMap::new(),
        }
    }

    /// Registers a rule.
    ///
    /// Fails if a path event is paired with a scene (or the other way around), or if the source
    /// or the action target belongs to a different character.
    pub fn register_event(
        &mut self,
        event: Event,
        source: impl Into<EventSource>,
        action: Action,
    ) -> Result<()> {
        let source = source.into();
        let source_is_path = matches!(source, EventSource::Path(_));
        if event.is_path_event() != source_is_path {
            return Err(Error::MismatchedEventSource {
                event,
                origin: source,
            });
        }
        if source.owner() != self.owner || action.owner().is_some_and(|o| o != self.owner) {
            return Err(Error::ForeignHandle);
        }
        self.rules.entry((event, source)).or_default().push(action);
        Ok(())
    }

    /// Actions registered for an event, in registration order.
    pub fn actions_for(&self, event: Event, source: impl Into<EventSource>) -> &[Action] {
        self.rules
            .get(&(event, source.into()))
            .map(|actions| actions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
