//! Character movement along paths.
//!
//! A [`Path`] is a list of waypoints travelled at a fixed speed. Each leg between two waypoints is
//! split into `max(1, round(distance / speed))` steps and every tick advances one step, with the
//! position along the leg shaped by the path's [`Easing`].

use crate::character::CharacterId;
use crate::easing::Easing;
use crate::error::{Error, Result};
use crate::events::{Event, EventQueue, EventSource};
use crate::geometry::{Coord, distance, lerp};
use log::trace;

/// Handle to a path owned by a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathId {
    owner: CharacterId,
    index: usize,
}

impl PathId {
    pub fn owner(self) -> CharacterId {
        self.owner
    }
}

/// How far along the active path a character is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathProgress {
    /// Steps taken over steps required for the whole path, in `[0, 1]`.
    pub distance: f64,
    /// Progress within the current leg, in `[0, 1]`.
    pub step: f64,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: Coord,
    end: Coord,
    steps: u64,
}

/// The result of advancing a path by one tick.
#[derive(Clone, Copy, Debug, Default)]
struct PathStep {
    coord: Coord,
    waypoint_reached: bool,
    holding: bool,
    complete: bool,
}

/// A sequence of waypoints with a speed and an easing function.
#[derive(Debug)]
pub struct Path {
    handle: PathId,
    id: String,
    waypoints: Vec<Coord>,
    speed: f64,
    easing: Easing,
    hold_time: u32,
    looping: bool,

    segments: Vec<Segment>,
    segment_index: usize,
    segment_step: u64,
    hold_elapsed: u32,
    total_steps: u64,
    steps_done: u64,
}

impl Path {
    fn new(handle: PathId, id: String, speed: f64, easing: Easing) -> Result<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(Error::InvalidSpeed(speed));
        }
        Ok(Self {
            handle,
            id,
            waypoints: Vec::new(),
            speed,
            easing,
            hold_time: 0,
            looping: false,
            segments: Vec::new(),
            segment_index: 0,
            segment_step: 0,
            hold_elapsed: 0,
            total_steps: 0,
            steps_done: 0,
        })
    }

    pub fn handle(&self) -> PathId {
        self.handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn waypoints(&self) -> &[Coord] {
        &self.waypoints
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Appends a waypoint.
    pub fn new_waypoint(&mut self, coord: Coord) -> &mut Self {
        self.waypoints.push(coord);
        self
    }

    /// Number of ticks to stay on the last waypoint before the path completes.
    pub fn set_hold_time(&mut self, ticks: u32) -> &mut Self {
        self.hold_time = ticks;
        self
    }

    /// A looping path starts over from its first waypoint instead of completing.
    pub fn set_looping(&mut self, looping: bool) -> &mut Self {
        self.looping = looping;
        self
    }

    /// Splits the path into legs starting at `origin`.
    fn plan(&mut self, origin: Coord) {
        let mut start = origin;
        self.segments = self
            .waypoints
            .iter()
            .map(|&end| {
                // float to int casts saturate, so a tiny speed yields u64::MAX steps
                let steps = (distance(start, end) / self.speed).round().max(1.0) as u64;
                let segment = Segment { start, end, steps };
                start = end;
                segment
            })
            .collect();
        self.segment_index = 0;
        self.segment_step = 0;
        self.hold_elapsed = 0;
        self.total_steps = self
            .segments
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.steps));
        self.steps_done = 0;
    }

    fn last_waypoint(&self) -> Coord {
        self.segments.last().map(|s| s.end).unwrap_or_default()
    }

    fn progress(&self) -> PathProgress {
        let distance = if self.total_steps == 0 {
            1.0
        } else {
            self.steps_done as f64 / self.total_steps as f64
        };
        let step = match self.segments.get(self.segment_index) {
            Some(segment) => self.segment_step as f64 / segment.steps as f64,
            None => 1.0,
        };
        PathProgress { distance, step }
    }

    /// Called once the last waypoint was reached and any hold time has passed.
    fn finish(&mut self, step: &mut PathStep) {
        if self.looping {
            let origin = self.last_waypoint();
            self.plan(origin);
        } else {
            step.complete = true;
        }
    }

    fn step(&mut self) -> PathStep {
        let Some(&segment) = self.segments.get(self.segment_index) else {
            // holding on the last waypoint
            let mut step = PathStep {
                coord: self.last_waypoint(),
                ..Default::default()
            };
            self.hold_elapsed += 1;
            step.holding = self.hold_elapsed == 1;
            if self.hold_elapsed >= self.hold_time {
                self.finish(&mut step);
            }
            return step;
        };

        self.segment_step += 1;
        self.steps_done = self.steps_done.saturating_add(1);
        if self.segment_step < segment.steps {
            let t = self.segment_step as f64 / segment.steps as f64;
            return PathStep {
                coord: lerp(segment.start, segment.end, self.easing.apply(t)),
                ..Default::default()
            };
        }

        let mut step = PathStep {
            coord: segment.end,
            waypoint_reached: true,
            ..Default::default()
        };
        self.segment_index += 1;
        self.segment_step = 0;
        if self.segment_index == self.segments.len() && self.hold_time == 0 {
            self.finish(&mut step);
        }
        step
    }
}

/// Position and paths of one character.
#[derive(Debug)]
pub struct Motion {
    owner: CharacterId,
    current_coord: Coord,
    paths: Vec<Path>,
    active_path: Option<PathId>,
}

impl Motion {
    pub(crate) fn new(owner: CharacterId, coord: Coord) -> Self {
        Self {
            owner,
            current_coord: coord,
            paths: Vec::new(),
            active_path: None,
        }
    }

    pub fn current_coord(&self) -> Coord {
        self.current_coord
    }

    /// Moves the character without animation. An active path keeps running from its plan.
    pub fn set_coordinate(&mut self, coord: Coord) {
        self.current_coord = coord;
    }

    /// Creates a path with an id derived from its registration index.
    pub fn new_path(&mut self, speed: f64, easing: Easing) -> Result<&mut Path> {
        // registration indices never collide with each other, only with user ids
        let mut id = self.paths.len().to_string();
        while self.query_path(&id).is_some() {
            id.push('_');
        }
        self.new_path_with_id(id, speed, easing)
    }

    /// Creates a path that can later be found with [`query_path`](Motion::query_path).
    pub fn new_path_with_id(
        &mut self,
        id: impl Into<String>,
        speed: f64,
        easing: Easing,
    ) -> Result<&mut Path> {
        let id = id.into();
        if self.query_path(&id).is_some() {
            return Err(Error::DuplicatePathId(id));
        }
        let index = self.paths.len();
        let handle = PathId {
            owner: self.owner,
            index,
        };
        self.paths.push(Path::new(handle, id, speed, easing)?);
        Ok(&mut self.paths[index])
    }

    pub fn query_path(&self, id: &str) -> Option<PathId> {
        self.paths.iter().find(|p| p.id == id).map(|p| p.handle)
    }

    pub fn path(&self, handle: PathId) -> Option<&Path> {
        (handle.owner == self.owner)
            .then(|| self.paths.get(handle.index))
            .flatten()
    }

    pub fn path_mut(&mut self, handle: PathId) -> Option<&mut Path> {
        if handle.owner != self.owner {
            return None;
        }
        self.paths.get_mut(handle.index)
    }

    pub fn active_path(&self) -> Option<PathId> {
        self.active_path
    }

    /// Progress along the active path, `None` without an active path.
    pub fn progress(&self) -> Option<PathProgress> {
        self.active_path.map(|handle| self.paths[handle.index].progress())
    }

    /// Makes `handle` the active path, starting from the current coordinate.
    pub(crate) fn activate_path(&mut self, handle: PathId, events: &mut EventQueue) -> Result<()> {
        let origin = self.current_coord;
        let path = self.path_mut(handle).ok_or(Error::ForeignHandle)?;
        if path.waypoints.is_empty() {
            return Err(Error::EmptyPath(path.id.clone()));
        }
        path.plan(origin);
        trace!(
            "activated path `{}` with {} steps from {:?}",
            path.id, path.total_steps, origin
        );
        self.active_path = Some(handle);
        events.push_back((Event::PathActivated, EventSource::Path(handle)));
        Ok(())
    }

    /// Deactivates `handle` if it is the active path. No event is emitted.
    pub(crate) fn deactivate_path(&mut self, handle: PathId) {
        if self.active_path == Some(handle) {
            self.active_path = None;
        }
    }

    /// Advances the active path by one step.
    pub(crate) fn step(&mut self, events: &mut EventQueue) {
        let Some(handle) = self.active_path else {
            return;
        };
        let step = self.paths[handle.index].step();
        self.current_coord = step.coord;
        let source = EventSource::Path(handle);
        if step.waypoint_reached {
            events.push_back((Event::WaypointReached, source));
        }
        if step.holding {
            events.push_back((Event::PathHolding, source));
        }
        if step.complete {
            self.active_path = None;
            events.push_back((Event::PathComplete, source));
        }
    }
}
