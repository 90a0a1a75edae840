//! Character appearance over time.
//!
//! A [`Scene`] is a list of [`Frame`]s, each shown for a number of ticks. Scenes can loop, follow
//! an easing curve over their total duration, or be synced to the progress of the character's
//! active path so that a color transition tracks physical travel.

use crate::character::CharacterId;
use crate::easing::Easing;
use crate::error::{Error, Result};
use crate::events::{Event, EventQueue, EventSource};
use crate::motion::PathProgress;
use crate::rendering::color::{Color, Gradient};
use crate::rendering::pixel::Pixel;
use log::trace;

/// Handle to a scene owned by a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId {
    owner: CharacterId,
    index: usize,
}

impl SceneId {
    pub fn owner(self) -> CharacterId {
        self.owner
    }
}

/// Which path progress measure a synced scene follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMetric {
    /// Progress over the whole path.
    Distance,
    /// Progress within the current leg of the path.
    Step,
}

/// A symbol and color shown for `duration` ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub symbol: char,
    pub duration: u32,
    pub color: Color,
}

impl Frame {
    fn pixel(&self) -> Pixel {
        Pixel::new(self.symbol).with_color(self.color)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SceneStep {
    pixel: Option<Pixel>,
    complete: bool,
}

/// An ordered sequence of frames.
#[derive(Debug)]
pub struct Scene {
    handle: SceneId,
    id: String,
    frames: Vec<Frame>,
    sync: Option<SyncMetric>,
    looping: bool,
    easing: Option<Easing>,

    frame_index: usize,
    frame_ticks: u32,
    elapsed: u32,
}

impl Scene {
    fn new(handle: SceneId, id: String) -> Self {
        Self {
            handle,
            id,
            frames: Vec::new(),
            sync: None,
            looping: false,
            easing: None,
            frame_index: 0,
            frame_ticks: 0,
            elapsed: 0,
        }
    }

    pub fn handle(&self) -> SceneId {
        self.handle
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Sum of all frame durations.
    pub fn total_duration(&self) -> u32 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Appends a frame. `duration` is the number of ticks it is shown for and must be at least 1.
    pub fn add_frame(&mut self, symbol: char, duration: u32, color: Color) -> Result<&mut Self> {
        if duration == 0 {
            return Err(Error::InvalidFrameDuration);
        }
        self.frames.push(Frame {
            symbol,
            duration,
            color,
        });
        Ok(self)
    }

    /// Appends one frame per gradient color, all showing `symbol`.
    pub fn apply_gradient_to_symbols(
        &mut self,
        gradient: &Gradient,
        symbol: char,
        duration: u32,
    ) -> Result<&mut Self> {
        for &color in gradient.spectrum() {
            self.add_frame(symbol, duration, color)?;
        }
        Ok(self)
    }

    pub fn set_looping(&mut self, looping: bool) -> &mut Self {
        self.looping = looping;
        self
    }

    /// Ties the shown frame to the progress of the active path instead of elapsed ticks.
    pub fn set_sync(&mut self, sync: Option<SyncMetric>) -> &mut Self {
        self.sync = sync;
        self
    }

    /// Picks frames along an easing curve over the total duration.
    pub fn set_easing(&mut self, easing: Option<Easing>) -> &mut Self {
        self.easing = easing;
        self
    }

    fn reset(&mut self) {
        self.frame_index = 0;
        self.frame_ticks = 0;
        self.elapsed = 0;
    }

    fn last_pixel(&self) -> Option<Pixel> {
        self.frames.last().map(Frame::pixel)
    }

    /// Index of the frame whose cumulative duration range contains `tick` (1-based).
    fn frame_at_tick(&self, tick: f64) -> usize {
        let mut end = 0.0;
        for (i, frame) in self.frames.iter().enumerate() {
            end += frame.duration as f64;
            if tick <= end {
                return i;
            }
        }
        self.frames.len() - 1
    }

    fn step(&mut self, progress: Option<PathProgress>) -> SceneStep {
        if self.frames.is_empty() {
            return SceneStep {
                complete: true,
                ..Default::default()
            };
        }

        if let Some(sync) = self.sync {
            let Some(progress) = progress else {
                return SceneStep {
                    pixel: self.last_pixel(),
                    complete: true,
                };
            };
            let fraction = match sync {
                SyncMetric::Distance => progress.distance,
                SyncMetric::Step => progress.step,
            };
            let count = self.frames.len();
            let index = ((fraction.clamp(0.0, 1.0) * count as f64).floor() as usize).min(count - 1);
            return SceneStep {
                pixel: Some(self.frames[index].pixel()),
                complete: false,
            };
        }

        if let Some(easing) = self.easing {
            let total = self.total_duration();
            self.elapsed += 1;
            let eased_tick = easing.apply(self.elapsed as f64 / total as f64) * total as f64;
            let pixel = self.frames[self.frame_at_tick(eased_tick.max(0.0))].pixel();
            let mut complete = false;
            if self.elapsed >= total {
                if self.looping {
                    self.elapsed = 0;
                } else {
                    complete = true;
                }
            }
            return SceneStep {
                pixel: Some(pixel),
                complete,
            };
        }

        let frame = self.frames[self.frame_index];
        let mut complete = false;
        self.frame_ticks += 1;
        if self.frame_ticks >= frame.duration {
            self.frame_ticks = 0;
            self.frame_index += 1;
            if self.frame_index == self.frames.len() {
                if self.looping {
                    self.frame_index = 0;
                } else {
                    complete = true;
                }
            }
        }
        SceneStep {
            pixel: Some(frame.pixel()),
            complete,
        }
    }
}

/// Appearance and scenes of one character.
#[derive(Debug)]
pub struct Animation {
    owner: CharacterId,
    scenes: Vec<Scene>,
    active_scene: Option<SceneId>,
    current_visual: Pixel,
}

impl Animation {
    pub(crate) fn new(owner: CharacterId, symbol: char) -> Self {
        Self {
            owner,
            scenes: Vec::new(),
            active_scene: None,
            current_visual: Pixel::new(symbol),
        }
    }

    /// The symbol and color the character is currently drawn with.
    pub fn current_visual(&self) -> Pixel {
        self.current_visual
    }

    /// Sets the appearance directly. An active scene overrides it on its next step.
    pub fn set_appearance(&mut self, symbol: char, color: Color) {
        self.current_visual = Pixel::new(symbol).with_color(color);
    }

    /// Creates a scene with an id derived from its registration index.
    pub fn new_scene(&mut self) -> &mut Scene {
        let index = self.scenes.len();
        let handle = SceneId {
            owner: self.owner,
            index,
        };
        // registration indices never collide with each other, only with user ids
        let mut id = index.to_string();
        while self.query_scene(&id).is_some() {
            id.push('_');
        }
        self.scenes.push(Scene::new(handle, id));
        &mut self.scenes[index]
    }

    /// Creates a scene that can later be found with [`query_scene`](Animation::query_scene).
    pub fn new_scene_with_id(&mut self, id: impl Into<String>) -> Result<&mut Scene> {
        let id = id.into();
        if self.query_scene(&id).is_some() {
            return Err(Error::DuplicateSceneId(id));
        }
        let index = self.scenes.len();
        let handle = SceneId {
            owner: self.owner,
            index,
        };
        self.scenes.push(Scene::new(handle, id));
        Ok(&mut self.scenes[index])
    }

    pub fn query_scene(&self, id: &str) -> Option<SceneId> {
        self.scenes.iter().find(|s| s.id == id).map(|s| s.handle)
    }

    pub fn scene(&self, handle: SceneId) -> Option<&Scene> {
        if handle.owner != self.owner {
            return None;
        }
        self.scenes.get(handle.index)
    }

    pub fn scene_mut(&mut self, handle: SceneId) -> Option<&mut Scene> {
        if handle.owner != self.owner {
            return None;
        }
        self.scenes.get_mut(handle.index)
    }

    pub fn active_scene(&self) -> Option<SceneId> {
        self.active_scene
    }

    /// Makes `handle` the active scene, restarting it and showing its first frame immediately.
    pub(crate) fn activate_scene(&mut self, handle: SceneId, events: &mut EventQueue) -> Result<()> {
        let scene = self.scene_mut(handle).ok_or(Error::ForeignHandle)?;
        let Some(first) = scene.frames.first().map(Frame::pixel) else {
            return Err(Error::EmptyScene(scene.id.clone()));
        };
        scene.reset();
        trace!("activated scene `{}` with {} frames", scene.id, scene.frames.len());
        self.current_visual = first;
        self.active_scene = Some(handle);
        events.push_back((Event::SceneActivated, EventSource::Scene(handle)));
        Ok(())
    }

    /// Deactivates `handle` if it is the active scene. The current visual is kept.
    pub(crate) fn deactivate_scene(&mut self, handle: SceneId) {
        if self.active_scene == Some(handle) {
            self.active_scene = None;
        }
    }

    /// Advances the active scene by one tick.
    pub(crate) fn step(&mut self, progress: Option<PathProgress>, events: &mut EventQueue) {
        let Some(handle) = self.active_scene else {
            return;
        };
        let step = self.scenes[handle.index].step(progress);
        if let Some(pixel) = step.pixel {
            self.current_visual = pixel;
        }
        if step.complete {
            self.active_scene = None;
            events.push_back((Event::SceneComplete, EventSource::Scene(handle)));
        }
    }
}
