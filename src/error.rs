//! Error type shared by the whole crate.

use crate::events::{Event, EventSource};
use crate::geometry::OutputArea;
use crate::rendering::color::ParseColorError;
use std::io;
use thiserror::Error;

/// Everything that can go wrong while building or running an effect.
///
/// Configuration problems are reported when a path, scene, gradient or event rule is built or
/// activated. I/O errors only come from the renderer and are fatal for the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input text contains no drawable characters")]
    EmptyInput,
    #[error("output area {0:?} has zero extent")]
    EmptyOutputArea(OutputArea),
    #[error("path speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),
    #[error("frame duration must be at least one tick")]
    InvalidFrameDuration,
    #[error("path `{0}` has no waypoints")]
    EmptyPath(String),
    #[error("scene `{0}` has no frames")]
    EmptyScene(String),
    #[error("a path with id `{0}` already exists")]
    DuplicatePathId(String),
    #[error("a scene with id `{0}` already exists")]
    DuplicateSceneId(String),
    #[error("{event:?} cannot be triggered by {origin:?}")]
    MismatchedEventSource { event: Event, origin: EventSource },
    #[error("event rules may only reference paths and scenes of the same character")]
    ForeignHandle,
    #[error("a gradient needs at least one color stop")]
    EmptyGradient,
    #[error("gradient step counts must be at least 1")]
    InvalidGradientSteps,
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error("failed to write to the terminal")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
