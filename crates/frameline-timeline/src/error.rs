//! Error types for the timeline model.
//!
//! These are contract violations: a caller holding a stale id or mixing
//! clip kinds is a bug in the caller, and the failure is loud and typed
//! rather than silently absorbed.

use thiserror::Error;
use uuid::Uuid;

use crate::clip::ClipKind;

/// Errors from track-level clip operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("clip kind {actual:?} does not match track kind {expected:?}")]
    KindMismatch { expected: ClipKind, actual: ClipKind },

    #[error("clip {clip} is already owned by track {owner}")]
    AlreadyOwned { clip: Uuid, owner: Uuid },

    #[error("clip {clip} is not a member of this track")]
    NotOwned { clip: Uuid },
}

/// Errors from timeline-level track operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("no track with id {track}")]
    UnknownTrack { track: Uuid },

    #[error("track index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
