//! Error values returned by the simulation core.
//!
//! Every failure mode is an explicit result value; nothing is swallowed
//! or silently truncated.

use thiserror::Error;

/// A road configuration that cannot be built into a segment graph.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two roads of the same orientation occupy overlapping spans.
    #[error("road `{road}` overlaps the span of road `{previous}`")]
    OverlappingRoads {
        /// The road whose span starts before the sweep cursor.
        road: String,
        /// The previously swept road of the same orientation.
        previous: String,
    },
    /// A road was declared without any lanes.
    #[error("road `{road}` has no lanes")]
    EmptyRoad { road: String },
}

/// A vehicle's look-ahead claim found no segment to continue onto.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("no next segment to claim ahead of the vehicle")]
pub struct DeadEnd;

/// A lane change was requested where no parallel lane exists.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("no adjacent lane in that direction")]
pub struct NoAdjacentLane;

/// A turn was requested while the vehicle's front is not inside a crossing.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("vehicle front is not inside a crossing")]
pub struct NotAtCrossing;

/// The goal segment cannot be reached from the start segment.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("goal segment is unreachable from the start segment")]
pub struct Unreachable;
