pub use cgmath;
pub use error::{ConfigurationError, DeadEnd, NoAdjacentLane, NotAtCrossing, Unreachable};
pub use network::RoadNetwork;
pub use pathfinding::{find_path, Goal};
pub use road::{
    Direction, Lane, LaneGroup, LaneRef, Road, RoadAttributes, BLOCK_SIZE, CLOCKWISE, LANE_GAP,
};
pub use segment::{CrossingSegment, LaneSegment, Segment, SegmentKind};
pub use simulation::Simulation;
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{Claim, Vehicle, VehicleAttributes, BRAKING_MARGIN};
use slotmap::{new_key_type, SlotMap};

mod debug;
mod error;
pub mod math;
mod network;
mod pathfinding;
mod road;
mod segment;
mod simulation;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Segment].
    pub struct SegmentId;
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type SegmentSet = SlotMap<SegmentId, Segment>;
type VehicleSet = SlotMap<VehicleId, Vehicle>;
