//! Nodes of the segment graph.
//!
//! A segment is either a stretch of one lane between two crossings, or
//! the cell where a horizontal and a vertical lane intersect. Segments
//! are stored in an arena and addressed by [SegmentId] handles, so the
//! cyclic neighbour references of a grid never become ownership cycles.

use crate::road::{Direction, LaneRef, BLOCK_SIZE};
use crate::util::Interval;
use crate::{SegmentId, VehicleId};

/// A stretch of one lane between two crossings.
#[derive(Clone, Debug)]
pub struct LaneSegment {
    /// The lane this segment belongs to.
    pub(crate) lane: LaneRef,
    /// Begin/end offsets along the lane axis.
    pub(crate) span: Interval<f64>,
    /// The segment reached by continuing straight, if any.
    pub(crate) next: Option<SegmentId>,
    /// Position of this segment in its lane's segment list.
    pub(crate) index: usize,
}

/// The cell where one horizontal and one vertical lane cross.
#[derive(Clone, Debug)]
pub struct CrossingSegment {
    /// The horizontal lane passing through the cell.
    pub(crate) horiz_lane: LaneRef,
    /// The vertical lane passing through the cell.
    pub(crate) vert_lane: LaneRef,
    /// The continuation segment per direction of travel out of the cell.
    pub(crate) links: [Option<SegmentId>; 4],
    /// Position of this cell in the horizontal lane's segment list.
    pub(crate) horiz_index: usize,
    /// Position of this cell in the vertical lane's segment list.
    pub(crate) vert_index: usize,
}

/// The two kinds of graph node.
#[derive(Clone, Debug)]
pub enum SegmentKind {
    Lane(LaneSegment),
    Crossing(CrossingSegment),
}

/// A node of the segment graph.
#[derive(Clone, Debug)]
pub struct Segment {
    /// The segment ID.
    id: SegmentId,
    /// The node variant.
    pub(crate) kind: SegmentKind,
    /// The vehicles currently claiming the segment.
    vehicles: Vec<VehicleId>,
}

impl Segment {
    pub(crate) fn new_lane(id: SegmentId, lane: LaneRef, span: Interval<f64>) -> Self {
        Self {
            id,
            kind: SegmentKind::Lane(LaneSegment {
                lane,
                span,
                next: None,
                index: 0,
            }),
            vehicles: vec![],
        }
    }

    pub(crate) fn new_crossing(id: SegmentId, horiz_lane: LaneRef, vert_lane: LaneRef) -> Self {
        Self {
            id,
            kind: SegmentKind::Crossing(CrossingSegment {
                horiz_lane,
                vert_lane,
                links: [None; 4],
                horiz_index: 0,
                vert_index: 0,
            }),
            vehicles: vec![],
        }
    }

    /// Gets the segment's ID.
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Gets the node variant.
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Whether the segment is a crossing cell.
    pub fn is_crossing(&self) -> bool {
        matches!(self.kind, SegmentKind::Crossing(_))
    }

    /// Whether the segment is a lane stretch.
    pub fn is_lane(&self) -> bool {
        matches!(self.kind, SegmentKind::Lane(_))
    }

    /// Gets the lane segment variant, if this is one.
    pub fn as_lane(&self) -> Option<&LaneSegment> {
        match &self.kind {
            SegmentKind::Lane(seg) => Some(seg),
            SegmentKind::Crossing(_) => None,
        }
    }

    /// Gets the crossing variant, if this is one.
    pub fn as_crossing(&self) -> Option<&CrossingSegment> {
        match &self.kind {
            SegmentKind::Crossing(seg) => Some(seg),
            SegmentKind::Lane(_) => None,
        }
    }

    /// Gets the traversal length of the segment.
    pub fn length(&self) -> f64 {
        match &self.kind {
            SegmentKind::Lane(seg) => seg.span.length(),
            SegmentKind::Crossing(_) => BLOCK_SIZE,
        }
    }

    /// Gets the segment reached by leaving this one in the given direction.
    ///
    /// A lane segment has a single continuation regardless of the queried
    /// direction; a crossing resolves the continuation per direction.
    pub fn next_in(&self, direction: Direction) -> Option<SegmentId> {
        match &self.kind {
            SegmentKind::Lane(seg) => seg.next,
            SegmentKind::Crossing(seg) => seg.links[direction.index()],
        }
    }

    /// The lane a vehicle travelling in `direction` occupies in this segment.
    pub fn lane_for(&self, direction: Direction) -> LaneRef {
        match &self.kind {
            SegmentKind::Lane(seg) => seg.lane,
            SegmentKind::Crossing(seg) => {
                if direction.is_horizontal() {
                    seg.horiz_lane
                } else {
                    seg.vert_lane
                }
            }
        }
    }

    /// The vehicles currently claiming the segment.
    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    /// Registers a vehicle's claim on this segment.
    pub(crate) fn insert_vehicle(&mut self, id: VehicleId) {
        self.vehicles.push(id);
    }

    /// Releases a vehicle's claim on this segment.
    pub(crate) fn remove_vehicle(&mut self, id: VehicleId) {
        if let Some(idx) = self.vehicles.iter().rposition(|v| *v == id) {
            self.vehicles.remove(idx);
        }
    }
}

impl LaneSegment {
    /// The lane this segment belongs to.
    pub fn lane(&self) -> LaneRef {
        self.lane
    }

    /// Begin/end offsets along the lane axis.
    pub fn span(&self) -> Interval<f64> {
        self.span
    }

    /// The segment reached by continuing straight, if any.
    pub fn next(&self) -> Option<SegmentId> {
        self.next
    }

    /// Position of this segment in its lane's segment list.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl CrossingSegment {
    /// The horizontal lane passing through the cell.
    pub fn horiz_lane(&self) -> LaneRef {
        self.horiz_lane
    }

    /// The vertical lane passing through the cell.
    pub fn vert_lane(&self) -> LaneRef {
        self.vert_lane
    }

    /// The continuation segment for the given direction of travel.
    pub fn link(&self, direction: Direction) -> Option<SegmentId> {
        self.links[direction.index()]
    }

    /// Position of this cell in the lane matching the travel axis.
    pub fn index_for(&self, direction: Direction) -> usize {
        if direction.is_horizontal() {
            self.horiz_index
        } else {
            self.vert_index
        }
    }
}
