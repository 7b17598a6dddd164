//! The static road and lane model.
//!
//! Roads are configuration data: they are constructed once from a
//! [RoadAttributes] descriptor and never mutated after the segment
//! graph has been built on top of them.

use crate::math::Vector2d;
use crate::SegmentId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The side length of one grid cell, which is also the width of a lane.
pub const BLOCK_SIZE: f64 = 40.0;

/// The gap between two adjacent lanes of the same road.
pub const LANE_GAP: f64 = 2.0;

/// A travel direction on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

/// The four directions in clockwise rotation order.
pub const CLOCKWISE: [Direction; 4] = [
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::Up,
];

impl Direction {
    /// A unit vector along the direction of travel.
    pub fn axis(self) -> Vector2d {
        match self {
            Direction::Right => Vector2d::new(1.0, 0.0),
            Direction::Left => Vector2d::new(-1.0, 0.0),
            Direction::Up => Vector2d::new(0.0, 1.0),
            Direction::Down => Vector2d::new(0.0, -1.0),
        }
    }

    /// Whether the direction points along the positive sense of its axis.
    ///
    /// Forward-sense lanes are linked front to back; reverse-sense lanes
    /// back to front, and vehicles travelling them carry a negative
    /// along-segment offset.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Right | Direction::Up)
    }

    /// Whether the direction runs along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    /// Index of this direction into per-direction link tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Left => 1,
            Direction::Up => 2,
            Direction::Down => 3,
        }
    }

    /// The direction after a 90 degree clockwise turn.
    pub fn cw(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    /// The direction after a 90 degree counter-clockwise turn.
    pub fn ccw(self) -> Self {
        self.cw().cw().cw()
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        self.cw().cw()
    }
}

/// The two flow groups of a road.
///
/// Entry lanes flow Left (horizontal roads) or Up (vertical roads);
/// exit lanes flow Right or Down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneGroup {
    Entry,
    Exit,
}

/// Addresses a lane within the network's immutable road list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneRef {
    /// Index of the road in the network's road list.
    pub road: usize,
    /// The flow group the lane belongs to.
    pub group: LaneGroup,
    /// Index of the lane within its group.
    pub index: usize,
}

/// The attributes of a road.
#[derive(Clone, Copy, Debug)]
pub struct RoadAttributes<'a> {
    /// A short display name, used in configuration errors.
    pub name: &'a str,
    /// Whether the road runs along the x axis.
    pub horizontal: bool,
    /// The perpendicular offset of the road's first lane.
    pub offset: f64,
    /// The number of entry lanes (flowing Left or Up).
    pub entry_lanes: usize,
    /// The number of exit lanes (flowing Right or Down).
    pub exit_lanes: usize,
}

/// An orthogonal corridor of parallel lanes.
#[derive(Clone, Debug)]
pub struct Road {
    /// The road's display name.
    name: String,
    /// Whether the road runs along the x axis.
    horizontal: bool,
    /// The perpendicular offset of the first lane.
    offset: f64,
    /// The entry lanes, nearest the offset first.
    entry_lanes: Vec<Lane>,
    /// The exit lanes, placed after all entry lanes.
    exit_lanes: Vec<Lane>,
}

/// A single lane of a road.
#[derive(Clone, Debug)]
pub struct Lane {
    /// Index of the lane within its flow group.
    index: usize,
    /// The flow direction of the lane.
    direction: Direction,
    /// The perpendicular offset of the lane.
    offset: f64,
    /// The lane's segments in sweep order, attached by the graph builder.
    segments: Vec<SegmentId>,
}

impl Road {
    /// Creates a new road with its lanes laid out.
    pub fn new(attribs: &RoadAttributes) -> Self {
        let entry_dir = if attribs.horizontal {
            Direction::Left
        } else {
            Direction::Up
        };
        let exit_dir = if attribs.horizontal {
            Direction::Right
        } else {
            Direction::Down
        };

        let lane_offset = |i: usize| attribs.offset + i as f64 * (BLOCK_SIZE + LANE_GAP);

        let entry_lanes = (0..attribs.entry_lanes)
            .map(|i| Lane::new(i, entry_dir, lane_offset(i)))
            .collect();
        let exit_lanes = (0..attribs.exit_lanes)
            .map(|i| Lane::new(i, exit_dir, lane_offset(attribs.entry_lanes + i)))
            .collect();

        Self {
            name: attribs.name.to_owned(),
            horizontal: attribs.horizontal,
            offset: attribs.offset,
            entry_lanes,
            exit_lanes,
        }
    }

    /// Gets the road's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the road runs along the x axis.
    pub fn is_horizontal(&self) -> bool {
        self.horizontal
    }

    /// The perpendicular offset of the road's first lane.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The perpendicular offset just past the road's last lane.
    pub fn span_end(&self) -> f64 {
        match self.lanes().last() {
            Some(lane) => lane.offset + BLOCK_SIZE,
            None => self.offset,
        }
    }

    /// The number of lanes across both flow groups.
    pub fn lane_count(&self) -> usize {
        self.entry_lanes.len() + self.exit_lanes.len()
    }

    /// Iterates over all lanes, entry group first.
    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.entry_lanes.iter().chain(self.exit_lanes.iter())
    }

    /// Gets the lanes of one flow group.
    pub fn group(&self, group: LaneGroup) -> &[Lane] {
        match group {
            LaneGroup::Entry => &self.entry_lanes,
            LaneGroup::Exit => &self.exit_lanes,
        }
    }

    /// Gets the lanes flowing in the given direction, if the road has any.
    pub fn group_for(&self, direction: Direction) -> Option<&[Lane]> {
        match (self.horizontal, direction) {
            (true, Direction::Left) | (false, Direction::Up) => Some(&self.entry_lanes),
            (true, Direction::Right) | (false, Direction::Down) => Some(&self.exit_lanes),
            _ => None,
        }
    }

    /// Gets a lane by group and index.
    pub fn lane(&self, group: LaneGroup, index: usize) -> &Lane {
        &self.group(group)[index]
    }

    pub(crate) fn lane_mut(&mut self, group: LaneGroup, index: usize) -> &mut Lane {
        match group {
            LaneGroup::Entry => &mut self.entry_lanes[index],
            LaneGroup::Exit => &mut self.exit_lanes[index],
        }
    }

    /// Whether the addressed lane is the designated first lane of the road.
    ///
    /// The sweep emits one lane segment per road band, keyed off this lane:
    /// the first entry lane, or the first exit lane when the road has no
    /// entry lanes.
    pub(crate) fn is_first_lane(&self, group: LaneGroup, index: usize) -> bool {
        match group {
            LaneGroup::Entry => index == 0,
            LaneGroup::Exit => index == 0 && self.entry_lanes.is_empty(),
        }
    }

    /// Enumerates the (group, index) slots of all lanes, entry group first.
    pub(crate) fn lane_slots(&self) -> impl Iterator<Item = (LaneGroup, usize)> {
        let entries = (0..self.entry_lanes.len()).map(|i| (LaneGroup::Entry, i));
        let exits = (0..self.exit_lanes.len()).map(|i| (LaneGroup::Exit, i));
        entries.chain(exits)
    }
}

impl Lane {
    fn new(index: usize, direction: Direction, offset: f64) -> Self {
        Self {
            index,
            direction,
            offset,
            segments: vec![],
        }
    }

    /// Index of the lane within its flow group.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The flow direction of the lane.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The perpendicular offset of the lane.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The lane's segments in sweep order.
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Appends a segment during the build sweep, returning its sequence index.
    pub(crate) fn push_segment(&mut self, id: SegmentId) -> usize {
        self.segments.push(id);
        self.segments.len() - 1
    }
}
