//! Shortest-path routing over the segment graph.
//!
//! The router runs a fresh A* search on every invocation; there is no
//! cross-tick caching or incremental replanning. Traversal cost is the
//! accumulated length of the segments left behind, and the heuristic is
//! the Euclidean distance to the goal, which never overestimates the
//! along-network distance on an orthogonal grid.

use std::collections::BinaryHeap;

use arrayvec::ArrayVec;
use log::debug;
use slotmap::SecondaryMap;

use crate::error::Unreachable;
use crate::math::{distance, Point2d};
use crate::network::RoadNetwork;
use crate::segment::SegmentKind;
use crate::SegmentId;

/// A target point on a lane segment.
#[derive(Clone, Copy, Debug)]
pub struct Goal {
    /// The lane segment the goal lies on.
    pub segment: SegmentId,
    /// Unsigned offset of the goal from the segment's low end.
    pub loc: f64,
}

impl Goal {
    /// Resolves the goal to a point in world space.
    pub fn position(&self, network: &RoadNetwork) -> Point2d {
        let segment = network.segment(self.segment);
        match segment.kind() {
            SegmentKind::Lane(seg) => {
                let lane = network.lane(seg.lane());
                let along = seg.span().min + self.loc;
                if lane.direction().is_horizontal() {
                    Point2d::new(along, lane.offset())
                } else {
                    Point2d::new(lane.offset(), along)
                }
            }
            SegmentKind::Crossing(_) => network.segment_entry_point(self.segment),
        }
    }
}

/// An entry of the A* open set.
///
/// Ordered as a min-heap on the f-score, with ties broken by insertion
/// order. A segment may be enqueued again after relaxation improves its
/// score; stale entries are skipped when popped.
struct OpenNode {
    f: f64,
    seq: usize,
    segment: SegmentId,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Computes the shortest route from `start` to `goal`.
///
/// Returns the traversed segments in order, including both endpoints,
/// or [Unreachable] when the goal lies in a part of the graph the start
/// cannot reach.
pub fn find_path(
    network: &RoadNetwork,
    start: SegmentId,
    goal: SegmentId,
) -> Result<Vec<SegmentId>, Unreachable> {
    let goal_point = network.segment_entry_point(goal);

    let mut g_score: SecondaryMap<SegmentId, f64> = SecondaryMap::new();
    let mut f_score: SecondaryMap<SegmentId, f64> = SecondaryMap::new();
    for segment in network.iter_segments() {
        g_score.insert(segment.id(), f64::INFINITY);
        f_score.insert(segment.id(), f64::INFINITY);
    }
    let mut came_from: SecondaryMap<SegmentId, SegmentId> = SecondaryMap::new();

    g_score[start] = 0.0;
    f_score[start] = distance(network.segment_exit_point(start), goal_point);

    let mut seq = 0;
    let mut open = BinaryHeap::new();
    open.push(OpenNode {
        f: f_score[start],
        seq,
        segment: start,
    });

    while let Some(node) = open.pop() {
        if node.segment == goal {
            return Ok(reconstruct_path(&came_from, start, goal));
        }
        if node.f > f_score[node.segment] {
            continue;
        }

        let cost = network.segment(node.segment).length();
        for neighbour in neighbours(network, node.segment) {
            let tentative = g_score[node.segment] + cost;
            if tentative < g_score[neighbour] {
                came_from.insert(neighbour, node.segment);
                g_score[neighbour] = tentative;
                let f = tentative + distance(network.segment_exit_point(neighbour), goal_point);
                f_score[neighbour] = f;
                seq += 1;
                open.push(OpenNode {
                    f,
                    seq,
                    segment: neighbour,
                });
            }
        }
    }

    debug!("open set exhausted before reaching the goal");
    Err(Unreachable)
}

/// The segments reachable in one hop from a graph node.
fn neighbours(network: &RoadNetwork, id: SegmentId) -> ArrayVec<SegmentId, 4> {
    let mut out = ArrayVec::new();
    match network.segment(id).kind() {
        SegmentKind::Lane(seg) => {
            if let Some(next) = seg.next() {
                out.push(next);
            }
        }
        SegmentKind::Crossing(seg) => {
            out.extend(seg.links.iter().copied().flatten());
        }
    }
    out
}

/// Walks the predecessor chain back from the goal.
fn reconstruct_path(
    came_from: &SecondaryMap<SegmentId, SegmentId>,
    start: SegmentId,
    goal: SegmentId,
) -> Vec<SegmentId> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[current];
        path.push(current);
    }
    path.reverse();
    path
}
