//! The segment graph and its builder.
//!
//! [RoadNetwork::build] sweeps a road configuration once and produces an
//! immutable graph of lane segments and crossing cells. After a
//! successful build only the per-segment occupant sets change; the
//! topology is never mutated again.

use itertools::Itertools;
use log::debug;

use crate::error::{ConfigurationError, NoAdjacentLane};
use crate::math::Point2d;
use crate::road::{Direction, Lane, LaneGroup, LaneRef, Road, RoadAttributes, BLOCK_SIZE};
use crate::segment::{Segment, SegmentKind};
use crate::util::Interval;
use crate::{SegmentId, SegmentSet};

/// The segment graph built from a set of roads.
pub struct RoadNetwork {
    /// The roads, sorted by perpendicular offset.
    pub(crate) roads: Vec<Road>,
    /// The flat segment registry.
    pub(crate) segments: SegmentSet,
}

impl RoadNetwork {
    /// Builds the segment graph for a road configuration.
    ///
    /// Sweeps horizontal roads in increasing offset and, per horizontal
    /// road, vertical roads in increasing offset, maintaining a trailing
    /// cursor per orientation. Every (horizontal lane, vertical lane)
    /// pair of a road pair yields exactly one crossing cell; the stretch
    /// between the previous intersection band and the next road yields
    /// one lane segment per lane of the crossed road.
    pub fn build(attributes: &[RoadAttributes]) -> Result<Self, ConfigurationError> {
        let mut roads: Vec<Road> = attributes.iter().map(Road::new).collect();
        for road in &roads {
            if road.lane_count() == 0 {
                return Err(ConfigurationError::EmptyRoad {
                    road: road.name().to_owned(),
                });
            }
        }
        roads.sort_by(|a, b| a.offset().total_cmp(&b.offset()));

        let horiz: Vec<usize> = index_of(&roads, true);
        let vert: Vec<usize> = index_of(&roads, false);

        let mut segments = SegmentSet::with_key();

        let mut last_h = 0.0_f64;
        let mut prev_h: Option<usize> = None;
        for &h in &horiz {
            if last_h > roads[h].offset() {
                return Err(overlap_error(&roads, h, prev_h));
            }

            let mut last_v = 0.0_f64;
            let mut prev_v: Option<usize> = None;
            for &v in &vert {
                if last_v > roads[v].offset() {
                    return Err(overlap_error(&roads, v, prev_v));
                }

                sweep_road_pair(&mut roads, &mut segments, h, v, last_h, last_v);

                last_v = roads[v].span_end();
                prev_v = Some(v);
            }

            last_h = roads[h].span_end();
            prev_h = Some(h);
        }

        let mut network = Self { roads, segments };
        network.link_segments();

        debug!(
            "built segment graph: {} segments across {} roads",
            network.segments.len(),
            network.roads.len()
        );
        Ok(network)
    }

    /// Links consecutive segments per lane.
    ///
    /// Forward-sense lanes link segment i to i+1, reverse-sense lanes i
    /// to i-1. A crossing additionally receives a back-link opposite to
    /// the flow, so that a vehicle leaving the cell against the lane's
    /// sense still finds the segment behind it.
    fn link_segments(&mut self) {
        for road in 0..self.roads.len() {
            let slots: Vec<(LaneGroup, usize)> = self.roads[road].lane_slots().collect();
            for (group, index) in slots {
                let lane = self.roads[road].lane(group, index);
                let direction = lane.direction();
                let mut ids = lane.segments().to_vec();
                if !direction.is_forward() {
                    ids.reverse();
                }

                for (a, b) in ids.into_iter().tuple_windows() {
                    match &mut self.segments[a].kind {
                        SegmentKind::Lane(seg) => seg.next = Some(b),
                        SegmentKind::Crossing(seg) => seg.links[direction.index()] = Some(b),
                    }
                    if let SegmentKind::Crossing(seg) = &mut self.segments[b].kind {
                        seg.links[direction.opposite().index()] = Some(a);
                    }
                }
            }
        }
    }

    /// The roads of the network, sorted by perpendicular offset.
    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    /// Gets a road by index.
    pub fn road(&self, index: usize) -> &Road {
        &self.roads[index]
    }

    /// Resolves a lane reference.
    pub fn lane(&self, lane: LaneRef) -> &Lane {
        self.roads[lane.road].lane(lane.group, lane.index)
    }

    /// Gets a reference to the segment with the given ID.
    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id]
    }

    /// Returns an iterator over all the segments in the network.
    pub fn iter_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// The number of segments in the network.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The extent of a segment along the given travel axis.
    pub(crate) fn axis_span(&self, segment: &Segment, direction: Direction) -> Interval<f64> {
        match segment.kind() {
            SegmentKind::Lane(seg) => seg.span(),
            SegmentKind::Crossing(seg) => {
                let lane = if direction.is_horizontal() {
                    seg.vert_lane()
                } else {
                    seg.horiz_lane()
                };
                let start = self.lane(lane).offset();
                Interval::new(start, start + BLOCK_SIZE)
            }
        }
    }

    /// The offset at which travel through a segment begins.
    ///
    /// Forward travel anchors at the low end of the axis span, reverse
    /// travel at the high end; a vehicle's signed along-segment offset is
    /// measured from this point.
    pub(crate) fn along_anchor(&self, segment: &Segment, direction: Direction) -> f64 {
        let span = self.axis_span(segment, direction);
        if direction.is_forward() {
            span.min
        } else {
            span.max
        }
    }

    /// The perpendicular offset of the lane traversed in the given direction.
    pub(crate) fn cross_offset(&self, segment: &Segment, direction: Direction) -> f64 {
        self.lane(segment.lane_for(direction)).offset()
    }

    /// The representative point at which a route enters a segment.
    ///
    /// For a lane segment this is its near end in the flow direction of
    /// its lane; for a crossing it is the cell's geometric centre.
    pub fn segment_entry_point(&self, id: SegmentId) -> Point2d {
        let segment = &self.segments[id];
        match segment.kind() {
            SegmentKind::Lane(seg) => {
                let lane = self.lane(seg.lane());
                let along = if lane.direction().is_forward() {
                    seg.span().min
                } else {
                    seg.span().max
                };
                axis_point(lane.direction().is_horizontal(), along, lane.offset())
            }
            SegmentKind::Crossing(_) => self.crossing_centre(id),
        }
    }

    /// The representative point at which a route leaves a segment.
    ///
    /// For a lane segment this is its far end in the flow direction of
    /// its lane; for a crossing it is the cell's geometric centre.
    pub fn segment_exit_point(&self, id: SegmentId) -> Point2d {
        let segment = &self.segments[id];
        match segment.kind() {
            SegmentKind::Lane(seg) => {
                let lane = self.lane(seg.lane());
                let along = if lane.direction().is_forward() {
                    seg.span().max
                } else {
                    seg.span().min
                };
                axis_point(lane.direction().is_horizontal(), along, lane.offset())
            }
            SegmentKind::Crossing(_) => self.crossing_centre(id),
        }
    }

    /// The geometric centre of a crossing cell.
    fn crossing_centre(&self, id: SegmentId) -> Point2d {
        let seg = self.segments[id].as_crossing().expect("not a crossing");
        Point2d::new(
            self.lane(seg.vert_lane()).offset() + 0.5 * BLOCK_SIZE,
            self.lane(seg.horiz_lane()).offset() + 0.5 * BLOCK_SIZE,
        )
    }

    /// Looks up the segment `diff` parallel lanes over from a lane segment.
    ///
    /// The lookup addresses the lane group flowing in `direction` at the
    /// same sequence index; `diff` is flipped for reverse-sense travel so
    /// that a positive value always means the same side of the road
    /// relative to the driver.
    pub fn adjacent_lane_segment(
        &self,
        id: SegmentId,
        direction: Direction,
        diff: i32,
    ) -> Result<SegmentId, NoAdjacentLane> {
        let seg = self.segments[id].as_lane().ok_or(NoAdjacentLane)?;
        let road = &self.roads[seg.lane().road];
        let lanes = road.group_for(direction).ok_or(NoAdjacentLane)?;

        let step = if direction.is_forward() { diff } else { -diff };
        let index = seg.lane().index as i64 + step as i64;
        let lane = usize::try_from(index)
            .ok()
            .and_then(|i| lanes.get(i))
            .ok_or(NoAdjacentLane)?;

        lane.segments()
            .get(seg.index())
            .copied()
            .ok_or(NoAdjacentLane)
    }
}

/// Emits the segments contributed by one (horizontal road, vertical road) pair.
fn sweep_road_pair(
    roads: &mut [Road],
    segments: &mut SegmentSet,
    h: usize,
    v: usize,
    last_h: f64,
    last_v: f64,
) {
    let h_offset = roads[h].offset();
    let v_offset = roads[v].offset();
    let h_slots: Vec<(LaneGroup, usize, bool)> = roads[h]
        .lane_slots()
        .map(|(g, i)| (g, i, roads[h].is_first_lane(g, i)))
        .collect();
    let v_slots: Vec<(LaneGroup, usize, bool)> = roads[v]
        .lane_slots()
        .map(|(g, i)| (g, i, roads[v].is_first_lane(g, i)))
        .collect();

    for &(hg, hi, h_first) in &h_slots {
        let h_lane = LaneRef {
            road: h,
            group: hg,
            index: hi,
        };
        for &(vg, vi, v_first) in &v_slots {
            let v_lane = LaneRef {
                road: v,
                group: vg,
                index: vi,
            };

            // One lane segment per intersection band, emitted when the
            // crossed road's designated first lane comes up in the sweep.
            if v_offset > last_v && v_first {
                let span = Interval::new(last_v, v_offset);
                let id = segments.insert_with_key(|id| Segment::new_lane(id, h_lane, span));
                let index = roads[h].lane_mut(hg, hi).push_segment(id);
                if let SegmentKind::Lane(seg) = &mut segments[id].kind {
                    seg.index = index;
                }
            }
            if h_offset > last_h && h_first {
                let span = Interval::new(last_h, h_offset);
                let id = segments.insert_with_key(|id| Segment::new_lane(id, v_lane, span));
                let index = roads[v].lane_mut(vg, vi).push_segment(id);
                if let SegmentKind::Lane(seg) = &mut segments[id].kind {
                    seg.index = index;
                }
            }

            // Every lane pair crosses in exactly one cell.
            let id = segments.insert_with_key(|id| Segment::new_crossing(id, h_lane, v_lane));
            let horiz_index = roads[h].lane_mut(hg, hi).push_segment(id);
            let vert_index = roads[v].lane_mut(vg, vi).push_segment(id);
            if let SegmentKind::Crossing(seg) = &mut segments[id].kind {
                seg.horiz_index = horiz_index;
                seg.vert_index = vert_index;
            }
        }
    }
}

fn index_of(roads: &[Road], horizontal: bool) -> Vec<usize> {
    roads
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_horizontal() == horizontal)
        .map(|(i, _)| i)
        .collect()
}

fn overlap_error(roads: &[Road], road: usize, previous: Option<usize>) -> ConfigurationError {
    ConfigurationError::OverlappingRoads {
        road: roads[road].name().to_owned(),
        previous: previous
            .map(|p| roads[p].name().to_owned())
            .unwrap_or_default(),
    }
}

fn axis_point(horizontal: bool, along: f64, cross: f64) -> Point2d {
    if horizontal {
        Point2d::new(along, cross)
    } else {
        Point2d::new(cross, along)
    }
}
