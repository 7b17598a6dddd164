//! Vehicle kinematics over the segment graph.
//!
//! A vehicle occupies a window of consecutive segments, ordered rear to
//! front. The window always spans at least the vehicle's braking
//! distance ahead of its current offset, so every segment the vehicle
//! could come to rest on is claimed before it is entered.

use log::{debug, warn};
use smallvec::{smallvec, SmallVec};

use crate::error::{DeadEnd, NoAdjacentLane, NotAtCrossing};
use crate::math::{Point2d, Vector2d};
use crate::network::RoadNetwork;
use crate::road::{Direction, BLOCK_SIZE};
use crate::util::Interval;
use crate::{SegmentId, VehicleId};

/// The fixed margin term of the braking distance.
pub const BRAKING_MARGIN: f64 = 4.0;

/// A claim on one segment of a vehicle's occupancy window.
#[derive(Clone, Copy, Debug)]
pub struct Claim {
    /// The claimed segment.
    pub segment: SegmentId,
    /// The direction of travel within the segment.
    pub direction: Direction,
    /// Set when a turn was requested here and has not yet anchored.
    pub turning: bool,
    /// The claimed extent, in travel-local coordinates of the segment.
    pub span: Interval<f64>,
}

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleAttributes {
    /// A single-letter display name.
    pub name: char,
    /// The vehicle's display colour.
    pub color: [u8; 3],
    /// The vehicle's physical length.
    pub length: f64,
    /// The initial speed, in units per tick.
    pub speed: f64,
    /// The maximum speed, in units per tick.
    pub max_speed: f64,
}

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    id: VehicleId,
    /// A single-letter display name.
    name: char,
    /// The vehicle's display colour.
    color: [u8; 3],
    /// The vehicle's physical length.
    length: f64,
    /// The current speed, in units per tick.
    speed: f64,
    /// The maximum speed, in units per tick.
    max_speed: f64,
    /// The travel direction of the anchoring claim.
    direction: Direction,
    /// Signed offset within the rearmost claimed segment, measured from
    /// its travel anchor. Negative for Left/Down travel.
    loc: f64,
    /// The claimed segments, rear to front.
    window: SmallVec<[Claim; 4]>,
    /// Cached minimum corner of the footprint rectangle.
    pos: Point2d,
    /// Cached extents of the footprint rectangle.
    extent: Vector2d,
}

impl Vehicle {
    /// Creates a vehicle anchored on a lane segment.
    ///
    /// `loc` is the unsigned distance already travelled into the segment.
    /// The caller registers the claim and extends the window to cover the
    /// braking distance.
    pub(crate) fn new(
        id: VehicleId,
        attributes: &VehicleAttributes,
        segment: SegmentId,
        direction: Direction,
        loc: f64,
    ) -> Self {
        let signed = if direction.is_forward() { loc } else { -loc };
        Self {
            id,
            name: attributes.name,
            color: attributes.color,
            length: attributes.length,
            speed: attributes.speed,
            max_speed: attributes.max_speed,
            direction,
            loc: signed,
            window: smallvec![Claim {
                segment,
                direction,
                turning: false,
                span: Interval::new(loc, loc),
            }],
            pos: Point2d::new(0.0, 0.0),
            extent: Vector2d::new(0.0, 0.0),
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's display name.
    pub fn name(&self) -> char {
        self.name
    }

    /// The vehicle's display colour.
    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// The vehicle's physical length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The vehicle's current speed, in units per tick.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The vehicle's maximum speed, in units per tick.
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// The travel direction of the anchoring claim.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The signed offset within the rearmost claimed segment.
    pub fn loc(&self) -> f64 {
        self.loc
    }

    /// The claimed segments, rear to front.
    pub fn claims(&self) -> &[Claim] {
        &self.window
    }

    /// The minimum corner of the vehicle's footprint rectangle.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The extents of the vehicle's footprint rectangle.
    pub fn extent(&self) -> Vector2d {
        self.extent
    }

    /// The vehicle's footprint as intervals on both axes.
    pub fn footprint(&self) -> (Interval<f64>, Interval<f64>) {
        (
            Interval::new(self.pos.x, self.pos.x + self.extent.x),
            Interval::new(self.pos.y, self.pos.y + self.extent.y),
        )
    }

    /// The distance the vehicle must hold claimed ahead of its offset.
    ///
    /// Combines the vehicle's length, a speed-squared stopping term and a
    /// fixed margin.
    pub fn braking_distance(&self) -> f64 {
        self.length + self.speed * self.speed + BRAKING_MARGIN
    }

    /// The summed length of all claimed segments.
    pub fn claimed_length(&self, network: &RoadNetwork) -> f64 {
        self.window
            .iter()
            .map(|claim| network.segment(claim.segment).length())
            .sum()
    }

    /// Advances the vehicle by its speed along the anchoring segment.
    ///
    /// Claims segments ahead until the window covers the braking
    /// distance, then releases fully passed segments at the rear. A
    /// pending turn anchors here: when the turned crossing becomes the
    /// rearmost claim, the along-segment offset restarts at zero.
    pub fn advance(&mut self, network: &mut RoadNetwork) -> Result<(), DeadEnd> {
        let dir = self.window[0].direction;
        self.loc += if dir.is_forward() {
            self.speed
        } else {
            -self.speed
        };

        self.claim_ahead(network)?;
        self.release_rear(network);
        self.update_claim_spans(network);
        self.update_coords(network);
        Ok(())
    }

    /// Requests a turn at the crossing under the vehicle's front.
    ///
    /// Records the new direction on the frontmost claim; it takes effect
    /// once that claim anchors the vehicle. When the crossing is already
    /// the anchor, the along-segment offset restarts immediately.
    pub fn turn(
        &mut self,
        network: &RoadNetwork,
        new_direction: Direction,
    ) -> Result<(), NotAtCrossing> {
        let front = self.window.len() - 1;
        if !network.segment(self.window[front].segment).is_crossing() {
            return Err(NotAtCrossing);
        }

        self.window[front].direction = new_direction;
        if self.window.len() == 1 {
            self.loc = 0.0;
            self.direction = new_direction;
            self.update_coords(network);
        } else {
            self.window[front].turning = true;
        }
        Ok(())
    }

    /// Moves the vehicle onto the parallel lane `diff` lanes over.
    ///
    /// Legal only while the window holds a single lane-segment claim; the
    /// replacement segment sits at the same sequence index of the target
    /// lane, so the along-segment offset carries over unchanged.
    pub fn change_lane(
        &mut self,
        network: &mut RoadNetwork,
        diff: i32,
    ) -> Result<(), NoAdjacentLane> {
        if self.window.len() != 1 {
            return Err(NoAdjacentLane);
        }
        let claim = self.window[0];
        let target = network.adjacent_lane_segment(claim.segment, claim.direction, diff)?;

        network.segment_mut(claim.segment).remove_vehicle(self.id);
        network.segment_mut(target).insert_vehicle(self.id);
        self.window[0].segment = target;
        self.update_coords(network);
        Ok(())
    }

    /// Adjusts the vehicle's speed, saturating at zero and at `max_speed`.
    pub fn change_speed(&mut self, delta: f64) {
        self.speed = (self.speed + delta).clamp(0.0, self.max_speed);
    }

    /// Gets the segment ahead of the frontmost claim, without mutating.
    ///
    /// Passing a direction overrides the claim's own travel direction,
    /// which lets planning code probe a turn before committing to it.
    pub fn next_segment(
        &self,
        network: &RoadNetwork,
        direction: Option<Direction>,
    ) -> Option<SegmentId> {
        let front = self.window[self.window.len() - 1];
        let dir = direction.unwrap_or(front.direction);
        network.segment(front.segment).next_in(dir)
    }

    /// Looks up the lane-change target without mutating, mirroring
    /// [Vehicle::change_lane]'s addressing.
    pub fn adjacent_lane_segment(
        &self,
        network: &RoadNetwork,
        diff: i32,
    ) -> Result<SegmentId, NoAdjacentLane> {
        let claim = self.window[0];
        network.adjacent_lane_segment(claim.segment, claim.direction, diff)
    }

    /// Extends the window until it covers the braking distance.
    pub(crate) fn claim_ahead(&mut self, network: &mut RoadNetwork) -> Result<(), DeadEnd> {
        loop {
            let total = self.claimed_length(network);
            if self.loc.abs() + self.braking_distance() <= total {
                return Ok(());
            }

            let front = self.window[self.window.len() - 1];
            let next = match network.segment(front.segment).next_in(front.direction) {
                Some(next) => next,
                None => {
                    warn!("vehicle {} ran out of road ahead", self.name);
                    return Err(DeadEnd);
                }
            };

            network.segment_mut(next).insert_vehicle(self.id);
            self.window.push(Claim {
                segment: next,
                direction: front.direction,
                turning: false,
                span: Interval::new(0.0, network.segment(next).length()),
            });
            debug!("vehicle {} claimed segment {:?}", self.name, next);
        }
    }

    /// Releases fully passed segments at the rear of the window.
    fn release_rear(&mut self, network: &mut RoadNetwork) {
        loop {
            let length = network.segment(self.window[0].segment).length();
            if self.loc.abs() <= length {
                break;
            }

            self.loc = self.loc.signum() * (self.loc.abs() - length);
            let released = self.window.remove(0);
            network.segment_mut(released.segment).remove_vehicle(self.id);
            debug!(
                "vehicle {} released segment {:?}",
                self.name, released.segment
            );

            if self.window[0].turning {
                self.loc = 0.0;
                self.window[0].turning = false;
            }
        }
        self.direction = self.window[0].direction;
    }

    /// Recomputes each claim's extent in travel-local coordinates.
    pub(crate) fn update_claim_spans(&mut self, network: &RoadNetwork) {
        let mut begin = self.loc.abs();
        let mut remaining = self.braking_distance();
        for claim in &mut self.window {
            let length = network.segment(claim.segment).length();
            let take = f64::min(length - begin, remaining);
            claim.span = Interval::new(begin, begin + take);
            remaining -= take;
            begin = 0.0;
        }
    }

    /// Recomputes the cached footprint from the anchoring claim.
    pub(crate) fn update_coords(&mut self, network: &RoadNetwork) {
        let anchor = self.window[0];
        let segment = network.segment(anchor.segment);
        let dir = anchor.direction;

        let mut along = network.along_anchor(segment, dir) + self.loc;
        if !dir.is_forward() {
            along -= self.length;
        }
        let cross = network.cross_offset(segment, dir);

        if dir.is_horizontal() {
            self.pos = Point2d::new(along, cross);
            self.extent = Vector2d::new(self.length, BLOCK_SIZE);
        } else {
            self.pos = Point2d::new(cross, along);
            self.extent = Vector2d::new(BLOCK_SIZE, self.length);
        }
    }

    /// Releases every claim held by the vehicle.
    pub(crate) fn release_all(&mut self, network: &mut RoadNetwork) {
        for claim in self.window.drain(..) {
            network.segment_mut(claim.segment).remove_vehicle(self.id);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn attributes() -> VehicleAttributes {
        VehicleAttributes {
            name: 'A',
            color: [255, 0, 0],
            length: 20.0,
            speed: 5.0,
            max_speed: 10.0,
        }
    }

    #[test]
    fn braking_distance_combines_length_speed_and_margin() {
        let vehicle = Vehicle::new(
            VehicleId::default(),
            &attributes(),
            SegmentId::default(),
            Direction::Right,
            0.0,
        );
        assert_eq!(vehicle.braking_distance(), 49.0);
    }

    #[test]
    fn change_speed_saturates_at_both_ends() {
        let mut vehicle = Vehicle::new(
            VehicleId::default(),
            &attributes(),
            SegmentId::default(),
            Direction::Left,
            0.0,
        );

        vehicle.change_speed(100.0);
        assert_eq!(vehicle.speed(), 10.0);
        vehicle.change_speed(-100.0);
        assert_eq!(vehicle.speed(), 0.0);
    }

    #[test]
    fn reverse_travel_stores_a_negative_offset() {
        let vehicle = Vehicle::new(
            VehicleId::default(),
            &attributes(),
            SegmentId::default(),
            Direction::Down,
            12.0,
        );
        assert_eq!(vehicle.loc(), -12.0);
    }
}
