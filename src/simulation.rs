//! A tick-based simulation over the segment graph.
//!
//! Vehicles take one decision per tick and are processed sequentially;
//! the segment graph itself is read-only after construction and only
//! the per-segment occupant sets change.

#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::debug_rect;
use crate::error::{DeadEnd, NoAdjacentLane, NotAtCrossing};
use crate::network::RoadNetwork;
use crate::pathfinding::Goal;
use crate::road::{Direction, BLOCK_SIZE};
use crate::util::Interval;
use crate::vehicle::{Vehicle, VehicleAttributes};
use crate::{SegmentId, VehicleId, VehicleSet};
use log::warn;

/// A grid traffic simulation.
pub struct Simulation {
    /// The segment graph.
    network: RoadNetwork,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The current tick of simulation.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a simulation over a built road network.
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            network,
            vehicles: VehicleSet::with_key(),
            frame: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Gets the segment graph.
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Places a vehicle on a lane segment.
    ///
    /// The vehicle registers in the segment's occupant set and
    /// immediately extends its window to cover the braking distance.
    /// Fails with [DeadEnd] when the network ends within that distance.
    ///
    /// # Panics
    /// Panics if `segment` is not a lane segment, or `loc` lies outside it.
    pub fn add_vehicle(
        &mut self,
        attributes: &VehicleAttributes,
        segment: SegmentId,
        loc: f64,
    ) -> Result<VehicleId, DeadEnd> {
        let lane_seg = self
            .network
            .segment(segment)
            .as_lane()
            .expect("vehicle must be placed on a lane segment");
        assert!(
            loc >= 0.0 && loc <= lane_seg.span().length(),
            "spawn offset lies outside the segment"
        );
        let direction = self.network.lane(lane_seg.lane()).direction();

        let id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, attributes, segment, direction, loc));
        self.network.segment_mut(segment).insert_vehicle(id);

        if let Err(err) = self.vehicles[id].claim_ahead(&mut self.network) {
            if let Some(mut vehicle) = self.vehicles.remove(id) {
                vehicle.release_all(&mut self.network);
            }
            return Err(err);
        }
        self.vehicles[id].update_claim_spans(&self.network);
        self.vehicles[id].update_coords(&self.network);
        Ok(id)
    }

    /// Removes a vehicle, releasing every claim in its window.
    pub fn remove_vehicle(&mut self, id: VehicleId) {
        if let Some(mut vehicle) = self.vehicles.remove(id) {
            vehicle.release_all(&mut self.network);
        }
    }

    /// Advances a single vehicle by one tick.
    pub fn advance_vehicle(&mut self, id: VehicleId) -> Result<(), DeadEnd> {
        self.vehicles[id].advance(&mut self.network)
    }

    /// Requests a turn at the crossing under a vehicle's front.
    pub fn turn_vehicle(&mut self, id: VehicleId, direction: Direction) -> Result<(), NotAtCrossing> {
        self.vehicles[id].turn(&self.network, direction)
    }

    /// Moves a vehicle onto the parallel lane `diff` lanes over.
    pub fn change_vehicle_lane(&mut self, id: VehicleId, diff: i32) -> Result<(), NoAdjacentLane> {
        self.vehicles[id].change_lane(&mut self.network, diff)
    }

    /// Adjusts a vehicle's speed, saturating into `[0, max_speed]`.
    pub fn change_vehicle_speed(&mut self, id: VehicleId, delta: f64) {
        self.vehicles[id].change_speed(delta);
    }

    /// Advances every vehicle by one tick, sequentially.
    ///
    /// Returns the vehicles whose look-ahead claim found no segment to
    /// continue onto; deciding their fate is up to the caller.
    pub fn step(&mut self) -> Vec<VehicleId> {
        let ids: Vec<VehicleId> = self.vehicles.keys().collect();
        let mut dead_ends = vec![];
        for id in ids {
            match self.vehicles[id].advance(&mut self.network) {
                Ok(()) => {
                    let vehicle = &self.vehicles[id];
                    debug_rect("vehicle", vehicle.position(), vehicle.extent());
                }
                Err(DeadEnd) => {
                    warn!("vehicle {} hit a dead end", self.vehicles[id].name());
                    dead_ends.push(id);
                }
            }
        }
        self.frame += 1;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }

        dead_ends
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id]
    }

    /// Whether a vehicle with the given ID is still being simulated.
    pub fn contains_vehicle(&self, id: VehicleId) -> bool {
        self.vehicles.contains_key(id)
    }

    /// Whether a vehicle's footprint overlaps the cell around a goal point.
    pub fn vehicle_reached_goal(&self, id: VehicleId, goal: &Goal) -> bool {
        let target = goal.position(&self.network);
        let cell_x = Interval::new(target.x, target.x + BLOCK_SIZE);
        let cell_y = Interval::new(target.y, target.y + BLOCK_SIZE);
        let (x, y) = self.vehicles[id].footprint();
        x.overlaps(&cell_x) && y.overlaps(&cell_y)
    }

    /// Gets the debugging information for the previously simulated frame.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}
