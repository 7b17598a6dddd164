//! Tests for the multi-segment vehicle occupancy model.

use assert_approx_eq::assert_approx_eq;
use traffic_grid::{
    Direction, NoAdjacentLane, NotAtCrossing, RoadAttributes, RoadNetwork, SegmentId, Simulation,
    VehicleAttributes,
};

fn road(name: &str, horizontal: bool, offset: f64, entry: usize, exit: usize) -> RoadAttributes {
    RoadAttributes {
        name,
        horizontal,
        offset,
        entry_lanes: entry,
        exit_lanes: exit,
    }
}

fn attributes(name: char, length: f64, speed: f64) -> VehicleAttributes {
    VehicleAttributes {
        name,
        color: [200, 40, 40],
        length,
        speed,
        max_speed: 39.0,
    }
}

/// The segments of the first lane flowing in the given direction.
fn lane_segments(sim: &Simulation, direction: Direction) -> Vec<SegmentId> {
    sim.network()
        .roads()
        .iter()
        .flat_map(|r| r.lanes())
        .find(|l| l.direction() == direction)
        .expect("no lane in that direction")
        .segments()
        .to_vec()
}

/// An eastbound lane whose first stretch is 100 units long.
fn corridor() -> Simulation {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("cross", false, 100.0, 0, 1),
        road("far", false, 300.0, 0, 1),
    ])
    .unwrap();
    Simulation::new(network)
}

/// A tick moves the offset by the speed; no new claims are needed while
/// the braking distance still fits the anchoring segment.
#[test]
fn a_tick_advances_the_offset_without_new_claims() {
    let mut sim = corridor();
    let start = lane_segments(&sim, Direction::Right)[0];
    let id = sim
        .add_vehicle(&attributes('A', 20.0, 5.0), start, 0.0)
        .unwrap();

    // braking_distance = 20 + 5^2 + 4 = 49, within the 100-long segment.
    assert_eq!(sim.get_vehicle(id).braking_distance(), 49.0);
    assert_eq!(sim.get_vehicle(id).claims().len(), 1);

    let before = sim.get_vehicle(id).position();
    sim.advance_vehicle(id).unwrap();

    let vehicle = sim.get_vehicle(id);
    assert_approx_eq!(vehicle.loc(), 5.0);
    assert_eq!(vehicle.claims().len(), 1);
    assert_approx_eq!(vehicle.position().x, before.x + 5.0);
    assert_approx_eq!(vehicle.position().y, before.y);
}

/// The occupancy window covers the braking distance after every tick.
#[test]
fn the_window_always_covers_the_braking_distance() {
    let mut sim = corridor();
    let start = lane_segments(&sim, Direction::Right)[0];
    let id = sim
        .add_vehicle(&attributes('B', 20.0, 5.0), start, 60.0)
        .unwrap();

    // 60 + 49 spills past the first stretch, so the cell is claimed at spawn.
    assert_eq!(sim.get_vehicle(id).claims().len(), 2);

    for _ in 0..200 {
        if sim.advance_vehicle(id).is_err() {
            break;
        }
        let vehicle = sim.get_vehicle(id);
        let claimed = vehicle.claimed_length(sim.network());
        assert!(claimed + 1e-9 >= vehicle.loc().abs() + vehicle.braking_distance());
    }
}

/// Advancing at zero speed changes nothing, however often it runs.
#[test]
fn zero_speed_ticks_are_idempotent() {
    let mut sim = corridor();
    let start = lane_segments(&sim, Direction::Right)[0];
    let id = sim
        .add_vehicle(&attributes('C', 20.0, 0.0), start, 30.0)
        .unwrap();

    let before_pos = sim.get_vehicle(id).position();
    let before_claims: Vec<SegmentId> = sim
        .get_vehicle(id)
        .claims()
        .iter()
        .map(|c| c.segment)
        .collect();

    for _ in 0..5 {
        sim.advance_vehicle(id).unwrap();
        let vehicle = sim.get_vehicle(id);
        assert_eq!(vehicle.loc(), 30.0);
        assert_eq!(vehicle.position(), before_pos);
        let claims: Vec<SegmentId> = vehicle.claims().iter().map(|c| c.segment).collect();
        assert_eq!(claims, before_claims);
    }
}

/// Claims register in occupant sets as the window slides forward.
#[test]
fn claims_register_and_release_in_occupant_sets() {
    let mut sim = corridor();
    let segments = lane_segments(&sim, Direction::Right);
    let id = sim
        .add_vehicle(&attributes('D', 10.0, 9.0), segments[0], 0.0)
        .unwrap();

    assert!(sim.network().segment(segments[0]).vehicles().contains(&id));

    // 12 ticks of 9 carry the anchor 8 units into the crossing cell.
    for _ in 0..12 {
        sim.advance_vehicle(id).unwrap();
    }

    let vehicle = sim.get_vehicle(id);
    assert_eq!(vehicle.claims()[0].segment, segments[1]);
    assert_approx_eq!(vehicle.loc(), 8.0);
    assert!(sim.network().segment(segments[0]).vehicles().is_empty());
    assert!(sim.network().segment(segments[1]).vehicles().contains(&id));
    assert!(sim.network().segment(segments[2]).vehicles().contains(&id));
}

/// The look-ahead claim fails once the lane runs out of segments.
#[test]
fn running_off_the_network_is_a_dead_end() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("cross", false, 100.0, 0, 1),
    ])
    .unwrap();
    let mut sim = Simulation::new(network);
    let start = lane_segments(&sim, Direction::Right)[0];

    // The lane holds 140 units in total; braking distance is 124.
    let id = sim
        .add_vehicle(&attributes('E', 20.0, 10.0), start, 0.0)
        .unwrap();
    assert_eq!(sim.get_vehicle(id).claims().len(), 2);

    assert!(sim.advance_vehicle(id).is_ok());
    assert!(sim.advance_vehicle(id).is_err());

    // The caller decides the vehicle's fate; removal releases every claim.
    sim.remove_vehicle(id);
    assert!(sim
        .network()
        .iter_segments()
        .all(|s| s.vehicles().is_empty()));
}

/// A turn recorded at a crossing anchors once the cell becomes rearmost:
/// the along-segment offset restarts and the new direction takes over.
#[test]
fn a_pending_turn_anchors_at_the_crossing() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("north", true, 500.0, 0, 1),
        road("vert", false, 100.0, 1, 0),
    ])
    .unwrap();
    let mut sim = Simulation::new(network);
    let start = lane_segments(&sim, Direction::Right)[0];
    let id = sim
        .add_vehicle(&attributes('F', 20.0, 5.0), start, 40.0)
        .unwrap();

    // The front is still on the lane stretch: turning is rejected.
    assert_eq!(sim.turn_vehicle(id, Direction::Up), Err(NotAtCrossing));

    // Advance until the cell is claimed, then record the turn.
    for _ in 0..3 {
        sim.advance_vehicle(id).unwrap();
    }
    assert!(sim
        .network()
        .segment(sim.get_vehicle(id).claims().last().unwrap().segment)
        .is_crossing());
    sim.turn_vehicle(id, Direction::Up).unwrap();

    for _ in 0..10 {
        sim.advance_vehicle(id).unwrap();
    }

    let vehicle = sim.get_vehicle(id);
    assert_eq!(vehicle.direction(), Direction::Up);
    assert_approx_eq!(vehicle.loc(), 0.0);
    assert!(sim
        .network()
        .segment(vehicle.claims()[0].segment)
        .is_crossing());
    assert_approx_eq!(vehicle.position().x, 100.0);
    assert_approx_eq!(vehicle.position().y, 200.0);

    // The next tick travels up the vertical lane.
    sim.advance_vehicle(id).unwrap();
    assert_approx_eq!(sim.get_vehicle(id).position().y, 205.0);
}

/// Lane changes swap to the same sequence index of the parallel lane,
/// and fail from the outermost lane.
#[test]
fn lane_changes_address_the_same_sequence_index() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 2),
        road("cross", false, 300.0, 0, 1),
    ])
    .unwrap();
    let mut sim = Simulation::new(network);
    let inner = lane_segments(&sim, Direction::Right);
    let id = sim
        .add_vehicle(&attributes('G', 20.0, 2.0), inner[0], 10.0)
        .unwrap();

    sim.change_vehicle_lane(id, 1).unwrap();
    let vehicle = sim.get_vehicle(id);
    assert_approx_eq!(vehicle.loc(), 10.0);
    assert_approx_eq!(vehicle.position().y, 242.0);
    assert!(sim.network().segment(inner[0]).vehicles().is_empty());

    // Already on the outermost lane.
    assert_eq!(sim.change_vehicle_lane(id, 1), Err(NoAdjacentLane));

    sim.change_vehicle_lane(id, -1).unwrap();
    assert_eq!(sim.get_vehicle(id).claims()[0].segment, inner[0]);
    assert_approx_eq!(sim.get_vehicle(id).position().y, 200.0);
}

/// For reverse-flow lanes a positive diff still means the same side
/// relative to the driver, so the group index moves the other way.
#[test]
fn lane_change_diff_flips_for_reverse_flow() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 2, 0),
        road("cross", false, 300.0, 0, 1),
    ])
    .unwrap();
    let mut sim = Simulation::new(network);
    let outer = lane_segments(&sim, Direction::Left);
    let id = sim
        .add_vehicle(&attributes('H', 20.0, 2.0), outer[0], 10.0)
        .unwrap();

    // Index 0 is the innermost entry lane; +1 would leave the group.
    assert_eq!(sim.change_vehicle_lane(id, 1), Err(NoAdjacentLane));

    sim.change_vehicle_lane(id, -1).unwrap();
    assert_approx_eq!(sim.get_vehicle(id).position().y, 242.0);
}

/// A window spanning more than one segment cannot change lanes.
#[test]
fn lane_changes_require_a_single_claim() {
    let mut sim = corridor();
    let start = lane_segments(&sim, Direction::Right)[0];
    let id = sim
        .add_vehicle(&attributes('I', 20.0, 5.0), start, 60.0)
        .unwrap();

    assert!(sim.get_vehicle(id).claims().len() > 1);
    assert_eq!(sim.change_vehicle_lane(id, 1), Err(NoAdjacentLane));
}

/// The planning lookups mirror the mutating operations without touching state.
#[test]
fn planning_lookups_do_not_mutate() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 2),
        road("cross", false, 300.0, 0, 1),
    ])
    .unwrap();
    let mut sim = Simulation::new(network);
    let inner = lane_segments(&sim, Direction::Right);
    let id = sim
        .add_vehicle(&attributes('J', 20.0, 2.0), inner[0], 10.0)
        .unwrap();

    let vehicle = sim.get_vehicle(id);
    let target = vehicle.adjacent_lane_segment(sim.network(), 1).unwrap();
    assert_ne!(target, inner[0]);
    assert_eq!(vehicle.claims()[0].segment, inner[0]);

    let ahead = vehicle.next_segment(sim.network(), None).unwrap();
    assert_eq!(ahead, inner[1]);
}
