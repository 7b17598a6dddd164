//! Tests for the A* router.

use traffic_grid::{find_path, Direction, RoadAttributes, RoadNetwork, SegmentId, Unreachable};

fn road(name: &str, horizontal: bool, offset: f64, entry: usize, exit: usize) -> RoadAttributes {
    RoadAttributes {
        name,
        horizontal,
        offset,
        entry_lanes: entry,
        exit_lanes: exit,
    }
}

/// The segments of the first lane flowing in the given direction.
fn lane_segments(network: &RoadNetwork, direction: Direction) -> Vec<SegmentId> {
    network
        .roads()
        .iter()
        .flat_map(|r| r.lanes())
        .find(|l| l.direction() == direction)
        .expect("no lane in that direction")
        .segments()
        .to_vec()
}

/// The accumulated traversal cost of a path, which counts every segment
/// left behind but not the goal itself.
fn path_cost(network: &RoadNetwork, path: &[SegmentId]) -> f64 {
    path[..path.len() - 1]
        .iter()
        .map(|id| network.segment(*id).length())
        .sum()
}

/// On a straight lane the route follows the forward links, and its cost
/// is the sum of the traversed segment lengths.
#[test]
fn a_straight_lane_routes_directly() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("v1", false, 100.0, 0, 1),
        road("v2", false, 300.0, 0, 1),
    ])
    .unwrap();
    let lane = lane_segments(&network, Direction::Right);

    let path = find_path(&network, lane[0], lane[2]).unwrap();
    assert_eq!(path, vec![lane[0], lane[1], lane[2]]);
    assert_eq!(path_cost(&network, &path), 140.0);
}

/// A search that starts on the goal segment is already done.
#[test]
fn the_trivial_route_is_a_single_segment() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("v1", false, 100.0, 0, 1),
    ])
    .unwrap();
    let lane = lane_segments(&network, Direction::Right);

    assert_eq!(find_path(&network, lane[0], lane[0]).unwrap(), vec![lane[0]]);
}

/// Segments behind the start along a one-way lane are unreachable.
#[test]
fn segments_behind_the_start_are_unreachable() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("v1", false, 100.0, 0, 1),
        road("v2", false, 300.0, 0, 1),
    ])
    .unwrap();
    let lane = lane_segments(&network, Direction::Right);

    assert_eq!(find_path(&network, lane[2], lane[0]), Err(Unreachable));
}

/// Routes cross onto the perpendicular lane through a cell's
/// per-direction link.
#[test]
fn routes_turn_through_crossings() {
    let network = RoadNetwork::build(&[
        road("main", true, 200.0, 0, 1),
        road("north", true, 500.0, 0, 1),
        road("vert", false, 100.0, 1, 0),
    ])
    .unwrap();
    let main = lane_segments(&network, Direction::Right);
    let up = lane_segments(&network, Direction::Up);

    // main: [arm, cell]; up: [arm, cell(main), arm, cell(north)].
    let path = find_path(&network, main[0], up[2]).unwrap();
    assert_eq!(path, vec![main[0], main[1], up[2]]);
    assert_eq!(path_cost(&network, &path), 140.0);
}

/// The router agrees with an independent shortest-path oracle on a grid
/// where several equal-length detours exist.
#[test]
fn astar_matches_a_dijkstra_oracle() {
    let network = RoadNetwork::build(&[
        road("h1", true, 100.0, 1, 1),
        road("h2", true, 500.0, 1, 1),
        road("v1", false, 100.0, 1, 1),
        road("v2", false, 500.0, 1, 1),
    ])
    .unwrap();

    let start = lane_segments(&network, Direction::Right)[0];
    let goal = *lane_segments(&network, Direction::Up)
        .iter()
        .filter(|id| network.segment(**id).is_lane())
        .last()
        .unwrap();

    let path = find_path(&network, start, goal).unwrap();
    let cost = path_cost(&network, &path);

    let successors = |id: &SegmentId| -> Vec<(SegmentId, u64)> {
        let edge = (network.segment(*id).length() * 1000.0).round() as u64;
        let mut out = vec![];
        for dir in traffic_grid::CLOCKWISE {
            if let Some(next) = network.segment(*id).next_in(dir) {
                if !out.iter().any(|(seen, _)| *seen == next) {
                    out.push((next, edge));
                }
            }
        }
        out
    };
    let (_, oracle_cost) =
        pathfinding::directed::dijkstra::dijkstra(&start, successors, |id| *id == goal)
            .expect("oracle found no route");

    assert_eq!((cost * 1000.0).round() as u64, oracle_cost);
}
