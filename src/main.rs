use std::collections::HashMap;

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use traffic_grid::{
    find_path, Goal, RoadAttributes, RoadNetwork, Simulation, VehicleAttributes, VehicleId,
    BLOCK_SIZE, CLOCKWISE,
};

/// Side length of the simulated window, matching the demo road layout.
const WINDOW: f64 = 920.0;

/// Number of vehicles to spawn.
const PLAYERS: usize = 6;

/// Number of ticks to simulate.
const FRAMES: usize = 2_000;

fn main() {
    let network = RoadNetwork::build(&road_layout()).expect("demo road layout is valid");
    let mut sim = Simulation::new(network);
    let mut rng = rand::thread_rng();

    let mut goals: HashMap<VehicleId, Goal> = HashMap::new();
    let mut scores: HashMap<VehicleId, usize> = HashMap::new();
    for i in 0..PLAYERS {
        if let Some((id, goal)) = spawn_vehicle(&mut sim, &mut rng, i) {
            goals.insert(id, goal);
            scores.insert(id, 0);
        }
    }

    for _ in 0..FRAMES {
        let ids: Vec<VehicleId> = sim.iter_vehicles().map(|v| v.id()).collect();
        for &id in &ids {
            if let Some(goal) = goals.get(&id).copied() {
                steer(&mut sim, id, goal);
            }
        }

        // Vehicles that were steered into a dead end are retired.
        for id in sim.step() {
            sim.remove_vehicle(id);
            goals.remove(&id);
        }

        for id in ids {
            let Some(goal) = goals.get(&id).copied() else {
                continue;
            };
            if sim.contains_vehicle(id) && sim.vehicle_reached_goal(id, &goal) {
                *scores.entry(id).or_default() += 1;
                if let Some(next_goal) = random_goal(&sim, &mut rng) {
                    goals.insert(id, next_goal);
                }
            }
        }

        if sim.frame() % 200 == 0 {
            println!(
                "frame {:>5}: {} vehicles, {} goals reached",
                sim.frame(),
                sim.iter_vehicles().count(),
                scores.values().sum::<usize>(),
            );
        }
    }

    println!(
        "done: {} vehicles remaining, {} goals reached",
        sim.iter_vehicles().count(),
        scores.values().sum::<usize>(),
    );
}

/// The demo road layout: a bordered window with two arterials each way.
fn road_layout() -> Vec<RoadAttributes<'static>> {
    let border = WINDOW - BLOCK_SIZE;
    vec![
        RoadAttributes {
            name: "bottom",
            horizontal: true,
            offset: 0.0,
            entry_lanes: 1,
            exit_lanes: 0,
        },
        RoadAttributes {
            name: "top",
            horizontal: true,
            offset: border,
            entry_lanes: 0,
            exit_lanes: 1,
        },
        RoadAttributes {
            name: "left",
            horizontal: false,
            offset: 0.0,
            entry_lanes: 1,
            exit_lanes: 0,
        },
        RoadAttributes {
            name: "right",
            horizontal: false,
            offset: border,
            entry_lanes: 0,
            exit_lanes: 1,
        },
        RoadAttributes {
            name: "r1",
            horizontal: true,
            offset: 150.0,
            entry_lanes: 2,
            exit_lanes: 2,
        },
        RoadAttributes {
            name: "r2",
            horizontal: true,
            offset: 500.0,
            entry_lanes: 2,
            exit_lanes: 2,
        },
        RoadAttributes {
            name: "r3",
            horizontal: false,
            offset: 150.0,
            entry_lanes: 2,
            exit_lanes: 2,
        },
        RoadAttributes {
            name: "r4",
            horizontal: false,
            offset: 500.0,
            entry_lanes: 2,
            exit_lanes: 2,
        },
    ]
}

/// One decision per tick: route at crossings, keep up to cruising speed.
fn steer(sim: &mut Simulation, id: VehicleId, goal: Goal) {
    let vehicle = sim.get_vehicle(id);
    let front = *vehicle.claims().last().expect("window is never empty");
    let speed = vehicle.speed();

    if sim.network().segment(front.segment).is_crossing() {
        if let Ok(path) = find_path(sim.network(), front.segment, goal.segment) {
            if let Some(&next) = path.get(1) {
                let turn = CLOCKWISE
                    .into_iter()
                    .find(|dir| sim.network().segment(front.segment).next_in(*dir) == Some(next));
                if let Some(dir) = turn {
                    if dir != front.direction {
                        let _ = sim.turn_vehicle(id, dir);
                    }
                }
            }
        }
    }

    if speed < 3.0 {
        sim.change_vehicle_speed(id, 1.0);
    }
}

/// Spawns a vehicle on a random free lane segment, with a goal to chase.
fn spawn_vehicle<R: Rng>(
    sim: &mut Simulation,
    rng: &mut R,
    index: usize,
) -> Option<(VehicleId, Goal)> {
    let speed_distr = Normal::<f64>::new(3.0, 1.0).ok()?;

    for _ in 0..32 {
        let (segment, seg_length) = sim
            .network()
            .iter_segments()
            .filter(|seg| seg.is_lane() && seg.vehicles().is_empty())
            .map(|seg| (seg.id(), seg.length()))
            .choose(rng)?;

        let length = rng.gen_range(0.5 * BLOCK_SIZE..0.9 * BLOCK_SIZE);
        let speed = speed_distr.sample(rng).clamp(1.0, 6.0);
        let headroom = seg_length - length - speed;
        if headroom <= 0.0 {
            continue;
        }

        let attributes = VehicleAttributes {
            name: (b'A' + (index % 26) as u8) as char,
            color: [rng.gen(), rng.gen(), rng.gen()],
            length,
            speed,
            max_speed: 6.0,
        };
        let loc = rng.gen_range(0.0..headroom);
        if let Ok(id) = sim.add_vehicle(&attributes, segment, loc) {
            let goal = random_goal(sim, rng)?;
            return Some((id, goal));
        }
    }
    None
}

/// Picks a goal on a random lane segment.
fn random_goal<R: Rng>(sim: &Simulation, rng: &mut R) -> Option<Goal> {
    let (segment, length) = sim
        .network()
        .iter_segments()
        .filter(|seg| seg.is_lane())
        .map(|seg| (seg.id(), seg.length()))
        .choose(rng)?;
    Some(Goal {
        segment,
        loc: rng.gen_range(0.0..length),
    })
}
