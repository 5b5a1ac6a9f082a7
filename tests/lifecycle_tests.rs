//! Car behavior and spawn/despawn lifecycle tests

use std::collections::{BTreeMap, BTreeSet};

use grid_traffic::simulation::{
    spawn_car, CarId, Grid, LightColor, Occupant, Position, SimConfig, SimId, SimWorld, Step,
    SpotPool, TrafficView, WorldLayout,
};

/// Two spots joined by a two-cell eastbound lane, middle cell a building above
fn detour_layout() -> WorldLayout {
    let mut layout = WorldLayout::new(3, 3);
    layout.read_matrix("-,-,-\n-,%,-\n1,-,2");
    layout.read_matrix("-,-,-\n-,-,-\nE,E,-");
    layout.read_flow("-,-,-\n-,-,-\nE,E,-");
    layout
}

/// Eastbound lane with a light between the two spots
fn light_layout(initial: &str) -> WorldLayout {
    let mut layout = WorldLayout::new(3, 1);
    layout.read_matrix(&format!("1,{},2", initial));
    layout.read_matrix("E,E,E");
    layout.read_flow("E,E,E");
    layout
}

fn single_trip_config(width: i32, height: i32) -> SimConfig {
    SimConfig::new(width, height)
        .with_initial_cars(0)
        .with_max_cars(1)
        .with_lifetime_cap(1)
}

#[test]
fn test_car_arrives_and_returns_spots() {
    let mut world = SimWorld::from_layout(&detour_layout(), single_trip_config(3, 3));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");
    assert_eq!(world.spots.free_count(), 0);

    assert_eq!(world.cars[&car_id].facing, Step::new(1, 0));

    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(1, 0));
    assert_eq!(car.facing, Step::new(1, 0));

    // Reaches the goal and is still shown there
    let snapshot = world.tick();
    assert_eq!(world.cars[&car_id].position, Position::new(2, 0));
    assert_eq!(snapshot.cars.len(), 1);
    assert_eq!(world.spots.free_count(), 0);

    let snapshot = world.tick();
    assert!(world.cars.is_empty());
    assert!(snapshot.cars.is_empty());
    assert_eq!(world.finished_cars, 1);
    assert_eq!(world.spots.free_spots(), vec![1, 2]);
    assert!(world.grid.car_at(Position::new(2, 0)).is_none());
}

#[test]
fn test_spawn_blocked_while_at_capacity() {
    let config = SimConfig::new(3, 3).with_initial_cars(0).with_max_cars(1);
    let mut world = SimWorld::from_layout(&detour_layout(), config);

    assert!(world.try_spawn_between(1, 2).is_some());
    assert!(!world.can_spawn());
    assert!(world.try_spawn_car().is_none());
    assert!(world.try_spawn_between(2, 1).is_none());
    assert_eq!(world.total_spawned, 1);

    // Driving, then parked on the goal: nothing new either way
    for _ in 0..2 {
        world.tick();
        assert_eq!(world.cars.len(), 1);
        assert_eq!(world.total_spawned, 1);
    }

    // Third tick: car arrives, its spots come back and a replacement spawns
    world.tick();
    assert_eq!(world.finished_cars, 1);
    assert_eq!(world.total_spawned, 2);
    assert_eq!(world.cars.len(), 1);
}

#[test]
fn test_spawn_needs_two_free_spots() {
    let mut layout = WorldLayout::new(2, 1);
    layout.read_matrix("1,-");
    layout.read_matrix("E,E");
    let config = SimConfig::new(2, 1).with_initial_cars(5).with_max_cars(5);
    let mut world = SimWorld::from_layout(&layout, config);

    assert!(world.cars.is_empty());
    assert!(world.try_spawn_car().is_none());
    assert_eq!(world.spots.free_count(), 1);
}

#[test]
fn test_lifetime_cap_stops_spawning() {
    let config = SimConfig::new(3, 3)
        .with_initial_cars(1)
        .with_max_cars(1)
        .with_lifetime_cap(1)
        .with_seed(11);
    let mut world = SimWorld::from_layout(&detour_layout(), config);
    assert_eq!(world.total_spawned, 1);

    for _ in 0..20 {
        world.tick();
    }
    assert_eq!(world.total_spawned, 1);
}

#[test]
fn test_red_light_holds_car() {
    let mut world = SimWorld::from_layout(&light_layout("R"), single_trip_config(3, 1));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    for _ in 0..9 {
        world.tick();
        let car = &world.cars[&car_id];
        assert_eq!(car.position, Position::new(0, 0));
        assert!(!car.running);
    }

    // Tick 10 turns the light green and the car drives onto it
    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(1, 0));
    assert!(car.running);

    world.tick();
    assert_eq!(world.cars[&car_id].position, Position::new(2, 0));
    world.tick();
    assert_eq!(world.finished_cars, 1);
}

#[test]
fn test_green_light_lets_car_through() {
    let mut world = SimWorld::from_layout(&light_layout("G"), single_trip_config(3, 1));
    world.try_spawn_between(1, 2).expect("car should spawn");

    for _ in 0..3 {
        world.tick();
    }
    assert_eq!(world.finished_cars, 1);
}

#[test]
fn test_staying_put_is_always_allowed() {
    let mut world = SimWorld::from_layout(&light_layout("R"), single_trip_config(3, 1));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    let lights = world.light_colors();
    let view = TrafficView::new(&world.grid, &world.road_network, &lights);
    let mut car = world.cars[&car_id].clone();

    // Own cell holds the car itself, yet staying is legal
    assert!(car.can_move_to(&view, car.position));
    assert!(car.running);
    assert!(!car.can_move_to(&view, Position::new(1, 0)));
    assert!(!car.running);
}

#[test]
fn test_spawn_rejects_same_spot() {
    let mut pool = SpotPool::new();
    pool.register(1, Position::new(0, 0)).unwrap();
    pool.register(2, Position::new(1, 0)).unwrap();
    let mut grid = Grid::new(2, 1);

    assert!(spawn_car(CarId(SimId(0)), 1, 1, &mut pool, &mut grid).is_err());
    assert_eq!(pool.free_count(), 2);

    let car = spawn_car(CarId(SimId(0)), 1, 2, &mut pool, &mut grid).unwrap();
    assert_eq!(car.position, Position::new(0, 0));
    assert_eq!(car.goal, Position::new(1, 0));
    assert!(grid.contains(Position::new(0, 0), Occupant::Car(CarId(SimId(0)))));
    assert_eq!(pool.free_count(), 0);

    assert!(spawn_car(CarId(SimId(1)), 2, 1, &mut pool, &mut grid).is_err());
}

#[test]
fn test_pool_release_is_idempotent() {
    let mut pool = SpotPool::new();
    pool.register(4, Position::new(0, 0)).unwrap();
    assert!(pool.register(4, Position::new(1, 0)).is_err());

    pool.take(4).unwrap();
    pool.release(4);
    pool.release(4);
    assert_eq!(pool.free_spots(), vec![4]);
    assert!(pool.take(9).is_err());
}

/// Eastbound lane from spot 1 to spot 2, `cells` long
fn straight_layout(cells: &str, lanes: &str) -> WorldLayout {
    let width = cells.split(',').count() as i32;
    let mut layout = WorldLayout::new(width, 1);
    layout.read_matrix(cells);
    layout.read_matrix(lanes);
    layout.read_flow(lanes);
    layout
}

#[test]
fn test_car_is_shown_on_its_goal_before_arriving() {
    let layout = straight_layout("1,-,-,2", "E,E,E,E");
    let mut world = SimWorld::from_layout(&layout, single_trip_config(4, 1));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    for expected_x in 1..=3 {
        let snapshot = world.tick();
        assert_eq!(world.cars[&car_id].position, Position::new(expected_x, 0));
        assert_eq!(snapshot.cars[0].x, expected_x);
    }
    assert_eq!(world.finished_cars, 0);
    assert!(world.spots.free_spots().is_empty());

    let snapshot = world.tick();
    assert!(snapshot.cars.is_empty());
    assert_eq!(world.finished_cars, 1);
    assert_eq!(world.spots.free_spots(), vec![1, 2]);
}

/// 4x2 city where the short route cuts a diagonal and a longer one runs
/// along the bottom row
fn fork_layout() -> WorldLayout {
    let mut layout = WorldLayout::new(4, 2);
    layout.read_matrix("-,-,-,2\n1,-,-,-");
    layout.read_matrix("-,E,E,-\nE,NE,E,N");
    layout.read_flow("-,E,E,-\nE,E,E,N");
    layout
}

#[test]
fn test_blocked_path_is_dropped_for_a_nudge() {
    let mut world = SimWorld::from_layout(&fork_layout(), single_trip_config(4, 2));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(1, 0));
    assert_eq!(
        Vec::from(car.path.clone()),
        vec![Position::new(2, 1), Position::new(3, 1)]
    );

    // A parked car appears on the next cell of the path
    let parked = Occupant::Car(CarId(SimId(99)));
    world.grid.place(parked, Position::new(2, 1)).unwrap();

    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(2, 0));
    assert_eq!(car.facing, Step::new(1, 0));
    assert!(car.running);
    assert_eq!(
        Vec::from(car.path.clone()),
        vec![Position::new(3, 0), Position::new(3, 1)]
    );

    world.tick();
    world.tick();
    world.tick();
    assert_eq!(world.finished_cars, 1);
}

#[test]
fn test_car_without_path_drifts_along_flow() {
    let layout = straight_layout("1,-,-,-,2", "E,E,E,E,E");
    let mut world = SimWorld::from_layout(&layout, single_trip_config(5, 1));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    // Something sits on the goal, so no route exists
    let parked = Occupant::Car(CarId(SimId(99)));
    world.grid.place(parked, Position::new(4, 0)).unwrap();

    for expected_x in [1, 2, 3, 3, 3] {
        world.tick();
        let car = &world.cars[&car_id];
        assert_eq!(car.position, Position::new(expected_x, 0));
        assert!(car.path.is_empty());
        assert!(car.running);
    }

    world.grid.remove(parked, Position::new(4, 0)).unwrap();
    world.tick();
    assert_eq!(world.cars[&car_id].position, Position::new(4, 0));
}

#[test]
fn test_car_stopped_at_red_light_waits_without_nudging() {
    let layout = straight_layout("1,-,R,2", "E,E,E,E");
    let mut world = SimWorld::from_layout(&layout, single_trip_config(4, 1));
    let car_id = world.try_spawn_between(1, 2).expect("car should spawn");

    // Leaves the spot, but the red light hides every route
    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(1, 0));
    assert!(car.path.is_empty());
    assert!(car.running);

    // Last-resort nudge runs into the red light and stops the car
    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(1, 0));
    assert!(!car.running);

    for _ in 3..10 {
        world.tick();
        let car = &world.cars[&car_id];
        assert_eq!(car.position, Position::new(1, 0));
        assert!(car.path.is_empty());
        assert!(!car.running);
    }

    // Tick 10: green, a fresh route takes the car onto the light
    world.tick();
    let car = &world.cars[&car_id];
    assert_eq!(car.position, Position::new(2, 0));
    assert!(car.running);
    assert_eq!(Vec::from(car.path.clone()), vec![Position::new(3, 0)]);
}

/// Check the traffic rules for every car that moved during the last tick
fn check_moves(world: &SimWorld, before: &BTreeMap<CarId, Position>) {
    let lights = world.light_colors();
    for car in world.cars.values() {
        let occupants = world.grid.occupants_at(car.position);
        assert!(!occupants.contains(&Occupant::Building));
        assert!(!occupants.contains(&Occupant::RoundAbout));

        let Some(previous) = before.get(&car.id) else {
            continue;
        };
        if *previous == car.position {
            continue;
        }

        assert!(previous.is_adjacent(&car.position));
        assert!(
            world
                .road_network
                .direction_is_available(*previous, car.position),
            "car {:?} moved {} -> {} against the lanes",
            car.id,
            previous,
            car.position
        );
        for occupant in occupants {
            if let Occupant::Stoplight(id) = occupant {
                assert_ne!(lights[id], LightColor::Red, "car entered a red light");
            }
        }
    }
}

/// Every active car holds two distinct spots that are not in the free pool
fn check_spot_ownership(world: &SimWorld) {
    let mut held = BTreeSet::new();
    for car in world.cars.values() {
        assert_ne!(car.start_spot, car.goal_spot);
        assert!(held.insert(car.start_spot));
        assert!(held.insert(car.goal_spot));
    }
    for free in world.spots.free_spots() {
        assert!(!held.contains(&free));
    }
    assert_eq!(held.len() + world.spots.free_count(), world.spots.total_count());
}

#[test]
fn test_demo_run_obeys_traffic_rules() {
    let mut world = SimWorld::create_demo_world_with_seed(42);

    for _ in 0..300 {
        let before: BTreeMap<CarId, Position> =
            world.cars.values().map(|car| (car.id, car.position)).collect();
        world.tick();
        check_moves(&world, &before);
        check_spot_ownership(&world);
    }

    let halfway = world.finished_cars;
    assert!(halfway > 0);

    for _ in 0..300 {
        world.tick();
    }
    assert!(world.finished_cars > halfway, "traffic stopped flowing");
}

#[test]
fn test_spot_pool_round_trip_at_quiescence() {
    let config = SimConfig::default()
        .with_initial_cars(3)
        .with_max_cars(3)
        .with_lifetime_cap(3)
        .with_seed(7);
    let mut world = SimWorld::from_layout(&WorldLayout::demo(), config);
    let all_spots: Vec<u32> = (1..=6).collect();
    assert_eq!(world.cars.len(), 3);
    assert_eq!(world.spots.free_count(), 0);

    for _ in 0..500 {
        if world.cars.is_empty() {
            break;
        }
        world.tick();
    }

    assert!(world.cars.is_empty(), "cars never reached their goals");
    assert_eq!(world.finished_cars, 3);
    assert_eq!(world.spots.free_spots(), all_spots);
}

#[test]
fn test_seeded_runs_match() {
    let mut first = SimWorld::create_demo_world_with_seed(5);
    let mut second = SimWorld::create_demo_world_with_seed(5);

    for _ in 0..100 {
        assert_eq!(first.tick(), second.tick());
    }
}
