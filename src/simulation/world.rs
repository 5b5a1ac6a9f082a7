//! Main simulation world that ties everything together
//!
//! The world owns the grid and every agent on it. One call to [`SimWorld::tick`]
//! advances the stoplights, then each active car in id order, then sweeps out
//! arrived cars and spawns at most one replacement.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::car::{CarUpdateResult, SimCar};
use super::car_manager::{despawn_car, spawn_car, SpotPool};
use super::config::SimConfig;
use super::grid::{Grid, Occupant};
use super::layout::WorldLayout;
use super::road_network::SimRoadNetwork;
use super::snapshot::{CarSnapshot, LightSnapshot, Snapshot};
use super::stoplight::SimStoplight;
use super::types::{CarId, LightColor, Position, SimId, SpotNumber, StoplightId};

/// Running totals for a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub total_cars_spawned: usize,
    pub total_cars_finished: usize,
    pub active_cars: usize,
    pub free_spots: usize,
    pub total_spots: usize,
    pub roads: usize,
    pub stoplights: usize,
}

/// The main simulation world
pub struct SimWorld {
    pub grid: Grid,

    /// Lane rules and the move graph for pathfinding
    pub road_network: SimRoadNetwork,

    /// All stoplights, advanced in id order
    pub stoplights: BTreeMap<StoplightId, SimStoplight>,

    /// Active cars, updated in id order
    pub cars: BTreeMap<CarId, SimCar>,

    /// Parking spots and the free-number pool
    pub spots: SpotPool,

    pub config: SimConfig,

    /// Next ID to assign
    next_id: usize,

    /// Ticks run so far
    pub tick_count: u64,

    /// Cars spawned over the whole run
    pub total_spawned: usize,

    /// Cars that reached their goal
    pub finished_cars: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SimWorld {
    /// Build a world from a parsed layout and spawn the initial cars
    pub fn from_layout(layout: &WorldLayout, config: SimConfig) -> Self {
        let mut world = Self {
            grid: Grid::new(config.width, config.height),
            road_network: SimRoadNetwork::new(config.width, config.height),
            stoplights: BTreeMap::new(),
            cars: BTreeMap::new(),
            spots: SpotPool::new(),
            rng: config.seed.map(StdRng::seed_from_u64),
            config,
            next_id: 0,
            tick_count: 0,
            total_spawned: 0,
            finished_cars: 0,
        };

        world.load_layout(layout);

        let initial = world.config.initial_cars;
        for _ in 0..initial {
            if world.try_spawn_car().is_none() {
                break;
            }
        }

        info!(
            "World ready: {}x{} grid, {} roads, {} spots, {} stoplights, {} cars",
            world.grid.width(),
            world.grid.height(),
            world.road_network.road_count(),
            world.spots.total_count(),
            world.stoplights.len(),
            world.cars.len()
        );
        world
    }

    /// Build the demo city with default settings
    pub fn create_demo_world() -> Self {
        Self::from_layout(&WorldLayout::demo(), SimConfig::default())
    }

    /// Build the demo city with a seeded RNG for reproducible simulations
    pub fn create_demo_world_with_seed(seed: u64) -> Self {
        Self::from_layout(&WorldLayout::demo(), SimConfig::default().with_seed(seed))
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    fn place_static(&mut self, occupant: Occupant, pos: Position) -> bool {
        match self.grid.place(occupant, pos) {
            Ok(()) => true,
            Err(err) => {
                warn!("Skipping layout element: {:#}", err);
                false
            }
        }
    }

    fn load_layout(&mut self, layout: &WorldLayout) {
        for (pos, direction) in &layout.lanes {
            if !self.grid.is_within_bounds(*pos) {
                warn!("Lane marker at {} is outside the grid, skipping", pos);
                continue;
            }
            if self.road_network.add_direction(*pos, *direction) {
                self.place_static(Occupant::Road, *pos);
            }
        }

        for (pos, direction) in &layout.flows {
            if !self.road_network.set_primary_flow(*pos, *direction) {
                warn!("Flow marker at {} has no road underneath, skipping", pos);
            }
        }

        for pos in &layout.buildings {
            self.place_static(Occupant::Building, *pos);
        }

        for (pos, number) in &layout.parking_spots {
            if !self.grid.is_within_bounds(*pos) {
                warn!("Parking spot {} at {} is outside the grid, skipping", number, pos);
                continue;
            }
            match self.spots.register(*number, *pos) {
                Ok(()) => {
                    self.place_static(Occupant::ParkingSpot(*number), *pos);
                }
                Err(err) => warn!("{:#}", err),
            }
        }

        for pos in &layout.roundabouts {
            self.place_static(Occupant::RoundAbout, *pos);
        }

        for (pos, color) in &layout.stoplights {
            let id = StoplightId(self.next_sim_id());
            if self.place_static(Occupant::Stoplight(id), *pos) {
                self.stoplights
                    .insert(id, SimStoplight::new(id, *pos, *color));
            }
        }
    }

    /// Current color of every stoplight
    pub fn light_colors(&self) -> HashMap<StoplightId, LightColor> {
        self.stoplights
            .iter()
            .map(|(id, light)| (*id, light.color()))
            .collect()
    }

    /// Whether the capacity policy allows another car right now
    pub fn can_spawn(&self) -> bool {
        self.cars.len() < self.config.max_cars
            && self.spots.free_count() >= 2
            && self.total_spawned < self.config.lifetime_cap
    }

    /// Spawn one car between two random free spots if capacity allows
    ///
    /// Spots whose cell currently holds a car are not used as a start.
    pub fn try_spawn_car(&mut self) -> Option<CarId> {
        if !self.can_spawn() {
            return None;
        }

        let free = self.spots.free_spots();
        let starts: Vec<SpotNumber> = free
            .iter()
            .copied()
            .filter(|number| {
                self.spots
                    .position_of(*number)
                    .is_some_and(|pos| self.grid.car_at(pos).is_none())
            })
            .collect();

        let start = *self.choose_random(&starts)?;
        let goals: Vec<SpotNumber> = free.into_iter().filter(|n| *n != start).collect();
        let goal = *self.choose_random(&goals)?;

        self.try_spawn_between(start, goal)
    }

    /// Spawn a car from `start` to `goal` if capacity allows and both are free
    pub fn try_spawn_between(&mut self, start: SpotNumber, goal: SpotNumber) -> Option<CarId> {
        if !self.can_spawn() {
            debug!("Spawn from {} to {} skipped: at capacity", start, goal);
            return None;
        }

        let id = CarId(self.next_sim_id());
        match spawn_car(id, start, goal, &mut self.spots, &mut self.grid) {
            Ok(mut car) => {
                if let Some(flow) = self.road_network.primary_flow(car.position) {
                    car.facing = flow.unit();
                }
                self.cars.insert(id, car);
                self.total_spawned += 1;
                Some(id)
            }
            Err(err) => {
                debug!("Spawn from {} to {} skipped: {:#}", start, goal, err);
                None
            }
        }
    }

    /// Update all cars in id order
    fn update_cars(&mut self) -> Vec<CarId> {
        let lights = self.light_colors();
        let mut arrived = Vec::new();

        for car in self.cars.values_mut() {
            match car.update(&mut self.grid, &self.road_network, &lights) {
                Ok(CarUpdateResult::Arrived) => arrived.push(car.id),
                Ok(CarUpdateResult::Continue) => {}
                Err(err) => warn!("Car {:?} update failed: {:#}", car.id.0, err),
            }
        }

        arrived
    }

    /// Main simulation tick
    pub fn tick(&mut self) -> Snapshot {
        for light in self.stoplights.values_mut() {
            light.tick();
        }

        let arrived = self.update_cars();

        for car_id in arrived {
            if let Some(car) = self.cars.remove(&car_id) {
                despawn_car(&car, &mut self.spots, &mut self.grid);
                self.finished_cars += 1;
                info!(
                    "Car {:?} arrived at spot {} after {} ticks",
                    car_id.0,
                    car.goal_spot,
                    self.tick_count + 1
                );
            }
        }

        self.try_spawn_car();
        self.tick_count += 1;

        self.snapshot()
    }

    /// Committed state for outside consumers
    pub fn snapshot(&self) -> Snapshot {
        let cars = self
            .cars
            .values()
            .filter(|car| car.active)
            .map(|car| CarSnapshot {
                id: car.id.0 .0,
                x: car.position.x,
                z: car.position.y,
                dir_x: car.facing.dx,
                dir_z: car.facing.dy,
            })
            .collect();

        let lights: BTreeSet<LightSnapshot> = self
            .stoplights
            .values()
            .map(|light| LightSnapshot {
                class: light.class(),
                color: light.color(),
            })
            .collect();

        Snapshot {
            cars,
            lights: lights.into_iter().collect(),
        }
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            ticks: self.tick_count,
            total_cars_spawned: self.total_spawned,
            total_cars_finished: self.finished_cars,
            active_cars: self.cars.len(),
            free_spots: self.spots.free_count(),
            total_spots: self.spots.total_count(),
            roads: self.road_network.road_count(),
            stoplights: self.stoplights.len(),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let stats = self.stats();
        println!("=== Traffic Simulation Summary ===");
        println!("Tick: {}", stats.ticks);
        println!(
            "Roads: {}, Stoplights: {}, Spots: {}/{} free",
            stats.roads, stats.stoplights, stats.free_spots, stats.total_spots
        );
        println!(
            "Cars: {} active, {} spawned, {} finished",
            stats.active_cars, stats.total_cars_spawned, stats.total_cars_finished
        );

        if !self.stoplights.is_empty() {
            println!("--- Stoplights ---");
            for light in self.stoplights.values() {
                println!(
                    "  Light {:?} at {}: {:?} (class {:?})",
                    light.id.0 .0,
                    light.position,
                    light.color(),
                    light.class()
                );
            }
        }

        if !self.cars.is_empty() {
            println!("--- Active Cars ---");
            for car in self.cars.values() {
                println!(
                    "  Car {:?}: at {}, spot {} -> {}, path_remaining={}, running={}",
                    car.id.0 .0,
                    car.position,
                    car.start_spot,
                    car.goal_spot,
                    car.path.len(),
                    car.running
                );
            }
        }
    }

    /// Draw the grid in the terminal, north at the top
    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: C=Car, %=Building, B=Roundabout, G/Y/R=Light, P=Spot, N/S/E/W=Road flow");
        println!();

        for y in (0..self.grid.height()).rev() {
            let line: String = (0..self.grid.width())
                .map(|x| self.map_char(Position::new(x, y)))
                .collect();
            println!("{}", line);
        }
        println!();
    }

    fn map_char(&self, pos: Position) -> char {
        let occupants = self.grid.occupants_at(pos);
        if self.grid.car_at(pos).is_some() {
            return 'C';
        }
        for occupant in occupants {
            match occupant {
                Occupant::Building => return '%',
                Occupant::RoundAbout => return 'B',
                Occupant::Stoplight(id) => {
                    return match self.stoplights.get(id).map(|l| l.color()) {
                        Some(LightColor::Green) => 'G',
                        Some(LightColor::Yellow) => 'Y',
                        _ => 'R',
                    };
                }
                Occupant::ParkingSpot(_) => return 'P',
                _ => {}
            }
        }
        match self.road_network.get_road(pos) {
            Some(road) => road.primary_flow.map_or('+', |flow| flow.as_char()),
            None => '.',
        }
    }
}
