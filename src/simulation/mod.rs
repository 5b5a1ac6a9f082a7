//! Standalone traffic simulation module
//!
//! This module contains the grid city model, stoplight timing, pathfinding,
//! car behavior and the spawn/despawn lifecycle. It can be driven from the
//! console or from tests without any serving layer.

mod car;
mod car_manager;
mod config;
mod grid;
mod layout;
mod pathfinder;
mod road_network;
mod snapshot;
mod stoplight;
mod types;
mod world;

// Re-export public types for external use
pub use car::{CarUpdateResult, SimCar};
pub use car_manager::{despawn_car, spawn_car, SpotPool};
pub use config::{
    SimConfig, DEFAULT_HEIGHT, DEFAULT_INITIAL_CARS, DEFAULT_LIFETIME_CAP, DEFAULT_MAX_CARS,
    DEFAULT_WIDTH,
};
pub use grid::{Grid, Occupant, Passage};
pub use layout::WorldLayout;
pub use pathfinder::{find_path, heuristic, TrafficView};
pub use road_network::{RoadCell, SimRoadNetwork, STEP_COST};
pub use snapshot::{CarSnapshot, LightSnapshot, Snapshot};
pub use stoplight::SimStoplight;
pub use types::{
    CarId, Direction, LightClass, LightColor, Position, SimId, SpotNumber, Step, StoplightId,
    LIGHT_CYCLE_TICKS, YELLOW_LEAD_TICKS,
};
pub use world::{SimWorld, SimulationStats};
