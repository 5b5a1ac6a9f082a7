//! Run parameters for a simulation

/// Width of the built-in demo city
pub const DEFAULT_WIDTH: i32 = 7;

/// Height of the built-in demo city
pub const DEFAULT_HEIGHT: i32 = 5;

/// Cars spawned when the world is built
pub const DEFAULT_INITIAL_CARS: usize = 2;

/// Ceiling on simultaneously active cars
pub const DEFAULT_MAX_CARS: usize = 3;

/// Total cars a run may ever spawn
pub const DEFAULT_LIFETIME_CAP: usize = 500;

/// Scalar settings for one simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub width: i32,
    pub height: i32,
    pub initial_cars: usize,
    pub max_cars: usize,
    pub lifetime_cap: usize,
    /// Seed for spot selection; `None` draws from the thread RNG
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            initial_cars: DEFAULT_INITIAL_CARS,
            max_cars: DEFAULT_MAX_CARS,
            lifetime_cap: DEFAULT_LIFETIME_CAP,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_initial_cars(mut self, initial_cars: usize) -> Self {
        self.initial_cars = initial_cars;
        self
    }

    pub fn with_max_cars(mut self, max_cars: usize) -> Self {
        self.max_cars = max_cars;
        self
    }

    pub fn with_lifetime_cap(mut self, lifetime_cap: usize) -> Self {
        self.lifetime_cap = lifetime_cap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
