//! Car spawning and despawning for the traffic simulation
//!
//! Parking spot numbers are the scarce resource here: a car holds its start
//! and goal spots from the moment it spawns until it arrives, then hands both
//! back to the pool.

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

use super::car::SimCar;
use super::grid::{Grid, Occupant};
use super::types::{CarId, Position, SpotNumber};

/// Parking spots and the numbers currently free to hand out
#[derive(Debug, Clone, Default)]
pub struct SpotPool {
    /// Every spot in the city
    spots: BTreeMap<SpotNumber, Position>,
    /// Numbers not held by any active car
    free: BTreeSet<SpotNumber>,
}

impl SpotPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parking spot; duplicates are rejected
    pub fn register(&mut self, number: SpotNumber, position: Position) -> Result<()> {
        if self.spots.contains_key(&number) {
            bail!("Parking spot {} is already registered", number);
        }
        self.spots.insert(number, position);
        self.free.insert(number);
        Ok(())
    }

    pub fn position_of(&self, number: SpotNumber) -> Option<Position> {
        self.spots.get(&number).copied()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn total_count(&self) -> usize {
        self.spots.len()
    }

    /// Free spot numbers in ascending order
    pub fn free_spots(&self) -> Vec<SpotNumber> {
        self.free.iter().copied().collect()
    }

    pub fn is_free(&self, number: SpotNumber) -> bool {
        self.free.contains(&number)
    }

    /// Take a spot out of the pool
    pub fn take(&mut self, number: SpotNumber) -> Result<Position> {
        if !self.free.remove(&number) {
            bail!("Parking spot {} is not free", number);
        }
        self.position_of(number)
            .with_context(|| format!("Parking spot {} has no position", number))
    }

    /// Hand a spot back to the pool
    ///
    /// Returning a spot that is already free is reported and ignored so a
    /// number never appears twice.
    pub fn release(&mut self, number: SpotNumber) {
        if !self.spots.contains_key(&number) {
            warn!("Released unknown parking spot {}", number);
            return;
        }
        if !self.free.insert(number) {
            warn!("Parking spot {} was released twice", number);
        }
    }
}

/// Spawn a car on `start_spot` heading for `goal_spot`
///
/// Both spots are taken from the pool and the car is placed on the grid.
/// On failure nothing is left taken.
pub fn spawn_car(
    car_id: CarId,
    start_spot: SpotNumber,
    goal_spot: SpotNumber,
    pool: &mut SpotPool,
    grid: &mut Grid,
) -> Result<SimCar> {
    if start_spot == goal_spot {
        bail!("Start and goal spot must differ (both {})", start_spot);
    }
    if !pool.is_free(start_spot) || !pool.is_free(goal_spot) {
        bail!(
            "Spots {} and {} must both be free to spawn a car",
            start_spot,
            goal_spot
        );
    }

    let start = pool.take(start_spot)?;
    let goal = match pool.take(goal_spot) {
        Ok(goal) => goal,
        Err(err) => {
            pool.release(start_spot);
            return Err(err);
        }
    };

    if let Err(err) = grid.place(Occupant::Car(car_id), start) {
        pool.release(start_spot);
        pool.release(goal_spot);
        return Err(err.context("Failed to place spawned car"));
    }

    debug!(
        "Spawned car {:?} at spot {} {} heading to spot {} {}",
        car_id.0, start_spot, start, goal_spot, goal
    );

    Ok(SimCar::new(car_id, start, goal, start_spot, goal_spot))
}

/// Despawn a car: take it off the grid and hand its spots back
pub fn despawn_car(car: &SimCar, pool: &mut SpotPool, grid: &mut Grid) {
    if let Err(err) = grid.remove(Occupant::Car(car.id), car.position) {
        warn!("Despawning car {:?}: {:#}", car.id.0, err);
    }
    pool.release(car.start_spot);
    pool.release(car.goal_spot);
    debug!(
        "Despawned car {:?}, spots {} and {} are free again",
        car.id.0, car.start_spot, car.goal_spot
    );
}
