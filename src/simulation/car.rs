//! Car movement logic for the traffic simulation
//!
//! A car moves at most one cell per tick. It follows its planned path while
//! the next cell is free, replans when the path goes stale, and otherwise
//! drifts along the primary flow of the road it stands on.

use anyhow::Result;
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};

use super::grid::{Grid, Occupant, Passage};
use super::pathfinder::{find_path, TrafficView};
use super::road_network::SimRoadNetwork;
use super::types::{CarId, LightColor, Position, SpotNumber, StoplightId, Step};

/// Result of a car update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    /// Car is still on its way (it may or may not have moved)
    Continue,
    /// Car reached its goal and should be despawned
    Arrived,
}

/// A car in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    pub position: Position,
    /// Where the car was spawned
    pub initial_position: Position,
    pub goal: Position,
    /// Parking spot the car left from
    pub start_spot: SpotNumber,
    /// Parking spot the car is heading to
    pub goal_spot: SpotNumber,
    /// Remaining route; the front is the next cell to try
    pub path: VecDeque<Position>,
    pub active: bool,
    /// Cleared while the car waits at a red light
    pub running: bool,
    /// Unit vector of the last realized move, or of the start cell's
    /// primary flow before the first one
    pub facing: Step,
}

impl SimCar {
    pub fn new(
        id: CarId,
        position: Position,
        goal: Position,
        start_spot: SpotNumber,
        goal_spot: SpotNumber,
    ) -> Self {
        Self {
            id,
            position,
            initial_position: position,
            goal,
            start_spot,
            goal_spot,
            path: VecDeque::new(),
            active: true,
            running: true,
            facing: Step::ZERO,
        }
    }

    /// Whether this car may enter `pos` right now
    ///
    /// Updates `running`: a red light stops the car, a road gets it going.
    pub fn can_move_to(&mut self, view: &TrafficView<'_>, pos: Position) -> bool {
        if pos == self.position {
            return true;
        }
        match view.passage(pos) {
            Passage::Blocked => false,
            Passage::Stop => {
                self.running = false;
                false
            }
            Passage::Go => {
                self.running = true;
                true
            }
            Passage::Neutral => true,
        }
    }

    /// Update car movement logic for one tick
    pub fn update(
        &mut self,
        grid: &mut Grid,
        roads: &SimRoadNetwork,
        lights: &HashMap<StoplightId, LightColor>,
    ) -> Result<CarUpdateResult> {
        if !self.active {
            return Ok(CarUpdateResult::Continue);
        }

        let mut moved = false;
        if self.position == self.initial_position {
            moved = self.continue_path(grid, roads, lights)?;
        }

        if self.position == self.goal {
            self.active = false;
            return Ok(CarUpdateResult::Arrived);
        }

        if moved {
            return Ok(CarUpdateResult::Continue);
        }

        if self.path.is_empty() {
            self.replan(grid, roads, lights);
        }

        match self.path.front().copied() {
            Some(next) => {
                let view = TrafficView::new(grid, roads, lights);
                if self.can_move_to(&view, next) && roads.direction_is_available(self.position, next)
                {
                    self.move_to(grid, next)?;
                    self.path.pop_front();
                } else {
                    debug!(
                        "Car {:?} blocked at {} heading to {}, rerouting",
                        self.id.0, self.position, next
                    );
                    self.path.clear();
                    self.continue_path(grid, roads, lights)?;
                }
            }
            None if self.running => {
                self.continue_path(grid, roads, lights)?;
            }
            None => {}
        }

        // Reaching the goal here is noticed on the next tick
        Ok(CarUpdateResult::Continue)
    }

    /// Step once along the primary flow of the current road, then replan
    ///
    /// Returns whether the car moved.
    pub fn continue_path(
        &mut self,
        grid: &mut Grid,
        roads: &SimRoadNetwork,
        lights: &HashMap<StoplightId, LightColor>,
    ) -> Result<bool> {
        let Some(flow) = roads.primary_flow(self.position) else {
            return Ok(false);
        };

        let next = self.position.offset(flow.unit());
        let view = TrafficView::new(grid, roads, lights);
        if !grid.is_within_bounds(next)
            || !roads.direction_is_available(self.position, next)
            || !self.can_move_to(&view, next)
        {
            return Ok(false);
        }

        self.move_to(grid, next)?;
        self.replan(grid, roads, lights);
        Ok(true)
    }

    /// Recompute the path from the current position against the live grid
    pub fn replan(
        &mut self,
        grid: &Grid,
        roads: &SimRoadNetwork,
        lights: &HashMap<StoplightId, LightColor>,
    ) {
        let view = TrafficView::new(grid, roads, lights);
        self.path = find_path(&view, self.position, self.goal).into();
        trace!(
            "Car {:?} planned {} steps from {} to {}",
            self.id.0,
            self.path.len(),
            self.position,
            self.goal
        );
    }

    fn move_to(&mut self, grid: &mut Grid, next: Position) -> Result<()> {
        grid.move_occupant(Occupant::Car(self.id), self.position, next)?;
        let step = self.position.step_to(&next);
        if !step.is_zero() {
            self.facing = step;
        }
        self.position = next;
        Ok(())
    }
}
