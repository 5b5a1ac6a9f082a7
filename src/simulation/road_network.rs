//! Road network built from lane markers
//!
//! Every road cell records which compass directions a car may leave it by and
//! the primary-flow direction it should drift along when it has no route.
//! The legal one-step moves form a directed graph that the pathfinder walks.

use log::debug;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, HashMap};

use super::types::{Direction, Position, Step};

/// Cost of one grid step
pub const STEP_COST: u32 = 1;

/// A road cell and its lane rules
#[derive(Debug, Clone)]
pub struct RoadCell {
    pub position: Position,
    pub directions: BTreeSet<Direction>,
    pub primary_flow: Option<Direction>,
}

impl RoadCell {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            directions: BTreeSet::new(),
            primary_flow: None,
        }
    }

    /// Whether a step leaving this cell is allowed by its lanes
    ///
    /// Every compass component of the step has to be an allowed direction,
    /// so a diagonal needs both of its components.
    pub fn allows_step(&self, step: Step) -> bool {
        step.is_zero()
            || step
                .directions()
                .iter()
                .all(|direction| self.directions.contains(direction))
    }
}

/// Road cells plus the directed graph of legal one-step moves
#[derive(Debug, Clone)]
pub struct SimRoadNetwork {
    width: i32,
    height: i32,

    /// Road data keyed by cell
    cells: HashMap<Position, RoadCell>,

    /// Edge `a -> b` exists when a car on `a` may step onto `b`
    graph: DiGraphMap<Position, u32>,
}

impl SimRoadNetwork {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: HashMap::new(),
            graph: DiGraphMap::new(),
        }
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Add a lane direction to the road cell at `pos`, creating it if needed
    ///
    /// Returns `true` when this created a new road cell.
    pub fn add_direction(&mut self, pos: Position, direction: Direction) -> bool {
        let created = !self.cells.contains_key(&pos);
        let cell = self
            .cells
            .entry(pos)
            .or_insert_with(|| RoadCell::new(pos));
        cell.directions.insert(direction);
        debug!("Road {} now allows {:?}", pos, cell.directions);

        self.connect(pos);
        created
    }

    /// Set the primary-flow direction of an existing road cell
    ///
    /// Returns `false` when no road cell exists at `pos`.
    pub fn set_primary_flow(&mut self, pos: Position, direction: Direction) -> bool {
        match self.cells.get_mut(&pos) {
            Some(cell) => {
                cell.primary_flow = Some(direction);
                true
            }
            None => false,
        }
    }

    /// Rebuild the outgoing edges of a road cell from its direction set
    fn connect(&mut self, pos: Position) {
        let Some(cell) = self.cells.get(&pos) else {
            return;
        };

        let targets: Vec<Position> = neighbor_steps()
            .filter(|step| cell.allows_step(*step))
            .map(|step| pos.offset(step))
            .filter(|next| self.in_bounds(*next))
            .collect();

        self.graph.add_node(pos);
        for next in targets {
            self.graph.add_edge(pos, next, STEP_COST);
        }
    }

    pub fn get_road(&self, pos: Position) -> Option<&RoadCell> {
        self.cells.get(&pos)
    }

    /// Allowed directions at a cell; empty when the cell is not a road
    pub fn allowed_directions(&self, pos: Position) -> BTreeSet<Direction> {
        self.cells
            .get(&pos)
            .map(|cell| cell.directions.clone())
            .unwrap_or_default()
    }

    pub fn primary_flow(&self, pos: Position) -> Option<Direction> {
        self.cells.get(&pos).and_then(|cell| cell.primary_flow)
    }

    /// Whether a car on `current` may step onto `next` as far as lanes go
    ///
    /// Staying put is always allowed; anything else needs a road at `current`.
    pub fn direction_is_available(&self, current: Position, next: Position) -> bool {
        let step = current.step_to(&next);
        if step.is_zero() {
            return true;
        }
        self.cells
            .get(&current)
            .is_some_and(|cell| cell.allows_step(step))
    }

    /// Cells reachable in one legal step from `pos`, in position order
    pub fn successors(&self, pos: Position) -> Vec<(Position, u32)> {
        if !self.graph.contains_node(pos) {
            return Vec::new();
        }
        let mut next: Vec<(Position, u32)> = self
            .graph
            .edges(pos)
            .map(|(_, target, weight)| (target, *weight))
            .collect();
        next.sort();
        next
    }

    /// Get number of road cells
    pub fn road_count(&self) -> usize {
        self.cells.len()
    }

    /// Directed graph of legal one-step moves
    pub fn graph(&self) -> &DiGraphMap<Position, u32> {
        &self.graph
    }
}

/// The eight Moore-neighborhood steps
fn neighbor_steps() -> impl Iterator<Item = Step> {
    (-1..=1)
        .flat_map(|dx| (-1..=1).map(move |dy| Step::new(dx, dy)))
        .filter(|step| !step.is_zero())
}
