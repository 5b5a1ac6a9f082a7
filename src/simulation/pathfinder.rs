//! Direction-constrained A* over the city grid
//!
//! The search walks the road network graph, so a car only ever plans moves
//! its current lane allows. Cells that are impassable right now get an
//! infinite heuristic and are filtered out of this round's search; callers
//! simply search again on a later tick when lights or traffic have changed.

use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::visit::{EdgeRef, NodeFiltered};
use std::collections::HashMap;

use super::grid::{Grid, Occupant, Passage};
use super::road_network::SimRoadNetwork;
use super::types::{LightColor, Position, StoplightId};

/// Read-only view of everything a car needs to judge a cell
#[derive(Clone, Copy)]
pub struct TrafficView<'a> {
    pub grid: &'a Grid,
    pub roads: &'a SimRoadNetwork,
    pub lights: &'a HashMap<StoplightId, LightColor>,
}

impl<'a> TrafficView<'a> {
    pub fn new(
        grid: &'a Grid,
        roads: &'a SimRoadNetwork,
        lights: &'a HashMap<StoplightId, LightColor>,
    ) -> Self {
        Self {
            grid,
            roads,
            lights,
        }
    }

    /// Combined verdict of all occupants of a cell
    ///
    /// Any blocker wins, then a red light. A plain road means go. Cells
    /// holding nothing that has an opinion stay open.
    pub fn passage(&self, pos: Position) -> Passage {
        if !self.grid.is_within_bounds(pos) {
            return Passage::Blocked;
        }

        let mut verdict = Passage::Neutral;
        for occupant in self.grid.occupants_at(pos) {
            let light = match occupant {
                Occupant::Stoplight(id) => self.lights.get(id).copied(),
                _ => None,
            };
            match occupant.grants_passage(light) {
                Passage::Blocked => return Passage::Blocked,
                Passage::Stop => verdict = Passage::Stop,
                Passage::Go if verdict != Passage::Stop => verdict = Passage::Go,
                _ => {}
            }
        }
        verdict
    }

    pub fn is_passable(&self, pos: Position) -> bool {
        matches!(self.passage(pos), Passage::Go | Passage::Neutral)
    }
}

/// A* heuristic: Euclidean distance, infinite for cells that are blocked now
pub fn heuristic(view: &TrafficView<'_>, candidate: Position, goal: Position) -> f64 {
    if view.is_passable(candidate) {
        candidate.distance(&goal)
    } else {
        f64::INFINITY
    }
}

/// Find a route from `start` to `goal`
///
/// The result excludes `start` and ends at `goal`; it is empty when the goal
/// is unreachable this tick or when `start == goal`. The search runs on the
/// road graph with every currently impassable cell filtered out (the start
/// cell always stays, since the car itself sits there).
pub fn find_path(view: &TrafficView<'_>, start: Position, goal: Position) -> Vec<Position> {
    if start == goal
        || !view.grid.is_within_bounds(start)
        || !view.grid.is_within_bounds(goal)
    {
        return Vec::new();
    }

    let open_cells = NodeFiltered::from_fn(view.roads.graph(), |pos: Position| {
        pos == start || heuristic(view, pos, goal).is_finite()
    });

    let result = astar(
        &open_cells,
        start,
        |pos| pos == goal,
        |edge| OrderedFloat(*edge.weight() as f64),
        |pos| OrderedFloat(heuristic(view, pos, goal)),
    );

    match result {
        // Skip the start node
        Some((_, path)) => path.into_iter().skip(1).collect(),
        None => Vec::new(),
    }
}
