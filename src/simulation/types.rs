//! Core types for the traffic simulation
//!
//! Positions, compass directions, light colors and the id wrappers shared by
//! every other module.

use serde::Serialize;
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for car IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub SimId);

/// A wrapper type for stoplight IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoplightId(pub SimId);

/// Parking spot number as written in the layout
pub type SpotNumber = u32;

/// A cell coordinate on the city grid
///
/// `y` grows northwards: the bottom row of a layout file is `y == 0`.
/// Ordering is lexicographic on `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another cell
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// The cell reached by applying a step delta
    pub fn offset(&self, step: Step) -> Position {
        Position::new(self.x + step.dx, self.y + step.dy)
    }

    /// Delta from this cell to another
    pub fn step_to(&self, other: &Position) -> Step {
        Step::new(other.x - self.x, other.y - self.y)
    }

    /// Whether two cells touch in the 8-neighborhood (or coincide)
    pub fn is_adjacent(&self, other: &Position) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An integer displacement between two cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Step {
    pub dx: i32,
    pub dy: i32,
}

impl Step {
    pub const ZERO: Step = Step { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Compass components this step moves along
    ///
    /// A diagonal step yields two directions, a straight step one, and the
    /// zero step none.
    pub fn directions(&self) -> Vec<Direction> {
        let mut dirs = Vec::with_capacity(2);
        if self.dy > 0 {
            dirs.push(Direction::North);
        } else if self.dy < 0 {
            dirs.push(Direction::South);
        }
        if self.dx > 0 {
            dirs.push(Direction::East);
        } else if self.dx < 0 {
            dirs.push(Direction::West);
        }
        dirs
    }
}

/// A compass direction on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Unit step for this direction (north is +y)
    pub fn unit(&self) -> Step {
        match self {
            Direction::North => Step::new(0, 1),
            Direction::South => Step::new(0, -1),
            Direction::East => Step::new(1, 0),
            Direction::West => Step::new(-1, 0),
        }
    }

    pub fn from_char(c: char) -> Option<Direction> {
        match c {
            'N' => Some(Direction::North),
            'S' => Some(Direction::South),
            'E' => Some(Direction::East),
            'W' => Some(Direction::West),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

/// Color of a stoplight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Green,
    Yellow,
    Red,
}

impl LightColor {
    /// Yellow behaves like green for cars
    pub fn allows_passage(&self) -> bool {
        !matches!(self, LightColor::Red)
    }
}

/// Phase group of a stoplight, fixed by its initial color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LightClass {
    /// Started green
    A,
    /// Started red
    B,
}

impl LightClass {
    pub fn from_initial_color(color: LightColor) -> Self {
        match color {
            LightColor::Red => LightClass::B,
            LightColor::Green | LightColor::Yellow => LightClass::A,
        }
    }
}

/// Length of a full stoplight cycle in ticks
pub const LIGHT_CYCLE_TICKS: u32 = 10;

/// How many ticks before the cycle boundary a green light turns yellow
pub const YELLOW_LEAD_TICKS: u32 = 2;
