//! World layout loading
//!
//! Layouts are comma-separated token matrices. The last text line is the
//! bottom row (`y == 0`). Lane direction markers accumulate across every
//! matrix that is read, so a city can be described by one feature matrix plus
//! one matrix per lane direction. A separate flow matrix gives each road cell
//! its primary-flow direction.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use super::types::{Direction, LightColor, Position, SpotNumber};

/// Parsed city description, consumed once when the world is built
#[derive(Debug, Clone, Default)]
pub struct WorldLayout {
    pub width: i32,
    pub height: i32,
    /// Lane markers in the order they were read
    pub lanes: Vec<(Position, Direction)>,
    pub flows: Vec<(Position, Direction)>,
    pub buildings: Vec<Position>,
    pub roundabouts: Vec<Position>,
    pub parking_spots: Vec<(Position, SpotNumber)>,
    pub stoplights: Vec<(Position, LightColor)>,
}

/// One cell of a feature/lane matrix
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Building,
    RoundAbout,
    Light(LightColor),
    Lanes(Vec<Direction>),
    Spot(SpotNumber),
    Unknown(String),
}

fn parse_token(raw: &str) -> Token {
    let token = raw.trim();
    match token {
        "" | "-" | "x" => Token::Open,
        "%" => Token::Building,
        "B" => Token::RoundAbout,
        "G" => Token::Light(LightColor::Green),
        "R" => Token::Light(LightColor::Red),
        _ if token.chars().all(|c| c.is_ascii_digit()) => match token.parse() {
            Ok(number) => Token::Spot(number),
            Err(_) => Token::Unknown(token.to_string()),
        },
        _ => {
            let lanes: Option<Vec<Direction>> = token.chars().map(Direction::from_char).collect();
            match lanes {
                Some(lanes) => Token::Lanes(lanes),
                None => Token::Unknown(token.to_string()),
            }
        }
    }
}

/// Split matrix text into rows, bottom row first
fn rows_bottom_up(text: &str) -> Vec<Vec<&str>> {
    let mut rows: Vec<Vec<&str>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().split(',').collect())
        .collect();
    rows.reverse();
    rows
}

impl WorldLayout {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Read a feature or lane matrix
    ///
    /// Unknown tokens and cells outside the layout are skipped with a warning.
    pub fn read_matrix(&mut self, text: &str) {
        for (y, row) in rows_bottom_up(text).into_iter().enumerate() {
            for (x, raw) in row.into_iter().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let token = parse_token(raw);
                if token == Token::Open {
                    continue;
                }
                if !self.in_bounds(pos) {
                    warn!("Layout token {:?} at {} is outside the grid, skipping", raw, pos);
                    continue;
                }

                match token {
                    Token::Open => {}
                    Token::Building => self.buildings.push(pos),
                    Token::RoundAbout => self.roundabouts.push(pos),
                    Token::Light(color) => self.stoplights.push((pos, color)),
                    Token::Spot(number) => self.add_spot(pos, number),
                    Token::Lanes(lanes) => {
                        self.lanes.extend(lanes.into_iter().map(|lane| (pos, lane)));
                    }
                    Token::Unknown(other) => {
                        warn!("Unknown layout element {:?} at {}", other, pos);
                    }
                }
            }
        }
    }

    /// Read a primary-flow matrix; only direction tokens are meaningful here
    pub fn read_flow(&mut self, text: &str) {
        for (y, row) in rows_bottom_up(text).into_iter().enumerate() {
            for (x, raw) in row.into_iter().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let token = raw.trim();
                if matches!(token, "" | "-" | "x") {
                    continue;
                }

                let mut chars = token.chars();
                let direction = match (chars.next(), chars.next()) {
                    (Some(c), None) => Direction::from_char(c),
                    _ => None,
                };

                match direction {
                    Some(_) if !self.in_bounds(pos) => {
                        warn!("Flow marker at {} is outside the grid, skipping", pos);
                    }
                    Some(direction) => self.flows.push((pos, direction)),
                    None => warn!("Unknown flow element {:?} at {}", token, pos),
                }
            }
        }
    }

    fn add_spot(&mut self, pos: Position, number: SpotNumber) {
        if self.parking_spots.iter().any(|(_, n)| *n == number) {
            warn!("Duplicate parking spot {} at {}, skipping", number, pos);
            return;
        }
        self.parking_spots.push((pos, number));
    }

    /// Read a layout from files on disk
    pub fn from_files<P: AsRef<Path>>(
        width: i32,
        height: i32,
        layout: P,
        directions: &[P],
        flow: Option<P>,
    ) -> Result<Self> {
        let mut world_layout = Self::new(width, height);

        let text = fs::read_to_string(layout.as_ref())
            .with_context(|| format!("Failed to read layout {}", layout.as_ref().display()))?;
        world_layout.read_matrix(&text);

        for path in directions {
            let text = fs::read_to_string(path.as_ref()).with_context(|| {
                format!("Failed to read direction layout {}", path.as_ref().display())
            })?;
            world_layout.read_matrix(&text);
        }

        if let Some(path) = flow {
            let text = fs::read_to_string(path.as_ref())
                .with_context(|| format!("Failed to read flow layout {}", path.as_ref().display()))?;
            world_layout.read_flow(&text);
        }

        debug!(
            "Loaded layout: {} lane markers, {} spots, {} lights",
            world_layout.lanes.len(),
            world_layout.parking_spots.len(),
            world_layout.stoplights.len()
        );
        Ok(world_layout)
    }

    /// Built-in demo city: a one-way counter-clockwise ring around a block
    ///
    /// The ring carries one stoplight. Two lights with opposite phases on a
    /// single loop would leave some trips with no green route at all.
    pub fn demo() -> Self {
        let mut layout = Self::new(7, 5);
        layout.read_matrix(DEMO_FEATURES);
        layout.read_matrix(DEMO_LANES);
        layout.read_flow(DEMO_LANES);
        layout
    }

    /// Positions that carry at least one lane marker
    pub fn road_positions(&self) -> BTreeSet<Position> {
        self.lanes.iter().map(|(pos, _)| *pos).collect()
    }
}

const DEMO_FEATURES: &str = "\
-,6,-,-,3,-,-
-,%,%,%,%,%,-
4,%,%,B,%,%,2
-,%,%,%,%,%,-
-,-,1,G,-,5,-
";

const DEMO_LANES: &str = "\
S,W,W,W,W,W,W
S,-,-,-,-,-,N
S,-,-,-,-,-,N
S,-,-,-,-,-,N
E,E,E,E,E,E,N
";
