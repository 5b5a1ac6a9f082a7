//! The fixed-size city grid
//!
//! Every cell keeps a list of occupants. Static features (roads, buildings,
//! parking spots, roundabouts, stoplights) are placed once at load time;
//! cars are the only occupants that move.

use anyhow::{bail, Context, Result};

use super::types::{CarId, LightColor, Position, SpotNumber, StoplightId};

/// Anything that can sit in a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Road,
    Building,
    ParkingSpot(SpotNumber),
    RoundAbout,
    Stoplight(StoplightId),
    Car(CarId),
}

/// What an occupant means for a car wanting to enter its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passage {
    /// Cell can never be entered while this occupant is there
    Blocked,
    /// Entry forbidden for now (red light); the car stops running
    Stop,
    /// Entry allowed; the car is running on a road
    Go,
    /// Occupant has no say in passability
    Neutral,
}

impl Occupant {
    /// Permanently or physically blocks entry into its cell
    pub fn blocks_traffic(&self) -> bool {
        matches!(
            self,
            Occupant::Car(_) | Occupant::Building | Occupant::RoundAbout
        )
    }

    /// Passage granted by this occupant
    ///
    /// `light` is the current color when the occupant is a stoplight and is
    /// ignored otherwise.
    pub fn grants_passage(&self, light: Option<LightColor>) -> Passage {
        if self.blocks_traffic() {
            return Passage::Blocked;
        }
        match self {
            Occupant::Stoplight(_) => match light {
                Some(color) if !color.allows_passage() => Passage::Stop,
                _ => Passage::Go,
            },
            Occupant::Road => Passage::Go,
            _ => Passage::Neutral,
        }
    }

    pub fn car_id(&self) -> Option<CarId> {
        match self {
            Occupant::Car(id) => Some(*id),
            _ => None,
        }
    }
}

/// Fixed-size 2D grid of occupant lists
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Occupant>>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![Vec::new(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_within_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.is_within_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Occupants of a cell; empty for out-of-bounds positions
    pub fn occupants_at(&self, pos: Position) -> &[Occupant] {
        match self.index(pos) {
            Some(index) => &self.cells[index],
            None => &[],
        }
    }

    pub fn contains(&self, pos: Position, occupant: Occupant) -> bool {
        self.occupants_at(pos).contains(&occupant)
    }

    /// The car parked or driving on a cell, if any
    pub fn car_at(&self, pos: Position) -> Option<CarId> {
        self.occupants_at(pos).iter().find_map(Occupant::car_id)
    }

    pub fn is_cell_empty(&self, pos: Position) -> bool {
        self.occupants_at(pos).is_empty()
    }

    pub fn place(&mut self, occupant: Occupant, pos: Position) -> Result<()> {
        let index = self
            .index(pos)
            .with_context(|| format!("Cannot place {:?} outside the grid at {}", occupant, pos))?;
        self.cells[index].push(occupant);
        Ok(())
    }

    pub fn remove(&mut self, occupant: Occupant, pos: Position) -> Result<()> {
        let index = self
            .index(pos)
            .with_context(|| format!("Position {} is outside the grid", pos))?;
        let cell = &mut self.cells[index];
        match cell.iter().position(|o| *o == occupant) {
            Some(slot) => {
                cell.remove(slot);
                Ok(())
            }
            None => bail!("{:?} not found at {}", occupant, pos),
        }
    }

    pub fn move_occupant(&mut self, occupant: Occupant, from: Position, to: Position) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if !self.is_within_bounds(to) {
            bail!("Cannot move {:?} out of the grid to {}", occupant, to);
        }
        self.remove(occupant, from)?;
        self.place(occupant, to)
    }
}
