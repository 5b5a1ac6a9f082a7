//! Stoplight timing for the traffic simulation
//!
//! Each light counts ticks and changes color only on fixed cycle boundaries.

use super::types::{
    LightClass, LightColor, Position, StoplightId, LIGHT_CYCLE_TICKS, YELLOW_LEAD_TICKS,
};

/// A stoplight sitting on one grid cell
#[derive(Debug, Clone)]
pub struct SimStoplight {
    pub id: StoplightId,
    pub position: Position,
    color: LightColor,
    /// Ticks elapsed since the light was created
    counter: u32,
    /// Derived once from the initial color
    class: LightClass,
}

impl SimStoplight {
    pub fn new(id: StoplightId, position: Position, initial_color: LightColor) -> Self {
        Self {
            id,
            position,
            color: initial_color,
            counter: 0,
            class: LightClass::from_initial_color(initial_color),
        }
    }

    /// A light resumed partway through its count
    ///
    /// The class still comes from `color`, as if it were the starting color.
    pub fn with_counter(
        id: StoplightId,
        position: Position,
        color: LightColor,
        counter: u32,
    ) -> Self {
        Self {
            counter,
            ..Self::new(id, position, color)
        }
    }

    pub fn color(&self) -> LightColor {
        self.color
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn class(&self) -> LightClass {
        self.class
    }

    /// Advance one tick and apply the transition rule
    ///
    /// Rules are checked in order after the counter is bumped:
    /// green turns yellow two ticks before a cycle boundary, green or yellow
    /// turn red on the boundary, and red turns green on the boundary.
    pub fn tick(&mut self) {
        self.counter = self.counter.wrapping_add(1);

        let at_boundary = self.counter % LIGHT_CYCLE_TICKS == 0;
        let before_boundary = (self.counter + YELLOW_LEAD_TICKS) % LIGHT_CYCLE_TICKS == 0;

        self.color = match self.color {
            LightColor::Green if before_boundary => LightColor::Yellow,
            LightColor::Green | LightColor::Yellow if at_boundary => LightColor::Red,
            LightColor::Red if at_boundary => LightColor::Green,
            unchanged => unchanged,
        };
    }
}
