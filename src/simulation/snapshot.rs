//! Between-tick state published to outside consumers

use anyhow::{Context, Result};
use serde::Serialize;

use super::types::{LightClass, LightColor};

/// One active car as seen from outside
///
/// Grid `y` is reported as `z`, the ground axis of a 3D scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarSnapshot {
    pub id: usize,
    pub x: i32,
    pub z: i32,
    pub dir_x: i32,
    pub dir_z: i32,
}

/// A light phase currently shown somewhere in the city
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LightSnapshot {
    pub class: LightClass,
    pub color: LightColor,
}

/// Committed world state after a tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub cars: Vec<CarSnapshot>,
    /// Distinct (class, color) pairs, sorted
    pub lights: Vec<LightSnapshot>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize snapshot")
    }
}
