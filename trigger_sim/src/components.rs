//! Gameplay components attached to simulated entities.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A ball driven by input that collects pickups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Force per unit of input, in newtons
    pub speed: f64,

    /// Pickups collected so far
    pub count: u32,
}

impl Player {
    pub fn new(speed: f64) -> Self {
        Self { speed, count: 0 }
    }
}

/// Constant rotation, applied every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    /// Euler angles (roll, pitch, yaw) in radians per unit of speed
    pub euler: Vector3<f64>,

    pub speed: f64,
}

impl Default for Spin {
    /// Tumbles about all three axes at different rates.
    fn default() -> Self {
        Self {
            euler: Vector3::new(15.0, 30.0, 45.0).map(f64::to_radians),
            speed: 1.0,
        }
    }
}
