//! Scripted movement input.
//!
//! Stands in for a gamepad: produces a 2D stick value per tick from a
//! seeded script, so every run with the same seed moves identically.

use nalgebra::{Vector2, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Stick value for one tick, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputCapture {
    pub x: f64,
    pub y: f64,
}

impl InputCapture {
    /// Clamps each axis into range.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
        }
    }

    /// The input as a world-space direction on the ground plane.
    pub fn planar(&self) -> Vector3<f64> {
        Vector3::new(self.x, 0.0, self.y)
    }
}

/// What the script does with the stick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Stick released
    Idle,

    /// Stick held at a fixed value
    Constant { x: f64, y: f64 },

    /// Steer toward a target, slowing down on arrival
    Seek {
        /// Desired top speed in m/s
        max_speed: f64,

        /// Distance at which to start braking
        slow_radius: f64,
    },
}

/// Seeded input generator.
#[derive(Debug, Clone)]
pub struct InputScript {
    mode: InputMode,
    rng: ChaCha8Rng,
    noise: Option<Normal<f64>>,
}

impl InputScript {
    /// Creates a script without noise.
    pub fn new(mode: InputMode, seed: u64) -> Self {
        Self {
            mode,
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise: None,
        }
    }

    /// Adds Gaussian wobble to every axis. Non-positive values disable it.
    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise = Normal::new(0.0, std_dev).ok().filter(|_| std_dev > 0.0);
        self
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Produces the stick value for one tick.
    ///
    /// `position` and `velocity` describe the controlled body; `target` is
    /// only used in seek mode, where no target means the stick is released.
    pub fn next(
        &mut self,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        target: Option<Vector3<f64>>,
    ) -> InputCapture {
        let raw = match (self.mode, target) {
            (InputMode::Idle, _) | (InputMode::Seek { .. }, None) => return InputCapture::default(),
            (InputMode::Constant { x, y }, _) => Vector2::new(x, y),
            (InputMode::Seek { max_speed, slow_radius }, Some(target)) => {
                let to_target = Vector2::new(target.x - position.x, target.z - position.z);
                let distance = to_target.norm();
                let desired = if distance > f64::EPSILON {
                    let ramp = if slow_radius > 0.0 { (distance / slow_radius).min(1.0) } else { 1.0 };
                    to_target / distance * max_speed * ramp
                } else {
                    Vector2::zeros()
                };
                desired - Vector2::new(velocity.x, velocity.z)
            }
        };

        let wobble = match &self.noise {
            Some(noise) => Vector2::new(noise.sample(&mut self.rng), noise.sample(&mut self.rng)),
            None => Vector2::zeros(),
        };
        let value = raw + wobble;
        InputCapture::new(value.x, value.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_capture_is_clamped() {
        let input = InputCapture::new(3.0, -2.0);
        assert_eq!(input, InputCapture { x: 1.0, y: -1.0 });
        assert_eq!(input.planar(), Vector3::new(1.0, 0.0, -1.0));
    }

    #[test]
    fn test_constant_without_noise() {
        let mut script = InputScript::new(InputMode::Constant { x: 0.5, y: 0.0 }, 1);
        let input = script.next(Vector3::zeros(), Vector3::zeros(), None);
        assert_relative_eq!(input.x, 0.5);
        assert_relative_eq!(input.y, 0.0);
    }

    #[test]
    fn test_seek_points_at_target() {
        let mut script = InputScript::new(
            InputMode::Seek {
                max_speed: 4.0,
                slow_radius: 1.0,
            },
            1,
        );
        let input = script.next(Vector3::zeros(), Vector3::zeros(), Some(Vector3::new(0.0, 0.0, 10.0)));
        assert_relative_eq!(input.x, 0.0);
        assert_relative_eq!(input.y, 1.0);

        let released = script.next(Vector3::zeros(), Vector3::zeros(), None);
        assert_eq!(released, InputCapture::default());
    }

    #[test]
    fn test_same_seed_same_wobble() {
        let mode = InputMode::Constant { x: 0.0, y: 0.0 };
        let mut a = InputScript::new(mode, 9).with_noise(0.1);
        let mut b = InputScript::new(mode, 9).with_noise(0.1);
        for _ in 0..16 {
            let pa = a.next(Vector3::zeros(), Vector3::zeros(), None);
            let pb = b.next(Vector3::zeros(), Vector3::zeros(), None);
            assert_eq!(pa, pb);
        }
    }
}
