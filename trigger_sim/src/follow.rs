//! Objects that trail another entity at a fixed offset.

use crate::error::SimError;
use crate::physics::PhysicsWorld;
use nalgebra::Vector3;
use trigger_env::Entity;

/// Keeps a fixed offset from a followed body, like a chase camera.
///
/// The offset is whatever separated the two on the first sync.
#[derive(Debug, Clone)]
pub struct Follower {
    pub target: Entity,
    pub position: Vector3<f64>,
    offset: Option<Vector3<f64>>,
}

impl Follower {
    pub fn new(target: Entity, position: Vector3<f64>) -> Self {
        Self {
            target,
            position,
            offset: None,
        }
    }

    /// Captured offset, if synced at least once.
    pub fn offset(&self) -> Option<Vector3<f64>> {
        self.offset
    }

    /// Moves to the target's position plus the offset.
    pub fn sync(&mut self, physics: &PhysicsWorld) -> Result<(), SimError> {
        let body = physics
            .body(self.target)
            .ok_or(SimError::MissingBody(self.target))?;
        let position = self.position;
        let offset = *self.offset.get_or_insert_with(|| position - body.position);
        self.position = body.position + offset;
        Ok(())
    }
}
