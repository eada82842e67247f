//! Gameplay systems that consume the trigger output.
//!
//! Run order inside a tick is fixed by [`SimWorld::tick`](crate::SimWorld::tick):
//! movement, physics, triggers, pickup, rotation, then deferred commands.

use crate::components::{Player, Spin};
use crate::error::SimError;
use crate::input::InputCapture;
use crate::physics::PhysicsWorld;
use nalgebra::UnitQuaternion;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use trigger_core::{OverlapState, StatefulEvent};
use trigger_env::{Entity, EventBuffers};

/// Structural changes deferred to the end of the tick.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    despawn: BTreeSet<Entity>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `entity` for destruction. Returns false if already queued.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.despawn.insert(entity)
    }

    pub fn is_queued(&self, entity: Entity) -> bool {
        self.despawn.contains(&entity)
    }

    pub fn is_empty(&self) -> bool {
        self.despawn.is_empty()
    }

    /// Takes the queued entities in ascending order.
    pub fn take_despawns(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.despawn).into_iter().collect()
    }
}

/// Pushes every player with a force of `speed * (x, 0, y)`.
pub fn movement_system(
    physics: &mut PhysicsWorld,
    players: &BTreeMap<Entity, Player>,
    input: InputCapture,
    dt: f64,
) -> Result<(), SimError> {
    let direction = input.planar();
    for (entity, player) in players {
        physics.apply_force(*entity, direction * player.speed, dt)?;
    }
    Ok(())
}

/// Rotates every spinning body by its Euler rate.
pub fn rotation_system(physics: &mut PhysicsWorld, spins: &HashMap<Entity, Spin>, dt: f64) {
    physics.bodies_mut().par_iter_mut().for_each(|body| {
        if let Some(spin) = spins.get(&body.entity) {
            let angles = spin.euler * spin.speed * dt;
            body.rotation *= UnitQuaternion::from_euler_angles(angles.x, angles.y, angles.z);
        }
    });
}

/// Scores pickups touched this frame.
///
/// Reads each player's trigger buffer; every `Enter` against a pickup adds
/// one to the score and queues the pickup for destruction. A pickup entered
/// by two players in the same frame goes to the one with the lower id.
/// Returns the number of pickups collected.
pub fn pickup_system(
    players: &mut BTreeMap<Entity, Player>,
    pickups: &BTreeSet<Entity>,
    buffers: &EventBuffers<StatefulEvent>,
    commands: &mut CommandBuffer,
) -> Result<usize, SimError> {
    let mut collected = 0;
    for (entity, player) in players.iter_mut() {
        if buffers.is_excluded(*entity) {
            continue;
        }
        let entered = buffers.with_events(*entity, |events| {
            events
                .iter()
                .filter(|e| e.state == OverlapState::Enter)
                .map(|e| e.other(*entity))
                .collect::<Result<Vec<Entity>, _>>()
        })??;

        for other in entered {
            if pickups.contains(&other) && commands.despawn(other) {
                player.count += 1;
                collected += 1;
            }
        }
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Body;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use trigger_env::{EventBufferStore, RawOverlap};

    fn e(index: u32) -> Entity {
        Entity::new(index, 1)
    }

    fn enter(a: Entity, b: Entity) -> StatefulEvent {
        StatefulEvent::from_raw(RawOverlap::between(a, b))
    }

    #[test]
    fn test_movement_applies_speed_scaled_force() {
        let mut physics = PhysicsWorld::new(0.0);
        physics.add_body(Body::new(e(0), Vector3::zeros())).unwrap();
        let players = BTreeMap::from([(e(0), Player::new(10.0))]);

        movement_system(&mut physics, &players, InputCapture::new(1.0, -0.5), 0.1).unwrap();

        let v = physics.body(e(0)).unwrap().velocity;
        assert_relative_eq!(v, Vector3::new(1.0, 0.0, -0.5));
    }

    #[test]
    fn test_movement_requires_body() {
        let mut physics = PhysicsWorld::new(0.0);
        let players = BTreeMap::from([(e(0), Player::new(10.0))]);
        let err = movement_system(&mut physics, &players, InputCapture::new(1.0, 0.0), 0.1);
        assert!(matches!(err, Err(SimError::MissingBody(_))));
    }

    #[test]
    fn test_rotation_only_touches_spinners() {
        let mut physics = PhysicsWorld::new(0.0);
        physics.add_body(Body::new(e(0), Vector3::zeros())).unwrap();
        physics.add_body(Body::new(e(1), Vector3::zeros())).unwrap();
        let spins = HashMap::from([(
            e(0),
            Spin {
                euler: Vector3::new(0.0, 0.0, 1.0),
                speed: 2.0,
            },
        )]);

        rotation_system(&mut physics, &spins, 0.25);

        assert_relative_eq!(physics.body(e(0)).unwrap().rotation.angle(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(physics.body(e(1)).unwrap().rotation.angle(), 0.0);
    }

    #[test]
    fn test_pickup_scores_enter_only() {
        let player = e(0);
        let pickup = e(1);
        let wall = e(2);
        let mut buffers: EventBuffers<StatefulEvent> = EventBuffers::new();
        buffers.register(player).unwrap();
        buffers.append(player, enter(player, pickup));
        buffers.append(player, enter(wall, player));
        buffers.append(player, enter(player, e(3)).with_state(OverlapState::Stay));

        let mut players = BTreeMap::from([(player, Player::new(1.0))]);
        let pickups = BTreeSet::from([pickup, e(3)]);
        let mut commands = CommandBuffer::new();

        let collected = pickup_system(&mut players, &pickups, &buffers, &mut commands).unwrap();

        assert_eq!(collected, 1);
        assert_eq!(players[&player].count, 1);
        assert_eq!(commands.take_despawns(), vec![pickup]);
    }

    #[test]
    fn test_shared_pickup_counted_once() {
        let pickup = e(9);
        let mut buffers: EventBuffers<StatefulEvent> = EventBuffers::new();
        buffers.register(e(0)).unwrap();
        buffers.register(e(1)).unwrap();
        buffers.append(e(0), enter(e(0), pickup));
        buffers.append(e(1), enter(e(1), pickup));

        let mut players = BTreeMap::from([(e(0), Player::new(1.0)), (e(1), Player::new(1.0))]);
        let mut commands = CommandBuffer::new();

        let collected =
            pickup_system(&mut players, &BTreeSet::from([pickup]), &buffers, &mut commands).unwrap();

        assert_eq!(collected, 1);
        assert_eq!(players[&e(0)].count, 1);
        assert_eq!(players[&e(1)].count, 0);
    }

    #[test]
    fn test_player_without_buffer_is_an_error() {
        let buffers: EventBuffers<StatefulEvent> = EventBuffers::new();
        let mut players = BTreeMap::from([(e(0), Player::new(1.0))]);
        let result = pickup_system(&mut players, &BTreeSet::new(), &buffers, &mut CommandBuffer::new());
        assert!(matches!(result, Err(SimError::Env(_))));
    }
}
