//! SimWorld - the roll-a-ball world driven by the trigger core.

use crate::components::{Player, Spin};
use crate::entities::EntityAllocator;
use crate::error::SimError;
use crate::follow::Follower;
use crate::input::{InputCapture, InputMode, InputScript};
use crate::oracle::Oracle;
use crate::physics::{Body, PhysicsWorld};
use crate::systems::{movement_system, pickup_system, rotation_system, CommandBuffer};

use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};
use trigger_core::{FrameReport, StatefulEvent, TriggerConfig, TriggerEventSystem};
use trigger_env::{Entity, EventBuffers};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Pickups placed on the ring by `populate`
    pub pickups: usize,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Maximum simulation duration in seconds
    pub max_duration_secs: f64,

    /// Half width of the square arena in meters
    pub arena_half_extent: f64,

    /// Radius of the pickup ring around the origin
    pub ring_radius: f64,

    /// Standard deviation of the ring radius per pickup
    pub ring_jitter: f64,

    /// Force per unit of input
    pub player_speed: f64,

    pub player_damping: f64,

    /// Scripted input behaviour
    pub input: InputMode,

    /// Standard deviation of the stick wobble
    pub input_noise_std: f64,

    /// Physics reverses the reported pair order on odd steps
    pub flip_pairs: bool,

    pub trigger: TriggerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            pickups: 12,
            tick_rate_hz: 60,
            max_duration_secs: 10.0,
            arena_half_extent: 10.0,
            ring_radius: 4.0,
            ring_jitter: 0.25,
            player_speed: 10.0,
            player_damping: 0.5,
            input: InputMode::Seek {
                max_speed: 4.0,
                slow_radius: 1.5,
            },
            input_noise_std: 0.05,
            flip_pairs: false,
            trigger: TriggerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(|e| SimError::config(e.to_string()))
    }

    /// Loads a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz.max(1) as f64
    }

    /// Number of ticks in `max_duration_secs`.
    pub fn total_ticks(&self) -> u64 {
        (self.max_duration_secs * self.tick_rate_hz as f64) as u64
    }
}

/// What happened during one tick.
#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,

    /// Simulation time at the end of the tick
    pub time: f64,

    pub report: FrameReport,

    /// Pickups scored this tick
    pub collected: usize,

    /// Entities destroyed at the end of the tick
    pub despawned: usize,

    /// First disagreement with the reference model, if any
    pub mismatch: Option<String>,
}

/// Container for the whole simulation.
pub struct SimWorld {
    pub config: SimConfig,

    entities: EntityAllocator,
    physics: PhysicsWorld,
    buffers: EventBuffers<StatefulEvent>,
    triggers: TriggerEventSystem,
    oracle: Oracle,

    players: BTreeMap<Entity, Player>,
    pickups: BTreeSet<Entity>,
    spins: HashMap<Entity, Spin>,
    followers: Vec<Follower>,

    input: InputScript,
    commands: CommandBuffer,

    /// RNG for spawn placement
    rng: ChaCha8Rng,

    tick_count: u64,
    time: f64,
}

impl SimWorld {
    /// Creates an empty world. Call [`populate`](Self::populate) for the
    /// default layout or spawn entities by hand.
    pub fn new(config: SimConfig) -> Self {
        // Separate streams so extra input samples never move spawn points
        let spawn_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let input_seed = config.seed.wrapping_mul(0x517cc1b727220a95);

        let mut physics = PhysicsWorld::new(config.arena_half_extent);
        physics.set_flip_pairs(config.flip_pairs);

        Self {
            entities: EntityAllocator::new(),
            physics,
            buffers: EventBuffers::new(),
            triggers: TriggerEventSystem::new(config.trigger.clone()),
            oracle: Oracle::new(config.trigger.pair_order),
            players: BTreeMap::new(),
            pickups: BTreeSet::new(),
            spins: HashMap::new(),
            followers: Vec::new(),
            input: InputScript::new(config.input, input_seed).with_noise(config.input_noise_std),
            commands: CommandBuffer::new(),
            rng: ChaCha8Rng::seed_from_u64(spawn_seed),
            tick_count: 0,
            time: 0.0,
            config,
        }
    }

    /// Spawns one player at the origin, the pickup ring and a chase camera.
    pub fn populate(&mut self) -> Result<Entity, SimError> {
        let player = self.spawn_player(Vector3::zeros())?;

        let count = self.config.pickups;
        let jitter = Normal::new(0.0, self.config.ring_jitter.max(0.0))
            .map_err(|e| SimError::config(e.to_string()))?;
        for i in 0..count {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            let radius = self.config.ring_radius + jitter.sample(&mut self.rng);
            self.spawn_pickup(Vector3::new(radius * angle.cos(), 0.0, radius * angle.sin()))?;
        }

        self.add_follower(player, Vector3::new(0.0, 10.0, -10.0))?;
        Ok(player)
    }

    /// Spawns an input-driven player with an event buffer.
    pub fn spawn_player(&mut self, position: Vector3<f64>) -> Result<Entity, SimError> {
        let entity = self.entities.spawn();
        self.physics
            .add_body(Body::new(entity, position).with_damping(self.config.player_damping))?;
        self.buffers.register(entity)?;
        self.players.insert(entity, Player::new(self.config.player_speed));
        Ok(entity)
    }

    /// Spawns a static, spinning pickup without a buffer.
    pub fn spawn_pickup(&mut self, position: Vector3<f64>) -> Result<Entity, SimError> {
        let entity = self.entities.spawn();
        self.physics.add_body(Body::new(entity, position).with_mass(0.0))?;
        self.pickups.insert(entity);
        self.spins.insert(entity, Spin::default());
        Ok(entity)
    }

    /// Spawns an arbitrary body, optionally with an event buffer.
    pub fn spawn_body(
        &mut self,
        build: impl FnOnce(Entity) -> Body,
        with_buffer: bool,
    ) -> Result<Entity, SimError> {
        let entity = self.entities.spawn();
        self.physics.add_body(build(entity))?;
        if with_buffer {
            self.buffers.register(entity)?;
        }
        Ok(entity)
    }

    /// Destroys an entity now, outside the tick.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), SimError> {
        self.physics.remove_body(entity)?;
        self.buffers.unregister(entity);
        self.players.remove(&entity);
        self.pickups.remove(&entity);
        self.spins.remove(&entity);
        self.entities.despawn(entity);
        Ok(())
    }

    /// Adds a follower that trails `target` at its current separation.
    pub fn add_follower(&mut self, target: Entity, position: Vector3<f64>) -> Result<(), SimError> {
        let mut follower = Follower::new(target, position);
        follower.sync(&self.physics)?;
        self.followers.push(follower);
        Ok(())
    }

    /// Opts an entity out of trigger processing.
    pub fn exclude(&mut self, entity: Entity) -> Result<(), SimError> {
        Ok(self.buffers.exclude(entity)?)
    }

    /// Reverts [`exclude`](Self::exclude).
    pub fn include(&mut self, entity: Entity) -> Result<(), SimError> {
        Ok(self.buffers.include(entity)?)
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input.set_mode(mode);
    }

    /// Nearest remaining pickup to `position`.
    fn nearest_pickup(&self, position: Vector3<f64>) -> Option<Vector3<f64>> {
        self.pickups
            .iter()
            .filter_map(|p| self.physics.body(*p))
            .map(|b| b.position)
            .min_by(|a, b| (a - position).norm_squared().total_cmp(&(b - position).norm_squared()))
    }

    fn sample_input(&mut self) -> InputCapture {
        let Some(lead) = self.players.keys().next().copied() else {
            return InputCapture::default();
        };
        let Some((position, velocity)) = self.physics.body(lead).map(|b| (b.position, b.velocity)) else {
            return InputCapture::default();
        };
        let target = self.nearest_pickup(position);
        self.input.next(position, velocity, target)
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) -> Result<TickSummary, SimError> {
        let dt = self.config.dt();

        let input = self.sample_input();
        movement_system(&mut self.physics, &self.players, input, dt)?;
        self.physics.step(dt);

        let expectation = self.oracle.expect(&self.physics);
        let report = self.triggers.update(&self.physics, &self.buffers)?;
        let mut mismatch = None;
        if !report.skipped {
            if let Err(reason) = Oracle::verify(&expectation, self.triggers.result()) {
                warn!("Tick {}: trigger output disagrees with reference: {}", self.tick_count + 1, reason);
                mismatch = Some(reason);
            }
            self.oracle.commit(expectation);
        }

        let collected = pickup_system(&mut self.players, &self.pickups, &self.buffers, &mut self.commands)?;
        rotation_system(&mut self.physics, &self.spins, dt);

        let despawns = self.commands.take_despawns();
        let despawned = despawns.len();
        for entity in despawns {
            self.despawn(entity)?;
        }

        for follower in &mut self.followers {
            follower.sync(&self.physics)?;
        }

        self.tick_count += 1;
        self.time += dt;

        if collected > 0 {
            debug!("Tick {}: {} pickup(s) collected, score {}", self.tick_count, collected, self.score());
        }

        Ok(TickSummary {
            tick: self.tick_count,
            time: self.time,
            report,
            collected,
            despawned,
            mismatch,
        })
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Sum of all player scores.
    pub fn score(&self) -> u32 {
        self.players.values().map(|p| p.count).sum()
    }

    pub fn player(&self, entity: Entity) -> Option<&Player> {
        self.players.get(&entity)
    }

    pub fn pickups_remaining(&self) -> usize {
        self.pickups.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn buffers(&self) -> &EventBuffers<StatefulEvent> {
        &self.buffers
    }

    pub fn triggers(&self) -> &TriggerEventSystem {
        &self.triggers
    }

    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }
}
