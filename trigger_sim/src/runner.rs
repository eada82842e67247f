//! Scenario runner - executes trigger scenarios against the reference model.
//!
//! Every tick of every scenario is checked against the brute-force
//! [`Oracle`](crate::oracle::Oracle); on top of that each scenario asserts
//! the behaviour it was built to exercise.

use crate::error::SimError;
use crate::exporter::{SimExport, SimFrame};
use crate::input::InputMode;
use crate::physics::Body;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld, TickSummary};

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trigger_core::{DistributionMode, OverlapState, PairOrder, StatefulEvent, TriggerConfig};
use trigger_env::{Entity, EnvError, EventBufferStore};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Number of live entities at end
    pub final_entity_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Trigger frames skipped for lack of buffers
    pub frames_skipped: u64,

    pub enter: u64,
    pub stay: u64,
    pub exit: u64,

    /// Buffer appends by the fan-out
    pub appended: u64,

    /// Repeated overlaps collapsed by the sort
    pub duplicates: u64,

    pub pickups_collected: u64,

    pub despawned: u64,

    /// Frames that disagreed with the reference model
    pub oracle_mismatches: u64,
}

/// Why a scenario did not pass.
enum Failure {
    Error(SimError),
    Assertion(String),
}

impl From<SimError> for Failure {
    fn from(err: SimError) -> Self {
        Failure::Error(err)
    }
}

impl From<EnvError> for Failure {
    fn from(err: EnvError) -> Self {
        Failure::Error(err.into())
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), Failure> {
    if condition {
        Ok(())
    } else {
        Err(Failure::Assertion(message()))
    }
}

/// Bookkeeping shared by all scenarios.
struct Session {
    metrics: ScenarioMetrics,
    export: Option<SimExport>,
    first_mismatch: Option<String>,
    ticks: u64,
    time: f64,
    entity_count: usize,
}

impl Session {
    fn new(export: Option<SimExport>) -> Self {
        Self {
            metrics: ScenarioMetrics::default(),
            export,
            first_mismatch: None,
            ticks: 0,
            time: 0.0,
            entity_count: 0,
        }
    }

    /// Ticks `world` once and folds the outcome into the metrics.
    fn tick(&mut self, world: &mut SimWorld) -> Result<TickSummary, SimError> {
        let summary = world.tick()?;
        let report = &summary.report;
        let m = &mut self.metrics;

        if report.skipped {
            m.frames_skipped += 1;
        }
        m.enter += report.enter as u64;
        m.stay += report.stay as u64;
        m.exit += report.exit as u64;
        m.appended += report.appended as u64;
        m.duplicates += report.duplicates as u64;
        m.pickups_collected += summary.collected as u64;
        m.despawned += summary.despawned as u64;

        if let Some(reason) = &summary.mismatch {
            m.oracle_mismatches += 1;
            self.first_mismatch.get_or_insert_with(|| reason.clone());
        }

        if let Some(export) = &mut self.export {
            export.add_frame(SimFrame::capture(world, &summary));
        }

        self.ticks = summary.tick;
        self.time = summary.time;
        self.entity_count = world.entity_count();

        if summary.tick % 60 == 0 {
            debug!(
                "  t={:.1}s | entities={} | score={} | events={}",
                summary.time,
                self.entity_count,
                world.score(),
                report.total()
            );
        }

        Ok(summary)
    }
}

/// Runs trigger scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Base configuration; scenarios override what they need
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: SimConfig::default(),
        }
    }

    /// Replaces the base configuration. The runner's seed still wins.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.max_duration_secs = secs;
        self
    }

    /// Sets the trigger core configuration.
    pub fn with_trigger_config(mut self, trigger: TriggerConfig) -> Self {
        self.config.trigger = trigger;
        self
    }

    fn base_config(&self) -> SimConfig {
        SimConfig {
            seed: self.seed,
            ..self.config.clone()
        }
    }

    /// Configuration for scenarios that script their own bodies.
    fn still_config(&self) -> SimConfig {
        SimConfig {
            input: InputMode::Idle,
            input_noise_std: 0.0,
            pickups: 0,
            ..self.base_config()
        }
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None).0
    }

    /// Runs a scenario and records every frame.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let export = SimExport::new(scenario.name(), self.seed);
        let (result, export) = self.execute(scenario, Some(export));
        let mut export = export.unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, export: Option<SimExport>) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut session = Session::new(export);
        let outcome = match scenario {
            ScenarioId::PickupRun => self.run_pickup_run(&mut session),
            ScenarioId::RestingContact => self.run_resting_contact(&mut session),
            ScenarioId::EmptyFrames => self.run_empty_frames(&mut session),
            ScenarioId::FlippedPairs => self.run_flipped_pairs(&mut session),
            ScenarioId::ExcludedEntities => self.run_excluded_entities(&mut session),
            ScenarioId::Crowd => self.run_crowd(&mut session),
        };

        let failure_reason = match outcome {
            Err(Failure::Error(err)) => Some(format!("simulation error: {}", err)),
            _ if session.metrics.oracle_mismatches > 0 => Some(format!(
                "{} frame(s) disagree with the reference model, first: {}",
                session.metrics.oracle_mismatches,
                session.first_mismatch.as_deref().unwrap_or("unknown")
            )),
            Err(Failure::Assertion(reason)) => Some(reason),
            Ok(()) => None,
        };

        if let Some(reason) = &failure_reason {
            warn!("{} failed after {} ticks: {}", scenario.name(), session.ticks, reason);
        }

        let result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            total_ticks: session.ticks,
            final_time_secs: session.time,
            final_entity_count: session.entity_count,
            failure_reason,
            metrics: session.metrics,
        };
        (result, session.export)
    }

    /// TRG-001: PickupRun - roll-a-ball pickup collection.
    ///
    /// **Assertion**: at least one pickup collected, score equals pickups
    /// destroyed, nothing scored twice.
    fn run_pickup_run(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-001: PickupRun - scoring on Enter");

        let config = self.base_config();
        let ticks = config.total_ticks();
        let total = config.pickups;
        let mut world = SimWorld::new(config);
        let player = world.populate()?;

        for _ in 0..ticks {
            session.tick(&mut world)?;
        }

        let score = world.player(player).map(|p| p.count).unwrap_or(0);
        info!("Collected {}/{} pickups in {:.1}s", score, total, world.time());

        ensure(score > 0, || "no pickup collected".to_string())?;
        ensure(score as u64 == session.metrics.pickups_collected, || {
            format!("score {} but {} collections", score, session.metrics.pickups_collected)
        })?;
        ensure(session.metrics.despawned == session.metrics.pickups_collected, || {
            format!(
                "{} pickups destroyed for {} collections",
                session.metrics.despawned, session.metrics.pickups_collected
            )
        })?;
        ensure(world.pickups_remaining() + score as usize == total, || {
            format!("{} remaining + {} scored != {}", world.pickups_remaining(), score, total)
        })
    }

    /// TRG-002: RestingContact - one Enter, then only Stay.
    fn run_resting_contact(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-002: RestingContact - persistent overlap");

        let config = self.still_config();
        let ticks = config.total_ticks().max(2);
        let mut world = SimWorld::new(config);
        let player = world.spawn_player(Vector3::zeros())?;
        world.spawn_body(|e| Body::new(e, Vector3::new(0.8, 0.0, 0.0)).with_mass(0.0), false)?;

        for _ in 0..ticks {
            session.tick(&mut world)?;
        }

        let m = &session.metrics;
        ensure(m.enter == 1 && m.exit == 0, || {
            format!("expected 1 enter / 0 exit, got {} / {}", m.enter, m.exit)
        })?;
        ensure(m.stay == ticks - 1, || format!("expected {} stays, got {}", ticks - 1, m.stay))?;
        ensure(m.appended == ticks, || format!("expected {} appends, got {}", ticks, m.appended))?;

        let last = world.buffers().events(player)?;
        ensure(last.len() == 1 && last[0].state == OverlapState::Stay, || {
            format!("player buffer ends with {:?}", last.iter().map(|e| e.state).collect::<Vec<_>>())
        })
    }

    /// TRG-003: EmptyFrames - a contact exits exactly once.
    ///
    /// The player rolls away from a wall; after the single Exit every frame
    /// must be empty.
    fn run_empty_frames(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-003: EmptyFrames - exit once, then nothing");

        let config = SimConfig {
            input: InputMode::Constant { x: -1.0, y: 0.0 },
            // No walls, so the player never rolls back
            arena_half_extent: 0.0,
            ..self.still_config()
        };
        let ticks = config.total_ticks().max(60);
        let mut world = SimWorld::new(config);
        let player = world.spawn_player(Vector3::zeros())?;
        world.spawn_body(|e| Body::new(e, Vector3::new(0.8, 0.0, 0.0)).with_mass(0.0), false)?;

        let mut exited_at = None;
        let mut empty_after = 0u64;
        for _ in 0..ticks {
            let summary = session.tick(&mut world)?;
            let report = &summary.report;
            match exited_at {
                None if report.exit > 0 => exited_at = Some(summary.tick),
                None => {}
                Some(at) => {
                    ensure(report.total() == 0 && report.appended == 0, || {
                        format!("tick {} produced {} events after exit at {}", summary.tick, report.total(), at)
                    })?;
                    empty_after += 1;
                }
            }
        }

        let m = &session.metrics;
        ensure(m.enter == 1 && m.exit == 1, || {
            format!("expected 1 enter / 1 exit, got {} / {}", m.enter, m.exit)
        })?;
        ensure(empty_after > 0, || "contact never ended".to_string())?;
        ensure(world.buffers().events(player)?.is_empty(), || {
            "player buffer not cleared".to_string()
        })
    }

    /// TRG-004: FlippedPairs - pair order reversed every step.
    ///
    /// With canonical ordering the contact must read as Stay; with reported
    /// ordering the same contact churns through Exit and Enter.
    fn run_flipped_pairs(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-004: FlippedPairs - canonical pair order");

        let ticks = self.still_config().total_ticks().max(3);
        let build = |pair_order: PairOrder| -> Result<SimWorld, SimError> {
            let base = self.still_config();
            let config = SimConfig {
                flip_pairs: true,
                trigger: base.trigger.clone().with_pair_order(pair_order),
                ..base
            };
            let mut world = SimWorld::new(config);
            world.spawn_player(Vector3::zeros())?;
            world.spawn_body(|e| Body::new(e, Vector3::new(0.8, 0.0, 0.0)).with_mass(0.0), false)?;
            Ok(world)
        };

        let mut canonical = build(PairOrder::Canonical)?;
        for _ in 0..ticks {
            session.tick(&mut canonical)?;
        }

        let mut reported = build(PairOrder::AsReported)?;
        let mut churn = 0;
        for _ in 0..ticks {
            churn += reported.tick()?.report.exit;
        }
        info!("Reported order churned {} exits over {} ticks", churn, ticks);

        let m = &session.metrics;
        ensure(m.enter == 1 && m.exit == 0 && m.stay == ticks - 1, || {
            format!("canonical order: {} enter / {} stay / {} exit", m.enter, m.stay, m.exit)
        })?;
        ensure(churn as u64 == ticks - 1, || {
            format!("flip mode produced {} exits over {} ticks", churn, ticks)
        })
    }

    /// TRG-005: ExcludedEntities - opted-out buffers.
    ///
    /// Two touching players; the second opts out for the whole run. The
    /// first opts out for the middle third, which skips those frames
    /// entirely, and the contact then resumes as Stay.
    fn run_excluded_entities(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-005: ExcludedEntities - exclusion markers");

        let config = self.still_config();
        let ticks = config.total_ticks().max(9);
        let third = ticks / 3;
        let mut world = SimWorld::new(config);
        let first = world.spawn_player(Vector3::zeros())?;
        let second = world.spawn_player(Vector3::new(0.6, 0.0, 0.0))?;
        world.exclude(second)?;

        for tick in 0..ticks {
            if tick == third {
                world.exclude(first)?;
            } else if tick == 2 * third {
                world.include(first)?;
            }
            session.tick(&mut world)?;
        }

        let m = &session.metrics;
        ensure(m.frames_skipped == third, || {
            format!("expected {} skipped frames, got {}", third, m.frames_skipped)
        })?;
        ensure(m.enter == 1 && m.exit == 0, || {
            format!("expected 1 enter / 0 exit, got {} / {}", m.enter, m.exit)
        })?;
        ensure(world.buffers().events(second)?.is_empty(), || {
            "excluded player received events".to_string()
        })?;
        let last = world.buffers().events(first)?;
        ensure(last.len() == 1 && last[0].state == OverlapState::Stay, || {
            "contact did not resume as Stay".to_string()
        })
    }

    /// TRG-006: Crowd - many buffered bodies, parallel fan-out, recycling.
    ///
    /// **Assertion**: every frame appends exactly one copy per registered
    /// participant, and every buffer only holds events it takes part in.
    fn run_crowd(&self, session: &mut Session) -> Result<(), Failure> {
        info!("TRG-006: Crowd - parallel fan-out under churn");

        let base = self.still_config();
        let threshold = base.trigger.parallel_threshold.min(32);
        let config = SimConfig {
            trigger: base
                .trigger
                .clone()
                .with_distribution(DistributionMode::Parallel)
                .with_parallel_threshold(threshold),
            ..base
        };
        let ticks = config.total_ticks();
        let extent = config.arena_half_extent.max(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_mul(0x2545f4914f6cdd1d));
        let speed = Normal::new(0.0, 2.0).map_err(|e| SimError::config(e.to_string()))?;
        let mut world = SimWorld::new(config);

        let spawn = |world: &mut SimWorld, rng: &mut ChaCha8Rng, n: usize| -> Result<Entity, SimError> {
            let position = Vector3::new(rng.gen_range(-extent..extent), 0.0, rng.gen_range(-extent..extent));
            let velocity = Vector3::new(speed.sample(rng), 0.0, speed.sample(rng));
            world.spawn_body(
                |e| {
                    let body = Body::new(e, position).with_velocity(velocity);
                    if n % 10 == 0 {
                        body.with_compound(&[(Vector3::new(-0.4, 0.0, 0.0), 0.4), (Vector3::new(0.4, 0.0, 0.0), 0.4)])
                    } else {
                        body
                    }
                },
                true,
            )
        };

        let mut crowd = Vec::with_capacity(200);
        for n in 0..200 {
            crowd.push(spawn(&mut world, &mut rng, n)?);
        }

        for tick in 0..ticks {
            if tick > 0 && tick % 30 == 0 {
                for _ in 0..5 {
                    let victim = crowd.remove(rng.gen_range(0..crowd.len()));
                    world.despawn(victim)?;
                }
                for n in 0..5 {
                    crowd.push(spawn(&mut world, &mut rng, n)?);
                }
            }

            let summary = session.tick(&mut world)?;
            let expected = expected_appends(world.triggers().result(), world.buffers());
            ensure(summary.report.appended == expected, || {
                format!(
                    "tick {}: {} appends for {} registered participants",
                    summary.tick, summary.report.appended, expected
                )
            })?;
        }

        for entity in &crowd {
            let foreign = world
                .buffers()
                .with_events(*entity, |events| events.iter().filter(|e| !e.involves(*entity)).count())?;
            ensure(foreign == 0, || format!("{} holds {} foreign events", entity, foreign))?;
        }
        ensure(session.metrics.enter > 0, || "crowd never touched".to_string())
    }
}

/// Appends a correct fan-out performs for `result`.
fn expected_appends<S>(result: &[StatefulEvent], store: &S) -> usize
where
    S: EventBufferStore<StatefulEvent>,
{
    let registered = store.registered_entities();
    let has = |e: Entity| registered.binary_search(&e).is_ok();
    result
        .iter()
        .map(|e| has(e.entity_a) as usize + has(e.entity_b) as usize)
        .sum()
}
