//! JSON exporter for offline inspection of a run.
//!
//! Each frame carries body positions, the events the trigger core
//! distributed and the running score.

use crate::world::{SimWorld, TickSummary};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use trigger_core::StatefulEvent;
use trigger_env::Entity;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    pub tick: u64,

    /// Simulation time in seconds
    pub time_sec: f64,

    /// True if the trigger frame was skipped
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub skipped: bool,

    pub bodies: Vec<BodyPosition>,

    /// State-tagged events of this frame, Exit included
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<StatefulEvent>,

    pub score: u32,
}

impl SimFrame {
    /// Captures the world right after `summary`'s tick.
    pub fn capture(world: &SimWorld, summary: &TickSummary) -> Self {
        Self {
            tick: summary.tick,
            time_sec: summary.time,
            skipped: summary.report.skipped,
            bodies: world
                .physics()
                .bodies()
                .iter()
                .map(|b| BodyPosition::new(b.entity, b.position))
                .collect(),
            events: if summary.report.skipped {
                Vec::new()
            } else {
                world.triggers().result().to_vec()
            },
            score: world.score(),
        }
    }
}

/// Position of a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPosition {
    pub entity: Entity,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BodyPosition {
    pub fn new(entity: Entity, pos: Vector3<f64>) -> Self {
        Self {
            entity,
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
