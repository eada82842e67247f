//! Trigger Simulation Harness
//!
//! A deterministic roll-a-ball world that drives the trigger core end to end:
//! a toy physics step reports sphere overlaps, the trigger core turns them
//! into Enter/Stay/Exit events, and gameplay systems react to the events
//! delivered into per-entity buffers.
//!
//! # Tick
//!
//! ```text
//! input -> movement -> physics step -> trigger frame -> pickup -> rotation
//!                                          │                        │
//!                                    reference oracle        deferred despawns
//! ```
//!
//! Every trigger frame is cross-checked against a brute-force set model, so
//! each scenario doubles as a conformance test of the sorted merge.
//!
//! # Usage
//!
//! ```ignore
//! use trigger_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_duration(5.0)
//!     .run(ScenarioId::PickupRun);
//! assert!(result.passed);
//! ```

mod components;
mod entities;
mod error;
mod exporter;
mod follow;
mod input;
mod oracle;
mod physics;
mod runner;
pub mod scenarios;
mod systems;
mod world;

pub use components::{Player, Spin};
pub use entities::EntityAllocator;
pub use error::SimError;
pub use exporter::{BodyPosition, SimExport, SimFrame};
pub use follow::Follower;
pub use input::{InputCapture, InputMode, InputScript};
pub use oracle::{Expectation, Oracle};
pub use physics::{Body, PhysicsWorld, SphereCollider};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use systems::{movement_system, pickup_system, rotation_system, CommandBuffer};
pub use world::{SimConfig, SimWorld, TickSummary};
