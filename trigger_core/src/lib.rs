//! Trigger Core - Stateful Overlap Events
//!
//! A physics step reports which pairs of colliders overlap *this* frame. Game
//! logic usually wants to know what *changed*: which contacts began, which
//! persist and which ended. This crate keeps one frame of history and turns
//! each frame's unordered overlap stream into:
//! 1. **Enter**: the interaction began this frame
//! 2. **Stay**: the interaction also existed last frame
//! 3. **Exit**: the interaction existed last frame and is gone now
//!
//! Both frames are kept sorted by a deterministic order, so the diff is a
//! single linear merge. The tagged events are then fanned out into the
//! output buffers of every participant that owns one.

pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod fanout;
pub mod frame;
pub mod ordering;
pub mod system;

// Re-export key types for convenience
pub use config::{DistributionMode, PairOrder, TriggerConfig};
pub use error::TriggerError;
pub use event::{OverlapState, StatefulEvent};
pub use fanout::RegistrySnapshot;
pub use frame::FrameBuffers;
pub use ordering::InteractionKey;
pub use system::{FrameReport, FrameStage, TriggerEventSystem};
