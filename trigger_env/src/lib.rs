//! Trigger Environment Abstraction Layer
//!
//! This crate defines the boundary between the stateful trigger core and the
//! world around it. The core never detects collisions and never owns entity
//! storage; it only talks to:
//! - An **overlap source** (the physics step) that pushes raw overlap pairs
//! - An **event buffer store** that owns one output buffer per entity
//!
//! Both are traits so the core can be driven by a real engine, by the
//! deterministic simulation harness, or by hand-written fixtures in tests.
//!
//! # Example
//!
//! ```ignore
//! use trigger_env::{EventBuffers, Entity, EventBufferStore};
//!
//! let mut buffers: EventBuffers<u32> = EventBuffers::new();
//! let player = Entity::new(0, 1);
//! buffers.register(player)?;
//! buffers.append(player, 7);
//! assert_eq!(buffers.events(player)?, vec![7]);
//! ```

mod buffers;
mod error;
mod source;
mod store;
mod types;

pub use buffers::EventBuffers;
pub use error::EnvError;
pub use source::{OverlapSink, OverlapSource, VecSink};
pub use store::EventBufferStore;
pub use types::{ColliderKey, Entity, RawOverlap};
