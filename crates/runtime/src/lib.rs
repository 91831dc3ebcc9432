//! Dual-rate runtime: a fixed-tick physics thread and a display-rate main
//! loop sharing one [`SimulationContext`].
//!
//! # Invariants
//! - The physics world is created, stepped and released on the physics thread.
//! - Scene commands and input edges are applied at tick boundaries only.
//! - Shutdown joins the physics thread before any shared state is dropped.

mod config;
mod context;
mod frame_slot;
mod pacer;
mod physics_thread;
mod runtime;

pub use config::{
    ConfigError, DisplaySettings, FramePacing, PhysicsPacing, PhysicsSettings, RuntimeConfig,
};
pub use context::SimulationContext;
pub use frame_slot::FrameSlot;
pub use pacer::Pacer;
pub use physics_thread::PhysicsReport;
pub use runtime::{Host, LoopState, RunReport, Runtime, RuntimeError};
