//! # Outbox Simulation
//!
//! Drives an [`outbox_core::EventBuffer`] with simulated producers and an
//! [`outbox_flush::Flusher`] publishing to an in-memory collector that fails
//! on a schedule.
//!
//! ## Scenarios
//!
//! - **Cycle** (`scenarios::run_cycle_scenario`): step-by-step append,
//!   snapshot, late arrivals, remove
//! - **Producers** (`scenarios::run_producer_scenario`): concurrent producers,
//!   periodic flushing, injected failures, eviction accounting

pub mod scenarios;
pub mod types;

pub use scenarios::{run_cycle_scenario, run_producer_scenario};
pub use types::{ConfigError, RunReport, SimEvent, SimulationConfig, Workload};
