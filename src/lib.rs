//! A2A Stage - scripted agent-to-agent conversations, step by step
//!
//! Plays authored scenarios in which an AI agent talks to a customer,
//! phones a restaurant, or queries an API on the customer's behalf.
//!
//! - **Scenario**: participants, steps, and the authored catalog
//! - **Store**: the live instance and its per-participant projections
//! - **Player**: discrete cursor, auto-play timer, and scroll-synced replay
//! - **Drivers**: one owner at a time per live instance
//!
//! # Quick Start
//!
//! ```ignore
//! use a2a_stage::player::StepPlayer;
//! use a2a_stage::scenario::ScenarioCatalog;
//!
//! let mut player = StepPlayer::new(ScenarioCatalog::builtin()?)?;
//! player.progress_next();
//! let live = player.store().state();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

// ─── Core modules ──────────────────────────────────────────────────
pub mod errors;
pub mod player;
pub mod scenario;
pub mod store;

// ─── Infrastructure ───────────────────────────────────────────────
pub mod cli;
pub mod config;
pub mod observability;

pub use config::Config;
pub use errors::{Result, StageError};
pub use player::{Stage, StepPlayer};
pub use scenario::{Scenario, ScenarioCatalog, Step};
pub use store::ScenarioStore;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Ask long-running drivers (auto-play) to wind down.
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
