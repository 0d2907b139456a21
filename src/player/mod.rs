//! Step playback
//!
//! - **runner**: discrete cursor over the selected scenario
//! - **scroll**: continuous ratio to step index, with backward replay
//! - **throttle**: frame-rate coalescing of scroll samples
//! - **driver**: single-owner access to a player
//! - **autoplay**: timer-driven advance

pub mod autoplay;
pub mod driver;
pub mod runner;
pub mod scroll;
pub mod throttle;

pub use autoplay::{clamp_interval, AutoPlay, AutoPlayExit, MIN_AUTOPLAY_INTERVAL};
pub use driver::{DriverKind, DriverToken, SharedStage, Stage};
pub use runner::{PlayerEvent, PlayerState, StepPlayer, BEFORE_FIRST_STEP};
pub use scroll::{sanitize_ratio, target_step_index, PanelLayout, ScrollEngine, ScrollOutcome};
pub use throttle::FrameThrottle;
