//! Driver ownership
//!
//! A [`Stage`] bundles one player with its scroll engine and admits a single
//! driver at a time. A driver claims the stage and receives a
//! [`DriverToken`]; every write goes through that token. Writes from any
//! other driver are rejected until the owner releases or hands off.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::runner::StepPlayer;
use super::scroll::{PanelLayout, ScrollEngine, ScrollOutcome};
use crate::errors::{DriverError, Result};

/// Who is moving the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Explicit "next" presses
    Manual,
    /// Timer-driven advance
    AutoPlay,
    /// Continuous scroll ratio
    Scroll,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Manual => write!(f, "manual"),
            DriverKind::AutoPlay => write!(f, "auto-play"),
            DriverKind::Scroll => write!(f, "scroll"),
        }
    }
}

/// Proof of ownership. Tokens are not `Clone`; a revoked token stays
/// invalid even if the same kind claims again later.
#[derive(Debug, PartialEq, Eq)]
pub struct DriverToken {
    kind: DriverKind,
    lease: u64,
}

impl DriverToken {
    pub fn kind(&self) -> DriverKind {
        self.kind
    }
}

/// A stage shared between drivers running on different tasks
pub type SharedStage = Arc<Mutex<Stage>>;

/// One live scenario session: a player, its scroll engine, and the current owner
pub struct Stage {
    player: StepPlayer,
    scroll: ScrollEngine,
    owner: Option<(DriverKind, u64)>,
    next_lease: u64,
}

impl Stage {
    pub fn new(player: StepPlayer) -> Self {
        Self {
            player,
            scroll: ScrollEngine::new(),
            owner: None,
            next_lease: 1,
        }
    }

    /// Wrap in a handle suitable for sharing with an auto-play task
    pub fn shared(self) -> SharedStage {
        Arc::new(Mutex::new(self))
    }

    /// Claim the stage for `kind`. Fails if anyone currently owns it.
    pub fn claim(&mut self, kind: DriverKind) -> std::result::Result<DriverToken, DriverError> {
        if let Some((owner, _)) = self.owner {
            return Err(DriverError::Busy {
                owner,
                requested: kind,
            });
        }

        let lease = self.next_lease;
        self.next_lease += 1;
        self.owner = Some((kind, lease));

        if kind == DriverKind::Scroll {
            // Pick up wherever the previous driver left the cursor.
            self.scroll.adopt(&self.player);
        }
        debug!(driver = %kind, lease, "Driver claimed stage");
        Ok(DriverToken { kind, lease })
    }

    /// Give the stage up. Releasing a stale token is a no-op.
    pub fn release(&mut self, token: DriverToken) {
        if self.check(&token).is_ok() {
            debug!(driver = %token.kind, "Driver released stage");
            self.owner = None;
        }
    }

    /// Pass ownership directly from the holder of `token` to `next`.
    pub fn hand_off(
        &mut self,
        token: DriverToken,
        next: DriverKind,
    ) -> std::result::Result<DriverToken, DriverError> {
        self.check(&token)?;
        info!(from = %token.kind, to = %next, "Handing off stage");
        self.owner = None;
        self.claim(next)
    }

    pub fn owner(&self) -> Option<DriverKind> {
        self.owner.map(|(kind, _)| kind)
    }

    /// Whether `token` still grants write access
    pub fn is_valid(&self, token: &DriverToken) -> bool {
        self.check(token).is_ok()
    }

    fn check(&self, token: &DriverToken) -> std::result::Result<(), DriverError> {
        match self.owner {
            Some((kind, lease)) if kind == token.kind && lease == token.lease => Ok(()),
            _ => Err(DriverError::NotOwner { driver: token.kind }),
        }
    }

    /// Advance one step. Returns whether a step was applied.
    pub fn advance(&mut self, token: &DriverToken) -> std::result::Result<bool, DriverError> {
        self.check(token)?;
        Ok(self.player.progress_next())
    }

    /// Reset projections and rewind.
    pub fn reset(&mut self, token: &DriverToken) -> std::result::Result<(), DriverError> {
        self.check(token)?;
        self.player.reset();
        self.scroll.forget();
        Ok(())
    }

    /// Drive the player to the step addressed by `ratio`.
    pub fn scrub(&mut self, token: &DriverToken, ratio: f64) -> Result<ScrollOutcome> {
        self.check(token)?;
        Ok(self.scroll.sync(&mut self.player, ratio)?)
    }

    /// Like [`scrub`](Self::scrub), bound to one panel of a multi-panel range.
    pub fn scrub_panel(
        &mut self,
        token: &DriverToken,
        ratio: f64,
        layout: &PanelLayout,
        panel: usize,
    ) -> Result<ScrollOutcome> {
        self.check(token)?;
        Ok(self
            .scroll
            .sync_panel(&mut self.player, ratio, layout, panel)?)
    }

    /// Switch scenario. Revokes the current owner so every outstanding token
    /// (and any timer holding one) goes stale.
    pub fn select(&mut self, index: usize) -> bool {
        if !self.player.set_current(index) {
            return false;
        }
        if let Some((kind, _)) = self.owner.take() {
            info!(driver = %kind, "Scenario switch revoked driver");
        }
        self.scroll.forget();
        true
    }

    pub fn player(&self) -> &StepPlayer {
        &self.player
    }

    pub fn scroll(&self) -> &ScrollEngine {
        &self.scroll
    }
}
