//! Scroll-Synchronized Progress Engine
//!
//! Maps a continuous progress ratio (0..1, usually page scroll relative to
//! a pinned section) onto the discrete step index space of a [`StepPlayer`].
//!
//! Steps have no inverse, so moving backward means resetting the player and
//! replaying the prefix from step 0. Moving forward only applies the steps
//! in between. Either way the applied log stays a prefix of the script.

use tracing::debug;

use super::runner::{PlayerEvent, StepPlayer, BEFORE_FIRST_STEP};
use crate::errors::ScrollError;

/// What a sync did to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Target equals the last applied index
    Unchanged { index: usize },
    /// Stepped forward, applying `applied` steps
    Advanced { to: usize, applied: usize },
    /// Reset and replayed `applied` steps to reach an earlier (or diverged) target
    Replayed { to: usize, applied: usize },
    /// Ratio addresses a different panel than the one bound to the player
    OutsidePanel,
}

/// Reject NaN and clamp everything else into 0..=1.
pub fn sanitize_ratio(ratio: f64) -> Result<f64, ScrollError> {
    if ratio.is_nan() {
        return Err(ScrollError::InvalidRatio(ratio));
    }
    Ok(ratio.clamp(0.0, 1.0))
}

/// `floor(ratio * total)` clamped to `0..=total-1`; `None` for an empty script.
pub fn target_step_index(ratio: f64, total_steps: usize) -> Result<Option<usize>, ScrollError> {
    let ratio = sanitize_ratio(ratio)?;
    if total_steps == 0 {
        return Ok(None);
    }
    let raw = (ratio * total_steps as f64).floor() as usize;
    Ok(Some(raw.min(total_steps - 1)))
}

/// Several panels sharing one scroll range, each owning an equal slice of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    panels: usize,
}

impl PanelLayout {
    /// Layout of `panels` equal slices (at least one)
    pub fn new(panels: usize) -> Self {
        Self {
            panels: panels.max(1),
        }
    }

    pub fn panels(&self) -> usize {
        self.panels
    }

    /// Panel addressed by an overall ratio
    pub fn panel_at(&self, ratio: f64) -> usize {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        ((ratio * self.panels as f64).floor() as usize).min(self.panels - 1)
    }

    /// Remap an overall ratio into `panel`'s local 0..=1 range.
    pub fn local_progress(&self, ratio: f64, panel: usize) -> f64 {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        let width = 1.0 / self.panels as f64;
        let start = panel as f64 * width;
        ((ratio - start) / width).clamp(0.0, 1.0)
    }

    /// Discrete preview index of `panel` for a script of `total_steps` steps.
    pub fn preview_step_index(&self, ratio: f64, panel: usize, total_steps: usize) -> usize {
        if total_steps == 0 {
            return 0;
        }
        let local = self.local_progress(ratio, panel);
        ((local * total_steps as f64).floor() as usize).min(total_steps - 1)
    }

    fn check(&self, panel: usize) -> Result<(), ScrollError> {
        if panel >= self.panels {
            return Err(ScrollError::InvalidPanel {
                panel,
                count: self.panels,
            });
        }
        Ok(())
    }
}

/// Remembers the last applied index and drives a player toward new targets
#[derive(Debug, Clone, Default)]
pub struct ScrollEngine {
    /// High-water mark; `None` means nothing applied
    last_applied: Option<usize>,
    /// Player generation the mark belongs to
    generation: Option<u64>,
    /// Whether the previous panel sync landed inside the bound panel
    in_panel: bool,
}

impl ScrollEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<usize> {
        self.last_applied
    }

    /// Drop the remembered position
    pub fn forget(&mut self) {
        self.last_applied = None;
        self.generation = None;
        self.in_panel = false;
    }

    /// Take over the player's current position (used when scrolling gains control).
    pub fn adopt(&mut self, player: &StepPlayer) {
        self.last_applied = player.applied_count().checked_sub(1);
        self.generation = Some(player.generation());
    }

    /// Drive `player` to the step addressed by `ratio`.
    pub fn sync(&mut self, player: &mut StepPlayer, ratio: f64) -> Result<ScrollOutcome, ScrollError> {
        match target_step_index(ratio, player.total_steps())? {
            Some(target) => Ok(self.seek(player, target)),
            None => Ok(ScrollOutcome::Unchanged { index: 0 }),
        }
    }

    /// Like [`sync`](Self::sync), for a player bound to one panel of a
    /// multi-panel scroll range. Entering the panel starts from a clean
    /// slate; ratios addressing other panels leave the player alone.
    pub fn sync_panel(
        &mut self,
        player: &mut StepPlayer,
        ratio: f64,
        layout: &PanelLayout,
        panel: usize,
    ) -> Result<ScrollOutcome, ScrollError> {
        layout.check(panel)?;
        let ratio = sanitize_ratio(ratio)?;

        if layout.panel_at(ratio) != panel {
            self.in_panel = false;
            return Ok(ScrollOutcome::OutsidePanel);
        }
        if !self.in_panel {
            debug!(panel, "Entered bound panel, starting from a clean slate");
            player.reset();
            self.last_applied = None;
            self.generation = Some(player.generation());
            self.in_panel = true;
        }

        let local = layout.local_progress(ratio, panel);
        self.sync(player, local)
    }

    /// Move `player` to `target` (clamped to the script).
    pub fn seek(&mut self, player: &mut StepPlayer, target: usize) -> ScrollOutcome {
        if self.generation != Some(player.generation()) {
            self.last_applied = None;
            self.generation = Some(player.generation());
        }

        let target = target.min(player.total_steps().saturating_sub(1));
        let expected_cursor = self
            .last_applied
            .map_or(BEFORE_FIRST_STEP, |i| i as i64);
        let diverged = player.progress() != expected_cursor;

        let outcome = match self.last_applied {
            Some(last) if !diverged && last == target => {
                return ScrollOutcome::Unchanged { index: target };
            }
            Some(last) if !diverged && target > last => {
                let applied = Self::advance(player, target - last);
                ScrollOutcome::Advanced { to: target, applied }
            }
            None if !diverged => {
                let applied = Self::advance(player, target + 1);
                ScrollOutcome::Advanced { to: target, applied }
            }
            _ => {
                // Backward, or the cursor moved underneath us: rebuild from zero.
                player.reset();
                let applied = Self::advance(player, target + 1);
                player.emit_event(PlayerEvent::Replayed {
                    target,
                    steps: applied,
                });
                ScrollOutcome::Replayed { to: target, applied }
            }
        };

        debug!(index = target, outcome = ?outcome, "Scroll seek");
        self.last_applied = Some(target);
        outcome
    }

    fn advance(player: &mut StepPlayer, count: usize) -> usize {
        (0..count).filter(|_| player.progress_next()).count()
    }
}
