//! Discrete Step Player
//!
//! A single integer cursor over the selected scenario's script. Moving the
//! cursor and applying the step under it happen together, so the cursor and
//! the store's applied log never drift apart.

use tracing::{debug, info};

use crate::errors::LoadError;
use crate::scenario::{Scenario, ScenarioCatalog, StepKind};
use crate::store::ScenarioStore;

/// Cursor value meaning "nothing applied yet"
pub const BEFORE_FIRST_STEP: i64 = -1;

/// Events kept beyond this are rotated out, oldest half first.
const MAX_EVENT_HISTORY: usize = 4096;

/// Where playback stands on the current script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing applied yet
    Ready,
    /// Some, but not all, steps applied
    Playing,
    /// Every step applied
    Completed,
}

/// Something that happened during playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// A scenario was selected and loaded fresh
    ScenarioSelected { index: usize, id: String },
    /// The step at `index` was applied
    StepApplied { index: usize, kind: StepKind },
    /// Projections were zeroed and the cursor rewound
    Reset,
    /// A backward seek rebuilt the prefix up to `target`
    Replayed { target: usize, steps: usize },
    /// The last step of the script was applied
    Completed { steps: usize },
}

/// Discrete player over a scenario catalog
pub struct StepPlayer {
    catalog: ScenarioCatalog,
    /// Index of the selected scenario in the catalog
    current: usize,
    store: ScenarioStore,
    /// Cursor; may run past the end of the script
    progress: i64,
    /// Bumped on every scenario switch
    generation: u64,
    events: Vec<PlayerEvent>,
}

impl StepPlayer {
    /// Create a player with the first scenario of `catalog` selected
    pub fn new(catalog: ScenarioCatalog) -> Result<Self, LoadError> {
        Self::with_start(catalog, 0)
    }

    /// Create a player with scenario `start` selected (falls back to 0 when out of range)
    pub fn with_start(catalog: ScenarioCatalog, start: usize) -> Result<Self, LoadError> {
        let current = if start < catalog.len() { start } else { 0 };
        let template = catalog.get(current).ok_or(LoadError::NothingLoaded)?;
        let store = ScenarioStore::with_template(template)?;
        let id = template.id.clone();

        let mut player = Self {
            catalog,
            current,
            store,
            progress: BEFORE_FIRST_STEP,
            generation: 0,
            events: Vec::new(),
        };
        player.emit_event(PlayerEvent::ScenarioSelected { index: current, id });
        Ok(player)
    }

    /// Move the cursor forward by exactly one and apply the step under it.
    ///
    /// The increment is never clamped; once the cursor is past the last step
    /// nothing more is applied. Returns whether a step was applied.
    pub fn progress_next(&mut self) -> bool {
        self.progress = self.progress.saturating_add(1);
        self.apply_at_cursor()
    }

    fn apply_at_cursor(&mut self) -> bool {
        let Ok(index) = usize::try_from(self.progress) else {
            return false;
        };
        let total = self.total_steps();
        let Some(step) = self.current_scenario().steps.get(index).cloned() else {
            debug!(progress = self.progress, total, "Cursor past end of script");
            return false;
        };

        self.store.apply(&step);
        debug!(index, kind = %step.kind(), "Applied step");
        self.emit_event(PlayerEvent::StepApplied {
            index,
            kind: step.kind(),
        });
        if index + 1 == total {
            self.emit_event(PlayerEvent::Completed { steps: total });
        }
        true
    }

    /// Zero all projections of the current scenario and rewind the cursor.
    pub fn reset(&mut self) {
        // Template already validated at selection; reset without one cannot fail.
        let _ = self.store.reset(None);
        self.progress = BEFORE_FIRST_STEP;
        self.emit_event(PlayerEvent::Reset);
    }

    /// Switch to scenario `index`. Out-of-range indices are ignored.
    ///
    /// Selecting loads a fresh instance, rewinds the cursor and starts a new
    /// generation so anything scheduled against the old one becomes stale.
    pub fn set_current(&mut self, index: usize) -> bool {
        let Some(template) = self.catalog.get(index) else {
            debug!(index, available = self.catalog.len(), "Ignoring out-of-range scenario selection");
            return false;
        };
        let id = template.id.clone();
        if let Err(e) = self.store.load(template) {
            debug!("Scenario selection failed: {}", e);
            return false;
        }

        self.current = index;
        self.progress = BEFORE_FIRST_STEP;
        self.generation += 1;
        info!(index, id = %id, generation = self.generation, "Selected scenario");
        self.emit_event(PlayerEvent::ScenarioSelected { index, id });
        true
    }

    // === Event System ===

    pub fn emit_event(&mut self, event: PlayerEvent) {
        if self.events.len() >= MAX_EVENT_HISTORY {
            self.events.drain(..MAX_EVENT_HISTORY / 2);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[PlayerEvent] {
        &self.events
    }

    // === Accessors ===

    pub fn progress(&self) -> i64 {
        self.progress
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_scenario(&self) -> &Scenario {
        &self.catalog.entries()[self.current].scenario
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &ScenarioStore {
        &self.store
    }

    pub fn total_steps(&self) -> usize {
        self.current_scenario().steps.len()
    }

    /// Number of steps currently applied
    pub fn applied_count(&self) -> usize {
        self.store.applied_steps().len()
    }

    /// True once the last step has been applied
    pub fn is_complete(&self) -> bool {
        self.applied_count() >= self.total_steps()
    }

    pub fn state(&self) -> PlayerState {
        match self.applied_count() {
            0 => PlayerState::Ready,
            n if n >= self.total_steps() => PlayerState::Completed,
            _ => PlayerState::Playing,
        }
    }

    /// Fraction of the script applied, 0.0 to 1.0
    pub fn fraction(&self) -> f32 {
        let total = self.total_steps();
        if total == 0 {
            0.0
        } else {
            self.applied_count() as f32 / total as f32
        }
    }
}
