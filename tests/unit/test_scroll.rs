//! Unit tests for the scroll engine
//!
//! Tests cover:
//! - Ratio to step index mapping
//! - Forward application and backward replay
//! - Path independence of replay
//! - Panel-bound players
//! - Frame throttling

use std::time::{Duration, Instant};

use a2a_stage::errors::ScrollError;
use a2a_stage::player::{
    target_step_index, FrameThrottle, PanelLayout, ScrollEngine, ScrollOutcome, StepPlayer,
};

use super::helpers::{call_scenario, catalog_of, four_step_scenario};

fn four_step_player() -> StepPlayer {
    StepPlayer::new(catalog_of(vec![four_step_scenario()])).unwrap()
}

// ============================================================================
// Mapping Tests
// ============================================================================

mod mapping_tests {
    use super::*;

    #[test]
    fn test_ratio_049_applies_two_steps() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        assert_eq!(target_step_index(0.49, 4).unwrap(), Some(1));

        engine.sync(&mut player, 0.49).unwrap();
        assert_eq!(player.applied_count(), 2);
        assert_eq!(
            player.store().applied_steps(),
            &player.current_scenario().steps[..2]
        );
    }

    #[test]
    fn test_ratio_099_applies_all_steps() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        engine.sync(&mut player, 0.99).unwrap();
        assert_eq!(player.applied_count(), 4);
        assert!(player.is_complete());
    }

    #[test]
    fn test_out_of_range_ratios_clamp() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        engine.sync(&mut player, 7.5).unwrap();
        assert_eq!(player.applied_count(), 4);
        engine.sync(&mut player, -1.0).unwrap();
        assert_eq!(player.applied_count(), 1);
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        assert!(matches!(
            engine.sync(&mut player, f64::NAN),
            Err(ScrollError::InvalidRatio(_))
        ));
        assert_eq!(player.applied_count(), 0);
    }
}

// ============================================================================
// Replay Tests
// ============================================================================

mod replay_tests {
    use super::*;

    #[test]
    fn test_backward_replays_from_zero() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        engine.sync(&mut player, 0.99).unwrap();

        let outcome = engine.sync(&mut player, 0.3).unwrap();
        assert_eq!(outcome, ScrollOutcome::Replayed { to: 1, applied: 2 });
        assert_eq!(player.applied_count(), 2);
        let customer = &player.store().state().unwrap().customer;
        assert_eq!(customer.message_count(), 0);
    }

    #[test]
    fn test_replay_is_path_independent() {
        let mut direct = four_step_player();
        ScrollEngine::new().sync(&mut direct, 0.8).unwrap();

        let mut wandering = four_step_player();
        let mut engine = ScrollEngine::new();
        for ratio in [0.8, 0.1, 0.55, 0.0, 0.8] {
            engine.sync(&mut wandering, ratio).unwrap();
        }

        assert_eq!(direct.store().state(), wandering.store().state());
    }

    #[test]
    fn test_forward_only_applies_new_steps() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        engine.sync(&mut player, 0.3).unwrap();
        let outcome = engine.sync(&mut player, 0.8).unwrap();
        assert_eq!(outcome, ScrollOutcome::Advanced { to: 3, applied: 2 });
    }

    #[test]
    fn test_call_projection_rebuilt_on_replay() {
        let mut player = StepPlayer::new(catalog_of(vec![call_scenario()])).unwrap();
        let mut engine = ScrollEngine::new();
        engine.sync(&mut player, 0.99).unwrap();
        engine.sync(&mut player, 0.0).unwrap();

        let live = player.store().state().unwrap();
        assert_eq!(live.call_sessions.len(), 1);
        assert!(live.call_sessions[0].is_open());
        assert!(!live.call_sessions[0].accepted);
    }
}

// ============================================================================
// Panel Tests
// ============================================================================

mod panel_tests {
    use super::*;

    #[test]
    fn test_entering_panel_starts_clean() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        let layout = PanelLayout::new(3);

        engine.sync_panel(&mut player, 0.6, &layout, 1).unwrap();
        let inside = player.applied_count();
        assert!(inside > 0);

        assert_eq!(
            engine.sync_panel(&mut player, 0.9, &layout, 1).unwrap(),
            ScrollOutcome::OutsidePanel
        );
        assert_eq!(player.applied_count(), inside);

        // Re-entry resets before syncing
        engine.sync_panel(&mut player, 0.34, &layout, 1).unwrap();
        assert_eq!(player.applied_count(), 1);
    }

    #[test]
    fn test_invalid_panel() {
        let mut player = four_step_player();
        let mut engine = ScrollEngine::new();
        assert_eq!(
            engine
                .sync_panel(&mut player, 0.5, &PanelLayout::new(2), 5)
                .unwrap_err(),
            ScrollError::InvalidPanel { panel: 5, count: 2 }
        );
    }
}

// ============================================================================
// Throttle Tests
// ============================================================================

mod throttle_tests {
    use super::*;

    #[test]
    fn test_one_sample_per_frame() {
        let start = Instant::now();
        let frame = Duration::from_millis(16);
        let mut throttle = FrameThrottle::new(frame);

        let passed: Vec<f64> = (0..10)
            .filter_map(|i| throttle.offer(i as f64 / 10.0, start + Duration::from_millis(i * 4)))
            .collect();

        // Samples at 0, 16 and 32 ms pass
        assert_eq!(passed, vec![0.0, 0.4, 0.8]);
        assert_eq!(throttle.flush(), Some(0.9));
    }
}
