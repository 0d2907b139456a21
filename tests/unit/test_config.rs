//! Unit tests for the config module
//!
//! Tests cover:
//! - Defaults
//! - Section parsing
//! - Validation and derived durations

use std::time::Duration;

use a2a_stage::config::{Config, LogConfig, PlayerConfig, ScrollConfig};
use a2a_stage::errors::{get_exit_code, StageError, EXIT_CONFIG_ERROR};

// ============================================================================
// Default Tests
// ============================================================================

mod default_tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        assert_eq!(PlayerConfig::default().autoplay_interval_ms, 1500);
        assert_eq!(ScrollConfig::default().frame_interval_ms, 16);
        assert_eq!(LogConfig::default().filter, "warn");
    }

    #[test]
    fn test_default_durations() {
        let config = Config::default();
        assert_eq!(config.effective_interval(), Duration::from_millis(1500));
        assert_eq!(config.frame_interval(), Duration::from_millis(16));
    }
}

// ============================================================================
// Parsing Tests
// ============================================================================

mod parsing_tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let config = Config::from_toml(
            r#"
            catalog = "/srv/scenarios.json"

            [player]
            autoplay_interval_ms = 900
            start_index = 1

            [scroll]
            frame_interval_ms = 33

            [log]
            filter = "a2a_stage=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.player.autoplay_interval_ms, 900);
        assert_eq!(config.player.start_index, 1);
        assert_eq!(config.frame_interval(), Duration::from_millis(33));
        assert_eq!(config.log.filter, "a2a_stage=debug");
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let err = Config::from_toml("[player]\nstart_index = \"first\"\n").unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
        assert_eq!(get_exit_code(&anyhow::Error::new(err)), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_load_rejects_zero_frame_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a2a-stage.toml");
        std::fs::write(&path, "[scroll]\nframe_interval_ms = 0\n").unwrap();
        assert!(Config::load(path.to_str()).is_err());
    }
}
