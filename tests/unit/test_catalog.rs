//! Unit tests for the scenario catalog
//!
//! Tests cover:
//! - Built-in catalog contents
//! - Document layouts
//! - Atomic save

use a2a_stage::errors::CatalogError;
use a2a_stage::scenario::{CatalogLayout, Server, StepKind};
use a2a_stage::{ScenarioCatalog, StepPlayer};

// ============================================================================
// Built-in Catalog Tests
// ============================================================================

mod builtin_tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios_play_to_completion() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        for index in 0..catalog.len() {
            let mut player = StepPlayer::with_start(catalog.clone(), index).unwrap();
            while player.progress_next() {}
            assert!(player.is_complete(), "scenario #{} incomplete", index);
            assert!(player.store().is_prefix_of_template());
        }
    }

    #[test]
    fn test_restaurant_call_ends_with_closed_session() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let index = catalog.require("restaurant_call").unwrap();
        let mut player = StepPlayer::with_start(catalog, index).unwrap();
        while player.progress_next() {}

        let live = player.store().state().unwrap();
        assert_eq!(live.call_sessions.len(), 1);
        assert!(live.call_sessions[0].accepted);
        assert_eq!(live.call_sessions[0].end, Some(6000));
        assert_eq!(live.customer.messages_from("ai_agent").len(), 1);
    }

    #[test]
    fn test_wine_pairing_uses_ai_servers() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let scenario = catalog.get(catalog.require("wine_pairing").unwrap()).unwrap();
        assert!(scenario.servers.iter().all(|s| matches!(s, Server::Ai(_))));
        assert!(scenario.steps.iter().any(|s| s.kind() == StepKind::ApiResponse));
    }
}

// ============================================================================
// Layout Tests
// ============================================================================

mod layout_tests {
    use super::*;

    const SCENARIO: &str = r#"{"id":"solo","title":"Solo","customer":{"name":"customer"},
        "agents":[{"name":"ai_agent"}],"servers":[{"type":"human","name":"restaurant"}],
        "steps":[{"type":"make-call","action":{"from":"ai_agent","to":"restaurant","timestamp":1}}]}"#;

    #[test]
    fn test_list_layout() {
        let catalog = ScenarioCatalog::from_json(&format!("[{}]", SCENARIO)).unwrap();
        assert_eq!(catalog.layout(), CatalogLayout::List);
        assert_eq!(catalog.find("solo"), Some(0));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            ScenarioCatalog::from_json("{not json"),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            ScenarioCatalog::from_json("42"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_steps_field_rejected() {
        let broken = SCENARIO.replace(r#""steps""#, r#""script""#);
        assert!(matches!(
            ScenarioCatalog::from_json(&format!("[{}]", broken)),
            Err(CatalogError::InvalidScenario { index: 0, .. })
        ));
    }

    #[test]
    fn test_save_writes_list_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        let catalog = ScenarioCatalog::from_json(&format!("[{}]", SCENARIO)).unwrap();
        catalog.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));
        assert!(text.contains(r#""type": "make-call""#));
    }
}
