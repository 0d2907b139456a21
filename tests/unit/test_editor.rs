//! Unit tests for step editing
//!
//! Tests cover:
//! - Step summaries
//! - Insert and remove bounds
//! - Editing a catalog file end to end

use a2a_stage::errors::EditError;
use a2a_stage::scenario::{editor, StepKind};
use a2a_stage::ScenarioCatalog;

use super::helpers::call_scenario;

#[test]
fn test_list_steps_summaries() {
    let summaries = editor::list_steps(&call_scenario());
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].kind, StepKind::MakeCall);
    assert_eq!(summaries[0].from, "customer");
    assert_eq!(summaries[0].to, "restaurant");
}

#[test]
fn test_insert_at_end_position_allowed() {
    let mut scenario = call_scenario();
    let step = editor::parse_step(
        r#"{"type":"api-call","action":{"from":"ai_agent_1","to":"catchtable","timestamp":9,"service":"catchtable","request":"8PM?"}}"#,
    )
    .unwrap();
    assert_eq!(editor::insert_step(&mut scenario, step, Some(3)).unwrap(), 3);
    assert_eq!(scenario.steps[3].kind(), StepKind::ApiCall);
}

#[test]
fn test_unknown_participants_do_not_block_insert() {
    let mut scenario = call_scenario();
    let step = editor::parse_step(
        r#"{"type":"send-message","action":{"from":"ghost","to":"nobody","timestamp":1,"content":"boo","type":"text"}}"#,
    )
    .unwrap();
    assert_eq!(editor::unresolved_names(&scenario, &step).len(), 2);
    assert!(editor::insert_step(&mut scenario, step, None).is_ok());
}

#[test]
fn test_remove_bounds() {
    let mut scenario = call_scenario();
    assert!(matches!(
        editor::remove_step(&mut scenario, 3),
        Err(EditError::RemoveOutOfRange { index: 3, len: 3 })
    ));
    editor::remove_step(&mut scenario, 2).unwrap();
    editor::remove_step(&mut scenario, 1).unwrap();
    assert!(matches!(
        editor::remove_step(&mut scenario, 0),
        Err(EditError::LastStep { .. })
    ));
}

#[test]
fn test_untyped_message_rejected_when_authoring() {
    let err = editor::parse_step(
        r#"{"type":"send-message","action":{"from":"ai_agent_1","to":"customer","timestamp":1,"content":"8PM works?"}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, EditError::InvalidStep(_)));
}

#[test]
fn test_edit_keeps_unmodelled_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(
        &path,
        r#"{"call":{"id":"call","title":"Call","customer":{"type":"human","name":"customer","state":"message","messageBox":{}},
            "agents":[{"type":"ai","name":"ai_agent","steps":[]}],"servers":[{"type":"human","name":"restaurant"}],
            "steps":[
              {"type":"make-call","action":{"from":"ai_agent","to":"restaurant","timestamp":1}},
              {"type":"send-message","action":{"from":"ai_agent","to":"restaurant","timestamp":2,"content":"Table for two?",
                "type":"voice","senderType":"agent","callSession":{"id":"call-1","participants":["ai_agent","restaurant"],"endTime":null}}}
            ]}}"#,
    )
    .unwrap();

    let mut catalog = ScenarioCatalog::load(&path).unwrap();
    let scenario = catalog.get_mut(0).unwrap();
    editor::remove_step(scenario, 0).unwrap();
    catalog.save(&path).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let call = &saved["call"];
    assert_eq!(call["customer"]["type"], "human");
    assert_eq!(call["agents"][0]["type"], "ai");
    assert_eq!(call["steps"].as_array().unwrap().len(), 1);
    let action = &call["steps"][0]["action"];
    assert_eq!(action["callSession"]["id"], "call-1");
    assert!(action["callSession"]["endTime"].is_null());
}

#[test]
fn test_edit_catalog_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    ScenarioCatalog::builtin().unwrap().save(&path).unwrap();

    let mut catalog = ScenarioCatalog::load(&path).unwrap();
    let index = catalog.require("sms_fallback").unwrap();
    let before = catalog.get(index).unwrap().steps.len();
    let scenario = catalog.get_mut(index).unwrap();
    editor::remove_step(scenario, 0).unwrap();
    catalog.save(&path).unwrap();

    let reloaded = ScenarioCatalog::load(&path).unwrap();
    assert_eq!(reloaded.get(index).unwrap().steps.len(), before - 1);
    assert_eq!(reloaded.entries()[index].key.as_deref(), Some("sms_fallback"));
}
