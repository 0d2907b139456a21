use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn stage() -> Command {
    let mut cmd = Command::cargo_bin("a2a-stage").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

#[test]
fn test_cli_version() {
    stage().arg("--version").assert().success();
}

#[test]
fn test_cli_help() {
    stage()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scrub"));
}

#[test]
fn test_cli_list_builtin() {
    stage()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("restaurant_call"))
        .stdout(predicate::str::contains("wine_pairing"));
}

#[test]
fn test_cli_steps() {
    stage()
        .args(["steps", "restaurant_call"])
        .assert()
        .success()
        .stdout(predicate::str::contains("make-call"));
}

#[test]
fn test_cli_play_partial_json() {
    stage()
        .args(["play", "restaurant_call", "--steps", "2", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"applied\": 2"))
        .stdout(predicate::str::contains("\"state\": \"ring\""));
}

#[test]
fn test_cli_play_unknown_scenario_exit_code() {
    stage()
        .args(["play", "does_not_exist"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Scenario not found"));
}

#[test]
fn test_cli_scrub_backward() {
    stage()
        .args(["scrub", "--scenario", "0", "0.99", "0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("replayed to 0"));
}

#[test]
fn test_cli_scrub_rejects_nan() {
    stage().args(["scrub", "-s", "0", "NaN"]).assert().code(1);
}

#[test]
fn test_cli_scrub_huge_spacing() {
    stage()
        .args(["scrub", "--spacing", "18446744073709551615", "0.2", "0.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coalesced").not());
}

#[test]
fn test_cli_start_index_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("a2a-stage.toml");
    std::fs::write(&config, "[player]\nstart_index = 2\n").unwrap();

    stage()
        .arg("--config")
        .arg(&config)
        .args(["play", "--steps", "1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scenario\": \"wine_pairing\""));

    stage()
        .arg("--config")
        .arg(&config)
        .arg("steps")
        .assert()
        .success()
        .stdout(predicate::str::contains("catchtable"));
}

#[test]
fn test_cli_start_index_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("a2a-stage.toml");
    std::fs::write(&config, "[player]\nstart_index = 99\n").unwrap();

    stage()
        .arg("--config")
        .arg(&config)
        .arg("play")
        .assert()
        .code(3);
}

#[test]
fn test_cli_missing_config_exit_code() {
    stage()
        .args(["--config", "/no/such/config.toml", "list"])
        .assert()
        .code(2);
}

#[test]
fn test_cli_add_and_remove_step() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("catalog.json");
    std::fs::write(
        &file,
        r#"[{"id":"s","title":"S","customer":{"name":"customer"},"agents":[],"servers":[],
            "steps":[{"type":"make-call","action":{"from":"ai","to":"customer","timestamp":1}}]}]"#,
    )
    .unwrap();

    let step = r#"{"type":"accept-call","action":{"from":"ai","to":"customer","timestamp":2}}"#;
    stage()
        .arg("add-step")
        .arg("--file")
        .arg(&file)
        .args(["--step", step])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted step 1"));

    stage()
        .arg("remove-step")
        .arg("--file")
        .arg(&file)
        .args(["--index", "0"])
        .assert()
        .success();

    stage()
        .arg("remove-step")
        .arg("--file")
        .arg(&file)
        .args(["--index", "0"])
        .assert()
        .code(4);

    let saved = std::fs::read_to_string(&file).unwrap();
    assert!(saved.contains("accept-call"));
    assert!(!saved.contains("make-call"));
}

#[test]
fn test_cli_edit_keeps_participant_tags() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("catalog.json");
    std::fs::write(
        &file,
        r#"[{"id":"s","title":"S","customer":{"type":"human","name":"customer"},
            "agents":[{"type":"ai","name":"ai"}],"servers":[],
            "steps":[{"type":"make-call","action":{"from":"ai","to":"customer","timestamp":1}}]}]"#,
    )
    .unwrap();

    let step = r#"{"type":"send-message","action":{"from":"ai","to":"customer","timestamp":2,"content":"Hi","type":"text"}}"#;
    stage()
        .arg("add-step")
        .arg("--file")
        .arg(&file)
        .args(["--step", step])
        .assert()
        .success();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(saved[0]["customer"]["type"], "human");
    assert_eq!(saved[0]["agents"][0]["type"], "ai");
    assert_eq!(saved[0]["steps"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_add_step_requires_message_type() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("catalog.json");
    std::fs::write(
        &file,
        r#"[{"id":"s","title":"S","customer":{"name":"customer"},"agents":[],"servers":[],
            "steps":[{"type":"make-call","action":{"from":"ai","to":"customer","timestamp":1}}]}]"#,
    )
    .unwrap();

    let step = r#"{"type":"send-message","action":{"from":"ai","to":"customer","timestamp":2,"content":"Hi"}}"#;
    stage()
        .arg("add-step")
        .arg("--file")
        .arg(&file)
        .args(["--step", step])
        .assert()
        .code(4);
}
