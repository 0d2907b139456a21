//! Step editing for authored scenarios
//!
//! Insert, remove and list steps of a template. Step payloads are checked
//! against the step schema; participant names are only reported, never
//! enforced, because scripts may address participants outside the cast.

use serde_json::Value;
use std::fmt;
use tracing::warn;

use super::{Scenario, Step, StepKind};
use crate::errors::EditError;

const PREVIEW_CHARS: usize = 50;

/// One-line description of a step for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub index: usize,
    pub kind: StepKind,
    pub from: String,
    pub to: String,
    pub preview: String,
}

impl fmt::Display for StepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:2}. {:12} | {:15} -> {:15} | {}",
            self.index,
            self.kind.to_string(),
            self.from,
            self.to,
            self.preview
        )
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

pub fn list_steps(scenario: &Scenario) -> Vec<StepSummary> {
    scenario
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepSummary {
            index,
            kind: step.kind(),
            from: step.sender().to_string(),
            to: step.recipient().to_string(),
            preview: preview(&step.detail()),
        })
        .collect()
}

/// Parse a step from its JSON form.
///
/// Stricter than loading a document: a send-message action must name its
/// message `type` instead of falling back to text.
pub fn parse_step(json: &str) -> Result<Step, EditError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| EditError::InvalidStep(e.to_string()))?;

    let is_message = value.get("type").and_then(Value::as_str) == Some("send-message");
    if is_message && value.pointer("/action/type").is_none() {
        return Err(EditError::InvalidStep(
            "send-message action must have a 'type' field".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| EditError::InvalidStep(e.to_string()))
}

/// Names used by `step` that match no participant of `scenario`
pub fn unresolved_names(scenario: &Scenario, step: &Step) -> Vec<String> {
    let known = scenario.participant_names();
    [step.sender(), step.recipient()]
        .into_iter()
        .filter(|name| !known.contains(name))
        .map(str::to_string)
        .collect()
}

/// Insert `step` at `at` (or append). Returns the index it landed on.
pub fn insert_step(scenario: &mut Scenario, step: Step, at: Option<usize>) -> Result<usize, EditError> {
    for name in unresolved_names(scenario, &step) {
        warn!(scenario = %scenario.id, name = %name, "Step addresses an unknown participant");
    }

    let len = scenario.steps.len();
    match at {
        Some(at) if at > len => Err(EditError::InsertOutOfRange { at, len }),
        Some(at) => {
            scenario.steps.insert(at, step);
            Ok(at)
        }
        None => {
            scenario.steps.push(step);
            Ok(len)
        }
    }
}

/// Remove the step at `index`. A template must keep at least one step.
pub fn remove_step(scenario: &mut Scenario, index: usize) -> Result<Step, EditError> {
    let len = scenario.steps.len();
    if index >= len {
        return Err(EditError::RemoveOutOfRange { index, len });
    }
    if len == 1 {
        return Err(EditError::LastStep {
            id: scenario.id.clone(),
        });
    }
    Ok(scenario.steps.remove(index))
}
