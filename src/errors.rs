use std::path::PathBuf;
use thiserror::Error;

use crate::player::DriverKind;

/// The central error type for the stage.
///
/// Only authoring-time problems (bad documents, bad edits) and explicit
/// ownership conflicts surface here. Playback itself never fails: unknown
/// participants and out-of-range cursors are silent no-ops.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Scroll error: {0}")]
    Scroll(#[from] ScrollError),

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A template was rejected; the store keeps its previous live instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Malformed scenario document: {0}")]
    Parse(String),

    #[error("Scenario has no id")]
    MissingId,

    #[error("Scenario '{id}' has no steps")]
    EmptySteps { id: String },

    #[error("No scenario loaded")]
    NothingLoaded,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Catalog contains no scenarios")]
    Empty,

    #[error("Scenario #{index} is invalid: {source}")]
    InvalidScenario {
        index: usize,
        #[source]
        source: LoadError,
    },

    #[error("Scenario not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Stage is driven by {owner}; {requested} must wait for a hand-off")]
    Busy {
        owner: DriverKind,
        requested: DriverKind,
    },

    #[error("{driver} no longer owns the stage")]
    NotOwner { driver: DriverKind },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrollError {
    #[error("Scroll ratio is not a number: {0}")]
    InvalidRatio(f64),

    #[error("Panel {panel} is outside a layout of {count} panels")]
    InvalidPanel { panel: usize, count: usize },
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    #[error("Invalid insert position: {at}. Must be between 0 and {len}")]
    InsertOutOfRange { at: usize, len: usize },

    #[error("Invalid step index: {index}. Scenario has {len} steps")]
    RemoveOutOfRange { index: usize, len: usize },

    #[error("Refusing to remove the only step of '{id}'")]
    LastStep { id: String },

    #[error("Failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, StageError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_CATALOG_ERROR: u8 = 3;
pub const EXIT_EDIT_ERROR: u8 = 4;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    if let Some(stage_err) = e.downcast_ref::<StageError>() {
        return match stage_err {
            StageError::Config(_) => EXIT_CONFIG_ERROR,
            StageError::Catalog(_) | StageError::Load(_) => EXIT_CATALOG_ERROR,
            StageError::Edit(_) => EXIT_EDIT_ERROR,
            _ => EXIT_ERROR,
        };
    }

    // Direct enum unwraps fallback
    if e.downcast_ref::<CatalogError>().is_some() || e.downcast_ref::<LoadError>().is_some() {
        return EXIT_CATALOG_ERROR;
    }
    if e.downcast_ref::<EditError>().is_some() {
        return EXIT_EDIT_ERROR;
    }

    EXIT_ERROR
}
