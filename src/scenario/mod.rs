//! Scenario templates
//!
//! - **model**: participants, steps and the template document
//! - **catalog**: the authored set of templates
//! - **editor**: insert/remove/list steps of a template

pub mod catalog;
pub mod editor;
mod model;

pub use catalog::{CatalogEntry, CatalogLayout, ScenarioCatalog};
pub use editor::StepSummary;
pub use model::{
    AiAgent, ApiCall, ApiResponse, Call, CallSession, ExtraFields, Human, Message, MessageType,
    PhoneState, Scenario, SenderType, Server, Step, StepKind, CUSTOMER,
};
