//! Scenario State Store
//!
//! Single source of truth for one live scenario:
//! - Loads a template into a fresh live instance
//! - Applies steps one at a time through the reducers
//! - Exposes per-participant projections and the "active" focus
//!
//! A failed load leaves the previous live instance untouched.

mod reducers;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::LoadError;
use crate::scenario::{
    AiAgent, ApiCall, ApiResponse, Call, Human, Message, Scenario, SenderType, Server, Step,
};

pub use crate::scenario::CallSession;

/// Mutable runtime copy of a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveScenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub customer: Human,
    pub agents: Vec<AiAgent>,
    pub servers: Vec<Server>,
    /// Applied-step log; always a prefix of the template's script
    pub steps: Vec<Step>,
    pub call_sessions: Vec<CallSession>,
}

impl LiveScenario {
    fn from_template(template: &Scenario) -> Self {
        let fresh = template.fresh();
        Self {
            id: fresh.id,
            title: fresh.title,
            description: fresh.description,
            customer: fresh.customer,
            agents: fresh.agents,
            servers: fresh.servers,
            steps: Vec::new(),
            call_sessions: Vec::new(),
        }
    }

    pub fn server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name() == name)
    }

    pub fn agent(&self, name: &str) -> Option<&AiAgent> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Human participant by name (first match), the customer included
    pub fn human(&self, name: &str) -> Option<&Human> {
        if name == crate::scenario::CUSTOMER || name == self.customer.name {
            return Some(&self.customer);
        }
        self.server(name).and_then(Server::as_human)
    }

    /// The open call session covering both participants, if any
    pub fn open_session_between(&self, a: &str, b: &str) -> Option<&CallSession> {
        self.call_sessions
            .iter()
            .find(|s| s.is_open() && s.involves(a, b))
    }
}

/// Participants that currently "have focus" for the rendering layer
#[derive(Debug, Clone, Copy, Default)]
pub struct Active<'a> {
    pub agent: Option<&'a AiAgent>,
    pub server: Option<&'a Server>,
}

/// Wrapped payload for [`ScenarioStore::send_message`]
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub message: Message,
}

/// Wrapped payload for the three call actions
#[derive(Debug, Clone)]
pub struct CallInput {
    pub call: Call,
}

#[derive(Debug, Clone)]
pub struct ApiCallInput {
    pub api_call: ApiCall,
}

#[derive(Debug, Clone)]
pub struct ApiResponseInput {
    pub api_response: ApiResponse,
}

/// Owns one live scenario and applies steps to it
#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    template: Option<Scenario>,
    live: Option<LiveScenario>,
}

impl ScenarioStore {
    /// Create an empty store with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `template` already loaded
    pub fn with_template(template: &Scenario) -> Result<Self, LoadError> {
        let mut store = Self::new();
        store.load(template)?;
        Ok(store)
    }

    /// Replace the live instance with a fresh copy of `template`.
    ///
    /// The template is validated first; on failure nothing changes.
    pub fn load(&mut self, template: &Scenario) -> Result<(), LoadError> {
        if let Err(e) = template.validate() {
            warn!("Rejected scenario load: {}", e);
            return Err(e);
        }
        self.live = Some(LiveScenario::from_template(template));
        self.template = Some(template.clone());
        info!(
            id = %template.id,
            steps = template.steps.len(),
            "Loaded scenario"
        );
        Ok(())
    }

    /// With a template, behaves like [`load`](Self::load). Without one,
    /// zeroes every projection of the currently loaded template.
    pub fn reset(&mut self, template: Option<&Scenario>) -> Result<(), LoadError> {
        match template {
            Some(t) => self.load(t),
            None => {
                if let Some(t) = &self.template {
                    self.live = Some(LiveScenario::from_template(t));
                }
                Ok(())
            }
        }
    }

    /// Apply one step. Returns `false` only when nothing is loaded.
    pub fn apply(&mut self, step: &Step) -> bool {
        match self.live.as_mut() {
            Some(live) => {
                reducers::apply_step(live, step);
                true
            }
            None => {
                warn!(kind = %step.kind(), "Step ignored: no scenario loaded");
                false
            }
        }
    }

    pub fn send_message(&mut self, input: SendMessageInput) -> bool {
        self.apply(&Step::SendMessage(input.message))
    }

    pub fn make_call(&mut self, input: CallInput) -> bool {
        self.apply(&Step::MakeCall(input.call))
    }

    pub fn accept_call(&mut self, input: CallInput) -> bool {
        self.apply(&Step::AcceptCall(input.call))
    }

    pub fn finish_call(&mut self, input: CallInput) -> bool {
        self.apply(&Step::FinishCall(input.call))
    }

    pub fn api_call(&mut self, input: ApiCallInput) -> bool {
        self.apply(&Step::ApiCall(input.api_call))
    }

    pub fn api_response(&mut self, input: ApiResponseInput) -> bool {
        self.apply(&Step::ApiResponse(input.api_response))
    }

    pub fn state(&self) -> Option<&LiveScenario> {
        self.live.as_ref()
    }

    pub fn template(&self) -> Option<&Scenario> {
        self.template.as_ref()
    }

    pub fn applied_steps(&self) -> &[Step] {
        self.live.as_ref().map(|l| l.steps.as_slice()).unwrap_or(&[])
    }

    /// True while the applied log is a contiguous prefix of the template script.
    pub fn is_prefix_of_template(&self) -> bool {
        match &self.template {
            Some(t) => {
                let applied = self.applied_steps();
                applied.len() <= t.steps.len() && t.steps[..applied.len()] == *applied
            }
            None => self.applied_steps().is_empty(),
        }
    }

    /// Classify a participant name as agent, customer or server.
    pub fn sender_type(&self, name: &str) -> SenderType {
        match &self.live {
            Some(live) => reducers::sender_type(live, name),
            None => SenderType::Server,
        }
    }

    /// Steps the named agent took part in, in applied order
    pub fn agent_view(&self, name: &str) -> Option<&[Step]> {
        let live = self.live.as_ref()?;
        if let Some(agent) = live.agent(name) {
            return Some(&agent.steps);
        }
        match live.server(name) {
            Some(Server::Ai(agent)) => Some(&agent.steps),
            _ => None,
        }
    }

    /// Focused agent and server, derived from the most recent applied step.
    ///
    /// The step's recipient is preferred, then its sender. With an empty log
    /// the first agent has focus; the first server is the fallback whenever
    /// no server is addressed.
    pub fn active(&self) -> Active<'_> {
        let Some(live) = self.live.as_ref() else {
            return Active::default();
        };

        let Some(last) = live.steps.last() else {
            return Active {
                agent: live.agents.first(),
                server: live.servers.first(),
            };
        };

        let agent = live
            .agent(last.recipient())
            .or_else(|| live.agent(last.sender()));
        let server = live
            .server(last.recipient())
            .or_else(|| live.server(last.sender()))
            .or_else(|| live.servers.first());

        Active { agent, server }
    }
}
