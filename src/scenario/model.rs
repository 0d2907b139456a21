//! Scenario Data Model
//!
//! Authored scenario templates and the step vocabulary they are written in.
//! Templates are immutable once authored; a live copy is made by the store.
//!
//! Authored documents may carry keys this model does not name (participant
//! `type` tags, recorded call sessions, editor metadata). Those land in each
//! type's `extra` map and are written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::LoadError;

/// Literal name that always resolves to the scenario's customer.
pub const CUSTOMER: &str = "customer";

/// Authored keys not modelled by a type, kept in document order
pub type ExtraFields = Map<String, Value>;

/// Phone screen a human participant is currently looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneState {
    /// Idle / messaging screen
    #[default]
    Message,
    /// In an accepted call
    Call,
    /// Incoming call ringing
    Ring,
}

impl fmt::Display for PhoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneState::Message => write!(f, "message"),
            PhoneState::Call => write!(f, "call"),
            PhoneState::Ring => write!(f, "ring"),
        }
    }
}

/// Medium a message travels over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Voice,
    Dtmf,
    Image,
}

impl MessageType {
    /// Voice and keypad tones only happen on a live call.
    pub fn is_in_call(self) -> bool {
        matches!(self, MessageType::Voice | MessageType::Dtmf)
    }
}

/// Which side of the conversation a sender belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Agent,
    Customer,
    Server,
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderType::Agent => write!(f, "agent"),
            SenderType::Customer => write!(f, "customer"),
            SenderType::Server => write!(f, "server"),
        }
    }
}

/// A phone call between two participants, derived from call steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    /// Index of the make-call step that opened the session
    pub id: usize,
    pub caller: String,
    pub caller_type: SenderType,
    pub start: i64,
    pub end: Option<i64>,
    pub participants: Vec<String>,
    pub accepted: bool,
}

impl CallSession {
    pub fn involves(&self, a: &str, b: &str) -> bool {
        self.participants.iter().any(|p| p == a) && self.participants.iter().any(|p| p == b)
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// A text, voice, keypad or image message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_type: Option<SenderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Session a delivered voice message was spoken in. Set by the store on
    /// inbox copies only; an authored `callSession` stays in `extra`.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub call_session: Option<CallSession>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Message {
    /// Create a text message
    pub fn text(from: &str, to: &str, content: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: 0,
            id: None,
            content: content.to_string(),
            kind: MessageType::Text,
            sender_type: None,
            reason: None,
            image_url: None,
            call_session: None,
            extra: ExtraFields::new(),
        }
    }

    /// Create a voice message (spoken during a call)
    pub fn voice(from: &str, to: &str, content: &str) -> Self {
        Self {
            kind: MessageType::Voice,
            ..Self::text(from, to, content)
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Payload shared by make-call, accept-call and finish-call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_type: Option<SenderType>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Call {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: 0,
            id: None,
            reason: None,
            sender_type: None,
            extra: ExtraFields::new(),
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Request sent to an external service (e.g. a booking API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCall {
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub service: String,
    pub request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_type: Option<SenderType>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ApiCall {
    pub fn new(from: &str, to: &str, service: &str, request: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: 0,
            id: None,
            service: service.to_string(),
            request: request.to_string(),
            reason: None,
            sender_type: None,
            extra: ExtraFields::new(),
        }
    }
}

/// Answer from an external service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub service: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_type: Option<SenderType>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ApiResponse {
    pub fn new(from: &str, to: &str, service: &str, response: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            timestamp: 0,
            id: None,
            service: service.to_string(),
            response: response.to_string(),
            sender_type: None,
            extra: ExtraFields::new(),
        }
    }
}

/// Discriminant of a [`Step`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    SendMessage,
    MakeCall,
    AcceptCall,
    FinishCall,
    ApiCall,
    ApiResponse,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::SendMessage => "send-message",
            StepKind::MakeCall => "make-call",
            StepKind::AcceptCall => "accept-call",
            StepKind::FinishCall => "finish-call",
            StepKind::ApiCall => "api-call",
            StepKind::ApiResponse => "api-response",
        };
        f.write_str(name)
    }
}

/// One authored unit of a scenario script.
///
/// Serialized as `{ "type": "make-call", "action": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "action", rename_all = "kebab-case")]
pub enum Step {
    SendMessage(Message),
    MakeCall(Call),
    AcceptCall(Call),
    FinishCall(Call),
    ApiCall(ApiCall),
    ApiResponse(ApiResponse),
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::SendMessage(_) => StepKind::SendMessage,
            Step::MakeCall(_) => StepKind::MakeCall,
            Step::AcceptCall(_) => StepKind::AcceptCall,
            Step::FinishCall(_) => StepKind::FinishCall,
            Step::ApiCall(_) => StepKind::ApiCall,
            Step::ApiResponse(_) => StepKind::ApiResponse,
        }
    }

    pub fn sender(&self) -> &str {
        match self {
            Step::SendMessage(m) => &m.from,
            Step::MakeCall(c) | Step::AcceptCall(c) | Step::FinishCall(c) => &c.from,
            Step::ApiCall(a) => &a.from,
            Step::ApiResponse(r) => &r.from,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Step::SendMessage(m) => &m.to,
            Step::MakeCall(c) | Step::AcceptCall(c) | Step::FinishCall(c) => &c.to,
            Step::ApiCall(a) => &a.to,
            Step::ApiResponse(r) => &r.to,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Step::SendMessage(m) => m.timestamp,
            Step::MakeCall(c) | Step::AcceptCall(c) | Step::FinishCall(c) => c.timestamp,
            Step::ApiCall(a) => a.timestamp,
            Step::ApiResponse(r) => r.timestamp,
        }
    }

    /// True when `name` is either end of this step.
    pub fn touches(&self, name: &str) -> bool {
        self.sender() == name || self.recipient() == name
    }

    /// Short human-readable description of the payload
    pub fn detail(&self) -> String {
        match self {
            Step::SendMessage(m) => m.content.clone(),
            Step::MakeCall(c) | Step::AcceptCall(c) | Step::FinishCall(c) => {
                c.reason.clone().unwrap_or_default()
            }
            Step::ApiCall(a) => format!("{}: {}", a.service, a.request),
            Step::ApiResponse(r) => format!("{}: {}", r.service, r.response),
        }
    }
}

/// A human participant with a phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Human {
    pub name: String,
    #[serde(rename = "state", alias = "phoneState", default)]
    pub phone_state: PhoneState,
    /// Received messages keyed by sender name
    #[serde(default)]
    pub message_box: BTreeMap<String, Vec<Message>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Human {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            phone_state: PhoneState::Message,
            message_box: BTreeMap::new(),
            extra: ExtraFields::new(),
        }
    }

    /// Messages received from `sender`, oldest first
    pub fn messages_from(&self, sender: &str) -> &[Message] {
        self.message_box.get(sender).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn message_count(&self) -> usize {
        self.message_box.values().map(Vec::len).sum()
    }

    fn clear(&mut self) {
        self.phone_state = PhoneState::Message;
        self.message_box.clear();
    }
}

/// An AI agent. Its `steps` are the subsequence of applied steps it took part in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAgent {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AiAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
            extra: ExtraFields::new(),
        }
    }
}

/// Service-provider side participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Server {
    Human(Human),
    Ai(AiAgent),
}

impl Server {
    pub fn name(&self) -> &str {
        match self {
            Server::Human(h) => &h.name,
            Server::Ai(a) => &a.name,
        }
    }

    pub fn as_human(&self) -> Option<&Human> {
        match self {
            Server::Human(h) => Some(h),
            Server::Ai(_) => None,
        }
    }

    pub fn as_human_mut(&mut self) -> Option<&mut Human> {
        match self {
            Server::Human(h) => Some(h),
            Server::Ai(_) => None,
        }
    }
}

/// An authored scenario template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub customer: Human,
    pub agents: Vec<AiAgent>,
    pub servers: Vec<Server>,
    /// Global script in the order it must be applied
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Scenario {
    /// Parse and validate a single scenario document
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let scenario: Scenario =
            serde_json::from_str(json).map_err(|e| LoadError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the structural invariants a template must satisfy before loading.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.id.trim().is_empty() {
            return Err(LoadError::MissingId);
        }
        if self.steps.is_empty() {
            return Err(LoadError::EmptySteps {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Deep copy with every projection zeroed: empty message boxes, idle
    /// phones, empty agent views. The step script is kept.
    pub fn fresh(&self) -> Self {
        let mut copy = self.clone();
        copy.customer.clear();
        for agent in &mut copy.agents {
            agent.steps.clear();
        }
        for server in &mut copy.servers {
            match server {
                Server::Human(h) => h.clear(),
                Server::Ai(a) => a.steps.clear(),
            }
        }
        copy
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Every participant name that a step may legitimately address.
    pub fn participant_names(&self) -> Vec<&str> {
        let mut names = vec![CUSTOMER, self.customer.name.as_str()];
        names.extend(self.agents.iter().map(|a| a.name.as_str()));
        names.extend(self.servers.iter().map(Server::name));
        names
    }
}
