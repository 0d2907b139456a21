//! Step reducers
//!
//! One handler per [`Step`] variant. Reducers never reject a step: a name
//! that resolves to nobody simply produces no participant-state change.

use tracing::{debug, warn};

use super::{CallSession, LiveScenario};
use crate::observability::telemetry::sanitize_for_log;
use crate::scenario::{
    ApiCall, ApiResponse, Call, Human, Message, MessageType, PhoneState, SenderType, Server, Step,
    CUSTOMER,
};

/// Apply one step to the live instance.
///
/// The step is appended to the global log exactly once, whatever the
/// reducer decides, and the agent views are extended from that log.
pub(super) fn apply_step(live: &mut LiveScenario, step: &Step) {
    let index = live.steps.len();
    live.steps.push(step.clone());

    match step {
        Step::SendMessage(message) => send_message(live, message),
        Step::MakeCall(call) => make_call(live, call, index),
        Step::AcceptCall(call) => accept_call(live, call),
        Step::FinishCall(call) => finish_call(live, call),
        Step::ApiCall(api_call) => api_call_logged(api_call),
        Step::ApiResponse(api_response) => api_response_logged(api_response),
    }

    extend_agent_views(live, step);
}

/// Resolve a name to a human participant.
///
/// `"customer"` (or the customer's own name) wins; otherwise the FIRST server
/// with that exact name is used. Duplicate server names are not
/// disambiguated, and an AI server or unknown name resolves to `None`.
pub(super) fn resolve_human_mut<'a>(live: &'a mut LiveScenario, name: &str) -> Option<&'a mut Human> {
    if name == CUSTOMER || name == live.customer.name {
        return Some(&mut live.customer);
    }
    live.servers
        .iter_mut()
        .find(|s| s.name() == name)
        .and_then(Server::as_human_mut)
}

/// Classify a participant name: agents first, then the customer, then servers.
pub(super) fn sender_type(live: &LiveScenario, name: &str) -> SenderType {
    if live.agents.iter().any(|a| a.name == name) {
        return SenderType::Agent;
    }
    if name == CUSTOMER || name == live.customer.name {
        return SenderType::Customer;
    }
    if !live.servers.iter().any(|s| s.name() == name) {
        warn!(name = %sanitize_for_log(name), "Unknown sender, treating as server");
    }
    SenderType::Server
}

fn set_phone_state(live: &mut LiveScenario, name: &str, state: PhoneState) {
    if let Some(human) = resolve_human_mut(live, name) {
        human.phone_state = state;
    }
}

/// Copy of `message` as it lands in an inbox. Voice messages carry the open
/// session covering both ends; the applied log keeps the authored step.
fn delivered_copy(live: &LiveScenario, message: &Message) -> Message {
    let mut delivered = message.clone();
    if message.kind == MessageType::Voice {
        if let Some(session) = live.open_session_between(&message.from, &message.to) {
            delivered.extra.remove("callSession");
            delivered.call_session = Some(session.clone());
        }
    }
    delivered
}

fn send_message(live: &mut LiveScenario, message: &Message) {
    let delivered = delivered_copy(live, message);
    match resolve_human_mut(live, &message.to) {
        Some(recipient) => {
            recipient
                .message_box
                .entry(message.from.clone())
                .or_default()
                .push(delivered);
        }
        None => {
            debug!(
                to = %sanitize_for_log(&message.to),
                "Message recipient has no inbox, logged only"
            );
        }
    }

    let state = if message.kind.is_in_call() {
        PhoneState::Call
    } else {
        PhoneState::Message
    };
    set_phone_state(live, &message.from, state);
    set_phone_state(live, &message.to, state);
}

fn make_call(live: &mut LiveScenario, call: &Call, index: usize) {
    let caller_type = sender_type(live, &call.from);
    live.call_sessions.push(CallSession {
        id: index,
        caller: call.from.clone(),
        caller_type,
        start: call.timestamp,
        end: None,
        participants: vec![call.from.clone(), call.to.clone()],
        accepted: false,
    });
    set_phone_state(live, &call.to, PhoneState::Ring);
}

fn accept_call(live: &mut LiveScenario, call: &Call) {
    if let Some(session) = live
        .call_sessions
        .iter_mut()
        .find(|s| s.involves(&call.from, &call.to) && !s.accepted)
    {
        session.accepted = true;
    }
    // Each end is resolved on its own; an agent on either side is skipped.
    set_phone_state(live, &call.from, PhoneState::Call);
    set_phone_state(live, &call.to, PhoneState::Call);
}

fn finish_call(live: &mut LiveScenario, call: &Call) {
    if let Some(session) = live
        .call_sessions
        .iter_mut()
        .find(|s| s.involves(&call.from, &call.to) && s.end.is_none())
    {
        session.end = Some(call.timestamp);
    }
    set_phone_state(live, &call.from, PhoneState::Message);
    set_phone_state(live, &call.to, PhoneState::Message);
}

fn api_call_logged(api_call: &ApiCall) {
    debug!(service = %api_call.service, "API call recorded");
}

fn api_response_logged(api_response: &ApiResponse) {
    debug!(service = %api_response.service, "API response recorded");
}

fn extend_agent_views(live: &mut LiveScenario, step: &Step) {
    for agent in &mut live.agents {
        if step.touches(&agent.name) {
            agent.steps.push(step.clone());
        }
    }
    for server in &mut live.servers {
        if let Server::Ai(agent) = server {
            if step.touches(&agent.name) {
                agent.steps.push(step.clone());
            }
        }
    }
}
