//! One instruction at a time: snapshot the room, ask the reasoning
//! service, validate the reply against the room as it is when the reply
//! lands, then apply it.
//!
//! Requests are not serialized. Two instructions in flight both validate
//! against the state current at their own completion, and the later
//! completion wins.

use std::sync::Arc;

use roomcast_core::{validate, ApplySummary, RenderSurface, RoomSession, ValidationError};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::reasoning::{ReasoningService, TransportError};

pub const TRANSPORT_FAILURE_MESSAGE: &str = "API error. Please try again.";
pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "Could not understand that instruction. Please try again.";
pub const MISSING_API_KEY_MESSAGE: &str =
    "Please set your API key (GEMINI_API_KEY or api_key in the config file) first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionPhase {
    Idle,
    AwaitingResponse,
    Validating,
    Applying,
    Error,
}

#[derive(Debug, Error)]
pub enum InstructionFailure {
    #[error("reasoning service failed: {0}")]
    Transport(#[from] TransportError),
    #[error("reasoning service reply rejected: {0}")]
    Malformed(#[from] ValidationError),
}

impl InstructionFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            InstructionFailure::Transport(TransportError::MissingApiKey) => {
                MISSING_API_KEY_MESSAGE
            }
            InstructionFailure::Transport(_) => TRANSPORT_FAILURE_MESSAGE,
            InstructionFailure::Malformed(_) => MALFORMED_RESPONSE_MESSAGE,
        }
    }
}

/// An instruction that has left `Idle` and is waiting on the service.
#[derive(Debug, Clone)]
pub struct PendingInstruction {
    pub id: u64,
    pub text: String,
    pub room_state: String,
}

#[derive(Debug)]
pub struct ServiceReply {
    pub id: u64,
    pub text: String,
    pub result: Result<String, TransportError>,
}

#[derive(Debug)]
pub enum InstructionOutcome {
    Applied {
        user_message: String,
        summary: ApplySummary,
        dropped: Vec<String>,
    },
    Failed(InstructionFailure),
}

#[derive(Debug)]
pub struct InstructionReport {
    pub id: u64,
    pub instruction: String,
    /// Every phase the instruction passed through, ending in `Idle`.
    pub phases: Vec<InstructionPhase>,
    pub outcome: InstructionOutcome,
}

impl InstructionReport {
    /// Text to show the user.
    pub fn message(&self) -> &str {
        match &self.outcome {
            InstructionOutcome::Applied { user_message, .. } => user_message,
            InstructionOutcome::Failed(failure) => failure.user_message(),
        }
    }

    pub fn final_phase(&self) -> InstructionPhase {
        self.phases.last().copied().unwrap_or(InstructionPhase::Idle)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, InstructionOutcome::Applied { .. })
    }
}

pub struct Orchestrator {
    service: Arc<dyn ReasoningService>,
    next_id: u64,
    in_flight: usize,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Orchestrator {
            service,
            next_id: 0,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn phase(&self) -> InstructionPhase {
        if self.in_flight > 0 {
            InstructionPhase::AwaitingResponse
        } else {
            InstructionPhase::Idle
        }
    }

    /// Leave `Idle` for `text`, capturing the room as the service will see
    /// it. Blank instructions are ignored.
    pub fn begin<S: RenderSurface>(
        &mut self,
        text: &str,
        session: &RoomSession<S>,
    ) -> Option<PendingInstruction> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let room_state = session.state().to_json().unwrap_or_else(|err| {
            log::warn!("room state did not serialize: {err}");
            String::from("{}")
        });
        self.next_id += 1;
        self.in_flight += 1;
        log::info!("instruction #{} sent: {text:?}", self.next_id);
        Some(PendingInstruction {
            id: self.next_id,
            text: text.to_string(),
            room_state,
        })
    }

    /// Await the service for one pending instruction.
    pub async fn dispatch(service: &dyn ReasoningService, pending: PendingInstruction) -> ServiceReply {
        let result = service.request(&pending.text, &pending.room_state).await;
        ServiceReply {
            id: pending.id,
            text: pending.text,
            result,
        }
    }

    /// Run the request on the runtime and deliver the reply on `replies`,
    /// where the host loop picks it up.
    pub fn spawn(&self, pending: PendingInstruction, replies: mpsc::UnboundedSender<ServiceReply>) {
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            let reply = Self::dispatch(service.as_ref(), pending).await;
            if replies.send(reply).is_err() {
                log::debug!("host loop closed before the reply arrived");
            }
        });
    }

    /// Validate and apply a reply. Nothing is mutated unless validation
    /// passes in full.
    pub fn complete<S: RenderSurface>(
        &mut self,
        reply: ServiceReply,
        session: &mut RoomSession<S>,
    ) -> InstructionReport {
        self.in_flight = self.in_flight.saturating_sub(1);
        let mut phases = vec![InstructionPhase::AwaitingResponse];
        let outcome = match Self::validate_and_apply(reply.result, session, &mut phases) {
            Ok(outcome) => outcome,
            Err(failure) => {
                log::warn!("instruction #{} failed: {failure}", reply.id);
                phases.push(InstructionPhase::Error);
                InstructionOutcome::Failed(failure)
            }
        };
        phases.push(InstructionPhase::Idle);
        InstructionReport {
            id: reply.id,
            instruction: reply.text,
            phases,
            outcome,
        }
    }

    fn validate_and_apply<S: RenderSurface>(
        result: Result<String, TransportError>,
        session: &mut RoomSession<S>,
        phases: &mut Vec<InstructionPhase>,
    ) -> Result<InstructionOutcome, InstructionFailure> {
        let raw = result?;
        phases.push(InstructionPhase::Validating);
        let instruction = validate(&raw, session.state())?;
        log::info!(
            "validated {} action(s), {} dropped",
            instruction.actions.len(),
            instruction.dropped.len()
        );

        phases.push(InstructionPhase::Applying);
        let summary = session.apply(&instruction);
        Ok(InstructionOutcome::Applied {
            user_message: instruction.user_message,
            summary,
            dropped: instruction.dropped,
        })
    }

    /// Begin, await, and complete in one call. Returns `None` for blank text.
    pub async fn submit_instruction<S: RenderSurface>(
        &mut self,
        text: &str,
        session: &mut RoomSession<S>,
    ) -> Option<InstructionReport> {
        let pending = self.begin(text, session)?;
        let reply = Self::dispatch(self.service.as_ref(), pending).await;
        Some(self.complete(reply, session))
    }
}
