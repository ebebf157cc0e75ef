use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::mpsc;

use crate::api::PersonLookup;
use crate::error::{AppError, AppResult};
use crate::intake::timer::TimerHandle;
use crate::models::RequestorInfo;

static RE_NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum RequestorState {
    Idle,
    Validating,
    Valid(RequestorInfo),
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestorOutcome {
    Valid(RequestorInfo),
    NotFound(String),
    Failed(String),
}

#[derive(Debug)]
struct LookupMessage {
    generation: u64,
    outcome: RequestorOutcome,
}

/// National ID field with lookup. Auto-validates once the ID reaches the
/// configured length and locks after a successful match.
pub struct RequestorValidator {
    lookup: Arc<dyn PersonLookup>,
    id_length: usize,
    national_id: String,
    state: RequestorState,
    generation: u64,
    task: Option<TimerHandle>,
    tx: mpsc::UnboundedSender<LookupMessage>,
    rx: mpsc::UnboundedReceiver<LookupMessage>,
}

impl RequestorValidator {
    pub fn new(lookup: Arc<dyn PersonLookup>, id_length: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            lookup,
            id_length: id_length.max(1),
            national_id: String::new(),
            state: RequestorState::Idle,
            generation: 0,
            task: None,
            tx,
            rx,
        }
    }

    /// Update the ID field. Non-digits are dropped and input beyond the ID
    /// length is cut. Returns whether a validation was started.
    pub fn set_national_id(&mut self, raw: &str) -> AppResult<bool> {
        if self.is_locked() {
            return Err(AppError::InvalidInput(
                "requestor is already validated".to_string(),
            ));
        }

        let mut id = RE_NON_DIGIT.replace_all(raw, "").into_owned();
        id.truncate(self.id_length);
        if id == self.national_id {
            return Ok(self.trigger());
        }

        self.cancel();
        self.national_id = id;
        self.state = RequestorState::Idle;
        Ok(self.trigger())
    }

    /// Start a lookup for the current ID. Nothing is issued while locked,
    /// while a lookup is already in flight, or when the length is wrong.
    pub fn trigger(&mut self) -> bool {
        match self.state {
            RequestorState::Valid(_) | RequestorState::Validating => return false,
            _ => {}
        }
        if self.national_id.len() != self.id_length {
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let lookup = self.lookup.clone();
        let tx = self.tx.clone();
        let national_id = self.national_id.clone();
        self.task = Some(TimerHandle::spawn(async move {
            let outcome = match lookup.find_by_national_id(&national_id).await {
                Ok(Some(info)) => RequestorOutcome::Valid(info),
                Ok(None) => RequestorOutcome::NotFound(national_id),
                Err(e) => RequestorOutcome::Failed(e.to_string()),
            };
            let _ = tx.send(LookupMessage {
                generation,
                outcome,
            });
        }));
        self.state = RequestorState::Validating;
        tracing::debug!("Validating requestor: national_id={}", self.national_id);
        true
    }

    /// Wait for the in-flight lookup and apply its result
    pub async fn next_outcome(&mut self) -> Option<RequestorOutcome> {
        loop {
            if self.state != RequestorState::Validating {
                return None;
            }
            let message = self.rx.recv().await?;
            if message.generation != self.generation {
                continue;
            }
            self.task = None;
            self.state = match &message.outcome {
                RequestorOutcome::Valid(info) => RequestorState::Valid(info.clone()),
                RequestorOutcome::NotFound(id) => {
                    RequestorState::Invalid(format!("No person registered with ID {}", id))
                }
                RequestorOutcome::Failed(reason) => RequestorState::Invalid(reason.clone()),
            };
            return Some(message.outcome);
        }
    }

    /// Trigger and wait in one step
    pub async fn validate(&mut self) -> AppResult<RequestorInfo> {
        if let RequestorState::Valid(info) = &self.state {
            return Ok(info.clone());
        }
        if !self.trigger() && self.state != RequestorState::Validating {
            return Err(AppError::InvalidInput(format!(
                "national ID must have {} digits",
                self.id_length
            )));
        }
        match self.next_outcome().await {
            Some(RequestorOutcome::Valid(info)) => Ok(info),
            Some(RequestorOutcome::NotFound(id)) => Err(AppError::NotFound(id)),
            Some(RequestorOutcome::Failed(reason)) => Err(AppError::Internal(reason)),
            None => Err(AppError::Internal("requestor lookup cancelled".to_string())),
        }
    }

    pub fn national_id(&self) -> &str {
        &self.national_id
    }

    pub fn state(&self) -> &RequestorState {
        &self.state
    }

    pub fn info(&self) -> Option<&RequestorInfo> {
        match &self.state {
            RequestorState::Valid(info) => Some(info),
            _ => None,
        }
    }

    /// The ID field is read-only once a requestor is matched
    pub fn is_locked(&self) -> bool {
        matches!(self.state, RequestorState::Valid(_))
    }

    fn cancel(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.generation += 1;
        if self.state == RequestorState::Validating {
            self.state = RequestorState::Idle;
        }
    }

    /// Abort the in-flight lookup, keeping the typed ID
    pub fn close(&mut self) {
        self.cancel();
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.national_id.clear();
        self.state = RequestorState::Idle;
    }
}
