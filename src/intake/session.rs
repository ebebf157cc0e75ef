use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::{ConditionList, ItemLookup, LoanSubmitter, PersonLookup, RestApi};
use crate::error::{AppError, AppResult};
use crate::intake::accumulator::ItemAccumulator;
use crate::intake::form::{DraftRules, FieldErrors, LoanForm};
use crate::intake::notify::{Notice, NoticeLevel, Notifier};
use crate::intake::requestor::{RequestorOutcome, RequestorState, RequestorValidator};
use crate::intake::scanner::{ScanIntake, ScanOutcome};
use crate::intake::IntakeSettings;
use crate::models::{Condition, CreatedLoan, LoanDraft, RequestorInfo, ScannedItem};

/// Collaborators injected into a session
#[derive(Clone)]
pub struct IntakeServices {
    pub items: Arc<dyn ItemLookup>,
    pub people: Arc<dyn PersonLookup>,
    pub conditions: Arc<dyn ConditionList>,
    pub loans: Arc<dyn LoanSubmitter>,
    pub notifier: Arc<dyn Notifier>,
}

impl IntakeServices {
    /// Every capability backed by the same REST client
    pub fn rest(api: RestApi, notifier: Arc<dyn Notifier>) -> Self {
        let api = Arc::new(api);
        Self {
            items: api.clone(),
            people: api.clone(),
            conditions: api.clone(),
            loans: api,
            notifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Added(ScannedItem),
    Duplicate(String),
    NotFound(String),
    Failed { code: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestorEvent {
    Validated(RequestorInfo),
    NotFound(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitState {
    Draft,
    Submitting,
    Submitted(CreatedLoan),
    /// Last attempt failed; the draft is untouched
    SubmitFailed(String),
}

/// State of one loan form, from the first scan to the creation call
pub struct LoanIntakeSession {
    services: IntakeServices,
    rules: DraftRules,
    items: ItemAccumulator,
    scan: ScanIntake,
    requestor: RequestorValidator,
    form: LoanForm,
    conditions: Vec<Condition>,
    submit_state: SubmitState,
    draft_ref: Uuid,
}

impl LoanIntakeSession {
    pub fn new(services: IntakeServices, settings: &IntakeSettings) -> Self {
        let scan = ScanIntake::new(
            services.items.clone(),
            settings.scan_min_length,
            settings.scan_debounce,
        );
        let requestor =
            RequestorValidator::new(services.people.clone(), settings.national_id_length);

        Self {
            rules: settings.draft_rules(),
            items: ItemAccumulator::new(settings.observations_max_len),
            scan,
            requestor,
            form: LoanForm::default(),
            conditions: Vec::new(),
            submit_state: SubmitState::Draft,
            draft_ref: Uuid::new_v4(),
            services,
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.services.notifier.notify(Notice::new(level, message));
    }

    pub async fn load_conditions(&mut self) -> AppResult<&[Condition]> {
        match self.services.conditions.list_conditions().await {
            Ok(conditions) => {
                tracing::info!("Loaded {} conditions", conditions.len());
                self.conditions = conditions;
                Ok(self.conditions.as_slice())
            }
            Err(e) => {
                tracing::error!("Failed to load conditions: {}", e);
                self.notify(NoticeLevel::Error, "Could not load item conditions");
                Err(e)
            }
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Append keystrokes. Lookups that finished before this call are folded
    /// into the item list first and returned.
    pub fn scan_input(&mut self, text: &str) -> Vec<ScanEvent> {
        let events = self.apply_finished_scans();
        self.scan.input(text);
        events
    }

    pub fn set_scan_buffer(&mut self, text: &str) -> Vec<ScanEvent> {
        let events = self.apply_finished_scans();
        self.scan.set_buffer(text);
        events
    }

    fn apply_finished_scans(&mut self) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Some(outcome) = self.scan.try_next_outcome() {
            events.push(self.apply_scan(outcome));
        }
        events
    }

    pub fn scan(&self) -> &ScanIntake {
        &self.scan
    }

    /// Wait for the pending scan lookup and fold its result into the item list
    pub async fn next_scan_event(&mut self) -> Option<ScanEvent> {
        let outcome = self.scan.next_outcome().await?;
        Some(self.apply_scan(outcome))
    }

    fn apply_scan(&mut self, outcome: ScanOutcome) -> ScanEvent {
        match outcome {
            ScanOutcome::Found(record) => {
                let code = record.code.clone();
                match self.items.add_item(record).cloned() {
                    Ok(item) => {
                        tracing::info!("Item added: code={}", item.code);
                        ScanEvent::Added(item)
                    }
                    Err(AppError::Duplicate(_)) => {
                        self.notify(
                            NoticeLevel::Warning,
                            format!("Item {} is already in the list", code),
                        );
                        ScanEvent::Duplicate(code)
                    }
                    Err(e) => {
                        tracing::warn!("Scanned item rejected: code={:?}, error={}", code, e);
                        self.notify(NoticeLevel::Error, "The scanned item could not be added");
                        ScanEvent::Failed {
                            code,
                            reason: e.to_string(),
                        }
                    }
                }
            }
            ScanOutcome::NotFound(code) => {
                tracing::warn!("Scanned code not found: {}", code);
                self.notify(NoticeLevel::Error, format!("No item found with code {}", code));
                ScanEvent::NotFound(code)
            }
            ScanOutcome::Failed { code, reason } => {
                tracing::error!("Scan lookup failed: code={}, error={}", code, reason);
                self.notify(NoticeLevel::Error, "Could not look up the scanned item");
                ScanEvent::Failed { code, reason }
            }
        }
    }

    pub fn items(&self) -> &ItemAccumulator {
        &self.items
    }

    pub fn remove_item(&mut self, code: &str) -> Option<ScannedItem> {
        self.items.remove_item(code)
    }

    pub fn set_quantity(&mut self, code: &str, quantity: i64) -> Option<u32> {
        self.items.set_quantity(code, quantity)
    }

    /// Set the exit condition of an item. Once the condition list is loaded,
    /// ids outside it are rejected.
    pub fn set_condition(&mut self, code: &str, condition_id: Option<i64>) -> AppResult<bool> {
        if let Some(id) = condition_id {
            if !self.conditions.is_empty() {
                let condition = self
                    .conditions
                    .iter()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::InvalidInput(format!("unknown condition {}", id)))?;
                if condition.requires_maintenance && self.items.contains(code) {
                    self.notify(
                        NoticeLevel::Warning,
                        format!("{} is marked as needing maintenance", condition.name),
                    );
                }
            }
        }
        Ok(self.items.set_condition(code, condition_id))
    }

    pub fn set_observations(&mut self, code: &str, text: &str) -> Option<String> {
        self.items.set_observations(code, text).map(str::to_string)
    }

    /// Update the national ID field; validation starts at the full length
    pub fn enter_national_id(&mut self, raw: &str) -> AppResult<bool> {
        self.requestor.set_national_id(raw).inspect_err(|e| {
            tracing::warn!("National ID edit rejected: {}", e);
        })
    }

    pub async fn next_requestor_event(&mut self) -> Option<RequestorEvent> {
        let outcome = self.requestor.next_outcome().await?;
        Some(self.apply_requestor(outcome))
    }

    /// Validate the typed ID now, waiting for the lookup. An already
    /// validated requestor is returned as is.
    pub async fn validate_requestor(&mut self) -> AppResult<RequestorInfo> {
        if let Some(info) = self.requestor.info() {
            return Ok(info.clone());
        }
        let result = self.requestor.validate().await;
        match &result {
            Ok(info) => {
                self.apply_requestor(RequestorOutcome::Valid(info.clone()));
            }
            Err(AppError::NotFound(id)) => {
                self.apply_requestor(RequestorOutcome::NotFound(id.clone()));
            }
            Err(AppError::InvalidInput(message)) => {
                self.notify(NoticeLevel::Warning, message.clone());
            }
            Err(e) => {
                self.apply_requestor(RequestorOutcome::Failed(e.to_string()));
            }
        }
        result
    }

    fn apply_requestor(&self, outcome: RequestorOutcome) -> RequestorEvent {
        match outcome {
            RequestorOutcome::Valid(info) => {
                tracing::info!("Requestor validated: id={}", info.id);
                self.notify(
                    NoticeLevel::Success,
                    format!("Requestor {} validated", info.full_name()),
                );
                RequestorEvent::Validated(info)
            }
            RequestorOutcome::NotFound(id) => {
                self.notify(NoticeLevel::Error, format!("No person found with ID {}", id));
                RequestorEvent::NotFound(id)
            }
            RequestorOutcome::Failed(reason) => {
                tracing::error!("Requestor lookup failed: {}", reason);
                self.notify(NoticeLevel::Error, "Could not validate the requestor");
                RequestorEvent::Failed(reason)
            }
        }
    }

    pub fn requestor(&self) -> Option<&RequestorInfo> {
        self.requestor.info()
    }

    pub fn requestor_state(&self) -> &RequestorState {
        self.requestor.state()
    }

    pub fn national_id(&self) -> &str {
        self.requestor.national_id()
    }

    pub fn form(&self) -> &LoanForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LoanForm {
        &mut self.form
    }

    pub fn submit_state(&self) -> &SubmitState {
        &self.submit_state
    }

    pub fn validate(&self) -> Result<LoanDraft, FieldErrors> {
        self.validate_at(Utc::now())
    }

    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<LoanDraft, FieldErrors> {
        self.form.assemble(
            self.requestor.info(),
            &self.items,
            &self.rules,
            now,
            self.draft_ref,
        )
    }

    pub async fn submit(&mut self) -> AppResult<CreatedLoan> {
        self.submit_at(Utc::now()).await
    }

    /// Validate and send the draft. Nothing is sent when validation fails;
    /// on a failed call the draft stays as it was so the user can retry.
    pub async fn submit_at(&mut self, now: DateTime<Utc>) -> AppResult<CreatedLoan> {
        let draft = match self.validate_at(now) {
            Ok(draft) => draft,
            Err(errors) => {
                tracing::warn!("Loan draft invalid: {}", errors);
                self.notify(NoticeLevel::Warning, "Please review the highlighted fields");
                return Err(AppError::Validation(errors));
            }
        };

        self.submit_state = SubmitState::Submitting;
        match self.services.loans.create_loan(&draft).await {
            Ok(created) => {
                tracing::info!("Loan created: id={}", created.id);
                self.notify(NoticeLevel::Success, "Loan registered");
                self.reset();
                self.submit_state = SubmitState::Submitted(created.clone());
                Ok(created)
            }
            Err(e) => {
                tracing::error!("Loan submission failed: {}", e);
                self.notify(NoticeLevel::Error, "Could not register the loan, please try again");
                self.submit_state = SubmitState::SubmitFailed(e.to_string());
                Err(e)
            }
        }
    }

    /// Clear the whole form and start a fresh draft
    pub fn reset(&mut self) {
        self.items.clear();
        self.scan.reset();
        self.requestor.reset();
        self.form = LoanForm::default();
        self.submit_state = SubmitState::Draft;
        self.draft_ref = Uuid::new_v4();
    }

    /// Tear down: no timer or lookup started by this session fires afterwards
    pub fn close(&mut self) {
        self.scan.close();
        self.requestor.close();
    }

    pub fn reopen(&mut self) {
        self.scan.reopen();
    }
}
