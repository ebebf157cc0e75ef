//! Loan intake flow: scanning items into a draft, validating the requestor
//! and submitting the assembled loan.

pub mod accumulator;
pub mod form;
pub mod notify;
pub mod requestor;
pub mod scanner;
pub mod session;
pub mod timer;

#[cfg(test)]
pub(crate) mod fakes;

pub use accumulator::ItemAccumulator;
pub use form::{DraftRules, FieldError, FieldErrors, FormField, LoanForm};
pub use notify::{Notice, NoticeLevel, NoticeLog, Notifier, TracingNotifier};
pub use requestor::{RequestorOutcome, RequestorState, RequestorValidator};
pub use scanner::{ScanIntake, ScanOutcome, ScanState};
pub use session::{IntakeServices, LoanIntakeSession, RequestorEvent, ScanEvent, SubmitState};
pub use timer::TimerHandle;

use std::time::Duration;

/// Tunables for one intake session
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    /// Buffered characters required before a scan lookup is armed
    pub scan_min_length: usize,
    pub scan_debounce: Duration,
    pub national_id_length: usize,
    pub observations_max_len: usize,
    pub extended_return_days: i64,
    pub standard_return_hours: i64,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            scan_min_length: 3,
            scan_debounce: Duration::from_millis(800),
            national_id_length: 10,
            observations_max_len: 250,
            extended_return_days: 10,
            standard_return_hours: 24,
        }
    }
}

impl IntakeSettings {
    pub fn draft_rules(&self) -> DraftRules {
        DraftRules {
            extended_return_days: self.extended_return_days,
            standard_return_hours: self.standard_return_hours,
            observations_max_len: self.observations_max_len,
        }
    }
}
