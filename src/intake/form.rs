use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::intake::accumulator::ItemAccumulator;
use crate::models::{LoanDraft, LoanDuration, RequestorInfo};

const TEXT_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormField {
    Requestor,
    Reason,
    ExternalLocation,
    AssociatedEvent,
    Notes,
    ScheduledReturnDate,
    Items,
    Item { code: String },
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Requestor => write!(f, "requestor"),
            FormField::Reason => write!(f, "reason"),
            FormField::ExternalLocation => write!(f, "externalLocation"),
            FormField::AssociatedEvent => write!(f, "associatedEvent"),
            FormField::Notes => write!(f, "notes"),
            FormField::ScheduledReturnDate => write!(f, "scheduledReturnDate"),
            FormField::Items => write!(f, "items"),
            FormField::Item { code } => write!(f, "items[{}]", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Every rule violation found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has(&self, field: &FormField) -> bool {
        self.0.iter().any(|e| &e.field == field)
    }

    pub fn messages_for(&self, field: &FormField) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| &e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Return-date window and item limits
#[derive(Debug, Clone)]
pub struct DraftRules {
    pub extended_return_days: i64,
    pub standard_return_hours: i64,
    pub observations_max_len: usize,
}

impl DraftRules {
    /// Fixed return point of a standard loan started at `now`. `None` when
    /// the configured window is not positive or runs past the calendar.
    pub fn standard_return_point(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        window_end(now, Duration::try_hours(self.standard_return_hours))
    }

    pub fn latest_return(
        &self,
        duration: LoanDuration,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match duration {
            LoanDuration::Standard => self.standard_return_point(now),
            LoanDuration::Extended => {
                window_end(now, Duration::try_days(self.extended_return_days))
            }
        }
    }
}

fn window_end(now: DateTime<Utc>, window: Option<Duration>) -> Option<DateTime<Utc>> {
    let window = window.filter(|w| *w > Duration::zero())?;
    now.checked_add_signed(window)
}

/// Free-form fields of the loan form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanForm {
    pub reason: String,
    pub associated_event: String,
    pub external_location: String,
    pub notes: String,
    /// Items leave the institution; requires an external location
    pub off_site: bool,
    pub duration: LoanDuration,
    pub scheduled_return: Option<DateTime<Utc>>,
}

impl LoanForm {
    /// Validate every rule and build the payload, or report all field errors
    pub fn assemble(
        &self,
        requestor: Option<&RequestorInfo>,
        items: &ItemAccumulator,
        rules: &DraftRules,
        now: DateTime<Utc>,
        client_ref: Uuid,
    ) -> Result<LoanDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        if requestor.is_none() {
            errors.push(FormField::Requestor, "requestor must be validated");
        }

        let reason = self.reason.trim();
        if reason.is_empty() {
            errors.push(FormField::Reason, "reason is required");
        } else if reason.chars().count() > TEXT_MAX_LEN {
            errors.push(
                FormField::Reason,
                format!("reason must be at most {} characters", TEXT_MAX_LEN),
            );
        }

        let external_location = optional_text(&self.external_location);
        if self.off_site && external_location.is_none() {
            errors.push(
                FormField::ExternalLocation,
                "external location is required for off-site loans",
            );
        }
        for (field, value) in [
            (FormField::ExternalLocation, &self.external_location),
            (FormField::AssociatedEvent, &self.associated_event),
            (FormField::Notes, &self.notes),
        ] {
            if value.trim().chars().count() > TEXT_MAX_LEN {
                errors.push(
                    field,
                    format!("must be at most {} characters", TEXT_MAX_LEN),
                );
            }
        }

        let return_date = self.check_return_date(rules, now, &mut errors);

        if items.is_empty() {
            errors.push(FormField::Items, "at least one item is required");
        }
        for item in items.iter() {
            if item.quantity < 1 || item.quantity > item.max_quantity() {
                errors.push(
                    FormField::Item {
                        code: item.code.clone(),
                    },
                    format!("quantity must be between 1 and {}", item.max_quantity()),
                );
            }
            if item.exit_observations.chars().count() > rules.observations_max_len {
                errors.push(
                    FormField::Item {
                        code: item.code.clone(),
                    },
                    format!(
                        "observations must be at most {} characters",
                        rules.observations_max_len
                    ),
                );
            }
        }

        match (requestor, return_date) {
            (Some(requestor), Some(scheduled_return_date)) if errors.is_empty() => Ok(LoanDraft {
                client_ref,
                requestor_id: requestor.id,
                scheduled_return_date,
                reason: reason.to_string(),
                duration: self.duration,
                associated_event: optional_text(&self.associated_event),
                external_location,
                notes: optional_text(&self.notes),
                items: items.to_lines(),
            }),
            _ => Err(errors),
        }
    }

    fn check_return_date(
        &self,
        rules: &DraftRules,
        now: DateTime<Utc>,
        errors: &mut FieldErrors,
    ) -> Option<DateTime<Utc>> {
        let Some(latest) = rules.latest_return(self.duration, now) else {
            tracing::warn!("Return window misconfigured: {:?}", rules);
            errors.push(
                FormField::ScheduledReturnDate,
                "no valid return window is configured",
            );
            return None;
        };
        let Some(date) = self.scheduled_return else {
            return match self.duration {
                LoanDuration::Standard => Some(latest),
                LoanDuration::Extended => {
                    errors.push(
                        FormField::ScheduledReturnDate,
                        "return date is required for extended loans",
                    );
                    None
                }
            };
        };

        if date < now {
            errors.push(
                FormField::ScheduledReturnDate,
                "return date cannot be in the past",
            );
            return None;
        }
        if date > latest {
            errors.push(
                FormField::ScheduledReturnDate,
                format!("return date must be on or before {}", latest.to_rfc3339()),
            );
            return None;
        }
        Some(date)
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
