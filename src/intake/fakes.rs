// In-memory capabilities for intake tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::{ConditionList, ItemLookup, LoanSubmitter, PersonLookup};
use crate::error::{AppError, AppResult};
use crate::intake::{IntakeServices, NoticeLog};
use crate::models::{Condition, CreatedLoan, ItemRecord, LoanDraft, RequestorInfo};

#[derive(Default)]
pub struct FakeApi {
    pub items: HashMap<String, ItemRecord>,
    pub people: HashMap<String, RequestorInfo>,
    pub conditions: Vec<Condition>,
    pub lookup_delay: Duration,
    pub fail_submit: AtomicBool,
    pub fail_lookups: AtomicBool,
    pub item_calls: AtomicUsize,
    pub person_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<LoanDraft>>,
    pub attempts: Mutex<Vec<Uuid>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, id: i64, code: &str, stock: u32) -> Self {
        self.items.insert(
            code.to_string(),
            ItemRecord {
                id,
                code: code.to_string(),
                name: format!("Item {}", code),
                stock,
                image: None,
                characteristics: None,
                description: None,
            },
        );
        self
    }

    pub fn with_person(mut self, id: i64, national_id: &str) -> Self {
        self.people.insert(
            national_id.to_string(),
            RequestorInfo {
                id,
                national_id: national_id.to_string(),
                first_name: "Ana".to_string(),
                last_name: "Vera".to_string(),
                email: Some("ana.vera@example.edu".to_string()),
                phone: None,
                kind: Some("docente".to_string()),
            },
        );
        self
    }

    pub fn with_conditions(mut self) -> Self {
        self.conditions = vec![
            Condition {
                id: 1,
                name: "Good".to_string(),
                description: None,
                requires_maintenance: false,
            },
            Condition {
                id: 2,
                name: "Damaged".to_string(),
                description: Some("Needs repair".to_string()),
                requires_maintenance: true,
            },
        ];
        self
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }

    pub fn person_calls(&self) -> usize {
        self.person_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
    }
}

#[async_trait]
impl ItemLookup for FakeApi {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<ItemRecord>> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        Ok(self.items.get(code).cloned())
    }
}

#[async_trait]
impl PersonLookup for FakeApi {
    async fn find_by_national_id(&self, national_id: &str) -> AppResult<Option<RequestorInfo>> {
        self.person_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset".to_string()));
        }
        Ok(self.people.get(national_id).cloned())
    }
}

#[async_trait]
impl ConditionList for FakeApi {
    async fn list_conditions(&self) -> AppResult<Vec<Condition>> {
        Ok(self.conditions.clone())
    }
}

#[async_trait]
impl LoanSubmitter for FakeApi {
    async fn create_loan(&self, draft: &LoanDraft) -> AppResult<CreatedLoan> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.attempts
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?
            .push(draft.client_ref);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Unexpected response: status=503".to_string()));
        }
        self.submitted
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?
            .push(draft.clone());
        Ok(CreatedLoan {
            id: 100 + call as i64,
            status: Some("active".to_string()),
            created_at: None,
        })
    }
}

pub fn services(api: &Arc<FakeApi>, notices: &Arc<NoticeLog>) -> IntakeServices {
    IntakeServices {
        items: api.clone(),
        people: api.clone(),
        conditions: api.clone(),
        loans: api.clone(),
        notifier: notices.clone(),
    }
}
