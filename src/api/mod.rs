// Capabilities consumed by the loan intake flow

pub mod rest;

pub use rest::RestApi;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Condition, CreatedLoan, ItemRecord, LoanDraft, RequestorInfo};

/// Item lookup by scanned code. `Ok(None)` means the code is unknown.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<ItemRecord>>;
}

/// Person lookup by national ID. `Ok(None)` means no such person.
#[async_trait]
pub trait PersonLookup: Send + Sync {
    async fn find_by_national_id(&self, national_id: &str) -> AppResult<Option<RequestorInfo>>;
}

/// Read-only list of item conditions, in display order
#[async_trait]
pub trait ConditionList: Send + Sync {
    async fn list_conditions(&self) -> AppResult<Vec<Condition>>;
}

#[async_trait]
pub trait LoanSubmitter: Send + Sync {
    async fn create_loan(&self, draft: &LoanDraft) -> AppResult<CreatedLoan>;
}
