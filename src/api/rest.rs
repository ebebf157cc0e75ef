use async_trait::async_trait;

use crate::api::{ConditionList, ItemLookup, LoanSubmitter, PersonLookup};
use crate::config::Config;
use crate::error::AppResult;
use crate::http_client::HttpClient;
use crate::models::{Condition, CreatedLoan, ItemRecord, LoanDraft, RequestorInfo};

/// REST implementation of every intake capability
#[derive(Clone)]
pub struct RestApi {
    http: HttpClient,
}

impl RestApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http = HttpClient::new(
            &config.api_base_url,
            config.api_token.clone(),
            config.http_timeout(),
        )?;
        Ok(Self::new(http))
    }
}

#[async_trait]
impl ItemLookup for RestApi {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<ItemRecord>> {
        let url = self.http.url(&["items", "code", code]);
        tracing::debug!("GET {}", url);
        self.http.get_optional(&url).await
    }
}

#[async_trait]
impl PersonLookup for RestApi {
    async fn find_by_national_id(&self, national_id: &str) -> AppResult<Option<RequestorInfo>> {
        let url = self.http.url(&["people", "national-id", national_id]);
        tracing::debug!("GET {}", url);
        let person: Option<RequestorInfo> = self.http.get_optional(&url).await?;
        // Some deployments omit the ID echo in the response body
        Ok(person.map(|mut p| {
            if p.national_id.is_empty() {
                p.national_id = national_id.to_string();
            }
            p
        }))
    }
}

#[async_trait]
impl ConditionList for RestApi {
    async fn list_conditions(&self) -> AppResult<Vec<Condition>> {
        let url = self.http.url(&["conditions"]);
        tracing::debug!("GET {}", url);
        self.http.get_json(&url).await
    }
}

#[async_trait]
impl LoanSubmitter for RestApi {
    async fn create_loan(&self, draft: &LoanDraft) -> AppResult<CreatedLoan> {
        let url = self.http.url(&["loans"]);
        tracing::info!(
            "POST {} requestor_id={} items={} ref={}",
            url,
            draft.requestor_id,
            draft.items.len(),
            draft.client_ref
        );
        self.http
            .post_json(
                &url,
                draft,
                &[("Idempotency-Key", draft.client_ref.to_string())],
            )
            .await
    }
}
