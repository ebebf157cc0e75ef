use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url, token))
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET returning `None` on 404
    pub async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> AppResult<Option<T>> {
        let response = self.authorize(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, String)],
    ) -> AppResult<T> {
        let mut builder = self.authorize(self.client.post(url)).json(body);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let response = Self::check_status(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                Err(AppError::Rejected(body))
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound(body)),
            _ => Err(AppError::Internal(format!(
                "Unexpected response: status={}, body={}",
                status, body
            ))),
        }
    }
}
