//! HTTP client for the price scheduling backend.
//!
//! Wraps `reqwest` with typed request/response bodies and status handling.
//! Reads (`/tags`, `/collections`, `/preview`) retry transient failures;
//! writes (`/simulate`, `/apply-schedule`, `/revert-now`) are sent once.

use std::time::Duration;

use dynamate_core::{
    AppConfig, Collection, FilterSelection, RevertRequest, SchedulePayload, SimulatedVariant,
    SimulationRequest, Variant,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::retry::retry_with_backoff;

/// Error bodies longer than this are cut before they land in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Acknowledgement returned by the write endpoints. The backend may answer
/// with `{ "message": "..." }`, a bare string, or an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the scheduling backend's REST API.
///
/// Use [`DynamateClient::new`] with the loaded [`AppConfig`], or
/// [`DynamateClient::with_base_url`] to point at a mock server in tests.
pub struct DynamateClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DynamateClient {
    /// # Errors
    ///
    /// See [`DynamateClient::with_base_url`].
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Creates a client for an explicit base URL.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable GET errors. Set to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // A trailing slash makes `Url::join` append to the base path instead
        // of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches all product tags, sorted.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure after retries.
    /// - [`ClientError::NotFound`] / [`ClientError::UnexpectedStatus`] on non-2xx.
    /// - [`ClientError::Deserialize`] if the body is not a JSON string array.
    pub async fn list_tags(&self) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint("tags", &[])?;
        let mut tags: Vec<String> = self.get_json(&url, "GET /tags").await?;
        tags.sort();
        Ok(tags)
    }

    /// Fetches all collections, sorted by title (case-insensitive).
    ///
    /// # Errors
    ///
    /// Same as [`DynamateClient::list_tags`].
    pub async fn list_collections(&self) -> Result<Vec<Collection>, ClientError> {
        let url = self.endpoint("collections", &[])?;
        let mut collections: Vec<Collection> =
            self.get_json(&url, "GET /collections").await?;
        collections.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(collections)
    }

    /// Fetches the variants matched by `filter`, in backend order.
    ///
    /// # Errors
    ///
    /// Same as [`DynamateClient::list_tags`].
    pub async fn fetch_preview(&self, filter: &FilterSelection) -> Result<Vec<Variant>, ClientError> {
        let url = self.endpoint("preview", &[filter.query_pair()])?;
        let variants: Vec<Variant> = self.get_json(&url, "GET /preview").await?;
        tracing::debug!(%filter, count = variants.len(), "fetched preview");
        Ok(variants)
    }

    /// Asks the backend to simulate a rule without applying it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure (not retried).
    /// - [`ClientError::NotFound`] / [`ClientError::UnexpectedStatus`] on non-2xx.
    /// - [`ClientError::Deserialize`] if the body is not a variant array.
    pub async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<Vec<SimulatedVariant>, ClientError> {
        let body = self.post("simulate", request).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: "POST /simulate".to_owned(),
            source: e,
        })
    }

    /// Submits a scheduled price change.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure (not retried).
    /// - [`ClientError::NotFound`] / [`ClientError::UnexpectedStatus`] on non-2xx.
    pub async fn apply_schedule(&self, payload: &SchedulePayload) -> Result<BackendAck, ClientError> {
        tracing::info!(
            filter = %payload.filter,
            rule = %payload.rule_type,
            apply_now = payload.apply_now,
            "submitting price schedule"
        );
        let body = self.post("apply-schedule", payload).await?;
        Ok(parse_ack(&body))
    }

    /// Reverts prices for the filter immediately.
    ///
    /// # Errors
    ///
    /// Same as [`DynamateClient::apply_schedule`].
    pub async fn revert_now(&self, request: &RevertRequest) -> Result<BackendAck, ClientError> {
        tracing::info!(filter = %request.filter, "requesting immediate revert");
        let body = self.post("revert-now", request).await?;
        Ok(parse_ack(&body))
    }

    /// Resolves `path` against the base URL and appends percent-encoded
    /// query parameters.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join \"{path}\": {e}"),
            })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T>(&self, url: &Url, context: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            let body = checked_body(response, url).await?;
            serde_json::from_str::<T>(&body).map_err(|e| ClientError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
        })
        .await
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<String, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path, &[])?;
        let response = self.client.post(url.clone()).json(body).send().await?;
        checked_body(response, &url).await
    }
}

/// Maps non-2xx statuses to typed errors and returns the body text otherwise.
async fn checked_body(response: Response, url: &Url) -> Result<String, ClientError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body: truncate(body.trim(), MAX_ERROR_BODY_CHARS),
        });
    }

    Ok(response.text().await?)
}

fn parse_ack(body: &str) -> BackendAck {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(message)) => BackendAck {
            message: Some(message),
        },
        Ok(value) => serde_json::from_value(value).unwrap_or_default(),
        Err(_) => BackendAck::default(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
