//! reqwest client for the cattle-management REST API

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::{RemoteError, RemoteResult, RemoteService};
use crate::models::{EntityId, EntityKind, ListQuery};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Default request timeout, matching the mobile client
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct HttpRemoteConfig {
    /// API base URL, e.g. `http://localhost:3001/api`
    pub base_url: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl HttpRemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = normalize_text_option(Some(token.into()));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for HttpRemoteConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpRemoteConfig")
            .field("base_url", &self.base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(config: HttpRemoteConfig) -> RemoteResult<Self> {
        let base_url = normalize_base_url(config.base_url)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url,
            auth_token: config.auth_token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base_url, kind.collection_path())
    }

    fn item_url(&self, kind: EntityKind, id: &EntityId) -> String {
        format!("{}/{}", self.collection_url(kind), id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn list(&self, kind: EntityKind, query: &ListQuery) -> RemoteResult<Vec<Value>> {
        let request = self
            .client
            .get(self.collection_url(kind))
            .query(&query.to_query_pairs());
        let payload = self.send(request).await?.json::<Value>().await?;
        unwrap_list(payload)
    }

    async fn create(&self, kind: EntityKind, payload: Value) -> RemoteResult<Value> {
        let request = self.client.post(self.collection_url(kind)).json(&payload);
        let body = self.send(request).await?.json::<Value>().await?;
        unwrap_entity(body)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        changes: Value,
    ) -> RemoteResult<Value> {
        let request = self.client.put(self.item_url(kind, id)).json(&changes);
        let body = self.send(request).await?.json::<Value>().await?;
        unwrap_entity(body)
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<()> {
        self.send(self.client.delete(self.item_url(kind, id)))
            .await?;
        Ok(())
    }

    async fn health(&self) -> RemoteResult<()> {
        self.send(self.client.get(format!("{}/health", self.base_url)))
            .await?;
        Ok(())
    }
}

/// Accept either a bare array or a `{ "data": [...], "pagination": ... }` page
fn unwrap_list(payload: Value) -> RemoteResult<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(RemoteError::InvalidPayload(
                "list response has no data array".to_string(),
            )),
        },
        other => Err(RemoteError::InvalidPayload(format!(
            "unexpected list response: {}",
            compact_text(&other.to_string())
        ))),
    }
}

/// Accept either the entity itself or an entity wrapped in `{ "data": {...} }`
fn unwrap_entity(payload: Value) -> RemoteResult<Value> {
    match payload {
        Value::Object(mut map) => {
            let has_id = map.contains_key("_id") || map.contains_key("id");
            if !has_id {
                if let Some(inner @ Value::Object(_)) = map.remove("data") {
                    return Ok(inner);
                }
            }
            Ok(Value::Object(map))
        }
        other => Err(RemoteError::InvalidPayload(format!(
            "expected an entity object, got {}",
            compact_text(&other.to_string())
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
