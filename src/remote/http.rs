//! REST transport over reqwest.
//!
//! # Security
//!
//! The API token is held as a [`SecretString`] and only exposed while
//! building the Authorization header, which goes through the
//! `RedactedHeader` wrapper: its `Display` and `Debug` print `[REDACTED]`, so
//! the token cannot leak through request logging.

use std::fmt;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::entity::{EntityId, EntityRecord};
use crate::error::{CasebookError, Result};
use crate::resources::Resource;

use super::error::{ApiError, from_transport};
use super::{ListQuery, Page, ResourceTransport};

/// Header carrying the client-generated key of a non-repeatable create
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const LIST_KEYS: &[&str] = &["data", "items", "results"];

/// Wrapper for sensitive header values that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn bearer(token: &SecretString) -> Self {
        Self {
            value: format!("Bearer {}", token.expose_secret()),
        }
    }

    fn as_header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.value)
            .map_err(|_| CasebookError::Auth("API token is not a valid header value".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// [`ResourceTransport`] speaking JSON over HTTP
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport from configuration (base URL, token, timeout)
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        let mut transport = Self::with_client(client, &config.base_url())?;
        transport.token = config.api_token();
        Ok(transport)
    }

    /// Create an unauthenticated transport for `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::builder().build()?, base_url)
    }

    fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CasebookError::Config(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{resource path}/{segments...}` with each segment percent-encoded
    fn url(&self, resource: &Resource, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CasebookError::Config("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(resource.path().split('/'))
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let request = request.header(header::ACCEPT, HeaderValue::from_static("application/json"));
        match &self.token {
            Some(token) => {
                let auth_header = RedactedHeader::bearer(token);
                Ok(request.header(header::AUTHORIZATION, auth_header.as_header_value()?))
            }
            None => Ok(request),
        }
    }

    /// Send a request, turning non-success statuses into classified errors
    async fn send(&self, request: RequestBuilder, target: &str) -> Result<Response> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_body(status, &body).with_retry_after(retry_after);
        debug!(request = target, %error, "request failed");
        Err(error.into_error(target))
    }

    async fn json(response: Response) -> Result<Value> {
        response.json::<Value>().await.map_err(from_transport)
    }
}

/// Accepts a bare array, or an object carrying the records under `data`,
/// `items` or `results` and the count under `total` or `pagination.total`.
fn parse_page(body: Value) -> Result<Page> {
    let (items, total) = match body {
        Value::Array(items) => (items, None),
        Value::Object(mut object) => {
            let total = object
                .get("total")
                .or_else(|| object.get("pagination").and_then(|p| p.get("total")))
                .and_then(Value::as_u64);
            let items = LIST_KEYS
                .iter()
                .find_map(|key| match object.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| CasebookError::Api {
                    status: 200,
                    message: "list response has no records array".to_string(),
                })?;
            (items, total)
        }
        other => {
            return Err(CasebookError::Api {
                status: 200,
                message: format!("unexpected list response: {other}"),
            });
        }
    };

    let records = items
        .into_iter()
        .map(EntityRecord::from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(records, total))
}

/// Accepts a record, or a record wrapped as `{"data": {...}}`
fn parse_record(body: Value) -> Result<EntityRecord> {
    match body {
        Value::Object(mut object) if !object.contains_key("id") && !object.contains_key("_id") => {
            match object.remove("data") {
                Some(inner @ Value::Object(_)) => EntityRecord::from_value(inner),
                _ => EntityRecord::from_value(Value::Object(object)),
            }
        }
        other => EntityRecord::from_value(other),
    }
}

impl ResourceTransport for HttpTransport {
    async fn list(&self, resource: &Resource, query: &ListQuery) -> Result<Page> {
        let url = self.url(resource, &[])?;
        debug!(resource = resource.name(), query = %query.cache_key(), "GET list");
        let request = self.client.get(url).query(query.params());
        let response = self.send(request, resource.path()).await?;
        parse_page(Self::json(response).await?)
    }

    async fn get(&self, resource: &Resource, id: &EntityId) -> Result<EntityRecord> {
        let url = self.url(resource, &[id.as_str()])?;
        let target = format!("{}/{}", resource.path(), id);
        let response = self.send(self.client.get(url), &target).await?;
        parse_record(Self::json(response).await?)
    }

    async fn create(
        &self,
        resource: &Resource,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        let url = self.url(resource, &[])?;
        let mut request = self.client.post(url).json(payload);
        if resource.idempotent_create() {
            request = request.header(IDEMPOTENCY_KEY_HEADER, Uuid::new_v4().to_string());
        }
        let response = self.send(request, resource.path()).await?;
        parse_record(Self::json(response).await?)
    }

    async fn update(
        &self,
        resource: &Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        let url = self.url(resource, &[id.as_str()])?;
        let target = format!("{}/{}", resource.path(), id);
        let response = self
            .send(self.client.patch(url).json(payload), &target)
            .await?;
        parse_record(Self::json(response).await?)
    }

    async fn delete(&self, resource: &Resource, id: &EntityId) -> Result<()> {
        let url = self.url(resource, &[id.as_str()])?;
        let target = format!("{}/{}", resource.path(), id);
        self.send(self.client.delete(url), &target).await?;
        Ok(())
    }

    async fn bulk_delete(&self, resource: &Resource, ids: &[EntityId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.url(resource, &["bulk-delete"])?;
        let body = json!({ "ids": ids });
        self.send(self.client.post(url).json(&body), resource.path())
            .await?;
        Ok(())
    }
}
