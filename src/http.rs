//! Request gateway: the seam between query building and the network.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::errors::{QueryError, TransportError};
use crate::query::QueryParams;
use crate::utils::wire::{self, WireEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>, query: QueryParams) -> Self {
        Self { method: Method::Get, path: path.into(), query, body: None }
    }
}

/// Per-call authorization, forwarded verbatim to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    pub session_token: Option<String>,
    pub use_master_key: bool,
    /// Caller identity for logging only.
    pub user: Option<String>,
}

impl AuthOptions {
    #[must_use]
    pub fn master() -> Self {
        Self { use_master_key: true, ..Self::default() }
    }

    pub fn session(token: impl Into<String>) -> Self {
        Self { session_token: Some(token.into()), ..Self::default() }
    }
}

#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Perform one request and return the parsed response body.
    async fn request(
        &self,
        req: HttpRequest,
        options: &AuthOptions,
    ) -> Result<Value, TransportError>;
}

/// Render query parameters as URL pairs. Absent parameters are omitted and the
/// condition tree is JSON-encoded.
///
/// # Errors
/// Fails only if the condition cannot be serialized.
pub fn encode_query(params: &QueryParams) -> Result<Vec<(String, String)>, QueryError> {
    let mut pairs = Vec::new();
    if let Some(cond) = &params.condition {
        pairs.push(("where".to_string(), serde_json::to_string(cond)?));
    }
    let mut push = |k: &str, v: Option<String>| {
        if let Some(v) = v {
            pairs.push((k.to_string(), v));
        }
    };
    push("skip", params.skip.map(|n| n.to_string()));
    push("limit", params.limit.map(|n| n.to_string()));
    push("order", params.order.clone());
    push("include", params.include.clone());
    push("keys", params.keys.clone());
    push("returnACL", params.return_acl.map(|b| b.to_string()));
    push("count", params.count.map(|n| n.to_string()));
    push("cursor", params.cursor.clone());
    Ok(pairs)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

fn http_error(status: u16, body: &str) -> TransportError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code).unwrap_or(i64::from(status));
    let message = parsed
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.chars().take(256).collect());
    TransportError::Http { status, code, message }
}

/// `reqwest`-backed gateway speaking the store's REST protocol.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl HttpGateway {
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be constructed.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, QueryError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent());
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build().map_err(|e| QueryError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.server_url.trim_end_matches('/'), path)
    }

    fn key_header(&self, options: &AuthOptions) -> String {
        match (&self.config.master_key, options.use_master_key) {
            (Some(master), true) => format!("{master},master"),
            (None, true) => {
                log::warn!("master credentials requested but no master key is configured");
                self.config.app_key.clone()
            }
            _ => self.config.app_key.clone(),
        }
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn request(
        &self,
        req: HttpRequest,
        options: &AuthOptions,
    ) -> Result<Value, TransportError> {
        let url = self.url(&req.path);
        let pairs =
            encode_query(&req.query).map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        wire::emit(|| WireEvent::Send {
            method: req.method.as_str(),
            url: url.clone(),
            query: pairs.clone(),
        });

        let mut rb = self
            .client
            .request(req.method.into(), &url)
            .query(&pairs)
            .header("X-LC-Id", &self.config.app_id)
            .header("X-LC-Key", self.key_header(options))
            .header("Accept", "application/json");
        let session = options.session_token.as_ref().or(self.config.session_token.as_ref());
        if let Some(token) = session {
            rb = rb.header("X-LC-Session", token);
        }
        if let Some(body) = &req.body {
            rb = rb.json(body);
        }

        let resp = rb.send().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
            url: Some(url.clone()),
        })?;
        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
            url: Some(url.clone()),
        })?;
        wire::emit(|| WireEvent::Recv { status, url: url.clone(), body: text.clone() });

        if !(200..300).contains(&status) {
            return Err(http_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&text).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}
