use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::constants::*;

/// Supplies the bearer token attached to outgoing requests.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Forgets the current token. Callers decide when, typically after
    /// [`ClientError::Unauthorized`].
    fn clear(&self) {}
}

/// An explicit session handle shared by the clients that should act as the same user.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }
}

impl TokenProvider for Credentials {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

/// Failure of a single client call. Nothing else ever escapes a client method.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },
    #[error("{message}")]
    Transport { message: String },
    #[error("{message}")]
    Decode { message: String },
}

impl ClientError {
    pub fn message(&self) -> &str {
        match self {
            ClientError::Unauthorized { message }
            | ClientError::Api { message, .. }
            | ClientError::Transport { message }
            | ClientError::Decode { message } => message,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => code.as_deref(),
            ClientError::Unauthorized { .. } => Some(UNAUTHORIZED_CODE),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Picks the user-facing message for a failed call: body `detail`, then body
/// `message`, then the transport error, then a fixed fallback.
pub fn resolve_error_message(body: Option<&Value>, transport: Option<&str>) -> String {
    let from_body = |key: &str| {
        body.and_then(|b| b.get(key)).and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        })
    };

    from_body("detail")
        .or_else(|| from_body("message"))
        .or_else(|| transport.filter(|t| !t.trim().is_empty()).map(str::to_string))
        .unwrap_or_else(|| ERR_UNEXPECTED.to_string())
}

fn error_code(body: Option<&Value>) -> Option<String> {
    let body = body?;
    ["errorCode", "error_code"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Authenticated JSON request primitive, composed into each domain client.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Client for the category service as configured.
    pub fn for_categories(config: &Config, tokens: Arc<dyn TokenProvider>) -> ClientResult<Self> {
        Self::new(
            config.services.category.clone(),
            tokens,
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ClientResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "Request timed out".to_string()
            } else {
                resolve_error_message(None, Some(&e.to_string()))
            };
            tracing::debug!(%method, %url, error = %e, "transport failure");
            ClientError::Transport { message }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let raw_text = (!text.trim().is_empty() && parsed.is_none()).then_some(text.as_str());
        let fallback = raw_text.or(status.canonical_reason());
        let message = resolve_error_message(parsed.as_ref(), fallback);
        tracing::debug!(%method, %url, status = status.as_u16(), %message, "request rejected");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized { message });
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
            code: error_code(parsed.as_ref()),
        })
    }

    /// Sends a request and decodes the JSON response body into `T`.
    pub async fn make_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> ClientResult<T> {
        let response = self.send(method, path, query, body).await?;
        response.json::<T>().await.map_err(|e| ClientError::Decode {
            message: e.to_string(),
        })
    }

    /// Sends a request whose success response carries no body.
    pub async fn make_request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<()> {
        self.send(method, path, &[], body).await.map(|_| ())
    }
}

/// Serializes a payload for [`HttpClient::make_request`].
pub fn to_body<T: serde::Serialize>(payload: &T) -> ClientResult<Value> {
    serde_json::to_value(payload).map_err(|e| ClientError::Decode {
        message: e.to_string(),
    })
}
