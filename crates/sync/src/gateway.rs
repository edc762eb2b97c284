//! Remote transaction procedures.
//!
//! The procedures are the single source of truth for whether a transaction
//! is accepted. A rejection is final even when local validation passed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use zahra_core::rejection::{UserFacingError, network_error, parse_remote_error};
use zahra_shared::config::RemoteConfig;
use zahra_shared::types::ActionId;

/// Parameter carrying the idempotency key.
pub const IDEMPOTENCY_PARAM: &str = "p_idempotency_key";

/// A call to a named remote procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    /// Procedure name.
    pub procedure: String,
    /// Named parameters.
    pub params: Map<String, Value>,
}

impl RemoteCall {
    /// Creates a call with no parameters.
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            params: Map::new(),
        }
    }

    /// Sets a parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Attaches the key the remote side deduplicates on.
    #[must_use]
    pub fn with_idempotency_key(self, id: ActionId) -> Self {
        self.param(IDEMPOTENCY_PARAM, id.to_string())
    }

    /// Returns the idempotency key, if attached.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.params.get(IDEMPOTENCY_PARAM).and_then(Value::as_str)
    }
}

/// What a procedure reports back about the record it created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedResource {
    /// Record identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Human-facing number, e.g. the invoice number.
    #[serde(default, alias = "invoice_number")]
    pub number: Option<String>,
    /// Record total.
    #[serde(default, alias = "total_amount")]
    pub total: Option<Decimal>,
}

impl CreatedResource {
    /// Reads the procedure result. A bare string is taken as the id.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(id) => Self {
                id: Some(id),
                ..Self::default()
            },
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

/// Remote procedure errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The procedure was never reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The procedure ran and refused the call.
    #[error("remote procedure rejected the call: {message}")]
    Rejected {
        /// Remote error code (SQLSTATE or PostgREST code).
        code: Option<String>,
        /// Remote error message.
        message: String,
    },

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// True if the call may be retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the error code for diagnostics.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "NETWORK_ERROR",
            Self::Rejected { .. } => "REMOTE_REJECTED",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }

    /// Returns the message to show the user.
    #[must_use]
    pub fn to_user_facing(&self) -> UserFacingError {
        match self {
            Self::Transport(_) => network_error(),
            Self::Rejected { code, message } => parse_remote_error(code.as_deref(), message),
            Self::InvalidResponse(message) => parse_remote_error(None, message),
        }
    }
}

/// Invokes remote transaction procedures.
#[async_trait]
pub trait RemoteProcedures: Send + Sync {
    /// Invokes `call` and returns the created resource.
    async fn invoke(&self, call: RemoteCall) -> Result<CreatedResource, RemoteError>;
}

/// PostgREST-style procedures over HTTP: `POST {base}/rest/v1/rpc/{name}`.
#[derive(Debug, Clone)]
pub struct HttpRemoteProcedures {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpRemoteProcedures {
    /// Creates the client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Returns the URL of `procedure`.
    #[must_use]
    pub fn endpoint(&self, procedure: &str) -> String {
        format!("{}/rest/v1/rpc/{procedure}", self.base_url)
    }
}

#[async_trait]
impl RemoteProcedures for HttpRemoteProcedures {
    async fn invoke(&self, call: RemoteCall) -> Result<CreatedResource, RemoteError> {
        let url = self.endpoint(&call.procedure);
        debug!(procedure = %call.procedure, idempotency_key = ?call.idempotency_key(), "invoking remote procedure");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&call.params)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            warn!(procedure = %call.procedure, %status, error = %err, "remote procedure failed");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(CreatedResource::default());
        }
        let value: Value =
            serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        Ok(CreatedResource::from_value(value))
    }
}

/// Maps a non-success response to an error. Gateway failures mean the
/// procedure never ran.
fn error_from_response(status: StatusCode, body: &str) -> RemoteError {
    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return RemoteError::Transport(format!("server unavailable ({status})"));
    }

    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    RemoteError::Rejected {
        code: parsed.code,
        message,
    }
}
