//! Energis SOAP API client
//!
//! One client per run. Authentication (`?logon`) yields a session key that
//! accompanies every data request (`?data`) on the same base URL. Transport
//! failures and service-side errors map onto the [`ApiError`] taxonomy; the
//! retry wrapper re-attempts only the transient ones.

use crate::adapters::soap::wire;
use crate::config::{Authentication, RetryConfig};
use crate::domain::errors::ExtractorError;
use crate::domain::{ApiError, DateWindow, RawRecord};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;

/// Connect timeout for all requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall request timeout; data responses can be large and slow
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Session key issued by the logon operation
///
/// Not a credential the user supplied, but still secret for the lifetime of
/// the session; Display shows a masked preview for logging.
#[derive(Clone)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First four characters, rest masked
    pub fn preview(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}****")
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey({})", self.preview())
    }
}

/// Abstraction over the remote readings API
///
/// The coordinator depends on this trait so tests can substitute a scripted
/// client.
#[async_trait]
pub trait EnergisApi: Send + Sync {
    /// Authenticate and obtain a session key
    async fn authenticate(&self) -> Result<SessionKey, ApiError>;

    /// Fetch raw records for one chunk
    async fn fetch_window(
        &self,
        key: &SessionKey,
        window: &DateWindow,
        nodes: &[i64],
    ) -> Result<Vec<RawRecord>, ApiError>;
}

/// HTTP-backed implementation of [`EnergisApi`]
pub struct EnergisClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: crate::config::SecretString,
    debug: bool,
}

impl EnergisClient {
    /// Build a client for the configured environment
    pub fn new(auth: &Authentication, debug: bool) -> Result<Self, ExtractorError> {
        Self::with_base_url(auth, debug, auth.environment.base_url().to_string())
    }

    /// Build a client against an explicit base URL (tests use this to point
    /// at a local server)
    pub fn with_base_url(
        auth: &Authentication,
        debug: bool,
        base_url: String,
    ) -> Result<Self, ExtractorError> {
        let http = reqwest::Client::builder()
            .timeout(READ_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ExtractorError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            username: auth.username.clone(),
            password: auth.password.clone(),
            debug,
        })
    }

    async fn post_soap(&self, query: &str, action: &str, body: String) -> Result<String, ApiError> {
        let url = format!("{}?{query}", self.base_url);

        if self.debug {
            tracing::debug!(
                url = %url,
                soap_action = action,
                body = %wire::mask_sensitive_fields(&body),
                "Sending SOAP request"
            );
        }

        let response = self
            .http
            .post(&url)
            .header("Content-Type", wire::CONTENT_TYPE)
            .header("SOAPAction", action)
            .body(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(classify_transport_error)?;

        if status.is_server_error() {
            return Err(ApiError::Transient(format!(
                "server returned status {status}"
            )));
        }
        if !status.is_success() {
            // Non-2xx responses may still carry a SOAP fault worth surfacing
            if let Some(fault) = wire::parse_fault(&text) {
                if wire::is_already_logged_in(&fault) {
                    return Err(ApiError::Transient(format!("session still open: {fault}")));
                }
                return Err(ApiError::Fault(fault));
            }
            return Err(ApiError::InvalidResponse(format!(
                "unexpected status {status}"
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl EnergisApi for EnergisClient {
    async fn authenticate(&self) -> Result<SessionKey, ApiError> {
        let body = wire::logon_request(&self.username, self.password.expose_secret().as_ref());
        let response = self.post_soap("logon", wire::LOGON_ACTION, body).await;

        // Non-2xx fault during logon is a credential rejection unless transient
        let text = match response {
            Ok(text) => text,
            Err(ApiError::Fault(fault)) => return Err(ApiError::AuthenticationFailed(fault)),
            Err(e) => return Err(e),
        };

        let key = wire::parse_logon_response(&text)?;
        let key = SessionKey::new(key);
        tracing::debug!(key = %key.preview(), "Authentication successful");
        Ok(key)
    }

    async fn fetch_window(
        &self,
        key: &SessionKey,
        window: &DateWindow,
        nodes: &[i64],
    ) -> Result<Vec<RawRecord>, ApiError> {
        let body = wire::xexport_request(&self.username, key.as_str(), nodes, window);
        let text = self.post_soap("data", wire::XEXPORT_ACTION, body).await?;
        wire::parse_xexport_response(&text)
    }
}

fn classify_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(err.to_string())
    } else {
        ApiError::Transient(err.to_string())
    }
}

/// Run an API operation with bounded retry and exponential backoff
///
/// Only transient errors are retried; authentication rejections and
/// unparseable responses surface immediately.
pub async fn with_retry<T, F, Fut>(policy: &RetryConfig, operation: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if !e.is_transient() || attempt >= policy.max_attempts {
                    return Err(e);
                }

                let delay_ms = (policy.initial_delay_ms as f64
                    * policy.backoff_multiplier.powi(attempt as i32 - 1))
                    as u64;
                let delay_ms = delay_ms.min(policy.max_delay_ms);

                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms,
                    error = %e,
                    "Retrying request after transient error"
                );

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
