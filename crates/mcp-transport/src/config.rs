//! Transport configuration, including the loopback-only plaintext URL policy.

use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::{TransportError, TransportResult};

/// Hostnames treated as loopback for the plaintext-HTTP policy (§4.1).
fn is_loopback_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

#[derive(Debug, Clone, Copy)]
pub enum RetryPolicy {
    None,
    /// Bounded exponential backoff with deterministic jitter (no RNG).
    Exponential { max_attempts: u32, base: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Exponential {
            max_attempts: 3,
            base: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry attempt `attempt` (0-indexed). Jitter is a
    /// deterministic function of `attempt`, not an RNG draw, so retries are
    /// reproducible in tests.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Exponential { max_attempts, base } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let mut hash = attempt.wrapping_mul(2_654_435_761);
                hash ^= hash >> 15;
                let jitter_pct = f64::from(hash % 250) / 1000.0; // 0.0..0.25
                let exp = 2u32.saturating_pow(attempt);
                let millis = (base.as_millis() as f64) * f64::from(exp) * (1.0 + jitter_pct);
                Some(Duration::from_millis(millis as u64))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LimitsConfig {
    pub max_request_size: Option<usize>,
    pub max_response_size: Option<usize>,
    pub max_concurrent_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: Some(4 * 1024 * 1024),
            max_response_size: Some(16 * 1024 * 1024),
            max_concurrent_requests: 32,
        }
    }
}

impl LimitsConfig {
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_request_size: None,
            max_response_size: None,
            max_concurrent_requests: usize::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub limits: LimitsConfig,
    pub retry: RetryPolicy,
    /// `TURBOMCP_ALLOW_INSECURE_TLS`-style escape hatch; never set this from
    /// a default, only from an explicit environment-variable opt-in.
    pub allow_insecure_tls: bool,
}

impl TransportConfig {
    /// Validate and construct a transport config for `url`.
    ///
    /// # Errors
    /// Rejects non-`https`/`http` schemes, and rejects plaintext `http` for
    /// any host other than the recognized loopback addresses.
    pub fn new(url: impl AsRef<str>, headers: HashMap<String, String>) -> TransportResult<Self> {
        let parsed = Url::parse(url.as_ref())
            .map_err(|e| TransportError::ConfigurationError(format!("invalid URL: {e}")))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                let host = parsed.host_str().unwrap_or_default();
                if !is_loopback_host(host) {
                    return Err(TransportError::ConfigurationError(format!(
                        "plaintext http is only allowed against loopback hosts, got: {host}"
                    )));
                }
            }
            other => {
                return Err(TransportError::ConfigurationError(format!(
                    "unsupported URL scheme: {other}"
                )));
            }
        }

        Ok(Self {
            url: parsed,
            headers,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            limits: LimitsConfig::default(),
            retry: RetryPolicy::default(),
            allow_insecure_tls: std::env::var("MCP_ALLOW_INSECURE_TLS").as_deref() == Ok("1"),
        })
    }
}
