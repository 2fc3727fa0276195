//! Configuration for the request-logging interceptor.

use std::fmt;
use std::sync::Arc;

use http::header::{HeaderName, InvalidHeaderName};
use tracklog_core::{ClockSource, MaskingPolicy, SystemClock, DEFAULT_TRACKING_HEADER};

/// Query parameter read as the caller's API key.
pub const DEFAULT_API_KEY_PARAM: &str = "api_key";

/// Errors from validating a [`RequestLogConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid tracking header name {name:?}: {source}")]
    InvalidTrackingHeader {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
    #[error("invalid masked header name {name:?}: {source}")]
    InvalidMaskedHeader {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
    #[error("api key parameter name must not be empty")]
    EmptyApiKeyParam,
}

/// Settings of [`RequestLogLayer`](super::RequestLogLayer).
#[derive(Clone)]
pub struct RequestLogConfig {
    /// Header read for an inbound tracking id and written on the response.
    pub tracking_header: String,
    /// Query parameter recorded as `api_key`.
    pub api_key_param: String,
    /// Header names masked in addition to the mandatory set.
    pub masked_headers: Vec<String>,
    /// Time source for the request timestamp and response time.
    pub clock: Arc<dyn ClockSource>,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            tracking_header: DEFAULT_TRACKING_HEADER.to_string(),
            api_key_param: DEFAULT_API_KEY_PARAM.to_string(),
            masked_headers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl fmt::Debug for RequestLogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogConfig")
            .field("tracking_header", &self.tracking_header)
            .field("api_key_param", &self.api_key_param)
            .field("masked_headers", &self.masked_headers)
            .finish_non_exhaustive()
    }
}

/// Checked form of [`RequestLogConfig`], shared read-only by every request.
pub(crate) struct Settings {
    pub tracking_header: HeaderName,
    pub api_key_param: String,
    pub policy: MaskingPolicy,
    pub clock: Arc<dyn ClockSource>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracking_header: HeaderName::from_static(DEFAULT_TRACKING_HEADER),
            api_key_param: DEFAULT_API_KEY_PARAM.to_string(),
            policy: MaskingPolicy::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl RequestLogConfig {
    pub(crate) fn validate(self) -> Result<Settings, ConfigError> {
        let tracking_header = HeaderName::try_from(self.tracking_header.trim()).map_err(|source| {
            ConfigError::InvalidTrackingHeader {
                name: self.tracking_header.clone(),
                source,
            }
        })?;

        let api_key_param = self.api_key_param.trim().to_string();
        if api_key_param.is_empty() {
            return Err(ConfigError::EmptyApiKeyParam);
        }

        for name in &self.masked_headers {
            HeaderName::try_from(name.trim()).map_err(|source| ConfigError::InvalidMaskedHeader {
                name: name.clone(),
                source,
            })?;
        }
        let policy = MaskingPolicy::new().extend(&self.masked_headers);

        Ok(Settings {
            tracking_header,
            api_key_param,
            policy,
            clock: self.clock,
        })
    }
}
