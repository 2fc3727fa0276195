//! Network configuration types for the demo server.

use std::time::Duration;

use crate::interceptor::RequestLogConfig;

/// Top-level network configuration for the demo server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
    /// Request-logging interceptor settings.
    pub request_log: RequestLogConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            request_timeout: Duration::from_secs(30),
            request_log: RequestLogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracklog_core::DEFAULT_TRACKING_HEADER;

    use super::*;

    #[test]
    fn network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.request_log.tracking_header, DEFAULT_TRACKING_HEADER);
    }
}
