//! Reading request metadata into the logging context.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use http::{Extensions, HeaderMap, Uri};
use tracklog_core::{LoggedHeaders, MaskingPolicy};

use super::OperationName;

/// Recorded when the peer address is unknown.
pub const UNKNOWN_CLIENT_IP: &str = "-";

/// `path?query` when the query string is not blank, the bare path otherwise.
#[must_use]
pub fn request_uri(uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.trim().is_empty() => format!("{}?{}", uri.path(), query),
        _ => uri.path().to_string(),
    }
}

/// Remote peer IP from the `ConnectInfo` the server attached to the request.
#[must_use]
pub fn client_ip(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT_IP.to_string(), |info| info.0.ip().to_string())
}

/// First value of query parameter `param`, or an empty string.
#[must_use]
pub fn api_key(uri: &Uri, param: &str) -> String {
    uri.query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| name == param)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

/// Operation name attached by an earlier stage, if any.
#[must_use]
pub fn operation_name(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<OperationName>()
        .map(|name| name.as_str().to_string())
}

/// Masked snapshot of `headers`. Non-UTF-8 bytes are replaced, never rejected.
#[must_use]
pub fn header_snapshot(policy: &MaskingPolicy, headers: &HeaderMap) -> LoggedHeaders {
    policy.snapshot(headers.iter().map(|(name, value)| {
        (
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    }))
}
