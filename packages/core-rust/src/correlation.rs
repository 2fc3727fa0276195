//! Correlation (tracking) identifiers.
//!
//! A caller may supply a tracking id through [`DEFAULT_TRACKING_HEADER`] (or
//! a configured replacement). Supplied ids pass through unchanged so several
//! hops can share one id; otherwise a UUID v4 is generated. Whichever id is
//! chosen is echoed back percent-encoded.

use std::borrow::Cow;
use std::fmt;

use uuid::Uuid;

/// Header carrying the tracking id on both the request and the response.
pub const DEFAULT_TRACKING_HEADER: &str = "x-tracking-id";

/// Opaque per-request tracking identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wraps a caller-supplied id without validation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh UUID v4 id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the inbound id when it is present and not blank, otherwise a
    /// generated one.
    #[must_use]
    pub fn resolve(inbound: Option<&str>) -> Self {
        match inbound {
            Some(id) if !id.trim().is_empty() => Self::new(id),
            _ => Self::generate(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL-encoded form written to the response header.
    #[must_use]
    pub fn encoded(&self) -> Cow<'_, str> {
        urlencoding::encode(&self.0)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_id_passes_through() {
        let id = CorrelationId::resolve(Some("abc-123"));
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn missing_or_blank_id_is_generated() {
        for inbound in [None, Some(""), Some("   ")] {
            let id = CorrelationId::resolve(inbound);
            assert!(Uuid::parse_str(id.as_str()).is_ok(), "{inbound:?}");
        }
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn generated_id_needs_no_escaping() {
        let id = CorrelationId::generate();
        assert_eq!(id.encoded(), id.as_str());
    }

    #[test]
    fn supplied_id_is_percent_encoded() {
        let id = CorrelationId::new("a b/c?d=é");
        assert_eq!(id.encoded(), "a%20b%2Fc%3Fd%3D%C3%A9");
        assert_eq!(id.to_string(), "a b/c?d=é");
    }
}
