//! Header masking policy.
//!
//! Decides which header names are confidential and what is recorded in the
//! logging context in their place. A masked header is replaced wholesale by
//! [`MASK_TOKEN`]; no part of the original value ever reaches a log line.
//!
//! The mandatory set ([`MANDATORY_MASKED_HEADERS`]) is part of every policy.
//! Policies can only grow: there is no API that removes a name.

use std::collections::HashSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Sentinel recorded instead of the value of a masked header.
pub const MASK_TOKEN: &str = "********";

/// Header names that every [`MaskingPolicy`] masks. Lowercase.
pub const MANDATORY_MASKED_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

/// Result of classifying a header name against a [`MaskingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    /// Values are recorded as-is.
    Literal,
    /// Values are replaced by [`MASK_TOKEN`].
    Masked,
}

/// Logged form of one header.
///
/// Log consumers key on the shape: a header seen once is a plain string, a
/// repeated header is an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoggedHeader {
    Scalar(String),
    List(Vec<String>),
}

/// Set of confidential header names, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct MaskingPolicy {
    masked: HashSet<String>,
}

impl Default for MaskingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskingPolicy {
    /// Creates a policy holding exactly the mandatory masked headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            masked: MANDATORY_MASKED_HEADERS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Adds one header name to the masked set.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>) -> Self {
        self.masked.insert(name.as_ref().trim().to_ascii_lowercase());
        self
    }

    /// Adds every name from `names` to the masked set.
    #[must_use]
    pub fn extend<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        names
            .into_iter()
            .fold(self, |policy, name| policy.with_header(name))
    }

    #[must_use]
    pub fn classify(&self, name: &str) -> HeaderClass {
        if self.masked.contains(&name.to_ascii_lowercase()) {
            HeaderClass::Masked
        } else {
            HeaderClass::Literal
        }
    }

    #[must_use]
    pub fn is_masked(&self, name: &str) -> bool {
        self.classify(name) == HeaderClass::Masked
    }

    /// Number of masked names, mandatory entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masked.is_empty()
    }

    /// Renders the values of one header into its logged form.
    #[must_use]
    pub fn render(&self, name: &str, mut values: Vec<String>) -> LoggedHeader {
        match self.classify(name) {
            HeaderClass::Masked => LoggedHeader::Scalar(MASK_TOKEN.to_string()),
            HeaderClass::Literal if values.len() == 1 => {
                LoggedHeader::Scalar(values.swap_remove(0))
            }
            HeaderClass::Literal => LoggedHeader::List(values),
        }
    }

    /// Builds a masked snapshot from `(name, value)` pairs.
    ///
    /// Repeated names are grouped case-insensitively under the spelling seen
    /// first; header order follows first appearance, value order is preserved.
    #[must_use]
    pub fn snapshot<I, N, V>(&self, pairs: I) -> LoggedHeaders
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<String>,
    {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            match grouped
                .iter_mut()
                .find(|(seen, _)| seen.eq_ignore_ascii_case(name))
            {
                Some((_, values)) => values.push(value.into()),
                None => grouped.push((name.to_string(), vec![value.into()])),
            }
        }

        LoggedHeaders {
            entries: grouped
                .into_iter()
                .map(|(name, values)| {
                    let logged = self.render(&name, values);
                    (name, logged)
                })
                .collect(),
        }
    }
}

/// Ordered header-name to [`LoggedHeader`] map, already masked.
///
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggedHeaders {
    entries: Vec<(String, LoggedHeader)>,
}

impl LoggedHeaders {
    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LoggedHeader> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LoggedHeader)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for LoggedHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
