//! Settings of the hyper transport.
//!
//! A [`TransportConfig`] can be written in code through
//! [`HyperTransportBuilder`](crate::HyperTransportBuilder) or loaded from the
//! same JSON document as the endpoint declarations:
//!
//! ```
//! use std::time::Duration;
//! use apiv7::TransportConfig;
//!
//! let config = TransportConfig::from_json(br#"{
//!     "timeoutMs": 5000,
//!     "defaultHeaders": { "X-Ovh-Application": "manager" }
//! }"#).expect("valid settings");
//!
//! assert_eq!(config.timeout(), Duration::from_secs(5));
//! assert_eq!(config.connect_timeout(), Duration::from_secs(10));
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, from_json};

/// Settings of a [`HyperTransport`](crate::HyperTransport).
///
/// Missing JSON fields take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportConfig {
    /// Whole-call timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Connection establishment timeout, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection is kept, in milliseconds.
    pub pool_idle_timeout_ms: u64,
    /// `User-Agent` sent when the request does not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Headers added to every request that does not already carry them.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub default_headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            pool_idle_per_host: 32,
            pool_idle_timeout_ms: 90_000,
            user_agent: None,
            default_headers: BTreeMap::new(),
        }
    }
}

impl TransportConfig {
    /// Parse settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
    /// naming the offending field.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        from_json(bytes)
    }

    /// Whole-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection establishment timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Idle connection lifetime.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_idle_timeout_ms)
    }

    /// Add the user agent and the default headers to `headers`.
    ///
    /// Header names compare case-insensitively; a header the request already
    /// carries wins.
    pub fn apply_defaults(&self, headers: &mut BTreeMap<String, String>) {
        let defaults = self
            .user_agent
            .iter()
            .map(|agent| ("User-Agent", agent.as_str()))
            .chain(
                self.default_headers
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );

        for (name, value) in defaults {
            let present = headers
                .keys()
                .any(|existing| existing.eq_ignore_ascii_case(name));
            if !present {
                headers.insert(name.to_string(), value.to_string());
            }
        }
    }
}

/// Milliseconds of `duration`, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::Error;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        check!(config.timeout() == Duration::from_secs(30));
        check!(config.connect_timeout() == Duration::from_secs(10));
        check!(config.pool_idle_timeout() == Duration::from_secs(90));
        check!(config.pool_idle_per_host == 32);
        check!(config.user_agent.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = TransportConfig::from_json(
            br#"{"poolIdlePerHost": 4, "userAgent": "manager/1.0"}"#,
        )
        .expect("settings");

        check!(config.pool_idle_per_host == 4);
        check!(config.user_agent.as_deref() == Some("manager/1.0"));
        check!(config.timeout_ms == 30_000);
    }

    #[test]
    fn bad_json_names_the_field() {
        let_assert!(
            Err(Error::JsonDeserialization { path, .. }) =
                TransportConfig::from_json(br#"{"timeoutMs": "soon"}"#)
        );
        check!(path == "timeoutMs");
    }

    #[test]
    fn request_headers_win_over_defaults() {
        let config = TransportConfig {
            user_agent: Some("manager".to_string()),
            default_headers: BTreeMap::from([
                ("X-Ovh-Application".to_string(), "app".to_string()),
                ("Accept-Language".to_string(), "fr".to_string()),
            ]),
            ..TransportConfig::default()
        };
        let mut headers = BTreeMap::from([
            ("user-agent".to_string(), "custom".to_string()),
            ("Accept-Language".to_string(), "en".to_string()),
        ]);

        config.apply_defaults(&mut headers);

        check!(headers.get("user-agent").map(String::as_str) == Some("custom"));
        check!(!headers.contains_key("User-Agent"));
        check!(headers.get("Accept-Language").map(String::as_str) == Some("en"));
        check!(headers.get("X-Ovh-Application").map(String::as_str) == Some("app"));
    }

    #[test]
    fn millis_saturates() {
        check!(millis(Duration::from_millis(1500)) == 1500);
        check!(millis(Duration::MAX) == u64::MAX);
    }
}
