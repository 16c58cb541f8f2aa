//! API dialects a request can be translated to.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Query-translation convention of an endpoint or action.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// APIv7: options become `$`-prefixed query parameters.
    #[default]
    #[display("v7")]
    V7,
    /// Iceberg: options become `X-Pagination-*` headers.
    #[display("iceberg")]
    Iceberg,
}

impl Dialect {
    /// Every dialect.
    pub const ALL: [Self; 2] = [Self::V7, Self::Iceberg];

    /// Dialect tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V7 => "v7",
            Self::Iceberg => "iceberg",
        }
    }
}

impl FromStr for Dialect {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|dialect| dialect.as_str() == tag)
            .ok_or_else(|| crate::Error::UnknownDialect(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tags() {
        assert_eq!("v7".parse::<Dialect>().expect("v7"), Dialect::V7);
        assert_eq!("Iceberg".parse::<Dialect>().expect("iceberg"), Dialect::Iceberg);
    }

    #[test]
    fn reject_unknown_tag() {
        let err = "v6".parse::<Dialect>().expect_err("unknown");
        assert_eq!(err.to_string(), "unknown dialect: v6");
    }

    #[test]
    fn deserialize_rejects_unknown_tag() {
        assert!(serde_json::from_str::<Dialect>(r#""legacy""#).is_err());
        assert_eq!(
            serde_json::from_str::<Dialect>(r#""iceberg""#).expect("iceberg"),
            Dialect::Iceberg
        );
    }
}
