//! HTTP methods an action can be declared with.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// HTTP verb of an action.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET.
    #[default]
    #[display("GET")]
    Get,
    /// POST.
    #[display("POST")]
    Post,
    /// PUT.
    #[display("PUT")]
    Put,
    /// PATCH.
    #[display("PATCH")]
    Patch,
    /// DELETE.
    #[display("DELETE")]
    Delete,
    /// HEAD.
    #[display("HEAD")]
    Head,
    /// OPTIONS.
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Whether an action with this verb sends a body unless told otherwise.
    #[must_use]
    pub const fn has_body_by_default(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(crate::Error::configuration(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults() {
        assert!(Method::Post.has_body_by_default());
        assert!(Method::Put.has_body_by_default());
        assert!(Method::Patch.has_body_by_default());
        assert!(!Method::Get.has_body_by_default());
        assert!(!Method::Delete.has_body_by_default());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("delete".parse::<Method>().expect("method"), Method::Delete);
        assert_eq!("Put".parse::<Method>().expect("method"), Method::Put);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let method: Method = serde_json::from_str(r#""PATCH""#).expect("deserialize");
        assert_eq!(method, Method::Patch);
        assert_eq!(
            serde_json::to_string(&Method::Get).expect("serialize"),
            r#""GET""#
        );
    }

    #[test]
    fn into_http() {
        assert_eq!(http::Method::from(Method::Delete), http::Method::DELETE);
    }
}
