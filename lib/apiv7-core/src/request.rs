//! Prepared HTTP requests.
//!
//! A [`Request`] is what [`Resource::prepare`](crate::Resource::prepare) hands
//! to a transport: the template is already expanded, query pairs appended, and
//! the body serialized. It also remembers which action produced it and how the
//! response should be read.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::Method;

/// A fully resolved request for one action.
#[derive(Debug, Clone)]
pub struct Request {
    action: String,
    method: Method,
    url: url::Url,
    headers: BTreeMap<String, String>,
    body: Option<Bytes>,
    expects_array: bool,
    envelope: Option<String>,
    aggregated_from: Option<String>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Name of the action this request performs.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL, query string included.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Insert a header, replacing any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Serialized body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Whether the action declares an array response.
    #[must_use]
    pub const fn expects_array(&self) -> bool {
        self.expects_array
    }

    /// Key the response payload is wrapped in, if any.
    #[must_use]
    pub fn envelope(&self) -> Option<&str> {
        self.envelope.as_deref()
    }

    /// Template of an aggregated call, used to read its items back.
    #[must_use]
    pub fn aggregated_from(&self) -> Option<&str> {
        self.aggregated_from.as_deref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, BTreeMap<String, String>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            request: Request {
                action: String::new(),
                method,
                url,
                headers: BTreeMap::new(),
                body: None,
                expects_array: false,
                envelope: None,
                aggregated_from: None,
            },
        }
    }

    /// Name the action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.request.action = action.into();
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.set_header(name, value);
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request.headers.extend(headers);
        self
    }

    /// Appends query pairs to the URL.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_some() {
            let mut query = self.request.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(&name, &value);
            }
        }
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(Bytes::from(body)))
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Declare whether the response must be a JSON array.
    #[must_use]
    pub const fn expect_array(mut self, expects_array: bool) -> Self {
        self.request.expects_array = expects_array;
        self
    }

    /// Key the response payload is wrapped in.
    #[must_use]
    pub fn envelope(mut self, envelope: Option<String>) -> Self {
        self.request.envelope = envelope;
        self
    }

    /// Mark the request as an aggregation over `template`.
    #[must_use]
    pub fn aggregated_from(mut self, template: Option<String>) -> Self {
        self.request.aggregated_from = template;
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}
