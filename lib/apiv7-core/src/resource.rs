//! Resource binding.
//!
//! A [`Resource`] ties a URL template and its default parameters to a set of
//! named actions. Invoking an action hands the resource to a [`Transport`],
//! which usually calls [`Resource::prepare`] to turn the invocation into a
//! concrete [`Request`].
//!
//! Parameters are resolved in order: resource defaults, then action defaults,
//! then invocation parameters. Names matching a template placeholder fill it;
//! the others become query pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::params::render_value;
use crate::{ActionOptions, DefaultParams, Error, ParamDefault, Params, Request, Result, UrlTemplate};

/// Settings shared by every action of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceOptions {
    /// Remove trailing slashes from expanded URLs.
    pub strip_trailing_slashes: bool,
    /// Key the response payload is wrapped in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<String>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            strip_trailing_slashes: true,
            envelope: None,
        }
    }
}

impl ResourceOptions {
    /// Unwrap responses from `key`.
    #[must_use]
    pub fn with_envelope(mut self, key: impl Into<String>) -> Self {
        self.envelope = Some(key.into());
        self
    }

    /// Keep trailing slashes of expanded URLs.
    #[must_use]
    pub const fn keep_trailing_slashes(mut self) -> Self {
        self.strip_trailing_slashes = false;
        self
    }
}

/// One call of a resource action.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    action: String,
    params: Params,
    body: Option<Value>,
}

impl Invocation {
    /// Invoke `action` with `params`.
    #[must_use]
    pub fn new(action: impl Into<String>, params: Params) -> Self {
        Self {
            action: action.into(),
            params,
            body: None,
        }
    }

    /// Attach a request body.
    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Invocation parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Performs resource invocations.
///
/// `Call` is whatever the transport hands back, typically a future resolving
/// to the response.
pub trait Transport: Send + Sync {
    /// Result of an invocation.
    type Call;

    /// Invoke an action of `resource`.
    fn invoke(&self, resource: &Resource, invocation: Invocation) -> Self::Call;
}

/// A URL template bound to named actions.
#[derive(Debug, Clone)]
pub struct Resource {
    url_template: String,
    default_params: DefaultParams,
    actions: BTreeMap<String, ActionOptions>,
    options: ResourceOptions,
}

impl Resource {
    /// Creates a new resource.
    #[must_use]
    pub fn new(
        url_template: impl Into<String>,
        default_params: DefaultParams,
        actions: BTreeMap<String, ActionOptions>,
        options: ResourceOptions,
    ) -> Self {
        Self {
            url_template: url_template.into(),
            default_params,
            actions,
            options,
        }
    }

    /// Resource URL template.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Resource default parameters.
    #[must_use]
    pub fn default_params(&self) -> &DefaultParams {
        &self.default_params
    }

    /// Actions by name.
    #[must_use]
    pub fn actions(&self) -> &BTreeMap<String, ActionOptions> {
        &self.actions
    }

    /// Resource options.
    #[must_use]
    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    /// Settings of one action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the resource has no such action.
    pub fn action(&self, name: &str) -> Result<&ActionOptions> {
        self.actions
            .get(name)
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    /// Invoke an action through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] before touching the transport if the
    /// action is not declared.
    pub fn invoke<T>(&self, transport: &T, invocation: Invocation) -> Result<T::Call>
    where
        T: Transport + ?Sized,
    {
        self.action(invocation.action())?;
        Ok(transport.invoke(self, invocation))
    }

    /// Build the concrete request of an invocation.
    ///
    /// Relative templates are appended to `base_url`; templates with a scheme
    /// are used as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is unknown, the URL is invalid, or the
    /// body cannot be serialized.
    pub fn prepare(&self, base_url: &Url, invocation: &Invocation) -> Result<Request> {
        let action = self.action(invocation.action())?;
        let template = UrlTemplate::parse(action.url_or(&self.url_template));
        let params = self.resolve_params(action, invocation);

        let mut values = BTreeMap::new();
        let mut query = Vec::new();
        for (name, value) in params {
            if template.has_placeholder(&name) {
                values.insert(name, render_value(&value));
                continue;
            }
            match value {
                Value::Null => {}
                Value::Array(items) => query.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (name.clone(), render_value(item))),
                ),
                other => query.push((name, render_value(&other))),
            }
        }

        let path = template.expand(&values, self.options.strip_trailing_slashes);
        let url = resolve_url(base_url, &path)?;

        let mut builder = Request::builder(action.method, url)
            .action(invocation.action())
            .header("Accept", "application/json")
            .headers(action.headers.clone())
            .query_pairs(query)
            .expect_array(action.is_array)
            .envelope(self.options.envelope.clone())
            .aggregated_from(action.aggregated_from.clone());

        if action.sends_body()
            && let Some(body) = invocation.body()
        {
            builder = builder.json(body)?;
        }

        let request = builder.build();
        tracing::trace!(
            action = request.action(),
            method = %request.method(),
            url = %request.url(),
            "prepared request"
        );
        Ok(request)
    }

    fn resolve_params(&self, action: &ActionOptions, invocation: &Invocation) -> Params {
        let body = invocation.body();
        let defaults = self
            .default_params
            .iter()
            .filter_map(|(name, default)| Some((name.clone(), default.resolve(body)?)));
        let action_defaults = action.params.iter().filter_map(|(name, value)| {
            Some((name.clone(), ParamDefault::Value(value.clone()).resolve(body)?))
        });

        let mut params: Params = defaults.chain(action_defaults).collect();
        params.extend(invocation.params().clone());
        params.retain(|_, value| !value.is_null());
        params
    }
}

fn resolve_url(base_url: &Url, path: &str) -> Result<Url> {
    match Url::parse(path) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let mut joined = base_url.as_str().trim_end_matches('/').to_string();
            if !path.starts_with('/') {
                joined.push('/');
            }
            joined.push_str(path);
            Ok(Url::parse(&joined)?)
        }
        Err(err) => Err(err.into()),
    }
}
