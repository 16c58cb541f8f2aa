//! Action settings and declarations.
//!
//! An [`ActionDeclaration`] is what an endpoint author writes: every field is
//! optional so a declaration can be merged over the dialect's
//! [`default_actions`]. Once merged it splits into the [`ActionOptions`] handed
//! to translators and transports, and the set of disabled operations kept by
//! the request builder.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Dialect, Method, OptionKey, Params};

/// Transport settings of one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOptions {
    /// HTTP method.
    #[serde(default)]
    pub method: Method,
    /// URL template overriding the endpoint's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Action-level default parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: Params,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Whether the request carries a body; defaults from the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_body: Option<bool>,
    /// Whether the response is a JSON array.
    #[serde(default)]
    pub is_array: bool,
    /// Template the URL was wildcarded from when the call is aggregated.
    ///
    /// Set by translators, never declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregated_from: Option<String>,
}

impl ActionOptions {
    /// Settings for an action with the given method.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Whether the request carries a body.
    #[must_use]
    pub fn sends_body(&self) -> bool {
        self.has_body
            .unwrap_or_else(|| self.method.has_body_by_default())
    }

    /// The action URL, or `fallback` when none is set.
    #[must_use]
    pub fn url_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.url.as_deref().unwrap_or(fallback)
    }
}

/// Declaration of an endpoint action, merged over the dialect defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionDeclaration {
    /// HTTP method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// URL template overriding the endpoint's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Action-level default parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: Params,
    /// Extra request headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Whether the request carries a body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_body: Option<bool>,
    /// Whether the response is a JSON array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_array: Option<bool>,
    /// Query options this action forbids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_operations: Option<BTreeSet<OptionKey>>,
    /// Dialect overriding the endpoint's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
}

impl ActionDeclaration {
    /// Declaration of an action with the given method.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    /// Set the URL template.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add an action-level default parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set whether the request carries a body.
    #[must_use]
    pub const fn has_body(mut self, has_body: bool) -> Self {
        self.has_body = Some(has_body);
        self
    }

    /// Declare that the response is a JSON array.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.is_array = Some(true);
        self
    }

    /// Replace the disabled operations.
    #[must_use]
    pub fn disabled_operations(mut self, operations: impl IntoIterator<Item = OptionKey>) -> Self {
        self.disabled_operations = Some(operations.into_iter().collect());
        self
    }

    /// Add one disabled operation.
    #[must_use]
    pub fn disable(mut self, operation: OptionKey) -> Self {
        self.disabled_operations
            .get_or_insert_with(BTreeSet::new)
            .insert(operation);
        self
    }

    /// Use another dialect for this action.
    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Merge `over` on top of `self`.
    ///
    /// Fields set in `over` win; parameter and header maps are extended; a
    /// disabled-operation set in `over` replaces the one in `self`.
    #[must_use]
    pub fn merge(mut self, over: Self) -> Self {
        self.params.extend(over.params);
        self.headers.extend(over.headers);
        Self {
            method: over.method.or(self.method),
            url: over.url.or(self.url),
            params: self.params,
            headers: self.headers,
            has_body: over.has_body.or(self.has_body),
            is_array: over.is_array.or(self.is_array),
            disabled_operations: over.disabled_operations.or(self.disabled_operations),
            dialect: over.dialect.or(self.dialect),
        }
    }

    /// Split into transport settings and disabled operations.
    ///
    /// The dialect override is dropped; read it before splitting.
    #[must_use]
    pub fn split(self) -> (ActionOptions, BTreeSet<OptionKey>) {
        let options = ActionOptions {
            method: self.method.unwrap_or_default(),
            url: self.url,
            params: self.params,
            headers: self.headers,
            has_body: self.has_body,
            is_array: self.is_array.unwrap_or(false),
            aggregated_from: None,
        };
        (options, self.disabled_operations.unwrap_or_default())
    }
}

/// Options that make no sense on actions writing a single object.
const WRITE_DISABLED: [OptionKey; 6] = [
    OptionKey::Expansion,
    OptionKey::Sort,
    OptionKey::Filters,
    OptionKey::Aggregation,
    OptionKey::Limit,
    OptionKey::Offset,
];

/// Default actions every endpoint of `dialect` starts from.
///
/// `get` and `query` (array) read; `save` (POST), `update` (PUT), `remove` and
/// `delete` (DELETE) write and disable the list-shaping options. Iceberg has
/// no batch nor aggregation, so every Iceberg action disables both.
#[must_use]
pub fn default_actions(dialect: Dialect) -> BTreeMap<String, ActionDeclaration> {
    let read = |declaration: ActionDeclaration| declaration.disabled_operations([]);
    let write = |declaration: ActionDeclaration| declaration.disabled_operations(WRITE_DISABLED);

    let mut actions = BTreeMap::from([
        ("get".to_string(), read(ActionDeclaration::new(Method::Get))),
        (
            "query".to_string(),
            read(ActionDeclaration::new(Method::Get).array()),
        ),
        ("save".to_string(), write(ActionDeclaration::new(Method::Post))),
        ("update".to_string(), write(ActionDeclaration::new(Method::Put))),
        (
            "remove".to_string(),
            write(ActionDeclaration::new(Method::Delete)),
        ),
        (
            "delete".to_string(),
            write(ActionDeclaration::new(Method::Delete)),
        ),
    ]);

    if dialect == Dialect::Iceberg {
        for declaration in actions.values_mut() {
            let disabled = declaration
                .disabled_operations
                .get_or_insert_with(BTreeSet::new);
            disabled.insert(OptionKey::Batch);
            disabled.insert(OptionKey::Aggregation);
        }
    }

    actions
}
