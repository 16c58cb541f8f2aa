//! Endpoint factory: one request constructor per declared action.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::builder::RequestContext;
use crate::dialect::Translators;
use crate::{
    ActionDeclaration, ApiRequest, DefaultParams, Dialect, Error, OptionKey, ParamDefault,
    QueryOptions, ResourceOptions, Result, default_actions,
};

/// Endpoint description, loadable from JSON.
///
/// ```
/// use apiv7::EndpointDeclaration;
///
/// let declaration: EndpointDeclaration = serde_json::from_str(r#"{
///     "url": "/dedicated/server/:serverName",
///     "dialect": "iceberg",
///     "actions": { "reboot": { "method": "POST", "url": "/dedicated/server/:serverName/reboot" } }
/// }"#).expect("valid declaration");
/// assert!(declaration.actions.contains_key("reboot"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDeclaration {
    /// URL template.
    pub url: String,
    /// Default parameters by name.
    #[serde(default)]
    pub params: DefaultParams,
    /// Actions declared on top of the dialect defaults.
    #[serde(default)]
    pub actions: BTreeMap<String, ActionDeclaration>,
    /// Resource-wide transport settings.
    #[serde(default)]
    pub options: ResourceOptions,
    /// Dialect of the endpoint.
    #[serde(default)]
    pub dialect: Dialect,
}

/// Produces request builders for one action.
pub struct ActionFactory<T> {
    context: Arc<RequestContext<T>>,
}

impl<T> Clone for ActionFactory<T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
        }
    }
}

impl<T> std::fmt::Debug for ActionFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionFactory")
            .field("context", &self.context)
            .finish()
    }
}

impl<T> ActionFactory<T> {
    /// A request with no query option set.
    #[must_use]
    pub fn request(&self) -> ApiRequest<T> {
        self.request_with(QueryOptions::default())
    }

    /// A request starting from `initial` options.
    #[must_use]
    pub fn request_with(&self, initial: QueryOptions) -> ApiRequest<T> {
        ApiRequest::new(Arc::clone(&self.context), initial)
    }

    /// Action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.context.action
    }

    /// Dialect of the action.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.context.dialect
    }

    /// Options the action forbids.
    #[must_use]
    pub fn disabled_operations(&self) -> &BTreeSet<OptionKey> {
        &self.context.disabled_operations
    }
}

/// REST endpoint exposing one [`ActionFactory`] per action.
pub struct Endpoint<T> {
    url_template: String,
    factories: BTreeMap<String, ActionFactory<T>>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            url_template: self.url_template.clone(),
            factories: self.factories.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("url_template", &self.url_template)
            .field("actions", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> Endpoint<T> {
    /// Endpoint URL template.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Factory of one action.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionFactory<T>> {
        self.factories.get(name)
    }

    /// Action names.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// A request for action `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the endpoint has no such action.
    pub fn request(&self, name: &str) -> Result<ApiRequest<T>> {
        self.request_with(name, QueryOptions::default())
    }

    /// A request for action `name`, starting from `initial` options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the endpoint has no such action.
    pub fn request_with(&self, name: &str, initial: QueryOptions) -> Result<ApiRequest<T>> {
        self.action(name)
            .map(|factory| factory.request_with(initial))
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    /// A `get` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn get(&self) -> Result<ApiRequest<T>> {
        self.request("get")
    }

    /// A `query` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn query(&self) -> Result<ApiRequest<T>> {
        self.request("query")
    }

    /// A `save` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn save(&self) -> Result<ApiRequest<T>> {
        self.request("save")
    }

    /// An `update` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn update(&self) -> Result<ApiRequest<T>> {
        self.request("update")
    }

    /// A `remove` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn remove(&self) -> Result<ApiRequest<T>> {
        self.request("remove")
    }

    /// A `delete` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] if the action is missing.
    pub fn delete(&self) -> Result<ApiRequest<T>> {
        self.request("delete")
    }
}

/// Builder for [`Endpoint`], obtained from
/// [`ApiClient::endpoint`](crate::ApiClient::endpoint).
pub struct EndpointBuilder<T> {
    transport: Arc<T>,
    translators: Translators,
    url_template: String,
    default_params: DefaultParams,
    declarations: BTreeMap<String, ActionDeclaration>,
    options: ResourceOptions,
    dialect: Dialect,
}

impl<T> std::fmt::Debug for EndpointBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("url_template", &self.url_template)
            .field("default_params", &self.default_params)
            .field("declarations", &self.declarations)
            .field("options", &self.options)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl<T> EndpointBuilder<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        translators: Translators,
        url_template: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            translators,
            url_template: url_template.into(),
            default_params: DefaultParams::new(),
            declarations: BTreeMap::new(),
            options: ResourceOptions::default(),
            dialect: Dialect::default(),
        }
    }

    pub(crate) fn from_declaration(
        transport: Arc<T>,
        translators: Translators,
        declaration: EndpointDeclaration,
    ) -> Self {
        Self {
            transport,
            translators,
            url_template: declaration.url,
            default_params: declaration.params,
            declarations: declaration.actions,
            options: declaration.options,
            dialect: declaration.dialect,
        }
    }

    /// Add a default parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, default: impl Into<ParamDefault>) -> Self {
        self.default_params.insert(name.into(), default.into());
        self
    }

    /// Declare an action, merged over the dialect default of the same name.
    #[must_use]
    pub fn action(mut self, name: impl Into<String>, declaration: ActionDeclaration) -> Self {
        let name = name.into();
        let merged = match self.declarations.remove(&name) {
            Some(previous) => previous.merge(declaration),
            None => declaration,
        };
        self.declarations.insert(name, merged);
        self
    }

    /// Set the resource-wide transport settings.
    #[must_use]
    pub fn options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the endpoint dialect.
    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Build the endpoint.
    ///
    /// No I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDialect`] if an action uses a dialect with no
    /// registered translator.
    pub fn build(self) -> Result<Endpoint<T>> {
        let mut merged = default_actions(self.dialect);
        for (name, declaration) in self.declarations {
            let declaration = match merged.remove(&name) {
                Some(default) => default.merge(declaration),
                None => declaration,
            };
            merged.insert(name, declaration);
        }

        let mut factories = BTreeMap::new();
        for (name, declaration) in merged {
            let dialect = declaration.dialect.unwrap_or(self.dialect);
            let translator = self.translators.get(dialect)?;
            let (mut action_options, disabled_operations) = declaration.split();
            action_options
                .url
                .get_or_insert_with(|| self.url_template.clone());

            let context = RequestContext {
                transport: Arc::clone(&self.transport),
                translator,
                dialect,
                action: name.clone(),
                url_template: self.url_template.clone(),
                default_params: self.default_params.clone(),
                action_options,
                resource_options: self.options.clone(),
                disabled_operations,
            };
            factories.insert(
                name,
                ActionFactory {
                    context: Arc::new(context),
                },
            );
        }

        debug!(
            url_template = %self.url_template,
            dialect = %self.dialect,
            actions = factories.len(),
            "endpoint built"
        );

        Ok(Endpoint {
            url_template: self.url_template,
            factories,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use serde_json::json;

    use super::*;
    use crate::Method;
    use crate::dialect::V7Translator;

    fn builder(url: &str) -> EndpointBuilder<()> {
        EndpointBuilder::new(Arc::new(()), Translators::standard(), url)
    }

    #[test]
    fn default_actions_are_exposed() {
        let endpoint = builder("/item/:id").build().expect("build");
        assert_eq!(
            endpoint.actions().collect::<Vec<_>>(),
            vec!["delete", "get", "query", "remove", "save", "update"]
        );
        let query = endpoint.query().expect("query");
        assert!(query.action_options().is_array);
        assert_eq!(query.action_options().url.as_deref(), Some("/item/:id"));
    }

    #[test]
    fn declarations_merge_over_defaults() {
        let endpoint = builder("/item/:id")
            .action("get", ActionDeclaration::default().header("X-Trace", "1"))
            .action(
                "reboot",
                ActionDeclaration::new(Method::Post).url("/item/:id/reboot"),
            )
            .build()
            .expect("build");

        let get = endpoint.get().expect("get");
        assert_eq!(get.action_options().method, Method::Get);
        assert_eq!(
            get.action_options().headers.get("X-Trace").map(String::as_str),
            Some("1")
        );

        let reboot = endpoint.request("reboot").expect("reboot");
        assert_eq!(reboot.action_options().method, Method::Post);
        assert_eq!(
            reboot.action_options().url.as_deref(),
            Some("/item/:id/reboot")
        );
        assert!(reboot.disabled_operations().is_empty());
    }

    #[test]
    fn disabled_operations_are_stripped_from_transport_settings() {
        let endpoint = builder("/item/:id")
            .action(
                "get",
                ActionDeclaration::default().disabled_operations([OptionKey::Sort]),
            )
            .build()
            .expect("build");

        let factory = endpoint.action("get").expect("declared");
        assert_eq!(
            factory.disabled_operations(),
            &BTreeSet::from([OptionKey::Sort])
        );
        assert_eq!(factory.name(), "get");
    }

    #[test]
    fn per_action_dialect() {
        let endpoint = builder("/item")
            .action("list", ActionDeclaration::new(Method::Get).dialect(Dialect::Iceberg))
            .build()
            .expect("build");

        assert_eq!(
            endpoint.action("list").map(ActionFactory::dialect),
            Some(Dialect::Iceberg)
        );
        assert_eq!(
            endpoint.action("get").map(ActionFactory::dialect),
            Some(Dialect::V7)
        );
    }

    #[test]
    fn unregistered_dialect_fails_build() {
        let result = EndpointBuilder::new(
            Arc::new(()),
            Translators::empty().with(Dialect::V7, V7Translator),
            "/item",
        )
        .dialect(Dialect::Iceberg)
        .build();

        let_assert!(Err(Error::UnknownDialect(name)) = result);
        assert_eq!(name, "iceberg");
    }

    #[test]
    fn unknown_action() {
        let endpoint = builder("/item").build().expect("build");
        let_assert!(Err(Error::UnknownAction(name)) = endpoint.request("reboot"));
        assert_eq!(name, "reboot");
    }

    #[test]
    fn initial_options_seed_the_request() {
        let endpoint = builder("/item").build().expect("build");
        let initial = QueryOptions {
            limit: Some(5),
            ..QueryOptions::default()
        };
        let request = endpoint.request_with("query", initial).expect("query");
        assert_eq!(request.query_options().limit, Some(5));
    }

    #[test]
    fn declaration_from_json() {
        let declaration: EndpointDeclaration = serde_json::from_value(json!({
            "url": "/me/bill/:billId",
            "params": {"billId": "@id"},
            "options": {"envelope": "data"},
            "actions": {
                "query": {"disabledOperations": ["batch"]}
            }
        }))
        .expect("deserialize");

        let endpoint = EndpointBuilder::from_declaration(
            Arc::new(()),
            Translators::standard(),
            declaration,
        )
        .build()
        .expect("build");

        let query = endpoint.query().expect("query");
        assert_eq!(query.resource_options().envelope.as_deref(), Some("data"));
        assert!(query.default_params().contains_key("billId"));
        assert_eq!(
            query.disabled_operations(),
            &BTreeSet::from([OptionKey::Batch])
        );
        assert_eq!(query.dialect(), Dialect::V7);
    }
}
