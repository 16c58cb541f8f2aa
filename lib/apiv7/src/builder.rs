//! Immutable, chainable request builder.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    ActionOptions, Batch, Comparator, DefaultParams, Dialect, Error, Filter, Invocation,
    OptionKey, Params, QueryOptions, Reference, Resource, ResourceOptions, Result, Sort,
    SortOrder, Transport, Translator, render_value,
};

/// Frozen settings shared by every builder of one endpoint action.
pub(crate) struct RequestContext<T> {
    pub(crate) transport: Arc<T>,
    pub(crate) translator: Arc<dyn Translator>,
    pub(crate) dialect: Dialect,
    pub(crate) action: String,
    pub(crate) url_template: String,
    pub(crate) default_params: DefaultParams,
    pub(crate) action_options: ActionOptions,
    pub(crate) resource_options: ResourceOptions,
    pub(crate) disabled_operations: BTreeSet<OptionKey>,
}

impl<T> std::fmt::Debug for RequestContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("dialect", &self.dialect)
            .field("action", &self.action)
            .field("url_template", &self.url_template)
            .field("action_options", &self.action_options)
            .field("disabled_operations", &self.disabled_operations)
            .finish_non_exhaustive()
    }
}

/// Options of one [`ApiRequest::execute_with`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOptions {
    /// Bypass and refresh cached translations.
    pub clean_cache: bool,
    /// JSON body of actions that send one.
    pub body: Option<Value>,
}

impl ExecuteOptions {
    /// Bypass and refresh cached translations.
    #[must_use]
    pub const fn clean_cache(mut self) -> Self {
        self.clean_cache = true;
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Query being configured for one endpoint action.
///
/// Every chain method returns a new request and leaves the receiver as it
/// was, so a request can be used as a template for several variants. Nothing
/// is checked nor sent until [`execute`](Self::execute).
///
/// # Example
///
/// ```ignore
/// use apiv7::prelude::*;
///
/// let servers = endpoint.query()?;
/// let running = servers.filter("state", Comparator::EQ, ["running"]);
/// let call = running.sort_by("name", "desc").limit(10).execute(Params::new())?;
/// let response = call.await?;
/// ```
pub struct ApiRequest<T> {
    context: Arc<RequestContext<T>>,
    query: QueryOptions,
}

impl<T> Clone for ApiRequest<T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            query: self.query.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ApiRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("context", &self.context)
            .field("query", &self.query)
            .finish()
    }
}

impl<T> ApiRequest<T> {
    pub(crate) fn new(context: Arc<RequestContext<T>>, query: QueryOptions) -> Self {
        Self { context, query }
    }

    /// Name of the action.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.context.action
    }

    /// Dialect the request is translated to.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.context.dialect
    }

    /// Endpoint URL template.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.context.url_template
    }

    /// Endpoint default parameters.
    #[must_use]
    pub fn default_params(&self) -> &DefaultParams {
        &self.context.default_params
    }

    /// Transport settings of the action.
    #[must_use]
    pub fn action_options(&self) -> &ActionOptions {
        &self.context.action_options
    }

    /// Resource-wide transport settings.
    #[must_use]
    pub fn resource_options(&self) -> &ResourceOptions {
        &self.context.resource_options
    }

    /// Options the action forbids.
    #[must_use]
    pub fn disabled_operations(&self) -> &BTreeSet<OptionKey> {
        &self.context.disabled_operations
    }

    /// Options accumulated so far.
    #[must_use]
    pub fn query_options(&self) -> &QueryOptions {
        &self.query
    }

    fn with(&self, update: impl FnOnce(&mut QueryOptions)) -> Self {
        let mut query = self.query.clone();
        update(&mut query);
        Self::new(Arc::clone(&self.context), query)
    }

    /// Expand referenced objects.
    #[must_use]
    pub fn expand(&self) -> Self {
        self.expand_toggle(true)
    }

    /// Turn expansion on or off.
    #[must_use]
    pub fn expand_toggle(&self, toggle: bool) -> Self {
        self.with(|query| query.expansion = Some(toggle))
    }

    /// Sort ascending on `field`; an empty field removes the sort.
    #[must_use]
    pub fn sort(&self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Asc)
    }

    /// Sort on `field`; an empty field removes the sort.
    ///
    /// Orders are normalized to uppercase and an empty order means `ASC`.
    #[must_use]
    pub fn sort_by(&self, field: impl Into<String>, order: impl Into<SortOrder>) -> Self {
        let field = field.into();
        let order = order.into();
        self.with(|query| {
            query.sort = (!field.is_empty()).then_some(Sort { field, order });
        })
    }

    /// Remove the sort.
    #[must_use]
    pub fn clear_sort(&self) -> Self {
        self.with(|query| query.sort = None)
    }

    /// Replace the filters with a single one; an empty field removes them.
    ///
    /// References are joined with `","`.
    #[must_use]
    pub fn set_filter<I, V>(
        &self,
        field: impl Into<String>,
        comparator: impl Into<Comparator>,
        reference: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let field = field.into();
        if field.is_empty() {
            return self.clear_filters();
        }
        let joined = reference
            .into_iter()
            .map(|value| render_value(&value.into()))
            .collect::<Vec<_>>()
            .join(",");
        let filter = Filter {
            field,
            comparator: comparator.into(),
            reference: Reference::Joined(joined),
        };
        self.with(|query| query.filters = Some(vec![filter]))
    }

    /// Alias of [`set_filter`](Self::set_filter).
    #[must_use]
    pub fn filter<I, V>(
        &self,
        field: impl Into<String>,
        comparator: impl Into<Comparator>,
        reference: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set_filter(field, comparator, reference)
    }

    /// Append a filter, keeping the reference list as given.
    #[must_use]
    pub fn add_filter<I, V>(
        &self,
        field: impl Into<String>,
        comparator: impl Into<Comparator>,
        reference: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let filter = Filter {
            field: field.into(),
            comparator: comparator.into(),
            reference: Reference::List(reference.into_iter().map(Into::into).collect()),
        };
        self.with(|query| query.filters.get_or_insert_with(Vec::new).push(filter))
    }

    /// Remove every filter.
    #[must_use]
    pub fn clear_filters(&self) -> Self {
        self.with(|query| query.filters = None)
    }

    /// Request several values of `parameter` at once, separated by `","`.
    #[must_use]
    pub fn batch<I, V>(&self, parameter: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.batch_with_separator(parameter, values, ",")
    }

    /// Request several values of `parameter` at once.
    ///
    /// An empty separator means `","`.
    #[must_use]
    pub fn batch_with_separator<I, V>(
        &self,
        parameter: impl Into<String>,
        values: I,
        separator: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut separator = separator.into();
        if separator.is_empty() {
            separator.push(',');
        }
        let batch = Batch {
            parameter: parameter.into(),
            values: values.into_iter().map(Into::into).collect(),
            separator,
        };
        self.with(|query| query.batch = Some(batch))
    }

    /// Aggregate on `parameter`; an empty name only starts the aggregation.
    #[must_use]
    pub fn aggregate(&self, parameter: impl Into<String>) -> Self {
        let parameter = parameter.into();
        self.with(|query| {
            let aggregation = query.aggregation.get_or_insert_with(Vec::new);
            if !parameter.is_empty() {
                aggregation.push(parameter);
            }
        })
    }

    /// Start an aggregation without naming a parameter.
    #[must_use]
    pub fn start_aggregation(&self) -> Self {
        self.aggregate(String::new())
    }

    /// Maximum number of items.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        self.with(|query| query.limit = Some(limit))
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self, offset: u64) -> Self {
        self.with(|query| query.offset = Some(offset))
    }

    fn check_operations(&self) -> Result<()> {
        let disabled = &self.context.disabled_operations;
        if let Some(operation) = self.query.keys().find(|key| disabled.contains(key)) {
            warn!(
                action = %self.context.action,
                %operation,
                "operation rejected by action"
            );
            return Err(Error::operation_not_supported(
                operation,
                self.context.action.clone(),
            ));
        }
        Ok(())
    }
}

impl<T: Transport> ApiRequest<T> {
    /// Translate the query and hand it to the transport.
    ///
    /// `params` fill the URL placeholders; they are not kept on the builder.
    ///
    /// # Errors
    ///
    /// Returns an error, before the transport is touched, when the query uses
    /// an operation the action disables or the dialect cannot translate it.
    pub fn execute(&self, params: Params) -> Result<T::Call> {
        self.execute_with(params, ExecuteOptions::default())
    }

    /// Like [`execute`](Self::execute), with a body and cache control.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn execute_with(&self, params: Params, options: ExecuteOptions) -> Result<T::Call> {
        self.check_operations()?;

        let context = &self.context;
        debug!(
            action = %context.action,
            dialect = %context.dialect,
            query = ?self.query,
            clean_cache = options.clean_cache,
            "executing request"
        );

        let translation = context.translator.translate(
            &params,
            &context.action_options,
            &self.query,
            options.clean_cache,
        )?;

        let resource = Resource::new(
            context.url_template.clone(),
            context.default_params.clone(),
            BTreeMap::from([(context.action.clone(), translation.transport_options)]),
            context.resource_options.clone(),
        );
        let invocation = Invocation::new(context.action.clone(), translation.transport_params)
            .with_body(options.body);

        resource.invoke(context.transport.as_ref(), invocation)
    }
}
