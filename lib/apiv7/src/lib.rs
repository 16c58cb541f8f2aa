//! Immutable, chainable query builder for REST endpoints.
//!
//! Callers describe a query (sorting, filtering, pagination, aggregation,
//! batching, expansion) on an endpoint action, then [`execute`] it: the
//! options are checked against what the action allows, translated for the
//! endpoint dialect (APIv7 query parameters or Iceberg pagination headers),
//! and handed to a [`Transport`].
//!
//! # Example
//!
//! ```ignore
//! use apiv7::prelude::*;
//!
//! let client = ApiClient::new(HyperTransport::new("https://eu.api.example.com/1.0")?);
//! let servers = client.endpoint("/dedicated/server/:serverName").build()?;
//!
//! let response = servers
//!     .query()?
//!     .filter("state", Comparator::EQ, ["ok"])
//!     .sort_by("name", "desc")
//!     .limit(10)
//!     .execute(Params::new())?
//!     .await?;
//! let names: Vec<String> = response.json()?;
//! ```
//!
//! [`execute`]: ApiRequest::execute

mod api_client;
mod builder;
mod client;
mod config;
mod connector;
pub mod dialect;
mod endpoint;
pub mod middleware;
pub mod prelude;

pub use api_client::ApiClient;
pub use builder::{ApiRequest, ExecuteOptions};
pub use client::{BoxedService, HyperTransport, HyperTransportBuilder, ResourceCall};
pub use config::TransportConfig;
pub use endpoint::{ActionFactory, Endpoint, EndpointBuilder, EndpointDeclaration};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use apiv7_core::{
    ActionDeclaration, ActionOptions, AggregatedItem, Batch, Comparator, DefaultParams, Dialect,
    Error, Filter, Invocation, Method, OptionKey, ParamDefault, Params, QueryOptions, Reference,
    Request, RequestBuilder, Resource, ResourceOptions, Response, Result, Sort, SortOrder,
    Translation, Translator, Transport, UrlTemplate, default_actions, from_json, params,
    render_value,
};
pub use apiv7_core::options;
