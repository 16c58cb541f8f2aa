//! Core types and traits for the apiv7 request builder.
//!
//! This crate provides the vocabulary shared by builders, translators and
//! transports:
//! - [`QueryOptions`] and its parts ([`Sort`], [`Filter`], [`Batch`]) - what a
//!   caller asks for
//! - [`ActionDeclaration`], [`ActionOptions`] and [`default_actions`] - how an
//!   endpoint action is described
//! - [`Translator`] and [`Translation`] - the dialect translation contract
//! - [`Resource`], [`Invocation`] and [`Transport`] - resource binding and the
//!   transport contract
//! - [`Request`] and [`Response`] - prepared requests and buffered responses
//! - [`Error`] and [`Result`] - Error handling

mod action;
mod dialect;
mod error;
mod method;
pub mod options;
mod params;
pub mod prelude;
mod request;
mod resource;
mod response;
mod template;
mod translate;

pub use action::{ActionDeclaration, ActionOptions, default_actions};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use method::Method;
pub use options::{
    Batch, Comparator, Filter, OptionKey, QueryOptions, Reference, Sort, SortOrder,
};
pub use params::{DefaultParams, ParamDefault, Params, params, render_value};
pub use request::{Request, RequestBuilder};
pub use resource::{Invocation, Resource, ResourceOptions, Transport};
pub use response::{AggregatedItem, Response, from_json};
pub use template::UrlTemplate;
pub use translate::{Translation, Translator};
