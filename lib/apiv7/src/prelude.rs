//! Prelude module for convenient imports.
//!
//! ```ignore
//! use apiv7::prelude::*;
//! ```

pub use crate::{
    ActionDeclaration, ApiClient, ApiRequest, Comparator, Dialect, Endpoint, Error,
    ExecuteOptions, HyperTransport, Method, OptionKey, ParamDefault, Params, QueryOptions,
    ResourceOptions, Result, SortOrder, Transport, params,
};
