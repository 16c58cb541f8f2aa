//! Prelude module for convenient imports.
//!
//! ```ignore
//! use apiv7_core::prelude::*;
//! ```

pub use crate::{
    ActionDeclaration, ActionOptions, Comparator, Dialect, Error, Invocation, Method, OptionKey,
    ParamDefault, Params, QueryOptions, Resource, ResourceOptions, Result, SortOrder,
    Translation, Translator, Transport, params,
};
