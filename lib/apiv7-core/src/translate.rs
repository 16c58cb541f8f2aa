//! Translation of query options into transport instructions.

use serde::{Deserialize, Serialize};

use crate::{ActionOptions, Params, QueryOptions, Result};

/// Transport instructions produced by a [`Translator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Action settings to bind the resource with (method, URL, headers...).
    pub transport_options: ActionOptions,
    /// Resolved URL and query parameters.
    pub transport_params: Params,
}

/// Converts accumulated query options into transport instructions for one
/// dialect.
///
/// Implementations must be pure with respect to their inputs. A translator
/// may serve results from a cache keyed by the request shape while
/// `clean_cache` is `false`, and must bypass or refresh it when `clean_cache`
/// is `true`.
///
/// # Example
///
/// ```
/// use apiv7_core::{ActionOptions, Params, QueryOptions, Result, Translation, Translator};
///
/// /// Ignores every query option.
/// struct Passthrough;
///
/// impl Translator for Passthrough {
///     fn translate(
///         &self,
///         url_params: &Params,
///         action: &ActionOptions,
///         _query: &QueryOptions,
///         _clean_cache: bool,
///     ) -> Result<Translation> {
///         Ok(Translation {
///             transport_options: action.clone(),
///             transport_params: url_params.clone(),
///         })
///     }
/// }
/// ```
pub trait Translator: Send + Sync {
    /// Translate one request.
    ///
    /// # Errors
    ///
    /// Returns an error when an option value cannot be expressed in the
    /// dialect.
    fn translate(
        &self,
        url_params: &Params,
        action: &ActionOptions,
        query: &QueryOptions,
        clean_cache: bool,
    ) -> Result<Translation>;
}
