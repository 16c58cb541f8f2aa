//! Dialect translators and the table that selects them.
//!
//! - [`V7Translator`] - query parameters (`$sort`, `$limit`, `field:eq=...`)
//! - [`IcebergTranslator`] - `X-Pagination-*` headers
//! - [`CachedTranslator`] - memoizes any translator in a [`TranslationCache`]

mod cache;
mod iceberg;
mod v7;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use cache::{CachedTranslator, DEFAULT_CACHE_CAPACITY, TranslationCache};
pub use iceberg::IcebergTranslator;
pub use v7::V7Translator;

use crate::{Dialect, Error, Result, Translator};

/// Translators by dialect.
///
/// # Example
///
/// ```
/// use apiv7::dialect::{TranslationCache, Translators};
/// use apiv7::Dialect;
///
/// let translators = Translators::standard().cached(&TranslationCache::new());
/// assert!(translators.get(Dialect::Iceberg).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct Translators {
    table: BTreeMap<Dialect, Arc<dyn Translator>>,
}

impl std::fmt::Debug for Translators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

impl Translators {
    /// A table with no translator.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The APIv7 and Iceberg translators.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with(Dialect::V7, V7Translator)
            .with(Dialect::Iceberg, IcebergTranslator)
    }

    /// Register (or replace) the translator of `dialect`.
    #[must_use]
    pub fn with(self, dialect: Dialect, translator: impl Translator + 'static) -> Self {
        self.with_shared(dialect, Arc::new(translator))
    }

    /// Register a shared translator.
    #[must_use]
    pub fn with_shared(mut self, dialect: Dialect, translator: Arc<dyn Translator>) -> Self {
        self.table.insert(dialect, translator);
        self
    }

    /// Wrap every registered translator in a [`CachedTranslator`] backed by
    /// `cache`.
    #[must_use]
    pub fn cached(self, cache: &TranslationCache) -> Self {
        let table = self
            .table
            .into_iter()
            .map(|(dialect, inner)| {
                let cached: Arc<dyn Translator> =
                    Arc::new(CachedTranslator::new(dialect, inner, cache.clone()));
                (dialect, cached)
            })
            .collect();
        Self { table }
    }

    /// Translator of `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDialect`] if none is registered.
    pub fn get(&self, dialect: Dialect) -> Result<Arc<dyn Translator>> {
        self.table
            .get(&dialect)
            .map(Arc::clone)
            .ok_or_else(|| Error::UnknownDialect(dialect.to_string()))
    }

    /// Registered dialects.
    pub fn dialects(&self) -> impl Iterator<Item = Dialect> + '_ {
        self.table.keys().copied()
    }
}
