//! Translation cache keyed by request shape.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::trace;

use crate::{ActionOptions, Dialect, Params, QueryOptions, Result, Translation, Translator};

/// Entries kept by [`TranslationCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Shared, bounded store of translations.
///
/// Once full, the least recently used translation is evicted. Clones share
/// the same entries.
#[derive(Clone)]
pub struct TranslationCache {
    entries: Arc<Mutex<LruCache<String, Translation>>>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl TranslationCache {
    /// Create an empty cache holding [`DEFAULT_CACHE_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }

    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Maximum number of cached translations.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Number of cached translations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Translation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Translator serving repeated request shapes from a [`TranslationCache`].
///
/// With `clean_cache` the entry is evicted and the inner translator runs
/// again; that fresh result is not stored.
pub struct CachedTranslator {
    dialect: Dialect,
    inner: Arc<dyn Translator>,
    cache: TranslationCache,
}

impl std::fmt::Debug for CachedTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedTranslator")
            .field("dialect", &self.dialect)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CachedTranslator {
    /// Wrap the translator of `dialect`.
    #[must_use]
    pub fn new(dialect: Dialect, inner: Arc<dyn Translator>, cache: TranslationCache) -> Self {
        Self {
            dialect,
            inner,
            cache,
        }
    }
}

impl Translator for CachedTranslator {
    fn translate(
        &self,
        url_params: &Params,
        action: &ActionOptions,
        query: &QueryOptions,
        clean_cache: bool,
    ) -> Result<Translation> {
        // maps are BTreeMaps, so the JSON is canonical
        let key = serde_json::to_string(&(self.dialect, url_params, action, query))?;

        if clean_cache {
            self.cache.lock().pop(&key);
            trace!(dialect = %self.dialect, "translation cache entry evicted");
            return self.inner.translate(url_params, action, query, true);
        }

        if let Some(hit) = self.cache.lock().get(&key).cloned() {
            trace!(dialect = %self.dialect, "translation cache hit");
            return Ok(hit);
        }

        trace!(dialect = %self.dialect, "translation cache miss");
        let translation = self.inner.translate(url_params, action, query, false)?;
        let mut entries = self.cache.lock();
        if entries.len() == entries.cap().get() && !entries.contains(&key) {
            trace!(dialect = %self.dialect, "translation cache full, evicting oldest entry");
        }
        entries.put(key, translation.clone());
        drop(entries);
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{Method, params};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Translator for Counting {
        fn translate(
            &self,
            url_params: &Params,
            action: &ActionOptions,
            _query: &QueryOptions,
            clean_cache: bool,
        ) -> Result<Translation> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut transport_params = url_params.clone();
            transport_params.insert("call".to_string(), json!(call));
            transport_params.insert("clean".to_string(), json!(clean_cache));
            Ok(Translation {
                transport_options: action.clone(),
                transport_params,
            })
        }
    }

    fn setup() -> (Arc<Counting>, CachedTranslator, TranslationCache) {
        setup_with(TranslationCache::new())
    }

    fn setup_with(cache: TranslationCache) -> (Arc<Counting>, CachedTranslator, TranslationCache) {
        let counting = Arc::new(Counting::default());
        let translator = CachedTranslator::new(
            Dialect::V7,
            Arc::clone(&counting) as Arc<dyn Translator>,
            cache.clone(),
        );
        (counting, translator, cache)
    }

    #[test]
    fn repeated_shapes_hit_the_cache() {
        let (counting, translator, cache) = setup();
        let action = ActionOptions::new(Method::Get);
        let query = QueryOptions {
            limit: Some(5),
            ..QueryOptions::default()
        };

        let first = translator
            .translate(&params([("id", "a")]), &action, &query, false)
            .expect("translate");
        let second = translator
            .translate(&params([("id", "a")]), &action, &query, false)
            .expect("translate");

        assert_eq!(first, second);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        translator
            .translate(&params([("id", "b")]), &action, &query, false)
            .expect("translate");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clean_cache_refreshes() {
        let (counting, translator, cache) = setup();
        let action = ActionOptions::new(Method::Get);
        let query = QueryOptions::default();
        let url_params = params([("id", "a")]);

        translator
            .translate(&url_params, &action, &query, false)
            .expect("translate");
        let fresh = translator
            .translate(&url_params, &action, &query, true)
            .expect("translate");

        assert_eq!(fresh.transport_params["clean"], json!(true));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());

        let again = translator
            .translate(&url_params, &action, &query, false)
            .expect("translate");
        assert_eq!(again.transport_params["call"], json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_ids_stay_within_capacity() {
        let capacity = NonZeroUsize::new(8).expect("non-zero");
        let (counting, translator, cache) = setup_with(TranslationCache::with_capacity(capacity));
        let action = ActionOptions::new(Method::Get);
        let query = QueryOptions::default();

        for id in 0..1_000 {
            translator
                .translate(&params([("id", id)]), &action, &query, false)
                .expect("translate");
        }

        assert_eq!(cache.len(), 8);
        assert_eq!(cache.capacity(), 8);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1_000);
    }

    #[test]
    fn least_recently_used_is_evicted_first() {
        let capacity = NonZeroUsize::new(2).expect("non-zero");
        let (counting, translator, _) = setup_with(TranslationCache::with_capacity(capacity));
        let action = ActionOptions::new(Method::Get);
        let query = QueryOptions::default();
        let translate = |id: &str| {
            translator
                .translate(&params([("id", id)]), &action, &query, false)
                .expect("translate");
        };

        translate("a");
        translate("b");
        translate("a");
        translate("c");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 3);

        translate("a");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 3);
        translate("b");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn default_capacity() {
        assert_eq!(TranslationCache::default().capacity(), DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn clear_empties_shared_cache() {
        let (_, translator, cache) = setup();
        translator
            .translate(
                &Params::new(),
                &ActionOptions::new(Method::Get),
                &QueryOptions::default(),
                false,
            )
            .expect("translate");

        let shared = cache.clone();
        shared.clear();
        assert!(cache.is_empty());
        assert!(format!("{cache:?}").contains("len: 0"));
    }
}
