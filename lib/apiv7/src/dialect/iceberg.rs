//! Iceberg dialect: list shaping travels in `X-Pagination-*` headers.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{
    ActionOptions, Dialect, Error, OptionKey, Params, QueryOptions, Result, Translation,
    Translator,
};

const MODE: &str = "X-Pagination-Mode";
const SIZE: &str = "X-Pagination-Size";
const NUMBER: &str = "X-Pagination-Number";
const SORT: &str = "X-Pagination-Sort";
const SORT_ORDER: &str = "X-Pagination-Sort-Order";
const FILTER: &str = "X-Pagination-Filter";

const CACHED_PAGES: &str = "CachedObjectList-Pages";

/// Translator for the Iceberg dialect.
///
/// URL parameters pass through unchanged. Pagination mode is enabled as soon
/// as any list-shaping option is set. Pages are numbered from 1, so an
/// `offset` needs a non-zero `limit` it is a multiple of. Batch and
/// aggregation have no Iceberg counterpart, even empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcebergTranslator;

impl Translator for IcebergTranslator {
    fn translate(
        &self,
        url_params: &Params,
        action: &ActionOptions,
        query: &QueryOptions,
        clean_cache: bool,
    ) -> Result<Translation> {
        if query.batch.is_some() {
            return Err(unsupported(OptionKey::Batch));
        }
        if query.aggregation.is_some() {
            return Err(unsupported(OptionKey::Aggregation));
        }

        let mut options = action.clone();
        let headers = &mut options.headers;

        let filters = query.filters.as_deref().unwrap_or_default();
        let paginated = query.expansion == Some(true)
            || query.sort.is_some()
            || !filters.is_empty()
            || query.limit.is_some()
            || query.offset.is_some();
        if paginated {
            headers.insert(MODE.to_string(), CACHED_PAGES.to_string());
        }

        if let Some(limit) = query.limit {
            headers.insert(SIZE.to_string(), limit.to_string());
        }

        if let Some(offset) = query.offset {
            let page = match query.limit {
                Some(limit) if limit > 0 && offset % limit == 0 => offset / limit + 1,
                Some(limit) if limit > 0 => {
                    return Err(Error::configuration(format!(
                        "offset {offset} does not start a page of {limit} items"
                    )));
                }
                _ => {
                    return Err(Error::configuration(
                        "an offset needs a non-zero limit to compute the page number",
                    ));
                }
            };
            headers.insert(NUMBER.to_string(), page.to_string());
        }

        if let Some(sort) = &query.sort {
            if !sort.order.is_standard() {
                return Err(Error::configuration(format!(
                    "unsupported sort order `{}`",
                    sort.order
                )));
            }
            headers.insert(SORT.to_string(), sort.field.clone());
            headers.insert(SORT_ORDER.to_string(), sort.order.to_string());
        }

        if !filters.is_empty() {
            let filter = filters
                .iter()
                .map(|filter| {
                    format!(
                        "{}:{}={}",
                        filter.field,
                        filter.comparator,
                        utf8_percent_encode(&filter.reference.render(","), NON_ALPHANUMERIC)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            headers.insert(FILTER.to_string(), filter);
        }

        if clean_cache {
            headers.insert("Pragma".to_string(), "no-cache".to_string());
        }

        Ok(Translation {
            transport_options: options,
            transport_params: url_params.clone(),
        })
    }
}

const fn unsupported(operation: OptionKey) -> Error {
    Error::UnsupportedByDialect {
        operation,
        dialect: Dialect::Iceberg,
    }
}
