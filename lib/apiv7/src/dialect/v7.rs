//! APIv7 dialect: query options travel as `$`-prefixed query parameters.

use std::collections::btree_map::Entry;

use serde_json::{Value, json};

use crate::{
    ActionOptions, Error, Params, QueryOptions, Result, Translation, Translator, UrlTemplate,
};

/// Translator for the APIv7 dialect.
///
/// | Option | Parameters |
/// |---|---|
/// | expansion | `$expand=1` |
/// | sort | `$sort=<field>`, `$order=<ASC\|DESC>` |
/// | filter | `<field>:<comparator>=<reference>` |
/// | batch | `<parameter>=<joined values>`, `$batch=<separator>` |
/// | aggregation | placeholder replaced by `*`, `$aggreg=1` |
/// | limit / offset | `$limit`, `$offset` |
#[derive(Debug, Clone, Copy, Default)]
pub struct V7Translator;

impl Translator for V7Translator {
    fn translate(
        &self,
        url_params: &Params,
        action: &ActionOptions,
        query: &QueryOptions,
        _clean_cache: bool,
    ) -> Result<Translation> {
        let mut options = action.clone();
        let mut params = url_params.clone();

        if query.expansion == Some(true) {
            params.insert("$expand".to_string(), json!(1));
        }

        if let Some(sort) = &query.sort {
            if !sort.order.is_standard() {
                return Err(Error::configuration(format!(
                    "unsupported sort order `{}`",
                    sort.order
                )));
            }
            params.insert("$sort".to_string(), json!(sort.field));
            params.insert("$order".to_string(), json!(sort.order.as_str()));
        }

        for filter in query.filters.iter().flatten() {
            let key = format!("{}:{}", filter.field, filter.comparator);
            append_param(&mut params, key, Value::String(filter.reference.render(",")));
        }

        if let Some(batch) = &query.batch {
            if batch.parameter.is_empty() {
                return Err(Error::configuration("batch needs a parameter name"));
            }
            params.insert(batch.parameter.clone(), Value::String(batch.joined()));
            params.insert("$batch".to_string(), json!(batch.separator));
        }

        if let Some(names) = query.aggregation.as_ref().filter(|names| !names.is_empty()) {
            let Some(url) = options.url.as_deref() else {
                return Err(Error::configuration("aggregation needs the action URL"));
            };
            let original = url.to_string();
            let mut template = UrlTemplate::parse(url);
            for name in names {
                if !template.has_placeholder(name) {
                    return Err(Error::configuration(format!(
                        "cannot aggregate on `{name}`: not a placeholder of `{url}`"
                    )));
                }
                template = template.with_wildcard(name);
                params.remove(name);
            }
            options.url = Some(template.to_string());
            options.aggregated_from = Some(original);
            params.insert("$aggreg".to_string(), json!(1));
        }

        if let Some(limit) = query.limit {
            params.insert("$limit".to_string(), json!(limit));
        }
        if let Some(offset) = query.offset {
            params.insert("$offset".to_string(), json!(offset));
        }

        Ok(Translation {
            transport_options: options,
            transport_params: params,
        })
    }
}

/// Insert `value`, turning a repeated key into an array.
fn append_param(params: &mut Params, key: String, value: Value) {
    match params.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(value);
        }
        Entry::Occupied(mut entry) => match entry.get_mut() {
            Value::Array(values) => values.push(value),
            existing => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;

    use super::*;
    use crate::{Batch, Comparator, Filter, Method, Reference, Sort, SortOrder, params};

    fn action(url: &str) -> ActionOptions {
        ActionOptions {
            url: Some(url.to_string()),
            ..ActionOptions::new(Method::Get)
        }
    }

    fn translate(query: &QueryOptions) -> Result<Translation> {
        V7Translator.translate(
            &params([("id", "abc")]),
            &action("/item/:id"),
            query,
            false,
        )
    }

    #[test]
    fn empty_options_pass_params_through() {
        let translation = translate(&QueryOptions::default()).expect("translate");
        assert_eq!(translation.transport_params, params([("id", "abc")]));
        assert_eq!(translation.transport_options, action("/item/:id"));
    }

    #[test]
    fn list_options_become_query_parameters() {
        let query = QueryOptions {
            expansion: Some(true),
            sort: Some(Sort {
                field: "name".to_string(),
                order: SortOrder::Desc,
            }),
            limit: Some(10),
            offset: Some(20),
            ..QueryOptions::default()
        };

        let params = translate(&query).expect("translate").transport_params;

        assert_eq!(params["$expand"], json!(1));
        assert_eq!(params["$sort"], json!("name"));
        assert_eq!(params["$order"], json!("DESC"));
        assert_eq!(params["$limit"], json!(10));
        assert_eq!(params["$offset"], json!(20));
    }

    #[test]
    fn expansion_false_is_omitted() {
        let query = QueryOptions {
            expansion: Some(false),
            ..QueryOptions::default()
        };
        let params = translate(&query).expect("translate").transport_params;
        assert!(!params.contains_key("$expand"));
    }

    #[test]
    fn custom_sort_order_is_rejected() {
        let query = QueryOptions {
            sort: Some(Sort {
                field: "name".to_string(),
                order: SortOrder::parse("random"),
            }),
            ..QueryOptions::default()
        };
        let_assert!(Err(Error::Configuration(message)) = translate(&query));
        assert!(message.contains("RANDOM"));
    }

    #[test]
    fn filters_render_references() {
        let query = QueryOptions {
            filters: Some(vec![
                Filter {
                    field: "state".to_string(),
                    comparator: Comparator::IN,
                    reference: Reference::Joined("ok,ko".to_string()),
                },
                Filter {
                    field: "size".to_string(),
                    comparator: Comparator::GT,
                    reference: Reference::List(vec![json!(1)]),
                },
                Filter {
                    field: "size".to_string(),
                    comparator: Comparator::GT,
                    reference: Reference::List(vec![json!(5)]),
                },
            ]),
            ..QueryOptions::default()
        };

        let params = translate(&query).expect("translate").transport_params;

        assert_eq!(params["state:in"], json!("ok,ko"));
        assert_eq!(params["size:gt"], json!(["1", "5"]));
    }

    #[test]
    fn batch_joins_values() {
        let query = QueryOptions {
            batch: Some(Batch {
                parameter: "id".to_string(),
                values: vec![json!(1), json!(2), json!(3)],
                separator: "|".to_string(),
            }),
            ..QueryOptions::default()
        };

        let params = translate(&query).expect("translate").transport_params;

        assert_eq!(params["id"], json!("1|2|3"));
        assert_eq!(params["$batch"], json!("|"));
    }

    #[test]
    fn batch_without_parameter_is_rejected() {
        let query = QueryOptions {
            batch: Some(Batch {
                parameter: String::new(),
                values: vec![json!(1)],
                separator: ",".to_string(),
            }),
            ..QueryOptions::default()
        };
        let_assert!(Err(Error::Configuration(_)) = translate(&query));
    }

    #[test]
    fn aggregation_wildcards_placeholders() {
        let query = QueryOptions {
            aggregation: Some(vec!["serviceName".to_string()]),
            ..QueryOptions::default()
        };

        let translation = V7Translator
            .translate(
                &params([("serviceName", "ns1"), ("ip", "10.0.0.1")]),
                &action("/dedicated/:serviceName/ip/:ip"),
                &query,
                false,
            )
            .expect("translate");

        assert_eq!(
            translation.transport_options.url.as_deref(),
            Some("/dedicated/*/ip/:ip")
        );
        assert_eq!(
            translation.transport_options.aggregated_from.as_deref(),
            Some("/dedicated/:serviceName/ip/:ip")
        );
        assert!(!translation.transport_params.contains_key("serviceName"));
        assert_eq!(translation.transport_params["$aggreg"], json!(1));
    }

    #[test]
    fn empty_aggregation_is_ignored() {
        let query = QueryOptions {
            aggregation: Some(Vec::new()),
            ..QueryOptions::default()
        };
        let translation = translate(&query).expect("translate");
        assert!(!translation.transport_params.contains_key("$aggreg"));
        assert!(translation.transport_options.aggregated_from.is_none());
    }

    #[test]
    fn aggregation_on_unknown_placeholder_is_rejected() {
        let query = QueryOptions {
            aggregation: Some(vec!["nope".to_string()]),
            ..QueryOptions::default()
        };
        let_assert!(Err(Error::Configuration(message)) = translate(&query));
        assert!(message.contains("nope"));
    }
}
