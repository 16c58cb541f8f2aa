//! The fixed vocabulary of query options a request builder accumulates.
//!
//! [`QueryOptions`] is plain data: builders replace it wholesale on every chain
//! call and translators read it. Every key it can hold has an [`OptionKey`],
//! which is also how actions name the operations they disable.

use std::borrow::Cow;
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::join_values;

/// Name of a query option.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    /// Expand referenced ids into full objects.
    #[display("expansion")]
    Expansion,
    /// Sort on a field.
    #[display("sort")]
    Sort,
    /// Filter on fields.
    #[display("filters")]
    Filters,
    /// Batch several values of a parameter into one request.
    #[display("batch")]
    Batch,
    /// Aggregate over wildcarded URL parameters.
    #[display("aggregation")]
    Aggregation,
    /// Maximum number of items.
    #[display("limit")]
    Limit,
    /// Number of items to skip.
    #[display("offset")]
    Offset,
}

impl OptionKey {
    /// Every key, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Expansion,
        Self::Sort,
        Self::Filters,
        Self::Batch,
        Self::Aggregation,
        Self::Limit,
        Self::Offset,
    ];

    /// The key name as used in declarations.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Expansion => "expansion",
            Self::Sort => "sort",
            Self::Filters => "filters",
            Self::Batch => "batch",
            Self::Aggregation => "aggregation",
            Self::Limit => "limit",
            Self::Offset => "offset",
        }
    }
}

impl FromStr for OptionKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| crate::Error::configuration(format!("unknown query option: {s}")))
    }
}

/// Sort direction, normalized to uppercase.
///
/// Anything other than `ASC`/`DESC` is kept verbatim (uppercased) as
/// [`SortOrder::Custom`]; translators decide whether they accept it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
    /// Unrecognized order, uppercased.
    Custom(String),
}

impl SortOrder {
    /// Normalize a raw order. An empty string means ascending.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        match upper.as_str() {
            "" | "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            _ => Self::Custom(upper),
        }
    }

    /// The uppercase order token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Custom(order) => order,
        }
    }

    /// Returns `true` for `ASC` and `DESC`.
    #[must_use]
    pub const fn is_standard(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SortOrder {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for SortOrder {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<SortOrder> for String {
    fn from(order: SortOrder) -> Self {
        order.as_str().to_string()
    }
}

/// Sort instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field to sort on.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// Filter comparator token.
///
/// Comparators are opaque: they travel unchanged from the builder to the
/// translator. The associated constants are the tokens APIv7 understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comparator(Cow<'static, str>);

impl Comparator {
    /// Equal.
    pub const EQ: Self = Self(Cow::Borrowed("eq"));
    /// Not equal.
    pub const NE: Self = Self(Cow::Borrowed("ne"));
    /// Greater than.
    pub const GT: Self = Self(Cow::Borrowed("gt"));
    /// Greater than or equal.
    pub const GE: Self = Self(Cow::Borrowed("ge"));
    /// Less than.
    pub const LT: Self = Self(Cow::Borrowed("lt"));
    /// Less than or equal.
    pub const LE: Self = Self(Cow::Borrowed("le"));
    /// Pattern match.
    pub const LIKE: Self = Self(Cow::Borrowed("like"));
    /// Membership in a list.
    pub const IN: Self = Self(Cow::Borrowed("in"));

    /// The comparator token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Comparator {
    fn from(token: &str) -> Self {
        Self(Cow::Owned(token.to_string()))
    }
}

impl From<String> for Comparator {
    fn from(token: String) -> Self {
        Self(Cow::Owned(token))
    }
}

/// Value a filter compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// References already joined with `","` (set by `set_filter`).
    Joined(String),
    /// Raw reference list (set by `add_filter`).
    List(Vec<Value>),
}

impl Reference {
    /// Render as a single string, joining list items with `separator`.
    #[must_use]
    pub fn render(&self, separator: &str) -> String {
        match self {
            Self::Joined(joined) => joined.clone(),
            Self::List(values) => join_values(values, separator),
        }
    }
}

/// Filter instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field to filter on.
    pub field: String,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Reference value(s).
    pub reference: Reference,
}

/// Batch instruction: several values of one parameter in a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Parameter receiving the values.
    pub parameter: String,
    /// Values to batch.
    pub values: Vec<Value>,
    /// Separator between values.
    pub separator: String,
}

impl Batch {
    /// Values joined with the separator.
    #[must_use]
    pub fn joined(&self) -> String {
        join_values(&self.values, &self.separator)
    }
}

/// Accumulated query options. An absent field means the option is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Expand referenced ids into objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansion: Option<bool>,
    /// Sort instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// Filters, in call order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    /// Batch instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<Batch>,
    /// Parameters to aggregate on, in call order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Vec<String>>,
    /// Maximum number of items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Number of items to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl QueryOptions {
    /// Returns `true` if the option is set.
    #[must_use]
    pub const fn contains(&self, key: OptionKey) -> bool {
        match key {
            OptionKey::Expansion => self.expansion.is_some(),
            OptionKey::Sort => self.sort.is_some(),
            OptionKey::Filters => self.filters.is_some(),
            OptionKey::Batch => self.batch.is_some(),
            OptionKey::Aggregation => self.aggregation.is_some(),
            OptionKey::Limit => self.limit.is_some(),
            OptionKey::Offset => self.offset.is_some(),
        }
    }

    /// Keys of the options that are set.
    pub fn keys(&self) -> impl Iterator<Item = OptionKey> + '_ {
        OptionKey::ALL
            .into_iter()
            .filter(move |key| self.contains(*key))
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }
}
