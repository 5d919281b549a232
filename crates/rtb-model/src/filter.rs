//! Template filters and filter values
//!
//! The value shape depends on the operator: a single scalar for comparisons,
//! a two-element list for `between`, a list for `in`/`not_in`, nothing for the
//! null checks. The operator semantics themselves live in `rtb-operators`.

use crate::ids::{FieldId, FilterId};
use serde::{Deserialize, Serialize};

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// Substring match
    Contains,
    /// Negated substring match
    NotContains,
    /// Prefix match
    StartsWith,
    /// Suffix match
    EndsWith,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// Inclusive range
    Between,
    /// Membership
    In,
    /// Negated membership
    NotIn,
    /// Null check
    IsNull,
    /// Not-null check
    IsNotNull,
}

impl Operator {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single filter operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(f64),
    /// Text, dates included
    Text(String),
}

impl Scalar {
    /// Whether the operand carries no information (`""` or whitespace)
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Numeric view, parsing text if needed
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Scalar {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Filter operand as stored on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// One operand
    Scalar(Scalar),
    /// Range pair or membership list
    List(Vec<Scalar>),
}

impl FilterValue {
    /// Empty scalar (`""`)
    #[inline]
    #[must_use]
    pub fn empty_scalar() -> Self {
        Self::Scalar(Scalar::Text(String::new()))
    }

    /// Empty list (`[]`)
    #[inline]
    #[must_use]
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// Range value `[min, max]`
    #[must_use]
    pub fn range(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        Self::List(vec![min.into(), max.into()])
    }

    /// Whether nothing has been entered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_blank(),
            Self::List(items) => items.is_empty() || items.iter().all(Scalar::is_blank),
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        Self::empty_scalar()
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(value: Vec<Scalar>) -> Self {
        Self::List(value)
    }
}

/// User-configured predicate over a template field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    /// Engine-generated id
    pub id: FilterId,
    /// Referenced template field (not a catalog field)
    pub field_id: FieldId,
    /// Operator
    pub operator: Operator,
    /// Operand
    #[serde(default)]
    pub value: FilterValue,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Must be supplied when the report runs
    #[serde(default)]
    pub required: bool,
    /// Shown to report consumers
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl TemplateFilter {
    /// Create a filter with a fresh id
    #[must_use]
    pub fn new(field_id: FieldId, operator: Operator, value: FilterValue) -> Self {
        Self {
            id: FilterId::generate(),
            field_id,
            operator,
            value,
            label: String::new(),
            required: false,
            visible: true,
        }
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
