//! Filter value shapes and operand checks
//!
//! The registry decides *which* shape an operator needs; this module decides
//! whether a stored [`FilterValue`] actually has that shape and whether its
//! scalars fit the field's declared type.

use chrono::{DateTime, NaiveDate};
use rtb_model::{FieldType, FilterValue, Scalar};

/// Shape of the operand an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// No operand (`is_null`, `is_not_null`)
    None,
    /// One scalar
    Scalar,
    /// Ordered `[min, max]`
    Pair,
    /// One or more scalars
    List,
}

impl ValueShape {
    /// Empty operand for this shape: `""` for scalar/none, `[]` for multi
    #[must_use]
    pub fn empty_value(&self) -> FilterValue {
        match self {
            Self::None | Self::Scalar => FilterValue::empty_scalar(),
            Self::Pair | Self::List => FilterValue::empty_list(),
        }
    }

    /// Whether a stored value has this shape (content aside)
    #[must_use]
    pub fn matches(&self, value: &FilterValue) -> bool {
        match (self, value) {
            (Self::None, _) => true,
            (Self::Scalar, FilterValue::Scalar(_)) => true,
            (Self::Pair | Self::List, FilterValue::List(_)) => true,
            _ => false,
        }
    }
}

/// Why an operand is unusable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueIssue {
    /// Nothing entered
    #[error("a value is required")]
    Missing,

    /// Wrong container (scalar vs list)
    #[error("expected {expected}")]
    WrongShape {
        /// Description of the accepted shape
        expected: &'static str,
    },

    /// A `between` value without exactly two bounds
    #[error("a range needs exactly two values, got {got}")]
    WrongArity {
        /// Number of values supplied
        got: usize,
    },

    /// Operand does not fit the field type
    #[error("'{value}' is not a valid {field_type} value")]
    TypeMismatch {
        /// Offending operand as entered
        value: String,
        /// Type of the filtered field
        field_type: FieldType,
    },
}

/// Check an operand against a shape and field type
///
/// # Errors
/// Returns the first [`ValueIssue`] found.
pub fn check_value(
    shape: ValueShape,
    field_type: FieldType,
    value: &FilterValue,
) -> Result<(), ValueIssue> {
    match shape {
        ValueShape::None => Ok(()),
        ValueShape::Scalar => match value {
            FilterValue::Scalar(s) if s.is_blank() => Err(ValueIssue::Missing),
            FilterValue::Scalar(s) => check_scalar(field_type, s),
            FilterValue::List(_) => Err(ValueIssue::WrongShape {
                expected: "a single value",
            }),
        },
        ValueShape::Pair => match value {
            FilterValue::List(items) if items.iter().all(Scalar::is_blank) => {
                Err(ValueIssue::Missing)
            }
            FilterValue::List(items) if items.len() != 2 => {
                Err(ValueIssue::WrongArity { got: items.len() })
            }
            FilterValue::List(items) => {
                for item in items {
                    if item.is_blank() {
                        return Err(ValueIssue::Missing);
                    }
                    check_scalar(field_type, item)?;
                }
                Ok(())
            }
            FilterValue::Scalar(s) if s.is_blank() => Err(ValueIssue::Missing),
            FilterValue::Scalar(_) => Err(ValueIssue::WrongShape {
                expected: "a [min, max] pair",
            }),
        },
        ValueShape::List => match value {
            FilterValue::List(items) => {
                let present: Vec<&Scalar> = items.iter().filter(|s| !s.is_blank()).collect();
                if present.is_empty() {
                    return Err(ValueIssue::Missing);
                }
                present
                    .into_iter()
                    .try_for_each(|item| check_scalar(field_type, item))
            }
            FilterValue::Scalar(s) if s.is_blank() => Err(ValueIssue::Missing),
            FilterValue::Scalar(_) => Err(ValueIssue::WrongShape {
                expected: "a list of values",
            }),
        },
    }
}

/// Check one non-blank scalar against a field type
///
/// # Errors
/// [`ValueIssue::TypeMismatch`] when the scalar cannot be read as the type.
pub fn check_scalar(field_type: FieldType, scalar: &Scalar) -> Result<(), ValueIssue> {
    let ok = match field_type {
        FieldType::String => true,
        FieldType::Number | FieldType::Currency | FieldType::Percentage => {
            scalar.as_f64().is_some_and(f64::is_finite)
        }
        FieldType::Boolean => match scalar {
            Scalar::Bool(_) => true,
            Scalar::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "false"),
            Scalar::Number(_) => false,
        },
        FieldType::Date => match scalar {
            Scalar::Text(s) => parse_date(s).is_some(),
            Scalar::Bool(_) | Scalar::Number(_) => false,
        },
    };

    if ok {
        Ok(())
    } else {
        Err(ValueIssue::TypeMismatch {
            value: render(scalar),
            field_type,
        })
    }
}

/// Parse a date operand (`YYYY-MM-DD` or RFC 3339)
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Whether a `[min, max]` pair is ordered backwards
///
/// Only meaningful for numeric and date fields; other types return `false`.
#[must_use]
pub fn range_inverted(field_type: FieldType, value: &FilterValue) -> bool {
    let FilterValue::List(items) = value else {
        return false;
    };
    let [min, max] = items.as_slice() else {
        return false;
    };

    if field_type.is_numeric() {
        matches!((min.as_f64(), max.as_f64()), (Some(a), Some(b)) if a > b)
    } else if field_type == FieldType::Date {
        match (min, max) {
            (Scalar::Text(a), Scalar::Text(b)) => {
                matches!((parse_date(a), parse_date(b)), (Some(a), Some(b)) if a > b)
            }
            _ => false,
        }
    } else {
        false
    }
}

fn render(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::Text(s) => s.clone(),
    }
}
