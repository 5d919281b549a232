//! Template mutation errors

use rtb_model::{Aggregation, FieldFormat, FieldId, FilterId};

/// Rejected template mutation
///
/// A rejected mutation leaves the model untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A field with the same catalog name is already in the template
    #[error("field '{name}' is already part of the template")]
    DuplicateField {
        /// Catalog name
        name: String,
    },

    /// Unknown field id
    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    /// Unknown filter id
    #[error("filter not found: {0}")]
    FilterNotFound(FilterId),

    /// Aggregation outside the field's allowed set
    #[error("aggregation {aggregation:?} is not allowed for field '{field}'")]
    AggregationNotAllowed {
        /// Field name
        field: String,
        /// Rejected aggregation
        aggregation: Aggregation,
    },

    /// Format outside the field's allowed set
    #[error("format {format:?} is not allowed for field '{field}'")]
    FormatNotAllowed {
        /// Field name
        field: String,
        /// Rejected format
        format: FieldFormat,
    },

    /// Loaded template breaks a structural invariant
    #[error("corrupt template: {0}")]
    CorruptTemplate(String),
}

impl ModelError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateField { .. } => "DUPLICATE_FIELD",
            Self::FieldNotFound(_) => "FIELD_NOT_FOUND",
            Self::FilterNotFound(_) => "FILTER_NOT_FOUND",
            Self::AggregationNotAllowed { .. } => "AGGREGATION_NOT_ALLOWED",
            Self::FormatNotAllowed { .. } => "FORMAT_NOT_ALLOWED",
            Self::CorruptTemplate(_) => "CORRUPT_TEMPLATE",
        }
    }
}

/// Result alias for model mutations
pub type ModelResult<T> = Result<T, ModelError>;
