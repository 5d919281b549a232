//! Error types for the editor session
//!
//! Provides error handling for:
//! - Field catalog unavailability
//! - Persistence failures (conflicts, outages, rejections)
//! - Preview query failures
//! - Session-level misuse (invalid template, cross-list drags)

use rtb_model::TemplateId;
use rtb_template::{ModelError, ValidationResult};

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Rejected template mutation
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Field catalog unavailable
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Save or load failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Preview query failed
    #[error("preview error: {0}")]
    Preview(#[from] PreviewError),

    /// Template has validation errors; save and preview are blocked
    #[error("template is invalid ({} error(s))", .0.errors.len())]
    Invalid(ValidationResult),

    /// Drag moved an item between different lists
    #[error("cannot move items from the {from_list} list to the {to_list} list")]
    CrossListMove {
        /// List the item came from
        from_list: &'static str,
        /// List it was dropped on
        to_list: &'static str,
    },

    /// No prebuilt template with this key
    #[error("unknown prebuilt template: {0}")]
    PrebuiltNotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Model(e) => e.code(),
            Self::Catalog(e) => e.code(),
            Self::Persistence(e) => e.code(),
            Self::Preview(_) => "PREVIEW_FAILED",
            Self::Invalid(_) => "VALIDATION_FAILED",
            Self::CrossListMove { .. } => "CROSS_LIST_MOVE",
            Self::PrebuiltNotFound(_) => "PREBUILT_NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(e) => e.is_retryable(),
            Self::Catalog(e) => e.is_retryable(),
            Self::Preview(_) => true,
            _ => false,
        }
    }
}

/// Field catalog errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Catalog backend unreachable
    #[error("data sources unavailable: {0}")]
    Unavailable(String),

    /// Unknown data source id
    #[error("data source not found: {0}")]
    SourceNotFound(String),

    /// Unknown field name within a source
    #[error("field '{field}' not found in data source '{source_id}'")]
    FieldNotFound {
        /// Data source id
        source_id: String,
        /// Field name
        field: String,
    },

    /// Catalog has not been loaded yet
    #[error("catalog not loaded")]
    NotLoaded,
}

impl CatalogError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "CATALOG_UNAVAILABLE",
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            Self::NotLoaded => "CATALOG_NOT_LOADED",
        }
    }

    /// Check if refreshing the catalog may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::NotLoaded)
    }
}

/// Template repository errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// No template with this id
    #[error("template not found: {0}")]
    NotFound(TemplateId),

    /// Stored template changed since it was loaded
    #[error("template {id} was modified by someone else")]
    VersionConflict {
        /// Conflicting template
        id: TemplateId,
    },

    /// Backend unreachable or timed out
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the payload
    #[error("save rejected: {0}")]
    Rejected(String),

    /// A different template was loaded before this save could run
    #[error("save superseded by loading another template")]
    Superseded,
}

impl PersistenceError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Rejected(_) => "REJECTED",
            Self::Superseded => "SUPERSEDED",
        }
    }

    /// Check if retrying may succeed without user action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Preview query errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    /// Executor rejected the query
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Executor unreachable or timed out
    #[error("executor unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
