//! External collaborator interfaces
//!
//! The session reaches the outside world only through these traits:
//! the field catalog, the template repository and the preview query
//! executor. In-memory implementations live in [`crate::adapters`].

use crate::error::{CatalogError, PersistenceError, PreviewError};
use async_trait::async_trait;
use rtb_model::{DataSource, ReportTemplate, SaveReceipt, TemplateId};

/// One preview row keyed by field name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Read-only source of selectable data fields
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    /// All data sources and their fields
    async fn list_data_sources(&self) -> Result<Vec<DataSource>, CatalogError>;
}

/// Template persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Load a stored template
    async fn get(&self, id: &TemplateId) -> Result<ReportTemplate, PersistenceError>;

    /// Create (no id) or update (id present) a template
    ///
    /// Implementations use `updatedAt` for optimistic concurrency and answer
    /// a stale update with [`PersistenceError::VersionConflict`].
    async fn save(&self, template: &ReportTemplate) -> Result<SaveReceipt, PersistenceError>;
}

/// Runs preview queries for a template
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataQueryExecutor: Send + Sync {
    /// Up to `limit` rows for the template's fields, filters and visualization
    async fn preview(&self, template: &ReportTemplate, limit: usize)
        -> Result<Vec<Row>, PreviewError>;
}
