//! Report Template Editor Session
//!
//! The asynchronous side of the builder:
//! - Debounced, single-flight autosave with a coalesced follow-up save
//! - Preview generation where only the newest request's rows are shown
//! - Collaborator traits for the field catalog, repository and query executor
//! - In-memory adapters for all three
//!
//! # Example
//!
//! ```rust,no_run
//! use rtb_session::prelude::*;
//! use rtb_session::adapters::{
//!     MemoryTemplateRepository, StaticFieldCatalog, SyntheticQueryExecutor,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), SessionError> {
//! let collaborators = Collaborators::new(
//!     Arc::new(StaticFieldCatalog::new(rtb_template::sample_catalog())),
//!     Arc::new(MemoryTemplateRepository::new()),
//!     Arc::new(SyntheticQueryExecutor::default()),
//! );
//! let session = EditorSession::create(collaborators, SessionConfig::default())?;
//! session.refresh_catalog().await?;
//!
//! session.update_metadata(MetadataPatch::new().with_name("Revenue by region"));
//! session.add_catalog_field("sales", "region")?;
//! let receipt = session.save_now().await?;
//! println!("saved as {}", receipt.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod adapters;
pub mod autosave;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod preview;
pub mod session;

// Re-exports for convenience
pub use autosave::{AutosaveCoordinator, SaveOutcome, SaveStatus};
pub use collaborators::{DataQueryExecutor, FieldCatalog, Row, TemplateRepository};
pub use config::SessionConfig;
pub use error::{CatalogError, PersistenceError, PreviewError, SessionError, SessionResult};
pub use preview::{GenerationToken, PreviewGenerator, PreviewState};
pub use session::{Collaborators, DragMove, EditorSession, ListKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving an editor session
    pub use crate::{
        Collaborators, DragMove, EditorSession, ListKind, PreviewState, SaveStatus,
        SessionConfig, SessionError,
    };
    pub use rtb_template::{FieldPatch, FilterPatch, MetadataPatch, VisualizationPatch};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
