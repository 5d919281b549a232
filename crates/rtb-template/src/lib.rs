//! Report Template Engine
//!
//! The mutable template aggregate and the pure rules around it.
//!
//! # Overview
//!
//! - **TemplateModel**: owns a [`ReportTemplate`](rtb_model::ReportTemplate);
//!   every mutation bumps a revision and re-runs validation
//! - **validate**: collects every rule violation as errors or warnings
//! - **reorder**: total, permutation-preserving list moves
//! - **prebuilt**: ready-made templates over a sample catalog
//!
//! # Example
//!
//! ```rust
//! use rtb_template::{prebuilt::sample_catalog, TemplateModel, MetadataPatch};
//!
//! let catalog = sample_catalog();
//! let mut model = TemplateModel::new();
//! model.update_metadata(MetadataPatch::new().with_name("Revenue"));
//!
//! let revenue = catalog[0].field("revenue").unwrap();
//! let field_id = model.add_field(revenue).unwrap();
//! model.add_filter(&field_id).unwrap();
//!
//! // the new filter still needs a value
//! assert!(!model.is_valid());
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod patch;
pub mod prebuilt;
pub mod reorder;
pub mod validation;

// Re-exports
pub use error::{ModelError, ModelResult};
pub use model::{Hydrated, TemplateModel, COPY_SUFFIX};
pub use patch::{FieldPatch, FilterPatch, MetadataPatch, VisualizationPatch};
pub use prebuilt::{find_prebuilt, prebuilt_templates, sample_catalog, PrebuiltTemplate};
pub use reorder::{reorder, reorder_in_place};
pub use validation::{validate, ValidationCode, ValidationIssue, ValidationResult};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for template editing
    pub use crate::{
        validate, FieldPatch, FilterPatch, MetadataPatch, ModelError, TemplateModel,
        ValidationCode, ValidationResult, VisualizationPatch,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
