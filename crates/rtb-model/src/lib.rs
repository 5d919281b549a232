//! Report Template Data Model
//!
//! Typed, serializable building blocks of a report definition.
//!
//! # Core Concepts
//!
//! - [`BuilderField`] / [`DataSource`]: catalog entries supplied from outside
//! - [`TemplateField`]: frozen copy of a catalog field inside a template
//! - [`TemplateFilter`] / [`FilterValue`]: predicates over template fields
//! - [`VisualizationConfig`]: the single, type-tagged visualization
//! - [`ReportTemplate`]: the aggregate root and persisted wire shape
//!
//! # Example
//!
//! ```rust,ignore
//! use rtb_model::{BuilderField, FieldType, ReportTemplate, TemplateField};
//!
//! let catalog = BuilderField::new("total_sales", FieldType::Number, "orders", "Total Sales");
//! let mut template = ReportTemplate::new("Sales by region");
//! template.fields.push(TemplateField::from_builder(&catalog));
//!
//! let json = template.to_json_pretty()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod field;
mod filter;
mod ids;
mod template;
mod visualization;

// Re-exports
pub use field::{
    Aggregation, BuilderField, DataSource, FieldFormat, FieldType, FieldWidth, TemplateField,
};
pub use filter::{FilterValue, Operator, Scalar, TemplateFilter};
pub use ids::{FieldId, FilterId, TemplateId};
pub use template::{ReportTemplate, SaveReceipt, TemplateCategory};
pub use visualization::{
    BarOptions, LineOptions, MetricOptions, PieOptions, TableOptions, VisualizationConfig,
    VisualizationKind, VisualizationOptions, DEFAULT_COLORS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
