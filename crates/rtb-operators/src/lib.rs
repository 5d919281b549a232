//! Filter Operator Registry
//!
//! Static knowledge about filter operators.
//!
//! # Core Concepts
//!
//! - [`OperatorRegistry`]: ordered table of operators; the first operator
//!   supporting a field type is that type's default
//! - [`OperatorSpec`]: label, supported types, value requirements
//! - [`ValueShape`]: none / scalar / `[min, max]` pair / list
//! - [`check_value`]: whether a stored operand fits shape and field type
//!
//! # Example
//!
//! ```rust,ignore
//! use rtb_operators::OperatorRegistry;
//! use rtb_model::{FieldType, Operator};
//!
//! let registry = OperatorRegistry::standard();
//! assert_eq!(registry.default_operator(FieldType::Date), Some(Operator::Equals));
//! assert!(!registry.supports(Operator::Contains, FieldType::Number));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod registry;
mod value;

// Re-exports
pub use registry::{OperatorRegistry, OperatorSpec};
pub use value::{check_scalar, check_value, parse_date, range_inverted, ValueIssue, ValueShape};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
