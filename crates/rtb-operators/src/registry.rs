//! Operator registry
//!
//! Provides [`OperatorRegistry`]: the ordered table of filter operators, the
//! field types each supports, and the operand shape each requires.

use crate::value::{check_value, ValueIssue, ValueShape};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rtb_model::{FieldType, FilterValue, Operator};
use std::collections::BTreeSet;

const TEXT: &[FieldType] = &[FieldType::String];
const ORDERED: &[FieldType] = &[
    FieldType::Number,
    FieldType::Currency,
    FieldType::Percentage,
    FieldType::Date,
];
const LISTABLE: &[FieldType] = &[
    FieldType::String,
    FieldType::Number,
    FieldType::Currency,
    FieldType::Percentage,
];

static STANDARD: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::with_defaults);

/// Registry entry for one operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSpec {
    /// Operator key
    pub operator: Operator,
    /// Human label
    pub label: &'static str,
    /// Field types the operator applies to
    pub supported_types: BTreeSet<FieldType>,
    /// Whether an operand must be entered
    pub requires_value: bool,
    /// Whether the operand holds several scalars (`in`, `not_in`, `between`)
    pub allows_multiple_values: bool,
    /// Operand shape
    pub shape: ValueShape,
}

impl OperatorSpec {
    /// Create an entry; `requires_value`/`allows_multiple_values` follow
    /// from the shape
    #[must_use]
    pub fn new(
        operator: Operator,
        label: &'static str,
        supported_types: &[FieldType],
        shape: ValueShape,
    ) -> Self {
        Self {
            operator,
            label,
            supported_types: supported_types.iter().copied().collect(),
            requires_value: shape != ValueShape::None,
            allows_multiple_values: matches!(shape, ValueShape::Pair | ValueShape::List),
            shape,
        }
    }

    /// Whether the operator applies to `field_type`
    #[inline]
    #[must_use]
    pub fn supports(&self, field_type: FieldType) -> bool {
        self.supported_types.contains(&field_type)
    }

    /// Empty operand for this operator
    #[inline]
    #[must_use]
    pub fn empty_value(&self) -> FilterValue {
        self.shape.empty_value()
    }
}

/// Ordered table of filter operators
///
/// Order matters: the default operator for a field type is the first entry
/// supporting it.
#[derive(Debug, Default, Clone)]
pub struct OperatorRegistry {
    operators: IndexMap<Operator, OperatorSpec>,
}

impl OperatorRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            operators: IndexMap::new(),
        }
    }

    /// Create registry with the built-in operators
    #[must_use]
    pub fn with_defaults() -> Self {
        let all = &FieldType::ALL;
        let mut registry = Self::new();
        registry.register(OperatorSpec::new(Operator::Equals, "Equals", all, ValueShape::Scalar));
        registry.register(OperatorSpec::new(
            Operator::NotEquals,
            "Does not equal",
            all,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::Contains,
            "Contains",
            TEXT,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::NotContains,
            "Does not contain",
            TEXT,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::StartsWith,
            "Starts with",
            TEXT,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::EndsWith,
            "Ends with",
            TEXT,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::GreaterThan,
            "Greater than",
            ORDERED,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::GreaterThanOrEqual,
            "Greater than or equal",
            ORDERED,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::LessThan,
            "Less than",
            ORDERED,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::LessThanOrEqual,
            "Less than or equal",
            ORDERED,
            ValueShape::Scalar,
        ));
        registry.register(OperatorSpec::new(
            Operator::Between,
            "Between",
            ORDERED,
            ValueShape::Pair,
        ));
        registry.register(OperatorSpec::new(Operator::In, "Is one of", LISTABLE, ValueShape::List));
        registry.register(OperatorSpec::new(
            Operator::NotIn,
            "Is not one of",
            LISTABLE,
            ValueShape::List,
        ));
        registry.register(OperatorSpec::new(Operator::IsNull, "Is empty", all, ValueShape::None));
        registry.register(OperatorSpec::new(
            Operator::IsNotNull,
            "Is not empty",
            all,
            ValueShape::None,
        ));
        registry
    }

    /// Process-wide built-in registry
    #[inline]
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Register (or replace) an operator
    ///
    /// Replacing keeps the entry's original position.
    pub fn register(&mut self, spec: OperatorSpec) {
        self.operators.insert(spec.operator, spec);
    }

    /// Remove operator
    #[inline]
    pub fn remove(&mut self, operator: Operator) -> bool {
        self.operators.shift_remove(&operator).is_some()
    }

    /// Get entry for an operator
    #[inline]
    #[must_use]
    pub fn get(&self, operator: Operator) -> Option<&OperatorSpec> {
        self.operators.get(&operator)
    }

    /// Check if operator is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, operator: Operator) -> bool {
        self.operators.contains_key(&operator)
    }

    /// Whether `operator` is registered and applies to `field_type`
    #[must_use]
    pub fn supports(&self, operator: Operator, field_type: FieldType) -> bool {
        self.get(operator).is_some_and(|spec| spec.supports(field_type))
    }

    /// Operators valid for a field type, in registry order
    pub fn operators_for(&self, field_type: FieldType) -> impl Iterator<Item = &OperatorSpec> {
        self.operators
            .values()
            .filter(move |spec| spec.supports(field_type))
    }

    /// First operator supporting the type
    #[must_use]
    pub fn default_operator(&self, field_type: FieldType) -> Option<Operator> {
        self.operators_for(field_type).next().map(|spec| spec.operator)
    }

    /// Empty operand for an operator (`""` when unregistered)
    #[must_use]
    pub fn empty_value(&self, operator: Operator) -> FilterValue {
        self.get(operator)
            .map_or_else(FilterValue::empty_scalar, OperatorSpec::empty_value)
    }

    /// Check an operand against the operator's shape and the field type
    ///
    /// Unregistered operators accept anything; operator/type compatibility is
    /// a separate check ([`Self::supports`]).
    ///
    /// # Errors
    /// Returns the [`ValueIssue`] describing the first problem.
    pub fn check_value(
        &self,
        operator: Operator,
        field_type: FieldType,
        value: &FilterValue,
    ) -> Result<(), ValueIssue> {
        match self.get(operator) {
            Some(spec) => check_value(spec.shape, field_type, value),
            None => Ok(()),
        }
    }

    /// Iterate over all entries in order
    pub fn iter(&self) -> impl Iterator<Item = &OperatorSpec> {
        self.operators.values()
    }

    /// Get number of registered operators
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
