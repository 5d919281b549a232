use proptest::prelude::*;
use rtb_model::{FieldType, FilterValue, Operator, Scalar};
use rtb_operators::{check_value, OperatorRegistry, ValueIssue, ValueShape};

fn field_type() -> impl Strategy<Value = FieldType> {
    prop::sample::select(FieldType::ALL.to_vec())
}

#[test]
fn standard_order_is_stable() {
    let order: Vec<&str> = OperatorRegistry::standard()
        .iter()
        .map(|spec| spec.operator.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "equals",
            "not_equals",
            "contains",
            "not_contains",
            "starts_with",
            "ends_with",
            "greater_than",
            "greater_than_or_equal",
            "less_than",
            "less_than_or_equal",
            "between",
            "in",
            "not_in",
            "is_null",
            "is_not_null",
        ]
    );
}

#[test]
fn date_supports_range_but_not_membership() {
    let registry = OperatorRegistry::standard();
    assert!(registry.supports(Operator::Between, FieldType::Date));
    assert!(!registry.supports(Operator::In, FieldType::Date));
    assert!(!registry.supports(Operator::StartsWith, FieldType::Date));
}

#[test]
fn registry_check_value_routes_by_shape() {
    let registry = OperatorRegistry::standard();
    assert!(registry
        .check_value(Operator::IsNotNull, FieldType::Number, &FilterValue::empty_scalar())
        .is_ok());
    assert_eq!(
        registry.check_value(Operator::In, FieldType::Number, &FilterValue::empty_list()),
        Err(ValueIssue::Missing)
    );
    assert!(registry
        .check_value(
            Operator::In,
            FieldType::Number,
            &FilterValue::List(vec![Scalar::from(1.0), Scalar::from("2")])
        )
        .is_ok());
}

proptest! {
    #[test]
    fn prop_default_operator_supports_its_type(t in field_type()) {
        let registry = OperatorRegistry::standard();
        let op = registry.default_operator(t).unwrap();
        prop_assert!(registry.supports(op, t));
    }

    #[test]
    fn prop_operators_for_only_yields_supported(t in field_type()) {
        let registry = OperatorRegistry::standard();
        for spec in registry.operators_for(t) {
            prop_assert!(spec.supported_types.contains(&t));
        }
    }

    #[test]
    fn prop_empty_value_never_satisfies_a_required_operand(t in field_type()) {
        let registry = OperatorRegistry::standard();
        for spec in registry.operators_for(t).filter(|s| s.requires_value) {
            let empty = registry.empty_value(spec.operator);
            prop_assert!(registry.check_value(spec.operator, t, &empty).is_err());
            prop_assert!(spec.shape.matches(&empty));
        }
    }

    #[test]
    fn prop_any_finite_number_is_a_numeric_scalar(n in -1.0e12f64..1.0e12) {
        let number = FilterValue::from(n);
        prop_assert!(check_value(ValueShape::Scalar, FieldType::Currency, &number).is_ok());
        let text = FilterValue::from(n.to_string().as_str());
        prop_assert!(check_value(ValueShape::Scalar, FieldType::Number, &text).is_ok());
    }

    #[test]
    fn prop_pairs_need_exactly_two_bounds(len in 0usize..6) {
        let items: Vec<Scalar> = (0..len).map(|i| Scalar::from(i as f64)).collect();
        let result = check_value(ValueShape::Pair, FieldType::Number, &FilterValue::List(items));
        if len == 2 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }
}
