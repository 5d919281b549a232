use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rtb_model::{BuilderField, FieldType, Operator, VisualizationKind};
use rtb_template::{FieldPatch, FilterPatch, TemplateModel, ValidationCode, VisualizationPatch};
use std::collections::HashSet;

fn total_sales() -> BuilderField {
    BuilderField::new("total_sales", FieldType::Number, "orders", "Total Sales")
}

#[test]
fn empty_template_requires_fields() {
    let model = TemplateModel::new();
    let result = model.validation();
    assert!(!result.is_valid);
    assert!(result.has_code(ValidationCode::FieldsRequired));
}

#[test]
fn bar_chart_becomes_valid_once_axes_are_set() {
    let mut model = TemplateModel::new();
    model.update_metadata(rtb_template::MetadataPatch::new().with_name("Sales"));
    model.add_field(&total_sales()).unwrap();
    model.set_visualization(VisualizationKind::Bar);
    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::AxesRequired]
    );

    model.update_visualization(VisualizationPatch::new().with_axes("category", "total_sales"));
    assert!(model.is_valid());
}

#[test]
fn string_operator_on_number_field_is_invalid() {
    let mut model = TemplateModel::new();
    model.update_metadata(rtb_template::MetadataPatch::new().with_name("Sales"));
    let field = model.add_field(&total_sales()).unwrap();
    let filter = model.add_filter(&field).unwrap();
    assert!(!model.validation().has_code(ValidationCode::InvalidOperator));
    assert_eq!(model.template().filters[0].operator, Operator::Equals);

    model
        .update_filter(&filter, FilterPatch::new().with_value(1500.0))
        .unwrap();
    assert!(model.is_valid());

    model
        .update_filter(&filter, FilterPatch::new().with_operator(Operator::Contains))
        .unwrap();
    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::InvalidOperator]
    );
}

#[test]
fn blank_visualization_fields_count_as_missing() {
    let mut model = TemplateModel::new();
    model.update_metadata(rtb_template::MetadataPatch::new().with_name("Sales"));
    model.add_field(&total_sales()).unwrap();

    model.set_visualization(VisualizationKind::Bar);
    model.update_visualization(VisualizationPatch::new().with_axes("", "  "));
    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::AxesRequired]
    );
    assert!(!model
        .validation()
        .has_code(ValidationCode::UnknownVisualizationField));

    model.set_visualization(VisualizationKind::Pie);
    model.update_visualization(VisualizationPatch::new().with_category_field(""));
    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::GroupByRequired]
    );

    model.set_visualization(VisualizationKind::Metric);
    model.update_visualization(VisualizationPatch::new().with_metric_field(" "));
    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::MetricFieldRequired]
    );
}

#[test]
fn operator_errors_come_before_value_errors() {
    let mut model = TemplateModel::new();
    model.update_metadata(rtb_template::MetadataPatch::new().with_name("Sales"));
    let field = model.add_field(&total_sales()).unwrap();

    // equals with no value yet
    model.add_filter(&field).unwrap();
    let second = model.add_filter(&field).unwrap();
    model
        .update_filter(&second, FilterPatch::new().with_operator(Operator::Contains))
        .unwrap();

    assert_eq!(
        model.validation().error_codes(),
        vec![ValidationCode::InvalidOperator, ValidationCode::ValueRequired]
    );
}

#[test]
fn bar_to_pie_clears_axes_and_keeps_common_attributes() {
    let mut model = TemplateModel::new();
    model.set_visualization(VisualizationKind::Bar);
    model.update_visualization(
        VisualizationPatch::new()
            .with_axes("region", "total_sales")
            .with_title("Revenue")
            .with_colors(["#111111", "#222222"]),
    );

    model.set_visualization(VisualizationKind::Pie);
    let viz = &model.template().visualization;
    assert_eq!(viz.x_axis(), None);
    assert_eq!(viz.y_axis(), None);
    assert_eq!(viz.title, "Revenue");
    assert_eq!(viz.colors, vec!["#111111".to_string(), "#222222".to_string()]);
}

#[test]
fn wire_round_trip_through_hydration() {
    let mut model = TemplateModel::new();
    let field = model.add_field(&total_sales()).unwrap();
    model.add_filter(&field).unwrap();

    let json = model.template().to_json_pretty().unwrap();
    let hydrated =
        TemplateModel::from_template(rtb_model::ReportTemplate::from_json(&json).unwrap())
            .unwrap();
    assert_eq!(hydrated.template(), model.template());
}

#[derive(Debug, Clone)]
enum Op {
    AddField(usize),
    RemoveField(usize),
    AddFilter(usize),
    ChangeType(usize, FieldType),
    Retarget(usize, usize),
    ReorderFields(usize, usize),
    ReorderFilters(usize, usize),
}

fn catalog() -> Vec<BuilderField> {
    FieldType::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| BuilderField::new(format!("f{i}"), *t, "src", format!("F{i}")))
        .collect()
}

fn op() -> impl Strategy<Value = Op> {
    let t = prop::sample::select(FieldType::ALL.to_vec());
    prop_oneof![
        (0usize..6).prop_map(Op::AddField),
        (0usize..8).prop_map(Op::RemoveField),
        (0usize..8).prop_map(Op::AddFilter),
        ((0usize..8), t).prop_map(|(i, t)| Op::ChangeType(i, t)),
        ((0usize..8), (0usize..8)).prop_map(|(a, b)| Op::Retarget(a, b)),
        ((0usize..8), (0usize..8)).prop_map(|(a, b)| Op::ReorderFields(a, b)),
        ((0usize..8), (0usize..8)).prop_map(|(a, b)| Op::ReorderFilters(a, b)),
    ]
}

fn apply(model: &mut TemplateModel, catalog: &[BuilderField], op: Op) {
    let field_id = |m: &TemplateModel, i: usize| m.template().fields.get(i).map(|f| f.id.clone());
    let filter_id = |m: &TemplateModel, i: usize| m.template().filters.get(i).map(|f| f.id.clone());
    match op {
        Op::AddField(i) => {
            let _ = model.add_field(&catalog[i]);
        }
        Op::RemoveField(i) => {
            if let Some(id) = field_id(&*model, i) {
                let before: Vec<_> = model
                    .template()
                    .filters
                    .iter()
                    .filter(|f| f.field_id != id)
                    .map(|f| f.id.clone())
                    .collect();
                model.remove_field(&id).unwrap();
                let after: Vec<_> = model.template().filters.iter().map(|f| f.id.clone()).collect();
                assert_eq!(before, after);
            }
        }
        Op::AddFilter(i) => {
            if let Some(id) = field_id(&*model, i) {
                model.add_filter(&id).unwrap();
            }
        }
        Op::ChangeType(i, t) => {
            if let Some(id) = field_id(&*model, i) {
                model.update_field(&id, FieldPatch::new().with_type(t)).unwrap();
            }
        }
        Op::Retarget(filter, field) => {
            if let (Some(filter), Some(field)) =
                (filter_id(&*model, filter), field_id(&*model, field))
            {
                model
                    .update_filter(&filter, FilterPatch::new().with_field(field))
                    .unwrap();
            }
        }
        Op::ReorderFields(a, b) => {
            model.reorder_fields(a, b);
        }
        Op::ReorderFilters(a, b) => {
            model.reorder_filters(a, b);
        }
    }
}

proptest! {
    #[test]
    fn prop_model_invariants_hold(ops in proptest::collection::vec(op(), 0..40)) {
        let catalog = catalog();
        let mut model = TemplateModel::new();
        for op in ops {
            apply(&mut model, &catalog, op);

            let template = model.template();
            let ids: HashSet<_> = template.fields.iter().map(|f| &f.id).collect();
            prop_assert_eq!(ids.len(), template.fields.len());

            for filter in &template.filters {
                let field = template.field(&filter.field_id);
                prop_assert!(field.is_some());
                let field_type = field.map(|f| f.field_type).unwrap();
                prop_assert!(model.registry().supports(filter.operator, field_type));
            }
            prop_assert!(!model.validation().has_code(ValidationCode::InvalidOperator));
        }
    }

    #[test]
    fn prop_revision_is_monotonic(ops in proptest::collection::vec(op(), 0..30)) {
        let catalog = catalog();
        let mut model = TemplateModel::new();
        let mut last = model.revision();
        for op in ops {
            apply(&mut model, &catalog, op);
            prop_assert!(model.revision() >= last);
            last = model.revision();
        }
    }
}
