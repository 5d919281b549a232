//! Prebuilt template library
//!
//! Starting points a user can load into a fresh session. They are built
//! over [`sample_catalog`] and carry no id, so loading one enters create
//! mode.

use rtb_model::{
    Aggregation, BarOptions, BuilderField, DataSource, FieldFormat, FieldType, FilterValue,
    LineOptions, MetricOptions, Operator, PieOptions, ReportTemplate, Scalar, TableOptions,
    TemplateCategory, TemplateField, TemplateFilter, VisualizationConfig, VisualizationOptions,
};

/// A named prebuilt template
#[derive(Debug, Clone, PartialEq)]
pub struct PrebuiltTemplate {
    /// Stable key (`sales-by-region`, ...)
    pub key: &'static str,
    /// The template itself
    pub template: ReportTemplate,
}

/// Sample catalog with a `sales` and a `tasks` source
#[must_use]
pub fn sample_catalog() -> Vec<DataSource> {
    let numeric = [
        Aggregation::Sum,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Count,
    ];

    let sales = DataSource {
        id: "sales".to_string(),
        name: "Sales Orders".to_string(),
        kind: "postgres".to_string(),
        fields: vec![
            BuilderField::new("order_date", FieldType::Date, "orders", "Order Date")
                .with_formats([FieldFormat::Date, FieldFormat::Datetime]),
            BuilderField::new("region", FieldType::String, "orders", "Region")
                .with_description("Sales territory")
                .with_aggregations([Aggregation::Count, Aggregation::Distinct]),
            BuilderField::new("product", FieldType::String, "orders", "Product")
                .with_aggregations([Aggregation::Count, Aggregation::Distinct]),
            BuilderField::new("sales_rep", FieldType::String, "orders", "Sales Rep")
                .with_aggregations([Aggregation::Count, Aggregation::Distinct]),
            BuilderField::new("revenue", FieldType::Currency, "orders", "Revenue")
                .with_description("Order total after discounts")
                .with_aggregations(numeric)
                .with_formats([FieldFormat::Currency, FieldFormat::Number]),
            BuilderField::new("quantity", FieldType::Number, "orders", "Quantity")
                .with_aggregations(numeric)
                .with_formats([FieldFormat::Number]),
            BuilderField::new("margin", FieldType::Percentage, "orders", "Margin")
                .with_aggregations([Aggregation::Avg, Aggregation::Min, Aggregation::Max])
                .with_formats([FieldFormat::Percentage, FieldFormat::Number]),
            BuilderField::new("is_closed", FieldType::Boolean, "orders", "Closed"),
        ],
    };

    let tasks = DataSource {
        id: "tasks".to_string(),
        name: "Project Tasks".to_string(),
        kind: "graphql".to_string(),
        fields: vec![
            BuilderField::new("task_id", FieldType::String, "tasks", "Task")
                .with_aggregations([Aggregation::Count, Aggregation::Distinct]),
            BuilderField::new("title", FieldType::String, "tasks", "Title"),
            BuilderField::new("status", FieldType::String, "tasks", "Status")
                .with_aggregations([Aggregation::Count]),
            BuilderField::new("priority", FieldType::String, "tasks", "Priority")
                .with_aggregations([Aggregation::Count]),
            BuilderField::new("assignee", FieldType::String, "tasks", "Assignee")
                .with_aggregations([Aggregation::Count, Aggregation::Distinct]),
            BuilderField::new("due_date", FieldType::Date, "tasks", "Due Date")
                .with_formats([FieldFormat::Date]),
            BuilderField::new("estimated_hours", FieldType::Number, "tasks", "Estimated Hours")
                .with_aggregations(numeric),
            BuilderField::new("is_overdue", FieldType::Boolean, "tasks", "Overdue"),
        ],
    };

    vec![sales, tasks]
}

/// All prebuilt templates, one per visualization type
#[must_use]
pub fn prebuilt_templates() -> Vec<PrebuiltTemplate> {
    let catalog = sample_catalog();
    let (sales, tasks) = (&catalog[0], &catalog[1]);

    vec![
        sales_by_region(sales),
        revenue_trend(sales),
        task_status(tasks),
        total_revenue(sales),
        overdue_tasks(tasks),
    ]
}

/// Look up a prebuilt template by key
#[must_use]
pub fn find_prebuilt(key: &str) -> Option<PrebuiltTemplate> {
    prebuilt_templates().into_iter().find(|p| p.key == key)
}

struct Draft {
    template: ReportTemplate,
}

impl Draft {
    fn new(name: &str, description: &str, category: TemplateCategory) -> Self {
        let mut template = ReportTemplate::new(name);
        template.description = description.to_string();
        template.category = category;
        template.tags.insert("prebuilt".to_string());
        Self { template }
    }

    fn field(mut self, source: &DataSource, name: &str, aggregation: Aggregation) -> Self {
        if let Some(catalog) = source.field(name) {
            let mut field = TemplateField::from_builder(catalog);
            if field.allows_aggregation(aggregation) {
                field.aggregation = aggregation;
            }
            self.template.fields.push(field);
        }
        self
    }

    fn filter(mut self, name: &str, operator: Operator, value: FilterValue) -> Self {
        if let Some(field) = self.template.field_by_name(name) {
            let filter = TemplateFilter::new(field.id.clone(), operator, value)
                .with_label(field.display_name.clone());
            self.template.filters.push(filter);
        }
        self
    }

    fn visualization(mut self, title: &str, options: VisualizationOptions) -> Self {
        let mut viz = VisualizationConfig::new(options.kind()).with_title(title);
        viz.options = options;
        self.template.visualization = viz;
        self
    }

    fn done(self, key: &'static str) -> PrebuiltTemplate {
        PrebuiltTemplate {
            key,
            template: self.template,
        }
    }
}

fn sales_by_region(sales: &DataSource) -> PrebuiltTemplate {
    Draft::new(
        "Sales by Region",
        "Revenue per sales territory for the current year",
        TemplateCategory::Sales,
    )
    .field(sales, "region", Aggregation::None)
    .field(sales, "revenue", Aggregation::Sum)
    .field(sales, "order_date", Aggregation::None)
    .filter(
        "order_date",
        Operator::Between,
        FilterValue::range("2024-01-01", "2024-12-31"),
    )
    .visualization(
        "Revenue by Region",
        VisualizationOptions::Bar(BarOptions {
            x_axis: Some("region".to_string()),
            y_axis: Some("revenue".to_string()),
            ..BarOptions::default()
        }),
    )
    .done("sales-by-region")
}

fn revenue_trend(sales: &DataSource) -> PrebuiltTemplate {
    Draft::new(
        "Monthly Revenue Trend",
        "Closed revenue over time",
        TemplateCategory::Financial,
    )
    .field(sales, "order_date", Aggregation::None)
    .field(sales, "revenue", Aggregation::Sum)
    .field(sales, "is_closed", Aggregation::None)
    .filter("is_closed", Operator::Equals, FilterValue::from(true))
    .visualization(
        "Revenue Trend",
        VisualizationOptions::Line(LineOptions {
            x_axis: Some("order_date".to_string()),
            y_axis: Some("revenue".to_string()),
            smooth: true,
            ..LineOptions::default()
        }),
    )
    .done("revenue-trend")
}

fn task_status(tasks: &DataSource) -> PrebuiltTemplate {
    Draft::new(
        "Task Status Breakdown",
        "Share of tasks in each workflow status",
        TemplateCategory::Operational,
    )
    .field(tasks, "status", Aggregation::None)
    .field(tasks, "task_id", Aggregation::Count)
    .visualization(
        "Tasks by Status",
        VisualizationOptions::Pie(PieOptions {
            category_field: Some("status".to_string()),
            value_field: Some("task_id".to_string()),
            donut: true,
        }),
    )
    .done("task-status")
}

fn total_revenue(sales: &DataSource) -> PrebuiltTemplate {
    Draft::new(
        "Total Revenue",
        "Headline revenue figure",
        TemplateCategory::Analytics,
    )
    .field(sales, "revenue", Aggregation::Sum)
    .field(sales, "margin", Aggregation::Avg)
    .filter("revenue", Operator::GreaterThan, FilterValue::from(0.0))
    .visualization(
        "Revenue",
        VisualizationOptions::Metric(MetricOptions {
            metric_field: Some("revenue".to_string()),
            comparison_field: Some("margin".to_string()),
            prefix: Some("$".to_string()),
            suffix: None,
        }),
    )
    .done("total-revenue")
}

fn overdue_tasks(tasks: &DataSource) -> PrebuiltTemplate {
    Draft::new(
        "Overdue Tasks",
        "High-priority tasks past their due date",
        TemplateCategory::Operational,
    )
    .field(tasks, "title", Aggregation::None)
    .field(tasks, "assignee", Aggregation::None)
    .field(tasks, "priority", Aggregation::None)
    .field(tasks, "due_date", Aggregation::None)
    .field(tasks, "is_overdue", Aggregation::None)
    .filter("is_overdue", Operator::Equals, FilterValue::from(true))
    .filter(
        "priority",
        Operator::In,
        FilterValue::List(vec![Scalar::from("high"), Scalar::from("urgent")]),
    )
    .visualization(
        "Overdue Tasks",
        VisualizationOptions::Table(TableOptions {
            page_size: 50,
            ..TableOptions::default()
        }),
    )
    .done("overdue-tasks")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use rtb_model::VisualizationKind;
    use rtb_operators::OperatorRegistry;
    use std::collections::HashSet;

    #[test]
    fn one_prebuilt_per_visualization_kind() {
        let kinds: HashSet<VisualizationKind> = prebuilt_templates()
            .iter()
            .map(|p| p.template.visualization.kind())
            .collect();
        assert_eq!(kinds.len(), VisualizationKind::ALL.len());
    }

    #[test]
    fn every_prebuilt_is_valid_and_unsaved() {
        for prebuilt in prebuilt_templates() {
            let result = validate(&prebuilt.template, OperatorRegistry::standard());
            assert!(result.is_valid, "{}: {:?}", prebuilt.key, result.errors);
            assert!(
                !result.has_code(crate::ValidationCode::UnknownVisualizationField),
                "{}",
                prebuilt.key
            );
            assert!(prebuilt.template.id.is_none());
        }
    }

    #[test]
    fn lookup_by_key() {
        let prebuilt = find_prebuilt("task-status").unwrap();
        assert_eq!(prebuilt.template.fields[1].aggregation, Aggregation::Count);
        assert!(find_prebuilt("missing").is_none());
    }
}
