//! Template validation
//!
//! Pure, synchronous rule evaluation over a [`ReportTemplate`]. All
//! violations are collected rather than stopping at the first. Errors block
//! manual save and preview; warnings never block anything.

use rtb_model::{FieldType, Operator, ReportTemplate, TemplateFilter, VisualizationOptions};
use rtb_operators::{range_inverted, OperatorRegistry, OperatorSpec};
use serde::{Deserialize, Serialize};

/// Machine-readable validation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// Template name empty
    NameRequired,
    /// No fields selected
    FieldsRequired,
    /// Bar/line chart without both axes
    AxesRequired,
    /// Pie chart without a category field
    GroupByRequired,
    /// Metric without a metric field
    MetricFieldRequired,
    /// Operator not valid for the filter's field (or field missing)
    InvalidOperator,
    /// Operator needs a value that is missing or malformed
    ValueRequired,
    /// Warning: no filters configured
    NoFilters,
    /// Warning: every field is hidden
    NoVisibleFields,
    /// Warning: visualization points at a field not in the template
    UnknownVisualizationField,
    /// Warning: `between` with min greater than max
    RangeInverted,
}

impl ValidationCode {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameRequired => "NAME_REQUIRED",
            Self::FieldsRequired => "FIELDS_REQUIRED",
            Self::AxesRequired => "AXES_REQUIRED",
            Self::GroupByRequired => "GROUP_BY_REQUIRED",
            Self::MetricFieldRequired => "METRIC_FIELD_REQUIRED",
            Self::InvalidOperator => "INVALID_OPERATOR",
            Self::ValueRequired => "VALUE_REQUIRED",
            Self::NoFilters => "NO_FILTERS",
            Self::NoVisibleFields => "NO_VISIBLE_FIELDS",
            Self::UnknownVisualizationField => "UNKNOWN_VISUALIZATION_FIELD",
            Self::RangeInverted => "RANGE_INVERTED",
        }
    }

    /// Whether this code is advisory only
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::NoFilters
                | Self::NoVisibleFields
                | Self::UnknownVisualizationField
                | Self::RangeInverted
        )
    }
}

impl std::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path of the offending attribute (`name`, `visualization.xAxis`,
    /// `filters.<id>.value`, ...)
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Code
    pub code: ValidationCode,
}

impl ValidationIssue {
    /// Create new issue
    #[must_use]
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }
}

/// Outcome of validating a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `errors.is_empty()`
    pub is_valid: bool,
    /// Blocking issues, in rule order
    pub errors: Vec<ValidationIssue>,
    /// Advisory issues, in rule order
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (warnings, errors): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(|i| i.code.is_warning());
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Whether any error or warning carries `code`
    #[must_use]
    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|issue| issue.code == code)
    }

    /// Error codes in order
    #[must_use]
    pub fn error_codes(&self) -> Vec<ValidationCode> {
        self.errors.iter().map(|issue| issue.code).collect()
    }

    /// Issues (errors first) whose path starts with `prefix`
    pub fn issues_for<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .filter(move |issue| issue.field.starts_with(prefix))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::from_issues(Vec::new())
    }
}

/// Validate a template against an operator registry
#[must_use]
pub fn validate(template: &ReportTemplate, registry: &OperatorRegistry) -> ValidationResult {
    let mut issues = Vec::new();

    if template.name.trim().is_empty() {
        issues.push(ValidationIssue::new(
            "name",
            ValidationCode::NameRequired,
            "Template name is required",
        ));
    }

    if template.fields.is_empty() {
        issues.push(ValidationIssue::new(
            "fields",
            ValidationCode::FieldsRequired,
            "At least one field must be selected",
        ));
    }

    check_visualization(template, &mut issues);

    // every operator error precedes every value error
    let checked: Vec<_> = template
        .filters
        .iter()
        .filter_map(|filter| check_operator(template, filter, registry, &mut issues))
        .collect();
    for (filter, field_type, display_name, spec) in checked {
        check_value(filter, field_type, display_name, spec, registry, &mut issues);
    }

    if template.filters.is_empty() {
        issues.push(ValidationIssue::new(
            "filters",
            ValidationCode::NoFilters,
            "No filters configured; the report will include all rows",
        ));
    }

    if !template.fields.is_empty() && template.fields.iter().all(|f| !f.visible) {
        issues.push(ValidationIssue::new(
            "fields",
            ValidationCode::NoVisibleFields,
            "All fields are hidden",
        ));
    }

    ValidationResult::from_issues(issues)
}

fn check_visualization(template: &ReportTemplate, issues: &mut Vec<ValidationIssue>) {
    let viz = &template.visualization;
    match &viz.options {
        VisualizationOptions::Table(_) => {}
        VisualizationOptions::Bar(_) | VisualizationOptions::Line(_) => {
            if is_blank(viz.x_axis()) || is_blank(viz.y_axis()) {
                issues.push(ValidationIssue::new(
                    "visualization.axes",
                    ValidationCode::AxesRequired,
                    format!("A {} chart needs both an X and a Y axis", viz.kind()),
                ));
            }
        }
        VisualizationOptions::Pie(o) => {
            if is_blank(o.category_field.as_deref()) {
                issues.push(ValidationIssue::new(
                    "visualization.categoryField",
                    ValidationCode::GroupByRequired,
                    "A pie chart needs a field to group by",
                ));
            }
        }
        VisualizationOptions::Metric(o) => {
            if is_blank(o.metric_field.as_deref()) {
                issues.push(ValidationIssue::new(
                    "visualization.metricField",
                    ValidationCode::MetricFieldRequired,
                    "A metric needs a metric field",
                ));
            }
        }
    }

    for (attr, name) in viz.referenced_fields() {
        if !is_blank(Some(name)) && template.field_by_name(name).is_none() {
            issues.push(ValidationIssue::new(
                format!("visualization.{attr}"),
                ValidationCode::UnknownVisualizationField,
                format!("'{name}' is not one of the template's fields"),
            ));
        }
    }
}

/// Unset, empty and whitespace-only names all count as missing
fn is_blank(name: Option<&str>) -> bool {
    match name {
        Some(n) => n.trim().is_empty(),
        None => true,
    }
}

type CheckedFilter<'a> = (&'a TemplateFilter, FieldType, &'a str, &'a OperatorSpec);

fn check_operator<'a>(
    template: &'a ReportTemplate,
    filter: &'a TemplateFilter,
    registry: &'a OperatorRegistry,
    issues: &mut Vec<ValidationIssue>,
) -> Option<CheckedFilter<'a>> {
    let path = format!("filters.{}", filter.id);

    let Some(field) = template.field(&filter.field_id) else {
        issues.push(ValidationIssue::new(
            format!("{path}.operator"),
            ValidationCode::InvalidOperator,
            format!("Filter references unknown field {}", filter.field_id),
        ));
        return None;
    };

    let Some(spec) = registry
        .get(filter.operator)
        .filter(|spec| spec.supports(field.field_type))
    else {
        issues.push(ValidationIssue::new(
            format!("{path}.operator"),
            ValidationCode::InvalidOperator,
            format!(
                "Operator {} cannot be used with {} field '{}'",
                filter.operator, field.field_type, field.display_name
            ),
        ));
        return None;
    };

    Some((filter, field.field_type, field.display_name.as_str(), spec))
}

fn check_value(
    filter: &TemplateFilter,
    field_type: FieldType,
    display_name: &str,
    spec: &OperatorSpec,
    registry: &OperatorRegistry,
    issues: &mut Vec<ValidationIssue>,
) {
    let path = format!("filters.{}", filter.id);

    if spec.requires_value {
        if let Err(issue) = registry.check_value(filter.operator, field_type, &filter.value) {
            issues.push(ValidationIssue::new(
                format!("{path}.value"),
                ValidationCode::ValueRequired,
                format!("{}: {issue}", label_of(filter, display_name)),
            ));
            return;
        }
    }

    if filter.operator == Operator::Between && inverted(field_type, filter) {
        issues.push(ValidationIssue::new(
            format!("{path}.value"),
            ValidationCode::RangeInverted,
            format!(
                "{}: range minimum is greater than maximum",
                label_of(filter, display_name)
            ),
        ));
    }
}

fn inverted(field_type: FieldType, filter: &TemplateFilter) -> bool {
    range_inverted(field_type, &filter.value)
}

fn label_of<'a>(filter: &'a TemplateFilter, fallback: &'a str) -> &'a str {
    if filter.label.is_empty() {
        fallback
    } else {
        &filter.label
    }
}
