//! Read-only subcommands: validate, operators, prebuilt

use anyhow::{Context, Result};
use rtb_model::{FieldType, ReportTemplate};
use rtb_operators::{OperatorRegistry, OperatorSpec, ValueShape};
use rtb_template::{prebuilt_templates, validate, ValidationResult};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Parse a template file and validate it as stored
///
/// Dangling filters are reported, not dropped.
///
/// # Errors
/// The file cannot be read or is not a template document.
pub fn validate_file(path: &Path) -> Result<ValidationResult> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let template = ReportTemplate::from_json(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(validate(&template, OperatorRegistry::standard()))
}

/// Human-readable validation report
#[must_use]
pub fn render_validation(name: &str, result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid { "valid" } else { "INVALID" };
    let _ = writeln!(out, "{name}: {verdict}");
    let issues = result
        .errors
        .iter()
        .map(|i| ("error", i))
        .chain(result.warnings.iter().map(|i| ("warning", i)));
    for (level, issue) in issues {
        let _ = writeln!(
            out,
            "  {level:<7} {:<26} {:<28} {}",
            issue.code.as_str(),
            issue.field,
            issue.message
        );
    }
    out
}

fn shape_name(shape: ValueShape) -> &'static str {
    match shape {
        ValueShape::None => "none",
        ValueShape::Scalar => "scalar",
        ValueShape::Pair => "pair",
        ValueShape::List => "list",
    }
}

/// Operator table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorRow {
    /// Wire key
    pub operator: String,
    /// Menu label
    pub label: String,
    /// Operand shape
    pub shape: &'static str,
    /// Supported field types
    pub types: Vec<String>,
}

impl From<&OperatorSpec> for OperatorRow {
    fn from(spec: &OperatorSpec) -> Self {
        Self {
            operator: spec.operator.to_string(),
            label: spec.label.to_string(),
            shape: shape_name(spec.shape),
            types: spec.supported_types.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Built-in operators, optionally narrowed to one field type
#[must_use]
pub fn operator_rows(field_type: Option<FieldType>) -> Vec<OperatorRow> {
    let registry = OperatorRegistry::standard();
    match field_type {
        Some(t) => registry.operators_for(t).map(OperatorRow::from).collect(),
        None => registry.iter().map(OperatorRow::from).collect(),
    }
}

/// Plain-text operator table
#[must_use]
pub fn render_operators(rows: &[OperatorRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:<26} {:<7} TYPES", "OPERATOR", "LABEL", "SHAPE");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:<26} {:<7} {}",
            row.operator,
            row.label,
            row.shape,
            row.types.join(", ")
        );
    }
    out
}

/// Prebuilt template summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrebuiltRow {
    /// Lookup key
    pub key: &'static str,
    /// Template name
    pub name: String,
    /// Visualization type
    pub visualization: String,
    /// Number of fields
    pub fields: usize,
    /// Number of filters
    pub filters: usize,
}

/// One row per prebuilt template
#[must_use]
pub fn prebuilt_rows() -> Vec<PrebuiltRow> {
    prebuilt_templates()
        .into_iter()
        .map(|p| PrebuiltRow {
            key: p.key,
            name: p.template.name.clone(),
            visualization: p.template.visualization.kind().to_string(),
            fields: p.template.fields.len(),
            filters: p.template.filters.len(),
        })
        .collect()
}

/// Plain-text prebuilt listing
#[must_use]
pub fn render_prebuilt(rows: &[PrebuiltRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:<7} {:>2} fields {:>2} filters  {}",
            row.key, row.visualization, row.fields, row.filters, row.name
        );
    }
    out
}
