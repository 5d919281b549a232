//! Catalog fields and template fields
//!
//! A [`BuilderField`] is what a data source offers; a [`TemplateField`] is the
//! frozen copy placed into a template. Copying (rather than referencing) means
//! catalog schema changes never reach fields that were already added.

use crate::ids::FieldId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared type of a data attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    String,
    /// Plain number
    Number,
    /// Calendar date
    Date,
    /// True/false
    Boolean,
    /// Monetary amount
    Currency,
    /// Ratio rendered as percent
    Percentage,
}

impl FieldType {
    /// All field types, in declaration order
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Date,
        FieldType::Boolean,
        FieldType::Currency,
        FieldType::Percentage,
    ];

    /// Whether values of this type are numeric
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Currency | Self::Percentage)
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type: {s}"))
    }
}

/// Aggregation applied to a field in the report
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Raw values
    #[default]
    None,
    /// Sum
    Sum,
    /// Average
    Avg,
    /// Row count
    Count,
    /// Minimum
    Min,
    /// Maximum
    Max,
    /// Distinct count
    Distinct,
}

/// Display format of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    /// Plain text
    Text,
    /// Number with grouping
    Number,
    /// Currency symbol and two decimals
    Currency,
    /// Percent
    Percentage,
    /// Date only
    Date,
    /// Date and time
    Datetime,
    /// Yes/No
    Boolean,
}

impl FieldFormat {
    /// Natural format for a field type
    #[must_use]
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => Self::Text,
            FieldType::Number => Self::Number,
            FieldType::Date => Self::Date,
            FieldType::Boolean => Self::Boolean,
            FieldType::Currency => Self::Currency,
            FieldType::Percentage => Self::Percentage,
        }
    }
}

/// Column width class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    /// Sized to content
    #[default]
    Auto,
    /// Narrow
    Small,
    /// Medium
    Medium,
    /// Wide
    Large,
}

/// Catalog entry describing a selectable data attribute
///
/// Owned by the external data source and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderField {
    /// Catalog id
    pub id: String,
    /// Column name; unique within a template
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Table or view the column comes from
    pub source: String,
    /// Human label
    pub label: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Aggregations the source supports for this column
    #[serde(default)]
    pub aggregations: BTreeSet<Aggregation>,
    /// Formats the source supports for this column
    #[serde(default)]
    pub formats: BTreeSet<FieldFormat>,
}

impl BuilderField {
    /// Create a catalog field with no aggregations or formats declared
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        source: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            field_type,
            source: source.into(),
            label: label.into(),
            description: None,
            aggregations: BTreeSet::new(),
            formats: BTreeSet::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With allowed aggregations
    #[inline]
    #[must_use]
    pub fn with_aggregations(
        mut self,
        aggregations: impl IntoIterator<Item = Aggregation>,
    ) -> Self {
        self.aggregations = aggregations.into_iter().collect();
        self
    }

    /// With allowed formats
    #[inline]
    #[must_use]
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = FieldFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }
}

/// External data source and the fields it exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Source id
    pub id: String,
    /// Display name
    pub name: String,
    /// Backend kind (e.g. `postgres`, `graphql`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordered fields
    #[serde(default)]
    pub fields: Vec<BuilderField>,
}

impl DataSource {
    /// Look up a field by column name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&BuilderField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Case-insensitive search over name, label and description
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a BuilderField> + 'a {
        let needle = query.trim().to_lowercase();
        self.fields.iter().filter(move |f| {
            needle.is_empty()
                || f.name.to_lowercase().contains(&needle)
                || f.label.to_lowercase().contains(&needle)
                || f
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
    }
}

/// Field instance inside a report template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    /// Engine-generated id
    pub id: FieldId,
    /// Catalog column name
    pub name: String,
    /// Label override
    pub display_name: String,
    /// Type copied from the catalog
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Applied aggregation
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Display format
    pub format: FieldFormat,
    /// Shown in the report
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Sorting enabled
    #[serde(default = "default_true")]
    pub sortable: bool,
    /// Filtering enabled
    #[serde(default = "default_true")]
    pub filterable: bool,
    /// Width class
    #[serde(default)]
    pub width: FieldWidth,
    /// Aggregations allowed when the field was added
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_aggregations: BTreeSet<Aggregation>,
    /// Formats allowed when the field was added
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_formats: BTreeSet<FieldFormat>,
}

fn default_true() -> bool {
    true
}

impl TemplateField {
    /// Copy a catalog field into a new template field with a fresh id
    #[must_use]
    pub fn from_builder(field: &BuilderField) -> Self {
        let natural = FieldFormat::default_for(field.field_type);
        let format = if field.formats.is_empty() || field.formats.contains(&natural) {
            natural
        } else {
            // non-empty, so first() is Some
            field.formats.iter().next().copied().unwrap_or(natural)
        };

        Self {
            id: FieldId::generate(),
            name: field.name.clone(),
            display_name: field.label.clone(),
            field_type: field.field_type,
            aggregation: Aggregation::None,
            format,
            visible: true,
            sortable: true,
            filterable: true,
            width: FieldWidth::Auto,
            allowed_aggregations: field.aggregations.clone(),
            allowed_formats: field.formats.clone(),
        }
    }

    /// Whether `aggregation` may be applied
    ///
    /// `none` is always allowed; an empty allowed set (older payloads) allows
    /// everything.
    #[must_use]
    pub fn allows_aggregation(&self, aggregation: Aggregation) -> bool {
        aggregation == Aggregation::None
            || self.allowed_aggregations.is_empty()
            || self.allowed_aggregations.contains(&aggregation)
    }

    /// Whether `format` may be applied
    #[must_use]
    pub fn allows_format(&self, format: FieldFormat) -> bool {
        self.allowed_formats.is_empty() || self.allowed_formats.contains(&format)
    }
}
