//! Partial updates for template parts
//!
//! `None` means "leave unchanged". Identity attributes (`id`, catalog
//! `name`) have no patch slot.

use rtb_model::{
    Aggregation, FieldFormat, FieldId, FieldType, FieldWidth, FilterValue, Operator,
    TemplateCategory,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Partial update of a template field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPatch {
    /// Label override
    pub display_name: Option<String>,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    /// Aggregation
    pub aggregation: Option<Aggregation>,
    /// Display format
    pub format: Option<FieldFormat>,
    /// Visibility
    pub visible: Option<bool>,
    /// Sortable
    pub sortable: Option<bool>,
    /// Filterable
    pub filterable: Option<bool>,
    /// Width class
    pub width: Option<FieldWidth>,
}

impl FieldPatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With field type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// With aggregation
    #[inline]
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// With format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// With visibility
    #[inline]
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// With width
    #[inline]
    #[must_use]
    pub fn with_width(mut self, width: FieldWidth) -> Self {
        self.width = Some(width);
        self
    }
}

/// Partial update of a template filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterPatch {
    /// Re-target to another template field
    pub field_id: Option<FieldId>,
    /// Operator
    pub operator: Option<Operator>,
    /// Operand
    pub value: Option<FilterValue>,
    /// Label
    pub label: Option<String>,
    /// Required at run time
    pub required: Option<bool>,
    /// Shown to consumers
    pub visible: Option<bool>,
}

impl FilterPatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With target field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field_id: FieldId) -> Self {
        self.field_id = Some(field_id);
        self
    }

    /// With operator
    #[inline]
    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// With value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<FilterValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// With required flag
    #[inline]
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

/// Shallow merge into the visualization config
///
/// Type-specific keys that do not apply to the current visualization type
/// are ignored. `Some(None)` clears an optional attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::option_option)]
pub struct VisualizationPatch {
    /// Title
    pub title: Option<String>,
    /// Subtitle
    pub subtitle: Option<Option<String>>,
    /// Legend
    pub show_legend: Option<bool>,
    /// Grid
    pub show_grid: Option<bool>,
    /// Palette
    pub colors: Option<Vec<String>>,
    /// Responsive sizing
    pub responsive: Option<bool>,
    /// Bar/line X axis
    pub x_axis: Option<Option<String>>,
    /// Bar/line Y axis
    pub y_axis: Option<Option<String>>,
    /// Bar stacking
    pub stacked: Option<bool>,
    /// Horizontal bars
    pub horizontal: Option<bool>,
    /// Smooth lines
    pub smooth: Option<bool>,
    /// Line point markers
    pub show_points: Option<bool>,
    /// Pie grouping field
    #[serde(alias = "groupBy")]
    pub category_field: Option<Option<String>>,
    /// Pie value field
    pub value_field: Option<Option<String>>,
    /// Donut pie
    pub donut: Option<bool>,
    /// Metric field
    pub metric_field: Option<Option<String>>,
    /// Metric comparison field
    pub comparison_field: Option<Option<String>>,
    /// Metric prefix
    pub prefix: Option<Option<String>>,
    /// Metric suffix
    pub suffix: Option<Option<String>>,
    /// Table pagination
    pub pagination: Option<bool>,
    /// Table page size
    pub page_size: Option<u32>,
    /// Table striping
    pub striped: Option<bool>,
    /// Table borders
    pub bordered: Option<bool>,
}

impl VisualizationPatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With both chart axes
    #[inline]
    #[must_use]
    pub fn with_axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_axis = Some(Some(x.into()));
        self.y_axis = Some(Some(y.into()));
        self
    }

    /// With pie grouping field
    #[inline]
    #[must_use]
    pub fn with_category_field(mut self, name: impl Into<String>) -> Self {
        self.category_field = Some(Some(name.into()));
        self
    }

    /// With pie value field
    #[inline]
    #[must_use]
    pub fn with_value_field(mut self, name: impl Into<String>) -> Self {
        self.value_field = Some(Some(name.into()));
        self
    }

    /// With metric field
    #[inline]
    #[must_use]
    pub fn with_metric_field(mut self, name: impl Into<String>) -> Self {
        self.metric_field = Some(Some(name.into()));
        self
    }

    /// With palette
    #[inline]
    #[must_use]
    pub fn with_colors(mut self, colors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }
}

/// Partial update of template metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Category
    pub category: Option<TemplateCategory>,
    /// Replace tag set
    pub tags: Option<BTreeSet<String>>,
    /// Public flag
    pub is_public: Option<bool>,
}

impl MetadataPatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: TemplateCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// With tags
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// With public flag
    #[inline]
    #[must_use]
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }
}
