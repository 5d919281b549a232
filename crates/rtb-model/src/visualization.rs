//! Visualization configuration
//!
//! One config per template. The common attributes live on
//! [`VisualizationConfig`]; everything that only makes sense for one chart
//! type lives in the matching [`VisualizationOptions`] variant, flattened onto
//! the same JSON object under `"type"`.

use serde::{Deserialize, Serialize};

/// Default series palette
pub const DEFAULT_COLORS: [&str; 5] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6"];

/// Visualization type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    /// Tabular rows
    Table,
    /// Bar chart
    Bar,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
    /// Single KPI
    Metric,
}

impl VisualizationKind {
    /// All kinds
    pub const ALL: [VisualizationKind; 5] = [
        VisualizationKind::Table,
        VisualizationKind::Bar,
        VisualizationKind::Line,
        VisualizationKind::Pie,
        VisualizationKind::Metric,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Metric => "metric",
        }
    }
}

impl std::fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table-only options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    /// Paginate rows
    pub pagination: bool,
    /// Rows per page
    pub page_size: u32,
    /// Zebra striping
    pub striped: bool,
    /// Cell borders
    pub bordered: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            pagination: true,
            page_size: 25,
            striped: true,
            bordered: false,
        }
    }
}

/// Bar chart options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarOptions {
    /// Category axis field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    /// Value axis field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    /// Stack series
    pub stacked: bool,
    /// Horizontal bars
    pub horizontal: bool,
}

/// Line chart options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineOptions {
    /// Category axis field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    /// Value axis field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    /// Curved lines
    pub smooth: bool,
    /// Point markers
    pub show_points: bool,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            x_axis: None,
            y_axis: None,
            smooth: false,
            show_points: true,
        }
    }
}

/// Pie chart options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PieOptions {
    /// Slice grouping field name
    #[serde(alias = "groupBy", skip_serializing_if = "Option::is_none")]
    pub category_field: Option<String>,
    /// Slice size field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    /// Render as donut
    pub donut: bool,
}

/// Single-metric options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricOptions {
    /// Field shown as the KPI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_field: Option<String>,
    /// Field used for period-over-period delta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_field: Option<String>,
    /// Text before the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Text after the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Type-specific options, tagged by `"type"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualizationOptions {
    /// Table
    Table(TableOptions),
    /// Bar chart
    Bar(BarOptions),
    /// Line chart
    Line(LineOptions),
    /// Pie chart
    Pie(PieOptions),
    /// Metric
    Metric(MetricOptions),
}

impl VisualizationOptions {
    /// Fresh options for a kind
    #[must_use]
    pub fn defaults_for(kind: VisualizationKind) -> Self {
        match kind {
            VisualizationKind::Table => Self::Table(TableOptions::default()),
            VisualizationKind::Bar => Self::Bar(BarOptions::default()),
            VisualizationKind::Line => Self::Line(LineOptions::default()),
            VisualizationKind::Pie => Self::Pie(PieOptions::default()),
            VisualizationKind::Metric => Self::Metric(MetricOptions::default()),
        }
    }

    /// Tag of this variant
    #[must_use]
    pub fn kind(&self) -> VisualizationKind {
        match self {
            Self::Table(_) => VisualizationKind::Table,
            Self::Bar(_) => VisualizationKind::Bar,
            Self::Line(_) => VisualizationKind::Line,
            Self::Pie(_) => VisualizationKind::Pie,
            Self::Metric(_) => VisualizationKind::Metric,
        }
    }
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self::Table(TableOptions::default())
    }
}

/// How report rows are rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    /// Type-specific options (carries the `type` tag)
    #[serde(flatten)]
    pub options: VisualizationOptions,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Subtitle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Show legend
    #[serde(default = "default_true")]
    pub show_legend: bool,
    /// Show grid lines
    #[serde(default = "default_true")]
    pub show_grid: bool,
    /// Series colors
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
    /// Resize with container
    #[serde(default = "default_true")]
    pub responsive: bool,
}

fn default_true() -> bool {
    true
}

fn default_colors() -> Vec<String> {
    DEFAULT_COLORS.iter().map(|c| (*c).to_string()).collect()
}

impl VisualizationConfig {
    /// Config of a given kind with default common attributes
    #[must_use]
    pub fn new(kind: VisualizationKind) -> Self {
        Self {
            options: VisualizationOptions::defaults_for(kind),
            title: String::new(),
            subtitle: None,
            show_legend: true,
            show_grid: true,
            colors: default_colors(),
            responsive: true,
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Current kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> VisualizationKind {
        self.options.kind()
    }

    /// Switch kind, keeping common attributes and resetting all
    /// type-specific ones to the new kind's defaults
    ///
    /// Returns `false` (and changes nothing) when the kind is unchanged.
    pub fn switch_kind(&mut self, kind: VisualizationKind) -> bool {
        if self.kind() == kind {
            return false;
        }
        self.options = VisualizationOptions::defaults_for(kind);
        true
    }

    /// X axis for bar/line
    #[must_use]
    pub fn x_axis(&self) -> Option<&str> {
        match &self.options {
            VisualizationOptions::Bar(o) => o.x_axis.as_deref(),
            VisualizationOptions::Line(o) => o.x_axis.as_deref(),
            _ => None,
        }
    }

    /// Y axis for bar/line
    #[must_use]
    pub fn y_axis(&self) -> Option<&str> {
        match &self.options {
            VisualizationOptions::Bar(o) => o.y_axis.as_deref(),
            VisualizationOptions::Line(o) => o.y_axis.as_deref(),
            _ => None,
        }
    }

    /// Field names this visualization points at, with the attribute name
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<(&'static str, &str)> {
        let pairs: Vec<(&'static str, Option<&str>)> = match &self.options {
            VisualizationOptions::Table(_) => Vec::new(),
            VisualizationOptions::Bar(o) => {
                vec![("xAxis", o.x_axis.as_deref()), ("yAxis", o.y_axis.as_deref())]
            }
            VisualizationOptions::Line(o) => {
                vec![("xAxis", o.x_axis.as_deref()), ("yAxis", o.y_axis.as_deref())]
            }
            VisualizationOptions::Pie(o) => vec![
                ("categoryField", o.category_field.as_deref()),
                ("valueField", o.value_field.as_deref()),
            ],
            VisualizationOptions::Metric(o) => vec![
                ("metricField", o.metric_field.as_deref()),
                ("comparisonField", o.comparison_field.as_deref()),
            ],
        };
        pairs
            .into_iter()
            .filter_map(|(attr, name)| name.map(|n| (attr, n)))
            .collect()
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self::new(VisualizationKind::Table)
    }
}
