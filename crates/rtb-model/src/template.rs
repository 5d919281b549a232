//! Report template aggregate and persistence receipt

use crate::field::TemplateField;
use crate::filter::TemplateFilter;
use crate::ids::{FieldId, TemplateId};
use crate::visualization::VisualizationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Template category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    /// Sales
    Sales,
    /// Finance
    Financial,
    /// Operations (projects, tasks, workload)
    Operational,
    /// Analytics
    Analytics,
    /// User-defined
    #[default]
    Custom,
}

/// Reusable report definition
///
/// `fields` and `filters` are ordered; their order is the display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    /// Absent until first persisted
    #[serde(default)]
    pub id: Option<TemplateId>,
    /// Template name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category
    #[serde(default)]
    pub category: TemplateCategory,
    /// Selected fields, in display order
    #[serde(default)]
    pub fields: Vec<TemplateField>,
    /// Filters, in display order
    #[serde(default)]
    pub filters: Vec<TemplateFilter>,
    /// The single visualization
    #[serde(default)]
    pub visualization: VisualizationConfig,
    /// Visible to the whole workspace
    #[serde(default)]
    pub is_public: bool,
    /// Tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last persisted time; doubles as the optimistic-concurrency version
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Author
    #[serde(default)]
    pub created_by: Option<String>,
}

impl ReportTemplate {
    /// Empty, unsaved template
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            category: TemplateCategory::Custom,
            fields: Vec::new(),
            filters: Vec::new(),
            visualization: VisualizationConfig::default(),
            is_public: false,
            tags: BTreeSet::new(),
            created_at: None,
            updated_at: None,
            created_by: None,
        }
    }

    /// Whether the template has been persisted at least once
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Look up a field by id
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&TemplateField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// Look up a field by catalog name
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Stamp the repository's answer onto the template
    pub fn apply_receipt(&mut self, receipt: &SaveReceipt) {
        self.id = Some(receipt.id.clone());
        self.updated_at = Some(receipt.updated_at);
    }

    /// Serialize to the persisted wire shape
    ///
    /// # Errors
    /// Propagates `serde_json` failures (not expected for this type).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the persisted wire shape
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self::new("")
    }
}

/// Repository answer to a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// Assigned (or existing) id
    pub id: TemplateId,
    /// Server timestamp of the save
    pub updated_at: DateTime<Utc>,
}
