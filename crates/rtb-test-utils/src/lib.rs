//! Testing utilities for the report template builder workspace
//!
//! Shared fixtures and a harness wiring an [`EditorSession`] to the
//! in-memory collaborators.

#![allow(missing_docs)]

use rtb_model::{
    BuilderField, FieldType, ReportTemplate, TemplateField, TemplateId, VisualizationConfig,
    VisualizationKind,
};
use rtb_session::adapters::{MemoryTemplateRepository, StaticFieldCatalog, SyntheticQueryExecutor};
use rtb_session::{Collaborators, EditorSession, SessionConfig};
use rtb_template::sample_catalog;
use std::sync::Arc;
use std::time::Duration;

pub fn field(name: &str, field_type: FieldType) -> BuilderField {
    BuilderField::new(name, field_type, "test", name)
}

/// Valid table template over the given fields
pub fn table_template(name: &str, fields: &[(&str, FieldType)]) -> ReportTemplate {
    let mut template = ReportTemplate::new(name);
    template.visualization = VisualizationConfig::new(VisualizationKind::Table);
    template.fields = fields
        .iter()
        .map(|(n, t)| TemplateField::from_builder(&field(n, *t)))
        .collect();
    template
}

/// Valid template with a region and a revenue field
pub fn sales_template() -> ReportTemplate {
    table_template(
        "Sales",
        &[("region", FieldType::String), ("revenue", FieldType::Currency)],
    )
}

/// In-memory collaborators shared between a test and its session
#[derive(Debug, Clone)]
pub struct Harness {
    pub repository: Arc<MemoryTemplateRepository>,
    pub catalog: Arc<StaticFieldCatalog>,
    pub executor: Arc<SyntheticQueryExecutor>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MemoryTemplateRepository::new()),
            catalog: Arc::new(StaticFieldCatalog::new(sample_catalog())),
            executor: Arc::new(SyntheticQueryExecutor::default()),
        }
    }

    pub fn with_save_latency(self, latency: Duration) -> Self {
        self.repository.set_latency(latency);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.catalog.clone(),
            self.repository.clone(),
            self.executor.clone(),
        )
    }

    /// Session in create mode with the catalog loaded
    pub async fn create_session(&self, config: SessionConfig) -> EditorSession {
        let session = EditorSession::create(self.collaborators(), config).unwrap();
        session.refresh_catalog().await.unwrap();
        session
    }

    /// Session in edit mode on a freshly stored copy of `template`
    pub async fn edit_session(
        &self,
        template: ReportTemplate,
        config: SessionConfig,
    ) -> (EditorSession, TemplateId) {
        let id = self.repository.insert(template);
        let session = EditorSession::open(self.collaborators(), config, &id)
            .await
            .unwrap();
        session.refresh_catalog().await.unwrap();
        (session, id)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
