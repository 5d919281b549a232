//! Read-only helpers over a field catalog

use rtb_model::{BuilderField, DataSource, ReportTemplate};

/// Find a data source by id
#[must_use]
pub fn find_source<'a>(sources: &'a [DataSource], id: &str) -> Option<&'a DataSource> {
    sources.iter().find(|s| s.id == id)
}

/// Catalog fields of `source` not yet placed in `template`, in catalog order
#[must_use]
pub fn available_fields<'a>(
    source: &'a DataSource,
    template: &ReportTemplate,
) -> Vec<&'a BuilderField> {
    source
        .fields
        .iter()
        .filter(|f| template.field_by_name(&f.name).is_none())
        .collect()
}

/// [`available_fields`] narrowed by a case-insensitive search
#[must_use]
pub fn search_available<'a>(
    source: &'a DataSource,
    template: &ReportTemplate,
    query: &str,
) -> Vec<&'a BuilderField> {
    source
        .search(query)
        .filter(|f| template.field_by_name(&f.name).is_none())
        .collect()
}
