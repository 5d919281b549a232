//! Mutable template aggregate
//!
//! [`TemplateModel`] owns one [`ReportTemplate`] and is the only place it is
//! mutated. Every successful mutation bumps [`TemplateModel::revision`] and
//! re-runs validation; a rejected mutation changes nothing.
//!
//! The model also keeps a `document` epoch that changes whenever the whole
//! template is replaced, so asynchronous work started against the previous
//! document can recognize that it is stale.

use crate::error::{ModelError, ModelResult};
use crate::patch::{FieldPatch, FilterPatch, MetadataPatch, VisualizationPatch};
use crate::reorder::reorder_in_place;
use crate::validation::{validate, ValidationResult};
use rtb_model::{
    BuilderField, FieldId, FieldType, FilterId, Operator, ReportTemplate, SaveReceipt,
    TemplateField, TemplateFilter, VisualizationKind, VisualizationOptions,
};
use rtb_operators::OperatorRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suffix appended to the name of a duplicated template
pub const COPY_SUFFIX: &str = " (Copy)";

/// Mutable report template with revision tracking and cached validation
#[derive(Debug, Clone)]
pub struct TemplateModel {
    template: ReportTemplate,
    registry: Arc<OperatorRegistry>,
    revision: u64,
    document: u64,
    validation: ValidationResult,
}

impl TemplateModel {
    /// Create new empty model (create mode) with the built-in operators
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(OperatorRegistry::standard().clone()))
    }

    /// Create new empty model with a custom operator registry
    #[must_use]
    pub fn with_registry(registry: Arc<OperatorRegistry>) -> Self {
        let template = ReportTemplate::default();
        let validation = validate(&template, &registry);
        Self {
            template,
            registry,
            revision: 0,
            document: 0,
            validation,
        }
    }

    /// Hydrate a model from a stored template
    ///
    /// # Errors
    /// [`ModelError::CorruptTemplate`] when field ids are not unique.
    /// Filters pointing at missing fields are dropped, not rejected.
    pub fn from_template(template: ReportTemplate) -> ModelResult<Self> {
        let mut model = Self::new();
        model.replace(template)?;
        Ok(model)
    }

    /// Current template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &ReportTemplate {
        &self.template
    }

    /// Owned copy of the current template
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ReportTemplate {
        self.template.clone()
    }

    /// Mutation counter; bumps on every successful mutation
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Document epoch; bumps when the template is replaced wholesale
    #[inline]
    #[must_use]
    pub fn document(&self) -> u64 {
        self.document
    }

    /// Validation of the current template
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Whether the current template has no validation errors
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    /// Operator registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Add a catalog field as a frozen copy
    ///
    /// # Errors
    /// [`ModelError::DuplicateField`] when a field with the same name exists.
    pub fn add_field(&mut self, field: &BuilderField) -> ModelResult<FieldId> {
        if self.template.field_by_name(&field.name).is_some() {
            return Err(ModelError::DuplicateField {
                name: field.name.clone(),
            });
        }

        let added = TemplateField::from_builder(field);
        let id = added.id.clone();
        debug!(field = %field.name, id = %id, "field added");
        self.template.fields.push(added);
        self.touch();
        Ok(id)
    }

    /// Remove a field and every filter referencing it
    ///
    /// Returns the ids of the cascade-removed filters.
    ///
    /// # Errors
    /// [`ModelError::FieldNotFound`] for an unknown id.
    pub fn remove_field(&mut self, id: &FieldId) -> ModelResult<Vec<FilterId>> {
        let index = self.field_index(id)?;
        let removed = self.template.fields.remove(index);

        let mut dropped = Vec::new();
        self.template.filters.retain(|filter| {
            if filter.field_id == removed.id {
                dropped.push(filter.id.clone());
                false
            } else {
                true
            }
        });

        debug!(field = %removed.name, cascaded = dropped.len(), "field removed");
        self.touch();
        Ok(dropped)
    }

    /// Merge a partial update into a field
    ///
    /// Changing the type resets dependent filters whose operator the new
    /// type does not support. Returns the ids of the reset filters.
    ///
    /// # Errors
    /// [`ModelError::FieldNotFound`], [`ModelError::AggregationNotAllowed`]
    /// or [`ModelError::FormatNotAllowed`].
    pub fn update_field(&mut self, id: &FieldId, patch: FieldPatch) -> ModelResult<Vec<FilterId>> {
        let index = self.field_index(id)?;
        let mut field = self.template.fields[index].clone();

        if let Some(aggregation) = patch.aggregation {
            if !field.allows_aggregation(aggregation) {
                return Err(ModelError::AggregationNotAllowed {
                    field: field.name,
                    aggregation,
                });
            }
            field.aggregation = aggregation;
        }
        if let Some(format) = patch.format {
            if !field.allows_format(format) {
                return Err(ModelError::FormatNotAllowed {
                    field: field.name,
                    format,
                });
            }
            field.format = format;
        }
        if let Some(display_name) = patch.display_name {
            field.display_name = display_name;
        }
        if let Some(visible) = patch.visible {
            field.visible = visible;
        }
        if let Some(sortable) = patch.sortable {
            field.sortable = sortable;
        }
        if let Some(filterable) = patch.filterable {
            field.filterable = filterable;
        }
        if let Some(width) = patch.width {
            field.width = width;
        }

        let mut reset = Vec::new();
        if let Some(field_type) = patch.field_type.filter(|t| *t != field.field_type) {
            field.field_type = field_type;
            let fallback = self.fallback_operator(field_type);
            for filter in self
                .template
                .filters
                .iter_mut()
                .filter(|f| f.field_id == field.id)
            {
                if !self.registry.supports(filter.operator, field_type) {
                    filter.operator = fallback;
                    filter.value = self.registry.empty_value(fallback);
                    reset.push(filter.id.clone());
                }
            }
            debug!(field = %field.name, %field_type, reset = reset.len(), "field type changed");
        }

        self.template.fields[index] = field;
        self.touch();
        Ok(reset)
    }

    /// Move a field; out-of-range indices are ignored
    ///
    /// Returns `true` when the order changed.
    pub fn reorder_fields(&mut self, from: usize, to: usize) -> bool {
        let moved = reorder_in_place(&mut self.template.fields, from, to);
        if moved {
            self.touch();
        }
        moved
    }

    /// Move a filter; out-of-range indices are ignored
    ///
    /// Returns `true` when the order changed.
    pub fn reorder_filters(&mut self, from: usize, to: usize) -> bool {
        let moved = reorder_in_place(&mut self.template.filters, from, to);
        if moved {
            self.touch();
        }
        moved
    }

    /// Add a filter on a template field with the type's default operator
    ///
    /// # Errors
    /// [`ModelError::FieldNotFound`] for an unknown field id.
    pub fn add_filter(&mut self, field_id: &FieldId) -> ModelResult<FilterId> {
        let field = self
            .template
            .field(field_id)
            .ok_or_else(|| ModelError::FieldNotFound(field_id.clone()))?;

        let operator = self.fallback_operator(field.field_type);
        let filter = TemplateFilter::new(
            field.id.clone(),
            operator,
            self.registry.empty_value(operator),
        )
        .with_label(field.display_name.clone());

        let id = filter.id.clone();
        debug!(field = %field.name, %operator, id = %id, "filter added");
        self.template.filters.push(filter);
        self.touch();
        Ok(id)
    }

    /// Remove a filter
    ///
    /// # Errors
    /// [`ModelError::FilterNotFound`] for an unknown id.
    pub fn remove_filter(&mut self, id: &FilterId) -> ModelResult<()> {
        let index = self.filter_index(id)?;
        self.template.filters.remove(index);
        debug!(id = %id, "filter removed");
        self.touch();
        Ok(())
    }

    /// Merge a partial update into a filter
    ///
    /// Re-targeting to a field of a different type resets operator and
    /// value. Changing to an operator of a different value shape resets the
    /// value unless the patch also carries one.
    ///
    /// # Errors
    /// [`ModelError::FilterNotFound`], or [`ModelError::FieldNotFound`] when
    /// re-targeting to an unknown field.
    pub fn update_filter(&mut self, id: &FilterId, patch: FilterPatch) -> ModelResult<()> {
        let index = self.filter_index(id)?;
        let mut filter = self.template.filters[index].clone();

        if let Some(field_id) = patch.field_id.filter(|f| *f != filter.field_id) {
            let target = self
                .template
                .field(&field_id)
                .ok_or_else(|| ModelError::FieldNotFound(field_id.clone()))?;
            let previous = self.template.field(&filter.field_id).map(|f| f.field_type);
            if previous != Some(target.field_type) {
                filter.operator = self.fallback_operator(target.field_type);
                filter.value = self.registry.empty_value(filter.operator);
            }
            filter.field_id = field_id;
        }

        if let Some(operator) = patch.operator.filter(|op| *op != filter.operator) {
            let old_shape = self.registry.get(filter.operator).map(|s| s.shape);
            let new_shape = self.registry.get(operator).map(|s| s.shape);
            filter.operator = operator;
            if old_shape != new_shape && patch.value.is_none() {
                filter.value = self.registry.empty_value(operator);
            }
        }

        if let Some(value) = patch.value {
            filter.value = value;
        }
        if let Some(label) = patch.label {
            filter.label = label;
        }
        if let Some(required) = patch.required {
            filter.required = required;
        }
        if let Some(visible) = patch.visible {
            filter.visible = visible;
        }

        self.template.filters[index] = filter;
        self.touch();
        Ok(())
    }

    /// Switch the visualization type
    ///
    /// Common attributes survive; type-specific ones reset to the new type's
    /// defaults. Returns `false` when the type was already `kind`.
    pub fn set_visualization(&mut self, kind: VisualizationKind) -> bool {
        let changed = self.template.visualization.switch_kind(kind);
        if changed {
            debug!(%kind, "visualization type changed");
            self.touch();
        }
        changed
    }

    /// Shallow-merge a visualization patch
    ///
    /// Keys that do not apply to the current type are ignored.
    pub fn update_visualization(&mut self, patch: VisualizationPatch) {
        let viz = &mut self.template.visualization;
        if let Some(title) = patch.title {
            viz.title = title;
        }
        if let Some(subtitle) = patch.subtitle {
            viz.subtitle = subtitle;
        }
        if let Some(show_legend) = patch.show_legend {
            viz.show_legend = show_legend;
        }
        if let Some(show_grid) = patch.show_grid {
            viz.show_grid = show_grid;
        }
        if let Some(colors) = patch.colors {
            viz.colors = colors;
        }
        if let Some(responsive) = patch.responsive {
            viz.responsive = responsive;
        }

        match &mut viz.options {
            VisualizationOptions::Table(o) => {
                set(&mut o.pagination, patch.pagination);
                set(&mut o.page_size, patch.page_size);
                set(&mut o.striped, patch.striped);
                set(&mut o.bordered, patch.bordered);
            }
            VisualizationOptions::Bar(o) => {
                set(&mut o.x_axis, patch.x_axis);
                set(&mut o.y_axis, patch.y_axis);
                set(&mut o.stacked, patch.stacked);
                set(&mut o.horizontal, patch.horizontal);
            }
            VisualizationOptions::Line(o) => {
                set(&mut o.x_axis, patch.x_axis);
                set(&mut o.y_axis, patch.y_axis);
                set(&mut o.smooth, patch.smooth);
                set(&mut o.show_points, patch.show_points);
            }
            VisualizationOptions::Pie(o) => {
                set(&mut o.category_field, patch.category_field);
                set(&mut o.value_field, patch.value_field);
                set(&mut o.donut, patch.donut);
            }
            VisualizationOptions::Metric(o) => {
                set(&mut o.metric_field, patch.metric_field);
                set(&mut o.comparison_field, patch.comparison_field);
                set(&mut o.prefix, patch.prefix);
                set(&mut o.suffix, patch.suffix);
            }
        }

        self.touch();
    }

    /// Merge a metadata patch (name, description, category, tags, public)
    pub fn update_metadata(&mut self, patch: MetadataPatch) {
        let template = &mut self.template;
        set(&mut template.name, patch.name);
        set(&mut template.description, patch.description);
        set(&mut template.category, patch.category);
        set(&mut template.tags, patch.tags);
        set(&mut template.is_public, patch.is_public);
        self.touch();
    }

    /// Replace the whole template (loading a saved or prebuilt template)
    ///
    /// Bumps the document epoch.
    ///
    /// # Errors
    /// [`ModelError::CorruptTemplate`] when field ids are not unique; the
    /// current template is kept in that case.
    pub fn replace(&mut self, template: ReportTemplate) -> ModelResult<()> {
        self.load(Hydrated::new(template)?);
        Ok(())
    }

    /// Install an already checked template; bumps the document epoch
    pub fn load(&mut self, hydrated: Hydrated) {
        let Hydrated(template) = hydrated;
        info!(
            id = template.id.as_ref().map_or("<new>", |id| id.as_str()),
            fields = template.fields.len(),
            filters = template.filters.len(),
            "template loaded"
        );
        self.template = template;
        self.document += 1;
        self.touch();
    }

    /// Stamp a save receipt onto the template
    ///
    /// Not a user mutation: the revision is unchanged.
    pub fn apply_receipt(&mut self, receipt: &SaveReceipt) {
        self.template.apply_receipt(receipt);
    }

    /// Unsaved copy of the template with fresh field and filter ids
    #[must_use]
    pub fn duplicate(&self) -> ReportTemplate {
        let mut copy = self.template.clone();
        copy.id = None;
        copy.created_at = None;
        copy.updated_at = None;
        copy.name = format!("{}{COPY_SUFFIX}", copy.name);

        let mut remap = HashMap::new();
        for field in &mut copy.fields {
            let fresh = FieldId::generate();
            remap.insert(field.id.clone(), fresh.clone());
            field.id = fresh;
        }
        for filter in &mut copy.filters {
            filter.id = FilterId::generate();
            if let Some(fresh) = remap.get(&filter.field_id) {
                filter.field_id = fresh.clone();
            }
        }
        copy
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.validation = validate(&self.template, &self.registry);
    }

    fn fallback_operator(&self, field_type: FieldType) -> Operator {
        self.registry
            .default_operator(field_type)
            .unwrap_or(Operator::Equals)
    }

    fn field_index(&self, id: &FieldId) -> ModelResult<usize> {
        self.template
            .fields
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| ModelError::FieldNotFound(id.clone()))
    }

    fn filter_index(&self, id: &FilterId) -> ModelResult<usize> {
        self.template
            .filters
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| ModelError::FilterNotFound(id.clone()))
    }
}

impl Default for TemplateModel {
    fn default() -> Self {
        Self::new()
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Enforce structural invariants on an incoming template
/// Template that passed the hydration checks
///
/// Field ids are unique and every filter points at an existing field.
#[derive(Debug, Clone)]
pub struct Hydrated(ReportTemplate);

impl Hydrated {
    /// Check a template, dropping filters whose field is missing
    ///
    /// # Errors
    /// [`ModelError::CorruptTemplate`] when field ids are not unique.
    pub fn new(template: ReportTemplate) -> ModelResult<Self> {
        sanitize(template).map(Self)
    }

    /// Checked template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &ReportTemplate {
        &self.0
    }
}

fn sanitize(mut template: ReportTemplate) -> ModelResult<ReportTemplate> {
    let mut seen = HashSet::new();
    for field in &template.fields {
        if !seen.insert(&field.id) {
            return Err(ModelError::CorruptTemplate(format!(
                "duplicate field id {}",
                field.id
            )));
        }
    }

    let before = template.filters.len();
    let known: HashSet<FieldId> = seen.into_iter().cloned().collect();
    template.filters.retain(|filter| {
        let keep = known.contains(&filter.field_id);
        if !keep {
            warn!(
                filter = %filter.id,
                field = %filter.field_id,
                "dropping filter that references a missing field"
            );
        }
        keep
    });
    if template.filters.len() != before {
        debug!(dropped = before - template.filters.len(), "dangling filters removed");
    }

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationCode;
    use rtb_model::{Aggregation, FieldFormat, FilterValue, Scalar, TemplateId};

    fn region() -> BuilderField {
        BuilderField::new("region", FieldType::String, "orders", "Region")
    }

    fn revenue() -> BuilderField {
        BuilderField::new("revenue", FieldType::Currency, "orders", "Revenue")
            .with_aggregations([Aggregation::Sum, Aggregation::Avg])
            .with_formats([FieldFormat::Currency, FieldFormat::Number])
    }

    #[test]
    fn new_model_is_invalid_and_unrevised() {
        let model = TemplateModel::new();
        assert_eq!(model.revision(), 0);
        assert!(!model.is_valid());
        assert_eq!(model.validation().errors.len(), 2);
    }

    #[test]
    fn add_field_rejects_duplicates_without_side_effects() {
        let mut model = TemplateModel::new();
        model.add_field(&region()).unwrap();
        let revision = model.revision();

        let err = model.add_field(&region()).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_FIELD");
        assert_eq!(model.revision(), revision);
        assert_eq!(model.template().fields.len(), 1);
    }

    #[test]
    fn remove_field_cascades_filters() {
        let mut model = TemplateModel::new();
        let a = model.add_field(&region()).unwrap();
        let b = model.add_field(&revenue()).unwrap();
        let fa = model.add_filter(&a).unwrap();
        let fb = model.add_filter(&b).unwrap();

        let dropped = model.remove_field(&a).unwrap();
        assert_eq!(dropped, vec![fa]);
        let remaining: Vec<_> = model.template().filters.iter().map(|f| &f.id).collect();
        assert_eq!(remaining, vec![&fb]);
    }

    #[test]
    fn add_filter_uses_default_operator_and_empty_value() {
        let mut model = TemplateModel::new();
        let id = model.add_field(&revenue()).unwrap();
        let filter_id = model.add_filter(&id).unwrap();

        let filter = &model.template().filters[0];
        assert_eq!(filter.id, filter_id);
        assert_eq!(filter.operator, Operator::Equals);
        assert_eq!(filter.value, FilterValue::empty_scalar());
        assert_eq!(filter.label, "Revenue");
        assert!(model.validation().has_code(ValidationCode::ValueRequired));
    }

    #[test]
    fn add_filter_unknown_field() {
        let mut model = TemplateModel::new();
        let err = model.add_filter(&FieldId::new("fld_nope")).unwrap_err();
        assert_eq!(err.code(), "FIELD_NOT_FOUND");
        assert_eq!(model.revision(), 0);
    }

    #[test]
    fn update_field_checks_allowed_sets() {
        let mut model = TemplateModel::new();
        let id = model.add_field(&revenue()).unwrap();

        let err = model
            .update_field(&id, FieldPatch::new().with_aggregation(Aggregation::Distinct))
            .unwrap_err();
        assert_eq!(err.code(), "AGGREGATION_NOT_ALLOWED");

        let err = model
            .update_field(&id, FieldPatch::new().with_format(FieldFormat::Date))
            .unwrap_err();
        assert_eq!(err.code(), "FORMAT_NOT_ALLOWED");

        model
            .update_field(
                &id,
                FieldPatch::new()
                    .with_aggregation(Aggregation::Sum)
                    .with_display_name("Total"),
            )
            .unwrap();
        let field = &model.template().fields[0];
        assert_eq!(field.aggregation, Aggregation::Sum);
        assert_eq!(field.display_name, "Total");
        assert_eq!(field.name, "revenue");
    }

    #[test]
    fn type_change_resets_incompatible_filters() {
        let mut model = TemplateModel::new();
        let id = model.add_field(&region()).unwrap();
        let contains = model.add_filter(&id).unwrap();
        model
            .update_filter(
                &contains,
                FilterPatch::new()
                    .with_operator(Operator::Contains)
                    .with_value("north"),
            )
            .unwrap();
        let equals = model.add_filter(&id).unwrap();
        model
            .update_filter(&equals, FilterPatch::new().with_value("7"))
            .unwrap();

        let reset = model
            .update_field(&id, FieldPatch::new().with_type(FieldType::Number))
            .unwrap();
        assert_eq!(reset, vec![contains]);
        let filters = &model.template().filters;
        assert_eq!(filters[0].operator, Operator::Equals);
        assert_eq!(filters[0].value, FilterValue::empty_scalar());
        assert_eq!(filters[1].value, FilterValue::from("7"));
    }

    #[test]
    fn retarget_to_other_type_resets_operator() {
        let mut model = TemplateModel::new();
        let text = model.add_field(&region()).unwrap();
        let date = model
            .add_field(&BuilderField::new("created", FieldType::Date, "orders", "Created"))
            .unwrap();
        let filter = model.add_filter(&date).unwrap();
        model
            .update_filter(
                &filter,
                FilterPatch::new()
                    .with_operator(Operator::Between)
                    .with_value(FilterValue::range("2024-01-01", "2024-02-01")),
            )
            .unwrap();

        model
            .update_filter(&filter, FilterPatch::new().with_field(text.clone()))
            .unwrap();
        let updated = &model.template().filters[0];
        assert_eq!(updated.field_id, text);
        assert_eq!(updated.operator, Operator::Equals);
        assert_eq!(updated.value, FilterValue::empty_scalar());
    }

    #[test]
    fn operator_shape_change_resets_value() {
        let mut model = TemplateModel::new();
        let id = model.add_field(&revenue()).unwrap();
        let filter = model.add_filter(&id).unwrap();
        model
            .update_filter(&filter, FilterPatch::new().with_value(5.0))
            .unwrap();

        model
            .update_filter(&filter, FilterPatch::new().with_operator(Operator::GreaterThan))
            .unwrap();
        assert_eq!(model.template().filters[0].value, FilterValue::from(5.0));

        model
            .update_filter(&filter, FilterPatch::new().with_operator(Operator::In))
            .unwrap();
        assert_eq!(model.template().filters[0].value, FilterValue::empty_list());

        model
            .update_filter(
                &filter,
                FilterPatch::new()
                    .with_operator(Operator::Between)
                    .with_value(FilterValue::range(1.0, 9.0)),
            )
            .unwrap();
        assert_eq!(
            model.template().filters[0].value,
            FilterValue::List(vec![Scalar::Number(1.0), Scalar::Number(9.0)])
        );
    }

    #[test]
    fn reorder_out_of_range_does_not_bump_revision() {
        let mut model = TemplateModel::new();
        model.add_field(&region()).unwrap();
        model.add_field(&revenue()).unwrap();
        let revision = model.revision();

        assert!(!model.reorder_fields(0, 7));
        assert_eq!(model.revision(), revision);
        assert!(model.reorder_fields(1, 0));
        assert_eq!(model.template().fields[0].name, "revenue");
    }

    #[test]
    fn visualization_patch_ignores_foreign_keys() {
        let mut model = TemplateModel::new();
        model.set_visualization(VisualizationKind::Pie);
        model.update_visualization(
            VisualizationPatch::new()
                .with_axes("region", "revenue")
                .with_category_field("region")
                .with_title("Share"),
        );
        let viz = &model.template().visualization;
        assert_eq!(viz.title, "Share");
        assert_eq!(viz.x_axis(), None);
        assert_eq!(viz.referenced_fields(), vec![("categoryField", "region")]);
    }

    #[test]
    fn metadata_patch() {
        let mut model = TemplateModel::new();
        model.update_metadata(
            MetadataPatch::new()
                .with_name("Q1")
                .with_tags(["exec", "q1"])
                .with_public(true),
        );
        let template = model.template();
        assert_eq!(template.name, "Q1");
        assert!(template.is_public);
        assert_eq!(template.tags.len(), 2);
    }

    #[test]
    fn hydration_rejects_duplicate_ids_and_drops_dangling_filters() {
        let mut template = ReportTemplate::new("Loaded");
        let field = TemplateField::from_builder(&region());
        template.filters.push(TemplateFilter::new(
            FieldId::new("fld_missing"),
            Operator::Equals,
            FilterValue::from("x"),
        ));
        template.filters.push(TemplateFilter::new(
            field.id.clone(),
            Operator::Equals,
            FilterValue::from("north"),
        ));
        template.fields.push(field.clone());

        let model = TemplateModel::from_template(template.clone()).unwrap();
        assert_eq!(model.template().filters.len(), 1);
        assert_eq!(model.document(), 1);

        template.fields.push(field);
        let err = TemplateModel::from_template(template).unwrap_err();
        assert_eq!(err.code(), "CORRUPT_TEMPLATE");
    }

    #[test]
    fn checked_template_loads_as_new_document() {
        let mut template = ReportTemplate::new("Checked");
        template.fields.push(TemplateField::from_builder(&region()));
        template.filters.push(TemplateFilter::new(
            FieldId::new("fld_missing"),
            Operator::Equals,
            FilterValue::from("x"),
        ));
        let hydrated = Hydrated::new(template).unwrap();
        assert!(hydrated.template().filters.is_empty());

        let mut model = TemplateModel::new();
        model.load(hydrated);
        assert_eq!(model.document(), 1);
        assert_eq!(model.revision(), 1);
        assert!(model.is_valid());
    }

    #[test]
    fn replace_keeps_current_on_corrupt_input() {
        let mut model = TemplateModel::new();
        model.add_field(&region()).unwrap();
        let mut bad = ReportTemplate::new("Bad");
        let field = TemplateField::from_builder(&revenue());
        bad.fields.push(field.clone());
        bad.fields.push(field);

        assert!(model.replace(bad).is_err());
        assert_eq!(model.template().fields[0].name, "region");
        assert_eq!(model.document(), 0);
    }

    #[test]
    fn duplicate_remaps_ids() {
        let mut model = TemplateModel::new();
        model.update_metadata(MetadataPatch::new().with_name("Pipeline"));
        let id = model.add_field(&revenue()).unwrap();
        model.add_filter(&id).unwrap();
        model.apply_receipt(&SaveReceipt {
            id: TemplateId::new("tpl-1"),
            updated_at: chrono::Utc::now(),
        });

        let copy = model.duplicate();
        assert_eq!(copy.name, "Pipeline (Copy)");
        assert!(copy.id.is_none() && copy.updated_at.is_none());
        assert_ne!(copy.fields[0].id, id);
        assert_eq!(copy.filters[0].field_id, copy.fields[0].id);
    }

    #[test]
    fn apply_receipt_keeps_revision() {
        let mut model = TemplateModel::new();
        model.add_field(&region()).unwrap();
        let revision = model.revision();
        model.apply_receipt(&SaveReceipt {
            id: TemplateId::new("tpl-9"),
            updated_at: chrono::Utc::now(),
        });
        assert_eq!(model.revision(), revision);
        assert!(model.template().is_persisted());
    }
}
