//! Editor session
//!
//! [`EditorSession`] is the surface a builder UI talks to. It owns the
//! shared [`TemplateModel`] and routes every successful mutation to the
//! autosave coordinator and, when the preview could change, to the preview
//! generator.

use crate::autosave::{AutosaveCoordinator, SaveStatus};
use crate::collaborators::{DataQueryExecutor, FieldCatalog, TemplateRepository};
use crate::config::SessionConfig;
use crate::error::{CatalogError, PersistenceError, SessionError, SessionResult};
use crate::preview::{GenerationToken, PreviewGenerator, PreviewState};
use parking_lot::Mutex;
use rtb_model::{
    BuilderField, DataSource, FieldId, FilterId, ReportTemplate, SaveReceipt, TemplateId,
    VisualizationKind,
};
use rtb_operators::OperatorSpec;
use rtb_template::{
    catalog, find_prebuilt, FieldPatch, FilterPatch, Hydrated, MetadataPatch, ModelError,
    ModelResult, TemplateModel, ValidationResult, VisualizationPatch,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Reorderable list in the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Selected fields
    Fields,
    /// Filters
    Filters,
}

impl ListKind {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fields => "fields",
            Self::Filters => "filters",
        }
    }
}

/// A completed drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragMove {
    /// List the item was picked from
    pub source: ListKind,
    /// List the item was dropped on
    pub target: ListKind,
    /// Index in the source list
    pub from: usize,
    /// Index in the target list
    pub to: usize,
}

impl DragMove {
    /// Create new move within one list
    #[inline]
    #[must_use]
    pub fn within(list: ListKind, from: usize, to: usize) -> Self {
        Self {
            source: list,
            target: list,
            from,
            to,
        }
    }
}

/// External services a session talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Field catalog
    pub catalog: Arc<dyn FieldCatalog>,
    /// Template repository
    pub repository: Arc<dyn TemplateRepository>,
    /// Preview executor
    pub executor: Arc<dyn DataQueryExecutor>,
}

impl Collaborators {
    /// Create new collaborator set
    #[must_use]
    pub fn new(
        catalog: Arc<dyn FieldCatalog>,
        repository: Arc<dyn TemplateRepository>,
        executor: Arc<dyn DataQueryExecutor>,
    ) -> Self {
        Self {
            catalog,
            repository,
            executor,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    sources: Option<Vec<DataSource>>,
    error: Option<CatalogError>,
}

/// Which dependents a mutation touches
#[derive(Clone, Copy)]
enum Scope {
    /// Name, description, tags: autosave only
    Metadata,
    /// Fields, filters, visualization: autosave and preview
    Content,
}

/// One template being built or edited
pub struct EditorSession {
    config: SessionConfig,
    model: Arc<Mutex<TemplateModel>>,
    autosave: AutosaveCoordinator,
    preview: PreviewGenerator,
    catalog: Arc<dyn FieldCatalog>,
    repository: Arc<dyn TemplateRepository>,
    catalog_state: Mutex<CatalogState>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("autosave", &self.autosave)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Create new session in create mode (empty, unsaved template)
    ///
    /// # Errors
    /// [`SessionError::Config`] for an invalid configuration.
    pub fn create(collaborators: Collaborators, config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        let model = Arc::new(Mutex::new(TemplateModel::new()));
        let autosave = AutosaveCoordinator::new(
            Arc::clone(&model),
            Arc::clone(&collaborators.repository),
            config.debounce(),
        )
        .with_enabled(config.autosave)
        .with_author(config.author.clone());
        let preview = PreviewGenerator::new(collaborators.executor, config.preview_row_limit);

        debug!(?config, "editor session created");
        Ok(Self {
            config,
            model,
            autosave,
            preview,
            catalog: collaborators.catalog,
            repository: collaborators.repository,
            catalog_state: Mutex::new(CatalogState::default()),
        })
    }

    /// Create new session in edit mode on a stored template
    ///
    /// # Errors
    /// Configuration errors, the repository's [`PersistenceError`], or
    /// [`SessionError::Model`] when the stored template is corrupt.
    pub async fn open(
        collaborators: Collaborators,
        config: SessionConfig,
        id: &TemplateId,
    ) -> SessionResult<Self> {
        let session = Self::create(collaborators, config)?;
        session.load_saved(id).await?;
        Ok(session)
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ----- loading -----

    /// Replace the edited template wholesale
    ///
    /// Pending autosave work for the previous template is dropped and the
    /// preview is invalidated.
    ///
    /// # Errors
    /// [`SessionError::Model`] when the template is corrupt; the current
    /// template stays loaded.
    pub fn load_template(&self, template: ReportTemplate) -> SessionResult<()> {
        let hydrated = Hydrated::new(template)?;
        self.autosave.reset();
        self.model.lock().load(hydrated);
        self.preview.invalidate();
        Ok(())
    }

    /// Load a prebuilt template in create mode
    ///
    /// # Errors
    /// [`SessionError::PrebuiltNotFound`] for an unknown key.
    pub fn load_prebuilt(&self, key: &str) -> SessionResult<()> {
        let prebuilt =
            find_prebuilt(key).ok_or_else(|| SessionError::PrebuiltNotFound(key.to_string()))?;
        info!(key, "loading prebuilt template");
        self.load_template(prebuilt.template)
    }

    /// Load a stored template in edit mode
    ///
    /// # Errors
    /// The repository's [`PersistenceError`] or a corrupt-template error.
    pub async fn load_saved(&self, id: &TemplateId) -> SessionResult<()> {
        let template = self.repository.get(id).await?;
        info!(%id, "loading saved template");
        self.load_template(template)
    }

    // ----- catalog -----

    /// Fetch data sources from the catalog
    ///
    /// On failure the previous sources are kept, catalog field additions
    /// are refused and the rest of the session stays editable.
    ///
    /// # Errors
    /// [`SessionError::Catalog`] when the catalog is unavailable.
    pub async fn refresh_catalog(&self) -> SessionResult<usize> {
        match self.catalog.list_data_sources().await {
            Ok(sources) => {
                let count = sources.len();
                let mut state = self.catalog_state.lock();
                state.sources = Some(sources);
                state.error = None;
                debug!(sources = count, "catalog loaded");
                Ok(count)
            }
            Err(error) => {
                warn!(%error, "catalog unavailable");
                self.catalog_state.lock().error = Some(error.clone());
                Err(error.into())
            }
        }
    }

    /// Loaded data sources (empty before the first successful refresh)
    #[must_use]
    pub fn data_sources(&self) -> Vec<DataSource> {
        self.catalog_state.lock().sources.clone().unwrap_or_default()
    }

    /// Error of the last failed catalog refresh
    #[must_use]
    pub fn catalog_error(&self) -> Option<CatalogError> {
        self.catalog_state.lock().error.clone()
    }

    /// Catalog fields of a source not yet placed in the template
    ///
    /// # Errors
    /// [`CatalogError`] when the catalog is unavailable or the source unknown.
    pub fn available_fields(&self, source_id: &str) -> SessionResult<Vec<BuilderField>> {
        self.search_fields(source_id, "")
    }

    /// [`Self::available_fields`] narrowed by a case-insensitive query
    ///
    /// # Errors
    /// As [`Self::available_fields`].
    pub fn search_fields(&self, source_id: &str, query: &str) -> SessionResult<Vec<BuilderField>> {
        let state = self.catalog_state.lock();
        let source = Self::source(&state, source_id)?;
        let model = self.model.lock();
        Ok(catalog::search_available(source, model.template(), query)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Add a field picked from the catalog
    ///
    /// # Errors
    /// [`CatalogError`] for an unavailable catalog or unknown source/field,
    /// [`rtb_template::ModelError::DuplicateField`] when already placed.
    pub fn add_catalog_field(&self, source_id: &str, field_name: &str) -> SessionResult<FieldId> {
        let field = {
            let state = self.catalog_state.lock();
            let source = Self::source(&state, source_id)?;
            source
                .field(field_name)
                .cloned()
                .ok_or_else(|| CatalogError::FieldNotFound {
                    source_id: source_id.to_string(),
                    field: field_name.to_string(),
                })?
        };
        self.add_field(&field)
    }

    fn source<'a>(
        state: &'a CatalogState,
        source_id: &str,
    ) -> Result<&'a DataSource, CatalogError> {
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        let sources = state.sources.as_deref().ok_or(CatalogError::NotLoaded)?;
        catalog::find_source(sources, source_id)
            .ok_or_else(|| CatalogError::SourceNotFound(source_id.to_string()))
    }

    // ----- mutations -----

    /// Add a field
    ///
    /// # Errors
    /// [`rtb_template::ModelError::DuplicateField`].
    pub fn add_field(&self, field: &BuilderField) -> SessionResult<FieldId> {
        self.mutate(Scope::Content, |m| m.add_field(field))
    }

    /// Remove a field and its filters; returns the removed filter ids
    ///
    /// # Errors
    /// [`rtb_template::ModelError::FieldNotFound`].
    pub fn remove_field(&self, id: &FieldId) -> SessionResult<Vec<FilterId>> {
        self.mutate(Scope::Content, |m| m.remove_field(id))
    }

    /// Patch a field; returns the ids of filters reset by a type change
    ///
    /// # Errors
    /// Unknown field or a disallowed aggregation/format.
    pub fn update_field(&self, id: &FieldId, patch: FieldPatch) -> SessionResult<Vec<FilterId>> {
        self.mutate(Scope::Content, |m| m.update_field(id, patch))
    }

    /// Move a field; out-of-range indices are ignored
    pub fn reorder_fields(&self, from: usize, to: usize) -> bool {
        self.apply(Scope::Content, |m| m.reorder_fields(from, to))
    }

    /// Move a filter; out-of-range indices are ignored
    pub fn reorder_filters(&self, from: usize, to: usize) -> bool {
        self.apply(Scope::Content, |m| m.reorder_filters(from, to))
    }

    /// Apply a drag gesture
    ///
    /// # Errors
    /// [`SessionError::CrossListMove`] when source and target lists differ.
    pub fn apply_drag(&self, drag: DragMove) -> SessionResult<bool> {
        if drag.source != drag.target {
            return Err(SessionError::CrossListMove {
                from_list: drag.source.as_str(),
                to_list: drag.target.as_str(),
            });
        }
        Ok(match drag.source {
            ListKind::Fields => self.reorder_fields(drag.from, drag.to),
            ListKind::Filters => self.reorder_filters(drag.from, drag.to),
        })
    }

    /// Add a filter on a placed field
    ///
    /// # Errors
    /// [`rtb_template::ModelError::FieldNotFound`].
    pub fn add_filter(&self, field_id: &FieldId) -> SessionResult<FilterId> {
        self.mutate(Scope::Content, |m| m.add_filter(field_id))
    }

    /// Remove a filter
    ///
    /// # Errors
    /// [`rtb_template::ModelError::FilterNotFound`].
    pub fn remove_filter(&self, id: &FilterId) -> SessionResult<()> {
        self.mutate(Scope::Content, |m| m.remove_filter(id))
    }

    /// Patch a filter
    ///
    /// # Errors
    /// Unknown filter or re-target field.
    pub fn update_filter(&self, id: &FilterId, patch: FilterPatch) -> SessionResult<()> {
        self.mutate(Scope::Content, |m| m.update_filter(id, patch))
    }

    /// Switch visualization type; `false` when unchanged
    pub fn set_visualization(&self, kind: VisualizationKind) -> bool {
        self.apply(Scope::Content, |m| m.set_visualization(kind))
    }

    /// Merge visualization settings
    pub fn update_visualization(&self, patch: VisualizationPatch) {
        self.apply(Scope::Content, |m| m.update_visualization(patch));
    }

    /// Merge name, description, category, tags and visibility
    pub fn update_metadata(&self, patch: MetadataPatch) {
        self.apply(Scope::Metadata, |m| m.update_metadata(patch));
    }

    /// Operators the filter's field type supports, in menu order
    ///
    /// # Errors
    /// [`rtb_template::ModelError::FilterNotFound`] or
    /// [`rtb_template::ModelError::FieldNotFound`] for a dangling filter.
    pub fn operators_for_filter(&self, id: &FilterId) -> SessionResult<Vec<OperatorSpec>> {
        let model = self.model.lock();
        let template = model.template();
        let filter = template
            .filters
            .iter()
            .find(|f| &f.id == id)
            .ok_or_else(|| ModelError::FilterNotFound(id.clone()))?;
        let field = template
            .field(&filter.field_id)
            .ok_or_else(|| ModelError::FieldNotFound(filter.field_id.clone()))?;
        Ok(model
            .registry()
            .operators_for(field.field_type)
            .cloned()
            .collect())
    }

    /// Unsaved copy of the current template with fresh ids
    #[must_use]
    pub fn duplicate(&self) -> ReportTemplate {
        self.model.lock().duplicate()
    }

    /// Run a model mutation and notify dependents if the revision moved
    /// Run `f` on the model; notify autosave and preview if it changed
    fn apply<T>(&self, scope: Scope, f: impl FnOnce(&mut TemplateModel) -> T) -> T {
        let (out, changed) = {
            let mut model = self.model.lock();
            let before = model.revision();
            let out = f(&mut model);
            (out, model.revision() != before)
        };
        if changed {
            self.autosave.notify_mutation();
            if matches!(scope, Scope::Content) {
                self.preview.invalidate();
            }
        }
        out
    }

    fn mutate<T>(
        &self,
        scope: Scope,
        f: impl FnOnce(&mut TemplateModel) -> ModelResult<T>,
    ) -> SessionResult<T> {
        Ok(self.apply(scope, f)?)
    }

    // ----- queries -----

    /// Owned copy of the current template
    #[must_use]
    pub fn snapshot(&self) -> ReportTemplate {
        self.model.lock().snapshot()
    }

    /// Current validation result
    #[must_use]
    pub fn validation(&self) -> ValidationResult {
        self.model.lock().validation().clone()
    }

    /// Mutation counter of the current template
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.model.lock().revision()
    }

    /// Whether the template has an id (edit mode)
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.model.lock().template().is_persisted()
    }

    /// Current save status
    #[inline]
    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    /// Watch save status changes
    #[must_use]
    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe()
    }

    /// Error of the most recent failed save
    #[must_use]
    pub fn last_save_error(&self) -> Option<PersistenceError> {
        self.autosave.last_error()
    }

    /// Wait until autosave has nothing pending
    pub async fn settled(&self) {
        self.autosave.settled().await;
    }

    // ----- save & preview -----

    /// Save immediately
    ///
    /// # Errors
    /// [`SessionError::Invalid`] when validation has errors, otherwise the
    /// repository's [`PersistenceError`].
    pub async fn save_now(&self) -> SessionResult<SaveReceipt> {
        self.ensure_valid()?;
        Ok(self.autosave.save_now().await?)
    }

    /// Request a preview of the current template
    ///
    /// # Errors
    /// [`SessionError::Invalid`] when validation has errors.
    pub fn request_preview(&self) -> SessionResult<GenerationToken> {
        let snapshot = {
            let model = self.model.lock();
            if !model.is_valid() {
                return Err(SessionError::Invalid(model.validation().clone()));
            }
            model.snapshot()
        };
        Ok(self.preview.request(snapshot))
    }

    /// Current preview state
    #[must_use]
    pub fn preview(&self) -> PreviewState {
        self.preview.state()
    }

    /// Watch preview state changes
    #[must_use]
    pub fn subscribe_preview(&self) -> watch::Receiver<PreviewState> {
        self.preview.subscribe()
    }

    /// Wait for the outstanding preview request, if any
    pub async fn preview_settled(&self) -> PreviewState {
        self.preview.settled().await
    }

    fn ensure_valid(&self) -> SessionResult<()> {
        let model = self.model.lock();
        if model.is_valid() {
            Ok(())
        } else {
            Err(SessionError::Invalid(model.validation().clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryTemplateRepository, StaticFieldCatalog, SyntheticQueryExecutor};
    use crate::collaborators::MockFieldCatalog;
    use rtb_template::{sample_catalog, ValidationCode};
    use std::time::Duration;

    fn collaborators(repo: Arc<MemoryTemplateRepository>) -> Collaborators {
        Collaborators::new(
            Arc::new(StaticFieldCatalog::new(sample_catalog())),
            repo,
            Arc::new(SyntheticQueryExecutor::default()),
        )
    }

    async fn session() -> EditorSession {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let session = EditorSession::create(collaborators(repo), SessionConfig::default()).unwrap();
        session.refresh_catalog().await.unwrap();
        session
    }

    #[tokio::test]
    async fn catalog_fields_shrink_as_placed() {
        let session = session().await;
        let before = session.available_fields("sales").unwrap().len();
        session.add_catalog_field("sales", "region").unwrap();
        let after = session.available_fields("sales").unwrap();
        assert_eq!(after.len(), before - 1);
        assert!(after.iter().all(|f| f.name != "region"));

        let err = session.add_catalog_field("sales", "region").unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_FIELD");
        let err = session.add_catalog_field("nope", "region").unwrap_err();
        assert_eq!(err.code(), "SOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn catalog_outage_blocks_only_catalog_additions() {
        let mut catalog = MockFieldCatalog::new();
        catalog
            .expect_list_data_sources()
            .returning(|| Err(CatalogError::Unavailable("503".into())));
        let session = EditorSession::create(
            Collaborators::new(
                Arc::new(catalog),
                Arc::new(MemoryTemplateRepository::new()),
                Arc::new(SyntheticQueryExecutor::default()),
            ),
            SessionConfig::default(),
        )
        .unwrap();

        assert!(session.refresh_catalog().await.is_err());
        assert!(session.catalog_error().is_some());
        assert!(matches!(
            session.add_catalog_field("sales", "region"),
            Err(SessionError::Catalog(CatalogError::Unavailable(_)))
        ));

        session.update_metadata(MetadataPatch::new().with_name("Still editable"));
        assert_eq!(session.snapshot().name, "Still editable");
    }

    #[tokio::test]
    async fn cross_list_drag_is_rejected() {
        let session = session().await;
        session.add_catalog_field("sales", "region").unwrap();
        session.add_catalog_field("sales", "revenue").unwrap();

        let err = session
            .apply_drag(DragMove {
                source: ListKind::Fields,
                target: ListKind::Filters,
                from: 0,
                to: 0,
            })
            .unwrap_err();
        assert_eq!(err.code(), "CROSS_LIST_MOVE");

        assert!(session.apply_drag(DragMove::within(ListKind::Fields, 0, 1)).unwrap());
        assert_eq!(session.snapshot().fields[0].name, "revenue");
        assert!(!session.apply_drag(DragMove::within(ListKind::Fields, 0, 9)).unwrap());
    }

    #[tokio::test]
    async fn filter_operator_menu_follows_field_type() {
        let session = session().await;
        let closed = session.add_catalog_field("sales", "is_closed").unwrap();
        let filter = session.add_filter(&closed).unwrap();
        let ops: Vec<_> = session
            .operators_for_filter(&filter)
            .unwrap()
            .into_iter()
            .map(|spec| spec.operator)
            .collect();
        assert_eq!(ops.len(), 4);
        assert!(!ops.contains(&rtb_model::Operator::Contains));

        session.remove_field(&closed).unwrap();
        assert_eq!(
            session.operators_for_filter(&filter).unwrap_err().code(),
            "FILTER_NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn invalid_template_blocks_save_and_preview() {
        let session = session().await;
        let err = session.save_now().await.unwrap_err();
        match err {
            SessionError::Invalid(result) => {
                assert!(result.has_code(ValidationCode::NameRequired));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            session.request_preview(),
            Err(SessionError::Invalid(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn first_manual_save_enters_edit_mode() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let session =
            EditorSession::create(collaborators(repo.clone()), SessionConfig::default()).unwrap();
        session.refresh_catalog().await.unwrap();
        session.update_metadata(MetadataPatch::new().with_name("Pipeline"));
        session.add_catalog_field("sales", "region").unwrap();

        // create mode: mutations do not schedule saves
        assert_eq!(session.save_status(), SaveStatus::Idle);

        let receipt = session.save_now().await.unwrap();
        assert!(session.is_persisted());
        assert_eq!(session.snapshot().id, Some(receipt.id.clone()));

        session.update_metadata(MetadataPatch::new().with_name("Pipeline v2"));
        assert_eq!(session.save_status(), SaveStatus::Scheduled);
        tokio::time::sleep(Duration::from_millis(2100)).await;
        session.settled().await;
        assert_eq!(repo.save_count(), 2);
        assert_eq!(repo.stored(&receipt.id).unwrap().name, "Pipeline v2");
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_template_load_keeps_current_document() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let session =
            EditorSession::create(collaborators(repo.clone()), SessionConfig::default()).unwrap();
        session.load_prebuilt("sales-by-region").unwrap();
        let receipt = session.save_now().await.unwrap();
        session.update_metadata(MetadataPatch::new().with_name("Pending rename"));
        assert_eq!(session.save_status(), SaveStatus::Scheduled);

        let mut corrupt = session.snapshot();
        let duplicate = corrupt.fields[0].clone();
        corrupt.id = None;
        corrupt.fields.push(duplicate);
        let err = session.load_template(corrupt).unwrap_err();
        assert_eq!(err.code(), "CORRUPT_TEMPLATE");

        // the scheduled save for the current document still runs
        assert_eq!(session.snapshot().id, Some(receipt.id.clone()));
        assert_eq!(session.save_status(), SaveStatus::Scheduled);
        session.settled().await;
        assert_eq!(repo.stored(&receipt.id).unwrap().name, "Pending rename");
    }

    #[tokio::test]
    async fn load_prebuilt_and_preview() {
        let session = session().await;
        session.load_prebuilt("sales-by-region").unwrap();
        assert!(!session.is_persisted());
        assert!(session.validation().is_valid);

        let token = session.request_preview().unwrap();
        let state = session.preview_settled().await;
        assert_eq!(state.token(), Some(token));
        assert!(!state.rows().unwrap().is_empty());

        assert_eq!(
            session.load_prebuilt("missing").unwrap_err().code(),
            "PREBUILT_NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn metadata_edits_keep_preview() {
        let session = session().await;
        session.load_prebuilt("total-revenue").unwrap();
        session.request_preview().unwrap();
        let ready = session.preview_settled().await;

        session.update_metadata(MetadataPatch::new().with_description("for the board"));
        assert_eq!(session.preview(), ready);

        session.set_visualization(VisualizationKind::Table);
        assert_ne!(session.preview().token(), None);
        session.request_preview().unwrap();
        assert_ne!(session.preview_settled().await.token(), ready.token());
    }
}
