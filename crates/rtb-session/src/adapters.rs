//! In-memory collaborator implementations
//!
//! Used by the CLI simulator and by tests. They are deliberately small but
//! behave like real backends where the session cares: the repository
//! enforces optimistic concurrency on `updatedAt`, and every adapter can be
//! slowed down or made to fail.

use crate::collaborators::{DataQueryExecutor, FieldCatalog, Row, TemplateRepository};
use crate::error::{CatalogError, PersistenceError, PreviewError};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use parking_lot::Mutex;
use rtb_model::{DataSource, FieldType, ReportTemplate, SaveReceipt, TemplateId};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use ulid::Ulid;

/// Template repository backed by a map
#[derive(Debug, Default)]
pub struct MemoryTemplateRepository {
    store: Mutex<HashMap<TemplateId, ReportTemplate>>,
    history: Mutex<Vec<ReportTemplate>>,
    failures: Mutex<VecDeque<PersistenceError>>,
    latency: Mutex<Duration>,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
    save_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryTemplateRepository {
    /// Create new empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With simulated save latency
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = latency;
        self
    }

    /// Change simulated save latency
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Seed a stored template, assigning an id and timestamps if missing
    pub fn insert(&self, mut template: ReportTemplate) -> TemplateId {
        let id = template
            .id
            .clone()
            .unwrap_or_else(|| TemplateId::new(format!("tpl_{}", Ulid::new())));
        let now = self.stamp();
        template.id = Some(id.clone());
        template.created_at.get_or_insert(now);
        template.updated_at.get_or_insert(now);
        self.store.lock().insert(id.clone(), template);
        id
    }

    /// Make the next save fail with `error`
    ///
    /// Queued failures are consumed one per save, in order.
    pub fn fail_next(&self, error: PersistenceError) {
        self.failures.lock().push_back(error);
    }

    /// Simulate a concurrent edit by bumping the stored `updatedAt`
    pub fn touch(&self, id: &TemplateId) -> bool {
        let now = self.stamp();
        match self.store.lock().get_mut(id) {
            Some(stored) => {
                stored.updated_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Stored copy of a template
    #[must_use]
    pub fn stored(&self, id: &TemplateId) -> Option<ReportTemplate> {
        self.store.lock().get(id).cloned()
    }

    /// Number of stored templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Payloads of every save call received, in order
    #[must_use]
    pub fn history(&self) -> Vec<ReportTemplate> {
        self.history.lock().clone()
    }

    /// Number of save calls received
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently running save calls observed
    #[inline]
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Strictly increasing timestamp (paused test clocks can repeat `now`)
    fn stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock();
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + ChronoDuration::milliseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    fn commit(&self, template: &ReportTemplate) -> Result<SaveReceipt, PersistenceError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        let mut store = self.store.lock();
        let now = self.stamp();
        let mut stored = template.clone();

        let id = match &template.id {
            Some(id) => {
                let current = store
                    .get(id)
                    .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
                if current.updated_at != template.updated_at {
                    return Err(PersistenceError::VersionConflict { id: id.clone() });
                }
                stored.created_at = current.created_at.or(Some(now));
                id.clone()
            }
            None => {
                stored.created_at = Some(now);
                TemplateId::new(format!("tpl_{}", Ulid::new()))
            }
        };

        stored.id = Some(id.clone());
        stored.updated_at = Some(now);
        store.insert(id.clone(), stored);
        Ok(SaveReceipt {
            id,
            updated_at: now,
        })
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateRepository {
    async fn get(&self, id: &TemplateId) -> Result<ReportTemplate, PersistenceError> {
        self.stored(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    async fn save(&self, template: &ReportTemplate) -> Result<SaveReceipt, PersistenceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().push(template.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = self.commit(template);
        debug!(ok = result.is_ok(), "memory repository save");
        result
    }
}

/// Field catalog over a fixed list of data sources
#[derive(Debug, Default)]
pub struct StaticFieldCatalog {
    sources: Vec<DataSource>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl StaticFieldCatalog {
    /// Create new catalog
    #[must_use]
    pub fn new(sources: Vec<DataSource>) -> Self {
        Self {
            sources,
            unavailable: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate an outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of list calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldCatalog for StaticFieldCatalog {
    async fn list_data_sources(&self) -> Result<Vec<DataSource>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("catalog offline".to_string()));
        }
        Ok(self.sources.clone())
    }
}

/// Preview executor producing deterministic rows from field types
#[derive(Debug)]
pub struct SyntheticQueryExecutor {
    rows: usize,
    latencies: Mutex<VecDeque<Duration>>,
    failures: Mutex<VecDeque<PreviewError>>,
    calls: AtomicUsize,
}

impl SyntheticQueryExecutor {
    /// Create new executor producing up to `rows` rows
    #[must_use]
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            latencies: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay the next call by `latency` (queued, one per call)
    pub fn push_latency(&self, latency: Duration) {
        self.latencies.lock().push_back(latency);
    }

    /// Make the next call fail
    pub fn fail_next(&self, error: PreviewError) {
        self.failures.lock().push_back(error);
    }

    /// Number of preview calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Rows for a template, without latency or failure injection
    #[must_use]
    pub fn rows_for(&self, template: &ReportTemplate, limit: usize) -> Vec<Row> {
        (0..self.rows.min(limit))
            .map(|i| {
                template
                    .fields
                    .iter()
                    .filter(|f| f.visible)
                    .map(|f| (f.name.clone(), synthetic_value(f.field_type, &f.display_name, i)))
                    .collect()
            })
            .collect()
    }
}

impl Default for SyntheticQueryExecutor {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl DataQueryExecutor for SyntheticQueryExecutor {
    async fn preview(
        &self,
        template: &ReportTemplate,
        limit: usize,
    ) -> Result<Vec<Row>, PreviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latencies.lock().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        Ok(self.rows_for(template, limit))
    }
}

#[allow(clippy::cast_precision_loss)]
fn synthetic_value(field_type: FieldType, label: &str, i: usize) -> Value {
    let n = i as f64;
    match field_type {
        FieldType::String => json!(format!("{label} {}", i + 1)),
        FieldType::Number => json!(n * 10.0),
        FieldType::Currency => json!(100.0 + n * 12.5),
        FieldType::Percentage => json!((i % 100) as f64 / 100.0),
        FieldType::Boolean => json!(i % 2 == 0),
        FieldType::Date => {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
            let day = base + ChronoDuration::days(i64::try_from(i).unwrap_or(0));
            json!(day.format("%Y-%m-%d").to_string())
        }
    }
}
