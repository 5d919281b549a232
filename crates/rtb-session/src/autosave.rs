//! Debounced autosave coordination
//!
//! [`AutosaveCoordinator`] turns a stream of mutation notifications into as
//! few repository saves as possible while never running two at once:
//!
//! - every edit-mode mutation restarts a debounce timer
//! - when the timer fires with no save running, the current snapshot is saved
//! - when it fires during a save, the snapshot becomes the single queued
//!   follow-up (a later fire replaces it)
//! - a manual save skips the timer but still queues behind a running save
//!
//! Failures park the coordinator in [`SaveStatus::Error`]; nothing retries
//! until the next mutation or manual save. Local edits are never touched.

use crate::collaborators::TemplateRepository;
use crate::error::PersistenceError;
use parking_lot::Mutex;
use rtb_model::{ReportTemplate, SaveReceipt};
use rtb_template::TemplateModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome delivered to a manual-save caller
pub type SaveOutcome = Result<SaveReceipt, PersistenceError>;

/// Persistence state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing pending
    #[default]
    Idle,
    /// Debounce timer running
    Scheduled,
    /// A save is in flight
    Saving,
    /// Last save failed; edits are kept
    Error,
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Saving => "saving",
            Self::Error => "error",
        })
    }
}

/// Snapshot queued behind the running save
struct FollowUp {
    snapshot: ReportTemplate,
    document: u64,
    waiters: Vec<oneshot::Sender<SaveOutcome>>,
}

#[derive(Default)]
struct State {
    timer: Option<JoinHandle<()>>,
    timer_epoch: u64,
    in_flight: bool,
    /// Edited while the first save of a new template was running
    unsaved_edits: bool,
    follow_up: Option<FollowUp>,
    last_error: Option<PersistenceError>,
}

struct Shared {
    state: Mutex<State>,
    model: Arc<Mutex<TemplateModel>>,
    repository: Arc<dyn TemplateRepository>,
    status: watch::Sender<SaveStatus>,
    debounce: Duration,
    enabled: bool,
    author: Option<String>,
}

/// Debounced, single-flight save scheduler for one model
///
/// Cheap to clone; clones share state. Timer and save tasks are spawned on
/// the ambient Tokio runtime.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for AutosaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveCoordinator")
            .field("status", &self.status())
            .field("debounce", &self.shared.debounce)
            .field("enabled", &self.shared.enabled)
            .finish_non_exhaustive()
    }
}

impl AutosaveCoordinator {
    /// Create new coordinator over a shared model
    #[must_use]
    pub fn new(
        model: Arc<Mutex<TemplateModel>>,
        repository: Arc<dyn TemplateRepository>,
        debounce: Duration,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                model,
                repository,
                status,
                debounce,
                enabled: true,
                author: None,
            }),
        }
    }

    /// With autosave enabled or disabled (manual save always works)
    ///
    /// Must be called before the coordinator is cloned.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.enabled = enabled;
        }
        self
    }

    /// With author stamped as `createdBy` on saves that lack one
    ///
    /// Must be called before the coordinator is cloned.
    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.author = author;
        }
        self
    }

    /// Current status
    #[inline]
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        *self.shared.status.borrow()
    }

    /// Watch status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// Error of the most recent failed save, cleared by the next success
    #[must_use]
    pub fn last_error(&self) -> Option<PersistenceError> {
        self.shared.state.lock().last_error.clone()
    }

    /// Whether a save request is currently running
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.shared.state.lock().in_flight
    }

    /// Whether a follow-up save is queued
    #[must_use]
    pub fn has_follow_up(&self) -> bool {
        self.shared.state.lock().follow_up.is_some()
    }

    /// Record a mutation; restarts the debounce timer in edit mode
    ///
    /// Create-mode templates (no id yet) are only saved manually. Edits made
    /// while their first save is running are autosaved once it succeeds.
    pub fn notify_mutation(&self) {
        if !self.shared.enabled {
            return;
        }
        let mut state = self.shared.state.lock();
        if !self.shared.model.lock().template().is_persisted() {
            if state.in_flight {
                state.unsaved_edits = true;
            }
            return;
        }
        self.shared.schedule(&mut state);
        self.shared.publish(&state);
    }

    /// Save now, bypassing the debounce window
    ///
    /// Cancels a pending timer. When a save is already running, this
    /// snapshot becomes the queued follow-up and the call resolves once that
    /// follow-up completes.
    ///
    /// # Errors
    /// The repository's [`PersistenceError`], or
    /// [`PersistenceError::Superseded`] when another template is loaded
    /// before the queued save starts.
    pub async fn save_now(&self) -> SaveOutcome {
        let rx = {
            let mut state = self.shared.state.lock();
            self.shared.cancel_timer(&mut state);
            let (snapshot, document, _) = self.shared.snapshot();
            let (tx, rx) = oneshot::channel();
            if state.in_flight {
                debug!("manual save queued behind running save");
                self.shared.enqueue(&mut state, snapshot, document, Some(tx));
            } else {
                self.shared.launch(&mut state, snapshot, document, vec![tx]);
            }
            self.shared.publish(&state);
            rx
        };

        rx.await
            .unwrap_or_else(|_| Err(PersistenceError::Unavailable("save task dropped".to_string())))
    }

    /// Forget pending work for the current document
    ///
    /// Called when a different template is loaded: cancels the timer, fails
    /// queued waiters with [`PersistenceError::Superseded`] and clears the
    /// error. A running save finishes, but its receipt is not applied.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        self.shared.cancel_timer(&mut state);
        state.unsaved_edits = false;
        if let Some(follow_up) = state.follow_up.take() {
            debug!(waiters = follow_up.waiters.len(), "dropping queued save");
            for waiter in follow_up.waiters {
                let _ = waiter.send(Err(PersistenceError::Superseded));
            }
        }
        state.last_error = None;
        self.shared.publish(&state);
    }

    /// Wait until no timer, save or follow-up is pending
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        let _ = rx
            .wait_for(|s| matches!(s, SaveStatus::Idle | SaveStatus::Error))
            .await;
    }
}

impl Shared {
    fn schedule(self: &Arc<Self>, state: &mut State) {
        self.cancel_timer(state);
        let epoch = state.timer_epoch;
        let shared = Arc::clone(self);
        let debounce = self.debounce;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            shared.fire(epoch);
        }));
        debug!(epoch, ?debounce, "autosave scheduled");
    }

    fn cancel_timer(&self, state: &mut State) {
        state.timer_epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    fn fire(self: &Arc<Self>, epoch: u64) {
        let mut state = self.state.lock();
        if epoch != state.timer_epoch {
            return;
        }
        state.timer = None;

        let (snapshot, document, valid) = self.snapshot();
        if !valid {
            debug!("autosave skipped: template has validation errors");
        } else if state.in_flight {
            debug!("autosave coalesced into follow-up");
            self.enqueue(&mut state, snapshot, document, None);
        } else {
            self.launch(&mut state, snapshot, document, Vec::new());
        }
        self.publish(&state);
    }

    /// Model snapshot, its document epoch and validity
    fn snapshot(&self) -> (ReportTemplate, u64, bool) {
        let model = self.model.lock();
        let mut snapshot = model.snapshot();
        if snapshot.created_by.is_none() {
            snapshot.created_by.clone_from(&self.author);
        }
        (snapshot, model.document(), model.is_valid())
    }

    fn enqueue(
        &self,
        state: &mut State,
        snapshot: ReportTemplate,
        document: u64,
        waiter: Option<oneshot::Sender<SaveOutcome>>,
    ) {
        let mut waiters = state
            .follow_up
            .take()
            .map(|f| f.waiters)
            .unwrap_or_default();
        waiters.extend(waiter);
        state.follow_up = Some(FollowUp {
            snapshot,
            document,
            waiters,
        });
    }

    fn launch(
        self: &Arc<Self>,
        state: &mut State,
        snapshot: ReportTemplate,
        document: u64,
        waiters: Vec<oneshot::Sender<SaveOutcome>>,
    ) {
        state.in_flight = true;
        info!(
            id = snapshot.id.as_ref().map_or("<new>", |id| id.as_str()),
            "saving template"
        );
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = shared.repository.save(&snapshot).await;
            shared.complete(document, outcome, waiters);
        });
    }

    fn complete(
        self: &Arc<Self>,
        document: u64,
        outcome: SaveOutcome,
        waiters: Vec<oneshot::Sender<SaveOutcome>>,
    ) {
        let mut state = self.state.lock();
        state.in_flight = false;
        let unsaved_edits = std::mem::take(&mut state.unsaved_edits);
        let mut reschedule = false;

        {
            let mut model = self.model.lock();
            let current = model.document() == document;
            match &outcome {
                Ok(receipt) if current => {
                    model.apply_receipt(receipt);
                    state.last_error = None;
                    reschedule = unsaved_edits;
                    info!(id = %receipt.id, "template saved");
                }
                Ok(_) => debug!("receipt for a replaced template ignored"),
                Err(error) if current => {
                    warn!(%error, code = error.code(), "template save failed");
                    state.last_error = Some(error.clone());
                }
                Err(error) => debug!(%error, "failure for a replaced template ignored"),
            }

            if let Some(follow_up) = state.follow_up.as_mut() {
                if follow_up.document == model.document() {
                    follow_up.snapshot.id = model.template().id.clone();
                    follow_up.snapshot.updated_at = model.template().updated_at;
                }
            }
        }

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if let Some(follow_up) = state.follow_up.take() {
            self.launch(
                &mut state,
                follow_up.snapshot,
                follow_up.document,
                follow_up.waiters,
            );
        }
        if reschedule {
            debug!("edits made during first save, scheduling autosave");
            self.schedule(&mut state);
        }
        self.publish(&state);
    }

    fn publish(&self, state: &State) {
        let status = if state.in_flight {
            SaveStatus::Saving
        } else if state.timer.is_some() {
            SaveStatus::Scheduled
        } else if state.last_error.is_some() {
            SaveStatus::Error
        } else {
            SaveStatus::Idle
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                debug!(from = %current, to = %status, "save status");
                *current = status;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryTemplateRepository;
    use rtb_model::{BuilderField, FieldType};
    use rtb_template::MetadataPatch;

    fn edit_mode(repo: &MemoryTemplateRepository) -> Arc<Mutex<TemplateModel>> {
        let mut model = TemplateModel::new();
        model.update_metadata(MetadataPatch::new().with_name("Sales"));
        model
            .add_field(&BuilderField::new("region", FieldType::String, "o", "Region"))
            .unwrap();
        let id = repo.insert(model.snapshot());
        let stored = repo.stored(&id).unwrap();
        model.replace(stored).unwrap();
        Arc::new(Mutex::new(model))
    }

    fn rename(model: &Arc<Mutex<TemplateModel>>, name: &str) {
        model
            .lock()
            .update_metadata(MetadataPatch::new().with_name(name));
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_schedules_and_timer_saves() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = edit_mode(&repo);
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(2000));

        rename(&model, "A");
        autosave.notify_mutation();
        assert_eq!(autosave.status(), SaveStatus::Scheduled);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(repo.save_count(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        autosave.settled().await;
        assert_eq!(repo.save_count(), 1);
        assert_eq!(autosave.status(), SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn create_mode_does_not_autosave() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = Arc::new(Mutex::new(TemplateModel::new()));
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(10));

        rename(&model, "Draft");
        autosave.notify_mutation();
        assert_eq!(autosave.status(), SaveStatus::Idle);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_autosave_still_saves_manually() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = edit_mode(&repo);
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(10))
                .with_enabled(false);

        autosave.notify_mutation();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(repo.save_count(), 0);

        autosave.save_now().await.unwrap();
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_parks_in_error_until_next_trigger() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = edit_mode(&repo);
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(100));
        repo.fail_next(PersistenceError::Unavailable("down".into()));

        rename(&model, "B");
        autosave.notify_mutation();
        tokio::time::sleep(Duration::from_millis(150)).await;
        autosave.settled().await;
        assert_eq!(autosave.status(), SaveStatus::Error);
        assert!(autosave.last_error().unwrap().is_retryable());
        assert_eq!(model.lock().template().name, "B");

        // no silent retry
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(repo.save_count(), 1);

        rename(&model, "C");
        autosave.notify_mutation();
        assert_eq!(autosave.status(), SaveStatus::Scheduled);
        tokio::time::sleep(Duration::from_millis(150)).await;
        autosave.settled().await;
        assert_eq!(autosave.status(), SaveStatus::Idle);
        assert!(autosave.last_error().is_none());
        assert_eq!(repo.save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn receipt_updates_model_version() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = edit_mode(&repo);
        let before = model.lock().template().updated_at;
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(100));

        let receipt = autosave.save_now().await.unwrap();
        assert_eq!(model.lock().template().updated_at, Some(receipt.updated_at));
        assert_ne!(Some(receipt.updated_at), before);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_snapshot_is_skipped_by_timer() {
        let repo = Arc::new(MemoryTemplateRepository::new());
        let model = edit_mode(&repo);
        let autosave =
            AutosaveCoordinator::new(model.clone(), repo.clone(), Duration::from_millis(100));

        rename(&model, "");
        autosave.notify_mutation();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(repo.save_count(), 0);
        assert_eq!(autosave.status(), SaveStatus::Idle);
    }

    #[tokio::test]
    async fn rejected_payload_is_not_retryable() {
        let mut repo = crate::collaborators::MockTemplateRepository::new();
        repo.expect_save()
            .times(1)
            .returning(|_| Err(PersistenceError::Rejected("name too long".into())));
        let model = Arc::new(Mutex::new(TemplateModel::new()));
        rename(&model, "Draft");
        model
            .lock()
            .add_field(&BuilderField::new("region", FieldType::String, "o", "Region"))
            .unwrap();
        let autosave = AutosaveCoordinator::new(model.clone(), Arc::new(repo), Duration::ZERO)
            .with_author(Some("dana".into()));

        let err = autosave.save_now().await.unwrap_err();
        assert_eq!(err.code(), "REJECTED");
        assert!(!err.is_retryable());
        assert_eq!(autosave.status(), SaveStatus::Error);
        assert!(!model.lock().template().is_persisted());
    }
}
