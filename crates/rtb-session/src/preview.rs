//! Preview generation with stale-result suppression
//!
//! Every request takes a fresh [`GenerationToken`]. The executor call runs on
//! its own task and is never cancelled; its result is applied only if no
//! newer request or invalidation happened meanwhile.

use crate::collaborators::{DataQueryExecutor, Row};
use parking_lot::Mutex;
use rtb_model::ReportTemplate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Monotonic preview generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GenerationToken(u64);

impl GenerationToken {
    /// Raw generation number
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the preview pane shows
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PreviewState {
    /// No preview requested, or the last one was invalidated
    #[default]
    Empty,
    /// Waiting for the executor
    Pending {
        /// Request generation
        token: GenerationToken,
    },
    /// Rows for the request
    Ready {
        /// Request generation
        token: GenerationToken,
        /// Preview rows
        rows: Vec<Row>,
    },
    /// Executor failed
    Failed {
        /// Request generation
        token: GenerationToken,
        /// Error message
        message: String,
    },
}

impl PreviewState {
    /// Token of the request this state belongs to
    #[must_use]
    pub fn token(&self) -> Option<GenerationToken> {
        match self {
            Self::Empty => None,
            Self::Pending { token } | Self::Ready { token, .. } | Self::Failed { token, .. } => {
                Some(*token)
            }
        }
    }

    /// Check if a request is outstanding
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Rows when ready
    #[must_use]
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Ready { rows, .. } => Some(rows),
            _ => None,
        }
    }
}

struct Inner {
    executor: Arc<dyn DataQueryExecutor>,
    row_limit: usize,
    generation: Mutex<u64>,
    state: watch::Sender<PreviewState>,
}

/// Issues preview queries and keeps only the newest answer
#[derive(Clone)]
pub struct PreviewGenerator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PreviewGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewGenerator")
            .field("row_limit", &self.inner.row_limit)
            .field("generation", &*self.inner.generation.lock())
            .finish_non_exhaustive()
    }
}

impl PreviewGenerator {
    /// Create new generator
    #[must_use]
    pub fn new(executor: Arc<dyn DataQueryExecutor>, row_limit: usize) -> Self {
        let (state, _) = watch::channel(PreviewState::Empty);
        Self {
            inner: Arc::new(Inner {
                executor,
                row_limit,
                generation: Mutex::new(0),
                state,
            }),
        }
    }

    /// Row limit passed to the executor
    #[inline]
    #[must_use]
    pub fn row_limit(&self) -> usize {
        self.inner.row_limit
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> GenerationToken {
        GenerationToken(*self.inner.generation.lock())
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PreviewState {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.inner.state.subscribe()
    }

    /// Start a preview for `snapshot`
    pub fn request(&self, snapshot: ReportTemplate) -> GenerationToken {
        let token = {
            let mut generation = self.inner.generation.lock();
            *generation += 1;
            let token = GenerationToken(*generation);
            self.inner.state.send_replace(PreviewState::Pending { token });
            token
        };
        debug!(%token, limit = self.inner.row_limit, "preview requested");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.executor.preview(&snapshot, inner.row_limit).await;
            let generation = inner.generation.lock();
            if *generation != token.0 {
                debug!(%token, current = *generation, "stale preview discarded");
                return;
            }
            let state = match result {
                Ok(rows) => {
                    debug!(%token, rows = rows.len(), "preview ready");
                    PreviewState::Ready { token, rows }
                }
                Err(error) => {
                    warn!(%token, %error, "preview failed");
                    PreviewState::Failed {
                        token,
                        message: error.to_string(),
                    }
                }
            };
            inner.state.send_replace(state);
        });
        token
    }

    /// Mark any outstanding result stale
    ///
    /// A pending preview is cleared; a finished one stays visible until the
    /// next request.
    pub fn invalidate(&self) {
        let mut generation = self.inner.generation.lock();
        *generation += 1;
        self.inner.state.send_if_modified(|state| {
            if state.is_pending() {
                *state = PreviewState::Empty;
                true
            } else {
                false
            }
        });
    }

    /// Wait until no request is pending and return the state
    pub async fn settled(&self) -> PreviewState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|s| !s.is_pending()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }
}
