//! Autosave simulator
//!
//! Drives an [`EditorSession`] through a scripted burst of edits against the
//! in-memory repository and reports how the debounce and single-flight rules
//! played out:
//! - saves issued versus edits made
//! - highest number of overlapping save requests (must stay at 1)
//! - final save status and error, if any

use rtb_model::{TemplateId, VisualizationKind};
use rtb_session::adapters::{MemoryTemplateRepository, StaticFieldCatalog, SyntheticQueryExecutor};
use rtb_session::{
    Collaborators, EditorSession, PersistenceError, SaveStatus, SessionConfig, SessionResult,
};
use rtb_template::{sample_catalog, MetadataPatch, VisualizationPatch};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Prebuilt template the simulation edits
pub const SIMULATED_TEMPLATE: &str = "sales-by-region";

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of edits to make
    pub edits: u32,
    /// Pause between edits
    pub interval: Duration,
    /// Repository latency per save
    pub save_latency: Duration,
    /// Session settings (debounce, autosave, author)
    pub session: SessionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            edits: 10,
            interval: Duration::from_millis(200),
            save_latency: Duration::from_millis(300),
            session: SessionConfig::default(),
        }
    }
}

/// Outcome of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    /// Template id assigned by the initial manual save
    pub template_id: TemplateId,
    /// Edits made after the initial save
    pub edits: u32,
    /// Saves triggered by the edits (excluding the initial save)
    pub autosaves: usize,
    /// Highest number of concurrently running saves
    pub max_in_flight: usize,
    /// Status after settling
    pub final_status: SaveStatus,
    /// Last save error, if any
    pub final_error: Option<String>,
    /// Name stored in the repository at the end
    pub stored_name: String,
    /// Wall-clock duration
    pub elapsed_ms: u64,
}

impl SimulatorReport {
    /// Check the single-flight and convergence rules held
    #[must_use]
    pub fn passed(&self) -> bool {
        self.max_in_flight <= 1
            && self.final_error.is_none()
            && self.final_status == SaveStatus::Idle
    }

    /// Plain-text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        format!(
            "Autosave Simulation\n\
             ===================\n\
             Template:       {}\n\
             Edits:          {}\n\
             Autosaves:      {}\n\
             Max in flight:  {}\n\
             Final status:   {}\n\
             Final error:    {}\n\
             Stored name:    {}\n\
             Elapsed:        {} ms\n\
             Result:         {}\n",
            self.template_id,
            self.edits,
            self.autosaves,
            self.max_in_flight,
            self.final_status,
            self.final_error.as_deref().unwrap_or("-"),
            self.stored_name,
            self.elapsed_ms,
            if self.passed() { "PASSED" } else { "FAILED" },
        )
    }
}

/// Apply the `i`-th scripted edit
fn scripted_edit(session: &EditorSession, i: u32) {
    match i % 4 {
        0 => {
            session.update_metadata(MetadataPatch::new().with_name(format!("Regional sales #{i}")));
        }
        1 => {
            session.reorder_fields(0, 1);
        }
        2 => {
            session
                .update_visualization(VisualizationPatch::new().with_title(format!("Draft {i}")));
        }
        _ => {
            session.set_visualization(VisualizationKind::Table);
            session.set_visualization(VisualizationKind::Bar);
            session.update_visualization(VisualizationPatch::new().with_axes("region", "revenue"));
        }
    }
    debug!(edit = i, revision = session.revision(), "edit applied");
}

/// Run one simulation
///
/// # Errors
/// Session setup failures; save failures during the run are reported in
/// [`SimulatorReport::final_error`] instead.
pub async fn run_simulator(config: SimulatorConfig) -> SessionResult<SimulatorReport> {
    let repository = Arc::new(MemoryTemplateRepository::new().with_latency(config.save_latency));
    let collaborators = Collaborators::new(
        Arc::new(StaticFieldCatalog::new(sample_catalog())),
        repository.clone(),
        Arc::new(SyntheticQueryExecutor::default()),
    );
    let session = EditorSession::create(collaborators, config.session.clone())?;
    session.refresh_catalog().await?;
    session.load_prebuilt(SIMULATED_TEMPLATE)?;

    let started = Instant::now();
    let receipt = session.save_now().await?;
    info!(id = %receipt.id, edits = config.edits, "simulation started");

    for i in 0..config.edits {
        scripted_edit(&session, i);
        tokio::time::sleep(config.interval).await;
    }
    session.settled().await;

    let stored_name = repository
        .stored(&receipt.id)
        .map(|t| t.name)
        .ok_or_else(|| PersistenceError::NotFound(receipt.id.clone()))?;

    let report = SimulatorReport {
        template_id: receipt.id,
        edits: config.edits,
        autosaves: repository.save_count().saturating_sub(1),
        max_in_flight: repository.max_in_flight(),
        final_status: session.save_status(),
        final_error: session.last_save_error().map(|e| e.to_string()),
        stored_name,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(autosaves = report.autosaves, passed = report.passed(), "simulation finished");
    Ok(report)
}
