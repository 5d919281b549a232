//! Report Template Builder CLI (`rtb`)
//!
//! Library half of the binary so the command logic is testable:
//! - **commands**: validate a template file, print the operator table,
//!   list prebuilt templates
//! - **simulator**: replay an editing burst against the in-memory repository
//!   and check the autosave rules
//! - **logging**: `tracing-subscriber` setup
//!
//! # Quick Start
//!
//! ```text
//! rtb validate report.json --json
//! rtb operators --type date
//! rtb simulate --edits 20 --interval-ms 150 --debounce-ms 500
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod logging;
pub mod simulator;

pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
