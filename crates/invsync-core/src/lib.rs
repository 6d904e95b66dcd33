//! invsync core
//!
//! Converges a remote inventory towards a declared host/group set, launches a
//! job template against it and waits for the job to finish. Also tears
//! inventories down again.
//!
//! All remote access goes through an injected
//! [`DirectoryClient`](invsync_directory::DirectoryClient).
//!
//! ```no_run
//! use invsync_core::{DesiredHost, DesiredState, Runner, RunnerConfig};
//! use invsync_directory::{CancellationToken, InMemoryDirectory};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> invsync_core::Result<()> {
//! let client = Arc::new(InMemoryDirectory::new());
//! let runner = Runner::new(client, RunnerConfig::default());
//!
//! let state = DesiredState::new("lab", "deploy-web", Duration::from_secs(600))
//!     .with_host(DesiredHost::new("a.example.com").in_group("web"));
//!
//! let outcome = runner.run(&state, &CancellationToken::new()).await?;
//! println!("job {} finished: {}", outcome.job.id, outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod ensure;
pub mod error;
pub mod launch;
pub mod model;
pub mod parser;
pub mod reconcile;
pub mod runner;
pub mod teardown;
pub mod wait;

pub use ensure::{Ensured, ensure, optional, resolve};
pub use error::{Result, RunFileError, SyncError};
pub use launch::{JobLauncher, launch_request};
pub use model::{DesiredHost, DesiredState};
pub use parser::{DEFAULT_RUN_TIMEOUT, parse_run, parse_run_file};
pub use reconcile::{InventoryReconciler, ReconcileReport, ReconcileWarning, Reconciliation};
pub use runner::{DEFAULT_ORGANIZATION, RunOutcome, Runner, RunnerConfig};
pub use teardown::{TeardownController, TeardownReport};
pub use wait::{DEFAULT_POLL_INTERVAL, JobWaiter};
