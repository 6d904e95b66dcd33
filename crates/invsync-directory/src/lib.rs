//! invsync Directory Service
//!
//! This crate defines the capability surface that invsync consumes from a
//! remote automation platform (AWX / Ansible Tower style). The reconciliation
//! core only talks to the platform through [`DirectoryClient`]; transports,
//! authentication and wire formats live in the implementing crates.
//!
//! # Implementations
//!
//! - **AWX REST API**: `invsync-awx` (reqwest)
//! - **In-memory**: [`memory::InMemoryDirectory`], used by tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  invsync CLI                     │
//! │              (invsync run/teardown)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                invsync-core                      │
//! │  reconcile → launch → wait        teardown       │
//! └─────────────────┬───────────────────────────────┘
//!                   │  Arc<dyn DirectoryClient>
//! ┌─────────────────▼───────────────────────────────┐
//! │              invsync-directory                   │
//! │  trait DirectoryClient { ... }                   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  invsync-awx  │ │   in-memory   │
//! └───────────────┘ └───────────────┘
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod model;
pub mod request;

// Re-exports
pub use client::DirectoryClient;
pub use error::{DirectoryError, Result};
pub use memory::{Call, InMemoryDirectory, Operation};
pub use model::{
    Group, Host, Inventory, Job, JobStatus, JobTemplate, Organization, ResourceKind, Variables,
};
pub use request::{
    AddHostToGroup, CreateGroup, CreateHost, CreateInventory, LaunchJob, ListFilter, UpdateHost,
};
pub use tokio_util::sync::CancellationToken;
