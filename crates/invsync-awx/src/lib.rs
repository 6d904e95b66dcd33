//! AWX / Ansible Tower Directory Service
//!
//! Implements [`DirectoryClient`](invsync_directory::DirectoryClient) on top
//! of the AWX REST API (`/api/v2`).
//!
//! - Token (Bearer) or basic authentication
//! - List endpoints are followed through every `next` page
//! - Host variables are written as JSON and read as JSON or YAML
//! - Deleting something that is already gone succeeds
//! - Every request is raced against the caller's cancellation token
//!
//! ```no_run
//! use invsync_awx::{Auth, AwxClient, AwxConfig};
//!
//! let config = AwxConfig::new("https://awx.example.com", Auth::Token("...".into()));
//! let client = AwxClient::new(config)?;
//! # Ok::<(), invsync_awx::AwxError>(())
//! ```

mod api;
pub mod client;
pub mod config;
mod directory;
pub mod error;
pub mod vars;

pub use client::AwxClient;
pub use config::{Auth, AwxConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::{AwxError, Result};
