//! Resolve-by-name / create-if-absent primitive
//!
//! Every named remote resource is reconciled the same way: look it up by its
//! natural key, and create it only when the lookup comes back empty.

use crate::error::{Result, SyncError};
use invsync_directory::{DirectoryError, ResourceKind};
use std::future::Future;
use tracing::{debug, info};

/// A resource that was found or created
#[derive(Debug, Clone, PartialEq)]
pub struct Ensured<T> {
    pub resource: T,
    pub created: bool,
}

/// Return the resource named `name`, creating it when `lookup` finds nothing.
pub async fn ensure<T, L, LF, C, CF>(
    kind: ResourceKind,
    name: &str,
    lookup: L,
    create: C,
) -> Result<Ensured<T>>
where
    L: FnOnce() -> LF,
    LF: Future<Output = std::result::Result<Option<T>, DirectoryError>>,
    C: FnOnce() -> CF,
    CF: Future<Output = std::result::Result<T, DirectoryError>>,
{
    if let Some(resource) = lookup()
        .await
        .map_err(|e| SyncError::remote("look up", kind, name, e))?
    {
        debug!(%kind, resource = name, "found existing resource");
        return Ok(Ensured {
            resource,
            created: false,
        });
    }

    let resource = create()
        .await
        .map_err(|e| SyncError::remote("create", kind, name, e))?;
    info!(%kind, resource = name, "created resource");

    Ok(Ensured {
        resource,
        created: true,
    })
}

/// Lookup-only variant of [`ensure`] for resources that are never created
pub async fn resolve<T, L, LF>(kind: ResourceKind, name: &str, lookup: L) -> Result<T>
where
    L: FnOnce() -> LF,
    LF: Future<Output = std::result::Result<Option<T>, DirectoryError>>,
{
    lookup()
        .await
        .map_err(|e| SyncError::remote("look up", kind, name, e))?
        .ok_or_else(|| SyncError::NotFound {
            kind,
            name: name.to_string(),
        })
}

/// Turn a `NotFound` failure into `Ok(None)`
pub fn optional<T>(
    result: std::result::Result<T, DirectoryError>,
) -> std::result::Result<Option<T>, DirectoryError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
