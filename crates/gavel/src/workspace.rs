//! Per-submission workspace lifecycle
//!
//! Every judging call gets its own uniquely named directory holding the
//! source file and any compiled artifact. The directory is removed when the
//! call finishes, whichever way it finishes.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Attempts at finding an unused directory name before giving up
const CREATE_ATTEMPTS: u32 = 4;

/// Errors that occur while managing workspaces
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace at {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove workspace at {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("workspace manager is shut down")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// An exclusively owned scratch directory for one submission
///
/// # Cleanup
///
/// Call [`release()`](Self::release) once judging is done. Dropping an
/// unreleased workspace logs a warning and removes the directory
/// synchronously as a fallback, so the directory never outlives its owner.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,

    /// Whether the directory still exists on disk
    active: bool,

    /// Concurrency permit (if acquired from a manager)
    _permit: Option<OwnedSemaphorePermit>,
}

impl Workspace {
    /// Create a workspace with a fresh unique directory under `root`
    #[instrument]
    pub async fn create(root: &Path) -> Result<Self, WorkspaceError> {
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: root.to_path_buf(),
                source,
            })?;

        let mut attempt = 0;
        loop {
            let path = root.join(unique_name());
            // create_dir (not create_dir_all) fails if the name is taken,
            // so a successful call means we own the directory
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(?path, "workspace created");
                    return Ok(Self {
                        path,
                        active: true,
                        _permit: None,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < CREATE_ATTEMPTS => {
                    attempt += 1;
                    debug!(?path, attempt, "workspace name taken, retrying");
                }
                Err(source) => return Err(WorkspaceError::Create { path, source }),
            }
        }
    }

    /// Path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the host path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if name.is_empty() || name.contains("..") || Path::new(name).is_absolute() {
            return Err(WorkspaceError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.path.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let path = self.file_path(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Read a file from the workspace
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove the workspace directory and everything in it
    ///
    /// Releasing twice is a no-op.
    #[must_use = "cleanup errors should be handled"]
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn release(&mut self) -> Result<(), WorkspaceError> {
        if !self.active {
            return Ok(());
        }
        // Marked inactive up front so a failed removal is not retried from Drop
        self.active = false;

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!("workspace removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Check if the workspace has not been released yet
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Attach a concurrency permit to this workspace
    pub(crate) fn with_permit(mut self, permit: OwnedSemaphorePermit) -> Self {
        self._permit = Some(permit);
        self
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.active {
            warn!(
                path = %self.path.display(),
                "Workspace dropped without release, removing synchronously"
            );
            if let Err(e) = std::fs::remove_dir_all(&self.path)
                && e.kind() != io::ErrorKind::NotFound
            {
                warn!(path = %self.path.display(), error = %e, "fallback workspace removal failed");
            }
        }
    }
}

/// Hands out workspaces and bounds how many exist at the same time
#[derive(Debug)]
pub struct WorkspaceManager {
    root: PathBuf,

    /// Maximum number of live workspaces
    capacity: usize,

    semaphore: Arc<Semaphore>,
}

impl WorkspaceManager {
    /// Create a new manager rooted at `root`
    pub fn new(root: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            root: root.into(),
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Acquire a fresh workspace, waiting while the manager is at capacity
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<Workspace, WorkspaceError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkspaceError::Closed)?;

        let workspace = Workspace::create(&self.root).await?;
        Ok(workspace.with_permit(permit))
    }

    /// Root directory under which workspaces are created
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the number of workspaces that can be acquired without waiting
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the maximum number of concurrent workspaces
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// High-resolution timestamp plus a random component
fn unique_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("sub-{nanos}-{}", Uuid::new_v4().simple())
}
