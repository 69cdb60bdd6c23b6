//! State backend trait and error types

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

/// Errors that can occur when interacting with a state backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Another command holds the lock; `None` when its lock file could not be read yet
    #[error("State is locked: {}", lock_holder(.0))]
    Locked(Option<Box<LockInfo>>),

    #[error("Lock {0} is no longer held")]
    LockNotFound(String),

    #[error("Lock is held by {actual}, not {expected}")]
    LockMismatch { expected: String, actual: String },

    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Invalid state file: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn lock_holder(holder: &Option<Box<LockInfo>>) -> String {
    match holder {
        Some(lock) => lock.to_string(),
        None => "held by another process".to_string(),
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage for the state file, with locking for exclusive access
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current state; `None` if nothing was written yet
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Write the state; increment its serial first
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Lock the state for `operation` on `target`; fails while another
    /// unexpired lock is held
    async fn acquire_lock(&self, operation: &str, target: &str) -> BackendResult<LockInfo>;

    /// Release a lock acquired by this process
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;
}

/// Configuration for a state backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend type; only "local" is available
    pub backend_type: String,
    pub path: Option<PathBuf>,
}

impl BackendConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            backend_type: "local".to_string(),
            path: Some(path.into()),
        }
    }
}
