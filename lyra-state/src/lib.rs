//! Lyra State Management
//!
//! Persists the identifier and attributes of every resource the `lyra` CLI
//! manages, so later commands can read, update or delete them.
//!
//! - **StateFile**: all tracked resources plus serial and lineage
//! - **StateBackend**: storage with locking for exclusive access
//! - **LockInfo**: who holds the lock and until when
//!
//! # Example
//!
//! ```ignore
//! use lyra_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("lyra.state.json")).await?;
//! let lock = backend.acquire_lock("create", "ecs_capacity_provider.cp").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... record resources ...
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::create_backend;
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
