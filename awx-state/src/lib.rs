//! AWX State Management
//!
//! Persists what the harness knows about each managed resource: its AWX
//! identifier and the attributes last read back from AWX.
//!
//! - **StateFile**: the state document (version, serial, lineage, resources)
//! - **StateBackend**: storage trait; `local` is the only backend
//!
//! # Example
//!
//! ```ignore
//! use awx_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::local("awx.state.json"))?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... upsert resources ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use state::{ResourceState, StateFile};
