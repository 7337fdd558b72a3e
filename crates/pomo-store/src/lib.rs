//! Persistence layer for pomo.
//!
//! Provides the key-value storage collaborators and the bridge that saves
//! clock snapshots and restores them, reconciled, after a restart.

pub mod bridge;
pub mod storage;

pub use bridge::{PersistenceBridge, Restored};
pub use pomo_core as core;
pub use storage::{default_state_path, JsonFileStore, MemoryStore, Storage};
