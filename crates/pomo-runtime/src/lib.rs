//! Runtime layer for pomo.
//!
//! Owns the live session clock in a tokio task, drives its one-second tick,
//! persists every change and hands out [`ClockHandle`]s to observers.

pub mod observer;
pub mod service;
pub mod ticker;

pub use observer::{spawn_indicator, ClockHandle};
pub use pomo_core as core;
pub use pomo_store as store;
pub use service::{ClockService, ServiceHandle};
