//! Persistence bridge between the session clock and a [`Storage`].
//!
//! Loads the last saved snapshot on start-up, reconciles it against the
//! wall clock, and saves snapshots after every mutation. Storage failures
//! never reach the caller: a failed load yields the default clock and a
//! failed save is logged and dropped.

use chrono::{DateTime, Utc};
use pomo_core::clock::{Reconciliation, SessionClock};
use pomo_core::error::Result;
use pomo_core::models::{ClockConfig, ClockSnapshot, STATE_KEY};
use tracing::{debug, info, warn};

use crate::storage::Storage;

/// A clock rebuilt from storage together with what reconciliation did.
#[derive(Debug, Clone)]
pub struct Restored {
    pub clock: SessionClock,
    pub reconciliation: Reconciliation,
}

/// Saves and restores [`ClockSnapshot`]s under a single storage key.
pub struct PersistenceBridge<S> {
    storage: S,
    key: String,
}

impl<S: Storage> PersistenceBridge<S> {
    /// Bridge using the standard `pomodoroState` key.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STATE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // ── Load ──────────────────────────────────────────────────────────────

    /// Read the stored snapshot, surfacing storage and decode errors.
    pub async fn try_load(&self) -> Result<Option<ClockSnapshot>> {
        match self.storage.get(&self.key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Read the stored snapshot; any failure counts as "nothing stored".
    pub async fn load(&self) -> Option<ClockSnapshot> {
        match self.try_load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, key = %self.key, "failed to load clock state; using defaults");
                None
            }
        }
    }

    /// Rebuild the clock and account for time spent while the process was
    /// down. At most one phase transition is applied.
    pub async fn restore(&self, config: ClockConfig, now: DateTime<Utc>) -> Restored {
        let mut clock = match self.load().await {
            Some(snapshot) => SessionClock::from_snapshot(config, &snapshot),
            None => {
                debug!("no stored clock state; starting fresh");
                SessionClock::new(config)
            }
        };

        let reconciliation = clock.reconcile(now);
        match reconciliation {
            Reconciliation::Idle => {}
            Reconciliation::Resumed { elapsed_secs } => {
                info!(elapsed_secs, remaining = clock.remaining(), "resuming running phase");
            }
            Reconciliation::FastForwarded(t) => {
                info!(from = %t.from, to = %t.to, "phase ended while away; fast-forwarded");
            }
        }

        Restored {
            clock,
            reconciliation,
        }
    }

    // ── Save ──────────────────────────────────────────────────────────────

    /// Write `snapshot`, surfacing storage errors.
    pub async fn try_save(&self, snapshot: &ClockSnapshot) -> Result<()> {
        let value = serde_json::to_value(snapshot)?;
        self.storage.set(&self.key, value).await
    }

    /// Write `snapshot`; failures are logged and not retried.
    pub async fn save(&self, snapshot: &ClockSnapshot) {
        if let Err(e) = self.try_save(snapshot).await {
            warn!(error = %e, key = %self.key, "failed to save clock state");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use pomo_core::error::PomoError;
    use pomo_core::models::Phase;
    use serde_json::{json, Value};

    // ── helpers ───────────────────────────────────────────────────────────────

    struct BrokenStore;

    impl Storage for BrokenStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            Err(PomoError::StorageRead {
                key: key.to_string(),
                reason: "unavailable".to_string(),
            })
        }

        async fn set(&self, key: &str, _value: Value) -> Result<()> {
            Err(PomoError::StorageWrite {
                key: key.to_string(),
                reason: "unavailable".to_string(),
            })
        }
    }

    fn bridge_with(value: Value) -> PersistenceBridge<MemoryStore> {
        let store = MemoryStore::new();
        store.insert(STATE_KEY, value);
        PersistenceBridge::new(store)
    }

    // ── load ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let bridge = PersistenceBridge::new(MemoryStore::new());
        assert!(bridge.load().await.is_none());
    }

    #[tokio::test]
    async fn test_load_undecodable_value_is_none() {
        let bridge = bridge_with(json!("not a snapshot"));
        assert!(bridge.try_load().await.is_err());
        assert!(bridge.load().await.is_none());
    }

    #[tokio::test]
    async fn test_load_storage_failure_is_none() {
        let bridge = PersistenceBridge::new(BrokenStore);
        assert!(bridge.load().await.is_none());
    }

    // ── save ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_save_writes_camel_case_snapshot() {
        let bridge = PersistenceBridge::new(MemoryStore::new());
        let snapshot = ClockSnapshot {
            remaining: 1234,
            completed_count: 2,
            ..ClockSnapshot::default()
        };
        bridge.save(&snapshot).await;

        let stored = bridge.storage().peek(STATE_KEY).unwrap();
        assert_eq!(stored["remaining"], 1234);
        assert_eq!(stored["completedCount"], 2);
        assert_eq!(bridge.load().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let bridge = PersistenceBridge::new(BrokenStore);
        assert!(bridge.try_save(&ClockSnapshot::default()).await.is_err());
        // Must not panic.
        bridge.save(&ClockSnapshot::default()).await;
    }

    #[tokio::test]
    async fn test_custom_key() {
        let bridge = PersistenceBridge::with_key(MemoryStore::new(), "other");
        bridge.save(&ClockSnapshot::default()).await;
        assert_eq!(bridge.key(), "other");
        assert!(bridge.storage().peek("other").is_some());
        assert!(bridge.storage().peek(STATE_KEY).is_none());
    }

    // ── restore ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_restore_defaults_when_nothing_stored() {
        let bridge = PersistenceBridge::new(MemoryStore::new());
        let restored = bridge.restore(ClockConfig::default(), Utc::now()).await;
        assert_eq!(restored.reconciliation, Reconciliation::Idle);
        assert_eq!(restored.clock.snapshot(), ClockSnapshot::default());
    }

    #[tokio::test]
    async fn test_restore_defaults_when_storage_broken() {
        let bridge = PersistenceBridge::new(BrokenStore);
        let restored = bridge.restore(ClockConfig::default(), Utc::now()).await;
        assert_eq!(restored.clock.remaining(), 1500);
        assert_eq!(restored.clock.cycle_index(), 1);
    }

    #[tokio::test]
    async fn test_restore_paused_state_is_kept() {
        let bridge = bridge_with(json!({
            "remaining": 200,
            "running": false,
            "isWorkPhase": false,
            "cycleIndex": 3,
            "completedCount": 3
        }));
        let restored = bridge.restore(ClockConfig::default(), Utc::now()).await;
        assert_eq!(restored.reconciliation, Reconciliation::Idle);
        assert_eq!(restored.clock.remaining(), 200);
        assert_eq!(restored.clock.phase(), Phase::ShortBreak);
        assert_eq!(restored.clock.completed_count(), 3);
    }

    #[tokio::test]
    async fn test_restore_running_resumes() {
        let now = Utc::now();
        let snapshot = ClockSnapshot {
            remaining: 600,
            running: true,
            started_at_epoch: Some(now - Duration::seconds(100)),
            ..ClockSnapshot::default()
        };
        let bridge = bridge_with(serde_json::to_value(&snapshot).unwrap());

        let restored = bridge.restore(ClockConfig::default(), now).await;
        assert!(matches!(
            restored.reconciliation,
            Reconciliation::Resumed { elapsed_secs: 100 }
        ));
        assert_eq!(restored.clock.remaining(), 500);
        assert!(restored.clock.is_running());
    }

    #[tokio::test]
    async fn test_restore_overdue_completes_once() {
        let now = Utc::now();
        let snapshot = ClockSnapshot {
            remaining: 10,
            running: true,
            started_at_epoch: Some(now - Duration::seconds(15)),
            ..ClockSnapshot::default()
        };
        let bridge = bridge_with(serde_json::to_value(&snapshot).unwrap());

        let restored = bridge.restore(ClockConfig::default(), now).await;
        assert!(matches!(
            restored.reconciliation,
            Reconciliation::FastForwarded(_)
        ));
        assert_eq!(restored.clock.completed_count(), 1);
        assert_eq!(restored.clock.cycle_index(), 1);
        assert!(!restored.clock.is_work_phase());
        assert_eq!(restored.clock.remaining(), 300);
        assert!(!restored.clock.is_running());
    }
}
