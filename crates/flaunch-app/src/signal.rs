//! App-started signal
//!
//! A single-fire, write-once handoff between the running session and the
//! supervisor: exactly one write is allowed (later fires are no-ops), any
//! number of observers may read or wait. Observers must tolerate the signal
//! never firing — the supervisor's wait is bounded by the session's run call
//! returning, never by this signal.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::watch;

/// Write-once "the app is now runnable" signal carrying its fire timestamp
#[derive(Debug, Clone)]
pub struct AppStartedSignal {
    inner: Arc<watch::Sender<Option<DateTime<Local>>>>,
}

impl Default for AppStartedSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStartedSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Record the started timestamp, exactly once.
    ///
    /// Returns true if this call was the one that fired the signal; later
    /// calls leave the original timestamp untouched and return false.
    pub fn fire(&self) -> bool {
        self.inner.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(Local::now());
                true
            } else {
                false
            }
        })
    }

    /// Timestamp of the single fire, if it has happened
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        *self.inner.borrow()
    }

    /// New observer for the signal
    pub fn subscribe(&self) -> watch::Receiver<Option<DateTime<Local>>> {
        self.inner.subscribe()
    }

    /// Wait until the signal fires, returning the fire timestamp.
    ///
    /// Pends forever if the producer path is never reached; callers that need
    /// a bound must race this against something else.
    pub async fn wait(&self) -> DateTime<Local> {
        let mut rx = self.subscribe();
        let value = rx
            .wait_for(|slot| slot.is_some())
            .await
            .expect("signal sender held by self");
        value.expect("wait_for guarantees a fired signal")
    }
}
