//! In-process guard against two dispatches of the same fingerprint running
//! concurrently.
//!
//! This only covers dispatches sharing one [`SingleFlight`]. Separate processes
//! can still interleave between cancellation and trigger.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use buildgate_core::TaskFingerprint;

/// Set of fingerprints currently being dispatched.
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: Mutex<HashSet<TaskFingerprint>>,
}

impl SingleFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim a fingerprint. Returns `None` if another dispatch holds it.
    ///
    /// The claim is released when the returned guard is dropped.
    pub fn try_acquire(self: &Arc<Self>, fingerprint: &TaskFingerprint) -> Option<FlightGuard> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(fingerprint.clone()) {
            return None;
        }
        Some(FlightGuard {
            owner: Arc::clone(self),
            fingerprint: fingerprint.clone(),
        })
    }

    /// Returns true if the fingerprint is currently claimed.
    pub fn is_in_flight(&self, fingerprint: &TaskFingerprint) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(fingerprint)
    }
}

/// Claim on one fingerprint, released on drop.
#[derive(Debug)]
pub struct FlightGuard {
    owner: Arc<SingleFlight>,
    fingerprint: TaskFingerprint,
}

impl FlightGuard {
    pub fn fingerprint(&self) -> &TaskFingerprint {
        &self.fingerprint
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.owner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.fingerprint);
    }
}
