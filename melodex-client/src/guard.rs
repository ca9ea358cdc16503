//! Per-item action guard
//!
//! At most one add/remove per catalog item may be in flight. The guard is
//! released when the returned [`ActionGuard`] drops, including on early
//! return or error.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Set of catalog item ids with an action in flight
#[derive(Debug, Default)]
pub struct InFlight {
    keys: Mutex<HashSet<String>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if it is already claimed
    pub fn try_acquire(&self, key: &str) -> Option<ActionGuard<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(ActionGuard {
            owner: self,
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Claim on one catalog item, released on drop
#[derive(Debug)]
pub struct ActionGuard<'a> {
    owner: &'a InFlight,
    key: String,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_rejected_until_release() {
        let in_flight = InFlight::new();

        let guard = in_flight.try_acquire("T1").expect("first claim");
        assert!(in_flight.contains("T1"));
        assert!(in_flight.try_acquire("T1").is_none());

        drop(guard);
        assert!(!in_flight.contains("T1"));
        assert!(in_flight.try_acquire("T1").is_some());
    }

    #[test]
    fn test_independent_keys() {
        let in_flight = InFlight::new();

        let _a = in_flight.try_acquire("T1").unwrap();
        let _b = in_flight.try_acquire("T2").unwrap();

        assert!(in_flight.contains("T1"));
        assert!(in_flight.contains("T2"));
    }
}
