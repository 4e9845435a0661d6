use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Registry size at which idle locks are dropped before a new key is added.
const PRUNE_AT: usize = 1024;

/// Lazily created lock per key, so work on one requisition or interviewer never blocks another.
///
/// A lock nobody holds a handle to is idle and may be pruned; the next `lock_for` on that key
/// creates a fresh one.
pub struct KeyedLocks<K, L> {
    locks: Mutex<HashMap<K, Arc<L>>>,
}

impl<K, L> KeyedLocks<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the lock guarding `key`; the same key always yields the same lock.
    pub fn lock_for(&self, key: &K) -> Arc<L> {
        let mut locks = self.locks.lock().expect("keyed lock registry poisoned");
        if locks.len() >= PRUNE_AT && !locks.contains_key(key) {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().expect("keyed lock registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, L> Default for KeyedLocks<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, L> fmt::Debug for KeyedLocks<K, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_shares_a_lock() {
        let locks: KeyedLocks<String, Mutex<()>> = KeyedLocks::new();
        let first = locks.lock_for(&"req-1".to_string());
        let second = locks.lock_for(&"req-1".to_string());
        let other = locks.lock_for(&"req-2".to_string());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn idle_locks_are_pruned_once_the_registry_fills() {
        let locks: KeyedLocks<usize, Mutex<()>> = KeyedLocks::new();
        let held = locks.lock_for(&0);
        for key in 1..PRUNE_AT {
            locks.lock_for(&key);
        }
        assert_eq!(locks.len(), PRUNE_AT);

        let fresh = locks.lock_for(&PRUNE_AT);

        assert_eq!(locks.len(), 2);
        assert!(Arc::ptr_eq(&held, &locks.lock_for(&0)));
        assert!(Arc::ptr_eq(&fresh, &locks.lock_for(&PRUNE_AT)));
    }
}
