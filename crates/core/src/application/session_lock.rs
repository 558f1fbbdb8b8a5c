// Per-session mutual exclusion
// History reads, execution and append are read-modify-write on one session

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::SessionKey;

type LockMap = HashMap<SessionKey, Arc<AsyncMutex<()>>>;

/// Serializes calls addressed to the same session
///
/// Entries live only while a call holds or waits for them.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<LockMap>,
}

/// Exclusive access to one session; the map entry is pruned on drop when
/// nobody else is waiting
pub struct SessionGuard<'a> {
    locks: &'a Mutex<LockMap>,
    key: SessionKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn acquire(&self, key: SessionKey) -> SessionGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        SessionGuard {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Sessions currently held or awaited
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // Release first so the guard's own reference is gone
        drop(self.guard.take());

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under this map lock, so a count of 1 means no waiters
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_session_is_exclusive() {
        let locks = Arc::new(SessionLocks::new());
        let guard = locks.acquire(SessionKey::new("python", 1)).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(SessionKey::new("python", 1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        // Contender still holds a reference, so the entry survives
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_released_sessions_are_pruned() {
        let locks = SessionLocks::new();

        for id in 0..100 {
            let _guard = locks.acquire(SessionKey::new("python", id)).await;
            assert_eq!(locks.len(), 1);
        }

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(SessionKey::new("python", 1)).await;
        let b = tokio::time::timeout(
            Duration::from_millis(200),
            locks.acquire(SessionKey::new("python", 2)),
        )
        .await;
        assert!(b.is_ok());
    }
}
