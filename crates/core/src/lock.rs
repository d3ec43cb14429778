//! Interaction lock - gates new drags while a gravity pass is in progress
//!
//! Owned by [`crate::game::Game`] and lent to the gravity resolver (which
//! acquires it) and the input controller (which only reads it).

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InteractionLock {
    held: bool,
    acquisitions: u32,
}

impl InteractionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock; false if it is already held
    pub fn acquire(&mut self) -> bool {
        if self.held {
            return false;
        }
        self.held = true;
        self.acquisitions += 1;
        debug!(acquisitions = self.acquisitions, "interaction lock acquired");
        true
    }

    /// Release the lock; releasing a free lock is a no-op
    pub fn release(&mut self) {
        if self.held {
            debug!("interaction lock released");
        }
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Number of successful acquisitions since creation
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_rejects_second_holder() {
        let mut lock = InteractionLock::new();
        assert!(lock.acquire());
        assert!(!lock.acquire());
        assert!(lock.is_held());
        assert_eq!(lock.acquisitions(), 1);

        lock.release();
        assert!(!lock.is_held());
        assert!(lock.acquire());
        assert_eq!(lock.acquisitions(), 2);
    }

    #[test]
    fn test_release_when_free_is_noop() {
        let mut lock = InteractionLock::new();
        lock.release();
        assert!(!lock.is_held());
    }
}
