//! Bounded pool of controller instances.
//!
//! Each bound action owns one pool. Instances are reset to the prototype on
//! checkout, so no field written during one request leaks into the next.
//! An instance must not be checked back in while work spawned from its
//! request still holds onto it.

use std::fmt;
use std::sync::{Mutex, PoisonError};

pub(crate) struct InstancePool<C> {
    prototype: C,
    idle: Mutex<Vec<C>>,
    capacity: usize,
}

impl<C: Clone> InstancePool<C> {
    pub(crate) fn new(prototype: C, capacity: usize) -> Self {
        Self {
            prototype,
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Take an instance holding the prototype's values.
    pub(crate) fn checkout(&self) -> C {
        let recycled = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match recycled {
            Some(mut instance) => {
                instance.clone_from(&self.prototype);
                instance
            }
            None => self.prototype.clone(),
        }
    }

    /// Return an instance. Dropped when the pool is full.
    pub(crate) fn checkin(&self, instance: C) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(instance);
        }
    }
}

impl<C> InstancePool<C> {
    /// Number of instances waiting for reuse.
    pub(crate) fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<C> fmt::Debug for InstancePool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstancePool")
            .field("capacity", &self.capacity)
            .field("idle", &self.idle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        hits: u32,
        label: String,
    }

    #[test]
    fn test_checkout_resets_to_prototype() {
        let pool = InstancePool::new(
            Counter {
                hits: 0,
                label: "proto".into(),
            },
            4,
        );

        let mut first = pool.checkout();
        first.hits = 7;
        first.label.push_str("-dirty");
        pool.checkin(first);
        assert_eq!(pool.idle(), 1);

        let second = pool.checkout();
        assert_eq!(second.hits, 0);
        assert_eq!(second.label, "proto");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = InstancePool::new(
            Counter {
                hits: 0,
                label: String::new(),
            },
            1,
        );
        let a = pool.checkout();
        let b = pool.checkout();
        pool.checkin(a);
        pool.checkin(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_concurrent_checkouts_start_clean() {
        let pool = InstancePool::new(
            Counter {
                hits: 0,
                label: "proto".into(),
            },
            2,
        );

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let pool = &pool;
                scope.spawn(move || {
                    for _ in 0..200 {
                        let mut instance = pool.checkout();
                        assert_eq!(instance.hits, 0);
                        assert_eq!(instance.label, "proto");
                        instance.hits = worker + 1;
                        instance.label = format!("worker-{}", worker);
                        pool.checkin(instance);
                    }
                });
            }
        });

        assert!(pool.idle() <= 2);
        assert_eq!(
            pool.checkout(),
            Counter {
                hits: 0,
                label: "proto".into(),
            }
        );
    }
}
