//! Bound on concurrent connection handlers.
//!
//! The accept loop takes a permit before spawning a handler thread; at the
//! limit it waits for one to free instead of spawning. A limit of 0
//! disables the bound.

use std::sync::{Arc, Condvar, Mutex};

pub struct ConnectionGate {
    limit: usize,
    active: Mutex<usize>,
    released: Condvar,
}

impl ConnectionGate {
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit,
            active: Mutex::new(0),
            released: Condvar::new(),
        })
    }

    /// Take a permit, waiting while the gate is at its limit
    pub fn acquire(self: &Arc<Self>) -> GatePermit {
        let mut active = self.active.lock().unwrap();
        if self.limit > 0 {
            while *active >= self.limit {
                active = self.released.wait(active).unwrap();
            }
        }
        *active += 1;
        GatePermit {
            gate: Arc::clone(self),
        }
    }

    /// Number of permits currently held
    pub fn active(&self) -> usize {
        *self.active.lock().unwrap()
    }
}

/// Held by a handler thread for its lifetime; releases the slot on drop
pub struct GatePermit {
    gate: Arc<ConnectionGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let mut active = self.gate.active.lock().unwrap();
        *active -= 1;
        self.gate.released.notify_one();
    }
}
