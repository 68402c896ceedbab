//! # Mailbox
//!
//! A single slot, latest-value transfer between the command source and the arm control loop.
//!
//! Publishing never blocks and always replaces any value the consumer hasn't taken yet, so the
//! consumer only ever sees the freshest command. Stale commands are dropped, never queued.
//!
//! The mailbox is split into a cloneable [`Publisher`] and a single [`Receiver`]. The receiver is
//! not `Clone` and taking requires `&mut self`, so there is exactly one consumer.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use parking_lot::{Condvar, Mutex};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

struct Shared<T> {
    /// The unconsumed value, `None` when the mailbox is empty
    slot: Mutex<Option<T>>,

    /// Signalled on every publish
    available: Condvar,
}

/// Producer half of a mailbox.
pub struct Publisher<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half of a mailbox.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new, empty mailbox.
pub fn mailbox<T>() -> (Publisher<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(None),
        available: Condvar::new(),
    });

    (
        Publisher {
            shared: shared.clone(),
        },
        Receiver { shared },
    )
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> Publisher<T> {
    /// Store `value` in the mailbox, replacing any value which hasn't been taken yet.
    ///
    /// Returns the superseded value, if there was one. A consumer blocked in
    /// [`Receiver::take_wait`] is woken.
    pub fn publish(&self, value: T) -> Option<T> {
        let superseded = self.shared.slot.lock().replace(value);
        self.shared.available.notify_one();
        superseded
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Receiver<T> {
    /// Block until a value is available or `timeout` elapses.
    ///
    /// On success the value is removed from the mailbox, so it is never observed twice. `None`
    /// means the timeout elapsed with nothing published. A timeout too large to be represented as
    /// a deadline waits without one.
    pub fn take_wait(&mut self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.shared.slot.lock();

        loop {
            if let Some(value) = slot.take() {
                return Some(value);
            }

            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .available
                        .wait_until(&mut slot, deadline)
                        .timed_out()
                    {
                        // A publish may have raced the timeout
                        return slot.take();
                    }
                }
                None => self.shared.available.wait(&mut slot),
            }
        }
    }

    /// Take the value if there is one, without blocking.
    pub fn try_take(&mut self) -> Option<T> {
        self.shared.slot.lock().take()
    }

    /// Returns `true` if a value is waiting to be taken.
    pub fn has_value(&self) -> bool {
        self.shared.slot.lock().is_some()
    }
}
