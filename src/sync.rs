// SPDX-License-Identifier: GPL-3.0-only

//! Stop signals and single-occupancy slots shared by capture and preview

use crate::errors::{ThetaError, ThetaResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// One-shot stop request that can be polled or awaited
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; later calls have no further effect
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once [`stop`](Self::stop) has been called
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Slot holding at most one active operation
#[derive(Debug)]
pub(crate) struct Slot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: Clone> Slot<T> {
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Occupy the slot, or fail with a `StateError` naming `what`
    pub fn claim(&self, value: T, what: &str) -> ThetaResult<SlotGuard<T>> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(ThetaError::State(format!("{} already active", what)));
        }
        *slot = Some(value);
        Ok(SlotGuard {
            slot: self.clone(),
        })
    }

    pub fn current(&self) -> Option<T> {
        self.lock().clone()
    }

    pub fn is_occupied(&self) -> bool {
        self.lock().is_some()
    }
}

/// Frees its slot when dropped
#[derive(Debug)]
pub(crate) struct SlotGuard<T: Clone> {
    slot: Slot<T>,
}

impl<T: Clone> Drop for SlotGuard<T> {
    fn drop(&mut self) {
        self.slot.lock().take();
    }
}
