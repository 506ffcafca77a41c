// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Shared between a one-shot source and whoever holds its playback handle. The source
/// checks `is_cancelled` from the audio callback and marks itself finished when it runs
/// out of frames; the holder can stop it or wait for it to end.
#[derive(Clone)]
pub struct CancelHandle {
    /// Set when the holder asks the source to stop.
    cancelled: Arc<AtomicBool>,
    /// Set by the source once its last frame has been rendered.
    finished: Arc<AtomicBool>,
    /// Guards the condvar below. The flags are atomics so polling them never locks.
    lock: Arc<Mutex<()>>,
    condvar: Arc<Condvar>,
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
            lock: Arc::new(Mutex::new(())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true if the source has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns true if the source has played out or been stopped.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire) || self.is_cancelled()
    }

    /// Asks the source to stop. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.notify();
        }
    }

    /// Marks the source as having rendered its last frame.
    pub fn finish(&self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            self.notify();
        }
    }

    /// Blocks until the source is finished or cancelled.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while !self.is_finished() {
            self.condvar.wait(&mut guard);
        }
    }

    /// Blocks until the source is finished or cancelled, or the timeout elapses.
    /// Returns true if the source ended.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if !self.is_finished() {
            let _ = self
                .condvar
                .wait_while_for(&mut guard, |_| !self.is_finished(), timeout);
        }
        self.is_finished()
    }

    fn notify(&self) {
        let _guard = self.lock.lock();
        self.condvar.notify_all();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    #[test]
    fn test_cancel_handle_cancelled() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.is_cancelled());

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.wait())
        };

        cancel_handle.cancel();
        assert!(join.join().is_ok());
        assert!(cancel_handle.is_cancelled());
        assert!(cancel_handle.is_finished());
    }

    #[test]
    fn test_cancel_handle_finished() {
        let cancel_handle = CancelHandle::new();

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.wait())
        };

        cancel_handle.finish();
        assert!(join.join().is_ok());
        assert!(!cancel_handle.is_cancelled());
        assert!(cancel_handle.is_finished());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.wait_timeout(Duration::from_millis(10)));
        cancel_handle.finish();
        assert!(cancel_handle.wait_timeout(Duration::from_millis(10)));
    }
}
