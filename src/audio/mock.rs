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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use super::source::OneShot;
use crate::playsync::CancelHandle;

/// A segment started on the mock device.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub id: u64,
    pub start: f64,
    pub duration: f64,
    pub rate: f64,
}

/// A mock device. Doesn't actually play anything; it records what was started and
/// its clock only moves when told to.
#[derive(Clone)]
pub struct Device {
    name: String,
    sample_rate: u32,
    suspended: Arc<AtomicBool>,
    clock: Arc<Mutex<f64>>,
    segments: Arc<Mutex<Vec<Segment>>>,
    handles: Arc<Mutex<Vec<CancelHandle>>>,
}

impl Device {
    /// Gets the given mock device. Like a freshly created browser audio context, it
    /// starts suspended.
    pub fn get(name: &str, sample_rate: u32) -> Device {
        Device {
            name: name.to_string(),
            sample_rate,
            suspended: Arc::new(AtomicBool::new(true)),
            clock: Arc::new(Mutex::new(0.0)),
            segments: Arc::new(Mutex::new(Vec::new())),
            handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sets the device clock.
    #[cfg(test)]
    pub fn set_time(&self, time: f64) {
        *self.clock.lock() = time;
    }

    /// Every segment started so far, oldest first.
    #[cfg(test)]
    pub fn segments(&self) -> Vec<Segment> {
        self.segments.lock().clone()
    }

    /// Returns true if any started segment is neither finished nor stopped.
    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.handles
            .lock()
            .iter()
            .any(|handle| !handle.is_finished())
    }

    /// Ends every playing segment as if it had played out.
    #[cfg(test)]
    pub fn finish_all(&self) {
        self.handles.lock().iter().for_each(|handle| handle.finish());
    }
}

impl crate::audio::Device for Device {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        *self.clock.lock()
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    fn resume(&self) -> Result<(), Box<dyn Error>> {
        self.suspended.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn suspend(&self) -> Result<(), Box<dyn Error>> {
        self.suspended.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn start(&self, source: OneShot) -> Result<(), Box<dyn Error>> {
        let segment = Segment {
            id: source.id(),
            start: source.start_seconds(),
            duration: source.duration_seconds(),
            rate: source.rate(),
        };
        info!(
            device = self.name,
            start = segment.start,
            duration = segment.duration,
            rate = segment.rate,
            "Starting segment (mock)"
        );

        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(source.cancel_handle().clone());
        self.segments.lock().push(segment);
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
