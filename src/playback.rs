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

//! One-shot playback of a window of a decoded buffer.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::audio::{Device, OneShot};
use crate::playsync::CancelHandle;
use crate::samples::{PcmBuffer, DEFAULT_PLAYBACK_RATE};
use crate::trim::TrimWindow;

/// Starts one-shot segments on an audio device. Every call builds a new source; the
/// engine keeps no record of what it started.
#[derive(Clone)]
pub struct PlaybackEngine {
    device: Arc<dyn Device>,
}

impl PlaybackEngine {
    pub fn new(device: Arc<dyn Device>) -> PlaybackEngine {
        PlaybackEngine { device }
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Plays `start..end` seconds of `buffer` at `playback_rate`. The window is clamped to
    /// the buffer. Returns None if nothing is left to play.
    pub fn play(
        &self,
        buffer: &PcmBuffer,
        start: f64,
        end: f64,
        playback_rate: f64,
    ) -> Result<Option<PlaybackHandle>, Box<dyn Error>> {
        let duration = buffer.duration();
        let start = if start.is_nan() { 0.0 } else { start.max(0.0) };
        let end = if end.is_nan() { duration } else { end.min(duration) };
        if end - start <= 0.0 {
            debug!(start, end, "Nothing to play");
            return Ok(None);
        }

        let playback_rate = if playback_rate.is_finite() && playback_rate > 0.0 {
            playback_rate
        } else {
            DEFAULT_PLAYBACK_RATE
        };

        let cancel_handle = CancelHandle::new();
        let source = OneShot::new(buffer, start, end, playback_rate, cancel_handle.clone());
        let id = source.id();
        let started_at = self.device.current_time();
        self.device.start(source)?;

        Ok(Some(PlaybackHandle {
            id,
            cancel_handle,
            started_at,
            window: TrimWindow::new(start, end),
            playback_rate,
        }))
    }
}

/// A started segment.
#[derive(Clone, Debug)]
pub struct PlaybackHandle {
    id: u64,
    cancel_handle: CancelHandle,
    started_at: f64,
    window: TrimWindow,
    playback_rate: f64,
}

impl PlaybackHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops the segment. Stopping a finished segment does nothing.
    pub fn stop(&self) {
        if !self.cancel_handle.is_finished() {
            debug!(id = self.id, "Stopping segment");
            self.cancel_handle.cancel();
        }
    }

    /// True once the segment has played out or was stopped.
    pub fn is_finished(&self) -> bool {
        self.cancel_handle.is_finished()
    }

    /// Blocks until the segment has played out or was stopped.
    pub fn wait(&self) {
        self.cancel_handle.wait();
    }

    /// Like [PlaybackHandle::wait], giving up after `timeout`. Returns true if the
    /// segment ended.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.cancel_handle.wait_timeout(timeout)
    }

    /// Device time the segment started at.
    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// The part of the buffer being played.
    pub fn window(&self) -> TrimWindow {
        self.window
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Playhead position in buffer seconds at device time `now`, or None once the
    /// segment is over.
    pub fn position(&self, now: f64) -> Option<f64> {
        if self.is_finished() {
            return None;
        }
        let elapsed = (now - self.started_at).max(0.0);
        let position = self.window.start + elapsed * self.playback_rate;
        if position >= self.window.end {
            None
        } else {
            Some(position)
        }
    }
}
