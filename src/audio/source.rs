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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::playsync::CancelHandle;
use crate::samples::PcmBuffer;

static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A single playback of part of a buffer. Once it has ended or been cancelled it is
/// discarded; playing again needs a new one.
pub struct OneShot {
    id: u64,
    data: Arc<Vec<f32>>,
    channels: usize,
    sample_rate: u32,
    /// Read position in source frames.
    position: f64,
    end_frame: f64,
    rate: f64,
    cancel_handle: CancelHandle,
}

impl OneShot {
    /// Creates a segment playing `start..end` seconds of `buffer` at `rate`. The window is
    /// expected to be clamped to the buffer already.
    pub fn new(
        buffer: &PcmBuffer,
        start: f64,
        end: f64,
        rate: f64,
        cancel_handle: CancelHandle,
    ) -> OneShot {
        let sample_rate = buffer.sample_rate();
        let frames = buffer.frames() as f64;
        OneShot {
            id: SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            data: buffer.data().clone(),
            channels: buffer.channel_count() as usize,
            sample_rate,
            position: (start * sample_rate as f64).clamp(0.0, frames),
            end_frame: (end * sample_rate as f64).clamp(0.0, frames),
            rate,
            cancel_handle,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel_handle
    }

    /// Start of the segment in buffer seconds.
    pub fn start_seconds(&self) -> f64 {
        self.position / self.sample_rate as f64
    }

    /// Length of the segment in buffer seconds, before rate scaling.
    pub fn duration_seconds(&self) -> f64 {
        (self.end_frame - self.position).max(0.0) / self.sample_rate as f64
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Mixes the next `out.len() / out_channels` frames into `out`. Returns false once the
    /// segment has ended or was cancelled, at which point it should be dropped.
    pub fn render(&mut self, out: &mut [f32], out_channels: usize, out_rate: u32) -> bool {
        if self.cancel_handle.is_cancelled() {
            return false;
        }
        if out_channels == 0 || self.channels == 0 {
            return true;
        }

        let step = self.rate * self.sample_rate as f64 / out_rate.max(1) as f64;
        let frames = self.data.len() / self.channels;

        for frame in out.chunks_mut(out_channels) {
            if self.position >= self.end_frame {
                break;
            }

            let index = self.position as usize;
            let fraction = (self.position - index as f64) as f32;
            let next = if index + 1 < frames { index + 1 } else { index };

            for (channel, sample) in frame.iter_mut().enumerate() {
                // Mono sources go to every output; extra output channels repeat the last
                // source channel.
                let source_channel = channel.min(self.channels - 1);
                let a = self.data[index * self.channels + source_channel];
                let b = self.data[next * self.channels + source_channel];
                *sample += a + (b - a) * fraction;
            }

            self.position += step;
        }

        if self.position >= self.end_frame {
            self.cancel_handle.finish();
            return false;
        }
        true
    }
}
