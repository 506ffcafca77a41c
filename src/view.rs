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

//! The rendering side of the sampler: pads and the waveform editor.

use crate::loader::PadSlot;
use crate::samples::PcmBuffer;
use crate::trim::TrimWindow;

pub mod log;
#[cfg(test)]
pub mod mock;
pub mod waveform;

/// What's needed to draw the waveform editor for one sample.
#[derive(Clone, Debug)]
pub struct WaveformInfo {
    pub buffer: PcmBuffer,
    pub url: String,
    pub name: String,
    pub pad_index: usize,
    /// The stored trim window, if the sample has one.
    pub window: Option<TrimWindow>,
}

/// Renders pads and waveforms. Implementations are called from whichever task loads
/// presets or triggers pads.
pub trait PadView: Send + Sync {
    /// Removes every rendered pad.
    fn clear_pads(&self);

    /// Renders a full grid. Pads are in display order.
    fn render_pads(&self, preset: &str, pads: &[PadSlot]);

    fn show_waveform(&self, info: &WaveformInfo);
}
