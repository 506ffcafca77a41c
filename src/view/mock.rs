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
use parking_lot::Mutex;

use super::{PadView, WaveformInfo};
use crate::loader::PadSlot;

/// A rendered pad as recorded by the mock view.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPad {
    pub pad_index: usize,
    pub display_index: usize,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear,
    Render { preset: String, pads: Vec<RenderedPad> },
    Waveform { url: String, pad_index: usize },
}

/// Records every call so tests can check what would have been drawn.
#[derive(Default)]
pub struct View {
    calls: Mutex<Vec<Call>>,
}

impl View {
    pub fn new() -> View {
        View::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// The pads of the most recent render, or None if pads were cleared since.
    pub fn rendered(&self) -> Option<Vec<RenderedPad>> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            Call::Clear => Some(None),
            Call::Render { pads, .. } => Some(Some(pads.clone())),
            Call::Waveform { .. } => None,
        })?
    }
}

impl PadView for View {
    fn clear_pads(&self) {
        self.calls.lock().push(Call::Clear);
    }

    fn render_pads(&self, preset: &str, pads: &[PadSlot]) {
        let pads = pads
            .iter()
            .map(|pad| RenderedPad {
                pad_index: pad.pad_index(),
                display_index: pad.display_index(),
                name: pad.name().map(|name| name.to_string()),
            })
            .collect();
        self.calls.lock().push(Call::Render {
            preset: preset.to_string(),
            pads,
        });
    }

    fn show_waveform(&self, info: &WaveformInfo) {
        self.calls.lock().push(Call::Waveform {
            url: info.url.clone(),
            pad_index: info.pad_index,
        });
    }
}
