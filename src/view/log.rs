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
use tracing::info;

use super::{waveform, PadView, WaveformInfo};
use crate::layout::GridLayout;
use crate::loader::PadSlot;

const LEVELS: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const CELL_WIDTH: usize = 14;

/// A terminal view: logs what happens and prints the pad grid and waveforms to stdout.
pub struct LogView {
    layout: GridLayout,
    columns: usize,
}

impl LogView {
    pub fn new(layout: GridLayout, columns: usize) -> LogView {
        LogView {
            layout,
            columns: columns.max(1),
        }
    }

    /// The pad grid as text, one line per row, top row first.
    pub fn grid(&self, pads: &[PadSlot]) -> Vec<String> {
        pads.chunks(self.layout.cols())
            .map(|row| {
                row.iter()
                    .map(|pad| {
                        let label = pad.name().unwrap_or("-");
                        let label: String = label.chars().take(CELL_WIDTH - 4).collect();
                        format!("[{:>2} {:<width$}]", pad.pad_index(), label, width = CELL_WIDTH - 4)
                    })
                    .collect::<Vec<String>>()
                    .join("")
            })
            .collect()
    }

    /// The waveform as one line of amplitude characters with trim markers beneath.
    pub fn waveform(&self, info: &WaveformInfo) -> (String, String) {
        let peaks = waveform::peaks(&info.buffer, self.columns);
        let wave: String = peaks
            .iter()
            .map(|(min, max)| {
                let amplitude = min.abs().max(max.abs()).min(1.0);
                LEVELS[(amplitude * (LEVELS.len() - 1) as f32).round() as usize]
            })
            .collect();

        let mut markers = vec![' '; self.columns];
        if let Some(window) = info.window {
            let duration = info.buffer.duration();
            if duration > 0.0 {
                let column = |seconds: f64| {
                    ((seconds / duration * self.columns as f64) as usize).min(self.columns - 1)
                };
                markers[column(window.start)] = '[';
                markers[column(window.end)] = ']';
            }
        }
        (wave, markers.into_iter().collect())
    }
}

impl PadView for LogView {
    fn clear_pads(&self) {
        info!("Pads cleared");
    }

    fn render_pads(&self, preset: &str, pads: &[PadSlot]) {
        let loaded = pads.iter().filter(|pad| !pad.is_empty()).count();
        info!(preset, loaded, empty = pads.len() - loaded, "Pads rendered");
        println!("{}", preset);
        for line in self.grid(pads) {
            println!("{}", line);
        }
    }

    fn show_waveform(&self, info: &WaveformInfo) {
        info!(
            sample = info.name,
            pad = info.pad_index,
            duration = info.buffer.duration(),
            "Showing waveform"
        );
        let (wave, markers) = self.waveform(info);
        println!("{} ({:.2}s)", info.name, info.buffer.duration());
        println!("|{}|", wave);
        println!(" {}", markers);
    }
}
