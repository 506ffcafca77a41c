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
use serde::Deserialize;

/// The note that maps to pad 0 when not configured (C1, the usual first drum pad).
pub const DEFAULT_BASE_NOTE: u8 = 36;

/// A YAML representation of the MIDI input configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Midi {
    /// The MIDI device.
    device: String,

    /// The MIDI channel to listen on, 1-16. All channels when unset.
    channel: Option<u8>,

    /// The note number of pad 0.
    base_note: Option<u8>,
}

impl Midi {
    /// New will create a new MIDI configuration.
    pub fn new(device: &str, channel: Option<u8>, base_note: Option<u8>) -> Midi {
        Midi {
            device: device.to_string(),
            channel,
            base_note,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// The zero-based channel to listen on. Out of range values listen on all channels.
    pub fn channel(&self) -> Option<u8> {
        self.channel
            .filter(|channel| (1..=16).contains(channel))
            .map(|channel| channel - 1)
    }

    pub fn base_note(&self) -> u8 {
        self.base_note.unwrap_or(DEFAULT_BASE_NOTE)
    }
}
