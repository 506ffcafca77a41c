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
use std::{io, sync::Arc};

use midly::{live::LiveEvent, MidiMessage};
use tokio::{
    sync::mpsc::{self, Sender},
    task::JoinHandle,
};
use tracing::{debug, error, info, span, Level};

use super::Event;
use crate::{config, midi::Device};

/// Which note on messages play which pads. Notes count up from the base note in
/// logical pad order.
#[derive(Clone, Copy, Debug)]
struct NoteMap {
    /// The zero based channel to listen on, or every channel.
    channel: Option<u8>,
    /// The note that plays pad 0.
    base_note: u8,
    /// The number of pads notes can reach.
    pad_count: usize,
}

impl NoteMap {
    /// Maps a raw MIDI message to a pad trigger.
    fn to_event(self, raw_event: &[u8]) -> Option<Event> {
        let event = match LiveEvent::parse(raw_event) {
            Ok(event) => event,
            Err(e) => {
                error!(err = format!("{:?}", e), "Error parsing event.");
                return None;
            }
        };

        let (channel, key) = match event {
            LiveEvent::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } if vel.as_int() > 0 => (channel.as_int(), key.as_int()),
            _ => return None,
        };
        if self.channel.is_some_and(|wanted| wanted != channel) {
            debug!(channel, "Ignoring note on another channel.");
            return None;
        }

        let pad_index = usize::from(key.checked_sub(self.base_note)?);
        if pad_index >= self.pad_count {
            return None;
        }
        Some(Event::TriggerPad(pad_index))
    }
}

/// A controller that plays pads from MIDI note on messages.
pub struct Driver {
    /// The MIDI device.
    midi_device: Arc<dyn Device>,
    notes: NoteMap,
}

impl Driver {
    pub fn new(midi_device: Arc<dyn Device>, config: &config::Midi, pad_count: usize) -> Driver {
        Driver {
            midi_device,
            notes: NoteMap {
                channel: config.channel(),
                base_note: config.base_note(),
                pad_count,
            },
        }
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let (midi_events_tx, mut midi_events_rx) = mpsc::channel::<Vec<u8>>(10);
        let device = self.midi_device.clone();

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "MIDI driver");
            let _enter = span.enter();

            info!(device = device.name(), "MIDI driver started.");

            // On failure the sender is dropped, which closes the loop below.
            if let Err(e) = device.watch_events(midi_events_tx) {
                error!(err = e.as_ref(), "Error watching MIDI events");
            }
        });

        let device = self.midi_device.clone();
        let notes = self.notes;
        tokio::spawn(async move {
            loop {
                let raw_event = match midi_events_rx.recv().await {
                    Some(raw_event) => raw_event,
                    None => {
                        info!("MIDI watcher closed.");
                        device.stop_watch_events();
                        return Ok(());
                    }
                };

                if let Some(event) = notes.to_event(&raw_event) {
                    if events_tx.send(event).await.is_err() {
                        info!("Controller closed, no longer watching MIDI.");
                        device.stop_watch_events();
                        return Ok(());
                    }
                }
            }
        })
    }
}
