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
use std::error::Error;
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, warn, Instrument, Level};

use crate::config;
use crate::loader::PresetLoader;
use crate::trimbar::Side;

pub mod keyboard;
pub mod midi;
pub mod multi;

/// Controller events that drive the pad grid.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Plays the pad at a display position.
    Trigger(usize),

    /// Plays the pad at a logical position.
    TriggerPad(usize),

    /// Loads the preset at the given catalog index.
    Load(usize),

    /// Loads the preset after the current one, wrapping around.
    NextPreset,

    /// Loads the preset before the current one, wrapping around.
    PrevPreset,

    /// Stops the sample that's playing, if any.
    Stop,

    /// Moves a trim marker of the displayed sample to a canvas x position.
    Drag { side: Side, x: f64 },

    /// Prints every stored trim window as JSON.
    ExportTrims,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Builds the drivers for a player: the keyboard always, plus MIDI when a device is
/// configured and can be opened.
pub fn drivers(midi_config: Option<&config::Midi>, pad_count: usize) -> Arc<dyn Driver> {
    let mut sub_drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(keyboard::Driver::new())];

    if let Some(midi_config) = midi_config {
        match crate::midi::get_device(midi_config.device()) {
            Ok(device) => sub_drivers.push(Arc::new(midi::Driver::new(
                device,
                midi_config,
                pad_count,
            ))),
            Err(e) => warn!(
                device = midi_config.device(),
                err = e.as_ref(),
                "MIDI unavailable, continuing with the keyboard only"
            ),
        }
    }

    Arc::new(multi::Driver::new(sub_drivers))
}

/// Feeds driver events to a preset loader.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(
        loader: PresetLoader,
        driver: Arc<dyn Driver>,
    ) -> Result<Controller, Box<dyn Error>> {
        let span = span!(Level::INFO, "controller");
        Ok(Controller {
            handle: tokio::spawn(Controller::trigger_events(loader, driver).instrument(span)),
        })
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Watches the driver and applies its events one at a time, in order.
    async fn trigger_events(loader: PresetLoader, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let join_handle = driver.monitor_events(events_tx);

        info!(presets = loader.presets().len(), "Controller started.");

        while let Some(event) = events_rx.recv().await {
            info!(event = format!("{:?}", event), "Received event.");
            Controller::handle_event(&loader, event).await;
        }

        info!("Controller closing.");
        match join_handle.await {
            Ok(Err(e)) => error!(err = %e, "Event monitor failed"),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }

    async fn handle_event(loader: &PresetLoader, event: Event) {
        match event {
            Event::Trigger(display_index) => {
                loader.trigger_display(display_index);
            }
            Event::TriggerPad(pad_index) => {
                loader.trigger_pad(pad_index);
            }
            Event::Load(index) => Controller::load(loader, index).await,
            Event::NextPreset | Event::PrevPreset => {
                let count = loader.presets().len();
                if count == 0 {
                    warn!("No presets to switch between");
                    return;
                }
                let index = match (loader.current_preset(), event == Event::NextPreset) {
                    (None, _) => 0,
                    (Some(current), true) => (current + 1) % count,
                    (Some(current), false) => (current + count - 1) % count,
                };
                Controller::load(loader, index).await
            }
            Event::Stop => loader.stop(),
            Event::Drag { side, x } => {
                if loader.drag_marker(side, x).is_none() {
                    warn!("No sample displayed to trim");
                }
            }
            Event::ExportTrims => match loader.export_trims() {
                Ok(json) => println!("{}", json),
                Err(e) => error!(err = %e, "Unable to export trim windows"),
            },
        }
    }

    async fn load(loader: &PresetLoader, index: usize) {
        // The loader has already reported the failure to the view and the bus.
        if let Err(e) = loader.load_preset_by_index(index).await {
            error!(index, err = %e, "Preset did not load");
        }
    }
}
