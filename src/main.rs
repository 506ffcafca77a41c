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
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use padsampler::audio;
use padsampler::config;
use padsampler::controller::{self, Controller};
use padsampler::events::{EventBus, Message};
use padsampler::layout::GridLayout;
use padsampler::loader::{LoaderParts, PresetLoader};
use padsampler::midi;
use padsampler::samples::{DecodePool, UrlFetcher};
use padsampler::trimbar::Trimbar;
use padsampler::view::log::LogView;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A 16-pad sample player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the presets in the catalog named by the given player config.
    Presets {
        /// The path to the player config.
        player_path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Start will start the pad sampler.
    Start {
        /// The path to the player config.
        player_path: String,
        /// The catalog index of the preset to load first. Overrides the config.
        #[arg(short, long)]
        preset: Option<usize>,
        /// A file of previously exported trim windows to restore.
        #[arg(short, long)]
        trims: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Presets { player_path } => {
            let player = config::load_player(&PathBuf::from(&player_path))?;
            let presets = player
                .catalog_source()?
                .load(player.assets()?, player.fetch_timeout()?)?;

            if presets.is_empty() {
                println!("No presets found.");
                return Ok(());
            }

            println!("Presets (count: {}):", presets.len());
            for (index, preset) in presets.iter().enumerate() {
                println!("{:>3}: {}", index, preset);
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Start {
            player_path,
            preset,
            trims,
        } => {
            let player = config::load_player(&PathBuf::from(&player_path))?;
            let presets = player
                .catalog_source()?
                .load(player.assets()?, player.fetch_timeout()?)?;

            let layout = GridLayout::default();
            let trimbar_config = player.trimbar();
            let bus = EventBus::new();
            let loader = PresetLoader::new(LoaderParts {
                presets,
                pool: DecodePool::new(
                    Arc::new(UrlFetcher::new(player.fetch_timeout()?)),
                    player.decode_concurrency(),
                ),
                device: audio::get_device(player.audio())?,
                view: Arc::new(LogView::new(layout, trimbar_config.waveform_columns())),
                bus: bus.clone(),
                layout,
                trimbar: Trimbar::new(
                    trimbar_config.canvas_width(),
                    trimbar_config.device_pixel_ratio(),
                ),
            });

            if let Some(trims) = trims {
                loader.import_trims(&fs::read_to_string(&trims)?)?;
            }

            tokio::spawn(report_events(bus.subscribe()));

            let initial = preset.unwrap_or(player.initial_preset());
            if let Err(e) = loader.load_preset_by_index(initial).await {
                warn!(preset = initial, err = %e, "Initial preset did not load");
            }

            let driver = controller::drivers(player.midi(), layout.pad_count());
            let mut controller = Controller::new(loader, driver)?;
            controller.join().await?;
        }
    }

    Ok(())
}

/// Logs what the loader publishes until the bus goes away.
async fn report_events(mut events: broadcast::Receiver<Message>) {
    loop {
        match events.recv().await {
            Ok(Message::PresetLoaded(report)) => info!(preset = %report, "Ready"),
            Ok(Message::Playing { pad_index, window }) => info!(
                pad = pad_index,
                start = window.start,
                end = window.end,
                "Playing"
            ),
            Ok(Message::Error(message)) => error!(err = message, "Error"),
            Ok(Message::Progress { done, total }) => info!(done, total, "Decoding"),
            Ok(Message::Status(_)) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed events"),
            Err(RecvError::Closed) => return,
        }
    }
}
