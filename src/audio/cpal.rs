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
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use super::mixer::Mixer;
use super::source::OneShot;
use crate::{audio::Device as AudioDevice, config};

/// A small wrapper around a cpal::Device. Once opened, it keeps an output stream
/// running on its own thread and mixes whatever one-shots are started on it.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The running output, if the device has been opened.
    output: Option<Output>,
}

/// State shared with the output stream thread.
struct Output {
    sample_rate: u32,
    num_channels: u16,
    source_tx: crossbeam_channel::Sender<OneShot>,
    suspended: Arc<AtomicBool>,
    /// Frames rendered while not suspended. Drives the device clock.
    frames: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl Drop for Output {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Renders one callback's worth of audio, converting to the stream's sample type.
fn write_output<T>(
    data: &mut [T],
    scratch: &mut Vec<f32>,
    mixer: &mut Mixer,
    suspended: &AtomicBool,
    frames: &AtomicU64,
) where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    if suspended.load(Ordering::Relaxed) {
        data.fill(T::EQUILIBRIUM);
        return;
    }

    scratch.resize(data.len(), 0.0);
    mixer.process(scratch);
    for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
        *dst = T::from_sample(src);
    }

    let num_channels = mixer.num_channels().max(1) as u64;
    frames.fetch_add(data.len() as u64 / num_channels, Ordering::Relaxed);
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mut mixer: Mixer,
    suspended: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        stream_config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_output(data, &mut scratch, &mut mixer, &suspended, &frames);
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices with at least one output channel.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let output_configs = match device.supported_output_configs() {
                    Ok(output_configs) => output_configs,
                    Err(_) => continue,
                };

                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                        output: None,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the given cpal device and opens an output stream on it.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        let mut device = Device::list_cpal_devices()?
            .into_iter()
            .find(|device| device.name.trim() == name)
            .ok_or_else(|| format!("no device found with name {}", name))?;

        device.output = Some(device.open(config.sample_rate(), config.start_suspended())?);
        Ok(device)
    }

    fn open(&self, sample_rate: u32, start_suspended: bool) -> Result<Output, Box<dyn Error>> {
        let default_config = self.device.default_output_config()?;
        let num_channels = default_config.channels();
        let sample_format = default_config.sample_format();

        let (source_tx, source_rx) = crossbeam_channel::unbounded();
        let suspended = Arc::new(AtomicBool::new(start_suspended));
        let frames = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);

        let device = self.device.clone();
        let mixer = Mixer::new(source_rx, num_channels, sample_rate);
        let thread_suspended = suspended.clone();
        let thread_frames = frames.clone();
        let thread_closed = closed.clone();

        // The stream isn't Send, so it's created and kept alive on its own thread.
        thread::spawn(move || {
            let span = span!(Level::INFO, "audio output (cpal)");
            let _enter = span.enter();

            let stream_config = cpal::StreamConfig {
                channels: num_channels,
                sample_rate: sample_rate as cpal::SampleRate,
                buffer_size: cpal::BufferSize::Default,
            };

            let stream = match sample_format {
                cpal::SampleFormat::F32 => build_stream::<f32>(
                    &device,
                    &stream_config,
                    mixer,
                    thread_suspended,
                    thread_frames,
                ),
                cpal::SampleFormat::I16 => build_stream::<i16>(
                    &device,
                    &stream_config,
                    mixer,
                    thread_suspended,
                    thread_frames,
                ),
                cpal::SampleFormat::I32 => build_stream::<i32>(
                    &device,
                    &stream_config,
                    mixer,
                    thread_suspended,
                    thread_frames,
                ),
                other => {
                    let _ = ready_tx.send(Err(format!("unsupported sample format {}", other)));
                    return;
                }
            };

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("failed to create stream: {}", e)));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("failed to start stream: {}", e)));
                return;
            }
            info!(
                channels = num_channels,
                sample_rate, "CPAL output stream started"
            );
            let _ = ready_tx.send(Ok(()));

            while !thread_closed.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(100));
            }
            info!("CPAL output stream closed");
        });

        ready_rx.recv()??;

        Ok(Output {
            sample_rate,
            num_channels,
            source_tx,
            suspended,
            frames,
            closed,
        })
    }

    fn output(&self) -> Result<&Output, Box<dyn Error>> {
        self.output
            .as_ref()
            .ok_or_else(|| format!("device {} is not open", self.name).into())
    }
}

impl AudioDevice for Device {
    fn sample_rate(&self) -> u32 {
        self.output
            .as_ref()
            .map(|output| output.sample_rate)
            .unwrap_or(config::DEFAULT_SAMPLE_RATE)
    }

    fn current_time(&self) -> f64 {
        match &self.output {
            Some(output) => {
                output.frames.load(Ordering::Relaxed) as f64 / output.sample_rate as f64
            }
            None => 0.0,
        }
    }

    fn is_suspended(&self) -> bool {
        self.output
            .as_ref()
            .map(|output| output.suspended.load(Ordering::Relaxed))
            .unwrap_or(true)
    }

    fn resume(&self) -> Result<(), Box<dyn Error>> {
        self.output()?.suspended.store(false, Ordering::Relaxed);
        info!(device = self.name, "Audio output resumed");
        Ok(())
    }

    fn suspend(&self) -> Result<(), Box<dyn Error>> {
        self.output()?.suspended.store(true, Ordering::Relaxed);
        info!(device = self.name, "Audio output suspended");
        Ok(())
    }

    fn start(&self, source: OneShot) -> Result<(), Box<dyn Error>> {
        let output = self.output()?;
        info!(
            device = self.name,
            channels = output.num_channels,
            start = source.start_seconds(),
            duration = source.duration_seconds(),
            rate = source.rate(),
            "Starting segment"
        );
        output.source_tx.send(source)?;
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock".into())
    }
}
