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
use std::{error::Error, fmt, sync::Arc};

use crate::config;

pub mod cpal;
mod mixer;
pub mod mock;
mod source;

pub use source::OneShot;

/// An audio output that one-shot segments are started on. Output can be suspended,
/// in which case it renders silence and its clock stands still.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// The output sample rate.
    fn sample_rate(&self) -> u32;

    /// Seconds of audio rendered since the device was opened.
    fn current_time(&self) -> f64;

    fn is_suspended(&self) -> bool;

    fn resume(&self) -> Result<(), Box<dyn Error>>;

    fn suspend(&self) -> Result<(), Box<dyn Error>>;

    /// Starts playing the given segment immediately.
    fn start(&self, source: OneShot) -> Result<(), Box<dyn Error>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device with the given name.
pub fn get_device(config: Option<&config::Audio>) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let config = match config {
        Some(config) => config,
        None => return Err("there must be an audio device specified".into()),
    };

    let device = config.device();
    if device.starts_with("mock") {
        let mock = mock::Device::get(device, config.sample_rate());
        if !config.start_suspended() {
            mock.resume()?;
        }
        return Ok(Arc::new(mock));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_mock_device() -> Result<(), Box<dyn Error>> {
        let device = get_device(Some(&config::Audio::new("mock-device")))?;
        assert!(device.is_suspended());
        assert_eq!(44100, device.sample_rate());
        assert!(device.to_mock().is_ok());
        Ok(())
    }

    #[test]
    fn test_no_device_configured() {
        assert!(get_device(None).is_err());
    }
}
