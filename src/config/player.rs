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
use std::path::{Path, PathBuf};
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;
use url::Url;

use super::audio::Audio;
use super::error::ConfigError;
use super::midi::Midi;
use crate::catalog::CatalogSource;
use crate::samples::DEFAULT_CONCURRENCY;

pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 1.0;
pub const DEFAULT_WAVEFORM_COLUMNS: usize = 64;

/// Geometry of the waveform editor the trim markers live on.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Trimbar {
    canvas_width: Option<f64>,
    device_pixel_ratio: Option<f64>,
    waveform_columns: Option<usize>,
}

impl Trimbar {
    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
            .filter(|width| width.is_finite() && *width > 0.0)
            .unwrap_or(DEFAULT_CANVAS_WIDTH)
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
            .filter(|dpr| dpr.is_finite() && *dpr > 0.0)
            .unwrap_or(DEFAULT_DEVICE_PIXEL_RATIO)
    }

    /// Number of columns used when drawing a waveform.
    pub fn waveform_columns(&self) -> usize {
        self.waveform_columns
            .filter(|columns| *columns > 0)
            .unwrap_or(DEFAULT_WAVEFORM_COLUMNS)
    }
}

/// The configuration for the pad sampler.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// Where presets come from: a server base url or a path to a presets JSON file.
    catalog: String,

    /// Base url that relative sample urls are resolved against. Derived from the
    /// catalog when unset.
    assets: Option<String>,

    /// How many samples to fetch and decode at once.
    decode_concurrency: Option<usize>,

    /// Optional timeout for each sample fetch, e.g. "10s". No timeout when unset.
    fetch_timeout: Option<String>,

    /// The audio output.
    audio: Option<Audio>,

    /// The MIDI input. Keyboard only when unset.
    midi: Option<Midi>,

    /// Trim marker geometry.
    #[serde(default)]
    trimbar: Trimbar,

    /// The preset loaded at startup.
    initial_preset: Option<usize>,

    /// Directory of the file this config was read from. Relative catalog paths are
    /// resolved against it.
    #[serde(skip)]
    base_path: Option<PathBuf>,
}

impl Player {
    pub(super) fn set_base_path(&mut self, path: &Path) {
        self.base_path = Some(path.to_path_buf());
    }

    /// Returns where presets are read from.
    pub fn catalog_source(&self) -> Result<CatalogSource, ConfigError> {
        if self.catalog.starts_with("http://") || self.catalog.starts_with("https://") {
            return Ok(CatalogSource::Http(Url::parse(&self.catalog)?));
        }

        let path = PathBuf::from(&self.catalog);
        let path = match (&self.base_path, path.is_relative()) {
            (Some(base_path), true) => base_path.join(path),
            _ => path,
        };
        Ok(CatalogSource::File(path))
    }

    /// The explicit asset base url, if configured.
    pub fn assets(&self) -> Result<Option<Url>, ConfigError> {
        self.assets
            .as_ref()
            .map(|assets| Url::parse(assets))
            .transpose()
            .map_err(ConfigError::from)
    }

    pub fn decode_concurrency(&self) -> usize {
        self.decode_concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1)
    }

    pub fn fetch_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match &self.fetch_timeout {
            Some(timeout) => Ok(Some(
                DurationString::from_string(timeout.clone())
                    .map_err(|_| ConfigError::Duration(timeout.clone()))?
                    .into(),
            )),
            None => Ok(None),
        }
    }

    pub fn audio(&self) -> Option<&Audio> {
        self.audio.as_ref()
    }

    pub fn midi(&self) -> Option<&Midi> {
        self.midi.as_ref()
    }

    pub fn trimbar(&self) -> &Trimbar {
        &self.trimbar
    }

    pub fn initial_preset(&self) -> usize {
        self.initial_preset.unwrap_or(0)
    }
}
