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
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::decode::PcmBuffer;

/// Playback rate used when an entry doesn't specify one.
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

/// A sample reference as it appears in preset metadata: either a bare url or an object.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RawSampleEntry {
    Url(String),
    Entry {
        url: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "playbackRate", alias = "playback_rate")]
        playback_rate: Option<f64>,
    },
}

/// A normalised sample reference. The url is its identity.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleEntry {
    url: Url,
    name: String,
    playback_rate: f64,
}

impl SampleEntry {
    /// Creates an entry. A missing name is derived from the url and invalid rates fall
    /// back to the default.
    pub fn new(url: Url, name: Option<String>, playback_rate: Option<f64>) -> SampleEntry {
        let name = name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| name_from_url(&url));
        let playback_rate = playback_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(DEFAULT_PLAYBACK_RATE);
        SampleEntry {
            url,
            name,
            playback_rate,
        }
    }

    /// Normalises a raw entry, resolving relative urls against `base`.
    pub fn from_raw(raw: &RawSampleEntry, base: &Url) -> Result<SampleEntry, url::ParseError> {
        match raw {
            RawSampleEntry::Url(url) => Ok(SampleEntry::new(base.join(url)?, None, None)),
            RawSampleEntry::Entry {
                url,
                name,
                playback_rate,
            } => Ok(SampleEntry::new(
                base.join(url)?,
                name.clone(),
                *playback_rate,
            )),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The url as a string, used as the key for per-sample state.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// The file extension of the url path, used as a format hint when decoding.
    pub fn extension(&self) -> Option<String> {
        let segment = self.url.path_segments()?.last()?;
        Path::new(segment)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

impl fmt::Display for SampleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

fn name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|segment| Path::new(segment).file_stem())
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
        .unwrap_or_else(|| url.to_string())
}

/// A named set of samples that drives the pad layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    name: String,
    kind: Option<String>,
    files: Vec<SampleEntry>,
}

impl Preset {
    pub fn new(name: &str, kind: Option<String>, files: Vec<SampleEntry>) -> Preset {
        Preset {
            name: name.to_string(),
            kind,
            files,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn files(&self) -> &[SampleEntry] {
        &self.files
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{} [{}] ({} samples)", self.name, kind, self.files.len()),
            None => write!(f, "{} ({} samples)", self.name, self.files.len()),
        }
    }
}

/// A sample whose audio has been decoded and is ready to play.
#[derive(Clone, Debug)]
pub struct DecodedSample {
    entry: SampleEntry,
    buffer: PcmBuffer,
}

impl DecodedSample {
    pub fn new(entry: SampleEntry, buffer: PcmBuffer) -> DecodedSample {
        DecodedSample { entry, buffer }
    }

    pub fn entry(&self) -> &SampleEntry {
        &self.entry
    }

    pub fn buffer(&self) -> &PcmBuffer {
        &self.buffer
    }

    pub fn url(&self) -> &str {
        self.entry.key()
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn playback_rate(&self) -> f64 {
        self.entry.playback_rate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000/presets/").unwrap()
    }

    #[test]
    fn test_bare_url_entry() -> Result<(), Box<dyn std::error::Error>> {
        let raw: RawSampleEntry = serde_json::from_str(r#""808/kick.wav""#)?;
        let entry = SampleEntry::from_raw(&raw, &base())?;
        assert_eq!(
            "http://localhost:3000/presets/808/kick.wav",
            entry.key()
        );
        assert_eq!("kick", entry.name());
        assert_eq!(DEFAULT_PLAYBACK_RATE, entry.playback_rate());
        assert_eq!(Some("wav".to_string()), entry.extension());
        Ok(())
    }

    #[test]
    fn test_object_entry() -> Result<(), Box<dyn std::error::Error>> {
        let raw: RawSampleEntry = serde_json::from_str(
            r#"{"url": "./snare.MP3", "name": "Snare", "playbackRate": 0.5}"#,
        )?;
        let entry = SampleEntry::from_raw(&raw, &base())?;
        assert_eq!("http://localhost:3000/presets/snare.MP3", entry.key());
        assert_eq!("Snare", entry.name());
        assert_eq!(0.5, entry.playback_rate());
        assert_eq!(Some("mp3".to_string()), entry.extension());
        Ok(())
    }

    #[test]
    fn test_absolute_url_is_kept() -> Result<(), Box<dyn std::error::Error>> {
        let raw = RawSampleEntry::Url("https://cdn.example.com/hat.ogg".to_string());
        let entry = SampleEntry::from_raw(&raw, &base())?;
        assert_eq!("https://cdn.example.com/hat.ogg", entry.key());
        assert_eq!("hat", entry.name());
        Ok(())
    }

    #[test]
    fn test_invalid_rate_and_blank_name() {
        let url = Url::parse("http://localhost/tom.wav").unwrap();
        let entry = SampleEntry::new(url.clone(), Some("  ".to_string()), Some(-2.0));
        assert_eq!("tom", entry.name());
        assert_eq!(DEFAULT_PLAYBACK_RATE, entry.playback_rate());

        let entry = SampleEntry::new(url, None, Some(f64::NAN));
        assert_eq!(DEFAULT_PLAYBACK_RATE, entry.playback_rate());
    }
}
