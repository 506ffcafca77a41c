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

//! The preset catalog: the list of presets served by the backend at `/api/presets`, or
//! the same JSON read from a local file.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::layout::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::samples::{Preset, RawSampleEntry, SampleEntry};

/// The most samples a preset can contribute; one per pad.
pub const MAX_PRESET_SAMPLES: usize = DEFAULT_ROWS * DEFAULT_COLS;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preset list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Path cannot be used as an asset base: {0}")]
    InvalidPath(String),
}

/// Where the preset list lives.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogSource {
    /// A backend base url; presets are at `{base}/api/presets`.
    Http(Url),
    /// A JSON file in the same format.
    File(PathBuf),
}

impl CatalogSource {
    /// The url relative sample urls resolve against when no asset base is configured.
    /// For a backend that's its `presets/` static path; for a file, its directory.
    pub fn asset_base(&self) -> Result<Url, CatalogError> {
        match self {
            CatalogSource::Http(base) => Ok(directory(base).join("presets/")?),
            CatalogSource::File(path) => {
                let path = fs::canonicalize(path)?;
                let dir = path
                    .parent()
                    .ok_or_else(|| CatalogError::InvalidPath(path.display().to_string()))?;
                Url::from_directory_path(dir)
                    .map_err(|_| CatalogError::InvalidPath(dir.display().to_string()))
            }
        }
    }

    /// Reads the raw preset list.
    pub fn fetch(&self, timeout: Option<Duration>) -> Result<String, CatalogError> {
        match self {
            CatalogSource::Http(base) => {
                let url = directory(base).join("api/presets")?;
                let mut builder = ureq::AgentBuilder::new();
                if let Some(timeout) = timeout {
                    builder = builder.timeout(timeout);
                }
                match builder.build().get(url.as_str()).call() {
                    Ok(response) => {
                        let mut body = String::new();
                        response.into_reader().read_to_string(&mut body)?;
                        Ok(body)
                    }
                    Err(ureq::Error::Status(status, _)) => Err(CatalogError::Status {
                        url: url.to_string(),
                        status,
                    }),
                    Err(e) => Err(CatalogError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    }),
                }
            }
            CatalogSource::File(path) => Ok(fs::read_to_string(path)?),
        }
    }

    /// Fetches and parses the preset list.
    pub fn load(
        &self,
        asset_base: Option<Url>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Preset>, CatalogError> {
        let asset_base = match asset_base {
            Some(asset_base) => asset_base,
            None => self.asset_base()?,
        };
        let presets = parse_presets(&self.fetch(timeout)?, &asset_base)?;
        info!(
            presets = presets.len(),
            assets = asset_base.as_str(),
            "Loaded preset catalog"
        );
        Ok(presets)
    }
}

/// Makes sure joins append to the base rather than replacing its last segment.
fn directory(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Deserialize)]
struct RawPreset {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, alias = "files")]
    samples: Vec<RawSampleEntry>,
}

/// Parses a preset list, normalising every sample entry. Entries whose url can't be
/// resolved are dropped and only the first [MAX_PRESET_SAMPLES] samples of a preset
/// are kept.
pub fn parse_presets(json: &str, asset_base: &Url) -> Result<Vec<Preset>, CatalogError> {
    let raw: Vec<RawPreset> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .map(|preset| {
            let mut files: Vec<SampleEntry> = preset
                .samples
                .iter()
                .filter_map(|raw| match SampleEntry::from_raw(raw, asset_base) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(preset = preset.name, err = %e, "Skipping sample with bad url");
                        None
                    }
                })
                .collect();

            if files.len() > MAX_PRESET_SAMPLES {
                warn!(
                    preset = preset.name,
                    samples = files.len(),
                    kept = MAX_PRESET_SAMPLES,
                    "Preset has more samples than pads"
                );
                files.truncate(MAX_PRESET_SAMPLES);
            }

            Preset::new(&preset.name, preset.kind, files)
        })
        .collect())
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000/presets/").unwrap()
    }

    #[test]
    fn test_parse_presets() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"[
            {
                "name": "808",
                "type": "drums",
                "samples": [
                    {"name": "Kick", "url": "./808/kick.wav"},
                    "808/snare.wav"
                ]
            },
            {"name": "Empty", "samples": []}
        ]"#;

        let presets = parse_presets(json, &base())?;
        assert_eq!(2, presets.len());

        let kit = &presets[0];
        assert_eq!("808", kit.name());
        assert_eq!(Some("drums"), kit.kind());
        assert_eq!(2, kit.files().len());
        assert_eq!("Kick", kit.files()[0].name());
        assert_eq!(
            "http://localhost:3000/presets/808/kick.wav",
            kit.files()[0].key()
        );
        assert_eq!("snare", kit.files()[1].name());

        assert!(presets[1].files().is_empty());
        assert_eq!(None, presets[1].kind());
        Ok(())
    }

    #[test]
    fn test_parse_truncates_to_pad_count() -> Result<(), Box<dyn std::error::Error>> {
        let samples: Vec<String> = (0..20).map(|i| format!("\"s{}.wav\"", i)).collect();
        let json = format!(r#"[{{"name": "Big", "samples": [{}]}}]"#, samples.join(","));

        let presets = parse_presets(&json, &base())?;
        assert_eq!(MAX_PRESET_SAMPLES, presets[0].files().len());
        assert_eq!("s15", presets[0].files()[15].name());
        Ok(())
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_presets("{\"name\": 1}", &base()),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_http_asset_base() -> Result<(), Box<dyn std::error::Error>> {
        let source = CatalogSource::Http(Url::parse("http://localhost:3000")?);
        assert_eq!(
            "http://localhost:3000/presets/",
            source.asset_base()?.as_str()
        );

        let source = CatalogSource::Http(Url::parse("http://host/sampler")?);
        assert_eq!("http://host/sampler/presets/", source.asset_base()?.as_str());
        Ok(())
    }

    #[test]
    fn test_file_catalog() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("presets.json");
        let mut file = std::fs::File::create(&path)?;
        write!(file, r#"[{{"name": "Kit", "samples": ["kick.wav"]}}]"#)?;

        let source = CatalogSource::File(path);
        let presets = source.load(None, None)?;
        assert_eq!(1, presets.len());

        let url = presets[0].files()[0].url();
        assert_eq!("file", url.scheme());
        assert!(url.path().ends_with("/kick.wav"));
        Ok(())
    }
}
