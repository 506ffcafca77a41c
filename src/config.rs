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
use std::path::Path;

use config::{Config, File};

mod audio;
mod error;
mod midi;
mod player;

pub use self::audio::{Audio, DEFAULT_SAMPLE_RATE};
pub use self::error::ConfigError;
pub use self::midi::Midi;
pub use self::player::{Player, Trimbar};

/// Loads the player configuration from a YAML file.
pub fn load_player(path: &Path) -> Result<Player, ConfigError> {
    let mut player: Player = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize()?;

    let base_path = path
        .parent()
        .ok_or_else(|| ConfigError::Path(path.display().to_string()))?;
    player.set_base_path(base_path);
    Ok(player)
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    use config::{Config, File, FileFormat};

    use super::*;
    use crate::catalog::CatalogSource;

    fn parse(yaml: &str) -> Player {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let player = parse(
            r#"
            catalog: http://localhost:3000
            "#,
        );

        assert_eq!(3, player.decode_concurrency());
        assert!(player.fetch_timeout().unwrap().is_none());
        assert!(player.audio().is_none());
        assert!(player.midi().is_none());
        assert_eq!(800.0, player.trimbar().canvas_width());
        assert_eq!(1.0, player.trimbar().device_pixel_ratio());
        assert_eq!(0, player.initial_preset());
        assert!(matches!(
            player.catalog_source().unwrap(),
            CatalogSource::Http(url) if url.as_str() == "http://localhost:3000/"
        ));
    }

    #[test]
    fn test_full_config() {
        let player = parse(
            r#"
            catalog: presets.json
            assets: http://cdn.local/samples/
            decode_concurrency: 0
            fetch_timeout: 10s
            audio:
              device: mock-device
              sample_rate: 48000
              start_suspended: false
            midi:
              device: mock-midi
              channel: 10
            trimbar:
              canvas_width: 1200
              device_pixel_ratio: 2
            initial_preset: 2
            "#,
        );

        assert_eq!(1, player.decode_concurrency());
        assert_eq!(Some(Duration::from_secs(10)), player.fetch_timeout().unwrap());
        assert_eq!(
            "http://cdn.local/samples/",
            player.assets().unwrap().unwrap().as_str()
        );

        let audio = player.audio().unwrap();
        assert_eq!("mock-device", audio.device());
        assert_eq!(48000, audio.sample_rate());
        assert!(!audio.start_suspended());

        let midi = player.midi().unwrap();
        assert_eq!("mock-midi", midi.device());
        assert_eq!(Some(9), midi.channel());
        assert_eq!(36, midi.base_note());

        assert_eq!(1200.0, player.trimbar().canvas_width());
        assert_eq!(2.0, player.trimbar().device_pixel_ratio());
        assert_eq!(2, player.initial_preset());
    }

    #[test]
    fn test_bad_timeout() {
        let player = parse(
            r#"
            catalog: presets.json
            fetch_timeout: soon
            "#,
        );
        assert!(matches!(
            player.fetch_timeout(),
            Err(ConfigError::Duration(value)) if value == "soon"
        ));
    }

    #[test]
    fn test_load_player_resolves_catalog_path() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("player.yaml");
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "catalog: presets.json")?;

        let player = load_player(&path)?;
        match player.catalog_source()? {
            CatalogSource::File(catalog) => {
                assert_eq!(PathBuf::from(dir.path()).join("presets.json"), catalog)
            }
            other => panic!("unexpected catalog source {:?}", other),
        }
        Ok(())
    }
}
