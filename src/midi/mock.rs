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

use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::info;

/// A mock input device. Events are injected with `mock_event`.
#[derive(Clone)]
pub struct Device {
    name: String,
    sender: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns true while something is watching this device.
    pub fn is_watching(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Sends the raw event to the watcher. Returns false if nothing is watching or
    /// the watcher has gone away.
    pub fn mock_event(&self, event: &[u8]) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.try_send(event.to_vec()).is_ok(),
            None => false,
        }
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), Box<dyn Error>> {
        let mut current = self.sender.lock();
        if current.is_some() {
            return Err("Already watching events.".into());
        }
        info!(device = self.name, "Watching mock MIDI events.");
        *current = Some(sender);
        Ok(())
    }

    fn stop_watch_events(&self) {
        self.sender.lock().take();
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use tokio::sync::mpsc;

    use crate::midi::Device as _;

    #[tokio::test]
    async fn test_watch_and_stop() -> Result<(), Box<dyn Error>> {
        let device = super::Device::get("mock");
        assert!(!device.mock_event(&[0x90, 36, 100]));

        let (tx, mut rx) = mpsc::channel(4);
        device.watch_events(tx)?;
        assert!(device.is_watching());

        let (second_tx, _) = mpsc::channel(1);
        assert!(device.watch_events(second_tx).is_err());

        assert!(device.mock_event(&[0x90, 36, 100]));
        assert_eq!(Some(vec![0x90, 36, 100]), rx.recv().await);

        device.stop_watch_events();
        assert!(!device.is_watching());
        assert_eq!(None, rx.recv().await);
        Ok(())
    }
}
