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

//! A process-wide publish/subscribe channel for status and progress. Created once at
//! startup and handed to whoever needs it by cloning.

use tokio::sync::broadcast;
use tracing::debug;

use crate::loader::LoadReport;
use crate::trim::TrimWindow;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// The status line changed.
    Status(String),
    /// Something the user should see in the error area.
    Error(String),
    /// Decode progress of the preset being loaded.
    Progress { done: usize, total: usize },
    PresetLoaded(LoadReport),
    Playing { pad_index: usize, window: TrimWindow },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Message>,
}

impl EventBus {
    pub fn new() -> EventBus {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        EventBus { tx }
    }

    /// Publishes a message to every current subscriber. Slow subscribers lose the
    /// oldest messages.
    pub fn publish(&self, message: Message) {
        if self.tx.send(message).is_err() {
            debug!("No subscribers for event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
