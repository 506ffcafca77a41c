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
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Shortest window that is still audible, in seconds.
pub const MIN_WINDOW_SECONDS: f64 = 0.01;

/// The region of a decoded buffer that plays on trigger, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn new(start: f64, end: f64) -> TrimWindow {
        TrimWindow { start, end }
    }

    /// The window covering a whole buffer.
    pub fn full(duration: f64) -> TrimWindow {
        TrimWindow {
            start: 0.0,
            end: duration.max(0.0),
        }
    }

    /// Length of the window in seconds. Negative if the window is inverted.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Clamps the window into `[0, duration]` and makes it at least `min_len` long.
    /// If that would push `end` past the buffer, `start` is pulled back instead.
    pub fn clamped(&self, duration: f64, min_len: f64) -> TrimWindow {
        let duration = duration.max(0.0);
        let start = finite_or(self.start, 0.0).clamp(0.0, duration);
        let end = finite_or(self.end, duration).clamp(0.0, duration);
        let end = end.max(start + min_len).min(duration);
        let start = start.min((end - min_len).max(0.0));
        TrimWindow { start, end }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Trim windows keyed by sample url.
///
/// This is a plain map: writers clamp before calling `set`. Nothing here is persisted;
/// callers snapshot it with `to_json` when they want to keep it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrimStore {
    windows: HashMap<String, TrimWindow>,
}

impl TrimStore {
    pub fn new() -> TrimStore {
        TrimStore::default()
    }

    pub fn get(&self, url: &str) -> Option<&TrimWindow> {
        self.windows.get(url)
    }

    pub fn set(&mut self, url: &str, window: TrimWindow) {
        self.windows.insert(url.to_string(), window);
    }

    pub fn delete(&mut self, url: &str) -> Option<TrimWindow> {
        self.windows.remove(url)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }

    /// Serializes every stored window as a JSON object keyed by url.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a snapshot previously produced by `to_json`.
    pub fn from_json(json: &str) -> Result<TrimStore, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Merges another store into this one, overwriting windows for matching urls.
    pub fn extend(&mut self, other: TrimStore) {
        self.windows.extend(other.windows);
    }
}
