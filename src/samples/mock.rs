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
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use super::entry::SampleEntry;
use super::error::FetchError;
use super::fetch::Fetcher;
use crate::testutil::wav_bytes;

/// Builds `count` entries named s0.wav, s1.wav, ...
pub fn entries(count: usize) -> Vec<SampleEntry> {
    (0..count)
        .map(|i| {
            let url = Url::parse(&format!("http://mock.local/kit/s{}.wav", i))
                .expect("valid mock url");
            SampleEntry::new(url, None, None)
        })
        .collect()
}

/// A fetcher that serves short generated WAV files. Individual urls can be delayed,
/// made to fail or made to return bytes that won't decode.
pub struct FakeFetcher {
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<String>>,
    garbage: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetched: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> FakeFetcher {
        FakeFetcher {
            delays: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            garbage: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fetched: AtomicUsize::new(0),
        }
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().insert(url.to_string(), delay);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn garbage(&self, url: &str) {
        self.garbage.lock().insert(url.to_string());
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.lock().get(url.as_str()).copied();
        thread::sleep(delay.unwrap_or(Duration::from_millis(5)));

        let result = if self.failing.lock().contains(url.as_str()) {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        } else if self.garbage.lock().contains(url.as_str()) {
            Ok(b"not a wav file at all".to_vec())
        } else {
            wav_bytes(1, 8000, 8000).map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
        };

        self.fetched.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
