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

//! Sample sets and how they get into memory.
//!
//! This module provides:
//! - Normalised sample entries and presets
//! - Fetching of sample resources over HTTP or from disk
//! - Decoding of fetched bytes into PCM
//! - A bounded-concurrency pool that fetches and decodes a whole preset

mod decode;
mod entry;
mod error;
mod fetch;
#[cfg(test)]
pub mod mock;
mod pool;

pub use decode::{decode, PcmBuffer};
pub use entry::{DecodedSample, Preset, RawSampleEntry, SampleEntry, DEFAULT_PLAYBACK_RATE};
pub use error::{DecodeError, FetchError, SampleError};
pub use fetch::{Fetcher, UrlFetcher};
pub use pool::{DecodeEvent, DecodePool, ProgressFn, DEFAULT_CONCURRENCY};
