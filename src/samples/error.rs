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

/// Error types for fetching a sample resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("Url does not name a local file: {0}")]
    InvalidPath(String),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error types for decoding fetched bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Audio decode error: {0}")]
    Audio(#[from] symphonia::core::errors::Error),

    #[error("No decodable audio track")]
    NoTrack,

    #[error("Decoded audio is empty")]
    Empty,
}

/// A failure to produce one decoded sample. These are per-item and never abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Decode task failed: {0}")]
    Task(String),
}
