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
use std::fs;
use std::io::Read;
use std::time::Duration;

use tracing::debug;
use url::Url;

use super::error::FetchError;

/// Retrieves the raw bytes behind a sample url. Implementations block; callers run them
/// off the async executor.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http`/`https` urls with a shared agent and reads `file` urls from disk.
pub struct UrlFetcher {
    agent: ureq::Agent,
}

impl UrlFetcher {
    /// Creates a fetcher. Without a timeout a stalled request waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> UrlFetcher {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        UrlFetcher {
            agent: builder.build(),
        }
    }

    fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match self.agent.get(url.as_str()).call() {
            Ok(response) => {
                let mut bytes = Vec::new();
                response.into_reader().read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Err(e) => Err(FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn fetch_file(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidPath(url.to_string()))?;
        // Include the path so the user sees which file failed.
        fs::read(&path).map_err(|e| {
            FetchError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })
    }
}

impl Default for UrlFetcher {
    fn default() -> Self {
        UrlFetcher::new(None)
    }
}

impl Fetcher for UrlFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!(url = url.as_str(), "Fetching");
        match url.scheme() {
            "http" | "https" => self.fetch_http(url),
            "file" => self.fetch_file(url),
            scheme => Err(FetchError::UnsupportedScheme(scheme.to_string())),
        }
    }
}
