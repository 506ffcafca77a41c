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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::decode::decode;
use super::entry::{DecodedSample, SampleEntry};
use super::error::SampleError;
use super::fetch::Fetcher;

/// The number of samples fetched and decoded at once when not configured.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Per-item progress reported while a batch decodes.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeEvent {
    Decoded {
        index: usize,
        done: usize,
        total: usize,
    },
    Failed {
        index: usize,
        url: String,
        error: String,
        done: usize,
        total: usize,
    },
}

impl DecodeEvent {
    /// Items finished so far, successful or not.
    pub fn done(&self) -> usize {
        match self {
            DecodeEvent::Decoded { done, .. } | DecodeEvent::Failed { done, .. } => *done,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            DecodeEvent::Decoded { total, .. } | DecodeEvent::Failed { total, .. } => *total,
        }
    }
}

/// Progress callback. Called from pool tasks, once per item.
pub type ProgressFn = Arc<dyn Fn(&DecodeEvent) + Send + Sync>;

/// Fetches and decodes sample sets with bounded concurrency.
#[derive(Clone)]
pub struct DecodePool {
    fetcher: Arc<dyn Fetcher>,
    concurrency: usize,
}

impl DecodePool {
    /// Creates a pool. A concurrency of zero is treated as one.
    pub fn new(fetcher: Arc<dyn Fetcher>, concurrency: usize) -> DecodePool {
        DecodePool {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches and decodes every entry. The result has one slot per entry, in input
    /// order, holding `None` where the entry could not be fetched or decoded. Every item
    /// has finished by the time this returns.
    pub async fn decode_all(
        &self,
        entries: &[SampleEntry],
        progress: ProgressFn,
    ) -> Vec<Option<DecodedSample>> {
        let total = entries.len();
        let mut results: Vec<Option<DecodedSample>> = vec![None; total];
        if total == 0 {
            return results;
        }

        let permits = Arc::new(Semaphore::new(self.concurrency.min(total)));
        let done = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let permits = permits.clone();
            let fetcher = self.fetcher.clone();
            let entry = entry.clone();
            let done = done.clone();
            let progress = progress.clone();

            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        let task_entry = entry.clone();
                        // The permit is held until the blocking work completes.
                        match tokio::task::spawn_blocking(move || {
                            fetch_and_decode(fetcher.as_ref(), &task_entry)
                        })
                        .await
                        {
                            Ok(result) => result,
                            Err(e) => Err(SampleError::Task(e.to_string())),
                        }
                    }
                    Err(e) => Err(SampleError::Task(e.to_string())),
                };

                let done = done.fetch_add(1, Ordering::SeqCst) + 1;
                let event = match &result {
                    Ok(_) => {
                        debug!(index, done, total, sample = entry.name(), "Decoded");
                        DecodeEvent::Decoded { index, done, total }
                    }
                    Err(e) => {
                        warn!(index, url = entry.key(), err = %e, "Failed to load sample");
                        DecodeEvent::Failed {
                            index,
                            url: entry.key().to_string(),
                            error: e.to_string(),
                            done,
                            total,
                        }
                    }
                };
                progress(&event);

                (index, result.ok())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, sample)) => results[index] = sample,
                Err(e) => warn!(err = %e, "Decode task panicked"),
            }
        }

        let loaded = results.iter().filter(|r| r.is_some()).count();
        info!(
            loaded,
            failed = total - loaded,
            concurrency = self.concurrency.min(total),
            "Decoded sample set"
        );
        results
    }
}

fn fetch_and_decode(
    fetcher: &dyn Fetcher,
    entry: &SampleEntry,
) -> Result<DecodedSample, SampleError> {
    let bytes = fetcher.fetch(entry.url())?;
    let extension = entry.extension();
    let buffer = decode(bytes, extension.as_deref())?;
    Ok(DecodedSample::new(entry.clone(), buffer))
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::samples::mock::{entries, FakeFetcher};

    fn collect() -> (ProgressFn, Arc<Mutex<Vec<DecodeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let progress: ProgressFn = Arc::new(move |event: &DecodeEvent| {
            sink.lock().push(event.clone());
        });
        (progress, events)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_preserved_with_variable_latency() {
        let entries = entries(10);
        let fetcher = Arc::new(FakeFetcher::new());
        // The first item is the slowest, the last the fastest.
        for (i, entry) in entries.iter().enumerate() {
            fetcher.delay(entry.key(), Duration::from_millis(((10 - i) * 15) as u64));
        }
        let pool = DecodePool::new(fetcher.clone(), 3);
        let (progress, events) = collect();

        let results = pool.decode_all(&entries, progress).await;

        assert_eq!(10, results.len());
        for (i, result) in results.iter().enumerate() {
            let sample = result.as_ref().expect("every item should decode");
            assert_eq!(entries[i].key(), sample.url());
        }
        assert!(fetcher.max_in_flight() <= 3);
        assert!(fetcher.max_in_flight() >= 1);

        let events = events.lock();
        assert_eq!(10, events.len());
        let mut done: Vec<usize> = events.iter().map(|e| e.done()).collect();
        done.sort();
        assert_eq!((1..=10).collect::<Vec<_>>(), done);
        assert!(events.iter().all(|e| e.total() == 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_leaves_hole() {
        let entries = entries(5);
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.fail(entries[2].key());
        let pool = DecodePool::new(fetcher, 3);
        let (progress, events) = collect();

        let results = pool.decode_all(&entries, progress).await;

        assert_eq!(5, results.len());
        assert!(results[2].is_none());
        assert_eq!(4, results.iter().filter(|r| r.is_some()).count());

        let events = events.lock();
        let failed: Vec<&DecodeEvent> = events
            .iter()
            .filter(|e| matches!(e, DecodeEvent::Failed { .. }))
            .collect();
        assert_eq!(1, failed.len());
        match failed[0] {
            DecodeEvent::Failed { index, url, .. } => {
                assert_eq!(2, *index);
                assert_eq!(entries[2].key(), url);
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_undecodable_bytes() {
        let entries = entries(2);
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.garbage(entries[0].key());
        let pool = DecodePool::new(fetcher, 3);
        let (progress, _) = collect();

        let results = pool.decode_all(&entries, progress).await;
        assert!(results[0].is_none());
        assert!(results[1].is_some());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pool = DecodePool::new(Arc::new(FakeFetcher::new()), 0);
        assert_eq!(1, pool.concurrency());
        let (progress, events) = collect();
        assert!(pool.decode_all(&[], progress).await.is_empty());
        assert!(events.lock().is_empty());
    }
}
