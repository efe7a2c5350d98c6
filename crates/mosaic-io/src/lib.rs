//! Non-blocking byte fetching for remote assets.
//!
//! One worker thread per request; completions are drained through channels
//! so the import thread never blocks mid-walk. `settle` is the barrier that
//! waits for everything still in flight.

use std::{
    sync::Arc,
    sync::mpsc::{self, Receiver, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported scheme in '{0}'")]
    UnsupportedScheme(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("fetch worker disconnected")]
    Disconnected,
}

/// The transport seam: turn a URL into bytes or a failure.
pub trait ByteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher over a blocking HTTP client.
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: "MosaicImport/0.1".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| FetchError::UnsupportedScheme(url.to_string()))?;
        let scheme = parsed.scheme().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::UnsupportedScheme(url.to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()
            .map_err(|err| FetchError::Request(err.to_string()))?;
        let response = client
            .get(parsed)
            .send()
            .map_err(|err| FetchError::Request(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .map_err(|err| FetchError::Request(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug)]
pub struct FetchResult {
    pub request_id: u64,
    pub url: String,
    pub outcome: Result<Vec<u8>, FetchError>,
}

struct PendingFetch {
    request_id: u64,
    url: String,
    receiver: Receiver<Result<Vec<u8>, FetchError>>,
    join: Option<JoinHandle<()>>,
}

/// Runs fetches on worker threads and hands the results back on the calling
/// thread via `poll` or the `settle` barrier.
pub struct FetchPool {
    fetcher: Arc<dyn ByteFetcher>,
    pending: Vec<PendingFetch>,
}

impl FetchPool {
    pub fn new(fetcher: Arc<dyn ByteFetcher>) -> Self {
        Self {
            fetcher,
            pending: Vec::new(),
        }
    }

    /// Schedule a fetch. The result surfaces from a later `poll`/`settle`.
    pub fn request(&mut self, request_id: u64, url: &str) {
        let (tx, rx) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let url_owned = url.to_string();
        let join = thread::spawn(move || {
            let outcome = fetcher.fetch(&url_owned);
            let _ = tx.send(outcome);
        });
        self.pending.push(PendingFetch {
            request_id,
            url: url.to_string(),
            receiver: rx,
            join: Some(join),
        });
    }

    /// Collect whatever has finished without blocking.
    pub fn poll(&mut self) -> Vec<FetchResult> {
        let mut ready = Vec::new();
        let mut still_pending = Vec::new();
        for mut fetch in self.pending.drain(..) {
            match fetch.receiver.try_recv() {
                Ok(outcome) => {
                    if let Some(join) = fetch.join.take() {
                        let _ = join.join();
                    }
                    ready.push(FetchResult {
                        request_id: fetch.request_id,
                        url: fetch.url,
                        outcome,
                    });
                }
                Err(TryRecvError::Empty) => still_pending.push(fetch),
                Err(TryRecvError::Disconnected) => {
                    if let Some(join) = fetch.join.take() {
                        let _ = join.join();
                    }
                    ready.push(FetchResult {
                        request_id: fetch.request_id,
                        url: fetch.url,
                        outcome: Err(FetchError::Disconnected),
                    });
                }
            }
        }
        self.pending = still_pending;
        ready
    }

    /// Barrier: block until every outstanding fetch has completed.
    pub fn settle(&mut self) -> Vec<FetchResult> {
        let mut results = Vec::with_capacity(self.pending.len());
        for mut fetch in self.pending.drain(..) {
            let outcome = match fetch.receiver.recv() {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Disconnected),
            };
            if let Some(join) = fetch.join.take() {
                let _ = join.join();
            }
            debug!(url = %fetch.url, ok = outcome.is_ok(), "fetch settled");
            results.push(FetchResult {
                request_id: fetch.request_id,
                url: fetch.url,
                outcome,
            });
        }
        results
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl ByteFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status(404))
        }
    }

    #[test]
    fn settle_drains_all_requests() {
        let mut map = HashMap::new();
        map.insert("https://a/img.png".to_string(), vec![1, 2, 3]);
        let mut pool = FetchPool::new(Arc::new(MapFetcher(map)));
        pool.request(1, "https://a/img.png");
        pool.request(2, "https://a/missing.png");
        let mut results = pool.settle();
        assert!(!pool.has_pending());
        results.sort_by_key(|r| r.request_id);
        assert_eq!(results[0].outcome.as_ref().unwrap(), &vec![1, 2, 3]);
        assert!(results[1].outcome.is_err());
    }

    #[test]
    fn http_fetcher_rejects_file_urls() {
        let fetcher = HttpFetcher::new();
        assert!(matches!(
            fetcher.fetch("file:///etc/hosts"),
            Err(FetchError::UnsupportedScheme(_))
        ));
    }
}
