use super::round2;
use super::transport::{ProbeError, Transport};
use crate::settings::Settings;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

const BYTES_PER_MEGABIT: f64 = 1024.0 * 1024.0 / 8.0;

pub struct DownloadTest {
    urls: Vec<String>,
    test_duration: Duration,
    read_timeout: Duration,
}

impl DownloadTest {
    pub fn new(settings: &Settings) -> Self {
        Self {
            urls: settings.download_urls.clone(),
            test_duration: settings.test_duration,
            read_timeout: settings.download_timeout,
        }
    }

    /// Tries each candidate in order and keeps the best finished rate.
    ///
    /// A candidate that fails anywhere is dropped without credit. Once a
    /// candidate finishes at or past the test duration no further candidates
    /// are tried.
    pub async fn run<T, F>(&self, transport: &T, mut on_progress: F) -> DownloadResult
    where
        T: Transport + ?Sized,
        F: FnMut(DownloadProgress),
    {
        let mut best_mbps = 0.0_f64;

        for (candidate, url) in self.urls.iter().enumerate() {
            let attempt = match self.attempt(transport, candidate, url, &mut on_progress).await {
                Ok(attempt) => attempt,
                Err(err) => {
                    warn!(candidate, url = %url, error = %err, "download candidate abandoned");
                    continue;
                }
            };

            let speed_mbps = attempt.speed_mbps();
            debug!(candidate, bytes = attempt.bytes, elapsed = ?attempt.elapsed, speed_mbps, "download candidate finished");
            best_mbps = best_mbps.max(speed_mbps);

            if attempt.elapsed >= self.test_duration {
                info!(candidate, "test duration reached, skipping remaining servers");
                break;
            }
        }

        DownloadResult {
            speed_mbps: round2(best_mbps),
        }
    }

    async fn attempt<T, F>(
        &self,
        transport: &T,
        candidate: usize,
        url: &str,
        on_progress: &mut F,
    ) -> Result<ThroughputAttempt, ProbeError>
    where
        T: Transport + ?Sized,
        F: FnMut(DownloadProgress),
    {
        let mut attempt = ThroughputAttempt::start();

        let mut stream = timeout(self.read_timeout, transport.download(url))
            .await
            .map_err(|_| ProbeError::Timeout(self.read_timeout))??;

        loop {
            let chunk = match timeout(self.read_timeout, stream.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => break,
                Err(_) => return Err(ProbeError::Timeout(self.read_timeout)),
            };

            attempt.record(chunk);
            on_progress(attempt.progress(candidate, self.test_duration));
        }

        attempt.finish();
        Ok(attempt)
    }
}

/// Bytes received from one candidate. `bytes` only grows while the attempt runs.
#[derive(Debug)]
struct ThroughputAttempt {
    started: Instant,
    bytes: u64,
    elapsed: Duration,
}

impl ThroughputAttempt {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            bytes: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, chunk_len: usize) {
        self.bytes += chunk_len as u64;
        self.elapsed = self.started.elapsed();
    }

    fn finish(&mut self) {
        self.elapsed = self.started.elapsed();
    }

    fn speed_mbps(&self) -> f64 {
        speed_mbps(self.bytes, self.elapsed)
    }

    fn progress(&self, candidate: usize, test_duration: Duration) -> DownloadProgress {
        DownloadProgress {
            candidate,
            downloaded_bytes: self.bytes,
            elapsed: self.elapsed,
            speed_mbps: self.speed_mbps(),
            ratio: (self.elapsed.as_secs_f64() / test_duration.as_secs_f64()).min(1.0),
        }
    }
}

/// Megabits (2^20 bits) per second; zero when no time has passed.
pub fn speed_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / BYTES_PER_MEGABIT / secs
}

#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub candidate: usize,
    pub downloaded_bytes: u64,
    pub elapsed: Duration,
    pub speed_mbps: f64,
    /// Elapsed share of the test duration, capped at 1.0.
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub speed_mbps: f64,
}
