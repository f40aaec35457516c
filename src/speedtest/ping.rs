use super::transport::{ProbeError, Transport};
use crate::settings::Settings;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

pub struct PingTest {
    samples: Vec<f64>,
    ping_count: usize,
    url: String,
    timeout: std::time::Duration,
    fallback_ms: f64,
}

impl PingTest {
    pub fn new(settings: &Settings) -> Self {
        Self {
            samples: Vec::with_capacity(settings.ping_count),
            ping_count: settings.ping_count,
            url: settings.ping_url.clone(),
            timeout: settings.ping_timeout,
            fallback_ms: settings.ping_fallback_ms,
        }
    }

    /// Runs every attempt in sequence. A failed attempt records the fallback
    /// value, so the sample always holds `ping_count` entries.
    pub async fn run<T: Transport + ?Sized>(&mut self, transport: &T) -> PingResult {
        self.samples.clear();

        for attempt in 1..=self.ping_count {
            let start = Instant::now();
            let outcome = match timeout(self.timeout, transport.head(&self.url)).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(self.timeout)),
            };

            let sample = match outcome {
                Ok(()) => start.elapsed().as_secs_f64() * 1000.0,
                Err(err) => {
                    warn!(attempt, url = %self.url, error = %err, "ping failed, using fallback");
                    self.fallback_ms
                }
            };
            debug!(attempt, sample_ms = sample, "ping sample");
            self.samples.push(sample);
        }

        self.calculate_result()
    }

    fn calculate_result(&self) -> PingResult {
        PingResult {
            samples: self.samples.clone(),
            median_ms: median(&self.samples),
        }
    }
}

/// Middle element after an ascending sort; the upper middle for even lengths.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() / 2])
}

#[derive(Debug, Clone)]
pub struct PingResult {
    pub samples: Vec<f64>,
    pub median_ms: Option<f64>,
}
