use crate::updater::UpdateCommand;
use anyhow::{bail, Result};
use reqwest::Url;
use std::time::Duration;

const PING_URL: &str = "https://cloudflare.com";
const DOWNLOAD_URLS: [&str; 2] = [
    "https://speed.cloudflare.com/__down?bytes=10000000",
    "https://proof.ovh.net/files/10Mb.dat",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub ping_url: String,
    pub ping_count: usize,
    pub ping_timeout: Duration,
    /// Substituted for any ping attempt that fails at the transport level.
    pub ping_fallback_ms: f64,

    /// Tried in order; the best finished rate wins.
    pub download_urls: Vec<String>,
    pub test_duration: Duration,
    /// Applies to opening each candidate and to every chunk read after that.
    pub download_timeout: Duration,

    pub upload_ratio: f64,

    pub update: UpdateCommand,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ping_url: PING_URL.to_string(),
            ping_count: 3,
            ping_timeout: Duration::from_secs(3),
            ping_fallback_ms: 100.0,
            download_urls: DOWNLOAD_URLS.iter().map(|url| url.to_string()).collect(),
            test_duration: Duration::from_millis(5000),
            download_timeout: Duration::from_secs(10),
            upload_ratio: 0.3,
            update: UpdateCommand::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.ping_count == 0 {
            bail!("ping count must be at least 1");
        }
        if self.download_urls.is_empty() {
            bail!("at least one download server is required");
        }
        if self.test_duration.is_zero() {
            bail!("test duration must be greater than zero");
        }

        for url in std::iter::once(&self.ping_url).chain(&self.download_urls) {
            if let Err(err) = Url::parse(url) {
                bail!("invalid url '{}': {}", url, err);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_probe_constants() {
        let settings = Settings::default();
        assert_eq!(settings.ping_count, 3);
        assert_eq!(settings.ping_timeout, Duration::from_secs(3));
        assert_eq!(settings.ping_fallback_ms, 100.0);
        assert_eq!(settings.download_urls.len(), 2);
        assert_eq!(settings.test_duration, Duration::from_millis(5000));
        assert_eq!(settings.download_timeout, Duration::from_secs(10));
        assert_eq!(settings.upload_ratio, 0.3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_server_list() {
        let settings = Settings {
            download_urls: Vec::new(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_duration() {
        let settings = Settings {
            test_duration: Duration::ZERO,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let settings = Settings {
            download_urls: vec!["not a url".to_string()],
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }
}
