pub mod download;
pub mod ping;
pub mod transport;
pub mod upload;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedTestResult {
    pub ping_ms: Option<f64>,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Ping,
    Download,
    Upload,
    Complete,
}

impl TestPhase {
    pub fn activity(self) -> Option<&'static str> {
        match self {
            TestPhase::Ping => Some("Measuring ping..."),
            TestPhase::Download => Some("Testing download speed..."),
            TestPhase::Upload => Some("Testing upload speed..."),
            TestPhase::Idle | TestPhase::Complete => None,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_latency(ping_ms: Option<f64>) -> String {
    match ping_ms {
        Some(ms) => format!("{:.0} ms", ms),
        None => "N/A".to_string(),
    }
}

pub fn format_mbps(mbps: f64) -> String {
    format!("{:.2} Mbps", mbps)
}
