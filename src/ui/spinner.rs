use std::time::{Duration, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// An activity indicator owned by whoever drives the work it describes.
///
/// The frame is derived from the time since `start`, so the owner only has
/// to redraw on a timer. Dropping the value removes it from the screen.
#[derive(Debug)]
pub struct Spinner {
    label: String,
    started: Instant,
}

impl Spinner {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frame(&self) -> &'static str {
        frame_at(self.started.elapsed())
    }
}

fn frame_at(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_millis() / FRAME_INTERVAL.as_millis()) as usize;
    FRAMES[index % FRAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_advance_and_wrap() {
        assert_eq!(frame_at(Duration::ZERO), "⠋");
        assert_eq!(frame_at(Duration::from_millis(79)), "⠋");
        assert_eq!(frame_at(Duration::from_millis(80)), "⠙");
        assert_eq!(frame_at(FRAME_INTERVAL * 10), "⠋");
    }
}
