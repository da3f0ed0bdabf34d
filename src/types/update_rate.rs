//! Output rate control for frame consumers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate at which a consumer wants to see frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRate {
    /// Every frame at the capture rate (commonly 100 Hz).
    #[default]
    Native,

    /// At most this many frames per second, latest frame wins.
    /// A cap at or above the capture rate behaves like `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Resolve against the capture frame rate.
    pub fn normalize(self, frame_rate: f64) -> Self {
        match self {
            UpdateRate::Max(hz) if hz as f64 >= frame_rate => UpdateRate::Native,
            other => other,
        }
    }

    /// Interval between emitted frames, `None` when no throttling applies.
    pub fn throttle_interval(self, frame_rate: f64) -> Option<Duration> {
        match self.normalize(frame_rate) {
            UpdateRate::Native => None,
            UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_above_frame_rate_is_native() {
        assert_eq!(UpdateRate::Max(240).normalize(100.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(100).normalize(100.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(10).normalize(100.0), UpdateRate::Max(10));
    }

    #[test]
    fn interval_only_when_throttling() {
        assert_eq!(UpdateRate::Native.throttle_interval(100.0), None);
        assert_eq!(UpdateRate::Max(200).throttle_interval(100.0), None);
        assert_eq!(
            UpdateRate::Max(4).throttle_interval(100.0),
            Some(Duration::from_millis(250))
        );
    }
}
