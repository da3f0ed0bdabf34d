//! Replay backend for recorded sessions
//!
//! A recording is a YAML document holding the server description, the
//! catalog and a list of frames. Playback paces frames at the recorded rate on
//! a dedicated thread, exactly like a live server would deliver them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendResult, FrameSink};
use crate::providers::delivery::DeliveryThread;
use crate::types::{ConnectionParams, DataDescription, ErrorCode, MocapFrame, ServerDescription};
use crate::{ClientError, Result};

/// Recorded frame rates accepted for playback (Hz).
pub const FRAME_RATE_RANGE: std::ops::RangeInclusive<f64> = 0.01..=10_000.0;

/// Playback speed range accepted by [`ReplayBackend::set_speed`].
pub const SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.1..=10.0;

/// A recorded capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    pub server: ServerDescription,
    pub descriptions: Vec<DataDescription>,
    /// Capture rate the frames were recorded at (Hz).
    pub frame_rate: f64,
    pub frames: Vec<MocapFrame>,
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            server: ServerDescription::default(),
            descriptions: Vec::new(),
            frame_rate: 100.0,
            frames: Vec::new(),
        }
    }
}

impl Recording {
    /// Load a recording from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ClientError::recording(path, e))?;
        Self::from_yaml(&text).map_err(|e| ClientError::Parse {
            context: format!("recording {}", path.display()),
            details: e.to_string(),
        })
    }

    /// Parse a recording from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let recording: Recording = serde_yaml_ng::from_str(text)?;
        if !recording.has_valid_frame_rate() {
            return Err(ClientError::Parse {
                context: "recording".to_string(),
                details: format!(
                    "Invalid frame rate {}, expected {} to {} Hz",
                    recording.frame_rate,
                    FRAME_RATE_RANGE.start(),
                    FRAME_RATE_RANGE.end()
                ),
            });
        }
        Ok(recording)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn has_valid_frame_rate(&self) -> bool {
        FRAME_RATE_RANGE.contains(&self.frame_rate)
    }

    /// Recorded duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.frame_rate
    }
}

/// Backend that plays a [`Recording`].
pub struct ReplayBackend {
    recording: Arc<Recording>,

    /// Playback speed multiplier (1.0 = recorded rate)
    speed: f64,

    /// Restart from the first frame when the recording ends
    looped: bool,

    sink: Option<FrameSink>,
    delivery: Option<DeliveryThread>,
    connected: bool,
}

impl ReplayBackend {
    /// Create a replay backend from a recording file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let recording = Recording::load(path)?;
        info!(
            "Opened recording {}: {} frames at {}Hz",
            path.display(),
            recording.frames.len(),
            recording.frame_rate
        );
        Ok(Self::new(recording))
    }

    pub fn new(recording: Recording) -> Self {
        Self {
            recording: Arc::new(recording),
            speed: 1.0,
            looped: false,
            sink: None,
            delivery: None,
            connected: false,
        }
    }

    /// Set playback speed, clamped to [`SPEED_RANGE`].
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end());
        if self.speed != speed {
            warn!(requested = speed, speed = self.speed, "Playback speed out of range, clamped");
        }
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

#[async_trait::async_trait]
impl Backend for ReplayBackend {
    async fn connect(&mut self, params: &ConnectionParams) -> BackendResult<()> {
        if self.connected {
            return Err(ErrorCode::InvalidOperation);
        }

        let sink: FrameSink = match &self.sink {
            Some(sink) => Arc::clone(sink),
            None => Arc::new(|_: &MocapFrame| {}),
        };

        if !self.recording.has_valid_frame_rate() {
            warn!(frame_rate = self.recording.frame_rate, "Recording has an unusable frame rate");
            return Err(ErrorCode::InvalidArgument);
        }
        let period = Duration::try_from_secs_f64(1.0 / (self.recording.frame_rate * self.speed))
            .map_err(|_| ErrorCode::InvalidArgument)?;
        let recording = Arc::clone(&self.recording);
        let looped = self.looped;
        let mut position = 0usize;
        let source = move || {
            if position >= recording.frames.len() {
                if !looped || recording.frames.is_empty() {
                    return None;
                }
                position = 0;
            }
            let frame = recording.frames[position].clone();
            position += 1;
            Some(frame)
        };

        let delivery = DeliveryThread::spawn(period, source, sink).map_err(|e| {
            warn!("Failed to spawn replay thread: {}", e);
            ErrorCode::Internal
        })?;
        self.delivery = Some(delivery);
        self.connected = true;

        info!(
            transport = %params.transport,
            frames = self.recording.frames.len(),
            speed = self.speed,
            "Replay started"
        );
        Ok(())
    }

    async fn server_description(&mut self) -> BackendResult<ServerDescription> {
        if !self.connected {
            return Err(ErrorCode::InvalidOperation);
        }
        Ok(self.recording.server.clone())
    }

    async fn data_descriptions(&mut self) -> BackendResult<Option<Vec<DataDescription>>> {
        if !self.connected {
            return Err(ErrorCode::InvalidOperation);
        }
        Ok(Some(self.recording.descriptions.clone()))
    }

    fn set_frame_sink(&mut self, sink: FrameSink) {
        self.sink = Some(sink);
    }

    async fn disconnect(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.stop().await;
        }
        if self.connected {
            debug!("Replay stopped");
        }
        self.connected = false;
    }

    fn frame_rate(&self) -> f64 {
        self.recording.frame_rate * self.speed
    }

    /// True once a non-looping playback has delivered every frame.
    fn is_finished(&self) -> bool {
        self.delivery.as_ref().is_some_and(DeliveryThread::is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use std::sync::Mutex;

    #[test]
    fn recording_round_trips_through_yaml() {
        let recording = test_utils::sample_recording(5);
        let yaml = recording.to_yaml().unwrap();
        let parsed = Recording::from_yaml(&yaml).unwrap();

        assert_eq!(parsed.frames.len(), 5);
        assert_eq!(parsed.descriptions.len(), recording.descriptions.len());
        assert_eq!(parsed.server.host_app, recording.server.host_app);
        assert!((parsed.duration() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn rejects_frame_rates_outside_playable_range() {
        for text in [
            "frame_rate: 0\n",
            "frame_rate: 1.0e-300\n",
            "frame_rate: 20000.0\n",
            "frame_rate: .nan\n",
        ] {
            let error = Recording::from_yaml(text).unwrap_err();
            assert!(matches!(error, ClientError::Parse { .. }), "{text}");
        }
        assert!(Recording::from_yaml("frame_rate: 10000.0\n").is_ok());
        assert!(Recording::from_yaml("frame_rate: 0.01\n").is_ok());
    }

    #[tokio::test]
    async fn unusable_frame_rate_fails_connect() {
        for frame_rate in [0.0, 1.0e-300, f64::NAN] {
            let mut backend = ReplayBackend::new(Recording { frame_rate, ..Recording::default() });
            let result = backend.connect(&ConnectionParams::default()).await;

            assert_eq!(result, Err(ErrorCode::InvalidArgument), "frame rate {frame_rate}");
            assert!(!backend.is_finished());
            backend.disconnect().await;
        }
    }

    #[test]
    fn speed_is_clamped_to_supported_range() {
        let mut backend = ReplayBackend::new(Recording::default());
        backend.set_speed(20.0);
        assert_eq!(backend.frame_rate(), 100.0 * SPEED_RANGE.end());
        backend.set_speed(0.5);
        assert_eq!(backend.frame_rate(), 50.0);
    }

    #[test]
    fn missing_file_is_a_recording_error() {
        let error = Recording::load("/nonexistent/take.yaml").unwrap_err();
        assert!(matches!(error, ClientError::Recording { .. }));
    }

    #[tokio::test]
    async fn plays_frames_in_order_then_stops() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        let mut backend = ReplayBackend::new(test_utils::sample_recording(6));
        backend.set_speed(10.0);
        backend.set_frame_sink(Arc::new(move |frame: &MocapFrame| {
            log.lock().unwrap().push(frame.frame_index);
        }));

        backend.connect(&ConnectionParams::default()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while !backend.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("replay did not finish");
        backend.disconnect().await;

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }
}
