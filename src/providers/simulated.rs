//! In-process simulated backend
//!
//! Stands in for a capture server: it accepts or refuses connections per
//! transport mode, reports a configurable server description and catalog, and
//! delivers frames on a timer from its own thread.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendResult, FrameSink};
use crate::providers::delivery::DeliveryThread;
use crate::types::{
    AnalogChannel, CompositeId, ConnectionParams, DataDescription, DeviceSample, ErrorCode,
    ForcePlateSample, LabeledMarker, MarkerKind, MocapFrame, Quat, RIGID_BODY_TRACKING_VALID,
    RigidBodyDescription, RigidBodyPose, ServerDescription, TransportMode, Vec3,
};

/// Default capture rate of the simulated server.
pub const DEFAULT_FRAME_RATE: f64 = 100.0;

/// Where simulated frames come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FrameScript {
    /// Endless frames with every catalog rigid body moving on a circle.
    #[default]
    Synthetic,
    /// These frames once, in order, then nothing.
    Once(Vec<MocapFrame>),
    /// These frames repeated forever.
    Looped(Vec<MocapFrame>),
}

/// Settings for a [`SimulatedBackend`], loadable from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedOptions {
    /// Transport modes the simulated server accepts.
    pub accept: Vec<TransportMode>,
    /// Code returned for refused connects.
    pub connect_error: ErrorCode,
    /// Hold refused connects for this long before answering (simulates silence).
    pub connect_delay_ms: u64,
    pub server: ServerDescription,
    /// Fail the server description call with this code.
    pub server_error: Option<ErrorCode>,
    /// Catalog to report; `None` yields a null result.
    pub catalog: Option<Vec<DataDescription>>,
    /// Fail the catalog call with this code.
    pub catalog_error: Option<ErrorCode>,
    pub frame_rate: f64,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            accept: vec![TransportMode::Multicast, TransportMode::Unicast],
            connect_error: ErrorCode::Network,
            connect_delay_ms: 0,
            server: ServerDescription::default(),
            server_error: None,
            catalog: Some(vec![DataDescription::RigidBody(RigidBodyDescription {
                name: "Body1".to_string(),
                id: 1,
                parent_id: -1,
                offset: Vec3::ZERO,
                markers: Vec::new(),
            })]),
            catalog_error: None,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// Simulated capture server.
///
/// Every connect attempt is recorded and can be inspected with
/// [`SimulatedBackend::attempts`], including after the backend has been moved
/// into a session (via [`SimulatedBackend::attempt_log`]).
pub struct SimulatedBackend {
    options: SimulatedOptions,
    script: FrameScript,
    sink: Option<FrameSink>,
    delivery: Option<DeliveryThread>,
    connected: bool,
    attempts: Arc<Mutex<Vec<ConnectionParams>>>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(SimulatedOptions::default())
    }
}

impl SimulatedBackend {
    pub fn new(options: SimulatedOptions) -> Self {
        Self {
            options,
            script: FrameScript::Synthetic,
            sink: None,
            delivery: None,
            connected: false,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Only accept these transport modes.
    pub fn accepting(mut self, modes: &[TransportMode]) -> Self {
        self.options.accept = modes.to_vec();
        self
    }

    /// Refuse connects with this code.
    pub fn with_connect_error(mut self, code: ErrorCode) -> Self {
        self.options.connect_error = code;
        self
    }

    /// Delay every refused connect by `delay` before answering.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.options.connect_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_server(mut self, server: ServerDescription) -> Self {
        self.options.server = server;
        self
    }

    pub fn with_server_error(mut self, code: ErrorCode) -> Self {
        self.options.server_error = Some(code);
        self
    }

    /// Report this catalog; `None` simulates a null result.
    pub fn with_catalog(mut self, catalog: Option<Vec<DataDescription>>) -> Self {
        self.options.catalog = catalog;
        self
    }

    pub fn with_catalog_error(mut self, code: ErrorCode) -> Self {
        self.options.catalog_error = Some(code);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.options.frame_rate = frame_rate;
        self
    }

    pub fn with_script(mut self, script: FrameScript) -> Self {
        self.script = script;
        self
    }

    /// Connect attempts seen so far.
    pub fn attempts(&self) -> Vec<ConnectionParams> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Shared handle on the attempt log.
    pub fn attempt_log(&self) -> Arc<Mutex<Vec<ConnectionParams>>> {
        Arc::clone(&self.attempts)
    }

    /// True while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.options.frame_rate.max(1.0))
    }

    fn frame_source(&self) -> Box<dyn FnMut() -> Option<MocapFrame> + Send> {
        let frame_rate = self.options.frame_rate.max(1.0);
        match self.script.clone() {
            FrameScript::Synthetic => {
                let bodies: Vec<i32> = self
                    .options
                    .catalog
                    .iter()
                    .flatten()
                    .filter_map(|description| match description {
                        DataDescription::RigidBody(rb) => Some(rb.id),
                        _ => None,
                    })
                    .collect();
                let mut index = 0i32;
                Box::new(move || {
                    let frame = synthetic_frame(index, frame_rate, &bodies);
                    index = index.wrapping_add(1);
                    Some(frame)
                })
            }
            FrameScript::Once(frames) => {
                let mut frames = frames.into_iter();
                Box::new(move || frames.next())
            }
            FrameScript::Looped(frames) => {
                let mut frames = frames.into_iter().cycle();
                Box::new(move || frames.next())
            }
        }
    }
}

#[async_trait::async_trait]
impl Backend for SimulatedBackend {
    async fn connect(&mut self, params: &ConnectionParams) -> BackendResult<()> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).push(params.clone());

        if self.connected {
            warn!("Connect requested while already connected");
            return Err(ErrorCode::InvalidOperation);
        }

        if !self.options.accept.contains(&params.transport) {
            if self.options.connect_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.connect_delay_ms)).await;
            }
            debug!(transport = %params.transport, "Simulated server refused connection");
            return Err(self.options.connect_error);
        }

        let sink: FrameSink = match &self.sink {
            Some(sink) => Arc::clone(sink),
            None => Arc::new(|_: &MocapFrame| {}),
        };

        let delivery = DeliveryThread::spawn(self.frame_period(), self.frame_source(), sink)
            .map_err(|e| {
                warn!("Failed to spawn delivery thread: {}", e);
                ErrorCode::Internal
            })?;

        self.delivery = Some(delivery);
        self.connected = true;

        info!(
            server = %params.server_address,
            transport = %params.transport,
            frame_rate = self.options.frame_rate,
            "Simulated server connected"
        );
        Ok(())
    }

    async fn server_description(&mut self) -> BackendResult<ServerDescription> {
        if !self.connected {
            return Err(ErrorCode::InvalidOperation);
        }
        match self.options.server_error {
            Some(code) => Err(code),
            None => Ok(self.options.server.clone()),
        }
    }

    async fn data_descriptions(&mut self) -> BackendResult<Option<Vec<DataDescription>>> {
        if !self.connected {
            return Err(ErrorCode::InvalidOperation);
        }
        match self.options.catalog_error {
            Some(code) => Err(code),
            None => Ok(self.options.catalog.clone()),
        }
    }

    fn set_frame_sink(&mut self, sink: FrameSink) {
        self.sink = Some(sink);
    }

    async fn disconnect(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.stop().await;
        }
        if self.connected {
            info!("Simulated server disconnected");
        }
        self.connected = false;
    }

    fn frame_rate(&self) -> f64 {
        self.options.frame_rate
    }

    /// Only a [`FrameScript::Once`] script finishes.
    fn is_finished(&self) -> bool {
        self.delivery.as_ref().is_some_and(DeliveryThread::is_finished)
    }
}

/// Build one synthetic frame: each body circles the origin, one marker per body,
/// and a single force plate channel.
fn synthetic_frame(index: i32, frame_rate: f64, bodies: &[i32]) -> MocapFrame {
    let timestamp = index as f64 / frame_rate;
    let mut frame = MocapFrame::new(index, timestamp);

    for (slot, &id) in bodies.iter().enumerate() {
        let phase = timestamp as f32 + slot as f32;
        let position = Vec3::new(phase.cos(), 1.0, phase.sin());
        frame.rigid_bodies.push(RigidBodyPose {
            id,
            position,
            orientation: Quat::from_yaw(phase),
            mean_error: 0.0002,
            params: RIGID_BODY_TRACKING_VALID,
        });
        frame.labeled_markers.push(LabeledMarker {
            id: CompositeId::new(id as u16, 1),
            position,
            size: 0.014,
            residual: 0.0001,
            kind: MarkerKind::Labeled,
        });
    }

    frame.force_plates.push(ForcePlateSample {
        id: 1,
        channels: vec![AnalogChannel::from(vec![(timestamp as f32).sin() * 10.0])],
    });
    frame.devices.push(DeviceSample { id: 1, channels: vec![AnalogChannel::default()] });
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn refuses_unaccepted_modes_and_records_attempts() {
        let mut backend = SimulatedBackend::default().accepting(&[TransportMode::Unicast]);
        let params = ConnectionParams::default();

        assert_eq!(backend.connect(&params).await, Err(ErrorCode::Network));
        assert!(!backend.is_connected());

        let unicast = params.with_transport(TransportMode::Unicast);
        assert_eq!(backend.connect(&unicast).await, Ok(()));
        assert!(backend.is_connected());

        let attempts = backend.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].transport, TransportMode::Multicast);
        assert_eq!(attempts[1].transport, TransportMode::Unicast);

        backend.disconnect().await;
        backend.disconnect().await;
        assert!(!backend.is_connected());
    }

    #[tokio::test]
    async fn calls_before_connect_are_invalid() {
        let mut backend = SimulatedBackend::default();
        assert_eq!(backend.server_description().await, Err(ErrorCode::InvalidOperation));
        assert_eq!(backend.data_descriptions().await, Err(ErrorCode::InvalidOperation));
    }

    #[tokio::test]
    async fn once_script_delivers_each_frame() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let frames = (0..4).map(|i| MocapFrame::new(i, 0.0)).collect();
        let mut backend = SimulatedBackend::default()
            .with_frame_rate(500.0)
            .with_script(FrameScript::Once(frames));
        backend.set_frame_sink(Arc::new(move |_: &MocapFrame| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        backend.connect(&ConnectionParams::default()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while seen.load(Ordering::SeqCst) < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("frames were not delivered");
        backend.disconnect().await;

        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn synthetic_frames_track_catalog_bodies() {
        let frame = synthetic_frame(50, 100.0, &[1, 7]);
        assert_eq!(frame.frame_index, 50);
        assert!((frame.timestamp - 0.5).abs() < 1e-9);
        assert_eq!(frame.rigid_bodies.len(), 2);
        assert_eq!(frame.rigid_bodies[1].id, 7);
        assert!(frame.rigid_bodies.iter().all(RigidBodyPose::tracking_valid));
        assert_eq!(frame.labeled_markers[1].id.parent(), 7);
    }
}
