//! Backend trait for streaming sources

use std::sync::Arc;

use crate::types::{
    ConnectionParams, DataDescription, ErrorCode, MocapFrame, ServerDescription, decode_id,
};

/// Hook a backend calls once per arriving frame, on its own delivery thread.
///
/// The frame is only borrowed for the duration of the call.
pub type FrameSink = Arc<dyn Fn(&MocapFrame) + Send + Sync>;

/// Result of a backend call: success or the SDK's failure code.
pub type BackendResult<T> = std::result::Result<T, ErrorCode>;

/// The streaming backend a [`Session`](crate::Session) talks to.
///
/// Backends own the transport, decoding, and the thread frames are delivered
/// on. The session only drives them through this call contract and never
/// assumes anything about the wire format.
#[async_trait::async_trait]
pub trait Backend: Send + 'static {
    /// Open a connection with the given parameters.
    ///
    /// A backend spawns at most one delivery context per connection and must
    /// not deliver frames before this returns `Ok`.
    async fn connect(&mut self, params: &ConnectionParams) -> BackendResult<()>;

    /// Describe the server behind the current connection.
    async fn server_description(&mut self) -> BackendResult<ServerDescription>;

    /// Fetch the current data descriptions.
    ///
    /// Returns:
    /// - `Ok(Some(list))` - the server's catalog (possibly empty)
    /// - `Ok(None)` - the call succeeded but produced no result
    /// - `Err(code)` - the call failed
    async fn data_descriptions(&mut self) -> BackendResult<Option<Vec<DataDescription>>>;

    /// Install the hook frames are handed to. Replaces any previous sink.
    fn set_frame_sink(&mut self, sink: FrameSink);

    /// Close the connection and join the delivery context.
    ///
    /// Once this returns the sink is not invoked again. Calling it while not
    /// connected is a no-op.
    async fn disconnect(&mut self);

    /// Nominal frame rate in Hz, used to pace consumers.
    fn frame_rate(&self) -> f64;

    /// True once a finite source has delivered its last frame.
    ///
    /// Live servers never finish; replays and scripted backends do.
    fn is_finished(&self) -> bool {
        false
    }

    /// Split a composite id into `(parent, member)`.
    fn decode_id(&self, id: i32) -> (u16, u16) {
        decode_id(id)
    }
}

/// Lets a backend be chosen at runtime, e.g. from configuration.
#[async_trait::async_trait]
impl<B: Backend + ?Sized> Backend for Box<B> {
    async fn connect(&mut self, params: &ConnectionParams) -> BackendResult<()> {
        (**self).connect(params).await
    }

    async fn server_description(&mut self) -> BackendResult<ServerDescription> {
        (**self).server_description().await
    }

    async fn data_descriptions(&mut self) -> BackendResult<Option<Vec<DataDescription>>> {
        (**self).data_descriptions().await
    }

    fn set_frame_sink(&mut self, sink: FrameSink) {
        (**self).set_frame_sink(sink);
    }

    async fn disconnect(&mut self) {
        (**self).disconnect().await;
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn decode_id(&self, id: i32) -> (u16, u16) {
        (**self).decode_id(id)
    }
}
