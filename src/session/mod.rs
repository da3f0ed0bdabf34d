//! Client session: connection manager, catalog owner and frame dispatch point
//!
//! A [`Session`] is an explicit object owned by the caller. It drives a
//! [`Backend`] through the client lifecycle:
//!
//! `Disconnected -> Connecting -> Connected -> Streaming -> Disconnected`
//!
//! Fatal connect or catalog errors, and explicit [`Session::disconnect`], return
//! the session to `Disconnected`.
//!
//! Frame callbacks and subscriptions may be registered before connecting, so
//! no frame the backend delivers right after connect is lost. The session
//! then enters `Streaming` as soon as the connection is up.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::catalog::{Catalog, CatalogCache, CatalogReader};
use crate::dispatch::{DispatchStats, FrameDispatcher, FrameStream};
use crate::types::{ClientState, ConnectionParams, MocapFrame, ServerDescription};
use crate::{ClientError, Result};


/// Session behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long one connect attempt may go unanswered.
    pub connect_timeout_ms: u64,
    /// Retry a failed connect once with the other transport mode.
    pub fallback_transport: bool,
    /// Queue length for [`Session::subscribe`] when no capacity is given.
    pub frame_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { connect_timeout_ms: 5_000, fallback_transport: true, frame_queue_capacity: 256 }
    }
}

impl SessionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// A client session over one backend.
pub struct Session<B: Backend> {
    backend: B,
    config: SessionConfig,
    state: ClientState,
    params: Option<ConnectionParams>,
    server: Option<ServerDescription>,
    catalog: CatalogCache,
    dispatcher: FrameDispatcher,
}

impl<B: Backend> Session<B> {
    /// Wrap `backend` and install the dispatcher's sink on it.
    pub fn new(mut backend: B, config: SessionConfig) -> Self {
        let dispatcher = FrameDispatcher::new();
        backend.set_frame_sink(dispatcher.sink());

        Self {
            backend,
            config,
            state: ClientState::Disconnected,
            params: None,
            server: None,
            catalog: CatalogCache::new(),
            dispatcher,
        }
    }

    /// Connect to the server and return its description.
    ///
    /// Tries `params.transport` first. If that attempt fails or times out and
    /// fallback is enabled, tries exactly once more with the other transport
    /// and identical addresses. The server must then report a present host.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] unless the session is disconnected
    /// - [`ClientError::Connect`] when every attempt failed
    /// - [`ClientError::ServerDescription`] when the description call failed
    ///   or no host application is present
    pub async fn connect(&mut self, params: ConnectionParams) -> Result<ServerDescription> {
        if self.state != ClientState::Disconnected {
            return Err(ClientError::invalid_state("connect", self.state));
        }

        info!(
            server = %params.server_address,
            local = %params.local_address,
            transport = %params.transport,
            "Connecting"
        );
        self.state = ClientState::Connecting;
        // Any catalog from a previous connection is stale from here on.
        self.catalog.clear();

        let connected = match self.attempt(&params, 1).await {
            Ok(()) => params,
            Err(first) if self.config.fallback_transport => {
                let fallback = params.with_transport(params.transport.alternate());
                warn!(
                    error = %first,
                    transport = %fallback.transport,
                    "Connect failed, retrying with other transport"
                );
                match self.attempt(&fallback, 2).await {
                    Ok(()) => fallback,
                    Err(e) => return Err(self.fail(e).await),
                }
            }
            Err(e) => return Err(self.fail(e).await),
        };

        let server = match self.backend.server_description().await {
            Ok(server) if server.host_present => server,
            Ok(_) => {
                let e = ClientError::server_description(None, "Host application not present.");
                return Err(self.fail(e).await);
            }
            Err(code) => {
                let e = ClientError::server_description(Some(code), "Backend call failed.");
                return Err(self.fail(e).await);
            }
        };

        info!(
            host = %server.host_app,
            version = ?server.host_version,
            transport = %connected.transport,
            "Connected"
        );
        self.params = Some(connected);
        self.server = Some(server.clone());
        self.state = if self.dispatcher.is_registered() {
            ClientState::Streaming
        } else {
            ClientState::Connected
        };
        Ok(server)
    }

    /// One connect attempt bounded by the configured timeout.
    async fn attempt(&mut self, params: &ConnectionParams, attempt: u8) -> Result<()> {
        let timeout = self.config.connect_timeout();
        debug!(attempt, transport = %params.transport, "Connect attempt");

        match tokio::time::timeout(timeout, self.backend.connect(params)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(code)) => Err(ClientError::connect_failed(
                params.transport,
                params.server_address,
                code,
                attempt,
            )),
            Err(_) => {
                // Abandoned attempts may have left the backend half-open.
                self.backend.disconnect().await;
                Err(ClientError::connect_timed_out(
                    params.transport,
                    params.server_address,
                    timeout,
                    attempt,
                ))
            }
        }
    }

    /// Fetch the data descriptions and publish them as the current catalog.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidState`] unless connected
    /// - [`ClientError::Catalog`] if the backend fails or returns nothing; the
    ///   session is torn down, there is no automatic retry
    pub async fn fetch_catalog(&mut self) -> Result<Arc<Catalog>> {
        if !self.state.is_connected() {
            return Err(ClientError::invalid_state("fetch catalog", self.state));
        }

        let descriptions = match self.backend.data_descriptions().await {
            Ok(Some(descriptions)) if !descriptions.is_empty() => descriptions,
            Ok(Some(_)) => {
                let e = ClientError::catalog(None, "Server reported no data descriptions.");
                return Err(self.fail(e).await);
            }
            Ok(None) => {
                let e = ClientError::catalog(None, "Backend returned a null result.");
                return Err(self.fail(e).await);
            }
            Err(code) => {
                let e = ClientError::catalog(Some(code), "Backend call failed.");
                return Err(self.fail(e).await);
            }
        };

        let catalog = self.catalog.publish(descriptions);
        info!(entries = catalog.len(), generation = catalog.generation(), "Catalog fetched");
        Ok(catalog)
    }

    /// Register `callback` for every arriving frame.
    ///
    /// The callback runs on the backend's delivery thread. It replaces any
    /// previously registered callback or subscription. Registering while
    /// disconnected arms the callback for the next [`Session::connect`].
    pub fn on_frame<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&MocapFrame) + Send + 'static,
    {
        self.check_can_register("register frame callback")?;
        self.dispatcher.register(Box::new(callback));
        self.mark_streaming();
        info!(state = %self.state, "Frame callback registered");
        Ok(())
    }

    /// Receive frames through a bounded queue instead of a callback.
    ///
    /// Frames that arrive while the queue is full are dropped and counted.
    /// Uses the configured capacity when `capacity` is `None`. Subscribing
    /// while disconnected queues frames from the next connection onwards.
    pub fn subscribe(&mut self, capacity: Option<usize>) -> Result<FrameStream> {
        self.check_can_register("subscribe to frames")?;
        let capacity = capacity.unwrap_or(self.config.frame_queue_capacity);
        let stream = self.dispatcher.register_channel(capacity);
        self.mark_streaming();
        info!(capacity, state = %self.state, "Frame queue registered");
        Ok(stream)
    }

    fn check_can_register(&self, operation: &'static str) -> Result<()> {
        match self.state {
            ClientState::Connecting => Err(ClientError::invalid_state(operation, self.state)),
            _ => Ok(()),
        }
    }

    fn mark_streaming(&mut self) {
        if self.state.is_connected() {
            self.state = ClientState::Streaming;
        }
    }

    /// Stop delivering frames to the user, keeping the connection.
    ///
    /// Returns after any in-flight callback has finished; no callback runs afterwards.
    pub fn unsubscribe(&mut self) {
        self.dispatcher.close();
        if self.state == ClientState::Streaming {
            self.state = ClientState::Connected;
        }
    }

    /// Tear the connection down. Safe to call in any state, any number of times.
    ///
    /// Order: stop accepting frames, disconnect the backend (joining its
    /// delivery context), then release the catalog.
    pub async fn disconnect(&mut self) {
        if self.state == ClientState::Disconnected {
            // Drops any callback armed for a connect that never happened.
            self.dispatcher.close();
            debug!("Disconnect on a disconnected session");
            return;
        }
        self.teardown().await;
        info!("Disconnected");
    }

    async fn teardown(&mut self) {
        self.dispatcher.close();
        self.backend.disconnect().await;
        self.catalog.clear();
        self.params = None;
        self.server = None;
        self.state = ClientState::Disconnected;
    }

    /// Tear down after a fatal error and hand the error back.
    async fn fail(&mut self, error: ClientError) -> ClientError {
        error!(operation = error.operation(), code = error.code(), "{}", error);
        self.teardown().await;
        error
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Description of the connected server.
    pub fn server_description(&self) -> Option<&ServerDescription> {
        self.server.as_ref()
    }

    /// Parameters of the connection that succeeded (after any fallback).
    pub fn connection_params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.current()
    }

    /// Read handle on the catalog, usable from frame callbacks.
    pub fn catalog_reader(&self) -> CatalogReader {
        self.catalog.reader()
    }

    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Backend frame rate in Hz.
    pub fn frame_rate(&self) -> f64 {
        self.backend.frame_rate()
    }

    /// True once a finite backend (replay, scripted) has delivered its last frame.
    pub fn source_finished(&self) -> bool {
        self.backend.is_finished()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        // No await here: stop user callbacks now, the backend's delivery
        // context stops when the backend drops.
        self.dispatcher.close();
        if self.state != ClientState::Disconnected {
            debug!("Dropping connected session");
        }
    }
}
