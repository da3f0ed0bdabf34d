//! Minimal motion-capture streaming client.
//!
//! `mocap-client` connects to a capture server through a streaming backend,
//! fetches the server's asset catalog once, and hands every captured frame to a
//! callback or a bounded stream.
//!
//! # Features
//!
//! - **Connection management**: one transport fallback, connect timeout, explicit state machine
//! - **Atomic catalog**: readers on the delivery thread never see a partial catalog
//! - **Safe cancellation**: no frame callback runs after `disconnect` returns
//! - **Pluggable backends**: simulated server and recorded-session replay ship with the crate
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use mocap_client::providers::SimulatedBackend;
//! use mocap_client::{ConnectionParams, Session, SessionConfig, render};
//!
//! #[tokio::main]
//! async fn main() -> mocap_client::Result<()> {
//!     let mut session = Session::new(SimulatedBackend::default(), SessionConfig::default());
//!
//!     let server = session.connect(ConnectionParams::default()).await?;
//!     print!("{}", render::server_description(&server));
//!
//!     let catalog = session.fetch_catalog().await?;
//!     print!("{}", render::catalog(&catalog));
//!
//!     let mut frames = session.subscribe(None)?;
//!     while let Some(frame) = frames.next().await {
//!         print!("{}", render::frame(&frame));
//!     }
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Client architecture
pub mod backend;
pub mod catalog;
pub mod dispatch;
pub mod providers;
pub mod session;
pub mod stream;

// Presentation and configuration
pub mod config;
pub mod render;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use backend::{Backend, BackendResult, FrameSink};
pub use catalog::{Catalog, CatalogReader};
pub use config::ClientConfig;
pub use dispatch::{DispatchStats, FrameStream};
pub use session::{Session, SessionConfig};
pub use stream::ThrottleExt;
