//! Client lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a [`Session`](crate::Session).
///
/// `Disconnected -> Connecting -> Connected -> Streaming -> Disconnected`, with
/// `Disconnected` reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Streaming,
}

impl ClientState {
    /// True while the backend holds an open connection.
    pub fn is_connected(self) -> bool {
        matches!(self, ClientState::Connected | ClientState::Streaming)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Disconnected => "disconnected",
            ClientState::Connecting => "connecting",
            ClientState::Connected => "connected",
            ClientState::Streaming => "streaming",
        };
        f.write_str(name)
    }
}
