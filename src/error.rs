//! Error types for the streaming client.
//!
//! Every fatal error names the operation that failed and carries the numeric
//! code reported by the backend, so callers can print both before exiting.
//!
//! ## Error Categories
//!
//! - **Connect errors**: the server was unreachable, timed out, or reported no host
//! - **Catalog errors**: the data-description fetch failed or came back empty
//! - **Runtime errors**: a frame callback faulted on the delivery thread
//! - **Ambient errors**: invalid state transitions, configuration and recordings
//!
//! ```rust
//! use mocap_client::{ClientError, ErrorCode, TransportMode};
//!
//! let error = ClientError::connect_failed(
//!     TransportMode::Unicast,
//!     "127.0.0.1".parse().unwrap(),
//!     ErrorCode::Network,
//!     2,
//! );
//! assert_eq!(error.operation(), "connect");
//! assert_eq!(error.code(), 3);
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ClientState, ErrorCode, TransportMode};

/// Result type alias for client operations.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Main error type for client operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    #[error(
        "Unable to connect to server {server} ({mode}, {attempts} attempt(s)). Error code: {code}. {reason}"
    )]
    Connect { mode: TransportMode, server: IpAddr, code: i32, attempts: u8, reason: String },

    #[error("Unable to get server description. Error code: {code}. {reason}")]
    ServerDescription { code: i32, reason: String },

    #[error("Error getting asset list. Error code: {code}. {reason}")]
    Catalog { code: i32, reason: String },

    #[error("Frame callback faulted on frame {frame_index}: {message}")]
    Callback { frame_index: i32, message: String },

    #[error("Cannot {operation} while {state}")]
    InvalidState { operation: &'static str, state: ClientState },

    #[error("Configuration error in {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("Recording file error: {path}")]
    Recording {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl ClientError {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            ClientError::Connect { .. } => "connect",
            ClientError::ServerDescription { .. } => "get server description",
            ClientError::Catalog { .. } => "fetch data descriptions",
            ClientError::Callback { .. } => "deliver frame",
            ClientError::InvalidState { operation, .. } => *operation,
            ClientError::Config { .. } => "load configuration",
            ClientError::Recording { .. } => "open recording",
            ClientError::Parse { .. } => "parse",
        }
    }

    /// Numeric error code; 0 when the backend reported success with an unusable result.
    pub fn code(&self) -> i32 {
        match self {
            ClientError::Connect { code, .. }
            | ClientError::ServerDescription { code, .. }
            | ClientError::Catalog { code, .. } => *code,
            ClientError::InvalidState { .. } => ErrorCode::InvalidOperation.code(),
            ClientError::Config { .. } | ClientError::Parse { .. } => {
                ErrorCode::InvalidArgument.code()
            }
            ClientError::Recording { .. } => ErrorCode::External.code(),
            ClientError::Callback { .. } => ErrorCode::Other.code(),
        }
    }

    /// True for errors that end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. }
                | ClientError::ServerDescription { .. }
                | ClientError::Catalog { .. }
        )
    }

    /// Returns whether a new session could succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Connect { .. } => true,
            ClientError::ServerDescription { .. } => true,
            ClientError::Catalog { .. } => false,
            ClientError::Callback { .. } => true,
            ClientError::InvalidState { .. } => false,
            ClientError::Config { .. } => false,
            ClientError::Recording { .. } => false,
            ClientError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ClientError::Connect { .. } => vec![
                "Ensure the capture server is running and streaming is enabled",
                "Check the local and server addresses",
                "Match the transport mode to the server's streaming settings",
                "Check firewall rules for the command and data ports",
            ],
            ClientError::ServerDescription { .. } => vec![
                "Start the host application on the server",
                "Verify the server's streaming version is compatible",
            ],
            ClientError::Catalog { .. } => vec![
                "Create or enable at least one asset on the server",
                "Reconnect once the server has finished loading",
            ],
            ClientError::Callback { .. } => vec![
                "Keep frame callbacks short and non-blocking",
                "Avoid panicking inside frame callbacks",
            ],
            ClientError::InvalidState { .. } => vec![
                "Connect before fetching the catalog or streaming",
                "Disconnect before connecting again",
            ],
            ClientError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Remove unknown or out-of-range settings",
            ],
            ClientError::Recording { .. } => vec![
                "Check the recording path exists and is readable",
                "Check file permissions",
            ],
            ClientError::Parse { .. } => {
                vec!["Check the data format", "Verify the source file is not truncated"]
            }
        }
    }

    /// Helper constructor for a failed connect.
    pub fn connect_failed(
        mode: TransportMode,
        server: IpAddr,
        code: ErrorCode,
        attempts: u8,
    ) -> Self {
        ClientError::Connect {
            mode,
            server,
            code: code.code(),
            attempts,
            reason: "Server did not accept the connection.".to_string(),
        }
    }

    /// Helper constructor for a connect attempt that got no answer in time.
    pub fn connect_timed_out(
        mode: TransportMode,
        server: IpAddr,
        timeout: std::time::Duration,
        attempts: u8,
    ) -> Self {
        ClientError::Connect {
            mode,
            server,
            code: ErrorCode::Network.code(),
            attempts,
            reason: format!("No response within {timeout:?}."),
        }
    }

    /// Helper constructor for server description failures.
    pub fn server_description(code: Option<ErrorCode>, reason: impl Into<String>) -> Self {
        ClientError::ServerDescription {
            code: code.map_or(0, ErrorCode::code),
            reason: reason.into(),
        }
    }

    /// Helper constructor for catalog fetch failures.
    pub fn catalog(code: Option<ErrorCode>, reason: impl Into<String>) -> Self {
        ClientError::Catalog { code: code.map_or(0, ErrorCode::code), reason: reason.into() }
    }

    /// Helper constructor for invalid lifecycle transitions.
    pub fn invalid_state(operation: &'static str, state: ClientState) -> Self {
        ClientError::InvalidState { operation, state }
    }

    /// Helper constructor for configuration errors.
    pub fn config(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        ClientError::Config { path: path.into(), details: details.into() }
    }

    /// Helper constructor for recording I/O errors.
    pub fn recording(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::Recording { path: path.into(), source }
    }
}

impl From<serde_yaml_ng::Error> for ClientError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ClientError::Parse { context: "YAML".to_string(), details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fatal_messages_cite_operation_and_code(raw in 1i32..=7, reason in "[a-z ]{0,40}") {
                let code = ErrorCode::from_code(raw).unwrap();
                let expected = format!("Error code: {raw}");

                let description = ClientError::server_description(Some(code), reason.clone());
                prop_assert!(description.to_string().contains(&expected));
                prop_assert!(description.to_string().contains("server description"));
                prop_assert_eq!(description.code(), raw);

                let catalog = ClientError::catalog(Some(code), reason.clone());
                prop_assert!(catalog.to_string().contains(&expected));
                prop_assert_eq!(catalog.operation(), "fetch data descriptions");
                prop_assert!(catalog.is_fatal());
            }

            #[test]
            fn connect_messages_name_mode_and_server(
                a in any::<u8>(), b in any::<u8>(), attempts in 1u8..3, timeout_ms in 1u64..60_000
            ) {
                let server: IpAddr = format!("10.0.{a}.{b}").parse().unwrap();
                let error = ClientError::connect_timed_out(
                    TransportMode::Unicast, server, Duration::from_millis(timeout_ms), attempts,
                );
                let message = error.to_string();
                prop_assert!(message.contains(&server.to_string()));
                prop_assert!(message.contains("Unicast"));
                prop_assert_eq!(error.code(), ErrorCode::Network.code());
            }
        }
    }

    #[test]
    fn missing_code_reports_zero() {
        let error = ClientError::catalog(None, "Backend returned no descriptions.");
        assert_eq!(error.code(), 0);
        assert!(error.to_string().contains("Error code: 0"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ClientError>();

        let error = ClientError::invalid_state("fetch catalog", ClientState::Disconnected);
        let _: &dyn std::error::Error = &error;
        assert_eq!(error.to_string(), "Cannot fetch catalog while disconnected");
        assert_eq!(error.operation(), "fetch catalog");
    }

    #[test]
    fn recovery_methods_work() {
        let connect = ClientError::connect_failed(
            TransportMode::Multicast,
            "127.0.0.1".parse().unwrap(),
            ErrorCode::Network,
            1,
        );
        let catalog = ClientError::catalog(Some(ErrorCode::Internal), "");

        assert!(connect.is_retryable());
        assert!(!catalog.is_retryable());
        assert!(connect.is_fatal());

        let suggestions = connect.recovery_suggestions();
        for suggestion in suggestions.iter().chain(&catalog.recovery_suggestions()) {
            assert!(suggestion.len() > 5);
        }
    }

    #[test]
    fn recording_errors_keep_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = ClientError::recording("/tmp/take.yaml", io);
        let source = std::error::Error::source(&error).expect("source");
        assert_eq!(source.to_string(), "gone");
    }
}
