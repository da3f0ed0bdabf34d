//! Client configuration
//!
//! Configuration is a YAML document; every section and field is optional.
//!
//! ```yaml
//! connection:
//!   server_address: 10.0.0.5
//!   local_address: 10.0.0.9
//!   transport: multicast
//! session:
//!   connect_timeout_ms: 5000
//!   fallback_transport: true
//! backend:
//!   kind: replay
//!   path: takes/warmup.yaml
//! output:
//!   update_rate: native
//!   print_catalog: true
//! log_filter: info
//! ```
//!
//! The file is taken from `$MOCAP_CLIENT_CONFIG`, else `mocap-client.yaml` in
//! the working directory if present, else built-in defaults apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::providers::replay::SPEED_RANGE;
use crate::providers::{ReplayBackend, SimulatedBackend, SimulatedOptions};
use crate::session::SessionConfig;
use crate::types::{ConnectionParams, UpdateRate};
use crate::{ClientError, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MOCAP_CLIENT_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mocap-client.yaml";

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connection: ConnectionParams,
    pub session: SessionConfig,
    pub backend: BackendConfig,
    pub output: OutputConfig,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionParams::default(),
            session: SessionConfig::default(),
            backend: BackendConfig::default(),
            output: OutputConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// Which backend the client drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process simulated server.
    Simulated(SimulatedOptions),
    /// Playback of a recorded session.
    Replay(ReplayConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Simulated(SimulatedOptions::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Recording file; relative paths resolve against the configuration file.
    pub path: PathBuf,
    /// Playback speed multiplier.
    pub speed: f64,
    /// Restart from the first frame when the recording ends.
    pub looped: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { path: PathBuf::new(), speed: 1.0, looped: false }
    }
}

/// What the client prints to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Frame print rate; the capture rate when `native`.
    pub update_rate: UpdateRate,
    pub print_catalog: bool,
    pub print_frames: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { update_rate: UpdateRate::Native, print_catalog: true, print_frames: true }
    }
}

impl ClientConfig {
    /// Load from the environment-named file, the working-directory file, or defaults.
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn from_env() -> Result<(Self, Option<PathBuf>)> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match locate(explicit, Path::new(DEFAULT_CONFIG_FILE)) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => {
                debug!("No configuration file, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::config(path, format!("Cannot read file: {e}")))?;

        let mut config: ClientConfig = serde_yaml_ng::from_str(&text)
            .map_err(|e| ClientError::config(path, e.to_string()))?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        config.validate().map_err(|e| match e {
            ClientError::Config { details, .. } => ClientError::config(path, details),
            other => other,
        })?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: &str| Err(ClientError::config("<config>", details));

        if self.session.connect_timeout_ms == 0 {
            return invalid("session.connect_timeout_ms must be greater than zero");
        }
        if self.session.frame_queue_capacity == 0 {
            return invalid("session.frame_queue_capacity must be greater than zero");
        }
        if self.output.update_rate == UpdateRate::Max(0) {
            return invalid("output.update_rate must be greater than zero");
        }

        match &self.backend {
            BackendConfig::Simulated(options) => {
                if !(options.frame_rate.is_finite() && options.frame_rate > 0.0) {
                    return invalid("backend.frame_rate must be a positive number");
                }
            }
            BackendConfig::Replay(replay) => {
                if replay.path.as_os_str().is_empty() {
                    return invalid("backend.path is required for replay");
                }
                if !SPEED_RANGE.contains(&replay.speed) {
                    return Err(ClientError::config(
                        "<config>",
                        format!(
                            "backend.speed must be between {} and {}, got {}",
                            SPEED_RANGE.start(),
                            SPEED_RANGE.end(),
                            replay.speed
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let BackendConfig::Replay(replay) = &mut self.backend {
            if replay.path.is_relative() && !replay.path.as_os_str().is_empty() {
                replay.path = base.join(&replay.path);
            }
        }
    }

    /// Build the configured backend.
    pub fn build_backend(&self) -> Result<Box<dyn Backend>> {
        match &self.backend {
            BackendConfig::Simulated(options) => {
                Ok(Box::new(SimulatedBackend::new(options.clone())))
            }
            BackendConfig::Replay(replay) => {
                let mut backend = ReplayBackend::open(&replay.path)?;
                backend.set_speed(replay.speed);
                backend.set_looped(replay.looped);
                Ok(Box::new(backend))
            }
        }
    }
}

/// Pick the configuration file: an explicit path wins, then `fallback` if it exists.
fn locate(explicit: Option<PathBuf>, fallback: &Path) -> Option<PathBuf> {
    explicit.or_else(|| fallback.exists().then(|| fallback.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use crate::types::{ErrorCode, TransportMode};

    #[test]
    fn empty_document_gives_defaults() {
        let config = ClientConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.session.connect_timeout_ms, 5_000);
        assert!(config.session.fallback_transport);
        assert_eq!(config.connection.command_port, 1510);
        assert!(matches!(config.backend, BackendConfig::Simulated(_)));
    }

    #[test]
    fn parses_every_section() {
        let yaml = r#"
connection:
  server_address: 10.0.0.5
  local_address: 10.0.0.9
  transport: unicast
  data_port: 2511
session:
  connect_timeout_ms: 250
  fallback_transport: false
backend:
  kind: simulated
  accept: [unicast]
  connect_error: External
  frame_rate: 120.0
  server:
    host_present: false
output:
  update_rate: native
  print_frames: false
log_filter: debug
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.connection.server_address.to_string(), "10.0.0.5");
        assert_eq!(config.connection.transport, TransportMode::Unicast);
        assert_eq!(config.connection.data_port, 2511);
        assert_eq!(config.connection.command_port, 1510);
        assert_eq!(config.session.connect_timeout_ms, 250);
        assert!(!config.session.fallback_transport);
        assert!(!config.output.print_frames);
        assert!(config.output.print_catalog);
        assert_eq!(config.log_filter, "debug");

        let BackendConfig::Simulated(options) = &config.backend else {
            panic!("expected simulated backend");
        };
        assert_eq!(options.connect_error, ErrorCode::External);
        assert!(!options.server.host_present);
        assert_eq!(options.server.host_app, "Motive");
        assert_eq!(options.frame_rate, 120.0);
    }

    #[test]
    fn throttled_rate_survives_round_trip() {
        let config = ClientConfig {
            output: OutputConfig { update_rate: UpdateRate::Max(10), ..OutputConfig::default() },
            ..ClientConfig::default()
        };
        let parsed = ClientConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed.output.update_rate, UpdateRate::Max(10));
    }

    #[test]
    fn rejects_unusable_values() {
        for yaml in [
            "session: { connect_timeout_ms: 0 }",
            "session: { frame_queue_capacity: 0 }",
            "backend: { kind: replay }",
            "backend: { kind: replay, path: take.yaml, speed: 0.0 }",
            "backend: { kind: simulated, frame_rate: -1.0 }",
        ] {
            let error = ClientConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(error, ClientError::Config { .. }), "{yaml}: {error}");
        }
    }

    #[test]
    fn replay_speed_must_be_within_playback_range() {
        for speed in ["0.1", "1.0", "10.0"] {
            let yaml = format!("backend: {{ kind: replay, path: take.yaml, speed: {speed} }}");
            assert!(ClientConfig::from_yaml_str(&yaml).is_ok(), "{yaml}");
        }
        for speed in ["0.05", "10.5", "20.0", ".inf"] {
            let yaml = format!("backend: {{ kind: replay, path: take.yaml, speed: {speed} }}");
            let error = ClientConfig::from_yaml_str(&yaml).unwrap_err();
            assert!(error.to_string().contains("backend.speed"), "{yaml}: {error}");
        }
    }

    #[test]
    fn zero_update_rate_is_rejected() {
        let config = ClientConfig {
            output: OutputConfig { update_rate: UpdateRate::Max(0), ..OutputConfig::default() },
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let error = ClientConfig::from_yaml_str("session: [").unwrap_err();
        assert!(matches!(error, ClientError::Parse { .. }));
    }

    #[test]
    fn load_reports_the_file() {
        let path = test_utils::scratch_file("bad.yaml", "session: { connect_timeout_ms: 0 }")
            .unwrap();
        let error = ClientConfig::load(&path).unwrap_err();

        match error {
            ClientError::Config { path: reported, details } => {
                assert_eq!(reported, path);
                assert!(details.contains("connect_timeout_ms"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let missing = ClientConfig::load("/nonexistent/mocap-client.yaml").unwrap_err();
        assert!(matches!(missing, ClientError::Config { .. }));
        assert_eq!(missing.operation(), "load configuration");
    }

    #[test]
    fn replay_path_resolves_against_config_file() {
        let path =
            test_utils::scratch_file("client.yaml", "backend: { kind: replay, path: take.yaml }")
                .unwrap();
        let config = ClientConfig::load(&path).unwrap();

        let BackendConfig::Replay(replay) = &config.backend else {
            panic!("expected replay backend");
        };
        assert_eq!(replay.path, path.parent().unwrap().join("take.yaml"));
        assert_eq!(replay.speed, 1.0);
    }

    #[test]
    fn replay_backend_is_built_from_recording() {
        let recording = test_utils::sample_recording(3).to_yaml().unwrap();
        let take = test_utils::scratch_file("take.yaml", &recording).unwrap();
        let config = ClientConfig {
            backend: BackendConfig::Replay(ReplayConfig {
                path: take,
                speed: 2.0,
                looped: false,
            }),
            ..ClientConfig::default()
        };

        let backend = config.build_backend().unwrap();
        assert_eq!(backend.frame_rate(), 200.0);

        let missing = ClientConfig {
            backend: BackendConfig::Replay(ReplayConfig {
                path: PathBuf::from("/nonexistent/take.yaml"),
                ..ReplayConfig::default()
            }),
            ..ClientConfig::default()
        };
        assert!(matches!(missing.build_backend(), Err(ClientError::Recording { .. })));
    }

    #[test]
    fn explicit_path_wins_over_working_directory_file() {
        let fallback = test_utils::scratch_file(DEFAULT_CONFIG_FILE, "{}").unwrap();
        let explicit = PathBuf::from("/etc/mocap/client.yaml");

        assert_eq!(locate(Some(explicit.clone()), &fallback), Some(explicit));
        assert_eq!(locate(None, &fallback), Some(fallback));
        assert_eq!(locate(None, Path::new("/nonexistent/mocap-client.yaml")), None);
    }
}
