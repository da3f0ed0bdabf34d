//! Connection parameters and server metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Default command port of a capture server.
pub const DEFAULT_COMMAND_PORT: u16 = 1510;
/// Default data (frame) port of a capture server.
pub const DEFAULT_DATA_PORT: u16 = 1511;
/// Default multicast group used for frame delivery.
pub const DEFAULT_MULTICAST_ADDRESS: Ipv4Addr = Ipv4Addr::new(239, 255, 42, 99);

/// How frames travel from the server to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Multicast,
    Unicast,
}

impl TransportMode {
    /// The other mode, used for the single connect fallback.
    pub fn alternate(self) -> Self {
        match self {
            TransportMode::Multicast => TransportMode::Unicast,
            TransportMode::Unicast => TransportMode::Multicast,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Multicast => f.write_str("Multicast"),
            TransportMode::Unicast => f.write_str("Unicast"),
        }
    }
}

/// Addresses and transport for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Address of the local interface frames are received on.
    pub local_address: IpAddr,
    /// Address of the capture server.
    pub server_address: IpAddr,
    pub transport: TransportMode,
    pub command_port: u16,
    pub data_port: u16,
    /// Multicast group, only used with [`TransportMode::Multicast`].
    pub multicast_address: Ipv4Addr,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            local_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            server_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            transport: TransportMode::Multicast,
            command_port: DEFAULT_COMMAND_PORT,
            data_port: DEFAULT_DATA_PORT,
            multicast_address: DEFAULT_MULTICAST_ADDRESS,
        }
    }
}

impl ConnectionParams {
    /// Same addresses and ports with a different transport.
    pub fn with_transport(&self, transport: TransportMode) -> Self {
        Self { transport, ..self.clone() }
    }
}

/// Metadata the server reports once a connection is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDescription {
    /// False when the backend answered but no host application is running.
    pub host_present: bool,
    pub host_app: String,
    pub host_version: [u8; 4],
    pub natnet_version: [u8; 4],
    pub host_computer_name: String,
    pub host_address: Option<IpAddr>,
}

impl Default for ServerDescription {
    fn default() -> Self {
        Self {
            host_present: true,
            host_app: "Motive".to_string(),
            host_version: [3, 1, 0, 0],
            natnet_version: [4, 1, 0, 0],
            host_computer_name: String::new(),
            host_address: None,
        }
    }
}

/// Dotted four-part version, e.g. `3.1.0.0`.
pub fn format_version(version: [u8; 4]) -> String {
    let [a, b, c, d] = version;
    format!("{a}.{b}.{c}.{d}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_keeps_addresses() {
        let params = ConnectionParams {
            server_address: "10.0.0.5".parse().unwrap(),
            local_address: "10.0.0.9".parse().unwrap(),
            ..ConnectionParams::default()
        };
        let fallback = params.with_transport(params.transport.alternate());

        assert_eq!(fallback.transport, TransportMode::Unicast);
        assert_eq!(fallback.server_address, params.server_address);
        assert_eq!(fallback.local_address, params.local_address);
        assert_eq!(fallback.command_port, params.command_port);
        assert_eq!(fallback.data_port, params.data_port);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: ConnectionParams =
            serde_yaml_ng::from_str("server_address: 192.168.1.20\ntransport: unicast\n").unwrap();
        assert_eq!(params.server_address, "192.168.1.20".parse::<IpAddr>().unwrap());
        assert_eq!(params.transport, TransportMode::Unicast);
        assert_eq!(params.data_port, DEFAULT_DATA_PORT);
    }

    #[test]
    fn versions_format_dotted() {
        assert_eq!(format_version([3, 1, 0, 2]), "3.1.0.2");
    }
}
