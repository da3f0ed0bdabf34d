//! Human-readable text for server metadata, catalog entries and frames
//!
//! Every renderer comes in two shapes: a `Display` wrapper that writes straight
//! into a formatter (no intermediate allocation per line), and a function that
//! returns the finished `String`.
//!
//! ```rust
//! use mocap_client::render;
//! use mocap_client::types::MocapFrame;
//!
//! let text = render::frame(&MocapFrame::new(7, 0.07));
//! assert!(text.contains("FrameID : 7"));
//! assert!(text.contains("Rigid Bodies [ Count = 0 ]"));
//! ```

mod description;
mod frame;

pub use description::{CatalogText, DescriptionText};
pub use frame::FrameText;

use std::fmt;

use crate::catalog::Catalog;
use crate::types::{
    ConnectionParams, DataDescription, MocapFrame, ServerDescription, TransportMode, Vec3,
    format_version,
};

/// Section separator between frame blocks and catalog entries.
pub(crate) const RULE: &str = "------------------------";

/// One-line connect banner, e.g. `Connected : Motive (ver. 3.1.0.0)`.
pub fn server_description(server: &ServerDescription) -> String {
    ServerText(server).to_string()
}

/// Connection configuration summary.
pub fn connection(params: &ConnectionParams, server: &ServerDescription) -> String {
    ConnectionText { params, server }.to_string()
}

/// One catalog entry, numbered `index`.
pub fn description(index: usize, description: &DataDescription) -> String {
    DescriptionText { index, description }.to_string()
}

/// Every entry of a catalog.
pub fn catalog(catalog: &Catalog) -> String {
    CatalogText(catalog).to_string()
}

/// One frame with its six sections.
pub fn frame(frame: &MocapFrame) -> String {
    FrameText(frame).to_string()
}

/// `Display` form of [`server_description`].
pub struct ServerText<'a>(pub &'a ServerDescription);

impl fmt::Display for ServerText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Connected : {} (ver. {})",
            self.0.host_app,
            format_version(self.0.host_version)
        )
    }
}

/// `Display` form of [`connection`].
pub struct ConnectionText<'a> {
    pub params: &'a ConnectionParams,
    pub server: &'a ServerDescription,
}

impl fmt::Display for ConnectionText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ConnectionText { params, server } = self;
        writeln!(f, "Client configured to connect to server")?;
        writeln!(f, "  Server Address : {}", params.server_address)?;
        writeln!(f, "  Local Address : {}", params.local_address)?;
        writeln!(f, "  Command Port : {}", params.command_port)?;
        writeln!(f, "  Data Port : {}", params.data_port)?;
        match params.transport {
            TransportMode::Multicast => {
                writeln!(f, "  Multicast Group : {}", params.multicast_address)?;
            }
            TransportMode::Unicast => writeln!(f, "  Unicast")?,
        }
        writeln!(
            f,
            "  Server App : {} (ver. {})",
            server.host_app,
            format_version(server.host_version)
        )?;
        writeln!(f, "  NatNet Version : {}", format_version(server.natnet_version))?;
        if !server.host_computer_name.is_empty() {
            writeln!(f, "  Server Name : {}", server.host_computer_name)?;
        }
        if let Some(address) = server.host_address {
            writeln!(f, "  Server Host Address : {address}")?;
        }
        Ok(())
    }
}

/// `x,y,z` with two decimals, the parent-offset form.
pub(crate) struct Offset(pub Vec3);

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:3.2},{:3.2},{:3.2}", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn banner_names_host_and_version() {
        let text = server_description(&ServerDescription::default());
        assert_eq!(text, "Connected : Motive (ver. 3.1.0.0)\n");
    }

    #[test]
    fn connection_summary_follows_transport() {
        let server = ServerDescription {
            host_computer_name: "capture-01".to_string(),
            host_address: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))),
            ..ServerDescription::default()
        };

        let multicast = connection(&ConnectionParams::default(), &server);
        assert!(multicast.contains("Multicast Group : 239.255.42.99"));
        assert!(multicast.contains("Command Port : 1510"));
        assert!(multicast.contains("Data Port : 1511"));
        assert!(multicast.contains("NatNet Version : 4.1.0.0"));
        assert!(multicast.contains("Server Name : capture-01"));
        assert!(multicast.contains("Server Host Address : 10.0.0.5"));

        let params = ConnectionParams::default().with_transport(TransportMode::Unicast);
        let unicast = connection(&params, &ServerDescription::default());
        assert!(unicast.contains("  Unicast\n"));
        assert!(!unicast.contains("Multicast Group"));
        assert!(!unicast.contains("Server Name"));
    }

    #[test]
    fn offsets_use_two_decimals() {
        assert_eq!(Offset(Vec3::ZERO).to_string(), "0.00,0.00,0.00");
        assert_eq!(Offset(Vec3::new(1.0, -0.25, 12.5)).to_string(), "1.00,-0.25,12.50");
    }
}
