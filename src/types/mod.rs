//! Core types for motion-capture data.
//!
//! - [`ConnectionParams`] and [`ServerDescription`] describe a connection
//! - [`DataDescription`] is one entry of the asset catalog
//! - [`MocapFrame`] carries the poses, markers and analog samples of one frame
//! - [`CompositeId`] packs a parent and a member id into one 32-bit value
//!
//! ## Usage Example
//!
//! ```rust
//! use mocap_client::types::{CompositeId, LabeledMarker, MarkerKind, MocapFrame, Vec3};
//!
//! let mut frame = MocapFrame::new(120, 1.2);
//! frame.labeled_markers.push(LabeledMarker {
//!     id: CompositeId::new(2, 5),
//!     position: Vec3::new(0.1, 1.5, -0.3),
//!     size: 0.014,
//!     residual: 0.0002,
//!     kind: MarkerKind::from_params(0x20),
//! });
//!
//! let marker = &frame.labeled_markers[0];
//! assert_eq!((marker.id.parent(), marker.id.member()), (2, 5));
//! assert_eq!(marker.kind, MarkerKind::Active);
//! ```

mod composite_id;
mod connection;
mod description;
mod error_code;
mod frame;
mod geometry;
mod state;
mod update_rate;

pub use composite_id::{CompositeId, decode_id, encode_id};
pub use connection::{
    ConnectionParams, DEFAULT_COMMAND_PORT, DEFAULT_DATA_PORT, DEFAULT_MULTICAST_ADDRESS,
    ServerDescription, TransportMode, format_version,
};
pub use description::{
    AssetDescription, CameraDescription, DataDescription, DeviceDescription,
    ForcePlateDescription, MarkerDescription, MarkerSetDescription, RigidBodyDescription,
    RigidBodyMarker, SkeletonDescription, descriptor,
};
pub use error_code::ErrorCode;
pub use frame::{
    AnalogChannel, AssetMarker, AssetPose, DeviceSample, ForcePlateSample, LabeledMarker,
    MARKER_ACTIVE, MARKER_UNLABELED, MarkerKind, MocapFrame, RIGID_BODY_TRACKING_VALID,
    RigidBodyPose, SkeletonPose,
};
pub use geometry::{Quat, Vec3};
pub use state::ClientState;
pub use update_rate::UpdateRate;
