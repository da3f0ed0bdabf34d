//! Data descriptions: the asset catalog a server publishes once per connection
//!
//! The catalog is a closed set of descriptor kinds. Tags the client does not
//! know about are kept as [`DataDescription::Unknown`] so they can still be
//! listed.

use serde::{Deserialize, Serialize};

use super::{CompositeId, Quat, Vec3};

/// Numeric descriptor tags as reported by the server.
pub mod descriptor {
    pub const MARKER_SET: i32 = 0;
    pub const RIGID_BODY: i32 = 1;
    pub const SKELETON: i32 = 2;
    pub const FORCE_PLATE: i32 = 3;
    pub const DEVICE: i32 = 4;
    pub const CAMERA: i32 = 5;
    pub const ASSET: i32 = 6;
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataDescription {
    MarkerSet(MarkerSetDescription),
    RigidBody(RigidBodyDescription),
    Skeleton(SkeletonDescription),
    Asset(AssetDescription),
    ForcePlate(ForcePlateDescription),
    Device(DeviceDescription),
    Camera(CameraDescription),
    /// A descriptor kind this client does not decode.
    Unknown { type_code: i32 },
}

impl DataDescription {
    /// Numeric descriptor tag.
    pub fn type_code(&self) -> i32 {
        match self {
            DataDescription::MarkerSet(_) => descriptor::MARKER_SET,
            DataDescription::RigidBody(_) => descriptor::RIGID_BODY,
            DataDescription::Skeleton(_) => descriptor::SKELETON,
            DataDescription::Asset(_) => descriptor::ASSET,
            DataDescription::ForcePlate(_) => descriptor::FORCE_PLATE,
            DataDescription::Device(_) => descriptor::DEVICE,
            DataDescription::Camera(_) => descriptor::CAMERA,
            DataDescription::Unknown { type_code } => *type_code,
        }
    }

    /// Display name; force plates are named by serial number.
    pub fn name(&self) -> Option<&str> {
        match self {
            DataDescription::MarkerSet(d) => Some(&d.name),
            DataDescription::RigidBody(d) => Some(&d.name),
            DataDescription::Skeleton(d) => Some(&d.name),
            DataDescription::Asset(d) => Some(&d.name),
            DataDescription::ForcePlate(d) => Some(&d.serial_number),
            DataDescription::Device(d) => Some(&d.name),
            DataDescription::Camera(d) => Some(&d.name),
            DataDescription::Unknown { .. } => None,
        }
    }

    /// Streaming id, for kinds that carry one.
    pub fn id(&self) -> Option<i32> {
        match self {
            DataDescription::RigidBody(d) => Some(d.id),
            DataDescription::Skeleton(d) => Some(d.id),
            DataDescription::Asset(d) => Some(d.id),
            DataDescription::ForcePlate(d) => Some(d.id),
            DataDescription::Device(d) => Some(d.id),
            DataDescription::MarkerSet(_)
            | DataDescription::Camera(_)
            | DataDescription::Unknown { .. } => None,
        }
    }
}

/// Named set of markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSetDescription {
    pub name: String,
    pub marker_names: Vec<String>,
}

/// Marker that makes up a rigid body, in body-local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyMarker {
    pub position: Vec3,
    /// Active label this marker must carry, 0 when unconstrained.
    pub required_label: i32,
}

/// Rigid body definition. Also used for skeleton and asset bones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyDescription {
    pub name: String,
    pub id: i32,
    /// Parent rigid body id, -1 for none.
    pub parent_id: i32,
    /// Offset from the parent.
    pub offset: Vec3,
    pub markers: Vec<RigidBodyMarker>,
}

impl Default for RigidBodyDescription {
    fn default() -> Self {
        Self { name: String::new(), id: 0, parent_id: -1, offset: Vec3::ZERO, markers: Vec::new() }
    }
}

/// Skeleton definition: a hierarchy of bone rigid bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonDescription {
    pub name: String,
    pub id: i32,
    pub bones: Vec<RigidBodyDescription>,
}

/// Marker belonging to a trained markerset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescription {
    pub name: String,
    pub id: CompositeId,
}

/// Trained markerset definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDescription {
    pub name: String,
    pub id: i32,
    pub bones: Vec<RigidBodyDescription>,
    pub markers: Vec<MarkerDescription>,
}

/// Force plate definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcePlateDescription {
    pub id: i32,
    pub serial_number: String,
    pub width: f32,
    pub length: f32,
    /// Electrical centre offset.
    pub origin: Vec3,
    pub corners: [Vec3; 4],
    pub plate_type: i32,
    pub channel_data_type: i32,
    pub channel_names: Vec<String>,
}

/// Peripheral analog device definition (NIDAQ, glove, EMG, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDescription {
    pub name: String,
    pub serial_number: String,
    pub id: i32,
    pub channel_data_type: i32,
    pub channel_names: Vec<String>,
}

/// Capture camera placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
}
