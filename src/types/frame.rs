//! Frame of motion-capture data
//!
//! A [`MocapFrame`] is produced by the backend for every captured frame and
//! lent to the dispatcher for one delivery.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CompositeId, Quat, Vec3};

/// Rigid body params bit: the body was tracked in this frame.
pub const RIGID_BODY_TRACKING_VALID: u16 = 0x01;
/// Marker params bit: the marker has no asset, only a point-cloud id.
pub const MARKER_UNLABELED: u16 = 0x10;
/// Marker params bit: the marker is an actively labeled LED.
pub const MARKER_ACTIVE: u16 = 0x20;

/// One frame of capture data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MocapFrame {
    pub frame_index: i32,
    /// Seconds since the server started streaming.
    pub timestamp: f64,
    /// SMPTE timecode, packed.
    pub timecode: u32,
    pub timecode_sub: u32,
    pub is_recording: bool,
    /// The server's set of tracked models changed; the catalog may be stale.
    pub tracked_models_changed: bool,
    pub rigid_bodies: Vec<RigidBodyPose>,
    pub skeletons: Vec<SkeletonPose>,
    pub assets: Vec<AssetPose>,
    pub labeled_markers: Vec<LabeledMarker>,
    pub force_plates: Vec<ForcePlateSample>,
    pub devices: Vec<DeviceSample>,
}

impl MocapFrame {
    /// Empty frame with the given index and timestamp.
    pub fn new(frame_index: i32, timestamp: f64) -> Self {
        Self { frame_index, timestamp, ..Self::default() }
    }

    /// True when the frame carries no tracked data at all.
    pub fn is_empty(&self) -> bool {
        self.rigid_bodies.is_empty()
            && self.skeletons.is_empty()
            && self.assets.is_empty()
            && self.labeled_markers.is_empty()
            && self.force_plates.is_empty()
            && self.devices.is_empty()
    }
}

/// 6-DoF pose of a rigid body or bone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyPose {
    /// Streaming id; a composite id for asset bones.
    pub id: i32,
    pub position: Vec3,
    pub orientation: Quat,
    /// Mean marker error (metres).
    pub mean_error: f32,
    pub params: u16,
}

impl RigidBodyPose {
    pub fn tracking_valid(&self) -> bool {
        self.params & RIGID_BODY_TRACKING_VALID != 0
    }
}

/// Skeleton pose: one pose per bone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonPose {
    pub id: i32,
    pub bones: Vec<RigidBodyPose>,
}

/// Marker reported as part of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetMarker {
    pub id: CompositeId,
    pub position: Vec3,
    pub size: f32,
    /// Reconstruction residual (metres).
    pub residual: f32,
}

/// Trained markerset pose. Bone ids are composite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPose {
    pub id: i32,
    pub bones: Vec<RigidBodyPose>,
    pub markers: Vec<AssetMarker>,
}

/// How a marker was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerKind {
    /// Actively labeled LED marker.
    Active,
    /// Point-cloud marker with no asset.
    Unlabeled,
    /// Passive marker labeled by an asset.
    #[default]
    Labeled,
}

impl MarkerKind {
    /// Classify a marker from its params bits. Active wins over unlabeled.
    pub fn from_params(params: u16) -> Self {
        if params & MARKER_ACTIVE != 0 {
            MarkerKind::Active
        } else if params & MARKER_UNLABELED != 0 {
            MarkerKind::Unlabeled
        } else {
            MarkerKind::Labeled
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Active => f.write_str("Active"),
            MarkerKind::Unlabeled => f.write_str("Unlabeled"),
            MarkerKind::Labeled => f.write_str("Labeled"),
        }
    }
}

/// A single tracked point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledMarker {
    /// `(model, marker)` composite id.
    pub id: CompositeId,
    pub position: Vec3,
    pub size: f32,
    #[serde(default)]
    pub residual: f32,
    #[serde(default)]
    pub kind: MarkerKind,
}

/// Sub-frame samples of one analog channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalogChannel {
    pub values: Vec<f32>,
}

impl From<Vec<f32>> for AnalogChannel {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// Force plate channels for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcePlateSample {
    pub id: i32,
    pub channels: Vec<AnalogChannel>,
}

/// Peripheral device channels for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSample {
    pub id: i32,
    pub channels: Vec<AnalogChannel>,
}
