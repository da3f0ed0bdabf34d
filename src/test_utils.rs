//! Test utilities: catalog and frame fixtures, scratch files
//!
//! Fixtures are built in code so every test and benchmark works from the same
//! catalog and frame shapes without files on disk.

#![cfg(any(test, feature = "benchmark"))]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::providers::Recording;
use crate::types::{
    AnalogChannel, AssetDescription, AssetMarker, AssetPose, CameraDescription, CompositeId,
    DataDescription, DeviceDescription, DeviceSample, ForcePlateDescription, ForcePlateSample,
    LabeledMarker, MarkerDescription, MarkerKind, MarkerSetDescription, MocapFrame, Quat,
    RIGID_BODY_TRACKING_VALID, RigidBodyDescription, RigidBodyPose, ServerDescription,
    SkeletonDescription, SkeletonPose, Vec3, encode_id,
};

/// The catalog a server with a single tracked body reports: `Body1`, id 1,
/// no parent, zero offset.
pub fn single_rigid_body_catalog() -> Vec<DataDescription> {
    vec![DataDescription::RigidBody(body("Body1", 1))]
}

/// One entry of every descriptor kind.
///
/// `Body1` (id 1) is the only top-level rigid body; skeleton 2 has two bones,
/// asset 3 has two markers and there is exactly one camera, `Cam1`.
pub fn full_catalog() -> Vec<DataDescription> {
    vec![
        DataDescription::MarkerSet(MarkerSetDescription {
            name: "all".to_string(),
            marker_names: vec!["Marker1".to_string(), "Marker2".to_string()],
        }),
        DataDescription::RigidBody(body("Body1", 1)),
        DataDescription::Skeleton(SkeletonDescription {
            name: "Actor".to_string(),
            id: 2,
            bones: vec![body("Hip", 1), RigidBodyDescription { parent_id: 1, ..body("Spine", 2) }],
        }),
        DataDescription::Asset(AssetDescription {
            name: "Glove".to_string(),
            id: 3,
            bones: vec![body("Palm", encode_id(3, 1))],
            markers: vec![
                MarkerDescription { name: "Thumb".to_string(), id: CompositeId::new(3, 1) },
                MarkerDescription { name: "Index".to_string(), id: CompositeId::new(3, 2) },
            ],
        }),
        DataDescription::ForcePlate(ForcePlateDescription {
            id: 1,
            serial_number: "FP-0001".to_string(),
            width: 0.6,
            length: 0.9,
            channel_names: vec!["Fz".to_string()],
            ..Default::default()
        }),
        DataDescription::Device(DeviceDescription {
            name: "EMG".to_string(),
            serial_number: "EMG-7".to_string(),
            id: 1,
            channel_data_type: 0,
            channel_names: vec!["Ch1".to_string()],
        }),
        DataDescription::Camera(CameraDescription {
            name: "Cam1".to_string(),
            position: Vec3::new(2.0, 2.5, -1.0),
            orientation: Quat::IDENTITY,
        }),
    ]
}

fn body(name: &str, id: i32) -> RigidBodyDescription {
    RigidBodyDescription { name: name.to_string(), id, ..Default::default() }
}

/// A frame with no tracked data.
pub fn empty_frame() -> MocapFrame {
    MocapFrame::new(0, 0.0)
}

/// A frame with one entry in each section.
pub fn sample_frame() -> MocapFrame {
    let mut frame = MocapFrame::new(42, 0.42);

    frame.rigid_bodies.push(RigidBodyPose {
        id: 1,
        position: Vec3::new(0.5, 1.0, -0.25),
        orientation: Quat::IDENTITY,
        mean_error: 0.001,
        params: RIGID_BODY_TRACKING_VALID,
    });
    frame.skeletons.push(SkeletonPose { id: 2, bones: vec![RigidBodyPose { id: 1, ..pose() }] });
    frame.assets.push(AssetPose {
        id: 3,
        bones: vec![RigidBodyPose { id: encode_id(3, 5), ..pose() }],
        markers: vec![AssetMarker {
            id: CompositeId::new(3, 1),
            position: Vec3::new(0.5, 0.5, 0.5),
            size: 0.02,
            residual: 0.0005,
        }],
    });
    frame.labeled_markers.push(LabeledMarker {
        id: CompositeId::new(1, 2),
        position: Vec3::new(0.5, 1.0, -0.25),
        size: 0.02,
        residual: 0.0,
        kind: MarkerKind::Active,
    });
    frame.labeled_markers.push(LabeledMarker {
        id: CompositeId::new(0, 9),
        position: Vec3::ZERO,
        size: 0.01,
        residual: 0.0,
        kind: MarkerKind::Unlabeled,
    });
    frame.force_plates.push(ForcePlateSample {
        id: 1,
        channels: vec![AnalogChannel::from(vec![1.5, 2.5])],
    });
    frame.devices.push(DeviceSample { id: 1, channels: vec![AnalogChannel::default()] });
    frame
}

fn pose() -> RigidBodyPose {
    RigidBodyPose { params: RIGID_BODY_TRACKING_VALID, ..RigidBodyPose::default() }
}

/// A recording of `frames` frames at 100 Hz over [`single_rigid_body_catalog`].
pub fn sample_recording(frames: usize) -> Recording {
    let frame_rate = 100.0;
    let frames = (0..frames as i32)
        .map(|index| {
            let mut frame = MocapFrame::new(index, f64::from(index) / frame_rate);
            frame.rigid_bodies.push(RigidBodyPose { id: 1, ..pose() });
            frame
        })
        .collect();

    Recording {
        server: ServerDescription::default(),
        descriptions: single_rigid_body_catalog(),
        frame_rate,
        frames,
    }
}

/// Write `contents` to a fresh file under the system temp directory.
pub fn scratch_file(name: &str, contents: &str) -> std::io::Result<PathBuf> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let dir = std::env::temp_dir().join(format!(
        "mocap-client-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_catalog_covers_every_kind() {
        let mut codes: Vec<i32> = full_catalog().iter().map(DataDescription::type_code).collect();
        codes.sort_unstable();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn recording_frames_are_indexed_from_zero() {
        let recording = sample_recording(3);
        let indices: Vec<i32> = recording.frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn scratch_files_do_not_collide() {
        let a = scratch_file("a.yaml", "a: 1").unwrap();
        let b = scratch_file("a.yaml", "a: 2").unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_to_string(b).unwrap(), "a: 2");
    }
}
