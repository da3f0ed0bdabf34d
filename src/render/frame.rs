//! Frame rendering

use std::fmt;

use super::RULE;
use crate::types::{AnalogChannel, MocapFrame, RigidBodyPose, decode_id};

/// `Display` form of [`render::frame`](super::frame).
pub struct FrameText<'a>(pub &'a MocapFrame);

impl fmt::Display for FrameText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0;
        writeln!(f)?;
        writeln!(f, "=====================  New Packet Arrived  =============================")?;
        writeln!(f, "FrameID : {}", frame.frame_index)?;
        writeln!(f, "Timestamp : {:3.2}", frame.timestamp)?;
        if frame.is_recording {
            writeln!(f, "Recording")?;
        }
        if frame.tracked_models_changed {
            writeln!(f, "Models Changed")?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Rigid Bodies [ Count = {} ]", frame.rigid_bodies.len())?;
        for rb in &frame.rigid_bodies {
            writeln!(
                f,
                "[ID={}  Error={:3.4}  Tracked={}]",
                rb.id,
                rb.mean_error,
                u8::from(rb.tracking_valid())
            )?;
            writeln!(f, "\tx\ty\tz\tqx\tqy\tqz\tqw")?;
            write!(f, "\t")?;
            pose(f, rb)?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Skeletons [ Count = {} ]", frame.skeletons.len())?;
        for sk in &frame.skeletons {
            writeln!(f, "Skeleton [ID={}  Bone count={}]", sk.id, sk.bones.len())?;
            for bone in &sk.bones {
                write!(f, "Bone {}\t", bone.id)?;
                pose(f, bone)?;
            }
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Assets [ Count = {} ]", frame.assets.len())?;
        for asset in &frame.assets {
            writeln!(
                f,
                "Trained Markerset [ID={}  Bone count={}   Marker count={}]",
                asset.id,
                asset.bones.len(),
                asset.markers.len()
            )?;
            for bone in &asset.bones {
                // Asset bone ids are composite: asset in the high word, bone in the low word.
                let (_, bone_id) = decode_id(bone.id);
                write!(f, "Bone {bone_id}\t")?;
                pose(f, bone)?;
            }
            for marker in &asset.markers {
                let p = marker.position;
                writeln!(
                    f,
                    "Marker [AssetID={}, MarkerID={}] [size={:3.2}] [pos={:3.2},{:3.2},{:3.2}] [residual(mm)={:.4}]",
                    marker.id.parent(),
                    marker.id.member(),
                    marker.size,
                    p.x,
                    p.y,
                    p.z,
                    marker.residual * 1000.0
                )?;
            }
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Markers [ Count = {} ]", frame.labeled_markers.len())?;
        for marker in &frame.labeled_markers {
            let p = marker.position;
            writeln!(
                f,
                "{} Marker [ModelID={}, MarkerID={}] [size={:3.2}] [pos={:3.2},{:3.2},{:3.2}]",
                marker.kind,
                marker.id.parent(),
                marker.id.member(),
                marker.size,
                p.x,
                p.y,
                p.z
            )?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Force Plates [ Count = {} ]", frame.force_plates.len())?;
        for plate in &frame.force_plates {
            writeln!(f, "Force Plate {}", plate.id)?;
            channels(f, &plate.channels)?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Devices [ Count = {} ]", frame.devices.len())?;
        for device in &frame.devices {
            writeln!(f, "Device {}", device.id)?;
            channels(f, &device.channels)?;
        }
        Ok(())
    }
}

/// Tab-separated position and orientation, ending the line.
fn pose(f: &mut fmt::Formatter<'_>, rb: &RigidBodyPose) -> fmt::Result {
    let (p, q) = (rb.position, rb.orientation);
    writeln!(
        f,
        "{:3.2}\t{:3.2}\t{:3.2}\t{:3.2}\t{:3.2}\t{:3.2}\t{:3.2}",
        p.x, p.y, p.z, q.x, q.y, q.z, q.w
    )
}

fn channels(f: &mut fmt::Formatter<'_>, channels: &[AnalogChannel]) -> fmt::Result {
    for (index, channel) in channels.iter().enumerate() {
        write!(f, "\tChannel {index}:\t")?;
        if channel.values.is_empty() {
            // Empty channels end with a blank line.
            writeln!(f, "\tEmpty Frame")?;
        }
        for value in &channel.values {
            write!(f, "{value:3.2}\t")?;
        }
        writeln!(f)?;
    }
    Ok(())
}
