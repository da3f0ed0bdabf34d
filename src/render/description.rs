//! Catalog entry rendering

use std::fmt;

use super::{Offset, RULE};
use crate::catalog::Catalog;
use crate::types::{
    AssetDescription, CameraDescription, DataDescription, DeviceDescription,
    ForcePlateDescription, MarkerSetDescription, RigidBodyDescription, SkeletonDescription,
};

/// `Display` form of [`render::catalog`](super::catalog).
pub struct CatalogText<'a>(pub &'a Catalog);

impl fmt::Display for CatalogText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Retrieved {} Data Descriptions:", self.0.len())?;
        for (index, description) in self.0.iter().enumerate() {
            DescriptionText { index, description }.fmt(f)?;
        }
        Ok(())
    }
}

/// `Display` form of [`render::description`](super::description).
pub struct DescriptionText<'a> {
    pub index: usize,
    pub description: &'a DataDescription,
}

impl fmt::Display for DescriptionText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}---------")?;
        writeln!(
            f,
            "Data Description # {} (type={})",
            self.index,
            self.description.type_code()
        )?;

        match self.description {
            DataDescription::MarkerSet(ms) => marker_set(f, ms),
            DataDescription::RigidBody(rb) => rigid_body(f, rb, ""),
            DataDescription::Skeleton(sk) => skeleton(f, sk),
            DataDescription::Asset(asset) => asset_description(f, asset),
            DataDescription::ForcePlate(fp) => force_plate(f, fp),
            DataDescription::Device(device) => device_description(f, device),
            DataDescription::Camera(camera) => camera_description(f, camera),
            DataDescription::Unknown { .. } => writeln!(f, "Unknown data type."),
        }
    }
}

fn marker_set(f: &mut fmt::Formatter<'_>, ms: &MarkerSetDescription) -> fmt::Result {
    writeln!(f, "MarkerSet Name : {}", ms.name)?;
    for name in &ms.marker_names {
        writeln!(f, "{name}")?;
    }
    Ok(())
}

/// Rigid body block; bones of skeletons and assets are indented.
fn rigid_body(f: &mut fmt::Formatter<'_>, rb: &RigidBodyDescription, indent: &str) -> fmt::Result {
    writeln!(f, "{indent}Rigid Body Name : {}", rb.name)?;
    writeln!(f, "{indent}Rigid Body ID : {}", rb.id)?;
    writeln!(f, "{indent}Rigid Body Parent ID : {}", rb.parent_id)?;
    writeln!(f, "{indent}Parent Offset : {}", Offset(rb.offset))?;

    for (index, marker) in rb.markers.iter().enumerate() {
        let p = marker.position;
        writeln!(f, "{indent}\tMarker #{index}:")?;
        writeln!(f, "{indent}\t\tPosition: {:.2}, {:.2}, {:.2}", p.x, p.y, p.z)?;
        if marker.required_label != 0 {
            writeln!(f, "{indent}\t\tRequired active label: {}", marker.required_label)?;
        }
    }
    Ok(())
}

fn skeleton(f: &mut fmt::Formatter<'_>, sk: &SkeletonDescription) -> fmt::Result {
    writeln!(f, "Skeleton Name : {}", sk.name)?;
    writeln!(f, "Skeleton ID : {}", sk.id)?;
    writeln!(f, "RigidBody (Bone) Count : {}", sk.bones.len())?;
    for bone in &sk.bones {
        rigid_body(f, bone, "  ")?;
    }
    Ok(())
}

fn asset_description(f: &mut fmt::Formatter<'_>, asset: &AssetDescription) -> fmt::Result {
    writeln!(f, "Trained Markerset Name : {}", asset.name)?;
    writeln!(f, "Asset ID : {}", asset.id)?;
    writeln!(f, "Trained Markerset RigidBody (Bone) Count : {}", asset.bones.len())?;
    for bone in &asset.bones {
        rigid_body(f, bone, "  ")?;
    }

    writeln!(f, "Trained Markerset Marker Count : {}", asset.markers.len())?;
    for marker in &asset.markers {
        writeln!(f, "  Marker Name : {}", marker.name)?;
        writeln!(f, "  Marker ID   : {}", marker.id.member())?;
    }
    Ok(())
}

fn force_plate(f: &mut fmt::Formatter<'_>, fp: &ForcePlateDescription) -> fmt::Result {
    writeln!(f, "Force Plate ID : {}", fp.id)?;
    writeln!(f, "Force Plate Serial : {}", fp.serial_number)?;
    writeln!(f, "Force Plate Width : {:3.2}", fp.width)?;
    writeln!(f, "Force Plate Length : {:3.2}", fp.length)?;
    writeln!(
        f,
        "Force Plate Electrical Center Offset ({:3.3}, {:3.3}, {:3.3})",
        fp.origin.x, fp.origin.y, fp.origin.z
    )?;
    for (index, corner) in fp.corners.iter().enumerate() {
        writeln!(
            f,
            "Force Plate Corner {index} : ({:3.4}, {:3.4}, {:3.4})",
            corner.x, corner.y, corner.z
        )?;
    }
    writeln!(f, "Force Plate Type : {}", fp.plate_type)?;
    writeln!(f, "Force Plate Data Type : {}", fp.channel_data_type)?;
    channel_names(f, "Force Plate", &fp.channel_names)
}

fn device_description(f: &mut fmt::Formatter<'_>, device: &DeviceDescription) -> fmt::Result {
    writeln!(f, "Device Name : {}", device.name)?;
    writeln!(f, "Device Serial : {}", device.serial_number)?;
    writeln!(f, "Device ID : {}", device.id)?;
    channel_names(f, "Device", &device.channel_names)
}

fn channel_names(f: &mut fmt::Formatter<'_>, kind: &str, names: &[String]) -> fmt::Result {
    writeln!(f, "{kind} Channel Count : {}", names.len())?;
    for (index, name) in names.iter().enumerate() {
        writeln!(f, "\tChannel {index} : {name}")?;
    }
    Ok(())
}

fn camera_description(f: &mut fmt::Formatter<'_>, camera: &CameraDescription) -> fmt::Result {
    let (p, q) = (camera.position, camera.orientation);
    writeln!(f, "Camera Name : {}", camera.name)?;
    writeln!(f, "Camera Position ({:3.2}, {:3.2}, {:3.2})", p.x, p.y, p.z)?;
    writeln!(f, "Camera Orientation ({:3.2}, {:3.2}, {:3.2}, {:3.2})", q.x, q.y, q.z, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;
    use crate::test_utils;
    use crate::types::{RigidBodyMarker, Vec3, descriptor};

    #[test]
    fn single_rigid_body_catalog() {
        let catalog = Catalog::new(test_utils::single_rigid_body_catalog(), 1);
        let text = render::catalog(&catalog);

        assert!(text.starts_with("Retrieved 1 Data Descriptions:\n"));
        assert!(text.contains("Data Description # 0 (type=1)"));
        assert!(text.contains("Rigid Body Name : Body1\n"));
        assert!(text.contains("Rigid Body ID : 1\n"));
        assert!(text.contains("Rigid Body Parent ID : -1\n"));
        assert!(text.contains("Parent Offset : 0.00,0.00,0.00\n"));
    }

    #[test]
    fn every_variant_has_its_own_branch() {
        let expected = [
            (descriptor::MARKER_SET, "MarkerSet Name : "),
            (descriptor::RIGID_BODY, "Rigid Body Name : "),
            (descriptor::SKELETON, "Skeleton Name : "),
            (descriptor::FORCE_PLATE, "Force Plate Serial : "),
            (descriptor::DEVICE, "Device Name : "),
            (descriptor::CAMERA, "Camera Name : "),
            (descriptor::ASSET, "Trained Markerset Name : "),
        ];
        let descriptions = test_utils::full_catalog();

        for (code, marker) in expected {
            let entry = descriptions
                .iter()
                .find(|d| d.type_code() == code)
                .unwrap_or_else(|| panic!("no entry for type {code}"));
            let text = render::description(0, entry);
            assert!(text.contains(marker), "type {code} rendered as:\n{text}");
            assert!(!text.contains("Unknown data type."));
        }

        let unknown = render::description(3, &DataDescription::Unknown { type_code: 42 });
        assert!(unknown.contains("Data Description # 3 (type=42)"));
        assert!(unknown.ends_with("Unknown data type.\n"));
    }

    #[test]
    fn bones_are_indented_under_skeleton() {
        let skeleton = DataDescription::Skeleton(SkeletonDescription {
            name: "Actor".to_string(),
            id: 2,
            bones: vec![RigidBodyDescription {
                name: "Hip".to_string(),
                id: 1,
                ..Default::default()
            }],
        });
        let text = render::description(0, &skeleton);

        assert!(text.contains("RigidBody (Bone) Count : 1\n"));
        assert!(text.contains("  Rigid Body Name : Hip\n"));
        assert!(text.contains("  Parent Offset : 0.00,0.00,0.00\n"));
    }

    #[test]
    fn rigid_body_markers_show_required_labels() {
        let body = DataDescription::RigidBody(RigidBodyDescription {
            name: "Wand".to_string(),
            id: 4,
            markers: vec![
                RigidBodyMarker { position: Vec3::new(0.5, 0.0, -0.25), required_label: 0 },
                RigidBodyMarker { position: Vec3::ZERO, required_label: 7 },
            ],
            ..Default::default()
        });
        let text = render::description(0, &body);

        assert!(text.contains("\tMarker #0:\n\t\tPosition: 0.50, 0.00, -0.25\n"));
        assert!(text.contains("\t\tRequired active label: 7\n"));
        assert_eq!(text.matches("Required active label").count(), 1);
    }

    #[test]
    fn force_plate_lists_corners_and_channels() {
        let plate = DataDescription::ForcePlate(ForcePlateDescription {
            id: 1,
            serial_number: "FP-100".to_string(),
            width: 0.5,
            length: 0.75,
            channel_names: vec!["Fx".to_string(), "Fy".to_string()],
            ..Default::default()
        });
        let text = render::description(0, &plate);

        assert!(text.contains("Force Plate Width : 0.50\n"));
        assert!(text.contains("Force Plate Electrical Center Offset (0.000, 0.000, 0.000)"));
        assert!(text.contains("Force Plate Corner 3 : (0.0000, 0.0000, 0.0000)"));
        assert!(text.contains("Force Plate Channel Count : 2\n"));
        assert!(text.contains("\tChannel 1 : Fy\n"));
    }
}
