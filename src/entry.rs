use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use crossbeam::thread;
use rayon::prelude::*;

use crate::centerline::Centerline;
use crate::config::QuantConfig;
use crate::error::GeometryError;
use crate::features::{encasement_angles, gate_contact, max_contact_length, ray_distances};
use crate::io::input::TriMesh;
use crate::io::{ContactOutcome, ContactReport, MeshLabel, SkippedPlane};
use crate::raycast::{build_rays, cast_fan};
use crate::slicing::projection::{project_segments, Contour2D, PlaneFrame};
use crate::slicing::{slice_mesh, Plane, SliceSegments};

/// Runs the whole quantification pipeline on a tumor and a vessel mesh.
///
/// Stages run strictly forward: slice, project, filter tumor-free planes,
/// cast the ray fan, compute gaps, gate on the vessel wall, extract the two
/// features. Per-plane geometry failures only skip the affected plane; they
/// are accumulated and reported alongside the features.
pub fn quantify_contact(
    tumor: &TriMesh,
    vessel: &TriMesh,
    centerline: &Centerline,
    config: &QuantConfig,
) -> Result<ContactOutcome> {
    config.validate()?;
    if tumor.is_empty() {
        return Err(GeometryError::EmptyMesh {
            label: MeshLabel::Tumor,
        }
        .into());
    }
    if vessel.is_empty() {
        return Err(GeometryError::EmptyMesh {
            label: MeshLabel::Vessel,
        }
        .into());
    }
    if centerline.is_empty() {
        return Err(GeometryError::NoPlanes.into());
    }

    let planes = centerline.planes();

    // Slice the two meshes concurrently; every plane within a mesh is
    // independent as well.
    let (tumor_slices, vessel_slices) = thread::scope(|s| {
        let tumor_handle = s.spawn(|_| slice_all_planes(tumor, &planes));
        let vessel_handle = s.spawn(|_| slice_all_planes(vessel, &planes));

        let tumor_slices = tumor_handle.join().unwrap();
        let vessel_slices = vessel_handle.join().unwrap();
        (tumor_slices, vessel_slices)
    })
    .map_err(|panic_payload| anyhow!("mesh slicing threads panicked: {:?}", panic_payload))?;

    let (contours, skipped_planes) = build_plane_contours(&planes, &tumor_slices, &vessel_slices);

    let fan = build_rays(config.per_degree, config.ray_length);

    // Gap per ray per plane, only for planes where the tumor shows up at all.
    let mut all_distances: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for (plane_index, plane_contours) in &contours {
        let tumor_hits = cast_fan(&fan, &plane_contours.tumor);
        let vessel_hits = cast_fan(&fan, &plane_contours.vessel);
        all_distances.insert(*plane_index, ray_distances(&tumor_hits, &vessel_hits));
    }

    let retained = match gate_contact(all_distances, config.vessel_wall) {
        Some(retained) => retained,
        None => return Ok(ContactOutcome::NoContact { skipped_planes }),
    };

    let contact_planes: Vec<usize> = retained.keys().copied().collect();
    let slice_thickness = centerline.slice_thickness(config.number_of_slices);
    let (length, max_contact_planes) = max_contact_length(&contact_planes, slice_thickness)
        .context("contact gate produced an empty plane set")?;

    let mut angles_per_plane = BTreeMap::new();
    for (plane_index, distances) in &retained {
        angles_per_plane.insert(
            *plane_index,
            encasement_angles(distances, config.per_degree, config.minimum_degrees),
        );
    }

    Ok(ContactOutcome::Contact(ContactReport {
        max_contact_length: length,
        max_contact_planes,
        contact_planes,
        angles_per_plane,
        skipped_planes,
    }))
}

/// 2D contours of both meshes in one plane, expressed in the plane's shared
/// frame.
struct PlaneContours {
    tumor: Contour2D,
    vessel: Contour2D,
}

fn slice_all_planes(mesh: &TriMesh, planes: &[Plane]) -> Vec<SliceSegments> {
    planes
        .par_iter()
        .map(|plane| slice_mesh(mesh, plane))
        .collect()
}

/// Projects the slice segments of both meshes into one shared frame per
/// plane and applies the tumor-presence filter.
///
/// The frame is always derived from the vessel contour's first intersection
/// point. Deriving it per mesh would give the tumor and vessel contours of
/// the same plane unrelated B1 axes, and ray angle k would no longer mean
/// one physical direction.
fn build_plane_contours(
    planes: &[Plane],
    tumor_slices: &[SliceSegments],
    vessel_slices: &[SliceSegments],
) -> (BTreeMap<usize, PlaneContours>, Vec<SkippedPlane>) {
    let mut contours = BTreeMap::new();
    let mut skipped = Vec::new();

    for (plane_index, plane) in planes.iter().enumerate() {
        let tumor_segments = &tumor_slices[plane_index];
        let vessel_segments = &vessel_slices[plane_index];

        // Tumor absent from this slice: a valid empty result, not a skip.
        if tumor_segments.is_empty() {
            continue;
        }

        let frame = match shared_plane_frame(plane, vessel_segments, plane_index) {
            Ok(frame) => frame,
            Err(cause) => {
                eprintln!("Skipped plane{}: {}", plane_index, cause);
                skipped.push(SkippedPlane {
                    plane: plane_index,
                    cause: cause.to_string(),
                });
                continue;
            }
        };

        contours.insert(
            plane_index,
            PlaneContours {
                tumor: project_segments(tumor_segments, &frame),
                vessel: project_segments(vessel_segments, &frame),
            },
        );
    }

    (contours, skipped)
}

fn shared_plane_frame(
    plane: &Plane,
    vessel_segments: &SliceSegments,
    plane_index: usize,
) -> Result<PlaneFrame, GeometryError> {
    let reference = vessel_segments
        .first()
        .map(|segment| segment[0])
        .ok_or(GeometryError::MissingVesselContour { plane: plane_index })?;
    PlaneFrame::from_reference_point(plane, &reference, plane_index)
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::centerline::straight_segment;
    use crate::utils::test_utils::{generate_cylinder_mesh, generate_wrap_mesh};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const VESSEL_RADIUS: f64 = 2.0;
    const VESSEL_LENGTH: f64 = 30.0;

    fn mock_centerline(number_of_slices: usize) -> Centerline {
        straight_segment(
            Point3::new(0.0, -VESSEL_LENGTH / 2.0, 0.0),
            Point3::new(0.0, VESSEL_LENGTH / 2.0, 0.0),
            number_of_slices,
        )
    }

    fn mock_vessel() -> TriMesh {
        generate_cylinder_mesh(VESSEL_RADIUS, VESSEL_LENGTH, 128, 30)
    }

    #[test]
    fn end_to_end_half_wrap_over_five_planes() {
        // 21 planes at y = -15, -13.5, ..., 15; a tumor strip touching the
        // vessel (zero gap) over 180 degrees, covering planes 8..=12 only.
        let config = QuantConfig::default();
        let vessel = mock_vessel();
        let tumor = generate_wrap_mesh(VESSEL_RADIUS, 0.0, 180.0, -3.2, 3.2, 128, 12);
        let centerline = mock_centerline(config.number_of_slices);

        let outcome = quantify_contact(&tumor, &vessel, &centerline, &config).unwrap();
        let report = outcome.report().expect("expected contact");

        assert_eq!(report.contact_planes, vec![8, 9, 10, 11, 12]);
        assert_eq!(report.max_contact_planes, vec![8, 9, 10, 11, 12]);
        assert_relative_eq!(
            report.max_contact_length,
            5.0 * VESSEL_LENGTH / 21.0,
            epsilon = 1e-9
        );
        assert!(report.skipped_planes.is_empty());

        // Each contact plane carries ~180 degrees of encasement. The frame's
        // B1 axis is an arbitrary in-plane direction, so the wrap may be cut
        // in two by the fan's fixed 0 degree start; the spans still total
        // half the circle.
        for plane in &report.contact_planes {
            let records = &report.angles_per_plane[plane];
            assert!(!records.is_empty(), "plane {} has no angle record", plane);
            assert!(records.len() <= 2);
            let total: f64 = records.iter().map(|r| r.degrees).sum();
            assert!(
                (total - 180.0).abs() <= 6.0,
                "plane {} encasement {} not near 180",
                plane,
                total
            );
        }
    }

    #[test]
    fn distant_tumor_returns_no_contact() {
        let config = QuantConfig::default();
        let vessel = mock_vessel();
        // Same wrap shape but 5 mm off the vessel surface, far beyond the
        // 1.5 mm wall. The tumor is present in the slices, so the planes
        // reach the distance gate and die there.
        let tumor = generate_wrap_mesh(VESSEL_RADIUS + 5.0, 0.0, 180.0, -3.2, 3.2, 64, 8);
        let centerline = mock_centerline(config.number_of_slices);

        let outcome = quantify_contact(&tumor, &vessel, &centerline, &config).unwrap();
        assert!(outcome.report().is_none());
        match outcome {
            ContactOutcome::NoContact { skipped_planes } => assert!(skipped_planes.is_empty()),
            ContactOutcome::Contact(_) => panic!("expected NoContact"),
        }
    }

    #[test]
    fn tumor_missing_everywhere_returns_no_contact() {
        let config = QuantConfig::default();
        let vessel = mock_vessel();
        // Tumor entirely beyond the sliced stretch of the vessel.
        let tumor = generate_wrap_mesh(VESSEL_RADIUS, 0.0, 90.0, 40.0, 50.0, 32, 4);
        let centerline = mock_centerline(config.number_of_slices);

        let outcome = quantify_contact(&tumor, &vessel, &centerline, &config).unwrap();
        assert!(outcome.report().is_none());
    }

    #[test]
    fn tumor_without_vessel_cross_section_is_skipped_not_fatal() {
        let config = QuantConfig::default();
        // Vessel only covers the lower half of the centerline stretch, the
        // tumor wraps a region above it: tumor-bearing planes there have no
        // vessel contour to derive the shared frame from.
        let vessel = generate_cylinder_mesh(VESSEL_RADIUS, 10.0, 64, 10);
        let tumor = generate_wrap_mesh(VESSEL_RADIUS, 0.0, 180.0, 8.0, 12.0, 64, 6);
        let centerline = mock_centerline(config.number_of_slices);

        let outcome = quantify_contact(&tumor, &vessel, &centerline, &config).unwrap();
        match outcome {
            ContactOutcome::NoContact { skipped_planes } => {
                assert!(!skipped_planes.is_empty());
                assert!(skipped_planes
                    .iter()
                    .all(|s| s.cause.contains("no vessel cross-section")));
            }
            ContactOutcome::Contact(_) => panic!("expected NoContact with skipped planes"),
        }
    }

    #[test]
    fn empty_meshes_are_rejected() {
        let config = QuantConfig::default();
        let empty = TriMesh::new(Vec::new(), Vec::new());
        let vessel = mock_vessel();
        let centerline = mock_centerline(config.number_of_slices);

        assert!(quantify_contact(&empty, &vessel, &centerline, &config).is_err());
        assert!(quantify_contact(&vessel, &empty, &centerline, &config).is_err());
    }

    #[test]
    fn empty_centerline_is_rejected() {
        let config = QuantConfig::default();
        let vessel = mock_vessel();
        let tumor = generate_wrap_mesh(VESSEL_RADIUS, 0.0, 180.0, -3.0, 3.0, 32, 4);
        let centerline = Centerline {
            origins: Vec::new(),
            normals: Vec::new(),
            total_length: 0.0,
        };

        assert!(quantify_contact(&tumor, &vessel, &centerline, &config).is_err());
    }

    #[test]
    fn invalid_config_fails_before_any_geometry_work() {
        let mut config = QuantConfig::default();
        config.per_degree = 11;
        let vessel = mock_vessel();
        let tumor = generate_wrap_mesh(VESSEL_RADIUS, 0.0, 180.0, -3.0, 3.0, 32, 4);
        let centerline = mock_centerline(config.number_of_slices);

        let err = quantify_contact(&tumor, &vessel, &centerline, &config).unwrap_err();
        assert!(err.to_string().contains("per_degree"));
    }
}
