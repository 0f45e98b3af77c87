use nalgebra::{Point2, Point3};
use std::f64::consts::PI;

use crate::io::input::TriMesh;
use crate::slicing::projection::Contour2D;

/// Open-ended tube of the given radius around the Y axis, centered at the
/// origin. Stands in for the straight vessel of the mock cases.
pub fn generate_cylinder_mesh(
    radius: f64,
    length: f64,
    radial_segments: usize,
    height_segments: usize,
) -> TriMesh {
    let mut vertices = Vec::with_capacity((height_segments + 1) * radial_segments);
    for j in 0..=height_segments {
        let y = -length / 2.0 + length * (j as f64 / height_segments as f64);
        for i in 0..radial_segments {
            let theta = 2.0 * PI * (i as f64 / radial_segments as f64);
            vertices.push(Point3::new(radius * theta.cos(), y, radius * theta.sin()));
        }
    }

    let mut faces = Vec::with_capacity(2 * height_segments * radial_segments);
    let ring = |j: usize, i: usize| j * radial_segments + (i % radial_segments);
    for j in 0..height_segments {
        for i in 0..radial_segments {
            faces.push([ring(j, i), ring(j, i + 1), ring(j + 1, i)]);
            faces.push([ring(j, i + 1), ring(j + 1, i + 1), ring(j + 1, i)]);
        }
    }

    TriMesh::new(vertices, faces)
}

/// Open angular strip at the given radius around the Y axis, covering the
/// angles `arc_start_deg..arc_end_deg` and the heights `y_min..y_max`.
/// Stands in for a tumor wrapping partway around the vessel at zero gap.
pub fn generate_wrap_mesh(
    radius: f64,
    arc_start_deg: f64,
    arc_end_deg: f64,
    y_min: f64,
    y_max: f64,
    radial_segments: usize,
    height_segments: usize,
) -> TriMesh {
    let columns = radial_segments + 1;
    let mut vertices = Vec::with_capacity((height_segments + 1) * columns);
    for j in 0..=height_segments {
        let y = y_min + (y_max - y_min) * (j as f64 / height_segments as f64);
        for i in 0..columns {
            let deg =
                arc_start_deg + (arc_end_deg - arc_start_deg) * (i as f64 / radial_segments as f64);
            let theta = deg.to_radians();
            vertices.push(Point3::new(radius * theta.cos(), y, radius * theta.sin()));
        }
    }

    let mut faces = Vec::with_capacity(2 * height_segments * radial_segments);
    for j in 0..height_segments {
        for i in 0..radial_segments {
            let a = j * columns + i;
            let b = j * columns + i + 1;
            let c = (j + 1) * columns + i;
            let d = (j + 1) * columns + i + 1;
            faces.push([a, b, c]);
            faces.push([b, d, c]);
        }
    }

    TriMesh::new(vertices, faces)
}

/// Closed polygonal circle around the local origin, as disjoint 2D segments.
pub fn generate_circle_contour(radius: f64, segments: usize) -> Contour2D {
    let point = |i: usize| {
        let theta = 2.0 * PI * ((i % segments) as f64 / segments as f64);
        Point2::new(radius * theta.cos(), radius * theta.sin())
    };
    (0..segments).map(|i| [point(i), point(i + 1)]).collect()
}
