pub mod projection;

use nalgebra::{Point3, Vector3};

/// Cross-sectional plane perpendicular to the vessel centerline.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    /// The normal is normalized defensively; callers usually pass unit
    /// tangents already.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        let norm = normal.norm();
        let normal = if norm > 0.0 { normal / norm } else { normal };
        Plane { origin, normal }
    }

    /// Signed distance of a point to the plane, positive on the normal side.
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal)
    }
}

/// Edges where a mesh crosses a plane: one 3D endpoint pair per crossing
/// triangle. Order follows the mesh face order.
pub type SliceSegments = Vec<[Point3<f64>; 2]>;

const ON_PLANE_EPS: f64 = 1e-10;

/// Intersects every triangle of the mesh with the plane. Purely local
/// per-triangle tests, so meshes with holes need no special handling; an
/// empty result simply means the mesh does not reach this plane.
pub fn slice_mesh(mesh: &crate::io::input::TriMesh, plane: &Plane) -> SliceSegments {
    let mut segments = Vec::new();
    for face in 0..mesh.faces.len() {
        let tri = mesh.triangle(face);
        if let Some(segment) = intersect_triangle(&tri, plane) {
            segments.push(segment);
        }
    }
    segments
}

/// Intersection segment of one triangle with the plane, if any. A vertex
/// lying exactly on the plane counts as a crossing point; zero-length
/// results are dropped here so downstream stages never see them.
fn intersect_triangle(tri: &[Point3<f64>; 3], plane: &Plane) -> Option<[Point3<f64>; 2]> {
    let dist = [
        plane.signed_distance(&tri[0]),
        plane.signed_distance(&tri[1]),
        plane.signed_distance(&tri[2]),
    ];

    // Fully on one side, nothing to do.
    if dist.iter().all(|&d| d > ON_PLANE_EPS) || dist.iter().all(|&d| d < -ON_PLANE_EPS) {
        return None;
    }

    let mut points: Vec<Point3<f64>> = Vec::with_capacity(2);
    for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
        let (di, dj) = (dist[i], dist[j]);
        if di.abs() <= ON_PLANE_EPS {
            push_unique(&mut points, tri[i]);
        } else if dj.abs() > ON_PLANE_EPS && di * dj < 0.0 {
            let t = di / (di - dj);
            push_unique(&mut points, tri[i] + (tri[j] - tri[i]) * t);
        }
    }

    if points.len() >= 2 {
        Some([points[0], points[1]])
    } else {
        None
    }
}

fn push_unique(points: &mut Vec<Point3<f64>>, candidate: Point3<f64>) {
    if points
        .iter()
        .all(|p| (p - candidate).norm() > ON_PLANE_EPS)
    {
        points.push(candidate);
    }
}
