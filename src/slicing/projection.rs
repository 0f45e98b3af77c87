use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

use crate::error::GeometryError;
use crate::slicing::{Plane, SliceSegments};

const DEGENERATE_EPS: f64 = 1e-12;

/// Local 2D coordinate frame of one plane: two unit vectors spanning the
/// plane plus the homogeneous transforms in and out of it.
///
/// B1 points from the plane origin towards a reference point on the plane.
/// That choice is arbitrary but deterministic, and it is made exactly once
/// per plane: both the tumor and the vessel contour of a plane must be
/// projected through the same frame, otherwise ray angle k would mean a
/// different physical direction for each of them.
#[derive(Debug, Clone)]
pub struct PlaneFrame {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub b1: Vector3<f64>,
    pub b2: Vector3<f64>,
    to_plane: Matrix4<f64>,
    to_world: Matrix4<f64>,
}

impl PlaneFrame {
    /// Builds the frame from a reference point on the plane, conventionally
    /// the first intersection point of the vessel contour.
    ///
    /// Fails fast when the reference point coincides with the plane origin;
    /// a zero-length B1 would otherwise propagate NaN through every contour
    /// of this plane.
    pub fn from_reference_point(
        plane: &Plane,
        reference: &Point3<f64>,
        plane_index: usize,
    ) -> Result<Self, GeometryError> {
        let arbitrary = reference - plane.origin;
        if arbitrary.norm() < DEGENERATE_EPS {
            return Err(GeometryError::DegenerateFrame { plane: plane_index });
        }

        let b1 = arbitrary.normalize();
        let b2 = plane.normal.cross(&b1).normalize();

        // Rows [B1; B2; n] map world directions to local (u, v, w); the
        // homogeneous world transform is its inverse plus the origin shift.
        let v = Matrix3::from_rows(&[b1.transpose(), b2.transpose(), plane.normal.transpose()]);
        let v_inv = v
            .try_inverse()
            .ok_or(GeometryError::DegenerateFrame { plane: plane_index })?;

        let mut to_world = Matrix4::identity();
        to_world.fixed_view_mut::<3, 3>(0, 0).copy_from(&v_inv);
        to_world
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&plane.origin.coords);

        let to_plane = to_world
            .try_inverse()
            .ok_or(GeometryError::DegenerateFrame { plane: plane_index })?;

        Ok(PlaneFrame {
            origin: plane.origin,
            normal: plane.normal,
            b1,
            b2,
            to_plane,
            to_world,
        })
    }

    /// World point to local (u, v, w). For points on the plane w ≈ 0.
    pub fn to_plane_coords(&self, point: &Point3<f64>) -> Point3<f64> {
        self.to_plane.transform_point(point)
    }

    /// Local (u, v) back to the world point on the plane.
    pub fn to_world_coords(&self, point: &Point2<f64>) -> Point3<f64> {
        self.to_world
            .transform_point(&Point3::new(point.x, point.y, 0.0))
    }
}

/// 2D contour of one mesh in one plane: disjoint line segments in the local
/// frame, one per slice segment, endpoint order preserved.
pub type Contour2D = Vec<[Point2<f64>; 2]>;

/// Projects the 3D slice segments into the plane frame by dropping the depth
/// coordinate. Empty input gives an empty contour.
pub fn project_segments(segments: &SliceSegments, frame: &PlaneFrame) -> Contour2D {
    segments
        .iter()
        .map(|segment| {
            let a = frame.to_plane_coords(&segment[0]);
            let b = frame.to_plane_coords(&segment[1]);
            [Point2::new(a.x, a.y), Point2::new(b.x, b.y)]
        })
        .collect()
}
