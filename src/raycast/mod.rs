use nalgebra::{Point2, Vector2};

use crate::slicing::projection::Contour2D;

const PARALLEL_EPS: f64 = 1e-12;
// Tolerance on the parametric inclusion tests. A ray through a shared
// endpoint of two adjacent contour segments lands at u ~ 1 of one and
// u ~ 0 of the next; exact bounds would reject both hits after rounding.
const PARAM_EPS: f64 = 1e-9;

/// One radial ray of the fan, anchored at the local origin (0, 0).
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub index: usize,
    pub angle_deg: f64,
    pub end: Point2<f64>,
}

/// The fixed fan shared by every plane: ray k sits at angle k·per_degree, so
/// the angle-to-index mapping is identical everywhere.
pub type RayFan = Vec<Ray>;

/// Builds the fan of 360/per_degree rays of the given length. Divisibility
/// is enforced by config validation before any fan is built.
pub fn build_rays(per_degree: usize, ray_length: f64) -> RayFan {
    debug_assert!(per_degree > 0 && 360 % per_degree == 0);

    let count = 360 / per_degree;
    let mut fan = Vec::with_capacity(count);
    for index in 0..count {
        let angle_deg = (index * per_degree) as f64;
        let theta = angle_deg.to_radians();
        fan.push(Ray {
            index,
            angle_deg,
            end: Point2::new(ray_length * theta.cos(), ray_length * theta.sin()),
        });
    }
    fan
}

/// Casts one ray against a contour. With several crossings (concave tumor
/// boundaries cross a ray more than once) the point closest to the origin
/// wins: walking outward from the vessel center, the first surface crossing
/// is the one that bounds the gap.
pub fn cast_ray(ray: &Ray, contour: &Contour2D) -> Option<Point2<f64>> {
    let origin = Point2::origin();
    let mut nearest: Option<(f64, Point2<f64>)> = None;

    for segment in contour {
        if let Some(hit) = segment_intersection(&origin, &ray.end, &segment[0], &segment[1]) {
            let dist = (hit - origin).norm_squared();
            // strict comparison keeps the first-seen point on exact ties
            if nearest.map_or(true, |(best, _)| dist < best) {
                nearest = Some((dist, hit));
            }
        }
    }

    nearest.map(|(_, point)| point)
}

/// Casts the whole fan; one optional hit per ray, in fan order.
pub fn cast_fan(fan: &RayFan, contour: &Contour2D) -> Vec<Option<Point2<f64>>> {
    fan.iter().map(|ray| cast_ray(ray, contour)).collect()
}

fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersection point of segments p..p2 and q..q2, if any. For collinear
/// overlap the overlapping endpoint nearest to p is returned, which matches
/// the nearest-to-origin rule of `cast_ray`.
fn segment_intersection(
    p: &Point2<f64>,
    p2: &Point2<f64>,
    q: &Point2<f64>,
    q2: &Point2<f64>,
) -> Option<Point2<f64>> {
    let r = p2 - p;
    let s = q2 - q;
    let denom = cross2(&r, &s);
    let qp = q - p;

    if denom.abs() < PARALLEL_EPS {
        if cross2(&qp, &r).abs() >= PARALLEL_EPS {
            return None; // parallel, not collinear
        }
        let r_len2 = r.norm_squared();
        if r_len2 < PARALLEL_EPS {
            return None;
        }
        let mut best: Option<(f64, Point2<f64>)> = None;
        for endpoint in [q, q2] {
            let t = (endpoint - p).dot(&r) / r_len2;
            if in_unit_range(t) && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, *endpoint));
            }
        }
        return best.map(|(_, point)| point);
    }

    let t = cross2(&qp, &s) / denom;
    let u = cross2(&qp, &r) / denom;
    if in_unit_range(t) && in_unit_range(u) {
        Some(p + r * t.clamp(0.0, 1.0))
    } else {
        None
    }
}

fn in_unit_range(t: f64) -> bool {
    (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t)
}
