use anyhow::{bail, Result};
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

use crate::slicing::Plane;

/// Sampled vessel centerline: one plane origin and unit tangent per slice
/// index, plus the physical length of the sampled stretch. The core pipeline
/// depends only on this struct, never on the provider that produced it.
#[derive(Debug, Clone)]
pub struct Centerline {
    pub origins: Vec<Point3<f64>>,
    pub normals: Vec<Vector3<f64>>,
    pub total_length: f64,
}

impl Centerline {
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn planes(&self) -> Vec<Plane> {
        self.origins
            .iter()
            .zip(self.normals.iter())
            .map(|(origin, normal)| Plane::new(*origin, *normal))
            .collect()
    }

    pub fn slice_thickness(&self, number_of_slices: usize) -> f64 {
        self.total_length / number_of_slices as f64
    }
}

/// Straight vessel: evenly spaced samples on the segment p1..p2, constant
/// tangent.
pub fn straight_segment(
    p1: Point3<f64>,
    p2: Point3<f64>,
    number_of_slices: usize,
) -> Centerline {
    let axis = p2 - p1;
    let total_length = axis.norm();
    let normal = if total_length > 0.0 {
        axis / total_length
    } else {
        Vector3::zeros()
    };

    let steps = number_of_slices.saturating_sub(1).max(1) as f64;
    let origins: Vec<Point3<f64>> = (0..number_of_slices)
        .map(|i| p1 + axis * (i as f64 / steps))
        .collect();
    let normals = vec![normal; origins.len()];

    Centerline {
        origins,
        normals,
        total_length,
    }
}

/// Curved vessel along a circular arc in the XY plane, starting at angle 0.
/// Tangents follow the arc per sample; the reported length is the arc
/// length.
pub fn circular_arc(radius: f64, arc_angle_rad: f64, number_of_slices: usize) -> Centerline {
    let steps = number_of_slices.saturating_sub(1).max(1) as f64;
    let mut origins = Vec::with_capacity(number_of_slices);
    let mut normals = Vec::with_capacity(number_of_slices);

    for i in 0..number_of_slices {
        let phi = arc_angle_rad * (i as f64 / steps);
        origins.push(Point3::new(radius * phi.cos(), radius * phi.sin(), 0.0));
        normals.push(Vector3::new(-phi.sin(), phi.cos(), 0.0));
    }

    Centerline {
        origins,
        normals,
        total_length: radius * arc_angle_rad,
    }
}

/// Fits a centerline through a sampled vessel surface point cloud: bin the
/// points along the principal axis, average each bin to a raw polyline,
/// smooth it and resample it to the requested slice count. Tangents come
/// from finite differences on the resampled polyline.
pub fn spline_fit(points: &[Point3<f64>], number_of_slices: usize) -> Result<Centerline> {
    if points.len() < 2 {
        bail!(
            "spline fit needs at least 2 surface points, got {}",
            points.len()
        );
    }
    if points
        .iter()
        .any(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        bail!("surface point cloud contains non-finite coordinates");
    }

    let axis = principal_axis(points);
    let centroid = centroid(points);

    // Parameter of every point along the axis.
    let mut params: Vec<(f64, Point3<f64>)> = points
        .iter()
        .map(|p| ((p - centroid).dot(&axis), *p))
        .collect();
    params.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let t_min = params.first().unwrap().0;
    let t_max = params.last().unwrap().0;
    // negated comparison also rejects NaN from an all-coincident cloud
    if !((t_max - t_min).abs() > 1e-12) {
        bail!("surface points collapse to a single cross-section, cannot fit a centerline");
    }

    // Bin along the axis and average each non-empty bin.
    let bin_count = (number_of_slices * 2).max(4);
    let bin_width = (t_max - t_min) / bin_count as f64;
    let mut sums = vec![(Vector3::zeros(), 0usize); bin_count];
    for (t, p) in &params {
        let bin = (((t - t_min) / bin_width) as usize).min(bin_count - 1);
        sums[bin].0 += p.coords;
        sums[bin].1 += 1;
    }
    let raw: Vec<Point3<f64>> = sums
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(sum, n)| Point3::from(sum / *n as f64))
        .collect();
    if raw.len() < 2 {
        bail!("surface points are too sparse along the vessel axis to fit a centerline");
    }

    let smoothed = moving_average(&raw);
    let (origins, total_length) = resample_polyline(&smoothed, number_of_slices);
    let normals = finite_difference_tangents(&origins);

    Ok(Centerline {
        origins,
        normals,
        total_length,
    })
}

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Direction of largest spread of the point cloud.
fn principal_axis(points: &[Point3<f64>]) -> Vector3<f64> {
    let c = centroid(points);
    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p - c;
        cov += d * d.transpose();
    }
    cov /= points.len() as f64;

    let eigen = SymmetricEigen::new(cov);
    let mut largest = 0;
    for i in 1..3 {
        if eigen.eigenvalues[i] > eigen.eigenvalues[largest] {
            largest = i;
        }
    }
    eigen.eigenvectors.column(largest).into_owned().normalize()
}

fn moving_average(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut smoothed = Vec::with_capacity(points.len());
    smoothed.push(points[0]);
    for window in points.windows(3) {
        let sum = window[0].coords + window[1].coords + window[2].coords;
        smoothed.push(Point3::from(sum / 3.0));
    }
    smoothed.push(points[points.len() - 1]);
    smoothed
}

/// Resamples a polyline to `samples` points evenly spaced by arc length,
/// endpoints included. Also returns the polyline's total arc length.
fn resample_polyline(points: &[Point3<f64>], samples: usize) -> (Vec<Point3<f64>>, f64) {
    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    for pair in points.windows(2) {
        let last = *cumulative.last().unwrap();
        cumulative.push(last + (pair[1] - pair[0]).norm());
    }
    let total_length = *cumulative.last().unwrap();

    let steps = samples.saturating_sub(1).max(1) as f64;
    let mut resampled = Vec::with_capacity(samples);
    let mut segment = 0usize;
    for i in 0..samples {
        let target = total_length * (i as f64 / steps);
        while segment + 2 < cumulative.len() && cumulative[segment + 1] < target {
            segment += 1;
        }
        let seg_len = cumulative[segment + 1] - cumulative[segment];
        let t = if seg_len > 0.0 {
            ((target - cumulative[segment]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        resampled.push(points[segment] + (points[segment + 1] - points[segment]) * t);
    }

    (resampled, total_length)
}

fn finite_difference_tangents(points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let n = points.len();
    let mut tangents = Vec::with_capacity(n);
    for i in 0..n {
        let diff = if n == 1 {
            Vector3::zeros()
        } else if i == 0 {
            points[1] - points[0]
        } else if i == n - 1 {
            points[n - 1] - points[n - 2]
        } else {
            points[i + 1] - points[i - 1]
        };
        let norm = diff.norm();
        tangents.push(if norm > 0.0 { diff / norm } else { diff });
    }
    tangents
}

#[cfg(test)]
mod centerline_tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn straight_segment_matches_the_mock_case() {
        let line = straight_segment(
            Point3::new(0.0, -15.0, 0.0),
            Point3::new(0.0, 15.0, 0.0),
            21,
        );
        assert_eq!(line.len(), 21);
        assert_relative_eq!(line.total_length, 30.0);
        assert_relative_eq!(line.slice_thickness(21), 30.0 / 21.0);
        assert_relative_eq!(line.origins[0].y, -15.0);
        assert_relative_eq!(line.origins[20].y, 15.0);
        assert_relative_eq!(line.origins[1].y, -13.5);
        for normal in &line.normals {
            assert_relative_eq!((normal - Vector3::y()).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn circular_arc_reports_arc_length_and_unit_tangents() {
        let line = circular_arc(20.0, PI / 2.0, 11);
        assert_eq!(line.len(), 11);
        assert_relative_eq!(line.total_length, 20.0 * PI / 2.0);
        assert_relative_eq!(line.origins[0].x, 20.0);
        assert_relative_eq!(line.origins[10].y, 20.0, epsilon = 1e-12);
        for (origin, normal) in line.origins.iter().zip(line.normals.iter()) {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
            // tangent is perpendicular to the radius
            assert_relative_eq!(origin.coords.dot(normal), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn spline_fit_recovers_a_straight_tube_axis() {
        // Surface samples of a tube of radius 1 around the x axis.
        let mut points = Vec::new();
        for i in 0..200 {
            let x = i as f64 * 0.1;
            let theta = i as f64 * 0.7;
            points.push(Point3::new(x, theta.cos(), theta.sin()));
        }
        let line = spline_fit(&points, 15).unwrap();
        assert_eq!(line.len(), 15);
        for origin in &line.origins {
            assert!(origin.y.abs() < 0.5, "centerline off axis: {:?}", origin);
            assert!(origin.z.abs() < 0.5, "centerline off axis: {:?}", origin);
        }
        for normal in &line.normals {
            assert!(normal.x.abs() > 0.95, "tangent not along the tube: {:?}", normal);
        }
    }

    #[test]
    fn spline_fit_rejects_degenerate_clouds() {
        assert!(spline_fit(&[Point3::origin()], 5).is_err());
        // coincident samples give the cloud no spread along any axis
        let coincident = vec![Point3::new(1.0, 2.0, 3.0); 10];
        assert!(spline_fit(&coincident, 5).is_err());
    }

    #[test]
    fn spline_fit_rejects_non_finite_points() {
        // must surface as an error, not a panic while sorting axis parameters
        let mut points: Vec<Point3<f64>> =
            (0..20).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        points.push(Point3::new(f64::NAN, 0.0, 0.0));
        assert!(spline_fit(&points, 5).is_err());
    }
}
