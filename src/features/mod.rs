use std::collections::BTreeMap;

use anyhow::{bail, Result};
use nalgebra::Point2;

/// Per-plane ray gaps in fan order. `INFINITY` marks a ray with no valid
/// tumor/vessel pair.
pub type RayDistances = Vec<f64>;

/// Planes that survived the contact gate, keyed by ascending plane index.
/// Every retained plane has at least one finite-distance ray.
pub type ContactPlaneSet = BTreeMap<usize, RayDistances>;

/// One maximal contiguous angular span of contact meeting the
/// minimum-degrees threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleRecord {
    pub degrees: f64,
    pub first_ray: usize,
    pub last_ray: usize,
}

/// Gap between the tumor and vessel hit of each ray. A finite value needs
/// both points present; a missing tumor hit means the ray does not point
/// through tissue contact, a missing vessel hit means insufficient data.
/// Both give infinity.
pub fn ray_distances(
    tumor_hits: &[Option<Point2<f64>>],
    vessel_hits: &[Option<Point2<f64>>],
) -> RayDistances {
    debug_assert_eq!(tumor_hits.len(), vessel_hits.len());
    tumor_hits
        .iter()
        .zip(vessel_hits.iter())
        .map(|(tumor, vessel)| match (tumor, vessel) {
            (Some(t), Some(v)) => (t - v).norm(),
            _ => f64::INFINITY,
        })
        .collect()
}

/// Two-stage contact gate. Stage one keeps only planes whose smallest ray
/// gap is within the vessel wall; if none survive the whole run is a
/// no-contact outcome, signalled by `None`. Stage two then rewrites every
/// remaining above-wall gap to infinity so it cannot count as contact in
/// the feature extractors. The plane-level gate must run first: an empty
/// survivor set has to short-circuit the pipeline before any re-filtering.
pub fn gate_contact(
    all_distances: BTreeMap<usize, RayDistances>,
    vessel_wall: f64,
) -> Option<ContactPlaneSet> {
    let mut retained: ContactPlaneSet = all_distances
        .into_iter()
        .filter(|(_, distances)| distances.iter().any(|&d| d <= vessel_wall))
        .collect();

    if retained.is_empty() {
        return None;
    }

    for distances in retained.values_mut() {
        for distance in distances.iter_mut() {
            if *distance > vessel_wall {
                *distance = f64::INFINITY;
            }
        }
    }

    Some(retained)
}

/// Longest run of consecutive plane indices among the retained planes, as a
/// physical length. Returns the length in mm together with the plane
/// indices realizing it. Equal-length runs resolve to the earliest one.
///
/// The length is run length times slice thickness; the centerline providers
/// report arc length, so the thickness stays meaningful for curved vessels.
pub fn max_contact_length(
    plane_indices: &[usize],
    slice_thickness: f64,
) -> Result<(f64, Vec<usize>)> {
    if plane_indices.is_empty() {
        bail!("maximum contact length requested for an empty plane set; the no-contact gate should have fired");
    }

    let mut sorted = plane_indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut longest: &[usize] = &sorted[..1];
    let mut run_start = 0usize;
    for i in 1..=sorted.len() {
        let run_broken = i == sorted.len() || sorted[i] != sorted[i - 1] + 1;
        if run_broken {
            // strict comparison keeps the earliest run on ties
            if i - run_start > longest.len() {
                longest = &sorted[run_start..i];
            }
            run_start = i;
        }
    }

    Ok((longest.len() as f64 * slice_thickness, longest.to_vec()))
}

/// Walks the rays of one plane in angular order and collects every maximal
/// contiguous run of finite-distance rays whose span reaches the
/// minimum-degrees threshold. A run still open at the end of the fan is
/// closed there; runs are never merged across the 360°/0° boundary.
pub fn encasement_angles(
    distances: &RayDistances,
    per_degree: usize,
    minimum_degrees: f64,
) -> Vec<AngleRecord> {
    let mut records = Vec::new();
    let mut run: Option<(usize, usize)> = None; // (first_ray, last_ray)

    let close = |run: &mut Option<(usize, usize)>, records: &mut Vec<AngleRecord>| {
        if let Some((first_ray, last_ray)) = run.take() {
            let degrees = ((last_ray - first_ray + 1) * per_degree) as f64;
            if degrees >= minimum_degrees {
                records.push(AngleRecord {
                    degrees,
                    first_ray,
                    last_ray,
                });
            }
        }
    };

    for (ray, &distance) in distances.iter().enumerate() {
        if distance.is_finite() {
            match run {
                Some((_, ref mut last)) => *last = ray,
                None => run = Some((ray, ray)),
            }
        } else {
            close(&mut run, &mut records);
        }
    }
    close(&mut run, &mut records);

    records
}
