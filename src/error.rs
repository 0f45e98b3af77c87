use thiserror::Error;

use crate::io::MeshLabel;

/// Rejected configuration. All variants are checked before any geometry work
/// starts, so a pipeline run never begins with an invalid parameter set.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("per_degree must be a nonzero divisor of 360, got {0}")]
    PerDegree(usize),
    #[error("number_of_slices must be positive")]
    NumberOfSlices,
    #[error("vessel_wall must be positive, got {0}")]
    VesselWall(f64),
    #[error("minimum_degrees must be nonnegative, got {0}")]
    MinimumDegrees(f64),
    #[error("ray_length must be positive, got {0}")]
    RayLength(f64),
}

/// Degenerate geometry encountered while setting up or running the pipeline.
///
/// A `DegenerateFrame` only fails the affected plane; the caller skips that
/// plane and keeps processing the rest. The other variants are fatal to the
/// whole run.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("plane {plane}: reference point coincides with the plane origin, local frame undefined")]
    DegenerateFrame { plane: usize },
    #[error("plane {plane}: no vessel cross-section to derive the shared frame from")]
    MissingVesselContour { plane: usize },
    #[error("{label} mesh has no triangles")]
    EmptyMesh { label: MeshLabel },
    #[error("centerline provided no planes")]
    NoPlanes,
}
