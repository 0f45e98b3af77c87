use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ConfigError;

/// Parameters of one quantification run. Built once, threaded through every
/// stage unchanged; there is no ambient/global state.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuantConfig {
    /// Number of cross-sectional planes along the centerline.
    pub number_of_slices: usize,
    /// Angular step of the ray fan in degrees. Must divide 360.
    pub per_degree: usize,
    /// Smallest angular span of contact worth reporting, in degrees.
    pub minimum_degrees: f64,
    /// Largest gap in mm still counted as contact (thickest wall among the
    /// CA, SMA, CHA, SM and PV).
    pub vessel_wall: f64,
    /// Length of every cast ray in mm. Has to exceed the largest expected
    /// contour radius.
    pub ray_length: f64,
}

impl Default for QuantConfig {
    fn default() -> Self {
        QuantConfig {
            number_of_slices: 21,
            per_degree: 1,
            minimum_degrees: 10.0,
            vessel_wall: 1.5,
            ray_length: 10.0,
        }
    }
}

impl QuantConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_degree == 0 || 360 % self.per_degree != 0 {
            return Err(ConfigError::PerDegree(self.per_degree));
        }
        if self.number_of_slices == 0 {
            return Err(ConfigError::NumberOfSlices);
        }
        if self.vessel_wall <= 0.0 {
            return Err(ConfigError::VesselWall(self.vessel_wall));
        }
        if self.minimum_degrees < 0.0 {
            return Err(ConfigError::MinimumDegrees(self.minimum_degrees));
        }
        if self.ray_length <= 0.0 {
            return Err(ConfigError::RayLength(self.ray_length));
        }
        Ok(())
    }

    /// Number of rays in the fan.
    pub fn ray_count(&self) -> usize {
        360 / self.per_degree
    }
}

/// Which centerline provider to run and its shape parameters. The core only
/// ever sees the resulting `Centerline`, never the provider.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CenterlineConfig {
    /// Straight vessel between two endpoints.
    StraightSegment { p1: [f64; 3], p2: [f64; 3] },
    /// Curved vessel along a circular arc in the XY plane.
    CircularArc { radius: f64, arc_degrees: f64 },
    /// Fit through a sampled vessel surface point cloud (CSV with x,y,z rows).
    SplineFit { points_path: String },
}

/// One full case as read from a TOML file: mesh paths, centerline shape and
/// quantification parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseConfig {
    pub tumor_mesh: String,
    pub vessel_mesh: String,
    pub centerline: CenterlineConfig,
    #[serde(default)]
    pub quant: QuantConfig,
    /// Optional CSV export of the per-plane encasement angle records.
    pub angle_csv: Option<String>,
}

impl CaseConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {:?}", path.as_ref()))?;
        let config: CaseConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {:?}", path.as_ref()))?;
        config.quant.validate()?;
        Ok(config)
    }
}
