pub mod input;
pub mod output;

use std::collections::BTreeMap;
use std::fmt;

use crate::features::AngleRecord;

/// Tag distinguishing the two meshes everywhere in the pipeline. Kept as an
/// enum rather than a string key so a typo cannot silently create a third
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshLabel {
    Tumor,
    Vessel,
}

impl fmt::Display for MeshLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLabel::Tumor => write!(f, "tumor"),
            MeshLabel::Vessel => write!(f, "vessel"),
        }
    }
}

/// A plane dropped from the run by a per-plane geometry failure, with the
/// cause it was dropped for. Skips never abort the remaining planes.
#[derive(Debug, Clone)]
pub struct SkippedPlane {
    pub plane: usize,
    pub cause: String,
}

/// Everything the run produced when at least one plane passed the contact
/// gate.
#[derive(Debug, Clone)]
pub struct ContactReport {
    /// Longest consecutive stretch of contact-bearing planes, in mm.
    pub max_contact_length: f64,
    /// Plane indices realizing that stretch, ascending.
    pub max_contact_planes: Vec<usize>,
    /// All planes that passed the contact gate, ascending.
    pub contact_planes: Vec<usize>,
    /// Qualifying encasement angle records per contact plane. A plane may
    /// carry none (every run shorter than the threshold) or several
    /// (separate angular pockets of contact).
    pub angles_per_plane: BTreeMap<usize, Vec<AngleRecord>>,
    pub skipped_planes: Vec<SkippedPlane>,
}

/// Terminal outcome of one pipeline run. "No contact anywhere" is a valid
/// result, not an error, and carries no features.
#[derive(Debug, Clone)]
pub enum ContactOutcome {
    NoContact { skipped_planes: Vec<SkippedPlane> },
    Contact(ContactReport),
}

impl ContactOutcome {
    pub fn report(&self) -> Option<&ContactReport> {
        match self {
            ContactOutcome::Contact(report) => Some(report),
            ContactOutcome::NoContact { .. } => None,
        }
    }
}
