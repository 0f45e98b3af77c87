mod centerline;
mod config;
mod entry;
mod error;
mod features;
mod io;
mod raycast;
mod slicing;
mod utils;

pub use centerline::{circular_arc, spline_fit, straight_segment, Centerline};
pub use config::{CaseConfig, CenterlineConfig, QuantConfig};
pub use entry::quantify_contact;
pub use error::{ConfigError, GeometryError};
pub use features::{
    encasement_angles, gate_contact, max_contact_length, ray_distances, AngleRecord,
    ContactPlaneSet, RayDistances,
};
pub use io::input::{read_point_cloud, TriMesh};
pub use io::output::{print_report, write_angle_records_to_csv};
pub use io::{ContactOutcome, ContactReport, MeshLabel, SkippedPlane};
pub use raycast::{build_rays, cast_fan, cast_ray, Ray, RayFan};
pub use slicing::projection::{project_segments, Contour2D, PlaneFrame};
pub use slicing::{slice_mesh, Plane, SliceSegments};
