use anyhow::{bail, Context, Result};
use nalgebra::Point3;

use vascurs::{
    print_report, quantify_contact, read_point_cloud, write_angle_records_to_csv, CaseConfig,
    Centerline, CenterlineConfig, ContactOutcome, TriMesh,
};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = match args.next() {
        Some(path) => path,
        None => bail!("usage: vascurs <case-config.toml>"),
    };

    let case = CaseConfig::from_file(&config_path)?;

    let tumor = TriMesh::from_stl_file(&case.tumor_mesh)
        .with_context(|| format!("loading tumor mesh {}", case.tumor_mesh))?;
    let vessel = TriMesh::from_stl_file(&case.vessel_mesh)
        .with_context(|| format!("loading vessel mesh {}", case.vessel_mesh))?;

    let centerline = build_centerline(&case)?;
    println!(
        "Loaded tumor ({} triangles) and vessel ({} triangles), centerline of {} slices over {:.1} mm",
        tumor.faces.len(),
        vessel.faces.len(),
        centerline.len(),
        centerline.total_length
    );

    let outcome = quantify_contact(&tumor, &vessel, &centerline, &case.quant)?;
    print_report(&outcome, &case.quant);

    if let (Some(path), ContactOutcome::Contact(report)) = (&case.angle_csv, &outcome) {
        write_angle_records_to_csv(path, report)
            .map_err(|e| anyhow::anyhow!("failed to write angle CSV {}: {}", path, e))?;
        println!("Wrote encasement angle records to {}", path);
    }

    Ok(())
}

fn build_centerline(case: &CaseConfig) -> Result<Centerline> {
    let number_of_slices = case.quant.number_of_slices;
    match &case.centerline {
        CenterlineConfig::StraightSegment { p1, p2 } => Ok(vascurs::straight_segment(
            Point3::new(p1[0], p1[1], p1[2]),
            Point3::new(p2[0], p2[1], p2[2]),
            number_of_slices,
        )),
        CenterlineConfig::CircularArc {
            radius,
            arc_degrees,
        } => Ok(vascurs::circular_arc(
            *radius,
            arc_degrees.to_radians(),
            number_of_slices,
        )),
        CenterlineConfig::SplineFit { points_path } => {
            let points = read_point_cloud(points_path)?;
            vascurs::spline_fit(&points, number_of_slices)
                .with_context(|| format!("fitting centerline through {}", points_path))
        }
    }
}
