use std::error::Error;
use std::path::Path;

use csv::Writer;

use crate::config::QuantConfig;
use crate::io::{ContactOutcome, ContactReport};

/// Prints the terminal report of one run.
pub fn print_report(outcome: &ContactOutcome, config: &QuantConfig) {
    match outcome {
        ContactOutcome::NoContact { skipped_planes } => {
            println!("There is no contact between the vessel and the tumor");
            print_skipped(skipped_planes);
        }
        ContactOutcome::Contact(report) => {
            println!("----------------------Contact report----------------------");
            println!(
                "The maximum contact length is {:.3} mm and present in the following planes",
                report.max_contact_length
            );
            println!("{:?}", report.max_contact_planes);
            println!(
                "Planes with tumor-vessel contact (gap <= {:.2} mm): {:?}",
                config.vessel_wall, report.contact_planes
            );
            for (plane, records) in &report.angles_per_plane {
                for record in records {
                    println!(
                        "An angle of encasement for plane{} is {:.1} degrees (rays {}..{})",
                        plane, record.degrees, record.first_ray, record.last_ray
                    );
                }
            }
            print_skipped(&report.skipped_planes);
        }
    }
}

fn print_skipped(skipped: &[crate::io::SkippedPlane]) {
    for skip in skipped {
        eprintln!("Skipped plane{}: {}", skip.plane, skip.cause);
    }
}

/// Writes the per-plane encasement angle records to CSV.
pub fn write_angle_records_to_csv<P: AsRef<Path>>(
    path: P,
    report: &ContactReport,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(&["plane", "degrees", "first_ray", "last_ray"])?;

    for (plane, records) in &report.angles_per_plane {
        for record in records {
            wtr.write_record(&[
                plane.to_string(),
                record.degrees.to_string(),
                record.first_ray.to_string(),
                record.last_ray.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
