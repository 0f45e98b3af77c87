use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use nalgebra::Point3;

/// Utility: detect whether the file uses comma or tab as delimiter.
fn detect_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let file = File::open(&path).with_context(|| {
        format!(
            "failed to open file for delimiter sniffing: {:?}",
            path.as_ref()
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader
        .read_line(&mut first_line)
        .with_context(|| "failed to read first line for delimiter detection")?;

    // Count occurrences
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();

    if tabs > commas {
        Ok(b'\t')
    } else {
        // default to comma
        Ok(b',')
    }
}

/// Immutable triangulated surface. The pipeline only ever reads it; positions
/// and connectivity are fixed at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        TriMesh { vertices, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Vertex positions of one triangle.
    pub fn triangle(&self, face: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[face];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Reads a binary or ASCII STL surface from a file.
    pub fn from_stl_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(&path)
            .with_context(|| format!("failed to open mesh file: {:?}", path.as_ref()))?;
        Self::from_stl_reader(&mut file)
            .with_context(|| format!("failed to parse STL mesh: {:?}", path.as_ref()))
    }

    /// Reads STL data from any seekable source.
    pub fn from_stl_reader<R: Read + Seek>(read: &mut R) -> Result<Self> {
        let stl = stl_io::read_stl(read).context("failed to parse STL data")?;

        let vertices = stl
            .vertices
            .iter()
            .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
            .collect();
        let faces = stl.faces.iter().map(|f| f.vertices).collect();

        Ok(TriMesh { vertices, faces })
    }
}

/// Reads a sampled vessel surface point cloud (one x,y,z row per point),
/// used by the spline-fit centerline provider. Header rows are skipped.
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<Vec<Point3<f64>>> {
    let delimiter = detect_delimiter(&path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("failed to open point cloud file: {:?}", path.as_ref()))?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| "failed to read point cloud record")?;
        if record.len() < 3 {
            continue;
        }
        let coords: Option<Vec<f64>> = record
            .iter()
            .take(3)
            .map(|field| field.trim().parse::<f64>().ok())
            .collect();
        match coords {
            Some(c) if c.iter().all(|v| v.is_finite()) => {
                points.push(Point3::new(c[0], c[1], c[2]))
            }
            // "NaN" and "inf" parse as f64 but are never valid coordinates
            Some(_) => bail!(
                "non-finite coordinate in point cloud file: {:?}",
                path.as_ref()
            ),
            // likely a header row, skip it
            None => continue,
        }
    }

    if points.is_empty() {
        bail!(
            "point cloud file contains no coordinate rows: {:?}",
            path.as_ref()
        );
    }
    Ok(points)
}
