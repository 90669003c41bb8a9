/// Smooth per-vertex normal estimation
use std::fmt;
use std::str::FromStr;

use nalgebra::{Point3, Vector3};

use crate::error::MeshError;

/// Below this length an accumulated normal is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// How the face normals around a vertex are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// Every incident face counts the same.
    #[default]
    Uniform,
    /// Faces are weighted by their share of the vertex's incident area.
    Area,
    /// Faces are weighted by their interior angle at the vertex.
    Angle,
}

impl WeightMode {
    pub const ALL: [WeightMode; 3] = [WeightMode::Uniform, WeightMode::Area, WeightMode::Angle];

    pub fn name(self) -> &'static str {
        match self {
            WeightMode::Uniform => "uniform",
            WeightMode::Area => "area",
            WeightMode::Angle => "angle",
        }
    }
}

impl fmt::Display for WeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for WeightMode {
    type Error = MeshError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WeightMode::Uniform),
            1 => Ok(WeightMode::Area),
            2 => Ok(WeightMode::Angle),
            other => Err(MeshError::InvalidWeightMode(other.to_string())),
        }
    }
}

impl FromStr for WeightMode {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeightMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MeshError::InvalidWeightMode(s.to_string()))
    }
}

/// Unit normal of the triangle `p0, p1, p2` (counter-clockwise winding faces
/// the viewer). Degenerate triangles yield the zero vector.
pub fn triangle_normal(p0: &Point3<f32>, p1: &Point3<f32>, p2: &Point3<f32>) -> Vector3<f32> {
    (p1 - p0)
        .cross(&(p2 - p0))
        .try_normalize(DEGENERATE_EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Area of the triangle `p0, p1, p2`.
pub fn triangle_area(p0: &Point3<f32>, p1: &Point3<f32>, p2: &Point3<f32>) -> f32 {
    0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
}

/// Interior angles (radians) at `p0`, `p1` and `p2`.
pub fn triangle_angles(p0: &Point3<f32>, p1: &Point3<f32>, p2: &Point3<f32>) -> [f32; 3] {
    [
        angle_between(&(p1 - p0), &(p2 - p0)),
        angle_between(&(p2 - p1), &(p0 - p1)),
        angle_between(&(p0 - p2), &(p1 - p2)),
    ]
}

fn angle_between(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let lengths = a.norm() * b.norm();
    if lengths <= DEGENERATE_EPSILON {
        return 0.0;
    }
    (a.dot(b) / lengths).clamp(-1.0, 1.0).acos()
}

/// Face normal for every triangle, in triangle order.
pub fn compute_triangle_normals(vertices: &[Point3<f32>], triangles: &[[u32; 3]]) -> Vec<Vector3<f32>> {
    triangles
        .iter()
        .map(|&[a, b, c]| {
            triangle_normal(
                &vertices[a as usize],
                &vertices[b as usize],
                &vertices[c as usize],
            )
        })
        .collect()
}

/// Per-vertex smooth normals.
///
/// Each vertex sums the normals of its incident faces, scaled according to
/// `mode`, then normalizes the sum. A vertex whose sum is zero (no incident
/// face, or faces that cancel out) keeps the zero vector.
///
/// # Panics
///
/// Panics if a triangle references an index outside `vertices`. Meshes built
/// through the loader or [`crate::Mesh::from_parts`] are already validated.
pub fn compute_smooth_normals(
    vertices: &[Point3<f32>],
    triangles: &[[u32; 3]],
    mode: WeightMode,
) -> Vec<Vector3<f32>> {
    let face_normals = compute_triangle_normals(vertices, triangles);

    // weights[t][k] is the raw weight of triangle t at its k-th corner
    let weights: Vec<[f32; 3]> = triangles
        .iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (&vertices[a as usize], &vertices[b as usize], &vertices[c as usize]);
            match mode {
                WeightMode::Uniform => [1.0; 3],
                WeightMode::Area => [triangle_area(p0, p1, p2); 3],
                WeightMode::Angle => triangle_angles(p0, p1, p2),
            }
        })
        .collect();

    let mut totals = vec![0.0f32; vertices.len()];
    for (triangle, weight) in triangles.iter().zip(&weights) {
        for (corner, &index) in triangle.iter().enumerate() {
            totals[index as usize] += weight[corner];
        }
    }

    let mut normals = vec![Vector3::zeros(); vertices.len()];
    for ((triangle, weight), face_normal) in triangles.iter().zip(&weights).zip(&face_normals) {
        for (corner, &index) in triangle.iter().enumerate() {
            let total = totals[index as usize];
            if total > 0.0 {
                normals[index as usize] += face_normal * (weight[corner] / total);
            }
        }
    }

    let mut degenerate = 0usize;
    for normal in &mut normals {
        match normal.try_normalize(DEGENERATE_EPSILON) {
            Some(unit) => *normal = unit,
            None => {
                *normal = Vector3::zeros();
                degenerate += 1;
            }
        }
    }
    if degenerate > 0 {
        log::warn!(
            "{} of {} vertices have no usable normal ({} weighting)",
            degenerate,
            vertices.len(),
            mode
        );
    }

    normals
}
