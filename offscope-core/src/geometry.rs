/// Geometry primitives for 3D rendering
use std::collections::BTreeSet;
use std::path::Path;

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::adjacency;
use crate::error::{MeshError, Result};
use crate::normals::{self, WeightMode};
use crate::off::{self, OffData};

/// Axis-aligned bounds as `(min, max)` pairs, one per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: (f32, f32),
    pub y: (f32, f32),
    pub z: (f32, f32),
}

impl BoundingBox {
    /// A zero-volume box around a single point.
    pub fn from_point(point: &Point3<f32>) -> Self {
        Self {
            x: (point.x, point.x),
            y: (point.y, point.y),
            z: (point.z, point.z),
        }
    }

    /// Smallest box containing every point, or `None` when there are none.
    ///
    /// This is a min/max fold, so the result does not depend on point order.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::from_point(first);
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }

    /// Widen the box so it contains `point`.
    pub fn include(&mut self, point: &Point3<f32>) {
        widen(&mut self.x, point.x);
        widen(&mut self.y, point.y);
        widen(&mut self.z, point.z);
    }

    pub fn min(&self) -> Point3<f32> {
        Point3::new(self.x.0, self.y.0, self.z.0)
    }

    pub fn max(&self) -> Point3<f32> {
        Point3::new(self.x.1, self.y.1, self.z.1)
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min(), &self.max())
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vector3<f32> {
        self.max() - self.min()
    }

    pub fn contains(&self, point: &Point3<f32>) -> bool {
        (self.x.0..=self.x.1).contains(&point.x)
            && (self.y.0..=self.y.1).contains(&point.y)
            && (self.z.0..=self.z.1).contains(&point.z)
    }

    /// Model matrix that moves the box centre to the origin and scales it
    /// uniformly so its largest half-extent becomes 1.
    pub fn normalizing_transform(&self) -> Matrix4<f32> {
        let translation = Matrix4::new_translation(&-self.center().coords);
        let half_extent = self.extent().max() / 2.0;
        if half_extent > f32::EPSILON {
            Matrix4::new_scaling(1.0 / half_extent) * translation
        } else {
            translation
        }
    }
}

fn widen(range: &mut (f32, f32), value: f32) {
    if value < range.0 {
        range.0 = value;
    }
    if value > range.1 {
        range.1 = value;
    }
}

/// An indexed triangle mesh.
///
/// Triangle indices are validated on construction and the geometry never
/// changes afterwards; only the normals can be recomputed. Renderers share a
/// mesh by reference.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    uvs: Vec<Point2<f32>>,
    triangles: Vec<[u32; 3]>,
    indices: Vec<u32>,
    bounding_box: BoundingBox,
    weight_mode: WeightMode,
}

impl Mesh {
    /// Texture coordinate given to every vertex, since OFF carries none.
    pub fn default_uv() -> Point2<f32> {
        Point2::new(1.0, 1.0)
    }

    /// Load an OFF file and compute uniform smooth normals.
    pub fn from_off_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        off::load_off(path).map(Self::from_off_data)
    }

    /// Parse OFF text and compute uniform smooth normals.
    pub fn from_off_str(input: &str) -> Result<Self> {
        off::parse_off(input).map(Self::from_off_data)
    }

    /// Build a mesh from loader output. The loader has already validated the
    /// indices; its provisional normals are replaced by uniform smooth ones.
    pub fn from_off_data(data: OffData) -> Self {
        let OffData {
            vertices,
            triangles,
            indices,
            bounding_box,
            ..
        } = data;
        Self::assemble(vertices, triangles, indices, bounding_box)
    }

    /// Build a mesh from raw positions and triangles.
    pub fn from_parts(vertices: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        validate_triangles(vertices.len(), &triangles)?;
        let bounding_box = BoundingBox::from_points(&vertices).unwrap_or_default();
        let indices = triangles.iter().flatten().copied().collect();
        Ok(Self::assemble(vertices, triangles, indices, bounding_box))
    }

    fn assemble(
        vertices: Vec<Point3<f32>>,
        triangles: Vec<[u32; 3]>,
        indices: Vec<u32>,
        bounding_box: BoundingBox,
    ) -> Self {
        let weight_mode = WeightMode::Uniform;
        let normals = normals::compute_smooth_normals(&vertices, &triangles, weight_mode);
        let uvs = vec![Self::default_uv(); vertices.len()];
        Self {
            vertices,
            normals,
            uvs,
            triangles,
            indices,
            bounding_box,
            weight_mode,
        }
    }

    /// Replace the vertex normals with ones computed using `mode`.
    pub fn recompute_normals(&mut self, mode: WeightMode) {
        self.normals = normals::compute_smooth_normals(&self.vertices, &self.triangles, mode);
        self.weight_mode = mode;
        log::debug!("recomputed {} normals ({} weighting)", self.normals.len(), mode);
    }

    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Point2<f32>] {
        &self.uvs
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Flattened triangle indices, three per triangle, for draw calls.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Weighting used for the current normals.
    pub fn weight_mode(&self) -> WeightMode {
        self.weight_mode
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `index`.
    pub fn triangle_positions(&self, index: usize) -> [Point3<f32>; 3] {
        self.triangles[index].map(|i| self.vertices[i as usize])
    }

    /// Face normal of triangle `index`.
    pub fn face_normal(&self, index: usize) -> Vector3<f32> {
        let [p0, p1, p2] = self.triangle_positions(index);
        normals::triangle_normal(&p0, &p1, &p2)
    }

    /// Neighbouring vertices of every vertex.
    pub fn one_ring(&self) -> Vec<BTreeSet<u32>> {
        adjacency::one_ring(&self.vertices, &self.triangles)
    }

    /// Create a closed cube mesh centred on the origin.
    ///
    /// The diagonals are chosen so every corner touches the same number of
    /// triangles on each of its three faces, which makes its smooth normals
    /// point exactly along the corner diagonals.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let vertices = (0..8u32)
            .map(|corner| {
                let coord = |bit: u32| if corner & bit == 0 { -half } else { half };
                Point3::new(coord(1), coord(2), coord(4))
            })
            .collect();

        let triangles = vec![
            // Back (-Z)
            [0, 2, 3],
            [0, 3, 1],
            // Front (+Z)
            [4, 5, 6],
            [5, 7, 6],
            // Right (+X)
            [1, 3, 5],
            [3, 7, 5],
            // Left (-X)
            [0, 4, 6],
            [0, 6, 2],
            // Top (+Y)
            [2, 6, 3],
            [6, 7, 3],
            // Bottom (-Y)
            [0, 1, 5],
            [0, 5, 4],
        ];

        let bounding_box = BoundingBox {
            x: (-half, half),
            y: (-half, half),
            z: (-half, half),
        };
        let indices = triangles.iter().flatten().copied().collect();
        Self::assemble(vertices, triangles, indices, bounding_box)
    }
}

/// Check that every triangle index refers to an existing vertex.
pub fn validate_triangles(vertex_count: usize, triangles: &[[u32; 3]]) -> Result<()> {
    for (face, triangle) in triangles.iter().enumerate() {
        if let Some(&index) = triangle.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}
