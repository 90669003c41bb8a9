/// OFF (Object File Format) parser
use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{digit1, multispace0, multispace1},
    combinator::{eof, map_res, peek},
    number::complete::float,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::{MeshError, Result};
use crate::geometry::BoundingBox;
use crate::normals::triangle_normal;

/// First token of every OFF file.
pub const OFF_MARKER: &str = "OFF";

/// Raw loader output.
#[derive(Debug, Clone, Default)]
pub struct OffData {
    pub vertices: Vec<Point3<f32>>,
    /// Average of the incident face normals per vertex. This is a quick
    /// estimate; zero for vertices without faces.
    pub normals: Vec<Vector3<f32>>,
    pub triangles: Vec<[u32; 3]>,
    /// Triangle indices flattened for draw calls.
    pub indices: Vec<u32>,
    pub bounding_box: BoundingBox,
}

/// Read and parse an OFF file.
pub fn load_off<P: AsRef<Path>>(path: P) -> Result<OffData> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| MeshError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| MeshError::Format(format!("{} is not valid UTF-8: {}", path.display(), e)))?;

    let data = parse_off(text)?;

    let bounds = &data.bounding_box;
    log::info!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        data.vertices.len(),
        data.triangles.len()
    );
    log::info!(
        "bounding box: x = ({}, {}), y = ({}, {}), z = ({}, {})",
        bounds.x.0,
        bounds.x.1,
        bounds.y.0,
        bounds.y.1,
        bounds.z.0,
        bounds.z.1
    );
    Ok(data)
}

/// Parse OFF text.
///
/// Only triangular faces are accepted and every face index must refer to one
/// of the declared vertices.
pub fn parse_off(input: &str) -> Result<OffData> {
    let source = input;

    let (input, marker) = expect(source, input, token, "the OFF marker")?;
    if marker != OFF_MARKER {
        return Err(MeshError::Format(format!(
            "expected `{}` marker, found `{}`",
            OFF_MARKER, marker
        )));
    }

    let (input, vertex_count) = expect(source, input, count, "the vertex count")?;
    let (input, face_count) = expect(source, input, count, "the face count")?;
    let (mut input, _edge_count) = expect(source, input, count, "the edge count")?;

    // Counts come from the file; do not trust them for allocation sizes.
    let mut vertices = Vec::with_capacity(vertex_count.min(input.len()));
    let mut bounds: Option<BoundingBox> = None;

    for v in 0..vertex_count {
        let what = format!("vertex {} of {}", v, vertex_count);
        let (rest, vertex) = expect(source, input, point, &what)?;
        if !vertex.coords.iter().all(|c| c.is_finite()) {
            return Err(MeshError::Format(format!(
                "{} on line {} has a non-finite coordinate",
                what,
                line_of(source, input.trim_start())
            )));
        }
        input = rest;

        match bounds.as_mut() {
            Some(bounds) => bounds.include(&vertex),
            None => bounds = Some(BoundingBox::from_point(&vertex)),
        }
        vertices.push(vertex);
    }

    let mut triangles = Vec::with_capacity(face_count.min(input.len()));
    let mut indices = Vec::with_capacity(face_count.min(input.len()) * 3);
    let mut normal_sums = vec![Vector3::zeros(); vertex_count];
    let mut incident_faces = vec![0u32; vertex_count];

    for f in 0..face_count {
        let what = format!("the corner count of face {}", f);
        let (rest, corners) = expect(source, input, count, &what)?;
        if corners != 3 {
            return Err(MeshError::Format(format!(
                "face {} has {} vertices on line {}, only triangles are supported",
                f,
                corners,
                line_of(source, rest)
            )));
        }
        input = rest;

        let mut triangle = [0u32; 3];
        for (corner, slot) in triangle.iter_mut().enumerate() {
            let what = format!("vertex index {} of face {}", corner, f);
            let (rest, index) = expect(source, input, vertex_index, &what)?;
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    face: f,
                    index,
                    vertex_count,
                });
            }
            *slot = index;
            input = rest;
        }

        let [a, b, c] = triangle.map(|i| i as usize);
        let normal = triangle_normal(&vertices[a], &vertices[b], &vertices[c]);
        for i in [a, b, c] {
            normal_sums[i] += normal;
            incident_faces[i] += 1;
        }

        triangles.push(triangle);
        indices.extend_from_slice(&triangle);
    }

    let normals = normal_sums
        .into_iter()
        .zip(incident_faces)
        .map(|(sum, faces)| if faces > 0 { sum / faces as f32 } else { sum })
        .collect();

    log::debug!(
        "parsed OFF: {} vertices, {} triangles",
        vertices.len(),
        triangles.len()
    );

    Ok(OffData {
        vertices,
        normals,
        triangles,
        indices,
        bounding_box: bounds.unwrap_or_default(),
    })
}

/// Run `parser`, turning a nom failure into a [`MeshError::Format`] that says
/// what was expected and on which line.
fn expect<'a, T>(
    source: &str,
    input: &'a str,
    parser: impl FnOnce(&'a str) -> IResult<&'a str, T>,
    what: &str,
) -> Result<(&'a str, T)> {
    parser(input).map_err(|err| {
        let at = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
            nom::Err::Incomplete(_) => input,
        };
        let remaining = at.trim_start();
        if remaining.is_empty() {
            MeshError::Format(format!("unexpected end of input while reading {}", what))
        } else {
            let found: String = remaining
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .chars()
                .take(32)
                .collect();
            MeshError::Format(format!(
                "expected {} on line {}, found `{}`",
                what,
                line_of(source, remaining),
                found
            ))
        }
    })
}

/// One-based line number of the start of `rest` inside `source`.
fn line_of(source: &str, rest: &str) -> usize {
    let consumed = source.len() - rest.len();
    source[..consumed].matches('\n').count() + 1
}

/// A value must be followed by whitespace or the end of input.
fn separated<'a, T>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> impl FnMut(&'a str) -> IResult<&'a str, T> {
    terminated(
        preceded(multispace0, parser),
        peek(alt((multispace1, eof))),
    )
}

fn token(input: &str) -> IResult<&str, &str> {
    separated(take_till1(char::is_whitespace))(input)
}

fn count(input: &str) -> IResult<&str, usize> {
    separated(map_res(digit1, str::parse::<usize>))(input)
}

fn vertex_index(input: &str) -> IResult<&str, u32> {
    separated(map_res(digit1, str::parse::<u32>))(input)
}

fn coordinate(input: &str) -> IResult<&str, f32> {
    separated(float)(input)
}

fn point(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, x) = coordinate(input)?;
    let (input, y) = coordinate(input)?;
    let (input, z) = coordinate(input)?;
    Ok((input, Point3::new(x, y, z)))
}
