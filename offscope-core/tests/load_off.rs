use std::io::Write;

use nalgebra::Vector3;
use offscope_core::{load_off, Mesh, MeshError, WeightMode};
use tempfile::NamedTempFile;

const UNIT_CUBE: &str = "OFF
8 12 18
-0.5 -0.5 -0.5
 0.5 -0.5 -0.5
-0.5  0.5 -0.5
 0.5  0.5 -0.5
-0.5 -0.5  0.5
 0.5 -0.5  0.5
-0.5  0.5  0.5
 0.5  0.5  0.5
3 0 2 3
3 0 3 1
3 4 5 6
3 5 7 6
3 1 3 5
3 3 7 5
3 0 4 6
3 0 6 2
3 2 6 3
3 6 7 3
3 0 1 5
3 0 5 4
";

fn write_off(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write OFF");
    file
}

#[test]
fn unit_cube_normals_point_along_octant_diagonals() {
    let file = write_off(UNIT_CUBE);
    let mesh = Mesh::from_off_file(file.path()).expect("cube loads");

    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(mesh.indices().len(), 36);
    assert_eq!(mesh.bounding_box().x, (-0.5, 0.5));
    assert_eq!(mesh.bounding_box().y, (-0.5, 0.5));
    assert_eq!(mesh.bounding_box().z, (-0.5, 0.5));
    assert!(mesh.uvs().iter().all(|uv| *uv == Mesh::default_uv()));

    let diagonal = 1.0 / 3.0f32.sqrt();
    for (vertex, normal) in mesh.vertices().iter().zip(mesh.normals()) {
        let expected = Vector3::new(
            vertex.x.signum() * diagonal,
            vertex.y.signum() * diagonal,
            vertex.z.signum() * diagonal,
        );
        assert!((normal - expected).norm() < 1e-5, "{vertex:?}: {normal:?}");
    }
}

#[test]
fn closed_mesh_normals_are_unit_length_in_every_mode() {
    let file = write_off(UNIT_CUBE);
    let mut mesh = Mesh::from_off_file(file.path()).expect("cube loads");

    for mode in [WeightMode::Uniform, WeightMode::Area, WeightMode::Angle] {
        mesh.recompute_normals(mode);
        for normal in mesh.normals() {
            assert!((normal.norm() - 1.0).abs() < 1e-5, "{mode}: {normal:?}");
        }
    }
}

#[test]
fn loader_output_matches_the_built_in_cube() {
    let file = write_off(UNIT_CUBE);
    let data = load_off(file.path()).expect("cube loads");
    let cube = Mesh::cube(1.0);

    assert_eq!(data.vertices, cube.vertices());
    assert_eq!(data.triangles, cube.triangles());
    assert_eq!(data.indices, cube.indices());

    // The provisional normals average unit face normals without renormalizing
    for normal in &data.normals {
        assert!(normal.norm() > 0.5 && normal.norm() <= 1.0 + 1e-6);
    }
}

#[test]
fn adjacency_is_symmetric_on_loaded_mesh() {
    let file = write_off(UNIT_CUBE);
    let mesh = Mesh::from_off_file(file.path()).expect("cube loads");
    let rings = mesh.one_ring();

    for (i, ring) in rings.iter().enumerate() {
        for &j in ring {
            assert!(rings[j as usize].contains(&(i as u32)));
        }
    }
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("does-not-exist.off");

    match Mesh::from_off_file(&path) {
        Err(MeshError::FileNotFound { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn quad_face_fails_with_format_error() {
    let file = write_off("OFF\n4 1 4\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n");
    assert!(matches!(
        Mesh::from_off_file(file.path()),
        Err(MeshError::Format(_))
    ));
}

#[test]
fn out_of_range_index_fails_cleanly() {
    let file = write_off("OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 42\n");
    match Mesh::from_off_file(file.path()) {
        Err(MeshError::IndexOutOfRange {
            face,
            index,
            vertex_count,
        }) => {
            assert_eq!((face, index, vertex_count), (0, 42, 3));
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn wrong_marker_fails_with_format_error() {
    let file = write_off("PLY\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n");
    let err = Mesh::from_off_file(file.path()).unwrap_err();
    assert!(matches!(err, MeshError::Format(_)));
    assert!(err.to_string().contains("PLY"));
}

#[test]
fn non_utf8_file_is_a_format_error() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(&[0x4f, 0x46, 0x46, 0x0a, 0xff, 0xfe]).expect("write");
    assert!(matches!(
        load_off(file.path()),
        Err(MeshError::Format(_))
    ));
}
