/// Vertex neighbourhoods
use std::collections::BTreeSet;

use nalgebra::Point3;

/// One-ring neighbourhood of every vertex: the vertices sharing an edge with
/// it. A vertex is never its own neighbour, even in a triangle that repeats
/// an index. Vertices that belong to no triangle get an empty set.
///
/// # Panics
///
/// Panics if a triangle references an index outside `vertices`.
pub fn one_ring(vertices: &[Point3<f32>], triangles: &[[u32; 3]]) -> Vec<BTreeSet<u32>> {
    let mut rings = vec![BTreeSet::new(); vertices.len()];
    for &[a, b, c] in triangles {
        for (vertex, others) in [(a, [b, c]), (b, [a, c]), (c, [a, b])] {
            rings[vertex as usize].extend(others.into_iter().filter(|&other| other != vertex));
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;

    #[test]
    fn test_single_triangle() {
        let vertices = vec![Point3::origin(); 3];
        let rings = one_ring(&vertices, &[[0, 1, 2]]);
        assert_eq!(rings[0], BTreeSet::from([1, 2]));
        assert_eq!(rings[1], BTreeSet::from([0, 2]));
        assert_eq!(rings[2], BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_repeated_index_is_not_a_self_loop() {
        let vertices = vec![Point3::origin(); 3];
        let rings = one_ring(&vertices, &[[0, 0, 1], [2, 2, 2]]);
        assert_eq!(rings[0], BTreeSet::from([1]));
        assert_eq!(rings[1], BTreeSet::from([0]));
        assert!(rings[2].is_empty());
    }

    #[test]
    fn test_shared_edge_is_not_duplicated() {
        let vertices = vec![Point3::origin(); 5];
        let rings = one_ring(&vertices, &[[0, 1, 2], [0, 2, 3], [2, 1, 0]]);
        assert_eq!(rings[0], BTreeSet::from([1, 2, 3]));
        assert_eq!(rings[2], BTreeSet::from([0, 1, 3]));
        assert!(rings[4].is_empty());
    }

    #[test]
    fn test_cube_rings_are_symmetric() {
        let cube = Mesh::cube(1.0);
        let rings = cube.one_ring();
        assert_eq!(rings.len(), 8);

        for (i, ring) in rings.iter().enumerate() {
            assert!(!ring.contains(&(i as u32)), "vertex {i} lists itself");
            for &j in ring {
                assert!(rings[j as usize].contains(&(i as u32)), "{i} -> {j} is one-way");
            }
        }

        // Corners on the diagonals touch six triangles, the others three
        for (i, ring) in rings.iter().enumerate() {
            let expected = if [0, 3, 5, 6].contains(&i) { 6 } else { 3 };
            assert_eq!(ring.len(), expected, "vertex {i}");
        }
    }

    #[test]
    fn test_every_triangle_edge_is_present() {
        let cube = Mesh::cube(1.0);
        let rings = cube.one_ring();
        for &[a, b, c] in cube.triangles() {
            for (from, to) in [(a, b), (b, c), (c, a)] {
                assert!(rings[from as usize].contains(&to));
                assert!(rings[to as usize].contains(&from));
            }
        }
    }
}
