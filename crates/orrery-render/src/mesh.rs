//! Procedural meshes shared by the voxel and planet renderers.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.vertices.len() as u32;
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(MeshVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                uv,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}

/// Axis-aligned cube spanning `[-0.5, 0.5]³`, four vertices per face.
pub fn unit_cube() -> MeshData {
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let mut mesh = MeshData::default();
    for (normal, right, up) in faces {
        let c = normal * 0.5;
        let (r, u) = (right * 0.5, up * 0.5);
        mesh.push_quad([c - r - u, c + r - u, c + r + u, c - r + u], normal);
    }
    mesh
}

/// Latitude/longitude sphere with smooth normals.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * std::f32::consts::PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * std::f32::consts::TAU;
            let normal = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            mesh.vertices.push(MeshVertex {
                position: (normal * radius).to_array(),
                normal: normal.to_array(),
                uv: [u, 1.0 - v],
            });
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            if ring != 0 {
                mesh.indices.extend_from_slice(&[a + 1, a, b + 1]);
            }
            if ring != rings - 1 {
                mesh.indices.extend_from_slice(&[a, b, b + 1]);
            }
        }
    }
    mesh
}

/// Flat ring in the XY plane facing `+Z`, between `inner` and `outer` radius.
pub fn annulus(inner: f32, outer: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    for seg in 0..=segments {
        let u = seg as f32 / segments as f32;
        let (sin, cos) = (u * std::f32::consts::TAU).sin_cos();
        for (radius, v) in [(inner, 0.0), (outer, 1.0)] {
            mesh.vertices.push(MeshVertex {
                position: [cos * radius, sin * radius, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [u, v],
            });
        }
    }
    for seg in 0..segments {
        let i = seg * 2;
        mesh.indices
            .extend_from_slice(&[i, i + 1, i + 3, i, i + 3, i + 2]);
    }
    mesh
}

/// Geodesic sphere: an icosahedron with each triangle split into four
/// `subdivisions` times. Vertices are shared, so faces shade flat only when
/// the shader derives normals from screen-space derivatives.
pub fn icosphere(radius: f32, subdivisions: u32) -> MeshData {
    let t = (1.0 + 5f32.sqrt()) * 0.5;
    let mut points: Vec<Vec3> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .into_iter()
    .map(|p| Vec3::from_array(p).normalize())
    .collect();
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, points: &mut Vec<Vec3>| {
            *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
                let mid = (points[a as usize] + points[b as usize]).normalize();
                points.push(mid);
                points.len() as u32 - 1
            })
        };
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut points);
            let bc = midpoint(b, c, &mut points);
            let ca = midpoint(c, a, &mut points);
            next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = next;
    }

    let vertices = points
        .into_iter()
        .map(|n| MeshVertex {
            position: (n * radius).to_array(),
            normal: n.to_array(),
            uv: [
                0.5 + n.z.atan2(-n.x) / std::f32::consts::TAU,
                0.5 + n.y.asin() / std::f32::consts::PI,
            ],
        })
        .collect();
    MeshData {
        vertices,
        indices: faces.into_iter().flatten().collect(),
    }
}

/// Line-list indices for the silhouette-independent edges of `mesh`: every
/// edge whose two faces meet at more than `threshold_degrees`, plus open
/// boundary edges. Vertices at the same position are welded first, so seams
/// and per-face vertex copies do not produce spurious edges.
pub fn feature_edges(mesh: &MeshData, threshold_degrees: f32) -> Vec<u32> {
    let min_dot = threshold_degrees.to_radians().cos();
    let mut welded: HashMap<[i32; 3], u32> = HashMap::new();
    let weld_ids: Vec<u32> = mesh
        .vertices
        .iter()
        .map(|v| {
            let key = v.position.map(|c| (c * 1e5).round() as i32);
            let next = welded.len() as u32;
            *welded.entry(key).or_insert(next)
        })
        .collect();

    // Welded edge -> (first vertex pair seen, normals of adjacent faces).
    let mut slots: HashMap<(u32, u32), usize> = HashMap::new();
    let mut edges: Vec<([u32; 2], Vec<Vec3>)> = Vec::new();
    for tri in mesh.indices.chunks_exact(3) {
        let p = |i: u32| Vec3::from_array(mesh.vertices[i as usize].position);
        let cross = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
        if cross.length_squared() < 1e-12 {
            continue;
        }
        let normal = cross.normalize();
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let (wa, wb) = (weld_ids[a as usize], weld_ids[b as usize]);
            let key = (wa.min(wb), wa.max(wb));
            let slot = *slots.entry(key).or_insert_with(|| {
                edges.push(([a, b], Vec::with_capacity(2)));
                edges.len() - 1
            });
            edges[slot].1.push(normal);
        }
    }

    edges
        .into_iter()
        .filter(|(_, normals)| match normals.as_slice() {
            [first, second, ..] => first.dot(*second) <= min_dot,
            _ => true,
        })
        .flat_map(|(pair, _)| pair)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(mesh: &MeshData, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from_array(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let mesh = unit_cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        for tri in mesh.indices.chunks(3) {
            let n = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!(triangle_normal(&mesh, tri).dot(n) > 0.0);
        }
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.dot(Vec3::from_array(v.normal)) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let mesh = uv_sphere(2.0, 16, 8);
        assert_eq!(mesh.vertices.len(), 17 * 9);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.position).length() - 2.0).abs() < 1e-5);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn test_sphere_triangles_face_outward() {
        let mesh = uv_sphere(1.0, 12, 6);
        for tri in mesh.indices.chunks(3) {
            let centroid: Vec3 = tri
                .iter()
                .map(|&i| Vec3::from_array(mesh.vertices[i as usize].position))
                .sum::<Vec3>()
                / 3.0;
            assert!(triangle_normal(&mesh, tri).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_annulus_radii() {
        let mesh = annulus(1.2, 1.9, 64);
        for v in &mesh.vertices {
            let r = Vec3::from_array(v.position).length();
            assert!((r - 1.2).abs() < 1e-5 || (r - 1.9).abs() < 1e-5);
        }
        assert_eq!(mesh.index_count(), 64 * 6);
        for tri in mesh.indices.chunks(3) {
            assert!(triangle_normal(&mesh, tri).z > 0.0);
        }
    }

    #[test]
    fn test_icosphere_counts_and_winding() {
        let base = icosphere(1.0, 0);
        assert_eq!(base.vertices.len(), 12);
        assert_eq!(base.index_count(), 60);

        let mesh = icosphere(2.0, 1);
        assert_eq!(mesh.vertices.len(), 42);
        assert_eq!(mesh.index_count(), 80 * 3);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.position).length() - 2.0).abs() < 1e-5);
        }
        for tri in mesh.indices.chunks(3) {
            let centroid = Vec3::from_array(mesh.vertices[tri[0] as usize].position);
            assert!(triangle_normal(&mesh, tri).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_feature_edges_of_icosphere() {
        assert_eq!(feature_edges(&icosphere(1.0, 0), 1.0).len(), 30 * 2);
        assert_eq!(feature_edges(&icosphere(1.0, 1), 1.0).len(), 120 * 2);
    }

    #[test]
    fn test_feature_edges_skip_coplanar_diagonals() {
        let cube = unit_cube();
        let edges = feature_edges(&cube, 1.0);
        assert_eq!(edges.len(), 12 * 2);
        for pair in edges.chunks(2) {
            let a = Vec3::from_array(cube.vertices[pair[0] as usize].position);
            let b = Vec3::from_array(cube.vertices[pair[1] as usize].position);
            assert!((a.distance(b) - 1.0).abs() < 1e-6, "diagonal {a} -> {b}");
        }
    }

    #[test]
    fn test_feature_edges_keep_open_boundary() {
        let ring = annulus(1.0, 2.0, 8);
        // Inner and outer rims only; the quad diagonals are coplanar.
        assert_eq!(feature_edges(&ring, 1.0).len(), 16 * 2);
    }
}
