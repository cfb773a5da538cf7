use cgmath::{InnerSpace, Vector3, Zero};

use crate::data_structures::model::{MeshData, ModelVertex};

/// Convert a triangulated, single-indexed tobj mesh.
///
/// Texture `v` is flipped into wgpu's top-left origin. Meshes without normals get
/// smooth normals averaged from their faces.
pub fn mesh_data_from_obj(mesh: &tobj::Mesh) -> MeshData {
    let vertices = (0..mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    let mut data = MeshData {
        vertices,
        indices: mesh.indices.clone(),
    };
    if mesh.normals.is_empty() {
        compute_normals(&mut data);
    }
    data
}

/// Overwrite vertex normals with the area-weighted average of adjacent face normals.
pub fn compute_normals(data: &mut MeshData) {
    let mut normals = vec![Vector3::<f32>::zero(); data.vertices.len()];
    for c in data.indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        if i0 >= normals.len() || i1 >= normals.len() || i2 >= normals.len() {
            log::warn!("triangle {:?} references a missing vertex", c);
            continue;
        }
        let p0: Vector3<f32> = data.vertices[i0].position.into();
        let p1: Vector3<f32> = data.vertices[i1].position.into();
        let p2: Vector3<f32> = data.vertices[i2].position.into();
        let face = (p1 - p0).cross(p2 - p0);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }
    for (vertex, normal) in data.vertices.iter_mut().zip(normals) {
        if normal.magnitude2() > 0.0 {
            vertex.normal = normal.normalize().into();
        }
    }
}

/// Axis-aligned box of half size `half_extent` with per-face normals.
pub fn cube(half_extent: f32) -> MeshData {
    // (normal, u axis, v axis) of each face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, -1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
    ];

    let mut data = MeshData::default();
    for (normal, u, v) in faces {
        let n = Vector3::from(normal);
        let u = Vector3::from(u);
        let v = Vector3::from(v);
        let base = data.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (n + u * su + v * sv) * half_extent;
            data.vertices.push(ModelVertex {
                position: p.into(),
                tex_coords: [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
                normal,
            });
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    data
}

/// Sphere of `radius` made of `rings` latitude bands and `segments` longitude slices.
///
/// Each band repeats its first vertex at the seam so texture coordinates wrap cleanly.
/// The pole bands only emit one triangle per slice.
pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut data = MeshData::default();

    for r in 0..=rings {
        let phi = std::f32::consts::PI * r as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for s in 0..=segments {
            let theta = 2.0 * std::f32::consts::PI * s as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            data.vertices.push(ModelVertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                tex_coords: [s as f32 / segments as f32, r as f32 / rings as f32],
                normal,
            });
        }
    }

    let stride = segments + 1;
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            if r != 0 {
                data.indices.extend_from_slice(&[a, b, a + 1]);
            }
            if r != rings - 1 {
                data.indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }
    data
}
