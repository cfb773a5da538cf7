//! Dynamic environment cube map.
//!
//! The scene is rendered once per face into the layers of a cube texture, the mip
//! chain is rebuilt, and the whole cube is then sampled by reflective surfaces. Face
//! layer order and orientation follow the wgpu (and D3D) cube convention:
//! +X, -X, +Y, -Y, +Z, -Z, viewed from the centre in a left-handed world.

use cgmath::{Point3, Rad, Vector3};

use crate::{
    camera::Camera,
    data_structures::texture::{Texture, mip_level_count},
};

/// Color format of the cube map faces.
pub const CUBE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of the face in the cube texture.
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Offset from the centre to the look target of the face camera.
    pub fn direction(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveX => Vector3::new(1.0, 0.0, 0.0),
            CubeFace::NegativeX => Vector3::new(-1.0, 0.0, 0.0),
            CubeFace::PositiveY => Vector3::new(0.0, 1.0, 0.0),
            CubeFace::NegativeY => Vector3::new(0.0, -1.0, 0.0),
            CubeFace::PositiveZ => Vector3::new(0.0, 0.0, 1.0),
            CubeFace::NegativeZ => Vector3::new(0.0, 0.0, -1.0),
        }
    }

    pub fn up(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveY => Vector3::new(0.0, 0.0, -1.0),
            CubeFace::NegativeY => Vector3::new(0.0, 0.0, 1.0),
            _ => Vector3::new(0.0, 1.0, 0.0),
        }
    }
}

/// One camera per face looking out of `center`: 90 degree fov, square aspect.
pub fn build_cube_face_cameras(center: Point3<f32>, near: f32, far: f32) -> [Camera; 6] {
    CubeFace::ALL.map(|face| {
        let mut camera = Camera::default();
        camera.look_at(center, center + face.direction(), face.up());
        camera.set_lens(Rad(0.5 * std::f32::consts::PI), 1.0, near, far);
        camera
    })
}

/// Render target and sampling views of the dynamic cube map.
#[derive(Debug)]
pub struct DynamicCubeMap {
    texture: wgpu::Texture,
    face_views: [wgpu::TextureView; 6],
    cube_view: wgpu::TextureView,
    depth: Texture,
    cameras: [Camera; 6],
    near: f32,
    far: f32,
}

impl DynamicCubeMap {
    pub fn new(device: &wgpu::Device, size: u32, center: Point3<f32>, near: f32, far: f32) -> Self {
        let mip_levels = mip_level_count(size, size);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("dynamic cube map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CUBE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        // Faces are rendered at full resolution; lower levels come from mip generation.
        let face_views = CubeFace::ALL.map(|face| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("cube map face"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_mip_level: 0,
                mip_level_count: Some(1),
                base_array_layer: face.layer(),
                array_layer_count: Some(1),
                ..Default::default()
            })
        });
        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("cube map view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let depth = Texture::create_depth_texture(device, [size, size], "cube map depth");
        log::info!("dynamic cube map: {size}x{size}, {mip_levels} mip levels");

        Self {
            texture,
            face_views,
            cube_view,
            depth,
            cameras: build_cube_face_cameras(center, near, far),
            near,
            far,
        }
    }

    /// Re-centre the face cameras, e.g. when the reflective object moves.
    pub fn rebuild_cameras(&mut self, center: Point3<f32>) {
        self.cameras = build_cube_face_cameras(center, self.near, self.far);
    }

    pub fn camera(&self, face: CubeFace) -> &Camera {
        &self.cameras[face.layer() as usize]
    }

    pub fn face_view(&self, face: CubeFace) -> &wgpu::TextureView {
        &self.face_views[face.layer() as usize]
    }

    pub fn cube_view(&self) -> &wgpu::TextureView {
        &self.cube_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, assert_abs_diff_eq};

    #[test]
    fn face_layers_follow_cube_order() {
        let layers: Vec<u32> = CubeFace::ALL.iter().map(|f| f.layer()).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn face_cameras_match_the_target_and_up_table() {
        let center = Point3::new(0.0, 0.0, 0.0);
        let cameras = build_cube_face_cameras(center, 0.1, 1000.0);
        let expected = [
            (Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
            (Vector3::new(-1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
            (Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, -1.0)),
            (Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.0, 0.0, 1.0)),
            (Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 0.0)),
            (Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 1.0, 0.0)),
        ];
        for (camera, (look, up)) in cameras.iter().zip(expected) {
            assert_abs_diff_eq!(camera.look(), look, epsilon = 1e-6);
            assert_abs_diff_eq!(camera.up(), up, epsilon = 1e-6);
        }
    }

    #[test]
    fn face_cameras_share_a_square_90_degree_lens() {
        let cameras = build_cube_face_cameras(Point3::new(1.0, 2.0, 3.0), 0.1, 1000.0);
        for camera in &cameras {
            let lens = camera.lens().expect("lens set");
            assert_abs_diff_eq!(lens.fov_y.0, std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
            assert_eq!(lens.aspect, 1.0);
            assert_eq!(lens.near, 0.1);
            assert_eq!(lens.far, 1000.0);
            assert_eq!(camera.pos(), Point3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn positive_x_face_has_minus_z_on_its_right() {
        let cameras = build_cube_face_cameras(Point3::new(0.0, 0.0, 0.0), 0.1, 1000.0);
        let right = cameras[CubeFace::PositiveX.layer() as usize].right().normalize();
        assert_abs_diff_eq!(right, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }
}
