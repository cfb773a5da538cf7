//! Per-draw uniform data and its GPU storage.
//!
//! [`ObjectUniform`] is the constant buffer every object shader reads at group 0:
//! transforms of the object for the current pass camera plus the light. Several
//! passes draw the same object with different cameras inside one submission, and
//! queued buffer writes all land before any pass executes, so each (pass, object)
//! pair gets its own slot in a single [`UniformSlots`] buffer addressed with a
//! dynamic offset.

use cgmath::{Matrix, Matrix4, Point3, SquareMatrix};

use crate::config::LightingConfig;

/// Light parameters shared by every object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub light_vec: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&LightingConfig> for Lighting {
    fn from(config: &LightingConfig) -> Self {
        Self {
            light_vec: config.light_vec,
            ambient: config.ambient,
            diffuse: config.diffuse,
            specular: config.specular,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        (&LightingConfig::default()).into()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub world_inv_transpose: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    pub light_vec: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
    pub eye_pos: [f32; 4],
    pub timer: f32,
    // Uniforms are laid out in 16 byte rows
    pub _padding: [f32; 3],
}

impl ObjectUniform {
    /// Compose the uniform of an object with world matrix `world` seen from a camera.
    ///
    /// A singular world matrix falls back to an identity normal matrix.
    pub fn compose(
        world: Matrix4<f32>,
        view_proj: Matrix4<f32>,
        eye: Point3<f32>,
        lighting: &Lighting,
        timer: f32,
    ) -> Self {
        let world_inv_transpose = world
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            world: world.into(),
            world_inv_transpose: world_inv_transpose.into(),
            world_view_proj: (view_proj * world).into(),
            light_vec: lighting.light_vec,
            light_ambient: lighting.ambient,
            light_diffuse: lighting.diffuse,
            light_specular: lighting.specular,
            eye_pos: [eye.x, eye.y, eye.z, 1.0],
            timer,
            _padding: [0.0; 3],
        }
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self::compose(
            Matrix4::identity(),
            Matrix4::identity(),
            Point3::new(0.0, 0.0, 0.0),
            &Lighting::default(),
            0.0,
        )
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// rgb is the specular colour, w the specular power.
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
}

impl MaterialUniform {
    /// White surface without highlights.
    pub fn matt_white() -> Self {
        Self {
            ambient: [1.0; 4],
            diffuse: [1.0; 4],
            specular: [0.0, 0.0, 0.0, 1.0],
            emissive: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// White surface with full-strength highlights.
    pub fn gloss_white() -> Self {
        Self {
            specular: [1.0, 1.0, 1.0, 32.0],
            ..Self::matt_white()
        }
    }
}

/// Round `size` up to the next multiple of `alignment` (a power of two).
pub fn align_to(size: u64, alignment: u64) -> u64 {
    (size + alignment - 1) & !(alignment - 1)
}

/// A uniform buffer split into equally sized, aligned slots of one type.
#[derive(Debug)]
pub struct UniformSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
}

impl UniformSlots {
    pub fn element_size() -> u64 {
        std::mem::size_of::<ObjectUniform>() as u64
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(Self::element_size()),
                },
                count: None,
            }],
            label: Some("object_bind_group_layout"),
        })
    }

    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u32) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(Self::element_size(), alignment);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Slots"),
            size: stride * capacity.max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(Self::element_size()),
                }),
            }],
            label: Some("object_bind_group"),
        });
        log::debug!("uniform slots: {capacity} x {stride} bytes");
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    pub fn offset(&self, slot: u32) -> u32 {
        debug_assert!(slot < self.capacity, "uniform slot {slot} out of range");
        (self.stride * slot as u64) as u32
    }

    /// Copy `uniform` into `slot`. Out of range slots are logged and skipped.
    pub fn write(&self, queue: &wgpu::Queue, slot: u32, uniform: &ObjectUniform) {
        if slot >= self.capacity {
            log::error!("uniform slot {} exceeds capacity {}", slot, self.capacity);
            return;
        }
        queue.write_buffer(
            &self.buffer,
            self.stride * slot as u64,
            bytemuck::cast_slice(&[*uniform]),
        );
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, assert_abs_diff_eq};

    #[test]
    fn object_uniform_rows_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<ObjectUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 288);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }

    #[test]
    fn align_to_rounds_up_to_the_alignment() {
        assert_eq!(align_to(288, 256), 512);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(1, 64), 64);
    }

    #[test]
    fn normal_matrix_of_uniform_scale_is_inverse_scaled() {
        let world = Matrix4::from_scale(0.05) * Matrix4::identity();
        let uniform = ObjectUniform::compose(
            world,
            Matrix4::identity(),
            Point3::new(1.0, 2.0, 3.0),
            &Lighting::default(),
            1.5,
        );
        let normal: Matrix4<f32> = uniform.world_inv_transpose.into();
        assert_abs_diff_eq!(normal.x.x, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(normal.w.w, 1.0, epsilon = 1e-6);
        assert_eq!(uniform.eye_pos, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.timer, 1.5);
    }

    #[test]
    fn normal_matrix_of_a_translation_keeps_directions() {
        let world = Matrix4::from_translation(Vector3::new(4.5, -1.2, 4.0));
        let uniform = ObjectUniform::compose(
            world,
            Matrix4::identity(),
            Point3::new(0.0, 0.0, 0.0),
            &Lighting::default(),
            0.0,
        );
        let normal: Matrix4<f32> = uniform.world_inv_transpose.into();
        let n = normal * Vector3::unit_y().extend(0.0);
        assert_abs_diff_eq!(n.truncate(), Vector3::unit_y(), epsilon = 1e-5);
    }

    #[test]
    fn singular_world_falls_back_to_identity_normals() {
        let uniform = ObjectUniform::compose(
            Matrix4::from_scale(0.0),
            Matrix4::identity(),
            Point3::new(0.0, 0.0, 0.0),
            &Lighting::default(),
            0.0,
        );
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_eq!(uniform.world_inv_transpose, identity);
    }
}
