use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{material_layout, mk_object_pipeline_layout, mk_render_pipeline},
};

/// The sky box samples a cube texture with its object space position.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    material_layout(
        device,
        "sky material layout",
        &[wgpu::TextureViewDimension::Cube],
    )
}

pub fn mk_render_pipeline_for(
    device: &wgpu::Device,
    object_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout =
        mk_object_pipeline_layout(device, "Sky Pipeline Layout", object_layout, material_layout);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Sky Pipeline",
        &layout,
        color_format,
        Some(Texture::DEPTH_FORMAT),
        &[ModelVertex::desc()],
        shader,
    )
}
