use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{material_layout, mk_object_pipeline_layout, mk_render_pipeline},
};

/// Material layout of per-pixel lit, diffuse-textured objects.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    material_layout(
        device,
        "lit material layout",
        &[wgpu::TextureViewDimension::D2],
    )
}

pub fn mk_render_pipeline_for(
    device: &wgpu::Device,
    object_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout =
        mk_object_pipeline_layout(device, "Lit Pipeline Layout", object_layout, material_layout);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lit.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Lit Pipeline",
        &layout,
        color_format,
        Some(Texture::DEPTH_FORMAT),
        &[ModelVertex::desc()],
        shader,
    )
}
