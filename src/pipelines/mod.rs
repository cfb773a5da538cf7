//! Render pipelines.
//!
//! Every object pipeline binds the per-draw object uniform at group 0 and its
//! material at group 1. The cube pass and the main pass render to different color
//! formats, so a [`PipelineSet`] is built per target format.

pub mod basic;
pub mod lit;
pub mod mipmap;
pub mod reflect;
pub mod sky;

use crate::data_structures::uniform::UniformSlots;

/// Bind group layouts shared by all pipeline sets.
#[derive(Debug)]
pub struct Layouts {
    pub object: wgpu::BindGroupLayout,
    pub lit: wgpu::BindGroupLayout,
    pub sky: wgpu::BindGroupLayout,
    pub reflect: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            object: UniformSlots::bind_group_layout(device),
            lit: lit::mk_bind_group_layout(device),
            sky: sky::mk_bind_group_layout(device),
            reflect: reflect::mk_bind_group_layout(device),
        }
    }
}

#[derive(Debug)]
pub struct PipelineSet {
    pub format: wgpu::TextureFormat,
    pub lit: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    /// Only the main pass draws the reflective sphere.
    pub reflect: Option<wgpu::RenderPipeline>,
}

impl PipelineSet {
    /// Pipelines for the main pass into a surface of `format`.
    pub fn for_surface(device: &wgpu::Device, layouts: &Layouts, format: wgpu::TextureFormat) -> Self {
        let mut set = Self::for_cube_map(device, layouts, format);
        set.reflect = Some(reflect::mk_render_pipeline_for(
            device,
            &layouts.object,
            &layouts.reflect,
            format,
        ));
        set
    }

    /// Pipelines for the cube map faces.
    pub fn for_cube_map(device: &wgpu::Device, layouts: &Layouts, format: wgpu::TextureFormat) -> Self {
        log::debug!("building pipelines for {:?}", format);
        Self {
            format,
            lit: lit::mk_render_pipeline_for(device, &layouts.object, &layouts.lit, format),
            sky: sky::mk_render_pipeline_for(device, &layouts.object, &layouts.sky, format),
            reflect: None,
        }
    }
}
