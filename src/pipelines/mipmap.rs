//! Mip chain generation by repeated downsampling blits.
//!
//! Each level is drawn from the level above it with a full-screen triangle and a
//! linear sampler, one render pass per (layer, level). The views and bind groups of
//! a texture are built once by [`MipmapGenerator::prepare`] and replayed every frame.

use crate::{data_structures::texture::create_clamped_sampler, pipelines::basic::mk_render_pipeline};

#[derive(Debug)]
pub struct MipmapGenerator {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl MipmapGenerator {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("mipmap bind group layout"),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mipmap Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Mipmap Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mipmap.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            "Mipmap Pipeline",
            &layout,
            format,
            None,
            &[],
            shader,
        );

        Self {
            format,
            pipeline,
            bind_group_layout,
            sampler: create_clamped_sampler(device),
        }
    }

    /// Build the views and bind groups that fill mip levels `1..mip_level_count` of
    /// every array layer of `texture` from the level above.
    pub fn prepare(&self, device: &wgpu::Device, texture: &wgpu::Texture) -> anyhow::Result<MipChain> {
        anyhow::ensure!(
            texture.format() == self.format,
            "mipmap generator for {:?} cannot process a {:?} texture",
            self.format,
            texture.format()
        );
        let level_view = |mip: u32, layer: u32| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("mip level view"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_mip_level: mip,
                mip_level_count: Some(1),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        };

        let blits = blit_targets(texture.depth_or_array_layers(), texture.mip_level_count())
            .map(|(layer, mip)| {
                let src = level_view(mip - 1, layer);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&src),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                    label: Some("mipmap bind group"),
                });
                MipBlit {
                    target: level_view(mip, layer),
                    source: bind_group,
                }
            })
            .collect::<Vec<_>>();
        log::debug!("prepared {} mip blits", blits.len());
        Ok(MipChain { blits })
    }

    /// Record one downsampling pass per prepared level.
    pub fn generate(&self, encoder: &mut wgpu::CommandEncoder, chain: &MipChain) {
        for blit in &chain.blits {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mipmap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &blit.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &blit.source, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[derive(Debug)]
struct MipBlit {
    target: wgpu::TextureView,
    source: wgpu::BindGroup,
}

/// Prebuilt downsampling passes of one texture, in recording order.
#[derive(Debug)]
pub struct MipChain {
    blits: Vec<MipBlit>,
}

/// `(layer, mip)` of every level that is drawn from `mip - 1`. Levels of one layer
/// are consecutive so each blit reads a level that is already filled.
pub fn blit_targets(layers: u32, mip_levels: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..layers).flat_map(move |layer| (1..mip_levels).map(move |mip| (layer, mip)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_layer_fills_each_level_below_the_first() {
        let targets: Vec<_> = blit_targets(6, 9).collect();
        assert_eq!(targets.len(), 6 * 8);
        assert_eq!(targets[0], (0, 1));
        assert_eq!(targets[7], (0, 8));
        assert_eq!(targets[8], (1, 1));
        assert!(targets.iter().all(|(layer, mip)| *layer < 6 && (1..9).contains(mip)));
    }

    #[test]
    fn single_level_textures_need_no_blits() {
        assert_eq!(blit_targets(6, 1).count(), 0);
        assert_eq!(blit_targets(0, 9).count(), 0);
    }
}
