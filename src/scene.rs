//! Scene orchestration.
//!
//! A frame is seven passes: the bridge and the sky box rendered into each face of the
//! dynamic cube map, then bridge, sky box and the reflective sphere rendered from the
//! main camera into the surface. Every pass sees its own camera, so every (pass,
//! object) pair owns one slot of the object uniform buffer. [`Scene::update`] fills all
//! slots, [`Scene::render`] records and submits the passes.
//!
//! The placement and slot math is free of GPU state and public so it can be checked
//! without a device.

use std::iter;

use anyhow::Context as _;
use cgmath::{EuclideanSpace, Point3, Rad, Vector3};
use instant::Duration;

use crate::{
    camera::{Camera, LookAtCamera},
    clock::Clock,
    config::{AppConfig, CameraConfig},
    context::Context,
    cube_map::{CUBE_FORMAT, CubeFace, DynamicCubeMap},
    data_structures::{
        instance::Instance,
        model::{DrawModel, Material, Model},
        texture::create_default_sampler,
        uniform::{Lighting, MaterialUniform, ObjectUniform, UniformSlots},
    },
    pipelines::{
        Layouts, PipelineSet,
        mipmap::{MipChain, MipmapGenerator},
    },
    resources::{
        self, FALLBACK_COLOUR, ObjMaterialOptions, mesh,
        texture::{load_cube_texture_or_solid, load_texture_or_solid},
    },
};

pub const OBJECT_COUNT: u32 = 3;
pub const PASS_COUNT: u32 = 7;

/// Sky colour used when the sky box faces cannot be loaded.
const SKY_FALLBACK: [u8; 4] = [110, 150, 210, 255];
/// A missing specular map makes the whole sphere reflective.
const SPECULAR_FALLBACK: [u8; 4] = [255, 255, 255, 255];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneObject {
    Bridge,
    Skybox,
    Sphere,
}

impl SceneObject {
    /// Draw order of every pass.
    pub const ALL: [SceneObject; 3] = [SceneObject::Bridge, SceneObject::Skybox, SceneObject::Sphere];

    pub fn index(self) -> u32 {
        self as u32
    }

    /// Placement at game time `t` seconds.
    pub fn instance(self, t: f32) -> Instance {
        match self {
            SceneObject::Bridge => Instance::new()
                .with_uniform_scale(0.05)
                .with_position(Vector3::new(4.5, -1.2, 4.0)),
            SceneObject::Skybox => Instance::new().with_uniform_scale(100.0),
            SceneObject::Sphere => Instance::new().with_rotation_x(Rad(t)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Face(CubeFace),
    Main,
}

impl Pass {
    /// Recording order: the cube faces first so the main pass samples a finished cube.
    pub const ALL: [Pass; PASS_COUNT as usize] = [
        Pass::Face(CubeFace::PositiveX),
        Pass::Face(CubeFace::NegativeX),
        Pass::Face(CubeFace::PositiveY),
        Pass::Face(CubeFace::NegativeY),
        Pass::Face(CubeFace::PositiveZ),
        Pass::Face(CubeFace::NegativeZ),
        Pass::Main,
    ];

    pub fn index(self) -> u32 {
        match self {
            Pass::Face(face) => face.layer(),
            Pass::Main => 6,
        }
    }

    /// The reflective sphere never appears in its own environment map.
    pub fn draws(self, object: SceneObject) -> bool {
        !matches!((self, object), (Pass::Face(_), SceneObject::Sphere))
    }

    pub fn objects(self) -> impl Iterator<Item = SceneObject> {
        SceneObject::ALL
            .into_iter()
            .filter(move |object| self.draws(*object))
    }
}

/// Slot of the object uniform buffer used by `object` during `pass`.
pub fn uniform_slot(pass: Pass, object: SceneObject) -> u32 {
    pass.index() * OBJECT_COUNT + object.index()
}

/// Constant buffer contents of `object` seen through `camera` at game time `t`.
pub fn object_uniform(
    object: SceneObject,
    camera: &Camera,
    lighting: &Lighting,
    t: f32,
) -> ObjectUniform {
    ObjectUniform::compose(
        object.instance(t).to_matrix(),
        camera.view_proj(),
        camera.pos(),
        lighting,
        t,
    )
}

/// Orbit camera with the lens of the main pass.
pub fn main_camera(config: &CameraConfig, aspect: f32) -> LookAtCamera {
    let mut orbit = LookAtCamera::new(Point3::from(config.position), Point3::from(config.target))
        .with_min_distance(config.min_distance);
    orbit
        .camera_mut()
        .set_lens(Rad(config.fov_y), aspect, config.near, config.far);
    orbit
}

#[derive(Debug)]
pub struct Scene {
    orbit: LookAtCamera,
    camera_config: CameraConfig,
    lighting: Lighting,
    clear_colour: wgpu::Color,
    clock: Clock,
    surface_pipelines: PipelineSet,
    cube_pipelines: PipelineSet,
    mipmaps: MipmapGenerator,
    cube_mips: MipChain,
    cube_map: DynamicCubeMap,
    slots: UniformSlots,
    bridge: Model,
    skybox: Model,
    sphere: Model,
}

impl Scene {
    pub async fn new(ctx: &Context, config: &AppConfig) -> anyhow::Result<Self> {
        let device = &ctx.device;
        let queue = &ctx.queue;
        let assets = &config.assets;
        let root = assets.root.as_path();

        let layouts = Layouts::new(device);
        let surface_pipelines = PipelineSet::for_surface(device, &layouts, ctx.config.format);
        let cube_pipelines = PipelineSet::for_cube_map(device, &layouts, CUBE_FORMAT);
        let mipmaps = MipmapGenerator::new(device, CUBE_FORMAT);

        let centre = Point3::from_vec(SceneObject::Sphere.instance(0.0).position);
        let cube_map = DynamicCubeMap::new(
            device,
            config.cube_map.size,
            centre,
            config.cube_map.near,
            config.cube_map.far,
        );
        let cube_mips = mipmaps.prepare(device, cube_map.texture())?;
        let slots = UniformSlots::new(device, &layouts.object, PASS_COUNT * OBJECT_COUNT);
        let sampler = create_default_sampler(device);

        let bridge = resources::load_model_obj(
            root,
            &assets.bridge_model,
            device,
            queue,
            ObjMaterialOptions {
                uniform: MaterialUniform::matt_white(),
                default_texture: &assets.bridge_texture,
                layout: &layouts.lit,
            },
        )
        .await
        .context("the bridge model is required")?;

        let sky_texture = load_cube_texture_or_solid(
            root,
            &assets.skybox_dir,
            &assets.skybox_extension,
            SKY_FALLBACK,
            device,
            queue,
        )
        .await?;
        let sky_material = Material::new(
            device,
            "skybox",
            MaterialUniform::matt_white(),
            &[&sky_texture.view],
            sky_texture.sampler.as_ref().unwrap_or(&sampler),
            &layouts.sky,
        );
        let skybox = Model {
            meshes: vec![mesh::cube(1.0).upload(device, "skybox", 0)],
            materials: vec![sky_material],
        };

        let rust_diffuse = load_texture_or_solid(
            root,
            &assets.sphere_diffuse,
            false,
            FALLBACK_COLOUR,
            device,
            queue,
        )
        .await;
        let rust_specular = load_texture_or_solid(
            root,
            &assets.sphere_specular,
            true,
            SPECULAR_FALLBACK,
            device,
            queue,
        )
        .await;
        let sphere_material = Material::new(
            device,
            "sphere",
            MaterialUniform::gloss_white(),
            &[&rust_diffuse.view, &rust_specular.view, cube_map.cube_view()],
            &sampler,
            &layouts.reflect,
        );
        let sphere_mesh = mesh::uv_sphere(
            config.scene.sphere_radius,
            config.scene.sphere_rings,
            config.scene.sphere_segments,
        );
        let sphere = Model {
            meshes: vec![sphere_mesh.upload(device, "sphere", 0)],
            materials: vec![sphere_material],
        };

        let fixed_step = Duration::try_from_secs_f32(1.0 / config.clock.fixed_step_hz)
            .with_context(|| format!("invalid fixed step rate {} Hz", config.clock.fixed_step_hz))?;
        let stats_delay = Duration::try_from_secs_f32(config.clock.stats_delay)
            .with_context(|| format!("invalid stats delay {} s", config.clock.stats_delay))?;
        let mut clock = Clock::new("main clock", stats_delay).with_fixed_step(fixed_step);
        clock.start();

        let [r, g, b, a] = config.scene.clear_colour;
        Ok(Self {
            orbit: main_camera(&config.camera, ctx.aspect_ratio()),
            camera_config: config.camera.clone(),
            lighting: Lighting::from(&config.lighting),
            clear_colour: wgpu::Color { r, g, b, a },
            clock,
            surface_pipelines,
            cube_pipelines,
            mipmaps,
            cube_mips,
            cube_map,
            slots,
            bridge,
            skybox,
            sphere,
        })
    }

    /// Rebuild the main projection for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let c = &self.camera_config;
        self.orbit
            .camera_mut()
            .set_lens(Rad(c.fov_y), width as f32 / height as f32, c.near, c.far);
    }

    /// Re-centre the cube map cameras.
    pub fn rebuild_cube_cameras(&mut self, centre: Point3<f32>) {
        self.cube_map.rebuild_cameras(centre);
    }

    /// Advance the clock and upload the uniforms of every pass. Returns the number of
    /// fixed steps that elapsed.
    pub fn update(&mut self, queue: &wgpu::Queue) -> u32 {
        self.clock.tick();
        let time = self.clock.game_time_elapsed().as_secs_f32();

        for pass in Pass::ALL {
            let camera = self.pass_camera(pass);
            for object in pass.objects() {
                let uniform = object_uniform(object, camera, &self.lighting, time);
                self.slots.write(queue, uniform_slot(pass, object), &uniform);
            }
        }
        self.clock.fixed_steps()
    }

    pub fn render(&self, ctx: &Context) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for face in CubeFace::ALL {
            let mut render_pass = begin_pass(
                &mut encoder,
                "Cube Face Pass",
                self.cube_map.face_view(face),
                self.cube_map.depth_view(),
                self.clear_colour,
            );
            self.draw_pass(&mut render_pass, Pass::Face(face), &self.cube_pipelines);
        }

        self.mipmaps.generate(&mut encoder, &self.cube_mips);

        {
            let mut render_pass = begin_pass(
                &mut encoder,
                "Main Pass",
                &view,
                ctx.depth_view(),
                self.clear_colour,
            );
            self.draw_pass(&mut render_pass, Pass::Main, &self.surface_pipelines);
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn draw_pass<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pass: Pass,
        pipelines: &'a PipelineSet,
    ) {
        let bind_group = self.slots.bind_group();
        for object in pass.objects() {
            let offset = self.slots.offset(uniform_slot(pass, object));
            match object {
                SceneObject::Bridge => {
                    render_pass.set_pipeline(&pipelines.lit);
                    render_pass.draw_model(&self.bridge, bind_group, offset);
                }
                SceneObject::Skybox => {
                    render_pass.set_pipeline(&pipelines.sky);
                    render_pass.draw_model(&self.skybox, bind_group, offset);
                }
                SceneObject::Sphere => match &pipelines.reflect {
                    Some(pipeline) => {
                        render_pass.set_pipeline(pipeline);
                        render_pass.draw_model(&self.sphere, bind_group, offset);
                    }
                    None => log::warn!("no reflection pipeline for {:?}", pipelines.format),
                },
            }
        }
    }

    fn pass_camera(&self, pass: Pass) -> &Camera {
        match pass {
            Pass::Face(face) => self.cube_map.camera(face),
            Pass::Main => self.orbit.camera(),
        }
    }

    pub fn orbit(&self) -> &LookAtCamera {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut LookAtCamera {
        &mut self.orbit
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    color: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    clear_colour: wgpu::Color,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pass_object_pair_has_a_distinct_slot() {
        let mut slots: Vec<u32> = Pass::ALL
            .iter()
            .flat_map(|pass| SceneObject::ALL.iter().map(move |o| uniform_slot(*pass, *o)))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), (PASS_COUNT * OBJECT_COUNT) as usize);
        assert!(slots.iter().all(|s| *s < PASS_COUNT * OBJECT_COUNT));
    }

    #[test]
    fn cube_passes_skip_the_sphere() {
        for face in CubeFace::ALL {
            let objects: Vec<_> = Pass::Face(face).objects().collect();
            assert_eq!(objects, vec![SceneObject::Bridge, SceneObject::Skybox]);
        }
        let main: Vec<_> = Pass::Main.objects().collect();
        assert_eq!(main, SceneObject::ALL.to_vec());
    }

    #[test]
    fn pass_indices_put_main_last() {
        let indices: Vec<u32> = Pass::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, (0..PASS_COUNT).collect::<Vec<_>>());
    }
}
