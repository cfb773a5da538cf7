use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::{Material, Model},
        uniform::MaterialUniform,
    },
    resources::texture::{load_string, load_texture_or_solid},
};

/**
 * This module contains all logic for loading meshes and textures from external files
 * and for building the procedural meshes of the scene.
 */
pub mod mesh;
pub mod texture;

/// Grey used for textures that could not be loaded.
pub const FALLBACK_COLOUR: [u8; 4] = [128, 128, 128, 255];

/// Describes how the materials of an obj model are built.
#[derive(Debug, Clone, Copy)]
pub struct ObjMaterialOptions<'a> {
    pub uniform: MaterialUniform,
    /// Used when the obj has no `.mtl` or a material names no diffuse texture.
    pub default_texture: &'a str,
    pub layout: &'a wgpu::BindGroupLayout,
}

/// Load a Wavefront obj model from `root`.
///
/// Every material binds one diffuse texture; materials without one, or models
/// without any material, use `options.default_texture`.
pub async fn load_model_obj(
    root: &Path,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    options: ObjMaterialOptions<'_>,
) -> anyhow::Result<Model> {
    let obj_text = load_string(root, file_name)
        .await
        .with_context(|| format!("loading model {file_name}"))?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let mtl_root = root.to_path_buf();
    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        move |p| {
            let mtl_root = mtl_root.clone();
            async move {
                match load_string(&mtl_root, &p).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("material library {p} not loaded: {e:#}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .with_context(|| format!("parsing model {file_name}"))?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("{file_name}: materials unavailable ({e}), using defaults");
        Vec::new()
    });

    let sampler = crate::data_structures::texture::create_default_sampler(device);
    let mut materials = Vec::new();
    for m in &obj_materials {
        let texture_name = m
            .diffuse_texture
            .as_deref()
            .unwrap_or(options.default_texture);
        let diffuse =
            load_texture_or_solid(root, texture_name, false, FALLBACK_COLOUR, device, queue).await;
        materials.push(Material::new(
            device,
            &m.name,
            options.uniform,
            &[&diffuse.view],
            &sampler,
            options.layout,
        ));
    }
    if materials.is_empty() {
        let diffuse = load_texture_or_solid(
            root,
            options.default_texture,
            false,
            FALLBACK_COLOUR,
            device,
            queue,
        )
        .await;
        materials.push(Material::new(
            device,
            file_name,
            options.uniform,
            &[&diffuse.view],
            &sampler,
            options.layout,
        ));
    }

    let meshes = models
        .iter()
        .map(|m| {
            let material = m
                .mesh
                .material_id
                .filter(|id| *id < materials.len())
                .unwrap_or(0);
            mesh::mesh_data_from_obj(&m.mesh).upload(device, &m.name, material)
        })
        .collect::<Vec<_>>();
    anyhow::ensure!(!meshes.is_empty(), "model {file_name} contains no meshes");

    log::info!(
        "loaded model {file_name}: {} meshes, {} materials",
        meshes.len(),
        materials.len()
    );
    Ok(Model { meshes, materials })
}
