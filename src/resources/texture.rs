use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::data_structures::texture::{self, Texture};

/// Resolve `file_name` below the asset `root`.
pub fn asset_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}

pub async fn load_string(root: &Path, file_name: &str) -> anyhow::Result<String> {
    let path = asset_path(root, file_name);
    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(root, file_name);
    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}

/// Load a 2D texture. `is_linear` keeps data textures such as specular maps out of sRGB.
pub async fn load_texture(
    root: &Path,
    file_name: &str,
    is_linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(root, file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, None, is_linear)
        .with_context(|| format!("decoding texture {file_name}"))
}

/// Like [`load_texture`] but substitutes a 1x1 texture of `fallback` when loading fails.
pub async fn load_texture_or_solid(
    root: &Path,
    file_name: &str,
    is_linear: bool,
    fallback: [u8; 4],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match load_texture(root, file_name, is_linear, device, queue).await {
        Ok(texture) => {
            log::info!("loaded texture {file_name}");
            texture
        }
        Err(e) => {
            log::warn!("{e:#}; using a solid {fallback:?} texture instead");
            Texture::create_solid(device, queue, fallback, file_name)
        }
    }
}

/// Read and decode the six faces `{dir}/{px,nx,py,ny,pz,nz}.{extension}`.
///
/// Each face is read and decoded on tokio's blocking pool, so this must run inside a
/// tokio runtime.
pub async fn read_cube_faces(
    root: &Path,
    dir: &str,
    extension: &str,
) -> anyhow::Result<[image::DynamicImage; 6]> {
    let tasks = Texture::CUBE_FACE_NAMES.iter().map(|name| {
        let file_name = format!("{dir}/{name}.{extension}");
        let path = asset_path(root, &file_name);
        let extension = extension.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let data =
                std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            texture::decode(&data, Some(&extension))
                .with_context(|| format!("decoding cube face {file_name}"))
        });
        async move { task.await.context("cube face task failed")? }
    });
    let faces = futures::future::try_join_all(tasks).await?;
    faces
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected six cube faces in {dir}"))
}

/// Load the six faces of [`read_cube_faces`] into a cube texture.
pub async fn load_cube_texture(
    root: &Path,
    dir: &str,
    extension: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let faces = read_cube_faces(root, dir, extension).await?;
    Texture::from_cube_faces(device, queue, &faces, dir)
}

/// Like [`load_cube_texture`] but falls back to a solid cube when any face is missing.
pub async fn load_cube_texture_or_solid(
    root: &Path,
    dir: &str,
    extension: &str,
    fallback: [u8; 4],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    match load_cube_texture(root, dir, extension, device, queue).await {
        Ok(texture) => {
            log::info!("loaded sky box from {dir}");
            Ok(texture)
        }
        Err(e) => {
            log::warn!("{e:#}; using a solid {fallback:?} sky box instead");
            Texture::create_solid_cube(device, queue, fallback, dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_are_relative_to_the_root() {
        let path = asset_path(Path::new("assets"), "textures/rustDiff.jpg");
        assert_eq!(path, Path::new("assets/textures/rustDiff.jpg"));
    }

    #[test]
    fn missing_files_name_the_path() {
        let err = futures::executor::block_on(load_binary(Path::new("does-not-exist"), "nothing.bin"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("nothing.bin"));
    }

    fn write_faces(dir: &Path, skip: Option<&str>) {
        std::fs::create_dir_all(dir).unwrap();
        for (i, name) in Texture::CUBE_FACE_NAMES.iter().enumerate() {
            if Some(*name) == skip {
                continue;
            }
            let face = image::RgbaImage::from_pixel(2, 2, image::Rgba([i as u8 * 40, 0, 0, 255]));
            face.save(dir.join(format!("{name}.png"))).unwrap();
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("reflect-ngin-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        root
    }

    #[test]
    fn cube_faces_come_back_in_layer_order() {
        let root = temp_root("cube-faces");
        write_faces(&root.join("sky"), None);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let faces = runtime.block_on(read_cube_faces(&root, "sky", "png")).unwrap();
        for (i, face) in faces.iter().enumerate() {
            assert_eq!(face.to_rgba8().get_pixel(1, 1)[0], i as u8 * 40);
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn a_missing_cube_face_is_named_in_the_error() {
        let root = temp_root("cube-missing");
        write_faces(&root.join("sky"), Some("ny"));

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let err = runtime
            .block_on(read_cube_faces(&root, "sky", "png"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("ny.png"), "{err:#}");
        std::fs::remove_dir_all(&root).unwrap();
    }
}
