//! Application configuration
//!
//! Configuration is merged from the following sources (lowest to highest priority):
//! 1. built-in defaults
//! 2. `config/default.toml`
//! 3. `config/user.toml` (not version controlled)
//! 4. environment variables (`REFLECT_SECTION__KEY`, e.g. `REFLECT_WINDOW__WIDTH=800`)

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub cube_map: CubeMapConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

impl AppConfig {
    pub const ENV_PREFIX: &'static str = "REFLECT_";

    /// Load configuration from the `config` directory next to the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }
        // REFLECT_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::invalid("window size must be non-zero"));
        }
        if self.cube_map.size == 0 || !self.cube_map.size.is_power_of_two() {
            return Err(ConfigError::invalid("cube_map.size must be a power of two"));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(ConfigError::invalid("camera requires 0 < near < far"));
        }
        if !(self.camera.fov_y > 0.0 && self.camera.fov_y < std::f32::consts::PI) {
            return Err(ConfigError::invalid("camera.fov_y must lie in (0, pi) radians"));
        }
        let clock = &self.clock;
        if !(clock.fixed_step_hz >= ClockConfig::MIN_FIXED_STEP_HZ
            && clock.fixed_step_hz <= ClockConfig::MAX_FIXED_STEP_HZ)
        {
            return Err(ConfigError::invalid(
                "clock.fixed_step_hz must lie in [0.001, 10000]",
            ));
        }
        if !(clock.stats_delay >= 0.0 && clock.stats_delay <= ClockConfig::MAX_STATS_DELAY) {
            return Err(ConfigError::invalid(
                "clock.stats_delay must lie in [0, 86400] seconds",
            ));
        }
        if self.scene.sphere_radius <= 0.0 {
            return Err(ConfigError::invalid("scene.sphere_radius must be positive"));
        }
        if !(self.cube_map.near > 0.0 && self.cube_map.far > self.cube_map.near) {
            return Err(ConfigError::invalid("cube_map requires 0 < near < far"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "reflect-ngin".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [25.0, 2.0, -14.5],
            target: [0.0, 0.0, 0.0],
            fov_y: 0.25 * std::f32::consts::PI,
            near: 1.0,
            far: 1000.0,
            min_distance: 1.5,
            rotate_speed: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeMapConfig {
    /// Edge length of each face in texels.
    pub size: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for CubeMapConfig {
    fn default() -> Self {
        Self {
            size: 256,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Positional light, w = 1.
    pub light_vec: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_vec: [-250.0, 130.0, 145.0, 1.0],
            ambient: [0.3, 0.3, 0.3, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub clear_colour: [f64; 4],
    pub sphere_radius: f32,
    /// Latitude bands of the procedural sphere.
    pub sphere_rings: u32,
    /// Longitude slices of the procedural sphere.
    pub sphere_segments: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_colour: [1.0, 0.0, 0.0, 1.0],
            sphere_radius: 1.0,
            sphere_rings: 32,
            sphere_segments: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub bridge_model: String,
    pub bridge_texture: String,
    pub sphere_diffuse: String,
    pub sphere_specular: String,
    /// Directory holding `px`, `nx`, `py`, `ny`, `pz`, `nz` face images.
    pub skybox_dir: String,
    pub skybox_extension: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            bridge_model: "models/bridge.obj".to_string(),
            bridge_texture: "textures/brick_DIFFUSE.jpg".to_string(),
            sphere_diffuse: "textures/rustDiff.jpg".to_string(),
            sphere_specular: "textures/rustSpec.jpg".to_string(),
            skybox_dir: "textures/skybox".to_string(),
            skybox_extension: "jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Seconds to wait before frame statistics are recorded.
    pub stats_delay: f32,
    /// Rate of the fixed-step accumulator in Hz.
    pub fixed_step_hz: f32,
}

impl ClockConfig {
    pub const MIN_FIXED_STEP_HZ: f32 = 0.001;
    pub const MAX_FIXED_STEP_HZ: f32 = 10_000.0;
    pub const MAX_STATS_DELAY: f32 = 86_400.0;
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            stats_delay: 3.0,
            fixed_step_hz: 60.0,
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn invalid(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_scene() {
        let config = AppConfig::default();
        assert_eq!(config.cube_map.size, 256);
        assert_eq!(config.camera.position, [25.0, 2.0, -14.5]);
        assert_eq!(config.lighting.light_vec, [-250.0, 130.0, 145.0, 1.0]);
        assert_eq!(config.scene.clear_colour, [1.0, 0.0, 0.0, 1.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_cube_maps() {
        let mut config = AppConfig::default();
        config.cube_map.size = 300;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("power of two"));
    }

    #[test]
    fn rejects_inverted_depth_range() {
        let mut config = AppConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(config.validate().is_err());
    }
}
