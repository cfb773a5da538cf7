//! Configuration loading from files and environment variables.

use std::{fs, path::PathBuf};

use reflect_ngin::AppConfig;
use serial_test::serial;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

/// A fresh directory under the system temp dir holding only `default.toml`.
fn temp_config_dir(name: &str, default_toml: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reflect-ngin-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("default.toml"), default_toml).unwrap();
    dir
}

#[test]
#[serial]
fn shipped_defaults_match_built_in_defaults() {
    let config = AppConfig::load_from(shipped_config_dir()).unwrap();
    let defaults = AppConfig::default();
    assert_eq!(config.window, defaults.window);
    assert_eq!(config.cube_map, defaults.cube_map);
    assert_eq!(config.lighting, defaults.lighting);
    assert_eq!(config.scene, defaults.scene);
    assert_eq!(config.assets, defaults.assets);
    assert_eq!(config.camera.position, defaults.camera.position);
    assert!((config.camera.fov_y - defaults.camera.fov_y).abs() < 1e-6);
}

#[test]
#[serial]
fn missing_directory_falls_back_to_defaults() {
    let config = AppConfig::load_from("no/such/config/dir").unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
#[serial]
fn user_file_overrides_default_file() {
    let dir = temp_config_dir("user", "[window]\ntitle = \"from default\"\nwidth = 800\n");
    fs::write(dir.join("user.toml"), "[window]\ntitle = \"from user\"\n").unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    assert_eq!(config.window.title, "from user");
    assert_eq!(config.window.width, 800);
    assert_eq!(config.window.height, 720);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
#[serial]
fn environment_overrides_files() {
    let dir = temp_config_dir("env", "[cube_map]\nsize = 128\n");
    // SAFETY: tests touching the environment run serially.
    unsafe {
        std::env::set_var("REFLECT_WINDOW__TITLE", "Test From Env");
        std::env::set_var("REFLECT_CUBE_MAP__SIZE", "512");
    }

    let config = AppConfig::load_from(&dir);

    unsafe {
        std::env::remove_var("REFLECT_WINDOW__TITLE");
        std::env::remove_var("REFLECT_CUBE_MAP__SIZE");
    }
    fs::remove_dir_all(&dir).unwrap();

    let config = config.unwrap();
    assert_eq!(config.window.title, "Test From Env");
    assert_eq!(config.cube_map.size, 512);
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    let dir = temp_config_dir("invalid", "[cube_map]\nsize = 300\n");
    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(err.to_string().contains("power of two"), "{err}");

    fs::write(dir.join("default.toml"), "[clock]\nfixed_step_hz = 0.0\n").unwrap();
    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(err.to_string().contains("fixed_step_hz"), "{err}");

    fs::write(dir.join("default.toml"), "[window]\nwidth = \"wide\"\n").unwrap();
    assert!(AppConfig::load_from(&dir).is_err());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
#[serial]
fn fixed_step_rate_must_give_a_representable_step() {
    let dir = temp_config_dir("step", "[clock]\nfixed_step_hz = 1e-35\n");
    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(err.to_string().contains("fixed_step_hz"), "{err}");

    fs::write(dir.join("default.toml"), "[clock]\nfixed_step_hz = 1e9\n").unwrap();
    assert!(AppConfig::load_from(&dir).is_err());

    fs::write(dir.join("default.toml"), "[clock]\nstats_delay = 1e30\n").unwrap();
    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(err.to_string().contains("stats_delay"), "{err}");

    fs::write(dir.join("default.toml"), "[clock]\nfixed_step_hz = 0.001\n").unwrap();
    let config = AppConfig::load_from(&dir).unwrap();
    let step = std::time::Duration::try_from_secs_f32(1.0 / config.clock.fixed_step_hz);
    assert!(step.is_ok());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
#[serial]
fn field_of_view_must_be_a_proper_angle() {
    for fov in ["0.0", "-0.5", "3.2"] {
        let dir = temp_config_dir("fov", &format!("[camera]\nfov_y = {fov}\n"));
        let err = AppConfig::load_from(&dir).unwrap_err();
        assert!(err.to_string().contains("fov_y"), "{fov}: {err}");
        fs::remove_dir_all(&dir).unwrap();
    }
    let dir = temp_config_dir("fov-ok", "[camera]\nfov_y = 1.5\n");
    assert_eq!(AppConfig::load_from(&dir).unwrap().camera.fov_y, 1.5);
    fs::remove_dir_all(&dir).unwrap();
}
