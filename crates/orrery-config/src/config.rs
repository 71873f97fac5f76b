//! Orrery settings with defaults and RON persistence.

use std::path::Path;

use orrery_render::{BloomSettings, StarfieldOptions};
use orrery_scene::{PlanetLineup, SceneOptions};
use orrery_sun::SunOptions;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    /// Voxel sun placement, shading and interaction.
    pub sun: SunOptions,
    /// One planet per section.
    pub planets: PlanetLineup,
    pub scene: SceneOptions,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Present with `Fifo`.
    pub vsync: bool,
    /// Backdrop as `#rrggbb`.
    pub clear_color: String,
    /// Direction towards the key light on the sun's columns.
    pub light_direction: [f32; 3],
    pub ambient: f32,
    pub bloom: BloomSettings,
    /// Star shell behind the scene.
    pub stars: StarfieldOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Filter directive such as `debug` or `info,orrery_sun=trace`.
    /// Empty uses the built-in default filter.
    pub log_level: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            clear_color: "#010103".to_string(),
            light_direction: [0.4, 1.0, 0.6],
            ambient: 0.35,
            bloom: BloomSettings::default(),
            stars: StarfieldOptions::default(),
        }
    }
}

impl Config {
    /// Load `config.ron` from `config_dir`, or write and return the defaults.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_planet::Variant;
    use orrery_sun::InteractionMode;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("pulse_ms: 1260"));
        assert!(ron_str.contains("\"#44ff99\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = ron::from_str("(window: (width: 800))").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.sun, SunOptions::default());
        assert_eq!(config.planets, PlanetLineup::default());
    }

    #[test]
    fn test_nested_overrides() {
        let ron_str = r##"(
            sun: (seed: Some(42), interaction: Toggle, shell: (flicker: false)),
            planets: (tech: (variant: morph, ring: false)),
            scene: (camera_fov_deg: 40.0),
            render: (bloom: (intensity: 0.8), stars: (count: 1200, fade: false)),
        )"##;
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.sun.seed, Some(42));
        assert_eq!(config.sun.interaction, InteractionMode::Toggle);
        assert!(!config.sun.shell.flicker);
        assert_eq!(config.planets.tech.variant, Variant::Morph);
        assert!(!config.planets.tech.ring);
        // Unmentioned fields of a section keep the section's own defaults.
        assert_eq!(config.planets.tech.orbit_radius, 5.0);
        assert_eq!(config.planets.profile, PlanetLineup::default().profile);
        assert_eq!(config.scene.camera_fov_deg, 40.0);
        assert_eq!(config.scene.focus_point, [-6.0, -4.0, 20.0]);
        assert_eq!(config.render.bloom.intensity, 0.8);
        assert_eq!(config.render.bloom.threshold, 0.2);
        assert_eq!(config.render.stars.count, 1200);
        assert!(!config.render.stars.fade);
        assert_eq!(config.render.stars.radius, 100.0);
        assert_eq!(config.render.clear_color, RenderConfig::default().clear_color);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.sun.seed = Some(7);
        config.planets.experience.variant = Variant::Toon;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("orrery");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());

        let mut modified = config.clone();
        modified.sun.pulse_ms = 900;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().sun.pulse_ms, 900);
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// orrery settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
