//! Demo settings loaded from `ripple.toml`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ripple_engine::device::GpuInit;
use ripple_engine::logging::LoggingConfig;
use ripple_engine::post::PostEffectConfig;
use ripple_engine::wave::{DisturbanceConfig, WaveParams};
use ripple_engine::window::RuntimeConfig;

const CONFIG_FILE: &str = "ripple.toml";

/// Overrides the config file location.
const CONFIG_ENV: &str = "RIPPLE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowSettings,
    pub gpu: GpuSettings,
    pub log: LogSettings,
    pub camera: CameraSettings,
    pub wave: WaveParams,
    pub ripples: DisturbanceConfig,
    pub post: PostEffectConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub pause_on_focus_loss: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "ripple waves".to_string(),
            width: 1280.0,
            height: 720.0,
            pause_on_focus_loss: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuSettings {
    pub vsync: bool,
    /// Longest acceptable fence wait before the device is considered hung.
    pub fence_timeout_ms: u64,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            fence_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `env_logger` filter; `RUST_LOG` applies when unset.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Radians per second while an arrow key is held.
    pub orbit_speed: f32,
    /// Magnitude of the impulse injected with Space.
    pub disturb_magnitude: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            orbit_speed: 1.2,
            disturb_magnitude: 3.0,
        }
    }
}

/// Where a loaded config came from. Loading runs before the logger exists,
/// so callers report this afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults { missing: PathBuf },
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "config from {}", path.display()),
            ConfigSource::Defaults { missing } => {
                write!(f, "default config (no {})", missing.display())
            }
        }
    }
}

impl DemoConfig {
    /// Reads `$RIPPLE_CONFIG`, or `ripple.toml` in the working directory.
    ///
    /// A missing default file yields defaults. A path named by the environment
    /// must exist. A malformed or invalid file is an error either way.
    pub fn load() -> Result<(Self, ConfigSource)> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                Ok((Self::load_from(&path)?, ConfigSource::File(path)))
            }
            None => Self::load_optional(CONFIG_FILE),
        }
    }

    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        if !path.exists() {
            let missing = path.to_path_buf();
            return Ok((Self::default(), ConfigSource::Defaults { missing }));
        }
        Ok((Self::load_from(path)?, ConfigSource::File(path.to_path_buf())))
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Parses and validates; grid and ripple settings are checked here so a
    /// bad file fails before any window or device exists.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.wave.validate().context("invalid [wave] settings")?;
        self.ripples.validate().context("invalid [ripples] settings")?;
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.clone(),
            initial_size: winit::dpi::LogicalSize::new(self.window.width, self.window.height),
            pause_on_focus_loss: self.window.pause_on_focus_loss,
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            present_mode: if self.gpu.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            fence_timeout: Duration::from_millis(self.gpu.fence_timeout_ms),
            ..GpuInit::default()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.filter.clone(),
            ..LoggingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(DemoConfig::parse("").unwrap(), DemoConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DemoConfig::parse(
            r#"
            [wave]
            rows = 128
            cols = 64

            [ripples]
            interval = 0.5
            seed = 42

            [post]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.wave.rows, 128);
        assert_eq!(config.wave.cols, 64);
        assert_eq!(config.wave.dt, WaveParams::default().dt);
        assert_eq!(config.ripples.interval, 0.5);
        assert_eq!(config.ripples.seed, Some(42));
        assert_eq!(config.ripples.margin, 4);
        assert!(!config.post.enabled);
        assert_eq!(config.window, WindowSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(DemoConfig::parse("[wave]\nrows = \"many\"").is_err());
        assert!(DemoConfig::parse("not toml at all ===").is_err());
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let (config, source) = DemoConfig::load_optional("/nonexistent/ripple/ripple.toml").unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(
            source,
            ConfigSource::Defaults {
                missing: PathBuf::from("/nonexistent/ripple/ripple.toml")
            }
        );
        assert!(source.to_string().contains("ripple.toml"));
    }

    #[test]
    fn empty_grid_is_rejected_at_parse() {
        let err = DemoConfig::parse("[wave]\nrows = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("[wave]"), "{err:#}");
    }

    #[test]
    fn untileable_or_unstable_grid_is_rejected_at_parse() {
        assert!(DemoConfig::parse("[wave]\nrows = 100\n").is_err());
        assert!(DemoConfig::parse("[wave]\nspeed = 50.0\n").is_err());
    }

    #[test]
    fn bad_ripple_settings_are_rejected_at_parse() {
        let err = DemoConfig::parse("[ripples]\ninterval = 0.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("[ripples]"), "{err:#}");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(DemoConfig::load_from("/nonexistent/ripple/ripple.toml").is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = DemoConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("fence_timeout_ms"));
        assert_eq!(DemoConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn gpu_settings_map_to_init() {
        let mut config = DemoConfig::default();
        config.gpu.vsync = false;
        config.gpu.fence_timeout_ms = 250;
        let init = config.gpu_init();
        assert_eq!(init.present_mode, wgpu::PresentMode::AutoNoVsync);
        assert_eq!(init.fence_timeout, Duration::from_millis(250));
    }
}
