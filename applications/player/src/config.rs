/// Player configuration
use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vibe_audio::{AnalyserConfig, EqPreset};
use vibe_insight::{ModelConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use vibe_library::{LocalConfig, RemoteConfig, DEFAULT_SLOT_PATH};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "vibe-player.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub insight: InsightSettings,

    #[serde(default)]
    pub admin: AdminSettings,

    #[serde(default)]
    pub audio: AudioSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    #[serde(default = "default_slot_path")]
    pub slot_path: PathBuf,

    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    pub api_key: Option<String>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsightSettings {
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_insight_base_url")]
    pub base_url: String,

    #[serde(default = "default_insight_timeout_secs")]
    pub timeout_secs: u64,
}

/// The static credential pair that unlocks admin commands
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioSettings {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    #[serde(default = "default_visualizer_interval_ms")]
    pub visualizer_interval_ms: u64,

    #[serde(default = "default_visualizer_width")]
    pub visualizer_width: usize,

    #[serde(default = "default_initial_preset")]
    pub initial_preset: String,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `vibe-player.toml` is read if
    /// present. Environment variables prefixed `VIBE_` override both, with
    /// `__` between section and key (`VIBE_REMOTE__BASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlayerError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("VIBE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote.enabled
            && !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            return Err(PlayerError::Config(
                "remote.base_url must be an http(s) URL when the remote is enabled \
                 (set VIBE_REMOTE__BASE_URL)"
                    .to_string(),
            ));
        }

        if self.remote.enabled && self.remote.poll_interval_ms == 0 {
            return Err(PlayerError::Config(
                "remote.poll_interval_ms must be positive".to_string(),
            ));
        }

        let fft = self.audio.fft_size;
        if !(32..=32768).contains(&fft) || !fft.is_power_of_two() {
            return Err(PlayerError::Config(format!(
                "audio.fft_size must be a power of two in 32..=32768, got {}",
                fft
            )));
        }

        if self.audio.visualizer_interval_ms == 0 {
            return Err(PlayerError::Config(
                "audio.visualizer_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn local_config(&self) -> LocalConfig {
        LocalConfig {
            slot_path: self.library.slot_path.clone(),
            seed_defaults: self.library.seed_defaults,
        }
    }

    /// Remote settings, when the remote is enabled
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        if !self.remote.enabled {
            return None;
        }
        Some(RemoteConfig {
            base_url: self.remote.base_url.clone(),
            collection: self.remote.collection.clone(),
            api_key: self.remote.api_key.clone().filter(|k| !k.is_empty()),
            poll_interval: Duration::from_millis(self.remote.poll_interval_ms),
            timeout: Duration::from_secs(self.remote.timeout_secs),
        })
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            api_key: self.insight.api_key.clone().filter(|k| !k.is_empty()),
            model: self.insight.model.clone(),
            base_url: self.insight.base_url.clone(),
            timeout: Duration::from_secs(self.insight.timeout_secs),
        }
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.audio.fft_size,
            ..AnalyserConfig::default()
        }
    }
}

// Default values
fn default_slot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SLOT_PATH)
}

fn default_true() -> bool {
    true
}

fn default_collection() -> String {
    "songs".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_remote_timeout_secs() -> u64 {
    15
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_insight_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_insight_timeout_secs() -> u64 {
    30
}

fn default_fft_size() -> usize {
    512
}

fn default_visualizer_interval_ms() -> u64 {
    100
}

fn default_visualizer_width() -> usize {
    60
}

fn default_initial_preset() -> String {
    EqPreset::Normal.name().to_string()
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            slot_path: default_slot_path(),
            seed_defaults: default_true(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            collection: default_collection(),
            api_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_insight_base_url(),
            timeout_secs: default_insight_timeout_secs(),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            visualizer_interval_ms: default_visualizer_interval_ms(),
            visualizer_width: default_visualizer_width(),
            initial_preset: default_initial_preset(),
        }
    }
}
