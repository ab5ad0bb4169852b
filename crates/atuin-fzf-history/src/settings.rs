use std::{
    env,
    path::{Path, PathBuf},
};

use config::{
    Config, ConfigBuilder, ConfigError, Environment, File as ConfigFile, FileFormat,
    builder::DefaultState,
};
use directories::BaseDirs;
use serde::Deserialize;

pub const CONFIG_DIR_ENV: &str = "ATUIN_FZF_CONFIG_DIR";
pub const CLIP_ENV: &str = "ATUIN_CLIP";
const ENV_PREFIX: &str = "ATUIN_FZF";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Program queried for history.
    pub atuin_path: String,
    /// Program used as the interactive selector.
    pub fzf_path: String,
    /// Cap on each history query behind the main list.
    pub search_limit: usize,
    /// Cap on each "similar commands" query in the preview.
    pub preview_limit: usize,
    /// Command that receives yanked text on stdin.
    pub clip_command: Option<String>,
    /// Value for fzf's `--height`.
    pub fzf_height: String,
}

impl Settings {
    /// Load settings from the default config location and the environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(&config_file())
    }

    /// Load settings with `path` as the (optional) config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::builder(path)?.build()?.try_deserialize()
    }

    pub fn builder(path: &Path) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Self::builder_with_clip(path, env::var(CLIP_ENV).ok())
    }

    /// Like [`Settings::builder`], with `clip` standing in for `ATUIN_CLIP`.
    pub fn builder_with_clip(
        path: &Path,
        clip: Option<String>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("atuin_path", "atuin")?
            .set_default("fzf_path", "fzf")?
            .set_default("search_limit", 1000_i64)?
            .set_default("preview_limit", 5_i64)?
            .set_default("fzf_height", "80%")?
            .add_source(
                ConfigFile::new(&path.to_string_lossy(), FileFormat::Toml).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("clip_command", clip)
    }
}

pub fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("atuin-fzf"))
        .unwrap_or_else(|| PathBuf::from(".atuin-fzf"))
}

pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
