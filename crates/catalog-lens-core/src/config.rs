use crate::classify::MatchMode;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: usize = 24;
pub const DEFAULT_DIFF_LIMIT: u32 = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_diff_limit")]
    pub diff_limit: u32,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            page_size: DEFAULT_PAGE_SIZE,
            diff_limit: DEFAULT_DIFF_LIMIT,
            match_mode: MatchMode::default(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_diff_limit() -> u32 {
    DEFAULT_DIFF_LIMIT
}

/// Load `Config.toml` (optional) overlaid with `CATALOG_LENS_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("CATALOG_LENS").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>().map(normalize)
}

/// Zero sizes would make pagination meaningless, fall back to defaults.
pub fn normalize(mut config: AppConfig) -> AppConfig {
    if config.page_size == 0 {
        config.page_size = DEFAULT_PAGE_SIZE;
    }
    if config.diff_limit == 0 {
        config.diff_limit = DEFAULT_DIFF_LIMIT;
    }
    config.data_dir = config.data_dir.trim().to_string();
    if config.data_dir.is_empty() {
        config.data_dir = default_data_dir();
    }
    config
}
