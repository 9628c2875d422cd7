use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::PathBuf,
    sync::{OnceLock, RwLock},
};

/// Globally accessible application configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON question bank to load. Empty means the bundled bank.
    #[serde(default)]
    pub question_bank_path: String,
    /// Initial state of the random-order toggle.
    #[serde(default)]
    pub random_mode: bool,
    #[serde(default = "default_show_explanations_value")]
    pub show_explanations: bool,
    #[serde(default = "default_log_directory_value")]
    pub log_directory: String,
    /// Initial topic filter label. Empty means all topics.
    #[serde(default)]
    pub topic_filter: String,
    /// Initial question type label. Empty means all types.
    #[serde(default)]
    pub kind_filter: String,
}

impl AppConfig {
    fn normalize(&mut self) {
        self.question_bank_path = self.question_bank_path.trim().to_string();
        self.topic_filter = self.topic_filter.trim().to_string();
        self.kind_filter = self.kind_filter.trim().to_string();
        if self.log_directory.trim().is_empty() {
            self.log_directory = DEFAULT_LOG_DIRECTORY.to_string();
        }
    }

    pub fn question_bank_path(&self) -> Option<PathBuf> {
        if self.question_bank_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.question_bank_path))
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            question_bank_path: String::new(),
            random_mode: false,
            show_explanations: default_show_explanations_value(),
            log_directory: default_log_directory_value(),
            topic_filter: String::new(),
            kind_filter: String::new(),
        }
    }
}

const DEFAULT_LOG_DIRECTORY: &str = "output";
const CONFIG_FILE_PATH: &str = "config/app_config.toml";
const CONFIG_PATH_ENV: &str = "QUIZLINE_CONFIG";

static APP_CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn config_lock() -> &'static RwLock<AppConfig> {
    APP_CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Attempt to load configuration from disk. If loading fails, the in-memory config will be reset to defaults
/// and the error will be returned for the caller to surface if desired.
pub fn initialize() -> Result<()> {
    match load_config_from_disk() {
        Ok(config) => {
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = config;
            Ok(())
        }
        Err(err) => {
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = AppConfig::default();
            Err(err)
        }
    }
}

/// Retrieve a clone of the current configuration.
pub fn current() -> AppConfig {
    config_lock().read().expect("config lock poisoned").clone()
}

/// Convenience accessor for the configured log directory.
pub fn log_directory() -> PathBuf {
    PathBuf::from(
        &config_lock()
            .read()
            .expect("config lock poisoned")
            .log_directory,
    )
}

/// Apply the provided mutation to the in-memory configuration and persist the result to disk.
pub fn update<F>(mutator: F) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    let lock = config_lock();
    let mut config = lock.write().expect("config lock poisoned");
    mutator(&mut config);
    config.normalize();
    save_config_to_disk(&config)?;
    Ok(config.clone())
}

/// Path to the configuration file, honouring `QUIZLINE_CONFIG` when set.
pub fn config_file_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_PATH))
}

fn load_config_from_disk() -> Result<AppConfig> {
    let path = config_file_path();
    match fs::read_to_string(&path) {
        Ok(contents) => parse_config(&contents)
            .wrap_err_with(|| format!("failed to parse configuration at {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(eyre!(format!(
            "failed to read configuration at {}: {}",
            path.display(),
            err
        ))),
    }
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.normalize();
    Ok(config)
}

fn save_config_to_disk(config: &AppConfig) -> Result<()> {
    let path = config_file_path();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).wrap_err_with(|| {
            format!(
                "failed to create configuration directory {}",
                parent.display()
            )
        })?;
    }
    let serialized =
        toml::to_string_pretty(config).wrap_err("failed to serialize configuration to TOML")?;
    fs::write(&path, serialized)
        .wrap_err_with(|| format!("failed to write configuration to {}", path.display()))
}

const fn default_show_explanations_value() -> bool {
    true
}

fn default_log_directory_value() -> String {
    DEFAULT_LOG_DIRECTORY.to_string()
}
