use crate::domain::config::LoggingSettings;
use crate::domain::error::{LoggingError, LoggingResult};
use crate::infrastructure::env::{
    EnvSource, DISABLE_PROGRESS_BARS_VAR, VERBOSITY_VAR,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used for project configuration
const PROJECT_DIR: &str = ".transformers-logging";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a manager looking in the user config directory and in the
    /// nearest `.transformers-logging/` directory above the current one
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
            project_config_path: Self::find_project_config_path(),
        }
    }

    /// Create a manager with explicit file locations
    pub fn with_paths(global: Option<PathBuf>, project: Option<PathBuf>) -> Self {
        Self {
            global_config_path: global,
            project_config_path: project,
        }
    }

    /// Load settings: defaults, then the global file, then the project file
    pub fn load_settings(&self) -> LoggingResult<LoggingSettings> {
        let mut settings = LoggingSettings::default();

        for path in [&self.global_config_path, &self.project_config_path]
            .into_iter()
            .flatten()
        {
            if path.exists() {
                settings.merge(self.load_settings_from_path(path)?);
            }
        }

        Ok(settings)
    }

    /// Load settings and let the environment override them
    pub fn load_with_env(&self, env: &dyn EnvSource) -> LoggingResult<LoggingSettings> {
        let mut settings = self.load_settings()?;
        apply_env_overrides(&mut settings, env);
        Ok(settings)
    }

    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("transformers-logging").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load settings from a specific file
    pub fn load_settings_from_path(&self, path: &Path) -> LoggingResult<LoggingSettings> {
        let content = fs::read_to_string(path).map_err(|e| LoggingError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| LoggingError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save settings to a specific file, creating parent directories
    pub fn save_settings_to_path(&self, path: &Path, settings: &LoggingSettings) -> LoggingResult<()> {
        let content = toml::to_string_pretty(settings)
            .map_err(|e| LoggingError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LoggingError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        fs::write(path, content).map_err(|e| LoggingError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Write a default project configuration under `dir`
    pub fn init_project_config(&self, dir: &Path) -> LoggingResult<PathBuf> {
        let config_file = dir.join(PROJECT_DIR).join(CONFIG_FILE);

        if config_file.exists() {
            return Err(LoggingError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        let settings = LoggingSettings {
            verbosity: Some("warning".to_string()),
            ..Default::default()
        };
        self.save_settings_to_path(&config_file, &settings)?;

        Ok(config_file)
    }

    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    pub fn get_global_config_path_ref(&self) -> Option<&PathBuf> {
        self.global_config_path.as_ref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variables win over file settings
pub fn apply_env_overrides(settings: &mut LoggingSettings, env: &dyn EnvSource) {
    if let Some(verbosity) = env.non_empty(VERBOSITY_VAR) {
        settings.verbosity = Some(verbosity);
    }
    if env.is_true(DISABLE_PROGRESS_BARS_VAR) {
        settings.progress_bars = Some(false);
    }
}
