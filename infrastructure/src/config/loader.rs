//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "planning-poker";
const PROJECT_FILES: [&str; 2] = ["poker.toml", ".poker.toml"];
const ENV_PREFIX: &str = "POKER_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `POKER_*`, `__` separates sections (`POKER_ROUND__STORE_TIMEOUT_MS`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./poker.toml` or `./.poker.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/planning-poker/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Self::files(config_path.map(PathBuf::as_path));
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Defaults merged with every config file that exists
    fn files(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        // Explicit config path (highest priority for files)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Every place configuration may come from, highest priority first
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = vec![ConfigSource {
            label: "Environment",
            location: format!("{}*", ENV_PREFIX),
            found: true,
        }];

        if let Some(path) = config_path {
            sources.push(ConfigSource::file("Explicit", path));
        }

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource::file("Project", &path),
            None => ConfigSource {
                label: "Project",
                location: format!("./{} or ./{}", PROJECT_FILES[0], PROJECT_FILES[1]),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource::file("Global", &path));
        }

        sources.push(ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });
        sources
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");
        for source in Self::sources(config_path.map(PathBuf::as_path)) {
            println!("  {}", source);
        }
    }
}

/// One configuration source and whether it is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub location: String,
    pub found: bool,
}

impl ConfigSource {
    fn file(label: &'static str, path: &Path) -> Self {
        Self {
            label,
            location: path.display().to_string(),
            found: path.exists(),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.found { "FOUND" } else { "     " };
        write!(f, "[{}] {:<12}{}", mark, format!("{}:", self.label), self.location)
    }
}
