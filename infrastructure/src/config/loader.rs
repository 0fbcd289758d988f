//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

const PROJECT_FILES: [&str; 2] = ["strix-tools.toml", ".strix-tools.toml"];

/// Variables understood by earlier deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("STRIX_SERVER_PORT", "server.port"),
    ("STRIX_TOOL_POOL_SIZE", "executor.pool_size"),
    ("STRIX_TOOL_TIMEOUT", "client.timeout_secs"),
    ("STRIX_SERVER_URL", "client.server_url"),
];

/// One place configuration may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `STRIX__SECTION__KEY`, then the legacy variables
    ///    (`STRIX_SERVER_PORT`, `STRIX_SERVER_TOKEN`, `STRIX_TOOL_POOL_SIZE`,
    ///    `STRIX_TOOL_TIMEOUT`, `CRED_TUNNEL`, `STRIX_SERVER_URL`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./strix-tools.toml` or `./.strix-tools.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/strix/tool-server.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        Self::with_env(figment).extract().map_err(Box::new)
    }

    /// Defaults plus environment, ignoring every file (for `--no-config`)
    pub fn load_defaults() -> Result<FileConfig, Box<figment::Error>> {
        let figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        Self::with_env(figment).extract().map_err(Box::new)
    }

    fn with_env(figment: Figment) -> Figment {
        let legacy = Env::raw().filter_map(|key| {
            let upper = key.as_str().to_ascii_uppercase();
            LEGACY_ENV
                .iter()
                .find(|(var, _)| *var == upper)
                .map(|(_, target)| (*target).into())
        });
        // The token is shared by both sides of the wire.
        let token = Env::raw()
            .only(&["STRIX_SERVER_TOKEN"])
            .map(|_| "server.auth_token".into());
        let client_token = Env::raw()
            .only(&["STRIX_SERVER_TOKEN"])
            .map(|_| "client.auth_token".into());
        // CRED_TUNNEL takes precedence over STRIX_SERVER_URL.
        let tunnel = Env::raw()
            .only(&["CRED_TUNNEL"])
            .map(|_| "client.server_url".into());

        figment
            .merge(legacy)
            .merge(token)
            .merge(client_token)
            .merge(tunnel)
            .merge(Env::prefixed("STRIX__").split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/strix/tool-server.toml` (or the platform
    /// equivalent).
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("strix").join("tool-server.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Config file locations in priority order, for `config` output.
    pub fn sources(config_path: Option<&PathBuf>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }
        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                location: path.display().to_string(),
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                location: PROJECT_FILES.map(|f| format!("./{}", f)).join(" or "),
                found: false,
            },
        });
        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                location: path.display().to_string(),
            });
        }
        sources.push(ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });
        sources
    }
}
