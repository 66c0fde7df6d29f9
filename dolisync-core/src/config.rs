//! Connection and bulletin settings.
//!
//! # Storage layout
//!
//! ```text
//! ~/.dolisync/
//!   config.yaml   (mode 0600, holds the API key)
//! ```
//!
//! # Resolution order
//!
//! 1. Built-in defaults.
//! 2. The YAML file, if it exists (a missing file is not an error).
//! 3. `DOLIBARR_BASE_URL`, `DOLIBARR_API_KEY`, `DOLIBARR_TIMEOUT_SECS`.
//!
//! As with the rest of the crate, every function touching the home
//! directory has an `_at(home, …)` form; tests must only use that one.

use std::env::VarError;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::CampaignDraft;

pub const ENV_BASE_URL: &str = "DOLIBARR_BASE_URL";
pub const ENV_API_KEY: &str = "DOLIBARR_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "DOLIBARR_TIMEOUT_SECS";

/// Placeholder substituted in [`BulletinConfig::label`].
pub const EMAIL_PLACEHOLDER: &str = "{email}";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub bulletin: BulletinConfig,
}

/// How to reach the Dolibarr REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// e.g. `http://localhost/api/index.php`
    pub base_url: String,
    /// Sent as the `DOLAPIKEY` header on every request.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/api/index.php".to_owned(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 4))
    }
}

/// Content of the per-contact bulletin campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletinConfig {
    /// Campaign label; `{email}` is replaced with the recipient's address.
    pub label: String,
    pub subject: String,
    pub body: String,
    pub email_from: String,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            label: "Boletín Clima para {email}".to_owned(),
            subject: "Boletín Clima".to_owned(),
            body: "Hola, este es tu boletín de clima...".to_owned(),
            email_from: "no-reply@tudominio.com".to_owned(),
        }
    }
}

impl BulletinConfig {
    pub fn draft_for(&self, email: &str) -> CampaignDraft {
        CampaignDraft {
            label: self.label.replace(EMAIL_PLACEHOLDER, email),
            subject: self.subject.clone(),
            body: self.body.clone(),
            email_from: self.email_from.clone(),
        }
    }
}

impl Config {
    /// Apply environment overrides from `vars` (usually `std::env::vars()`).
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                ENV_BASE_URL => self.api.base_url = value,
                ENV_API_KEY => self.api.api_key = value,
                ENV_TIMEOUT_SECS => {
                    self.api.timeout_secs =
                        value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                            name: ENV_TIMEOUT_SECS,
                            value: value.clone(),
                        })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply the `DOLIBARR_*` overrides from the process environment.
    ///
    /// Only those three names are read; other variables, even ones that are
    /// not valid UTF-8, are never looked at.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        let mut vars = Vec::new();
        for name in [ENV_BASE_URL, ENV_API_KEY, ENV_TIMEOUT_SECS] {
            match std::env::var(name) {
                Ok(value) => vars.push((name.to_owned(), value)),
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(raw)) => {
                    return Err(ConfigError::InvalidEnv {
                        name,
                        value: raw.to_string_lossy().into_owned(),
                    });
                }
            }
        }
        self.apply_env(vars)
    }

    /// Reject settings no remote call could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                setting: "api.base_url",
                env: ENV_BASE_URL,
            });
        }
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                setting: "api.api_key",
                env: ENV_API_KEY,
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.dolisync/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".dolisync").join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the file at `path`, or defaults if it does not exist.
///
/// No environment overrides are applied here.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `<home>/.dolisync/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically write `config` to `path`.
///
/// serialize → `.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let io = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io)?;
            set_dir_permissions(parent).map_err(io)?;
        }
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(io)?;
    set_file_permissions(&tmp).map_err(io)?;
    std::fs::rename(&tmp, path).map_err(io)?;
    Ok(())
}

/// Save to `<home>/.dolisync/config.yaml`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    save_to(&config_path_at(home), config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Home directory, via `dirs`.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
