use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dirs;

pub const DEFAULT_API_URL: &str = "https://fofa.info/api/v1/search/all";
pub const CREDENTIALS_FILE: &str = "fofa.json";
const LOCAL_CONFIG_DIR: &str = "configs";

pub struct Config {
    /// Suppresses the banner printed at start-up.
    pub no_banner: bool,
    /// 0 prints everything, 1 hides headers, 2 prints results only.
    pub quiet: u8,
    /// Upper bound for page fetches, index queries and rule downloads.
    pub request_timeout: Duration,
    /// Upper bound for a single favicon liveness probe.
    pub probe_timeout: Duration,
    /// Search endpoint of the index.
    pub api_url: String,
    /// Age after which a cached provider IP list is downloaded again.
    pub rule_ttl_days: i64,
    /// Result cap sent with every index query.
    pub result_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_banner: false,
            quiet: 0,
            request_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            api_url: DEFAULT_API_URL.to_string(),
            rule_ttl_days: 30,
            result_size: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine a configuration directory for this platform")]
    NoConfigDir,
    #[error("credentials file created at {}, fill in your email and key", path.display())]
    Created { path: PathBuf },
    #[error("email or key missing in {}", path.display())]
    MissingCredentials { path: PathBuf },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Search-index account used for every query.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    email: String,
    #[serde(default)]
    key: String,
}

impl Credentials {
    /// Builds credentials, refusing blank values.
    pub fn new(email: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let email = email.into().trim().to_string();
        let key = key.into().trim().to_string();
        if email.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self { email, key })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads credentials from `./configs/fofa.json` or the platform config
    /// directory, applying non-empty overrides on top.
    pub fn load(email: Option<String>, key: Option<String>) -> Result<Self, ConfigError> {
        let config_dir = dirs::get_config_dir()?;
        let candidates = [
            PathBuf::from(LOCAL_CONFIG_DIR).join(CREDENTIALS_FILE),
            config_dir.join(CREDENTIALS_FILE),
        ];
        load_from(&candidates, &config_dir.join(CREDENTIALS_FILE), email, key)
    }
}

/// Reads the first existing candidate file. When none exists and the
/// overrides are incomplete, an empty template is written to `bootstrap`.
pub fn load_from(
    candidates: &[PathBuf],
    bootstrap: &Path,
    email: Option<String>,
    key: Option<String>,
) -> Result<Credentials, ConfigError> {
    let email = email.filter(|v| !v.trim().is_empty());
    let key = key.filter(|v| !v.trim().is_empty());

    if let (Some(email), Some(key)) = (&email, &key) {
        debug!("Using credentials supplied on the command line or environment");
        if let Some(credentials) = Credentials::new(email.as_str(), key.as_str()) {
            return Ok(credentials);
        }
    }

    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        warn!("Config file not found: {}", bootstrap.display());
        write_template(bootstrap)?;
        return Err(ConfigError::Created {
            path: bootstrap.to_path_buf(),
        });
    };

    let data = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let file: CredentialsFile =
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

    let credentials = Credentials::new(email.unwrap_or(file.email), key.unwrap_or(file.key))
        .ok_or_else(|| ConfigError::MissingCredentials { path: path.clone() })?;

    info!("Index account config loaded: {}", credentials.email());
    Ok(credentials)
}

fn write_template(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let template = serde_json::to_vec_pretty(&CredentialsFile::default()).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, template).map_err(io_err)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
