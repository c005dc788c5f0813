//! Startup configuration
//!
//! Read from the process environment (optionally seeded from a `.env`
//! file). Missing store credentials are fatal; everything else has a
//! default.
use std::path::PathBuf;

use thiserror::Error;

use crate::apod::client::APOD_ENDPOINT;

/// Public demo key accepted by api.nasa.gov (heavily rate limited)
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "apod_gallery=info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown GALLERY_STORE '{0}' (expected 'sqlite' or 'firestore')")]
    UnknownBackend(String),

    #[error("missing store credential {0}")]
    MissingStoreCredential(&'static str),

    #[error("could not determine a data directory for the gallery database; set GALLERY_DB_PATH")]
    NoDataDir,
}

/// Raw environment snapshot
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub apod_api_key: Option<String>,
    pub apod_endpoint: Option<String>,
    pub store: Option<String>,
    pub db_path: Option<PathBuf>,
    pub firestore_project_id: Option<String>,
    pub firestore_api_key: Option<String>,
    pub log_filter: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            apod_api_key: non_empty_var("APOD_API_KEY"),
            apod_endpoint: non_empty_var("APOD_ENDPOINT"),
            store: non_empty_var("GALLERY_STORE"),
            db_path: non_empty_var("GALLERY_DB_PATH").map(PathBuf::from),
            firestore_project_id: non_empty_var("FIRESTORE_PROJECT_ID"),
            firestore_api_key: non_empty_var("FIRESTORE_API_KEY"),
            log_filter: non_empty_var("GALLERY_LOG"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Where saved images are kept
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
    Firestore { project_id: String, api_key: String },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Sqlite { path } => f.debug_struct("Sqlite").field("path", path).finish(),
            StoreConfig::Firestore { project_id, .. } => f
                .debug_struct("Firestore")
                .field("project_id", project_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolved configuration
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub apod_api_key: String,
    pub apod_endpoint: String,
    pub store: StoreConfig,
    pub log_filter: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("apod_endpoint", &self.apod_endpoint)
            .field("store", &self.store)
            .field("log_filter", &self.log_filter)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load `.env` (if present) and resolve the environment
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal
        let _ = dotenvy::dotenv();
        Self::resolve(EnvConfig::gather(), default_db_path())
    }

    /// Resolve a snapshot; `default_db_path` is used when none is configured
    pub fn resolve(env: EnvConfig, default_db_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let store = match env.store.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("sqlite") => StoreConfig::Sqlite {
                path: env.db_path.or(default_db_path).ok_or(ConfigError::NoDataDir)?,
            },
            Some("firestore") => StoreConfig::Firestore {
                project_id: env
                    .firestore_project_id
                    .ok_or(ConfigError::MissingStoreCredential("FIRESTORE_PROJECT_ID"))?,
                api_key: env
                    .firestore_api_key
                    .ok_or(ConfigError::MissingStoreCredential("FIRESTORE_API_KEY"))?,
            },
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            apod_api_key: env.apod_api_key.unwrap_or_else(|| DEMO_API_KEY.to_string()),
            apod_endpoint: env.apod_endpoint.unwrap_or_else(|| APOD_ENDPOINT.to_string()),
            store,
            log_filter: env.log_filter.unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

/// Default database location in the user's data directory
fn default_db_path() -> Option<PathBuf> {
    let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
    path.push("apod-gallery");
    path.push("gallery.db");
    Some(path)
}
