use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::language::LanguageFallback;
use crate::precedence::{Precedence, PrecedenceRevision};
use crate::view::BuilderConfig;

pub const CONFIG_ENV_VAR: &str = "MUC_DIRECTORY_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Site configuration. Read once at startup and handed out by reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub listen: SocketAddr,
    pub snapshot_path: PathBuf,
    pub precedence: PrecedenceRevision,
    pub suppress_name_matching_localpart: Option<bool>,
    pub language_fallback: LanguageFallback,
    /// Prefix for room avatar images. This binary does not serve them; point it
    /// at whatever host stores the avatar blobs.
    pub avatar_base_url: String,
    pub per_page: usize,
    pub api_per_page: usize,
    pub min_users: u32,
    pub tls: Option<TlsConfig>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            listen: SocketAddr::from(([0, 0, 0, 0], 2052)),
            snapshot_path: PathBuf::from("rooms.json"),
            precedence: PrecedenceRevision::default(),
            suppress_name_matching_localpart: None,
            language_fallback: LanguageFallback::default(),
            avatar_base_url: "/avatar/v1/".to_string(),
            per_page: 25,
            api_per_page: 200,
            min_users: 1,
            tls: None,
        }
    }
}

impl DirectoryConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads from the file named by `MUC_DIRECTORY_CONFIG`, or defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("reading config from {}", Path::new(&path).display());
                Self::from_path(path)
            }
            None => {
                log::info!("{CONFIG_ENV_VAR} not set, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn builder_config(&self) -> BuilderConfig {
        let mut precedence = Precedence::for_revision(self.precedence);
        if let Some(suppress) = self.suppress_name_matching_localpart {
            precedence.suppress_name_matching_localpart = suppress;
        }
        BuilderConfig {
            precedence,
            language_fallback: self.language_fallback,
            avatar_base_url: self.avatar_base_url.clone(),
        }
    }
}
