//! Layered configuration: built-in defaults, then a TOML file, then
//! environment variables.
//!
//! Environment variables are prefixed with `RENAMARR_` and nest with `__`,
//! so `RENAMARR_LIBRARY__PAGE_SIZE=250` sets `library.page_size`.
//!
//! ```toml
//! [naming]
//! unknown_artist = "Artiste inconnu"
//! fallback_extension = "flac"
//!
//! [library]
//! database = "/var/lib/renamarr/library.db"
//! page_size = 100
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use renamarr_naming::NamingDefaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "RENAMARR_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naming: NamingConfig,
    pub library: LibraryConfig,
}

/// Placeholders and extensions used while rendering names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub unknown_artist: String,
    pub unknown_album: String,
    pub unknown_title: String,
    /// Appended when a rendered name has no extension.
    pub fallback_extension: String,
    /// Used for a sidecar file that has no extension of its own.
    pub sidecar_extension: String,
}
impl Default for NamingConfig {
    fn default() -> Self {
        let defaults = NamingDefaults::default();
        Self {
            unknown_artist: defaults.unknown_artist,
            unknown_album: defaults.unknown_album,
            unknown_title: defaults.unknown_title,
            fallback_extension: defaults.fallback_extension,
            sidecar_extension: "txt".to_string(),
        }
    }
}
impl NamingConfig {
    pub fn defaults(&self) -> NamingDefaults {
        NamingDefaults {
            unknown_artist: self.unknown_artist.clone(),
            unknown_album: self.unknown_album.clone(),
            unknown_title: self.unknown_title.clone(),
            fallback_extension: self.fallback_extension.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database holding the library.
    pub database: PathBuf,
    /// Files loaded per page when recomputing rename flags in bulk.
    pub page_size: usize,
}
impl Default for LibraryConfig {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.data_dir().join("library.db"))
            .unwrap_or_else(|| PathBuf::from("renamarr.db"));
        Self { database, page_size: 100 }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "renamarr")
}

impl Config {
    /// Loads the configuration.
    ///
    /// Without an explicit `file`, the platform configuration directory is
    /// searched for `config.toml`; it is fine for that file not to exist. An
    /// explicit `file` must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(file) if !file.exists() => exn::bail!(ErrorKind::NotFound(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE)),
        };
        debug!(file = ?file, "loading configuration");
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.library.page_size == 0 {
            exn::bail!(ErrorKind::Invalid("library.page_size must be at least 1".to_string()));
        }
        for (key, extension) in [
            ("naming.fallback_extension", &self.naming.fallback_extension),
            ("naming.sidecar_extension", &self.naming.sidecar_extension),
        ] {
            let extension = extension.trim_start_matches('.');
            if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
                exn::bail!(ErrorKind::Invalid(format!("{key} must be a short alphanumeric extension")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn from_toml(toml: &str) -> Result<Config> {
        Config::from_figment(Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)))
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.library.page_size, 100);
        assert_eq!(config.naming.sidecar_extension, "txt");
        assert_eq!(config.naming.defaults(), NamingDefaults::default());
    }

    #[test]
    fn test_partial_override() {
        let config = from_toml(
            r#"
                [naming]
                unknown_artist = "Artiste inconnu"

                [library]
                page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.naming.unknown_artist, "Artiste inconnu");
        assert_eq!(config.naming.unknown_album, "Unknown Album");
        assert_eq!(config.library.page_size, 25);
    }

    #[rstest]
    #[case("[library]\npage_size = 0")]
    #[case("[naming]\nfallback_extension = \"\"")]
    #[case("[naming]\nsidecar_extension = \"l r c\"")]
    #[case("[library]\npage_size = \"many\"")]
    fn test_invalid(#[case] toml: &str) {
        let err = from_toml(toml).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[naming]\nfallback_extension = \"flac\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.naming.fallback_extension, "flac");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/renamarr.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
