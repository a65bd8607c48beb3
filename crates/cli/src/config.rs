//! TOML configuration for the courier binary.
//!
//! Every field has a default, so a missing config file just means "all
//! defaults" and the token comes from the environment instead.

use std::path::{Path, PathBuf};

use {anyhow::Context, serde::Deserialize};

use courier_telegram::TelegramConfig;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    /// Directory holding the SQLite database. Platform data dir when unset.
    pub data_dir: Option<PathBuf>,
}

/// Load the config from `path`, or from the platform config dir when no
/// path is given. A missing file yields the defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let resolved = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    if !resolved.exists() {
        tracing::debug!(path = %resolved.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(&resolved)
        .with_context(|| format!("reading config file {}", resolved.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", resolved.display()))
}

fn project_dirs() -> anyhow::Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "courier")
        .context("could not determine a home directory")
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("courier.toml"))
}

pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::io::Write};

    use super::*;

    #[test]
    fn loads_token_and_data_dir() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_dir = \"/var/lib/courier\"\n\n[telegram]\ntoken = \"123:ABC\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/var/lib/courier")));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let config = load(Some(file.path())).unwrap();
        assert!(config.telegram.token.expose_secret().is_empty());
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert!(config.telegram.token.expose_secret().is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "telegram = 5").unwrap();

        assert!(load(Some(file.path())).is_err());
    }
}
