use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "twback/config.json";

static CONFIG: OnceCell<Arc<RwLock<Config>>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    /// Page budget used by the post stream when the caller gives none.
    pub pages: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://twitter.com".into(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/603.3.8 \
                         (KHTML, like Gecko) Version/10.1.2 Safari/603.3.8"
                .into(),
            accept_language: "en-US".into(),
            pages: 25,
        }
    }
}

/// Explicit initialization, meant to be called once at the start of `main`.
///
/// An explicit `path` must exist and parse. Without one, the well-known
/// locations are searched and the defaults are used when none exists.
/// Nothing is ever written to disk.
pub fn init(path: Option<PathBuf>) -> Result<()> {
    let config_source = path
        .as_deref()
        .map_or_else(|| "config search".to_string(), |p| p.display().to_string());
    let config = match path {
        Some(path) => load_from(&path)?,
        None => load_from_files()?.unwrap_or_default(),
    };
    if CONFIG.set(Arc::new(RwLock::new(config))).is_err() {
        debug!("config already initialized, ignoring {config_source}");
    }
    Ok(())
}

/// Returns the shared configuration, falling back to defaults when `init`
/// was never called or the config files cannot be read.
pub fn get_config() -> Arc<RwLock<Config>> {
    CONFIG
        .get_or_init(|| {
            let config = load_from_files().ok().flatten().unwrap_or_default();
            Arc::new(RwLock::new(config))
        })
        .clone()
}

/// A copy of the shared configuration as it is now.
pub fn snapshot() -> Result<Config> {
    Ok(get_config().read()?.clone())
}

pub fn load_from(path: &Path) -> Result<Config> {
    debug!("loading config from {}", path.display());
    let content = fs::read_to_string(path)?;
    Ok(from_str(&content)?)
}

fn load_from_files() -> Result<Option<Config>> {
    find_config_file()?
        .map(|path| load_from(&path))
        .transpose()
}

fn find_config_file() -> Result<Option<PathBuf>> {
    let exe_path = std::env::current_exe()?;
    let exe_dir = exe_path
        .parent()
        .ok_or_else(|| Error::Other(format!("{} has no parent", exe_path.display())))?;

    let paths = [
        dirs::config_local_dir().unwrap_or_default().join(CONFIG_FILE),
        dirs::config_dir().unwrap_or_default().join(CONFIG_FILE),
        exe_dir.join(CONFIG_FILE),
    ];

    Ok(paths.into_iter().find(|p| p.exists()))
}

#[cfg(test)]
mod local_tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "base_url": "http://127.0.0.1:8080", "pages": 2 }}"#).unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.pages, 2);
        assert_eq!(config.accept_language, "en-US");
        assert_eq!(config.user_agent, Config::default().user_agent);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn second_init_keeps_first_config() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, r#"{{ "pages": 7 }}"#).unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, r#"{{ "pages": 9 }}"#).unwrap();

        init(Some(first.path().to_path_buf())).unwrap();
        init(Some(second.path().to_path_buf())).unwrap();
        assert_eq!(snapshot().unwrap().pages, 7);
    }

    #[test]
    fn garbage_file_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "pages = 3").unwrap();
        assert!(matches!(load_from(file.path()), Err(Error::SerdeJson(_))));
    }
}
