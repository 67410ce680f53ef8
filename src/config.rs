use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use url::Url;

use crate::urls::DEFAULT_LOOPBACK_BASE;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "teledex";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    /// Remote store base URL, always with a trailing slash.
    pub base_url: String,
    /// Development base URL that photo links get re-based away from,
    /// always with a trailing slash.
    pub loopback_base_url: String,
    /// Override for the photo staging directory.
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    loopback_base_url: Option<String>,
    cache_dir: Option<String>,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn ensure_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `override_path`, or from the default location
/// when none is given.
pub fn load(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if !path.exists() {
        bail!(
            "configuration file not found at {}. Please create it as per docs.",
            path.display()
        );
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    parse(&raw, path)
}

fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let base_url = match cfg_file.base_url {
        Some(url) => ensure_trailing_slash(url),
        None => bail!("`base_url` must be specified in configuration"),
    };
    validate_base_url(&base_url)?;

    let loopback_base_url = ensure_trailing_slash(
        cfg_file
            .loopback_base_url
            .unwrap_or_else(|| DEFAULT_LOOPBACK_BASE.to_string()),
    );

    let cache_dir = cfg_file
        .cache_dir
        .as_ref()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| expand_tilde(Path::new(value)));

    Ok(Config {
        config_path: path,
        base_url,
        loopback_base_url,
        cache_dir,
    })
}

fn validate_base_url(base: &str) -> Result<()> {
    let url = Url::parse(base).with_context(|| format!("invalid base_url: {base}"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("base_url must be http or https, got `{other}`"),
    }
    if url.host_str().is_none() {
        bail!("base_url has no host: {base}");
    }
    Ok(())
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["base_url", "loopback_base_url", "cache_dir"]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }
}

impl Config {
    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str) -> Config {
        Config {
            config_path: PathBuf::from("config.toml"),
            base_url: ensure_trailing_slash(base_url.to_string()),
            loopback_base_url: DEFAULT_LOOPBACK_BASE.to_string(),
            cache_dir: None,
        }
    }
}
