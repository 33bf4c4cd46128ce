//! Config for uacdesc binary
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::catalog::DescriptorContext;
use crate::colour;
use crate::error::{Error, ErrorKind, Result};

const CONF_DIR: &str = "uacdesc";
const CONF_NAME: &str = "uacdesc.json";

/// Defaults for the `decode` command and the dump colours
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Context used when `--context` is not given
    pub context: Option<DescriptorContext>,
    /// Output JSON rather than an lsusb style dump
    pub json: bool,
    /// Disable coloured output
    pub no_color: bool,
    /// Yield unknown descriptors as generic rather than reporting them as errors
    pub passthrough: bool,
    /// User supplied [`colour::ColourTheme`] - overrides default
    pub colours: colour::ColourTheme,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            context: None,
            json: false,
            no_color: false,
            passthrough: true,
            colours: colour::ColourTheme::default(),
        }
    }
}

impl Config {
    /// Default new
    pub fn new() -> Config {
        Config {
            ..Default::default()
        }
    }

    /// Attempt to read from .json format config at `file_path`
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Config> {
        let f = File::open(file_path.as_ref()).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                &format!("Failed to open {}: {}", file_path.as_ref().display(), e),
            )
        })?;
        let mut br = BufReader::new(f);
        let mut data = String::new();

        br.read_to_string(&mut data)?;
        serde_json::from_str::<Config>(&data).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!("Failed to parse {}: {}", file_path.as_ref().display(), e),
            )
        })
    }

    /// Path of the per-user config: `$XDG_CONFIG_HOME/uacdesc/uacdesc.json` or platform equivalent
    pub fn sys_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONF_DIR).join(CONF_NAME))
    }

    /// Load the per-user config if it exists, default otherwise
    pub fn sys() -> Result<Config> {
        match Self::sys_path() {
            Some(p) if p.exists() => {
                log::info!("Loading config from {}", p.display());
                Config::from_file(p)
            }
            _ => {
                log::debug!("No user config, using default");
                Ok(Config::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let c: Config = serde_json::from_str(r#"{"context": "ac", "json": true}"#).unwrap();
        assert_eq!(c.context, Some(DescriptorContext::AudioControl));
        assert!(c.json);
        assert!(c.passthrough);
        assert_eq!(c.colours, colour::ColourTheme::default());
    }

    #[test]
    fn test_deny_unknown() {
        assert!(serde_json::from_str::<Config>(r#"{"icons": {}}"#).is_err());
    }

    #[test]
    fn test_serialize_skips_none() {
        let s = serde_json::to_string(&Config::new()).unwrap();
        assert!(!s.contains("context"));
        assert!(s.contains("no-color"));
    }

    #[test]
    fn test_from_missing_file() {
        assert_eq!(
            Config::from_file("/nonexistent/uacdesc.json").unwrap_err().kind(),
            ErrorKind::Io
        );
    }
}
