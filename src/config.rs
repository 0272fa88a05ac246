//! TOML settings for building an [`OsUtils`](crate::os::OsUtils)
//!
//! ```toml
//! arch = "x86"
//! endian = "little"
//! verbosity = "debug"
//! ```

use crate::arch::{Arch, ArchType, Endian};
use crate::error::ConfigError;
use crate::os::Verbosity;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub arch: String,
    pub endian: Option<String>,
    pub verbosity: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            arch: "x8664".to_string(),
            endian: None,
            verbosity: "default".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        // Surface bad names at load time rather than on first use
        config.arch()?;
        config.verbosity()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn arch(&self) -> Result<Arch, ConfigError> {
        let kind: ArchType = self.arch.parse()?;
        match &self.endian {
            Some(name) => Ok(Arch::with_endian(kind, name.parse::<Endian>()?)),
            None => Ok(Arch::new(kind)),
        }
    }

    pub fn verbosity(&self) -> Result<Verbosity, ConfigError> {
        self.verbosity.parse()
    }
}
