//! Process environment shared by every marshalling operation
//!
//! [`OsUtils`] bundles the collaborators a hooked libc call needs: guest
//! memory, the architecture descriptor, the active verbosity, a collector
//! for strings seen in guest memory and the process's stdout. The string,
//! format and trace operations are implemented on it in their own modules.

use crate::arch::Arch;
use crate::config::Config;
use crate::error::ConfigError;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::io;
use std::str::FromStr;

/// How chatty the emulator is. Ordered, so `>=` comparisons work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Disabled,
    #[default]
    Default,
    Debug,
    Disasm,
    Dump,
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "off" => Ok(Verbosity::Disabled),
            "default" => Ok(Verbosity::Default),
            "debug" => Ok(Verbosity::Debug),
            "disasm" => Ok(Verbosity::Disasm),
            "dump" => Ok(Verbosity::Dump),
            _ => Err(ConfigError::UnknownVerbosity(s.to_string())),
        }
    }
}

/// Receives every string extracted from guest memory
pub trait StatsCollector {
    fn log_string(&mut self, s: &str);
}

/// Ordered record of observed strings and how often each was seen
#[derive(Debug, Default)]
pub struct StringStats {
    strings: IndexMap<String, usize>,
}

impl StringStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct strings in first-seen order
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }

    pub fn count(&self, s: &str) -> usize {
        self.strings.get(s).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl StatsCollector for StringStats {
    fn log_string(&mut self, s: &str) {
        *self.strings.entry(s.to_string()).or_insert(0) += 1;
    }
}

impl fmt::Display for StringStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strings observed: {}", self.strings.len())?;
        for (s, hits) in &self.strings {
            writeln!(f, "  {:>4}  {:?}", hits, s)?;
        }
        Ok(())
    }
}

/// Context every string and format operation runs against
pub struct OsUtils<M = crate::memory::MappedMemory, S = StringStats, W = io::Stdout> {
    pub mem: M,
    pub arch: Arch,
    pub verbosity: Verbosity,
    pub stats: S,
    pub stdout: W,
}

impl<M, S, W> OsUtils<M, S, W> {
    pub fn new(mem: M, arch: Arch, stats: S, stdout: W) -> Self {
        OsUtils {
            mem,
            arch,
            verbosity: Verbosity::default(),
            stats,
            stdout,
        }
    }

    pub fn from_config(config: &Config, mem: M, stats: S, stdout: W) -> Result<Self, ConfigError> {
        let arch = config.arch()?;
        let verbosity = config.verbosity()?;
        debug!("OsUtils for {} at verbosity {:?}", arch, verbosity);

        let mut utils = OsUtils::new(mem, arch, stats, stdout);
        utils.verbosity = verbosity;
        Ok(utils)
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}
