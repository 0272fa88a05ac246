//! Error types for guest memory access, format interpretation and configuration

use std::fmt;

/// Guest memory access failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Access touched a byte that no region maps. `address` is the first
    /// unmapped byte, `length` the size of the whole access.
    Unmapped { address: u64, length: usize },
    /// A new mapping would overlap an existing region
    Overlap { base: u64, size: usize },
    /// Zero-sized mappings are not allowed
    EmptyMapping { base: u64 },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::Unmapped { address, length } => {
                write!(
                    f,
                    "Invalid memory access: 0x{:08x} is unmapped (access of {} bytes)",
                    address, length
                )
            }
            MemoryError::Overlap { base, size } => {
                write!(
                    f,
                    "Mapping 0x{:08x}-0x{:08x} overlaps an existing region",
                    base,
                    base.saturating_add(*size as u64)
                )
            }
            MemoryError::EmptyMapping { base } => {
                write!(f, "Refusing to map empty region at 0x{:08x}", base)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// Failure while interpreting or emitting a format string
#[derive(Debug)]
pub enum FormatError {
    /// Memory fault while reading arguments or writing the result
    Memory(MemoryError),
    /// Conversions in the format disagree with the supplied arguments
    Arity { expected: usize, supplied: usize },
    /// Conversion character we don't know how to render
    UnsupportedConversion { conversion: char, offset: usize },
    /// Format string ends in the middle of a conversion
    IncompleteFormat,
    /// Argument kind doesn't fit the conversion (e.g. text for `%d`)
    ArgumentType { conversion: char, index: usize },
    /// `%c` value outside the valid code point range
    InvalidCharacter(u64),
    /// Field width beyond what a C `int` holds
    WidthTooBig,
    /// Precision beyond what a C `int` holds
    PrecisionTooBig,
    /// The output sink rejected the write
    Io(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Memory(e) => write!(f, "{}", e),
            FormatError::Arity { expected, supplied } => {
                if supplied > expected {
                    write!(
                        f,
                        "Not all arguments converted: format takes {} but {} supplied",
                        expected, supplied
                    )
                } else {
                    write!(
                        f,
                        "Not enough arguments for format: {} supplied, at least {} needed",
                        supplied, expected
                    )
                }
            }
            FormatError::UnsupportedConversion { conversion, offset } => {
                write!(
                    f,
                    "Unsupported format character '{}' at index {}",
                    conversion.escape_debug(),
                    offset
                )
            }
            FormatError::IncompleteFormat => write!(f, "Incomplete format"),
            FormatError::ArgumentType { conversion, index } => {
                write!(
                    f,
                    "Argument {} has the wrong type for %{}",
                    index, conversion
                )
            }
            FormatError::InvalidCharacter(value) => {
                write!(f, "%c argument 0x{:x} is not a valid character", value)
            }
            FormatError::WidthTooBig => write!(f, "Width too big"),
            FormatError::PrecisionTooBig => write!(f, "Precision too big"),
            FormatError::Io(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Memory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MemoryError> for FormatError {
    fn from(error: MemoryError) -> Self {
        FormatError::Memory(error)
    }
}

impl From<std::io::Error> for FormatError {
    fn from(error: std::io::Error) -> Self {
        FormatError::Io(error.to_string())
    }
}

/// Failure while loading a [`Config`](crate::config::Config)
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    UnknownArch(String),
    UnknownVerbosity(String),
    UnknownEndian(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Cannot read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Malformed config: {}", msg),
            ConfigError::UnknownArch(name) => write!(f, "Unknown architecture '{}'", name),
            ConfigError::UnknownVerbosity(name) => {
                write!(f, "Unknown verbosity level '{}'", name)
            }
            ConfigError::UnknownEndian(name) => write!(f, "Unknown endianness '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::Io(error.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}
