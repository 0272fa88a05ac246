//! Guest-side string marshalling and printf emulation for hooked libc calls.
//!
//! An emulator that intercepts `printf`, `sprintf`, `wsprintfW` and friends
//! needs to read strings out of the guest's address space, pull variadic
//! arguments off a guest `va_list`, render the format the way the guest
//! expects and put the result back (into guest memory or onto stdout).
//! [`OsUtils`] carries the collaborators for all of that; the operations
//! live in the modules below.

pub mod arch;
pub mod config;
pub mod error;
pub mod format;
pub mod guid;
pub mod memory;
pub mod os;
pub mod printf;
pub mod strings;
pub mod trace;
pub mod va;

#[cfg(test)]
mod test_utils;

pub use arch::{Arch, ArchType, Endian};
pub use config::Config;
pub use error::{ConfigError, FormatError, MemoryError};
pub use format::FormatArg;
pub use guid::Guid;
pub use memory::{GuestMemory, MappedMemory};
pub use os::{OsUtils, StatsCollector, StringStats, Verbosity};
pub use strings::{read_string, stringify, StringWidth, Terminator};
pub use trace::{update_ellipsis, ReturnValue, ELLIPSIS_PREF};
