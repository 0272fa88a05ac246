//! One-line traces of hooked calls
//!
//! A trace looks like `strcpy(dst = 0x2000, src = "abc") = 0x2000`. At
//! debug verbosity and above the call site address is prepended, zero-padded
//! to the architecture's width.

use crate::os::{OsUtils, Verbosity};
use indexmap::IndexMap;
use log::{debug, info};
use std::fmt;

/// Names starting with this were invented for variadic arguments and are
/// left out of traces.
pub const ELLIPSIS_PREF: &str = "__qlva_";

const HOOK_PREFIX: &str = "hook_";

/// What a hooked function returned, as it should appear in a trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnValue {
    Int(u64),
    Text(String),
}

impl From<u64> for ReturnValue {
    fn from(value: u64) -> Self {
        ReturnValue::Int(value)
    }
}

impl From<&str> for ReturnValue {
    fn from(value: &str) -> Self {
        ReturnValue::Text(value.to_string())
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnValue::Int(v) => write!(f, "{:#x}", v),
            ReturnValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Give each variadic argument a synthetic `__qlva_<i>` name in `params`
pub fn update_ellipsis<V: Clone>(params: &mut IndexMap<String, V>, args: &[V]) {
    for (i, arg) in args.iter().enumerate() {
        params.insert(format!("{}{}", ELLIPSIS_PREF, i), arg.clone());
    }
}

fn assign_arg(name: &str, value: &str) -> String {
    if name.is_empty() || name.starts_with(ELLIPSIS_PREF) {
        value.to_string()
    } else {
        format!("{} = {}", name, value)
    }
}

impl<M, S, W> OsUtils<M, S, W> {
    /// Render a call trace. `args` pairs argument names with their already
    /// formatted values.
    pub fn render_call<A: AsRef<str>, B: AsRef<str>>(
        &self,
        address: u64,
        name: &str,
        args: &[(A, B)],
        ret: Option<&ReturnValue>,
        passthru: bool,
    ) -> String {
        let name = name.strip_prefix(HOOK_PREFIX).unwrap_or(name);

        let fargs = args
            .iter()
            .map(|(n, v)| assign_arg(n.as_ref(), v.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");

        let fret = ret.map(|r| format!(" = {}", r)).unwrap_or_default();
        let fpass = if passthru { " (PASSTHRU)" } else { "" };
        let faddr = if self.verbosity >= Verbosity::Debug {
            let width = (self.arch.bits() / 4 + 2) as usize;
            format!("{:#0width$x}: ", address, width = width)
        } else {
            String::new()
        };

        format!("{}{}({}){}{}", faddr, name, fargs, fret, fpass)
    }

    /// Render a call trace and send it to the log: `debug` at debug
    /// verbosity and above, `info` otherwise, nothing when disabled.
    pub fn print_function<A: AsRef<str>, B: AsRef<str>>(
        &self,
        address: u64,
        name: &str,
        args: &[(A, B)],
        ret: Option<&ReturnValue>,
        passthru: bool,
    ) -> String {
        let line = self.render_call(address, name, args, ret, passthru);

        match self.verbosity {
            Verbosity::Disabled => {}
            v if v >= Verbosity::Debug => debug!("{}", line),
            _ => info!("{}", line),
        }
        line
    }
}
