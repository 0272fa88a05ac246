//! Null-terminated string extraction from guest memory

use crate::error::MemoryError;
use crate::memory::GuestMemory;
use crate::os::{OsUtils, StatsCollector};
use log::trace;

/// End-of-string marker; its length is also the scan stride
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Single zero byte (`char *`)
    Narrow,
    /// Two zero bytes (`wchar_t *` as UTF-16LE)
    Wide,
}

impl Terminator {
    pub fn bytes(&self) -> &'static [u8] {
        match self {
            Terminator::Narrow => b"\x00",
            Terminator::Wide => b"\x00\x00",
        }
    }

    /// Bytes per scan step
    pub fn stride(&self) -> usize {
        self.bytes().len()
    }
}

/// Character width of guest strings: 8-bit UTF-8 or 16-bit UTF-16LE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringWidth {
    #[default]
    Narrow,
    Wide,
}

impl StringWidth {
    pub fn terminator(&self) -> Terminator {
        match self {
            StringWidth::Narrow => Terminator::Narrow,
            StringWidth::Wide => Terminator::Wide,
        }
    }

    /// Encode `text` followed by a terminator of this width
    pub fn encode_terminated(&self, text: &str) -> Vec<u8> {
        match self {
            StringWidth::Narrow => {
                let mut out = Vec::with_capacity(text.len() + 1);
                out.extend_from_slice(text.as_bytes());
                out.push(0);
                out
            }
            StringWidth::Wide => text
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect(),
        }
    }

    /// Decode raw guest bytes, silently dropping anything undecodable
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            StringWidth::Narrow => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
            StringWidth::Wide => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
                char::decode_utf16(units).filter_map(Result::ok).collect()
            }
        }
    }
}

/// Scan from `address` one terminator-sized chunk at a time until a chunk
/// equals the terminator, then decode what came before it.
pub fn read_string<M: GuestMemory + ?Sized>(
    mem: &M,
    address: u64,
    terminator: Terminator,
) -> Result<String, MemoryError> {
    let stride = terminator.stride();
    let mut raw = Vec::new();
    let mut cursor = address;

    loop {
        let chunk = mem.read(cursor, stride)?;
        if chunk == terminator.bytes() {
            break;
        }
        raw.extend_from_slice(&chunk);
        cursor += stride as u64;
    }

    let width = match terminator {
        Terminator::Narrow => StringWidth::Narrow,
        Terminator::Wide => StringWidth::Wide,
    };
    let text = width.decode_lossy(&raw);
    trace!(
        "read_string 0x{:08x}: {} bytes -> {:?}",
        address,
        raw.len(),
        text
    );
    Ok(text)
}

/// Quote a string for display in a call trace.
///
/// The body is escaped like a Python `repr`: `"` stays bare, `'` is escaped
/// only when both quote kinds appear, and non-printable characters become
/// `\xNN`, `\uNNNN` or `\UNNNNNNNN`.
pub fn stringify(s: &str) -> String {
    let escape_apostrophe = s.contains('\'') && s.contains('"');

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' if escape_apostrophe => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if is_printable(c) => out.push(c),
            c => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
        }
    }
    out.push('"');
    out
}

/// Everything but control, format, separator (other than space) and
/// private-use characters
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c as u32,
        0xad
            | 0x600..=0x605
            | 0x61c
            | 0x6dd
            | 0x70f
            | 0x180e
            | 0x200b..=0x200f
            | 0x202a..=0x202e
            | 0x2060..=0x2064
            | 0x2066..=0x206f
            | 0xe000..=0xf8ff
            | 0xfeff
            | 0xfff9..=0xfffb
            | 0x110bd
            | 0x1d173..=0x1d17a
            | 0xe0001
            | 0xe0020..=0xe007f
            | 0xf0000..=0x10ffff
    )
}

impl<M: GuestMemory, S: StatsCollector, W> OsUtils<M, S, W> {
    /// Read a NUL-terminated 8-bit string
    pub fn read_cstring(&mut self, address: u64) -> Result<String, MemoryError> {
        let s = read_string(&self.mem, address, Terminator::Narrow)?;
        self.stats.log_string(&s);
        Ok(s)
    }

    /// Read a double-NUL-terminated UTF-16LE string
    pub fn read_wstring(&mut self, address: u64) -> Result<String, MemoryError> {
        let s = read_string(&self.mem, address, Terminator::Wide)?;

        // Callers compare these against host strings; stray NULs break that
        let s = s.replace('\0', "");
        self.stats.log_string(&s);
        Ok(s)
    }

    pub fn read_str(&mut self, address: u64, width: StringWidth) -> Result<String, MemoryError> {
        match width {
            StringWidth::Narrow => self.read_cstring(address),
            StringWidth::Wide => self.read_wstring(address),
        }
    }
}
