//! printf-style format string parsing and substitution
//!
//! This is the pure half of the formatter: it knows nothing about guest
//! memory. By the time arguments get here every `%s` slot that pointed into
//! the guest has already been swapped for its text (see `printf.rs`).
//!
//! Grammar of a conversion:
//!
//! ```text
//! % [flags: - + space # 0]* [width: digits | *] [. precision: digits | *]
//!   [length: hh h l ll L q j z t] conversion
//! ```
//!
//! Length modifiers are accepted and ignored; every integer argument is a
//! raw pointer-sized value and is rendered unsigned.

use crate::error::FormatError;
use log::trace;
use std::fmt;

/// One argument slot, either a raw machine word or text resolved from a pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatArg {
    Int(u64),
    Str(String),
}

impl From<u64> for FormatArg {
    fn from(value: u64) -> Self {
        FormatArg::Int(value)
    }
}

impl From<&str> for FormatArg {
    fn from(value: &str) -> Self {
        FormatArg::Str(value.to_string())
    }
}

impl From<String> for FormatArg {
    fn from(value: String) -> Self {
        FormatArg::Str(value)
    }
}

impl fmt::Display for FormatArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Int(v) => write!(f, "{:#x}", v),
            FormatArg::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub left: bool,
    pub plus: bool,
    pub space: bool,
    pub alt: bool,
    pub zero: bool,
}

/// Width or precision of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    None,
    Fixed(usize),
    /// `*`: taken from the next argument
    FromArg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    pub flags: Flags,
    pub width: Count,
    pub precision: Count,
    pub conversion: char,
    /// Byte offset of the conversion character in the format string
    pub offset: usize,
}

impl Spec {
    /// Number of argument slots this conversion consumes
    pub fn arity(&self) -> usize {
        let mut n = 0;
        if self.width == Count::FromArg {
            n += 1;
        }
        if self.precision == Count::FromArg {
            n += 1;
        }
        if self.conversion != '%' {
            n += 1;
        }
        n
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Spec(Spec),
}

const CONVERSIONS: &str = "diuoxXcseEfFgG%";

/// Widths and precisions are C `int`s
const MAX_COUNT: usize = i32::MAX as usize;
const LENGTH_MODIFIERS: &str = "hlLqjzt";

/// Split a format string into literal runs and conversion specs
pub fn parse_format(format: &str) -> Result<Vec<Segment<'_>>, FormatError> {
    let mut segments = Vec::new();
    let mut chars = format.char_indices().peekable();
    let mut literal_start = 0;

    while let Some((start, c)) = chars.next() {
        if c != '%' {
            continue;
        }
        if start > literal_start {
            segments.push(Segment::Literal(&format[literal_start..start]));
        }

        let mut flags = Flags::default();
        while let Some(&(_, c)) = chars.peek() {
            match c {
                '-' => flags.left = true,
                '+' => flags.plus = true,
                ' ' => flags.space = true,
                '#' => flags.alt = true,
                '0' => flags.zero = true,
                _ => break,
            }
            chars.next();
        }

        let width = parse_count(&mut chars, FormatError::WidthTooBig)?;

        let precision = match chars.peek() {
            Some(&(_, '.')) => {
                chars.next();
                match parse_count(&mut chars, FormatError::PrecisionTooBig)? {
                    Count::None => Count::Fixed(0),
                    count => count,
                }
            }
            _ => Count::None,
        };

        while let Some(&(_, c)) = chars.peek() {
            if !LENGTH_MODIFIERS.contains(c) {
                break;
            }
            chars.next();
        }

        let (offset, conversion) = chars.next().ok_or(FormatError::IncompleteFormat)?;
        if !CONVERSIONS.contains(conversion) {
            return Err(FormatError::UnsupportedConversion { conversion, offset });
        }

        segments.push(Segment::Spec(Spec {
            flags,
            width,
            precision,
            conversion,
            offset,
        }));
        literal_start = offset + conversion.len_utf8();
    }

    if literal_start < format.len() {
        segments.push(Segment::Literal(&format[literal_start..]));
    }
    Ok(segments)
}

fn parse_count(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    too_big: FormatError,
) -> Result<Count, FormatError> {
    if let Some(&(_, '*')) = chars.peek() {
        chars.next();
        return Ok(Count::FromArg);
    }

    let mut value: Option<usize> = None;
    while let Some(&(_, c)) = chars.peek() {
        match c.to_digit(10) {
            Some(d) => {
                let next = value
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d as usize))
                    .filter(|&v| v <= MAX_COUNT);
                match next {
                    Some(v) => value = Some(v),
                    None => return Err(too_big),
                }
                chars.next();
            }
            None => break,
        }
    }
    Ok(value.map_or(Count::None, Count::Fixed))
}

/// Read a `*` argument as a C `int`.
///
/// A sign-extended word is taken as is. A word with the upper half clear is
/// a 32-bit guest's `int`, so its low half carries the sign. Anything else
/// can't be an `int`.
fn star_count(word: u64) -> Option<i64> {
    let signed = word as i64;
    if (i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(&signed) {
        Some(signed)
    } else if word <= u64::from(u32::MAX) {
        Some(i64::from(word as u32 as i32))
    } else {
        None
    }
}

/// Number of argument slots a parsed format consumes
pub fn arity(segments: &[Segment<'_>]) -> usize {
    segments
        .iter()
        .map(|seg| match seg {
            Segment::Spec(spec) => spec.arity(),
            Segment::Literal(_) => 0,
        })
        .sum()
}

/// Apply `args` positionally to `format`.
///
/// Every argument must be consumed and every conversion must have an
/// argument; either mismatch is [`FormatError::Arity`].
pub fn substitute(format: &str, args: &[FormatArg]) -> Result<String, FormatError> {
    let segments = parse_format(format)?;
    let expected = arity(&segments);
    if expected != args.len() {
        return Err(FormatError::Arity {
            expected,
            supplied: args.len(),
        });
    }

    let mut out = String::with_capacity(format.len() + 16 * args.len());
    let mut next = 0;

    for seg in &segments {
        let spec = match seg {
            Segment::Literal(lit) => {
                out.push_str(lit);
                continue;
            }
            Segment::Spec(spec) => spec,
        };

        let mut flags = spec.flags;
        let width = match spec.width {
            Count::None => None,
            Count::Fixed(w) => Some(w),
            Count::FromArg => {
                let w = take_int(args, &mut next, '*')?;
                let signed = star_count(w).ok_or(FormatError::WidthTooBig)?;
                // A negative `*` width means left-justify
                if signed < 0 {
                    flags.left = true;
                }
                let w = signed.unsigned_abs() as usize;
                if w > MAX_COUNT {
                    return Err(FormatError::WidthTooBig);
                }
                Some(w)
            }
        };
        let precision = match spec.precision {
            Count::None => None,
            Count::Fixed(p) => Some(p),
            Count::FromArg => {
                let p = take_int(args, &mut next, '*')?;
                let p = star_count(p).ok_or(FormatError::PrecisionTooBig)?;
                if p < 0 {
                    None
                } else {
                    Some(p as usize)
                }
            }
        };

        let rendered = match spec.conversion {
            '%' => "%".to_string(),
            'd' | 'i' | 'u' => {
                let v = take_int(args, &mut next, spec.conversion)?;
                render_integer(v.to_string(), "", precision, width, &flags)
            }
            'o' => {
                let v = take_int(args, &mut next, spec.conversion)?;
                let prefix = if flags.alt { "0o" } else { "" };
                render_integer(format!("{:o}", v), prefix, precision, width, &flags)
            }
            'x' => {
                let v = take_int(args, &mut next, spec.conversion)?;
                let prefix = if flags.alt { "0x" } else { "" };
                render_integer(format!("{:x}", v), prefix, precision, width, &flags)
            }
            'X' => {
                let v = take_int(args, &mut next, spec.conversion)?;
                let prefix = if flags.alt { "0X" } else { "" };
                render_integer(format!("{:X}", v), prefix, precision, width, &flags)
            }
            'c' => {
                let index = next;
                let ch = match take(args, &mut next)? {
                    FormatArg::Int(v) => u32::try_from(*v)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or(FormatError::InvalidCharacter(*v))?,
                    FormatArg::Str(s) => {
                        let mut it = s.chars();
                        match (it.next(), it.next()) {
                            (Some(c), None) => c,
                            _ => {
                                return Err(FormatError::ArgumentType {
                                    conversion: 'c',
                                    index,
                                })
                            }
                        }
                    }
                };
                pad(ch.to_string(), width, flags.left)
            }
            's' => {
                let text = match take(args, &mut next)? {
                    FormatArg::Int(v) => v.to_string(),
                    FormatArg::Str(s) => s.clone(),
                };
                let text = match precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                pad(text, width, flags.left)
            }
            'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
                let v = take_int(args, &mut next, spec.conversion)? as f64;
                let body = render_float(v, spec.conversion, precision.unwrap_or(6), flags.alt);
                render_number(&sign(&flags), &body, width, &flags)
            }
            other => {
                return Err(FormatError::UnsupportedConversion {
                    conversion: other,
                    offset: spec.offset,
                })
            }
        };
        out.push_str(&rendered);
    }

    trace!("substitute {:?} with {} args -> {:?}", format, args.len(), out);
    Ok(out)
}

fn take<'a>(args: &'a [FormatArg], next: &mut usize) -> Result<&'a FormatArg, FormatError> {
    let arg = args.get(*next).ok_or(FormatError::Arity {
        expected: *next + 1,
        supplied: args.len(),
    })?;
    *next += 1;
    Ok(arg)
}

fn take_int(args: &[FormatArg], next: &mut usize, conversion: char) -> Result<u64, FormatError> {
    let index = *next;
    match take(args, next)? {
        FormatArg::Int(v) => Ok(*v),
        FormatArg::Str(_) => Err(FormatError::ArgumentType { conversion, index }),
    }
}

fn sign(flags: &Flags) -> String {
    if flags.plus {
        "+".to_string()
    } else if flags.space {
        " ".to_string()
    } else {
        String::new()
    }
}

fn render_integer(
    digits: String,
    prefix: &str,
    precision: Option<usize>,
    width: Option<usize>,
    flags: &Flags,
) -> String {
    let digits = match precision {
        Some(p) if p > digits.len() => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    };
    let lead = format!("{}{}", sign(flags), prefix);
    render_number(&lead, &digits, width, flags)
}

/// Lay out `lead` (sign and radix prefix) and `body` in `width` columns.
/// Zero padding goes between the two; space padding goes outside.
fn render_number(lead: &str, body: &str, width: Option<usize>, flags: &Flags) -> String {
    let len = lead.chars().count() + body.chars().count();
    let fill = width.unwrap_or(0).saturating_sub(len);

    if flags.left {
        format!("{}{}{}", lead, body, " ".repeat(fill))
    } else if flags.zero {
        format!("{}{}{}", lead, "0".repeat(fill), body)
    } else {
        format!("{}{}{}", " ".repeat(fill), lead, body)
    }
}

fn pad(text: String, width: Option<usize>, left: bool) -> String {
    let fill = width.unwrap_or(0).saturating_sub(text.chars().count());
    if fill == 0 {
        text
    } else if left {
        format!("{}{}", text, " ".repeat(fill))
    } else {
        format!("{}{}", " ".repeat(fill), text)
    }
}

fn render_float(v: f64, conversion: char, precision: usize, alt: bool) -> String {
    let upper = conversion.is_ascii_uppercase();
    let body = match conversion.to_ascii_lowercase() {
        'f' => {
            let mut s = format!("{:.*}", precision, v);
            if alt && precision == 0 {
                s.push('.');
            }
            s
        }
        'e' => render_exponent(v, precision, alt),
        _ => render_general(v, precision, alt),
    };
    if upper {
        body.to_ascii_uppercase()
    } else {
        body
    }
}

/// `d.ddde+XX` with at least two exponent digits
fn render_exponent(v: f64, precision: usize, alt: bool) -> String {
    let (mantissa, exp) = split_exponent(v, precision);
    let dot = if alt && precision == 0 { "." } else { "" };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}e{}{:02}", mantissa, dot, exp_sign, exp.unsigned_abs())
}

fn split_exponent(v: f64, precision: usize) -> (String, i32) {
    let s = format!("{:.*e}", precision, v);
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

/// `%g`: fixed or exponent form depending on magnitude, trailing zeros trimmed
fn render_general(v: f64, precision: usize, alt: bool) -> String {
    let p = precision.max(1);
    let exp = if v == 0.0 {
        0
    } else {
        split_exponent(v, p - 1).1
    };

    if exp >= -4 && (exp as i64) < p as i64 {
        let decimals = (p as i64 - 1 - exp as i64) as usize;
        let s = format!("{:.*}", decimals, v);
        if alt {
            s
        } else {
            trim_fraction(&s).to_string()
        }
    } else {
        let s = render_exponent(v, p - 1, alt);
        if alt {
            return s;
        }
        match s.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_fraction(mantissa), exp),
            None => s,
        }
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
