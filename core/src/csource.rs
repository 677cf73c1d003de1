//! C source fragments carrying an encoded stream as firmware data.

use alloc::vec::Vec;
use log::{debug, warn};

const BYTES_PER_LINE: usize = 8;
const HEX_PREFIX: &[u8] = b"0x";

/// Renders as `#define` dimension constants followed by a `uint8_t` array.
#[derive(Debug, Clone, Copy)]
pub struct CSource<'a> {
    /// Name of the array, e.g. `OCXOLogo`.
    pub symbol: &'a str,
    /// Prefix of the dimension macros, e.g. `LOGO` for `LOGO_WIDTH`.
    pub prefix: &'a str,
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl core::fmt::Display for CSource<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "#define {}_WIDTH {}", self.prefix, self.width)?;
        writeln!(f, "#define {}_HEIGHT {}", self.prefix, self.height)?;
        writeln!(f, "const uint8_t {}[] = {{", self.symbol)?;
        for line in self.data.chunks(BYTES_PER_LINE) {
            f.write_str("   ")?;
            for byte in line {
                write!(f, " 0x{:02X},", byte)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "}};")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CSourceError {
    /// A `_WIDTH`/`_HEIGHT` define on this (1-based) line has no numeric value.
    InvalidDefine(usize),
    /// A hex literal at this byte offset does not fit in a byte.
    LiteralOutOfRange(usize),
}

impl core::fmt::Display for CSourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CSourceError::InvalidDefine(line) => {
                write!(f, "Invalid dimension define on line {}", line)
            }
            CSourceError::LiteralOutOfRange(offset) => {
                write!(f, "Hex literal at offset {} does not fit in a byte", offset)
            }
        }
    }
}

impl core::error::Error for CSourceError {}

type Result<T> = core::result::Result<T, CSourceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub data: Vec<u8>,
}

/// Pulls the dimension defines and the array bytes back out of a C source.
pub fn parse_c_source(source: &str) -> Result<ParsedSource> {
    let mut width = None;
    let mut height = None;
    for (index, line) in source.lines().enumerate() {
        let Some(define) = line.trim_start().strip_prefix("#define") else {
            continue;
        };
        let mut parts = define.split_whitespace();
        let (Some(name), value) = (parts.next(), parts.next()) else {
            continue;
        };
        let slot = if name.ends_with("_WIDTH") {
            &mut width
        } else if name.ends_with("_HEIGHT") {
            &mut height
        } else {
            continue;
        };
        let value = value
            .and_then(|value| value.parse::<usize>().ok())
            .ok_or(CSourceError::InvalidDefine(index + 1))?;
        *slot = Some(value);
    }
    if width.is_none() || height.is_none() {
        warn!("C source is missing its dimension defines");
    }

    let bytes = source.as_bytes();
    let body_start = memchr::memchr(b'{', bytes).map_or(0, |pos| pos + 1);
    let data = parse_hex_literals(bytes, body_start)?;
    debug!("Parsed {} bytes from C source", data.len());

    Ok(ParsedSource {
        width,
        height,
        data,
    })
}

fn parse_hex_literals(bytes: &[u8], mut offset: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(found) = memchr::memmem::find(&bytes[offset..], HEX_PREFIX) {
        let start = offset + found;
        let digits_start = start + HEX_PREFIX.len();
        let digits = bytes[digits_start..]
            .iter()
            .take_while(|byte| byte.is_ascii_hexdigit())
            .count();
        offset = digits_start + digits;
        if digits == 0 {
            continue;
        }
        if digits > 2 {
            return Err(CSourceError::LiteralOutOfRange(start));
        }
        let value = bytes[digits_start..offset]
            .iter()
            .fold(0u8, |acc, digit| (acc << 4) | hex_value(*digit));
        data.push(value);
    }
    Ok(data)
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
