//! Layout descriptor parsing.
//!
//! The compiler pass emits a line-oriented text file split into groups:
//!
//! ```text
//! # comment
//! [General]
//! file_path = path/to/binary
//!
//! [Layout]
//! text 0x10 0x3000 + 0x1000,0x2000 0xff
//! ```
//!
//! Each `Layout` line names a section, the victim offset inside it, the physical victim
//! address, the expected flip direction, the ordered aggressor addresses and their shared
//! initialisation value.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BuildError, Result};

/// Direction of an expected bit flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitflipSign {
    /// 0 -> 1
    Plus,
    /// 1 -> 0
    Minus,
}

impl FromStr for BitflipSign {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            _ => Err(format!("invalid bitflip sign `{s}`")),
        }
    }
}

impl fmt::Display for BitflipSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
        })
    }
}

/// One victim bit as described by the compiler pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRecord {
    pub section_name: String,
    pub offset_in_section: u64,
    pub physical_victim_address: u64,
    pub bitflip_sign: BitflipSign,
    /// Order is significant: the hardware hammers aggressors in this sequence.
    pub aggressor_addresses: Vec<u64>,
    pub aggressor_init: u8,
}

impl LayoutRecord {
    /// Parses the six fields of a `Layout` line. `line` is only used for error reporting.
    pub fn parse_line(text: &str, line: usize) -> Result<Self> {
        let malformed = |reason: String| BuildError::MalformedLayoutLine { line, reason };

        let fields: Vec<&str> = text.split_whitespace().collect();
        let &[section, offset, victim, sign, aggressors, init] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected 6 fields, found {}",
                fields.len()
            )));
        };

        let aggressor_addresses = aggressors
            .split(',')
            .map(|a| parse_hex(a, "aggressor address"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(malformed)?;

        let init = parse_hex(init, "init value").map_err(malformed)?;
        let aggressor_init = u8::try_from(init)
            .map_err(|_| malformed(format!("init value {init:#x} does not fit in a byte")))?;

        Ok(Self {
            section_name: section.to_string(),
            offset_in_section: parse_hex(offset, "section offset").map_err(malformed)?,
            physical_victim_address: parse_hex(victim, "victim address").map_err(malformed)?,
            bitflip_sign: sign.parse().map_err(malformed)?,
            aggressor_addresses,
            aggressor_init,
        })
    }
}

fn parse_hex(field: &str, what: &str) -> std::result::Result<u64, String> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid {what} `{field}`: not a hex number"));
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid {what} `{field}`: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    None,
    General,
    Layout,
    Other,
}

/// A parsed descriptor file.
#[derive(Debug, Default, Clone)]
pub struct Descriptor {
    /// `key = value` pairs from the `General` group.
    pub general: IndexMap<String, String>,
    /// Records grouped by section, in first-seen section order.
    pub layout: IndexMap<String, Vec<LayoutRecord>>,
}

impl Descriptor {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut descriptor = Self::default();
        let mut group = Group::None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                group = match name.trim() {
                    "General" => Group::General,
                    "Layout" => Group::Layout,
                    other => {
                        tracing::debug!("Ignoring unknown group [{}] at line {}", other, line_no);
                        Group::Other
                    }
                };
                continue;
            }

            match group {
                Group::General => match line.split_once('=') {
                    Some((key, value)) => {
                        descriptor
                            .general
                            .insert(key.trim().to_string(), value.trim().to_string());
                    }
                    None => tracing::warn!("Skipping General line {} without `=`", line_no),
                },
                Group::Layout => {
                    let record = LayoutRecord::parse_line(line, line_no)?;
                    descriptor
                        .layout
                        .entry(record.section_name.clone())
                        .or_default()
                        .push(record);
                }
                Group::None | Group::Other => {
                    tracing::debug!("Ignoring line {} outside of a known group", line_no);
                }
            }
        }

        tracing::debug!(
            "Parsed {} layout records across {} sections",
            descriptor.record_count(),
            descriptor.layout.len()
        );
        Ok(descriptor)
    }

    /// The binary the compiler pass produced the layout for, if recorded.
    pub fn target_binary(&self) -> Option<&str> {
        self.general.get("file_path").map(String::as_str)
    }

    /// All records in processing order: grouped by section, then by line.
    pub fn records(&self) -> impl Iterator<Item = &LayoutRecord> {
        self.layout.values().flatten()
    }

    pub fn record_count(&self) -> usize {
        self.layout.values().map(Vec::len).sum()
    }
}
