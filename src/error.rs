//! Error taxonomy.
//!
//! Every stage of the builder fails fast; nothing here is recovered locally.

use thiserror::Error;

use crate::pattern::PatternKey;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("malformed layout line {line}: {reason}")]
    MalformedLayoutLine { line: usize, reason: String },

    #[error("section `{0}` not found in binary")]
    SectionNotFound(String),

    #[error("binary has no PT_NULL segment")]
    SegmentNotFound,

    /// The same file-backed page would have to live in two physical frames.
    #[error(
        "page at file offset {page_file_offset:#x} is mapped to frame {existing:#x} \
         and to frame {conflicting:#x}"
    )]
    FrameCollision {
        page_file_offset: u64,
        existing: u64,
        conflicting: u64,
    },

    #[error("aggressor pattern {key} is initialised with {expected:#04x}, not {found:#04x}")]
    InconsistentInitWithinPattern {
        key: PatternKey,
        expected: u8,
        found: u8,
    },

    #[error("aggressor pattern {0} does not exist")]
    UnknownPatternKey(PatternKey),

    #[error("offset {offset:#x} in section `{section}` overflows the file offset range")]
    OffsetOverflow { section: String, offset: u64 },

    #[error("unsupported binary format {0}, expected ELF")]
    UnsupportedBinary(String),

    #[error("failed to parse binary: {0}")]
    Object(#[from] object::read::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
