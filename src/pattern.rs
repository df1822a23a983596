//! Aggressor pattern deduplication.
//!
//! Many victim bits share the same aggressors. Each distinct (ordered address list, init
//! value) pair is stored once and referred to by a small integer key.

use indexmap::IndexMap;
use std::fmt;

use crate::error::{BuildError, Result};

/// Identifier of an aggressor pattern. Keys are handed out as 0, 1, 2, ... in the order the
/// patterns are first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternKey(pub usize);

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered aggressor addresses sharing one initialisation value.
///
/// Two patterns with the same addresses in a different order, or with a different init
/// value, are different patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggressorPattern {
    pub addresses: Vec<u64>,
    pub init: u8,
}

impl AggressorPattern {
    pub fn new(addresses: Vec<u64>, init: u8) -> Self {
        Self { addresses, init }
    }
}

/// Renders as `0x1000(0xff),0x2000(0xff)`, the format the loader parses.
impl fmt::Display for AggressorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, addr) in self.addresses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{:#x}({:#x})", addr, self.init)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PatternDeduplicator {
    // The index of each entry is its key.
    patterns: IndexMap<AggressorPattern, PatternKey>,
}

impl PatternDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key of `pattern`, allocating the next free key if it is new.
    pub fn lookup_or_insert(&mut self, pattern: AggressorPattern) -> PatternKey {
        let next = PatternKey(self.patterns.len());
        let entry = self.patterns.entry(pattern);
        let key = *entry.or_insert(next);
        if key == next {
            tracing::debug!("New aggressor pattern {}", key);
        }
        key
    }

    pub fn get(&self, key: PatternKey) -> Option<&AggressorPattern> {
        self.patterns.get_index(key.0).map(|(pattern, _)| pattern)
    }

    /// Confirms that `key` may be reused for aggressors initialised with `init`.
    ///
    /// `lookup_or_insert` can never produce such a mismatch; this guards callers that
    /// carry keys around on their own.
    pub fn reuse_key(&self, key: PatternKey, init: u8) -> Result<PatternKey> {
        let pattern = self.get(key).ok_or(BuildError::UnknownPatternKey(key))?;
        if pattern.init != init {
            return Err(BuildError::InconsistentInitWithinPattern {
                key,
                expected: pattern.init,
                found: init,
            });
        }
        Ok(key)
    }

    /// Patterns in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternKey, &AggressorPattern)> {
        self.patterns.iter().map(|(pattern, key)| (*key, pattern))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
