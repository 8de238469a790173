//! Mnemonic lookup tables for step-record disassembly.
//!
//! Disassembly is total by contract: unrecognized byte patterns map to a
//! distinguished unknown marker instead of failing.

use std::collections::HashMap;

use crate::error::InsnLengthError;
use crate::record::InsnBytes;

/// Marker returned for byte patterns without a table entry.
pub const UNKNOWN_MNEMONIC: &str = "(unknown)";

/// A lookup table from instruction byte patterns to mnemonic strings.
///
/// Patterns match on exact length and content, replacing opcode `switch`
/// dispatch with data: new instructions are table rows, not control flow.
#[derive(Debug, Clone, Default)]
pub struct MnemonicTable {
    entries: HashMap<InsnBytes, String>,
}

impl MnemonicTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry for an exact byte pattern.
    ///
    /// # Errors
    ///
    /// Returns [`InsnLengthError`] when the pattern exceeds the instruction
    /// buffer capacity.
    pub fn insert(
        &mut self,
        pattern: &[u8],
        mnemonic: impl Into<String>,
    ) -> Result<(), InsnLengthError> {
        let key = InsnBytes::new(pattern)?;
        self.entries.insert(key, mnemonic.into());
        Ok(())
    }

    /// Adds or replaces an entry keyed by an already-bounded instruction.
    pub fn insert_insn(&mut self, key: InsnBytes, mnemonic: impl Into<String>) {
        self.entries.insert(key, mnemonic.into());
    }

    /// Looks up the mnemonic for an instruction.
    ///
    /// Total and deterministic: unmatched patterns yield
    /// [`UNKNOWN_MNEMONIC`].
    #[must_use]
    pub fn lookup(&self, insn: &InsnBytes) -> &str {
        self.entries
            .get(insn)
            .map_or(UNKNOWN_MNEMONIC, String::as_str)
    }

    /// Looks up the mnemonic for a raw byte slice.
    ///
    /// Slices over the buffer capacity cannot match any entry and yield
    /// [`UNKNOWN_MNEMONIC`].
    #[must_use]
    pub fn lookup_bytes(&self, bytes: &[u8]) -> &str {
        InsnBytes::new(bytes)
            .map_or(UNKNOWN_MNEMONIC, |insn| self.lookup(&insn))
    }

    /// Number of table entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
