//! Emitted step records: bounded instruction buffers and state snapshots.

use crate::error::{FieldError, InsnLengthError};
use crate::metadata::StepSchema;

/// Hard capacity of the inline instruction byte buffer.
pub const MAX_INSN_BYTES: usize = 16;

/// A bounded-length instruction byte sequence.
///
/// Small inline buffer with explicit capacity and current length, the same
/// fixed-array-plus-len shape as a machine-code column in a trace display.
/// Unused capacity is always zeroed, so derived equality and hashing are
/// well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InsnBytes {
    bytes: [u8; MAX_INSN_BYTES],
    len: u8,
}

impl InsnBytes {
    /// Creates an empty instruction buffer.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: [0; MAX_INSN_BYTES],
            len: 0,
        }
    }

    /// Creates a single-byte instruction.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        let mut bytes = [0; MAX_INSN_BYTES];
        bytes[0] = byte;
        Self { bytes, len: 1 }
    }

    /// Copies `bytes` into a bounded buffer.
    ///
    /// # Errors
    ///
    /// Returns [`InsnLengthError`] when `bytes` exceeds [`MAX_INSN_BYTES`].
    pub fn new(bytes: &[u8]) -> Result<Self, InsnLengthError> {
        let len = u8::try_from(bytes.len())
            .ok()
            .filter(|len| usize::from(*len) <= MAX_INSN_BYTES)
            .ok_or(InsnLengthError { len: bytes.len() })?;
        let mut buf = [0; MAX_INSN_BYTES];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { bytes: buf, len })
    }

    /// Current instruction length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` when no instruction bytes were captured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the captured bytes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }
}

impl AsRef<[u8]> for InsnBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// A machine-state snapshot aligned with a validated schema.
///
/// Holds one value per declared state field, in declaration order. Fields
/// never set through the builder default to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    schema: StepSchema,
    values: Box<[u64]>,
}

impl StateSnapshot {
    /// Returns the schema this snapshot was built against.
    #[must_use]
    pub const fn schema(&self) -> &StepSchema {
        &self.schema
    }

    /// Looks up a field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.schema
            .state()
            .index_of(name)
            .map(|index| self.values[index])
    }

    /// Value of the pc-role field.
    #[must_use]
    pub fn pc(&self) -> u64 {
        self.values[self.schema.pc_index()]
    }

    /// Value of the sequence-counter-role field.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.values[self.schema.step_index()]
    }

    /// Iterates `(field name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.schema
            .state()
            .fields()
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.name.as_str(), *value))
    }
}

/// Builder for [`StateSnapshot`] with validated field access.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    schema: StepSchema,
    values: Box<[u64]>,
}

impl SnapshotBuilder {
    /// Creates a zero-initialized builder for `schema`.
    #[must_use]
    pub fn new(schema: &StepSchema) -> Self {
        Self {
            schema: schema.clone(),
            values: vec![0; schema.state().len()].into_boxed_slice(),
        }
    }

    /// Sets a state field, masked to its declared width.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotFound`] when the schema declares no such
    /// field.
    pub fn set(&mut self, name: &str, value: u64) -> Result<&mut Self, FieldError> {
        let index = self
            .schema
            .state()
            .index_of(name)
            .ok_or_else(|| FieldError::not_found(name))?;
        self.values[index] = value & self.schema.state().fields()[index].width.mask();
        Ok(self)
    }

    /// Finalizes the snapshot.
    #[must_use]
    pub fn build(self) -> StateSnapshot {
        StateSnapshot {
            schema: self.schema,
            values: self.values,
        }
    }
}

/// One decoded unit of execution captured for trace replay and analysis.
///
/// Emission hands the record to the host by value; the plugin keeps no
/// reference to it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    state: StateSnapshot,
    insn: InsnBytes,
}

impl StepRecord {
    /// Creates a record from a snapshot and its captured instruction bytes.
    #[must_use]
    pub const fn new(state: StateSnapshot, insn: InsnBytes) -> Self {
        Self { state, insn }
    }

    /// Returns the state snapshot.
    #[must_use]
    pub const fn state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Returns the captured instruction bytes.
    #[must_use]
    pub const fn insn(&self) -> &InsnBytes {
        &self.insn
    }

    /// Value of the pc-role field.
    #[must_use]
    pub fn pc(&self) -> u64 {
        self.state.pc()
    }

    /// Value of the sequence-counter-role field.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.state.step()
    }

    /// Looks up a state field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.state.get(name)
    }
}
