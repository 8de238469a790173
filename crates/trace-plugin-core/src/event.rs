//! Raw trace events and typed field lookup.
//!
//! A [`RawEvent`] is the host-owned key/value view of one incoming trace
//! event. The plugin receives it by shared reference for the duration of one
//! `on_event` call and must not retain it beyond that call; passing `&RawEvent`
//! expresses exactly that lifetime.

use std::fmt;

use crate::error::FieldError;
use crate::layout::FieldWidth;

/// Kind tag for event field values, used in type-mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FieldKind {
    /// Integer word of a specific width.
    Word(FieldWidth),
    /// Opaque byte sequence.
    Bytes,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(FieldWidth::W8) => write!(f, "u8"),
            Self::Word(FieldWidth::W16) => write!(f, "u16"),
            Self::Word(FieldWidth::W32) => write!(f, "u32"),
            Self::Word(FieldWidth::W64) => write!(f, "u64"),
            Self::Bytes => write!(f, "bytes"),
        }
    }
}

/// A typed event field value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FieldValue {
    /// 8-bit word.
    U8(u8),
    /// 16-bit word.
    U16(u16),
    /// 32-bit word.
    U32(u32),
    /// 64-bit word.
    U64(u64),
    /// Opaque byte sequence.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns the kind tag for this value.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::U8(_) => FieldKind::Word(FieldWidth::W8),
            Self::U16(_) => FieldKind::Word(FieldWidth::W16),
            Self::U32(_) => FieldKind::Word(FieldWidth::W32),
            Self::U64(_) => FieldKind::Word(FieldWidth::W64),
            Self::Bytes(_) => FieldKind::Bytes,
        }
    }

    /// Returns the zero-extended word value, or `None` for byte sequences.
    #[must_use]
    pub fn as_word(&self) -> Option<u64> {
        match self {
            Self::U8(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the byte sequence, or `None` for words.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        Self::U8(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        Self::U16(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::U32(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// An immutable key/value view of one incoming trace event.
///
/// Hosts build events field by field; tests use the same builder. The
/// step/non-step discriminator mirrors the host's `is_step_event` check.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RawEvent {
    step: bool,
    fields: Vec<(String, FieldValue)>,
}

impl RawEvent {
    /// Creates an empty step event.
    #[must_use]
    pub const fn step() -> Self {
        Self {
            step: true,
            fields: Vec::new(),
        }
    }

    /// Creates an empty non-step event.
    #[must_use]
    pub const fn other() -> Self {
        Self {
            step: false,
            fields: Vec::new(),
        }
    }

    /// Appends a named field, preserving insertion order.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns `true` when this event represents one execution step.
    #[must_use]
    pub const fn is_step(&self) -> bool {
        self.step
    }

    /// Returns the declared fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Looks up a field value by name without failing.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Typed field lookup.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotFound`] when the named field is absent.
    pub fn field(&self, name: &str) -> Result<&FieldValue, FieldError> {
        self.get(name).ok_or_else(|| FieldError::not_found(name))
    }

    /// Looks up a word field, zero-extending to 64 bits.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotFound`] when the field is absent, or
    /// [`FieldError::TypeMismatch`] when it holds a byte sequence.
    pub fn word(&self, name: &str) -> Result<u64, FieldError> {
        let value = self.field(name)?;
        value.as_word().ok_or_else(|| FieldError::TypeMismatch {
            field: name.to_string(),
            expected: FieldKind::Word(FieldWidth::W64),
            actual: value.kind(),
        })
    }

    /// Looks up a byte-sequence field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotFound`] when the field is absent, or
    /// [`FieldError::TypeMismatch`] when it holds a word.
    pub fn bytes(&self, name: &str) -> Result<&[u8], FieldError> {
        let value = self.field(name)?;
        value.as_bytes().ok_or_else(|| FieldError::TypeMismatch {
            field: name.to_string(),
            expected: FieldKind::Bytes,
            actual: value.kind(),
        })
    }
}
