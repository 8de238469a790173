//! Declarative state and step layouts.
//!
//! A plugin describes the shape of its per-step machine-state snapshot once
//! at load time. Layouts are plain ordered field lists; the host validates
//! them during registration and they are immutable afterwards.

use crate::error::RegistrationError;
use crate::record::MAX_INSN_BYTES;

/// Width of a single state field in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FieldWidth {
    /// 8-bit field.
    W8,
    /// 16-bit field.
    W16,
    /// 32-bit field.
    W32,
    /// 64-bit field.
    W64,
}

impl FieldWidth {
    /// Returns the width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Returns the mask of architecturally significant value bits.
    #[must_use]
    pub const fn mask(self) -> u64 {
        match self {
            Self::W8 => 0xFF,
            Self::W16 => 0xFFFF,
            Self::W32 => 0xFFFF_FFFF,
            Self::W64 => u64::MAX,
        }
    }
}

/// A named state field and its declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldDescriptor {
    /// Field name, unique within its layout.
    pub name: String,
    /// Declared field width.
    pub width: FieldWidth,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, width: FieldWidth) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Named, ordered description of a per-step machine-state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StateLayout {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl StateLayout {
    /// Creates an empty layout with the given type name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, preserving declaration order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, width: FieldWidth) -> Self {
        self.fields.push(FieldDescriptor::new(name, width));
        self
    }

    /// Returns the layout's type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the positional index of a field, if declared.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Checks naming invariants: non-empty layout name, at least one field,
    /// no duplicate field names.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`RegistrationError`] invariant.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyLayoutName);
        }
        if self.fields.is_empty() {
            return Err(RegistrationError::EmptyLayout {
                layout: self.name.clone(),
            });
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(RegistrationError::DuplicateField {
                    layout: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Named description of a step record: one embedded [`StateLayout`] plus a
/// bounded instruction-byte sequence and its length field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepLayout {
    name: String,
    state: StateLayout,
    insn_field: String,
    insn_len_field: String,
    max_insn_len: usize,
}

impl StepLayout {
    /// Creates a step layout embedding `state`.
    ///
    /// `insn_field` and `insn_len_field` name the instruction-bytes member
    /// and its length member; `max_insn_len` is the declared per-step
    /// maximum instruction length in bytes.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        state: StateLayout,
        insn_field: impl Into<String>,
        insn_len_field: impl Into<String>,
        max_insn_len: usize,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            insn_field: insn_field.into(),
            insn_len_field: insn_len_field.into(),
            max_insn_len,
        }
    }

    /// Returns the layout's type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the embedded state layout.
    #[must_use]
    pub const fn state(&self) -> &StateLayout {
        &self.state
    }

    /// Name of the instruction-bytes field.
    #[must_use]
    pub fn insn_field(&self) -> &str {
        &self.insn_field
    }

    /// Name of the instruction-length field.
    #[must_use]
    pub fn insn_len_field(&self) -> &str {
        &self.insn_len_field
    }

    /// Declared per-step maximum instruction length in bytes.
    #[must_use]
    pub const fn max_insn_len(&self) -> usize {
        self.max_insn_len
    }

    /// Checks the embedded state layout plus the step-level invariants:
    /// instruction field names must be non-empty, distinct from each other
    /// and from every state field, and the declared maximum must fit the
    /// inline buffer.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`RegistrationError`] invariant.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyLayoutName);
        }
        self.state.validate()?;
        if self.insn_field.is_empty() {
            return Err(RegistrationError::EmptyStepField {
                layout: self.name.clone(),
                member: "instruction-bytes".into(),
            });
        }
        if self.insn_len_field.is_empty() {
            return Err(RegistrationError::EmptyStepField {
                layout: self.name.clone(),
                member: "instruction-length".into(),
            });
        }
        if self.insn_field == self.insn_len_field {
            return Err(RegistrationError::FieldCollision {
                field: self.insn_field.clone(),
            });
        }
        for name in [&self.insn_field, &self.insn_len_field] {
            if self.state.get(name).is_some() {
                return Err(RegistrationError::FieldCollision {
                    field: name.clone(),
                });
            }
        }
        if self.max_insn_len == 0 || self.max_insn_len > MAX_INSN_BYTES {
            return Err(RegistrationError::InsnLengthTooLarge {
                declared: self.max_insn_len,
            });
        }
        Ok(())
    }
}
