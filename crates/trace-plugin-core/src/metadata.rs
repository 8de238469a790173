//! Plugin metadata: the declarative description a plugin supplies at load
//! time for host validation and display formatting.

use std::sync::Arc;

use crate::error::RegistrationError;
use crate::layout::{StateLayout, StepLayout};

/// Names the state fields playing the well-known display roles.
///
/// Roles are plain strings resolved against the declared state layout during
/// registration; a name that fails to resolve rejects the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FieldRoles {
    /// State field holding the instruction address.
    pub pc: String,
    /// State field holding the monotonic sequence counter.
    pub step: String,
}

impl FieldRoles {
    /// Creates a role declaration.
    #[must_use]
    pub fn new(pc: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            pc: pc.into(),
            step: step.into(),
        }
    }
}

/// Radix used when rendering addresses and words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum NumberFormat {
    /// Hexadecimal rendering.
    #[default]
    Hex,
    /// Octal rendering.
    Octal,
    /// Decimal rendering.
    Decimal,
}

/// Display-format capability code selected by the plugin.
///
/// The host uses it to pick column widths and radix when rendering emitted
/// step records; the plugin core itself only provides the formatting
/// helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepFormat {
    /// Radix for addresses and words.
    pub number_format: NumberFormat,
    /// Rendered address width in digits.
    pub addr_width: u8,
    /// Rendered word width in digits.
    pub word_width: u8,
    /// Machine-code column size in bytes.
    pub machinecode_size: u8,
    /// Whether machine code renders big-endian.
    pub big_endian: bool,
}

impl Default for StepFormat {
    fn default() -> Self {
        Self {
            number_format: NumberFormat::Hex,
            addr_width: 16,
            word_width: 16,
            machinecode_size: 1,
            big_endian: false,
        }
    }
}

impl StepFormat {
    /// Renders an address padded to the declared address width.
    #[must_use]
    pub fn format_address(&self, addr: u64) -> String {
        Self::render(self.number_format, addr, usize::from(self.addr_width))
    }

    /// Renders a data word padded to the declared word width.
    #[must_use]
    pub fn format_word(&self, word: u64) -> String {
        Self::render(self.number_format, word, usize::from(self.word_width))
    }

    fn render(format: NumberFormat, value: u64, width: usize) -> String {
        match format {
            NumberFormat::Hex => format!("{value:0width$x}"),
            NumberFormat::Octal => format!("{value:0width$o}"),
            NumberFormat::Decimal => format!("{value:0width$}"),
        }
    }
}

/// The declarative description a plugin returns from `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PluginMetadata {
    /// Short architecture name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Stable 16-bit architecture identifier.
    pub id: u16,
    /// Declared step layout, embedding the state layout.
    pub layout: StepLayout,
    /// State fields playing the pc and sequence-counter roles.
    pub roles: FieldRoles,
    /// Display-format capability code.
    pub format: StepFormat,
}

impl PluginMetadata {
    /// Validates the declaration and resolves it into a [`StepSchema`].
    ///
    /// This is the host's load-time check: layouts must be well formed and
    /// every role must name a declared state field.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`RegistrationError`] invariant; the host
    /// treats this as a non-fatal load failure.
    pub fn validate(&self) -> Result<StepSchema, RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyPluginName);
        }
        self.layout.validate()?;

        let state = self.layout.state();
        let pc_index = Self::resolve_role(state, "pc", &self.roles.pc)?;
        let step_index = Self::resolve_role(state, "step", &self.roles.step)?;

        Ok(StepSchema {
            state: Arc::new(state.clone()),
            pc_index,
            step_index,
            max_insn_len: self.layout.max_insn_len(),
        })
    }

    fn resolve_role(
        state: &StateLayout,
        role: &str,
        field: &str,
    ) -> Result<usize, RegistrationError> {
        state
            .index_of(field)
            .ok_or_else(|| RegistrationError::UnknownRoleField {
                role: role.to_string(),
                field: field.to_string(),
            })
    }
}

/// Load-time-resolved view of a validated step layout.
///
/// Cheap to clone; every emitted [`crate::StepRecord`] carries one so that
/// records stay interpretable after the session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchema {
    state: Arc<StateLayout>,
    pc_index: usize,
    step_index: usize,
    max_insn_len: usize,
}

impl StepSchema {
    /// Returns the resolved state layout.
    #[must_use]
    pub fn state(&self) -> &StateLayout {
        &self.state
    }

    /// Positional index of the pc-role field.
    #[must_use]
    pub const fn pc_index(&self) -> usize {
        self.pc_index
    }

    /// Positional index of the sequence-counter-role field.
    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.step_index
    }

    /// Declared per-step maximum instruction length in bytes.
    #[must_use]
    pub const fn max_insn_len(&self) -> usize {
        self.max_insn_len
    }
}
