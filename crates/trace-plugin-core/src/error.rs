//! Error taxonomy for plugin registration, event field lookup, and session
//! driving.

use thiserror::Error;

use crate::event::FieldKind;
use crate::record::MAX_INSN_BYTES;

/// Rejection reasons for plugin metadata at load time.
///
/// A registration error is a non-fatal load failure: the host refuses the
/// plugin for the session and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Plugin declared an empty short name.
    #[error("plugin name is empty")]
    EmptyPluginName,
    /// A layout was declared with an empty name.
    #[error("layout name is empty")]
    EmptyLayoutName,
    /// A state layout declared no fields.
    #[error("layout `{layout}` declares no fields")]
    EmptyLayout {
        /// Name of the offending layout.
        layout: String,
    },
    /// Two fields in one layout share a name.
    #[error("duplicate field `{field}` in layout `{layout}`")]
    DuplicateField {
        /// Name of the offending layout.
        layout: String,
        /// The duplicated field name.
        field: String,
    },
    /// A declared field role names a field absent from the state layout.
    #[error("role `{role}` names unknown state field `{field}`")]
    UnknownRoleField {
        /// Role being resolved (`pc` or `step`).
        role: String,
        /// The field name that failed to resolve.
        field: String,
    },
    /// A step layout declared an instruction member with an empty name.
    #[error("step layout `{layout}` declares an empty {member} field name")]
    EmptyStepField {
        /// Name of the offending step layout.
        layout: String,
        /// Which member is unnamed (`instruction-bytes` or
        /// `instruction-length`).
        member: String,
    },
    /// A step-layout field name collides with a state field name.
    #[error("step field `{field}` collides with a state field")]
    FieldCollision {
        /// The colliding field name.
        field: String,
    },
    /// Declared maximum instruction length exceeds the buffer capacity.
    #[error(
        "declared instruction length {declared} exceeds the maximum of {MAX_INSN_BYTES} bytes"
    )]
    InsnLengthTooLarge {
        /// The declared per-step maximum instruction length.
        declared: usize,
    },
}

/// Typed event field lookup failures raised during `on_event`.
///
/// Policy is fail-fast per event: the session driver logs the error, drops
/// the event, and continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The named field is absent from the event.
    #[error("field `{field}` not found")]
    NotFound {
        /// The requested field name.
        field: String,
    },
    /// The named field is present with an incompatible kind.
    #[error("field `{field}` is {actual}, expected {expected}")]
    TypeMismatch {
        /// The requested field name.
        field: String,
        /// Kind the caller asked for.
        expected: FieldKind,
        /// Kind actually stored in the event.
        actual: FieldKind,
    },
}

impl FieldError {
    /// Convenience constructor for [`FieldError::NotFound`].
    #[must_use]
    pub fn not_found(field: impl Into<String>) -> Self {
        Self::NotFound {
            field: field.into(),
        }
    }
}

/// An instruction byte sequence longer than the inline buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("instruction length {len} exceeds the {MAX_INSN_BYTES}-byte capacity")]
pub struct InsnLengthError {
    /// The rejected byte-sequence length.
    pub len: usize,
}

/// Session driver failures: state-machine misuse and fatal plugin defects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `begin` was called while a session is already active.
    #[error("a decoding session is already active")]
    AlreadyActive,
    /// `process` or `finish` was called with no active session.
    #[error("no decoding session is active")]
    NotActive,
    /// An emitted step's sequence counter regressed below the previous one.
    #[error("emitted step counter {emitted} regressed below {previous}")]
    StepRegression {
        /// Highest sequence counter seen so far this session.
        previous: u64,
        /// The regressing counter value.
        emitted: u64,
    },
    /// An emitted record's instruction exceeds the declared layout maximum.
    #[error("emitted instruction of {len} bytes exceeds the declared maximum of {max}")]
    OversizedInstruction {
        /// Length of the emitted instruction byte sequence.
        len: usize,
        /// Maximum length declared by the step layout.
        max: usize,
    },
}
