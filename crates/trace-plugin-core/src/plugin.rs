//! The architecture-plugin contract consumed by the trace host.

use crate::error::{FieldError, RegistrationError};
use crate::event::RawEvent;
use crate::metadata::{PluginMetadata, StepSchema};
use crate::record::StepRecord;

/// Classification of a decoded step for control-flow analysis and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum InstructionClass {
    /// Anything without dedicated handling.
    #[default]
    Other = 0,
    /// Conditional branch.
    ConditionalBranch = 1,
    /// Unconditional direct jump.
    Jump = 2,
    /// Indirect jump through a register or memory.
    IndirectJump = 3,
    /// Subroutine call.
    Call = 4,
    /// Subroutine return.
    Return = 5,
    /// System call entry.
    Syscall = 6,
    /// Return from interrupt or system call.
    InterruptReturn = 7,
}

impl InstructionClass {
    /// Returns the stable wire code for this class.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Maps a wire code to a class; undefined codes fall back to `Other`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::ConditionalBranch,
            2 => Self::Jump,
            3 => Self::IndirectJump,
            4 => Self::Call,
            5 => Self::Return,
            6 => Self::Syscall,
            7 => Self::InterruptReturn,
            _ => Self::Other,
        }
    }

    /// Returns `true` for classes that redirect the instruction stream.
    #[must_use]
    pub const fn is_control_flow(self) -> bool {
        matches!(
            self,
            Self::ConditionalBranch
                | Self::Jump
                | Self::IndirectJump
                | Self::Call
                | Self::Return
        )
    }

    /// Returns `true` for subroutine calls.
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }

    /// Returns `true` for subroutine returns.
    #[must_use]
    pub const fn is_return(self) -> bool {
        matches!(self, Self::Return)
    }
}

/// Host capability the plugin emits step records through.
///
/// Emission transfers ownership of the record to the host; the plugin must
/// not retain any reference to it afterwards.
pub trait StepSink {
    /// Accepts a completed step record in emission order.
    fn emit_step(&mut self, record: StepRecord);
}

/// An in-memory sink collecting records in emission order.
///
/// Used by the session driver to buffer one event's emissions, and by tests
/// to observe a plugin directly.
#[derive(Debug, Clone, Default)]
pub struct StepBuffer {
    records: Vec<StepRecord>,
}

impl StepBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Returns the collected records in emission order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Consumes the buffer, yielding the collected records.
    #[must_use]
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}

impl StepSink for StepBuffer {
    fn emit_step(&mut self, record: StepRecord) {
        self.records.push(record);
    }
}

/// A per-architecture trace decoder loaded by the host.
///
/// The host drives every call, single-threaded and in event order:
/// `initialize` once at load, `start` once per session, `on_event` once per
/// raw event, and `disassemble`/`classify` any time afterwards on records
/// the plugin emitted. Implementations must finish each `on_event` in
/// bounded time; unbounded work inside the callback is a contract
/// violation the host may treat as a plugin defect.
pub trait ArchitecturePlugin {
    /// Plugin-private per-session state, owned by the plugin and mutated
    /// only inside `start`/`on_event`.
    type Context: Default;

    /// Declares the plugin's metadata.
    ///
    /// Called once at load time; the host validates the declaration and
    /// rejects the plugin on malformed metadata without aborting itself.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the declaration cannot be built.
    fn initialize(&self) -> Result<PluginMetadata, RegistrationError>;

    /// Creates fresh private state for one decoding session.
    ///
    /// The default implementation supplies an empty context.
    fn start(&self) -> Self::Context {
        Self::Context::default()
    }

    /// Reacts to one raw trace event.
    ///
    /// May emit any number of step records through `sink` (zero, one, or
    /// many) and must update `context` deterministically so that repeated
    /// matches produce non-decreasing sequence counters.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when a typed field lookup fails; the host
    /// drops the event and continues with the next one.
    fn on_event(
        &self,
        event: &RawEvent,
        schema: &StepSchema,
        context: &mut Self::Context,
        sink: &mut dyn StepSink,
    ) -> Result<(), FieldError>;

    /// Observes the end of a decoding session.
    ///
    /// Called once by the host before the context is destroyed; the default
    /// implementation does nothing.
    fn finish(&self, context: &mut Self::Context) {
        let _ = context;
    }

    /// Renders the textual disassembly for an emitted record.
    ///
    /// Pure, total, and deterministic: unrecognized instruction bytes map
    /// to an unknown marker, never to a failure.
    fn disassemble(&self, record: &StepRecord) -> String;

    /// Classifies an emitted record.
    ///
    /// Pure, total, and deterministic.
    fn classify(&self, record: &StepRecord) -> InstructionClass;
}
