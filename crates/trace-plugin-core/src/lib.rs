//! Architecture-plugin contract for binary trace decoding.
//!
//! A trace host loads per-architecture plugins that declare a machine-state
//! layout, convert raw trace events into typed step records, and render
//! disassembly and classification for the records they emitted. This crate
//! provides the plugin-facing contract and the host-side session driver; the
//! host's storage, event loop, and UI live elsewhere.

/// Declarative state and step layouts.
pub mod layout;
pub use layout::{FieldDescriptor, FieldWidth, StateLayout, StepLayout};

/// Plugin metadata and load-time schema resolution.
pub mod metadata;
pub use metadata::{FieldRoles, NumberFormat, PluginMetadata, StepFormat, StepSchema};

/// Raw trace events and typed field lookup.
pub mod event;
pub use event::{FieldKind, FieldValue, RawEvent};

/// Step records, state snapshots, and bounded instruction buffers.
pub mod record;
pub use record::{InsnBytes, SnapshotBuilder, StateSnapshot, StepRecord, MAX_INSN_BYTES};

/// Mnemonic lookup tables for disassembly.
pub mod disasm;
pub use disasm::{MnemonicTable, UNKNOWN_MNEMONIC};

/// The architecture-plugin trait and emission sinks.
pub mod plugin;
pub use plugin::{ArchitecturePlugin, InstructionClass, StepBuffer, StepSink};

/// Host-side session driver.
pub mod session;
pub use session::{EventOutcome, Session, SessionState};

/// Error taxonomy.
pub mod error;
pub use error::{FieldError, InsnLengthError, RegistrationError, SessionError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
