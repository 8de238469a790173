//! Host-side session driver for architecture plugins.
//!
//! The driver owns the decoding loop's plugin-facing half: it loads and
//! validates a plugin, threads the per-session context through every
//! `on_event` call, isolates per-event faults, and enforces the emission
//! contract (non-decreasing sequence counters, bounded instruction
//! lengths).

use tracing::warn;

use crate::error::{RegistrationError, SessionError};
use crate::event::RawEvent;
use crate::metadata::{PluginMetadata, StepSchema};
use crate::plugin::{ArchitecturePlugin, InstructionClass, StepBuffer};
use crate::record::StepRecord;

/// Externally visible session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Loaded and validated; no decoding session active.
    Ready,
    /// A decoding session is active and accepting events.
    Active,
}

/// Outcome of processing one raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The plugin emitted this many step records (at least one).
    Emitted(usize),
    /// The plugin inspected the event and emitted nothing.
    Ignored,
    /// A field lookup failed; the event was dropped and any partial
    /// emissions discarded.
    Faulted(crate::error::FieldError),
}

/// A loaded plugin plus the state needed to drive it over a trace.
pub struct Session<P: ArchitecturePlugin> {
    plugin: P,
    metadata: PluginMetadata,
    schema: StepSchema,
    context: Option<P::Context>,
    records: Vec<StepRecord>,
    events_processed: u64,
    events_faulted: u64,
    last_step: Option<u64>,
}

impl<P: ArchitecturePlugin> Session<P> {
    /// Loads a plugin: calls `initialize` and validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the metadata is malformed; the
    /// plugin is rejected without affecting the host.
    pub fn load(plugin: P) -> Result<Self, RegistrationError> {
        let metadata = plugin.initialize()?;
        let schema = metadata.validate()?;
        Ok(Self {
            plugin,
            metadata,
            schema,
            context: None,
            records: Vec::new(),
            events_processed: 0,
            events_faulted: 0,
            last_step: None,
        })
    }

    /// Returns the validated plugin metadata.
    #[must_use]
    pub const fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    /// Returns the resolved step schema.
    #[must_use]
    pub const fn schema(&self) -> &StepSchema {
        &self.schema
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.context.is_some() {
            SessionState::Active
        } else {
            SessionState::Ready
        }
    }

    /// Records emitted so far, in emission order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Consumes the emitted records, leaving the session empty.
    pub fn take_records(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.records)
    }

    /// Number of events handed to the plugin this session.
    #[must_use]
    pub const fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Number of events dropped due to field lookup failures this session.
    #[must_use]
    pub const fn events_faulted(&self) -> u64 {
        self.events_faulted
    }

    /// Starts a decoding session with fresh plugin context.
    ///
    /// Clears records and counters from any previous session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyActive`] when a session is running.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.context.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        self.records.clear();
        self.events_processed = 0;
        self.events_faulted = 0;
        self.last_step = None;
        self.context = Some(self.plugin.start());
        Ok(())
    }

    /// Hands one raw event to the plugin.
    ///
    /// Field lookup failures are isolated per event: the error is logged,
    /// partial emissions for that event are discarded, and the outcome is
    /// [`EventOutcome::Faulted`] so the caller can continue with the next
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotActive`] outside a session, or a fatal
    /// plugin-defect error when an emitted record regresses the sequence
    /// counter or exceeds the declared instruction length.
    pub fn process(&mut self, event: &RawEvent) -> Result<EventOutcome, SessionError> {
        let mut context = self.context.take().ok_or(SessionError::NotActive)?;
        self.events_processed += 1;

        let mut sink = StepBuffer::new();
        let result = self
            .plugin
            .on_event(event, &self.schema, &mut context, &mut sink);
        self.context = Some(context);

        match result {
            Err(error) => {
                warn!(
                    plugin = %self.metadata.name,
                    event = self.events_processed,
                    %error,
                    "field lookup failed; dropping event"
                );
                self.events_faulted += 1;
                Ok(EventOutcome::Faulted(error))
            }
            Ok(()) => {
                let emitted = sink.into_records();
                if emitted.is_empty() {
                    return Ok(EventOutcome::Ignored);
                }
                for record in &emitted {
                    self.check_emission(record)?;
                }
                let count = emitted.len();
                self.records.extend(emitted);
                Ok(EventOutcome::Emitted(count))
            }
        }
    }

    /// Ends the active session: notifies the plugin, then drops the context.
    ///
    /// Emitted records stay available until the next `begin`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotActive`] when no session is running.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        let mut context = self.context.take().ok_or(SessionError::NotActive)?;
        self.plugin.finish(&mut context);
        Ok(())
    }

    /// Renders the disassembly for an emitted record.
    ///
    /// Callable from `Ready` or `Active` on any previously emitted record.
    #[must_use]
    pub fn disassemble(&self, record: &StepRecord) -> String {
        self.plugin.disassemble(record)
    }

    /// Classifies an emitted record.
    #[must_use]
    pub fn classify(&self, record: &StepRecord) -> InstructionClass {
        self.plugin.classify(record)
    }

    fn check_emission(&mut self, record: &StepRecord) -> Result<(), SessionError> {
        let len = record.insn().len();
        if len > self.schema.max_insn_len() {
            return Err(SessionError::OversizedInstruction {
                len,
                max: self.schema.max_insn_len(),
            });
        }
        let step = record.step();
        if let Some(previous) = self.last_step {
            if step < previous {
                return Err(SessionError::StepRegression {
                    previous,
                    emitted: step,
                });
            }
        }
        self.last_step = Some(step);
        Ok(())
    }
}
