//! Sentinel-match architecture plugin.
//!
//! A deliberately small decoder: it watches the event stream for steps whose
//! program counter equals a configured sentinel address and emits one step
//! record per match, carrying a running sequence counter, the event's `temp`
//! operand, and a single `nop` opcode byte. Real architectures decode
//! arbitrary instruction streams; this one exists to exercise a host's
//! plugin loading and event dispatch end to end.

use trace_plugin_core::{
    ArchitecturePlugin, FieldError, FieldRoles, FieldWidth, InsnBytes, InsnLengthError,
    InstructionClass, MnemonicTable, PluginMetadata, RawEvent, RegistrationError, SnapshotBuilder,
    StateLayout, StepFormat, StepLayout, StepRecord, StepSchema, StepSink,
};

/// Stable architecture identifier reported in metadata.
pub const ARCH_ID: u16 = 0xFF00;

/// Default sentinel program counter matched against step events.
pub const DEFAULT_SENTINEL_PC: u64 = 0xBEEF;

/// The single opcode byte emitted for every match.
pub const NOP_OPCODE: u8 = 0x15;

/// Per-session private state: the running sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentinelContext {
    steps_emitted: u64,
}

impl SentinelContext {
    /// Number of step records emitted so far this session.
    #[must_use]
    pub const fn steps_emitted(&self) -> u64 {
        self.steps_emitted
    }
}

/// The sentinel-match decoder.
pub struct SentinelArch {
    sentinel_pc: u64,
    mnemonics: MnemonicTable,
}

impl SentinelArch {
    /// Creates a decoder matching [`DEFAULT_SENTINEL_PC`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_sentinel(DEFAULT_SENTINEL_PC)
    }

    /// Creates a decoder matching a custom sentinel address.
    #[must_use]
    pub fn with_sentinel(sentinel_pc: u64) -> Self {
        let mut mnemonics = MnemonicTable::new();
        mnemonics.insert_insn(InsnBytes::from_byte(NOP_OPCODE), "nop");
        Self {
            sentinel_pc,
            mnemonics,
        }
    }

    /// Returns the matched sentinel address.
    #[must_use]
    pub const fn sentinel_pc(&self) -> u64 {
        self.sentinel_pc
    }

    /// Adds a mnemonic for an additional byte pattern.
    ///
    /// # Errors
    ///
    /// Returns [`InsnLengthError`] when the pattern exceeds the instruction
    /// buffer capacity.
    pub fn add_mnemonic(
        &mut self,
        pattern: &[u8],
        mnemonic: impl Into<String>,
    ) -> Result<(), InsnLengthError> {
        self.mnemonics.insert(pattern, mnemonic)
    }
}

impl Default for SentinelArch {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchitecturePlugin for SentinelArch {
    type Context = SentinelContext;

    fn initialize(&self) -> Result<PluginMetadata, RegistrationError> {
        let state = StateLayout::new("cpu_state")
            .field("pc", FieldWidth::W64)
            .field("step", FieldWidth::W64)
            .field("a", FieldWidth::W64);
        Ok(PluginMetadata {
            name: "sentinel".into(),
            description: "Sentinel test architecture".into(),
            id: ARCH_ID,
            layout: StepLayout::new("cpu_step", state, "machinecode", "machinecode_len", 1),
            roles: FieldRoles::new("pc", "step"),
            format: StepFormat::default(),
        })
    }

    fn on_event(
        &self,
        event: &RawEvent,
        schema: &StepSchema,
        context: &mut Self::Context,
        sink: &mut dyn StepSink,
    ) -> Result<(), FieldError> {
        if !event.is_step() {
            return Ok(());
        }
        let pc = event.word("pc")?;
        if pc != self.sentinel_pc {
            return Ok(());
        }
        // Matching steps must carry the operand; its absence faults the
        // event without touching the counter.
        let operand = event.word("temp")?;

        let mut builder = SnapshotBuilder::new(schema);
        builder.set("pc", pc)?;
        builder.set("step", context.steps_emitted)?;
        builder.set("a", operand)?;
        sink.emit_step(StepRecord::new(
            builder.build(),
            InsnBytes::from_byte(NOP_OPCODE),
        ));
        context.steps_emitted += 1;
        Ok(())
    }

    fn disassemble(&self, record: &StepRecord) -> String {
        self.mnemonics.lookup(record.insn()).to_string()
    }

    fn classify(&self, _record: &StepRecord) -> InstructionClass {
        InstructionClass::Other
    }
}
