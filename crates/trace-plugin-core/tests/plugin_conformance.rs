//! Contract conformance tests driving plugins through the session driver.

use proptest::prelude::*;
use rstest::rstest;
use thiserror as _;
use tracing as _;

#[cfg(feature = "serde")]
use serde as _;

use trace_plugin_core::{
    ArchitecturePlugin, EventOutcome, FieldError, FieldRoles, FieldWidth, InsnBytes,
    InstructionClass, MnemonicTable, PluginMetadata, RawEvent, RegistrationError, Session,
    SnapshotBuilder, StateLayout, StepFormat, StepLayout, StepRecord, StepSchema, StepSink,
    MAX_INSN_BYTES, UNKNOWN_MNEMONIC,
};

/// Decoder emitting one record per step event, capturing the event's
/// machine-code bytes verbatim.
struct CaptureArch {
    mnemonics: MnemonicTable,
}

impl CaptureArch {
    fn new() -> Self {
        let mut mnemonics = MnemonicTable::new();
        mnemonics.insert(&[0x90], "nop").expect("fits capacity");
        mnemonics.insert(&[0xC3], "ret").expect("fits capacity");
        Self { mnemonics }
    }
}

#[derive(Default)]
struct CaptureContext {
    steps: u64,
}

impl ArchitecturePlugin for CaptureArch {
    type Context = CaptureContext;

    fn initialize(&self) -> Result<PluginMetadata, RegistrationError> {
        let state = StateLayout::new("capture_state")
            .field("pc", FieldWidth::W64)
            .field("step", FieldWidth::W64);
        Ok(PluginMetadata {
            name: "capture".into(),
            description: "captures machine code from step events".into(),
            id: 0x0002,
            layout: StepLayout::new("capture_step", state, "code", "code_len", MAX_INSN_BYTES),
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
        let code = event.bytes("code")?;
        let insn = InsnBytes::new(code).unwrap_or_else(|_| InsnBytes::empty());

        let mut builder = SnapshotBuilder::new(schema);
        builder.set("pc", pc)?;
        builder.set("step", context.steps)?;
        sink.emit_step(StepRecord::new(builder.build(), insn));
        context.steps += 1;
        Ok(())
    }

    fn disassemble(&self, record: &StepRecord) -> String {
        self.mnemonics.lookup(record.insn()).to_string()
    }

    fn classify(&self, record: &StepRecord) -> InstructionClass {
        match record.insn().as_slice() {
            [0xC3] => InstructionClass::Return,
            _ => InstructionClass::Other,
        }
    }
}

/// Plugin returning caller-supplied metadata, for load-rejection cases.
struct DeclaredArch {
    metadata: PluginMetadata,
}

impl ArchitecturePlugin for DeclaredArch {
    type Context = ();

    fn initialize(&self) -> Result<PluginMetadata, RegistrationError> {
        Ok(self.metadata.clone())
    }

    fn on_event(
        &self,
        _event: &RawEvent,
        _schema: &StepSchema,
        _context: &mut Self::Context,
        _sink: &mut dyn StepSink,
    ) -> Result<(), FieldError> {
        Ok(())
    }

    fn disassemble(&self, _record: &StepRecord) -> String {
        UNKNOWN_MNEMONIC.to_string()
    }

    fn classify(&self, _record: &StepRecord) -> InstructionClass {
        InstructionClass::Other
    }
}

fn well_formed_metadata() -> PluginMetadata {
    let state = StateLayout::new("state")
        .field("pc", FieldWidth::W64)
        .field("step", FieldWidth::W64);
    PluginMetadata {
        name: "declared".into(),
        description: "declarative test plugin".into(),
        id: 0x0003,
        layout: StepLayout::new("step", state, "insn", "insn_len", 1),
        roles: FieldRoles::new("pc", "step"),
        format: StepFormat::default(),
    }
}

fn step_event(pc: u64, code: &[u8]) -> RawEvent {
    RawEvent::step().with("pc", pc).with("code", code.to_vec())
}

#[test]
fn session_replays_the_capture_scenario() {
    let mut session = Session::load(CaptureArch::new()).expect("valid plugin");
    assert_eq!(session.metadata().name, "capture");

    session.begin().expect("ready session");
    assert_eq!(
        session.process(&step_event(0x1000, &[0x90])),
        Ok(EventOutcome::Emitted(1))
    );
    assert_eq!(
        session.process(&RawEvent::other()),
        Ok(EventOutcome::Ignored)
    );
    assert_eq!(
        session.process(&step_event(0x1001, &[0xC3])),
        Ok(EventOutcome::Emitted(1))
    );
    session.finish().expect("active session");

    let records = session.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].step(), 0);
    assert_eq!(records[1].step(), 1);
    assert_eq!(session.disassemble(&records[0]), "nop");
    assert_eq!(session.disassemble(&records[1]), "ret");
    assert_eq!(session.classify(&records[1]), InstructionClass::Return);
}

#[test]
fn mistyped_field_faults_the_event_only() {
    let mut session = Session::load(CaptureArch::new()).expect("valid plugin");
    session.begin().expect("ready session");

    // `code` declared as a word instead of bytes.
    let outcome = session
        .process(&RawEvent::step().with("pc", 0x1000_u64).with("code", 0x90_u64))
        .expect("active session");
    assert!(matches!(
        outcome,
        EventOutcome::Faulted(FieldError::TypeMismatch { .. })
    ));

    assert_eq!(
        session.process(&step_event(0x1001, &[0x90])),
        Ok(EventOutcome::Emitted(1))
    );
    assert_eq!(session.events_faulted(), 1);
    assert_eq!(session.records().len(), 1);
}

#[rstest]
#[case::empty_name(
    {
        let mut meta = well_formed_metadata();
        meta.name = String::new();
        meta
    },
    RegistrationError::EmptyPluginName
)]
#[case::unknown_pc_role(
    {
        let mut meta = well_formed_metadata();
        meta.roles = FieldRoles::new("rip", "step");
        meta
    },
    RegistrationError::UnknownRoleField { role: "pc".into(), field: "rip".into() }
)]
#[case::unknown_step_role(
    {
        let mut meta = well_formed_metadata();
        meta.roles = FieldRoles::new("pc", "sequence");
        meta
    },
    RegistrationError::UnknownRoleField { role: "step".into(), field: "sequence".into() }
)]
#[case::duplicate_state_field(
    {
        let mut meta = well_formed_metadata();
        let state = StateLayout::new("state")
            .field("pc", FieldWidth::W64)
            .field("step", FieldWidth::W64)
            .field("pc", FieldWidth::W8);
        meta.layout = StepLayout::new("step", state, "insn", "insn_len", 1);
        meta
    },
    RegistrationError::DuplicateField { layout: "state".into(), field: "pc".into() }
)]
#[case::colliding_insn_field(
    {
        let mut meta = well_formed_metadata();
        let state = StateLayout::new("state")
            .field("pc", FieldWidth::W64)
            .field("step", FieldWidth::W64);
        meta.layout = StepLayout::new("step", state, "pc", "insn_len", 1);
        meta
    },
    RegistrationError::FieldCollision { field: "pc".into() }
)]
#[case::oversized_declared_length(
    {
        let mut meta = well_formed_metadata();
        let state = StateLayout::new("state")
            .field("pc", FieldWidth::W64)
            .field("step", FieldWidth::W64);
        meta.layout = StepLayout::new("step", state, "insn", "insn_len", MAX_INSN_BYTES + 1);
        meta
    },
    RegistrationError::InsnLengthTooLarge { declared: MAX_INSN_BYTES + 1 }
)]
fn malformed_declarations_are_load_failures(
    #[case] metadata: PluginMetadata,
    #[case] expected: RegistrationError,
) {
    let result = Session::load(DeclaredArch { metadata }).map(|_| ());
    assert_eq!(result, Err(expected));
}

#[test]
fn well_formed_declaration_loads() {
    let session = Session::load(DeclaredArch {
        metadata: well_formed_metadata(),
    })
    .expect("valid plugin");
    assert_eq!(session.metadata().id, 0x0003);
}

proptest! {
    #[test]
    fn property_disassembly_is_total_over_arbitrary_bytes(
        bytes in prop::collection::vec(any::<u8>(), 0..=2 * MAX_INSN_BYTES)
    ) {
        let plugin = CaptureArch::new();
        let rendered = plugin.mnemonics.lookup_bytes(&bytes);
        match bytes.as_slice() {
            [0x90] => assert_eq!(rendered, "nop"),
            [0xC3] => assert_eq!(rendered, "ret"),
            _ => assert_eq!(rendered, UNKNOWN_MNEMONIC),
        }
    }

    #[test]
    fn property_insn_buffer_accepts_exactly_capacity(
        bytes in prop::collection::vec(any::<u8>(), 0..=4 * MAX_INSN_BYTES)
    ) {
        let result = InsnBytes::new(&bytes);
        if bytes.len() <= MAX_INSN_BYTES {
            let insn = result.expect("within capacity");
            assert_eq!(insn.as_slice(), bytes.as_slice());
        } else {
            assert!(result.is_err());
        }
    }

    #[test]
    fn property_sequence_counters_count_matching_events(
        events in prop::collection::vec(
            (any::<bool>(), any::<bool>(), any::<u64>()),
            0..32
        )
    ) {
        let mut session = Session::load(CaptureArch::new()).expect("valid plugin");
        session.begin().expect("ready session");

        let mut expected = 0_u64;
        for (is_step, has_code, pc) in events {
            let event = if is_step {
                let event = RawEvent::step().with("pc", pc);
                if has_code {
                    event.with("code", vec![0x90_u8])
                } else {
                    event
                }
            } else {
                RawEvent::other()
            };
            let outcome = session.process(&event).expect("no fatal defect");
            if is_step && has_code {
                assert_eq!(outcome, EventOutcome::Emitted(1));
                expected += 1;
            } else if is_step {
                // Missing `code` field faults the event, never the session.
                assert!(matches!(outcome, EventOutcome::Faulted(_)));
            } else {
                assert_eq!(outcome, EventOutcome::Ignored);
            }
        }

        let steps: Vec<u64> = session.records().iter().map(StepRecord::step).collect();
        let counted: Vec<u64> = (0..expected).collect();
        assert_eq!(steps, counted);
    }

    #[test]
    fn property_classification_is_deterministic(code in any::<u8>()) {
        let plugin = CaptureArch::new();
        let schema = plugin
            .initialize()
            .expect("valid declaration")
            .validate()
            .expect("well-formed declaration");
        let record = StepRecord::new(
            SnapshotBuilder::new(&schema).build(),
            InsnBytes::from_byte(code),
        );
        assert_eq!(plugin.classify(&record), plugin.classify(&record));
        assert_eq!(plugin.disassemble(&record), plugin.disassemble(&record));
    }
}
