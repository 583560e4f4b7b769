//! Tests for deoptimized-frame unwinding and backtrace decoration

mod common;

use common::{FakeFrame, FakeTarget};
use svmprobe_core::types::{Address, FrameClass, FrameId, FrameInfo, FrameKind, PrimitiveKind, SourceLocation, ValueType};
use svmprobe_core::unwind::{
    DeoptUnwinder, FrameDecorator, DEOPT_FRAME_LABEL, DEOPT_FRAME_TYPE, DEOPT_STUB_SYMBOL, INLINE_PREFIX, PC_REGISTER,
    SP_REGISTER,
};
use svmprobe_core::Session;

const STUB: u64 = 0x4000_1000;
const FRAME_SIZE: u64 = 0x40;
const CALLER_PC: u64 = 0x4000_2345;

/// Target with the deopt stub and one deoptimized frame. Returns the
/// frame's stack pointer.
fn deopt_fixture(frame_size: i64) -> (FakeTarget, Address)
{
    let mut target = FakeTarget::new();
    target.set_symbol(DEOPT_STUB_SYMBOL, Address::from(STUB));
    target.define_class(DEOPT_FRAME_TYPE, &[(
        "sourceTotalFrameSize",
        ValueType::Primitive(PrimitiveKind::Long),
    )]);

    let deopt_frame = target.new_object(DEOPT_FRAME_TYPE);
    target.write(deopt_frame + 8, &frame_size.to_le_bytes());

    let sp = target.alloc(0x100);
    target.write_u64(sp, deopt_frame.value());
    target.write_u64(sp + FRAME_SIZE - 8, CALLER_PC);
    (target, sp)
}

#[test]
fn test_unwinds_deoptimized_frame()
{
    let (target, sp) = deopt_fixture(FRAME_SIZE as i64);
    let mut session = Session::default();
    session.attach(&target);

    let info = session.unwind(&target, &FakeFrame::new(sp.value(), STUB)).unwrap();
    assert_eq!(info.frame_id, FrameId::new(sp, Address::from(STUB)));
    assert_eq!(info.caller_sp(), Some(sp + FRAME_SIZE));
    assert_eq!(info.caller_pc(), Some(Address::from(CALLER_PC)));
}

#[test]
fn test_register_numbers()
{
    // x86-64 DWARF numbering: 7 is the stack pointer, 16 the return address column.
    assert_eq!(SP_REGISTER, gimli::Register(7));
    assert_eq!(PC_REGISTER, gimli::Register(16));
}

#[test]
fn test_declines_regular_frames()
{
    let (target, sp) = deopt_fixture(FRAME_SIZE as i64);
    let unwinder = DeoptUnwinder::locate(&target).unwrap();
    assert_eq!(unwinder.stub(), Address::from(STUB));
    assert_eq!(unwinder.classify(Address::from(STUB + 4)), FrameClass::Normal);
    assert!(unwinder.unwind(&target, &FakeFrame::new(sp.value(), STUB + 4)).is_none());
}

#[test]
fn test_declines_without_stub()
{
    let target = FakeTarget::new();
    let mut session = Session::default();
    session.attach(&target);
    assert!(DeoptUnwinder::locate(&target).is_none());
    assert!(session.unwind(&target, &FakeFrame::new(0x1000, STUB)).is_none());

    let frame = FrameInfo {
        pc: Address::from(STUB),
        function: Some("main".into()),
        ..FrameInfo::default()
    };
    assert_eq!(session.decorate(&frame).class, FrameClass::Normal);
}

#[test]
fn test_declines_bad_frames()
{
    let (target, sp) = deopt_fixture(-16);
    let unwinder = DeoptUnwinder::new(Address::from(STUB));
    assert!(unwinder.unwind(&target, &FakeFrame::new(sp.value(), STUB)).is_none());

    // Stack pointer outside any readable memory.
    assert!(unwinder.unwind(&target, &FakeFrame::new(0xdead_0000, STUB)).is_none());
    // Host could not supply the registers.
    assert!(unwinder.unwind(&target, &FakeFrame::default()).is_none());
}

#[test]
fn test_decorates_deoptimized_frame()
{
    let decorator = FrameDecorator::new(Some(Address::from(STUB)));
    let frame = FrameInfo {
        pc: Address::from(STUB),
        sp: Address::from(0x7ff0_0000),
        ..FrameInfo::default()
    };
    let decorated = decorator.decorate(&frame);
    assert_eq!(decorated.class, FrameClass::Deoptimized);
    assert_eq!(decorated.function, DEOPT_FRAME_LABEL);
    assert!(!decorated.show_variables);
}

#[test]
fn test_decorates_regular_frames()
{
    let decorator = FrameDecorator::new(Some(Address::from(STUB)));
    let frames = [
        FrameInfo {
            pc: Address::from(0x4000_3000),
            function: Some("java.util.ArrayList.grow(int)".into()),
            kind: FrameKind::Inlined,
            location: Some(SourceLocation::new("java/util/ArrayList.java", 237)),
            ..FrameInfo::default()
        },
        FrameInfo {
            pc: Address::from(0x4000_3000),
            function: Some("com.example.Main.main(java.lang.String[])".into()),
            location: Some(SourceLocation::from_file("/src/com/example/Main.java")),
            ..FrameInfo::default()
        },
        FrameInfo {
            pc: Address::from(0x4000_4000),
            function: Some("__libc_start_main".into()),
            ..FrameInfo::default()
        },
        FrameInfo {
            pc: Address::from(0x1234),
            sp: Address::from(0x7ff0_0100),
            ..FrameInfo::default()
        },
    ];

    let functions: Vec<String> = decorator.filter(&frames).map(|frame| frame.function).collect();
    assert_eq!(functions, vec![
        "<-- java.util.ArrayList.grow(ArrayList.java:237)",
        "com.example.Main.main(Main.java)",
        "__libc_start_main",
        "Unknown Frame at 0x7ff00100",
    ]);
    assert!(functions[0].starts_with(INLINE_PREFIX));
    assert!(decorator.filter(&frames).all(|frame| frame.show_variables));
}
