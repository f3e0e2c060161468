//! End-to-end scenarios: call/return, Z-string decode, input suspension,
//! and object-tree moves, driven through the public `Executor`/
//! `Interpreter` surface against hand-built story images rather than a
//! real game file.

use zmachine_core::display_headless::HeadlessDisplay;
use zmachine_core::executor::{Executor, StepResult};
use zmachine_core::input::{InputRequest, InputResponse};
use zmachine_core::instruction::Instruction;
use zmachine_core::memory::Memory;
use zmachine_core::object::ObjectTable;
use zmachine_core::state::GameState;

fn story(version: u8, size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    bytes[0x00] = version;
    bytes[0x0E] = 0x02;
    bytes[0x0F] = 0x00; // static memory base 0x200
    bytes[0x06] = 0x00;
    bytes[0x07] = 0x40; // initial pc 0x40
    bytes[0x0C] = 0x01;
    bytes[0x0D] = 0x00; // globals table at 0x100
    bytes[0x0A] = 0x01;
    bytes[0x0B] = 0x40; // object table at 0x140
    for (i, ch) in "000001".chars().enumerate() {
        bytes[0x12 + i] = ch as u8;
    }
    bytes
}

fn memory(version: u8) -> Memory {
    Memory::load(story(version, 0x300)).unwrap()
}

fn step(executor: &mut Executor, display: &mut HeadlessDisplay) -> StepResult {
    executor.step(display)
}

/// S1 — `add 3,2 -> sp` then `rtrue`, long form.
#[test]
fn s1_add_and_branch() {
    let mut mem = memory(3);
    // 14 03 02 00: long form (both operand-type bits clear -> small
    // constants), opcode 0x14 (add), operands 3 and 2, store to variable
    // 0 (push). b0: short form 0OP opcode 0 (rtrue).
    for (i, b) in [0x14u8, 0x03, 0x02, 0x00, 0xB0].iter().enumerate() {
        mem.force_set_byte(0x40 + i as u32, *b);
    }
    let mut state = GameState::new(mem);
    state.pc = 0x40;

    let mut executor = Executor::new(state);
    let mut display = HeadlessDisplay::new().unwrap();

    assert!(matches!(step(&mut executor, &mut display), StepResult::Continue));
    assert_eq!(executor.state.pc, 0x44);
    assert_eq!(*executor.state.stack.last().unwrap(), 5);

    // rtrue with no call frame on the stack means "top level returned":
    // the executor reports that as Quit.
    assert!(matches!(step(&mut executor, &mut display), StepResult::Quit));
}

/// S2 — `store 0x10, 0x1234` then `load 0x10 -> sp`.
#[test]
fn s2_store_and_load_globals() {
    let mut mem = memory(3);
    // store (VAR, opcode 0x0D): operand types byte 01 (variable=var number
    // raw, small constant for the value)... store takes the raw variable
    // number as operands[0], so the first operand type doesn't matter for
    // resolution, but it must decode as present. Use two small constants.
    // VAR form byte: 0xE0 | 0x0D = 0xED, operand type byte:
    // 01 (small const, the variable number) 00 (large const, the value)
    // 11 11 (omitted) -> 0x4F.
    let bytes = [0xEDu8, 0x4F, 0x10, 0x12, 0x34];
    for (i, b) in bytes.iter().enumerate() {
        mem.force_set_byte(0x40 + i as u32, *b);
    }
    // load (1OP, opcode 0x0E), short form: 0x9E is 1OP short form with a
    // small-constant operand (bits 5-4 = 01 -> small constant).
    let load_bytes = [0x9Eu8, 0x10, 0x00];
    for (i, b) in load_bytes.iter().enumerate() {
        mem.force_set_byte(0x45 + i as u32, *b);
    }
    mem.header.initial_pc = 0x40;

    let mut state = GameState::new(mem);
    state.pc = 0x40;
    let mut executor = Executor::new(state);
    let mut display = HeadlessDisplay::new().unwrap();

    assert!(matches!(step(&mut executor, &mut display), StepResult::Continue));
    assert_eq!(executor.state.load_variable(0x10).unwrap(), 0x1234);

    assert!(matches!(step(&mut executor, &mut display), StepResult::Continue));
    assert_eq!(*executor.state.stack.last().unwrap(), 0x1234);

    let globals = executor.state.memory.header.global_variables as u32;
    assert_eq!(executor.state.memory.get_word(globals).unwrap(), 0x1234);
}

/// S3 — call a routine with two locals, then return.
#[test]
fn s3_call_and_return() {
    let mut mem = memory(5);
    // Routine header at 0x2000 (byte address): 2 locals, no default-local
    // words in V5+.
    mem.force_set_byte(0x2000, 2);

    let mut state = GameState::new(mem);
    state.call_routine(0x2000, &[11, 22], Some(0x11), 0x40).unwrap();

    assert_eq!(state.frames.last().unwrap().locals[0], 11);
    assert_eq!(state.frames.last().unwrap().locals[1], 22);
    assert_eq!(state.argument_count(), 2);

    let had_frame = state.return_from_routine(42).unwrap();
    assert!(had_frame);
    assert_eq!(state.load_variable(0x11).unwrap(), 42);
    assert_eq!(state.pc, 0x40);
}

/// S4 — decode the two-word Z-string for "hello".
#[test]
fn s4_decode_hello() {
    let mut mem = memory(3);
    mem.force_set_byte(0x40, 0x18);
    mem.force_set_byte(0x41, 0x25);
    mem.force_set_byte(0x42, 0x9C);
    mem.force_set_byte(0x43, 0xA5);

    let (text, _next) = zmachine_core::text::decode_string(&mem, 0x40).unwrap();
    assert_eq!(text, "hello");
}

/// S5 — sread suspends, then deliver_input completes it.
#[test]
fn s5_read_suspension() {
    let mut mem = memory(5);
    let text_buf: u16 = 0x210;
    let parse_buf: u16 = 0x230;
    mem.force_set_byte(text_buf as u32, 20); // max input length

    // aread (VAR, opcode 0x04, V5+ stores its terminator): text_buf, parse_buf,
    // both large constants. VAR form byte 0xE4, operand type byte:
    // 00 00 11 11 -> 0x0F, then a store-variable byte (store to sp, variable 0).
    let hi = |w: u16| (w >> 8) as u8;
    let lo = |w: u16| (w & 0xFF) as u8;
    let bytes = [
        0xE4u8,
        0x0F,
        hi(text_buf),
        lo(text_buf),
        hi(parse_buf),
        lo(parse_buf),
        0x00,
    ];
    for (i, b) in bytes.iter().enumerate() {
        mem.force_set_byte(0x40 + i as u32, *b);
    }

    mem.header.dictionary = 0x280;
    let dict_addr = mem.header.dictionary;
    mem.force_set_byte(dict_addr as u32, 0); // empty separator list
    mem.force_set_byte(dict_addr as u32 + 1, 4); // entry length
    mem.force_set_byte(dict_addr as u32 + 2, 0);
    mem.force_set_byte(dict_addr as u32 + 3, 0); // 0 entries

    let mut state = GameState::new(mem);
    state.pc = 0x40;
    let mut executor = Executor::new(state);
    let mut display = HeadlessDisplay::new().unwrap();

    let result = step(&mut executor, &mut display);
    let request = match result {
        StepResult::Suspend(InputRequest::Line { text_buf: tb, parse_buf: pb, .. }) => {
            assert_eq!(tb, text_buf as u32);
            assert_eq!(pb, parse_buf as u32);
            InputRequest::Line { text_buf: tb, parse_buf: pb, time: 0, routine: 0 }
        }
        _ => panic!("expected a Suspend(Line) request"),
    };
    let _ = request;
    assert!(executor.is_awaiting_input());

    executor.deliver_input(InputResponse::Line("look".to_string())).unwrap();

    assert_eq!(executor.state.memory.get_byte(text_buf as u32 + 1).unwrap(), 4);
    let word: Vec<u8> = (0..4)
        .map(|i| executor.state.memory.get_byte(text_buf as u32 + 2 + i).unwrap())
        .collect();
    assert_eq!(word, b"look");
    assert_eq!(executor.state.load_variable(0).unwrap(), 13);
}

/// S6 — insert object 3 under object 5.
#[test]
fn s6_object_move() {
    let mem = memory(3);
    let objects = ObjectTable::new(&mem);
    let mut state = GameState::new(mem);

    // Object 1 is object 3's parent with child chain 3 -> (nothing else);
    // object 2 is object 5's parent with child chain 5 -> 7.
    objects.set_parent(&mut state.memory, 3, 1).unwrap();
    objects.set_child(&mut state.memory, 1, 3).unwrap();
    objects.set_parent(&mut state.memory, 5, 2).unwrap();
    objects.set_sibling(&mut state.memory, 5, 7).unwrap();
    objects.set_child(&mut state.memory, 2, 5).unwrap();

    objects.insert_object(&mut state.memory, 3, 5).unwrap();

    assert_eq!(objects.get_parent(&state.memory, 3).unwrap(), 5);
    assert_eq!(objects.get_child(&state.memory, 5).unwrap(), 3);
    assert_eq!(objects.get_sibling(&state.memory, 3).unwrap(), 7);
    assert_eq!(objects.get_child(&state.memory, 1).unwrap(), 0);
}

#[test]
fn decode_reports_instruction_size() {
    let mem = memory(3);
    let inst = Instruction::decode(&mem, 0x40, 3);
    assert!(inst.is_err() || inst.unwrap().size > 0);
}
