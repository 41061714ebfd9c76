use std::fmt;

use itertools::Itertools;

use crate::memory::Memory;

#[cfg(test)]
use proptest_derive::Arbitrary;

/// Opcodes live at the top of the byte range so that everything below
/// [Opcode::FIRST] can be written straight into the program as a note.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Do nothing for one cycle
    Nop = 0xEC,
    /// Stop the track for good
    Halt,
    /// Move the cursor to a 16-bit address
    Jump,
    /// Jump if the accumulator is set
    IfJump,
    /// Jump if the accumulator is clear
    IfNotJump,
    /// Hand a 16-bit code to the host
    Syscall,
    Set,
    Add,
    Sub,
    Equal,
    Lt,
    Gt,
    LtEqual,
    GtEqual,
    /// Set the number of idle ticks between cycles
    Ticks,
    Ticks16,
    /// Skip a number of whole cycles
    Wait,
    Wait16,
    Instrument,
    /// Request a note
    Play,
}

impl Opcode {
    pub const FIRST: u8 = Opcode::Nop as u8;

    pub const ALL: [Opcode; 20] = [
        Opcode::Nop,
        Opcode::Halt,
        Opcode::Jump,
        Opcode::IfJump,
        Opcode::IfNotJump,
        Opcode::Syscall,
        Opcode::Set,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Equal,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::LtEqual,
        Opcode::GtEqual,
        Opcode::Ticks,
        Opcode::Ticks16,
        Opcode::Wait,
        Opcode::Wait16,
        Opcode::Instrument,
        Opcode::Play,
    ];

    /// `None` for bytes outside the opcode range, which are notes.
    pub fn parse(byte: u8) -> Option<Opcode> {
        byte.checked_sub(Self::FIRST)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Halt => "halt",
            Opcode::Jump => "jump",
            Opcode::IfJump => "ifjump",
            Opcode::IfNotJump => "ifnotjump",
            Opcode::Syscall => "syscall",
            Opcode::Set => "set",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Equal => "equal",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::LtEqual => "ltequal",
            Opcode::GtEqual => "gtequal",
            Opcode::Ticks => "ticks",
            Opcode::Ticks16 => "ticks16",
            Opcode::Wait => "wait",
            Opcode::Wait16 => "wait16",
            Opcode::Instrument => "instrument",
            Opcode::Play => "play",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Number of operand bytes following the opcode
    pub fn operand_len(self) -> usize {
        match self {
            Opcode::Nop | Opcode::Halt => 0,
            Opcode::Jump
            | Opcode::IfJump
            | Opcode::IfNotJump
            | Opcode::Syscall
            | Opcode::Ticks16
            | Opcode::Wait16 => 2,
            _ => 1,
        }
    }
}

/// A decoded instruction with its operand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Op {
    Nop,
    Halt,
    Jump(u16),
    IfJump(u16),
    IfNotJump(u16),
    Syscall(u16),
    Set(u8),
    Add(u8),
    Sub(u8),
    Equal(u8),
    Lt(u8),
    Gt(u8),
    LtEqual(u8),
    GtEqual(u8),
    Ticks(u8),
    Ticks16(u16),
    Wait(u8),
    Wait16(u16),
    Instrument(u8),
    Play(u8),
    /// Any byte that isn't an opcode is played as-is
    Note(#[cfg_attr(test, proptest(strategy = "0..Opcode::FIRST"))] u8),
}

impl Op {
    /// Decode the instruction at `offset`. Every byte decodes to something.
    pub fn decode<M: Memory + ?Sized>(memory: &M, offset: usize) -> Op {
        let byte = memory.load_u8(offset);
        let Some(opcode) = Opcode::parse(byte) else {
            return Op::Note(byte);
        };
        let arg = offset.wrapping_add(1);
        let u8_arg = || memory.load_u8(arg);
        let u16_arg = || memory.load_u16(arg);
        match opcode {
            Opcode::Nop => Op::Nop,
            Opcode::Halt => Op::Halt,
            Opcode::Jump => Op::Jump(u16_arg()),
            Opcode::IfJump => Op::IfJump(u16_arg()),
            Opcode::IfNotJump => Op::IfNotJump(u16_arg()),
            Opcode::Syscall => Op::Syscall(u16_arg()),
            Opcode::Set => Op::Set(u8_arg()),
            Opcode::Add => Op::Add(u8_arg()),
            Opcode::Sub => Op::Sub(u8_arg()),
            Opcode::Equal => Op::Equal(u8_arg()),
            Opcode::Lt => Op::Lt(u8_arg()),
            Opcode::Gt => Op::Gt(u8_arg()),
            Opcode::LtEqual => Op::LtEqual(u8_arg()),
            Opcode::GtEqual => Op::GtEqual(u8_arg()),
            Opcode::Ticks => Op::Ticks(u8_arg()),
            Opcode::Ticks16 => Op::Ticks16(u16_arg()),
            Opcode::Wait => Op::Wait(u8_arg()),
            Opcode::Wait16 => Op::Wait16(u16_arg()),
            Opcode::Instrument => Op::Instrument(u8_arg()),
            Opcode::Play => Op::Play(u8_arg()),
        }
    }

    /// `None` for [Op::Note]
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Op::Nop => Opcode::Nop,
            Op::Halt => Opcode::Halt,
            Op::Jump(_) => Opcode::Jump,
            Op::IfJump(_) => Opcode::IfJump,
            Op::IfNotJump(_) => Opcode::IfNotJump,
            Op::Syscall(_) => Opcode::Syscall,
            Op::Set(_) => Opcode::Set,
            Op::Add(_) => Opcode::Add,
            Op::Sub(_) => Opcode::Sub,
            Op::Equal(_) => Opcode::Equal,
            Op::Lt(_) => Opcode::Lt,
            Op::Gt(_) => Opcode::Gt,
            Op::LtEqual(_) => Opcode::LtEqual,
            Op::GtEqual(_) => Opcode::GtEqual,
            Op::Ticks(_) => Opcode::Ticks,
            Op::Ticks16(_) => Opcode::Ticks16,
            Op::Wait(_) => Opcode::Wait,
            Op::Wait16(_) => Opcode::Wait16,
            Op::Instrument(_) => Opcode::Instrument,
            Op::Play(_) => Opcode::Play,
            Op::Note(_) => return None,
        })
    }

    /// Encoded size in bytes
    pub fn len(&self) -> usize {
        let operand = match self.arg() {
            Arg::None => 0,
            Arg::U8(_) => 1,
            Arg::U16(_) => 2,
        };
        usize::from(self.opcode().is_some()) + operand
    }

    /// The bytes after the opcode. A note is all operand.
    fn arg(&self) -> Arg {
        match *self {
            Op::Nop | Op::Halt => Arg::None,
            Op::Jump(v)
            | Op::IfJump(v)
            | Op::IfNotJump(v)
            | Op::Syscall(v)
            | Op::Ticks16(v)
            | Op::Wait16(v) => Arg::U16(v),
            Op::Set(v)
            | Op::Add(v)
            | Op::Sub(v)
            | Op::Equal(v)
            | Op::Lt(v)
            | Op::Gt(v)
            | Op::LtEqual(v)
            | Op::GtEqual(v)
            | Op::Ticks(v)
            | Op::Wait(v)
            | Op::Instrument(v)
            | Op::Play(v)
            | Op::Note(v) => Arg::U8(v),
        }
    }

    /// Append the encoded instruction to `out`
    pub fn encode(&self, out: &mut Vec<u8>) {
        if let Some(opcode) = self.opcode() {
            out.push(opcode as u8);
        }
        match self.arg() {
            Arg::None => {}
            Arg::U8(v) => out.push(v),
            Arg::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

#[derive(Clone, Copy)]
enum Arg {
    None,
    U8(u8),
    U16(u16),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().map_or("note", Opcode::mnemonic);
        match self.arg() {
            Arg::None => f.write_str(mnemonic),
            Arg::U8(v) => write!(f, "{mnemonic} {v}"),
            Arg::U16(v) => write!(f, "{mnemonic} {v:#06x}"),
        }
    }
}

/// Decode a whole program into `(offset, op)` pairs.
///
/// Operands cut short by the end of the program read as 0.
pub fn disassemble(bytecode: &[u8]) -> Vec<(usize, Op)> {
    let mut ops = vec![];
    let mut offset = 0;
    while offset < bytecode.len() {
        let op = Op::decode(bytecode, offset);
        ops.push((offset, op));
        offset += op.len();
    }
    ops
}

/// One `offset: op` line per instruction
pub fn listing(bytecode: &[u8]) -> String {
    disassemble(bytecode)
        .into_iter()
        .map(|(offset, op)| format!("{offset:04x}: {op}"))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_byte_decodes() {
        for byte in 0..=u8::MAX {
            let op = Op::decode(&[byte, 0, 0][..], 0);
            match Opcode::parse(byte) {
                Some(opcode) => assert_eq!(op.opcode(), Some(opcode)),
                None => assert_eq!(op, Op::Note(byte)),
            }
        }
    }

    #[test]
    fn test_opcode_range_is_top_of_byte() {
        assert_eq!(Opcode::FIRST, 0xEC);
        assert_eq!(Opcode::Play as u8, 0xFF);
        assert_eq!(Opcode::parse(0xEB), None);
        for (i, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*opcode as u8, Opcode::FIRST + i as u8);
        }
    }

    #[test]
    fn test_mnemonics_are_unique_and_case_insensitive() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
            assert_eq!(
                Opcode::from_mnemonic(&opcode.mnemonic().to_uppercase()),
                Some(opcode)
            );
        }
        assert_eq!(Opcode::from_mnemonic("note"), None);
    }

    #[test]
    fn test_u16_operand_is_little_endian() {
        let mut out = vec![];
        Op::Jump(0x1234).encode(&mut out);
        assert_eq!(out, vec![Opcode::Jump as u8, 0x34, 0x12]);
    }

    #[test]
    fn test_disassemble() {
        let bytecode = [Opcode::Set as u8, 5, 10, Opcode::Syscall as u8, 1, 0, Opcode::Halt as u8];
        assert_eq!(
            disassemble(&bytecode),
            vec![
                (0, Op::Set(5)),
                (2, Op::Note(10)),
                (3, Op::Syscall(1)),
                (6, Op::Halt)
            ]
        );
    }

    #[test]
    fn test_listing() {
        let bytecode = [Opcode::Jump as u8, 0x10, 0x00, 60];
        assert_eq!(listing(&bytecode), "0000: jump 0x0010\n0003: note 60");
    }

    #[test]
    fn test_display_and_encoding_per_operand_size() {
        let cases = [
            (Op::Halt, "halt", vec![Opcode::Halt as u8]),
            (Op::Note(7), "note 7", vec![7]),
            (Op::Play(200), "play 200", vec![Opcode::Play as u8, 200]),
            (Op::Wait16(0x0102), "wait16 0x0102", vec![Opcode::Wait16 as u8, 0x02, 0x01]),
        ];
        for (op, text, bytes) in cases {
            let mut out = vec![];
            op.encode(&mut out);
            assert_eq!(op.to_string(), text);
            assert_eq!(out, bytes);
            assert_eq!(op.len(), out.len());
        }
    }

    proptest! {
        #[test]
        fn test_decode_reads_back_encoded_op(op in any::<Op>()) {
            let mut out = vec![];
            op.encode(&mut out);
            prop_assert_eq!(out.len(), op.len());
            prop_assert_eq!(Op::decode(out.as_slice(), 0), op);
        }
    }
}
