use std::collections::HashMap;

use chumsky::span::SimpleSpan;
use itertools::Itertools;
use thiserror::Error;
use tracing::{instrument, trace};
use vm::op::{Op, Opcode};

use crate::{
    builder::Assembler,
    parse::{Operand, Spanned, Statement},
};

/// Largest program the 16-bit cursor can walk
pub const MAX_PROGRAM_LEN: usize = u16::MAX as usize + 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("Unknown mnemonic `{0}`")]
    Mnemonic(String),
    #[error("`{mnemonic}` takes {expected} operand(s), got {found}")]
    Arity {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("Operand {value} of `{mnemonic}` doesn't fit in {bits} bits")]
    Range {
        mnemonic: String,
        value: u32,
        bits: u32,
    },
    #[error("Undefined label `{0}`")]
    UndefinedLabel(String),
    #[error("Label `{0}` is defined twice")]
    DuplicateLabel(String),
    #[error("Note {0} would decode as an opcode, use `play`")]
    NoteIsOpcode(u32),
    #[error("Label `{0}` can't be used as a data byte")]
    LabelAsData(String),
    #[error("Program is {0} bytes, longer than the cursor can reach")]
    TooLarge(usize),
}

impl AssembleError {
    /// Short note to point at the offending statement with
    pub fn label(&self) -> &'static str {
        match self {
            AssembleError::Mnemonic(_) => "not an instruction",
            AssembleError::Arity { .. } => "wrong number of operands",
            AssembleError::Range { .. } => "out of range",
            AssembleError::UndefinedLabel(_) => "used here",
            AssembleError::DuplicateLabel(_) => "defined again here",
            AssembleError::NoteIsOpcode(_) => "write `play` instead",
            AssembleError::LabelAsData(_) => "needs a number",
            AssembleError::TooLarge(_) => "program ends here",
        }
    }
}

/// Statement sizes and label offsets, worked out before anything is emitted
fn layout(
    statements: &[Spanned<Statement>],
) -> (HashMap<&str, u16>, Vec<Spanned<AssembleError>>, usize) {
    let mut labels = HashMap::new();
    let mut errs = vec![];
    let mut offset = 0usize;
    for (statement, span) in statements {
        match statement {
            Statement::Label(name) => {
                if labels.insert(name.as_str(), offset as u16).is_some() {
                    errs.push((AssembleError::DuplicateLabel(name.clone()), *span));
                }
            }
            Statement::Op(mnemonic, _) => offset += op_len(mnemonic),
            Statement::Data(bytes) => offset += bytes.len(),
        }
    }
    (labels, errs, offset)
}

fn op_len(mnemonic: &str) -> usize {
    if mnemonic.eq_ignore_ascii_case("note") {
        return 1;
    }
    Opcode::from_mnemonic(mnemonic).map_or(0, |opcode| 1 + opcode.operand_len())
}

fn resolve(operand: &Operand, labels: &HashMap<&str, u16>) -> Result<u32, AssembleError> {
    match operand {
        Operand::Number(n) => Ok(*n),
        Operand::Label(name) => labels
            .get(name.as_str())
            .map(|offset| *offset as u32)
            .ok_or_else(|| AssembleError::UndefinedLabel(name.clone())),
    }
}

fn fit(mnemonic: &str, value: u32, bits: u32) -> Result<u32, AssembleError> {
    if value >> bits == 0 {
        Ok(value)
    } else {
        Err(AssembleError::Range {
            mnemonic: mnemonic.to_string(),
            value,
            bits,
        })
    }
}

fn lower(
    mnemonic: &str,
    operands: &[Operand],
    labels: &HashMap<&str, u16>,
) -> Result<Op, AssembleError> {
    let opcode = Opcode::from_mnemonic(mnemonic);
    let expected = match opcode {
        Some(opcode) => opcode.operand_len().min(1),
        None if mnemonic.eq_ignore_ascii_case("note") => 1,
        None => return Err(AssembleError::Mnemonic(mnemonic.to_string())),
    };
    if operands.len() != expected {
        return Err(AssembleError::Arity {
            mnemonic: mnemonic.to_string(),
            expected,
            found: operands.len(),
        });
    }
    let value = operands
        .first()
        .map(|operand| resolve(operand, labels))
        .transpose()?
        .unwrap_or(0);

    let Some(opcode) = opcode else {
        let note = fit(mnemonic, value, 8)?;
        if note >= Opcode::FIRST as u32 {
            return Err(AssembleError::NoteIsOpcode(note));
        }
        return Ok(Op::Note(note as u8));
    };

    let bits = 8 * opcode.operand_len() as u32;
    let value = fit(mnemonic, value, bits)?;
    let (byte, word) = (value as u8, value as u16);
    Ok(match opcode {
        Opcode::Nop => Op::Nop,
        Opcode::Halt => Op::Halt,
        Opcode::Jump => Op::Jump(word),
        Opcode::IfJump => Op::IfJump(word),
        Opcode::IfNotJump => Op::IfNotJump(word),
        Opcode::Syscall => Op::Syscall(word),
        Opcode::Set => Op::Set(byte),
        Opcode::Add => Op::Add(byte),
        Opcode::Sub => Op::Sub(byte),
        Opcode::Equal => Op::Equal(byte),
        Opcode::Lt => Op::Lt(byte),
        Opcode::Gt => Op::Gt(byte),
        Opcode::LtEqual => Op::LtEqual(byte),
        Opcode::GtEqual => Op::GtEqual(byte),
        Opcode::Ticks => Op::Ticks(byte),
        Opcode::Ticks16 => Op::Ticks16(word),
        Opcode::Wait => Op::Wait(byte),
        Opcode::Wait16 => Op::Wait16(word),
        Opcode::Instrument => Op::Instrument(byte),
        Opcode::Play => Op::Play(byte),
    })
}

fn data(operands: &[Operand]) -> Result<Vec<u8>, AssembleError> {
    operands
        .iter()
        .map(|operand| match operand {
            Operand::Number(n) => fit("db", *n, 8).map(|n| n as u8),
            Operand::Label(name) => Err(AssembleError::LabelAsData(name.clone())),
        })
        .collect()
}

/// Assemble parsed statements into bytecode.
///
/// Labels may be used before they are defined. Every error is collected rather than stopping at
/// the first one.
#[instrument(skip(statements), fields(statements = statements.len()))]
pub fn assemble(statements: &[Spanned<Statement>]) -> Result<Vec<u8>, Vec<Spanned<AssembleError>>> {
    let (labels, mut errs, len) = layout(statements);
    if len > MAX_PROGRAM_LEN {
        errs.push((
            AssembleError::TooLarge(len),
            statements
                .last()
                .map_or(SimpleSpan::from(0..0), |(_, span)| *span),
        ));
    }

    let chunks = statements.iter().map(|(statement, span)| {
        let bytes = match statement {
            Statement::Label(_) => Ok(vec![]),
            Statement::Op(mnemonic, operands) => lower(mnemonic, operands, &labels).map(|op| {
                trace!(%op, "lowered");
                let mut bytes = vec![];
                op.encode(&mut bytes);
                bytes
            }),
            Statement::Data(operands) => data(operands),
        };
        bytes.map_err(|err| (err, *span))
    });
    let (chunks, lower_errs): (Vec<Vec<u8>>, Vec<Spanned<AssembleError>>) =
        chunks.partition_result();
    errs.extend(lower_errs);
    if !errs.is_empty() {
        return Err(errs);
    }

    let mut asm = Assembler::new();
    for chunk in chunks {
        asm.db(chunk);
    }
    Ok(asm.into_bytecode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use proptest::prelude::*;

    fn assemble_src(src: &str) -> Result<Vec<u8>, Vec<AssembleError>> {
        assemble(&parse(src).unwrap())
            .map_err(|errs| errs.into_iter().map(|(err, _)| err).collect())
    }

    #[test]
    fn test_matches_builder() {
        let src = "
            ticks 3
        again:
            instrument 2
            play 60
            note 62
            jump again
            db 1, 2
            syscall 0x1234
            halt
        ";
        let mut asm = Assembler::new();
        asm.ticks(3)
            .instrument(2)
            .play(60)
            .note(62)
            .jump(2)
            .db([1, 2])
            .syscall(0x1234)
            .halt();
        assert_eq!(assemble_src(src).unwrap(), asm.into_bytecode());
    }

    #[test]
    fn test_forward_labels() {
        let bytecode = assemble_src("equal 0\nifjump end\nnop\nend: halt").unwrap();
        assert_eq!(
            bytecode,
            vec![Opcode::Equal as u8, 0, Opcode::IfJump as u8, 6, 0, Opcode::Nop as u8, Opcode::Halt as u8]
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let errs = assemble_src("bogus\nplay\nset 256\njump nowhere\nnote 0xEC\nx:\nx:\ndb 300").unwrap_err();
        assert_eq!(
            errs,
            vec![
                AssembleError::DuplicateLabel("x".into()),
                AssembleError::Mnemonic("bogus".into()),
                AssembleError::Arity {
                    mnemonic: "play".into(),
                    expected: 1,
                    found: 0
                },
                AssembleError::Range {
                    mnemonic: "set".into(),
                    value: 256,
                    bits: 8
                },
                AssembleError::UndefinedLabel("nowhere".into()),
                AssembleError::NoteIsOpcode(0xEC),
                AssembleError::Range {
                    mnemonic: "db".into(),
                    value: 300,
                    bits: 8
                },
            ]
        );
    }

    #[test]
    fn test_operandless_ops_take_none() {
        let errs = assemble_src("halt 1").unwrap_err();
        assert!(matches!(errs[0], AssembleError::Arity { expected: 0, found: 1, .. }));
    }

    #[test]
    fn test_labels_are_not_data() {
        let errs = assemble_src("top: db top").unwrap_err();
        assert_eq!(errs, vec![AssembleError::LabelAsData("top".into())]);
    }

    #[test]
    fn test_too_large() {
        let line = format!("db {}\n", vec!["0"; 1024].join(", "));
        let src = line.repeat(65);
        let errs = assemble_src(&src).unwrap_err();
        assert_eq!(errs, vec![AssembleError::TooLarge(65 * 1024)]);
    }

    proptest! {
        #[test]
        fn test_text_matches_builder_for_any_operand(
            opcode in prop::sample::select(Opcode::ALL.to_vec()),
            value in 0..=u16::MAX,
        ) {
            let value = match opcode.operand_len() {
                0 => 0,
                1 => value & 0xFF,
                _ => value,
            };
            let src = match opcode.operand_len() {
                0 => opcode.mnemonic().to_string(),
                _ => format!("{} {value}", opcode.mnemonic()),
            };
            let bytecode = assemble_src(&src).unwrap();

            let mut expected = vec![opcode as u8];
            match opcode.operand_len() {
                0 => {}
                1 => expected.push(value as u8),
                _ => expected.extend(value.to_le_bytes()),
            }
            prop_assert_eq!(bytecode, expected);
        }
    }
}
