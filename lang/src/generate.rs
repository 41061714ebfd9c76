use itertools::Itertools;
use rand::prelude::*;
use tracing::instrument;
use vm::op::Opcode;

/// Random, valid track source. Good for shaking out the interpreter.
pub fn generate() -> String {
    generate_with(&mut thread_rng())
}

#[instrument(skip(rng))]
pub fn generate_with<R: Rng>(rng: &mut R) -> String {
    let labels = rng.gen_range(1..4);
    let mut lines = (0..rng.gen_range(2..24))
        .map(|_| gen_line(rng, labels))
        .collect_vec();
    for label in 0..labels {
        let at = rng.gen_range(0..=lines.len());
        lines.insert(at, format!("l{label}:"));
    }
    lines.join("\n")
}

fn gen_line<R: Rng>(rng: &mut R, labels: usize) -> String {
    match rng.gen_range(0..4) {
        0 => format!("note {}", rng.gen_range(0..Opcode::FIRST)),
        1 => {
            let len = rng.gen_range(1..4);
            format!("db {}", (0..len).map(|_| rng.gen::<u8>()).join(", "))
        }
        _ => {
            let opcode = *Opcode::ALL.choose(rng).unwrap_or(&Opcode::Nop);
            match opcode {
                Opcode::Jump | Opcode::IfJump | Opcode::IfNotJump => {
                    format!("{} l{}", opcode.mnemonic(), rng.gen_range(0..labels))
                }
                _ => match opcode.operand_len() {
                    0 => opcode.mnemonic().to_string(),
                    1 => format!("{} {}", opcode.mnemonic(), rng.gen::<u8>()),
                    _ => format!("{} {:#x}", opcode.mnemonic(), rng.gen_range(0..64u16)),
                },
            }
        }
    }
}
