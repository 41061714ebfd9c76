use vm::op::{Op, Opcode};

/// Emits track bytecode one instruction at a time.
///
/// ```
/// use lang::Assembler;
///
/// let mut asm = Assembler::new();
/// asm.ticks(3);
/// let again = asm.here();
/// asm.instrument(1).play(60).jump(again);
/// assert_eq!(asm.len(), 9);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assembler {
    bytecode: Vec<u8>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(&mut self, op: Op) -> &mut Self {
        op.encode(&mut self.bytecode);
        self
    }

    pub fn nop(&mut self) -> &mut Self {
        self.op(Op::Nop)
    }

    pub fn halt(&mut self) -> &mut Self {
        self.op(Op::Halt)
    }

    pub fn jump(&mut self, addr: u16) -> &mut Self {
        self.op(Op::Jump(addr))
    }

    pub fn if_jump(&mut self, addr: u16) -> &mut Self {
        self.op(Op::IfJump(addr))
    }

    pub fn if_not_jump(&mut self, addr: u16) -> &mut Self {
        self.op(Op::IfNotJump(addr))
    }

    pub fn syscall(&mut self, code: u16) -> &mut Self {
        self.op(Op::Syscall(code))
    }

    pub fn set(&mut self, v: u8) -> &mut Self {
        self.op(Op::Set(v))
    }

    pub fn add(&mut self, v: u8) -> &mut Self {
        self.op(Op::Add(v))
    }

    pub fn sub(&mut self, v: u8) -> &mut Self {
        self.op(Op::Sub(v))
    }

    pub fn equal(&mut self, v: u8) -> &mut Self {
        self.op(Op::Equal(v))
    }

    pub fn lt(&mut self, v: u8) -> &mut Self {
        self.op(Op::Lt(v))
    }

    pub fn gt(&mut self, v: u8) -> &mut Self {
        self.op(Op::Gt(v))
    }

    pub fn lt_equal(&mut self, v: u8) -> &mut Self {
        self.op(Op::LtEqual(v))
    }

    pub fn gt_equal(&mut self, v: u8) -> &mut Self {
        self.op(Op::GtEqual(v))
    }

    pub fn ticks(&mut self, v: u8) -> &mut Self {
        self.op(Op::Ticks(v))
    }

    pub fn ticks16(&mut self, v: u16) -> &mut Self {
        self.op(Op::Ticks16(v))
    }

    pub fn wait(&mut self, v: u8) -> &mut Self {
        self.op(Op::Wait(v))
    }

    pub fn wait16(&mut self, v: u16) -> &mut Self {
        self.op(Op::Wait16(v))
    }

    pub fn instrument(&mut self, v: u8) -> &mut Self {
        self.op(Op::Instrument(v))
    }

    pub fn play(&mut self, note: u8) -> &mut Self {
        self.op(Op::Play(note))
    }

    /// A bare note byte. Notes that would read back as an opcode are written as `PLAY` instead.
    pub fn note(&mut self, note: u8) -> &mut Self {
        if note >= Opcode::FIRST {
            self.play(note)
        } else {
            self.op(Op::Note(note))
        }
    }

    /// Raw bytes, e.g. inline data the program jumps over
    pub fn db(&mut self, bytes: impl IntoIterator<Item = u8>) -> &mut Self {
        self.bytecode.extend(bytes);
        self
    }

    /// Offset the next instruction will land at, for use as a jump target.
    ///
    /// Truncated to 16 bits, the cursor can't address further.
    pub fn here(&self) -> u16 {
        self.bytecode.len() as u16
    }

    pub fn len(&self) -> usize {
        self.bytecode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytecode.is_empty()
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn into_bytecode(self) -> Vec<u8> {
        self.bytecode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm::{disassemble, Recorder, Track};

    #[test]
    fn test_bytes_decode_to_the_calls_made() {
        let mut asm = Assembler::new();
        asm.set(5)
            .add(3)
            .equal(8)
            .if_jump(0x0203)
            .if_not_jump(7)
            .syscall(0xFFFF)
            .sub(1)
            .lt(2)
            .gt(3)
            .lt_equal(4)
            .gt_equal(5)
            .ticks(6)
            .ticks16(0x0708)
            .wait(9)
            .wait16(0x0A0B)
            .instrument(12)
            .play(13)
            .note(14)
            .nop()
            .halt();
        let ops = disassemble(asm.bytecode())
            .into_iter()
            .map(|(_, op)| op)
            .collect::<Vec<_>>();
        assert_eq!(
            ops,
            vec![
                Op::Set(5),
                Op::Add(3),
                Op::Equal(8),
                Op::IfJump(0x0203),
                Op::IfNotJump(7),
                Op::Syscall(0xFFFF),
                Op::Sub(1),
                Op::Lt(2),
                Op::Gt(3),
                Op::LtEqual(4),
                Op::GtEqual(5),
                Op::Ticks(6),
                Op::Ticks16(0x0708),
                Op::Wait(9),
                Op::Wait16(0x0A0B),
                Op::Instrument(12),
                Op::Play(13),
                Op::Note(14),
                Op::Nop,
                Op::Halt,
            ]
        );
    }

    #[test]
    fn test_high_notes_become_play() {
        let mut asm = Assembler::new();
        asm.note(0xF0).note(0x20);
        assert_eq!(asm.bytecode(), &[Opcode::Play as u8, 0xF0, 0x20]);
    }

    #[test]
    fn test_db_is_raw() {
        let mut asm = Assembler::new();
        let skip = 3 + 3;
        asm.jump(skip).db([Opcode::Halt as u8, 1, 2]).play(1);
        assert_eq!(asm.here(), 8);

        let mut track = Track::new(0);
        let mut recorder = Recorder::default();
        track.update(asm.bytecode(), &mut recorder);
        assert_eq!(recorder.plays().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_chained_zero_tick_program() {
        let mut asm = Assembler::new();
        asm.set(5).add(3).equal(8);
        let target = asm.here() + 3 + 1;
        asm.if_jump(target).halt().play(60);
        assert!(!asm.is_empty());

        let mut track = Track::new(0);
        let mut recorder = Recorder::default();
        assert_eq!(track.update(asm.bytecode(), &mut recorder), 5);
        assert!(track.state().accumulator);
        assert_eq!(recorder.plays().collect::<Vec<_>>(), vec![60]);
    }
}
