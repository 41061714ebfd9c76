use crate::{backend::Backend, memory::Memory, op::Op, state::TrackState};
use tracing::{debug, instrument, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackConfig {
    /// The maximum number of instructions to dispatch in one tick.
    ///
    /// When this is reached the cycle ends early so a jump loop can never hang the host.
    pub max_instructions: usize,
    /// Fire `play`/`syscall` again on every idle tick while the request is still pending,
    /// instead of only on the tick it was raised.
    pub refire_on_idle: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_instructions: 255,
            refire_on_idle: false,
        }
    }
}

/// A bytecode sequencer voice.
///
/// The program is owned by the host and passed in on every [Track::update]; the track only
/// remembers where it starts. Reading outside the program is the host's problem: the
/// interpreter never bounds-checks, it relies on [Memory] to decide what lies beyond.
#[derive(Clone, Debug)]
pub struct Track {
    base: usize,
    config: TrackConfig,
    state: TrackState,
}

enum Flow {
    /// Zero-tick instruction, decode the next one straight away
    Continue,
    EndCycle,
}

impl Track {
    pub fn new(base: usize) -> Self {
        Self::with_config(base, TrackConfig::default())
    }

    pub fn with_config(base: usize, config: TrackConfig) -> Self {
        Self {
            base,
            config,
            state: TrackState::default(),
        }
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn is_halted(&self) -> bool {
        self.state.sent_halt()
    }

    /// Back to the freshly constructed state. The only way out of a `HALT`.
    pub fn reset(&mut self) {
        self.state = TrackState::default();
    }

    /// Advance one tick.
    ///
    /// Returns the number of instructions dispatched, 0 on idle ticks.
    #[instrument(skip(self, memory, backend), fields(base = self.base, cursor = self.state.cursor))]
    pub fn update<M, B>(&mut self, memory: &M, backend: &mut B) -> usize
    where
        M: Memory + ?Sized,
        B: Backend + ?Sized,
    {
        if self.state.sent_halt() {
            backend.halt(&self.state);
            return 0;
        }

        if self.state.counter > 0 {
            self.state.counter -= 1;
            if self.config.refire_on_idle {
                self.notify(backend);
            }
            return 0;
        }

        self.state.counter = self.state.ticks_rate;
        self.state.requests.set_syscall(false);
        self.state.requests.set_play(false);

        if self.state.wait > 0 {
            self.state.wait -= 1;
            return 0;
        }

        let dispatched = self.run_cycle(memory);

        #[cfg(feature = "tracing")]
        {
            tracy_client::plot!("cursor", self.state.cursor as f64);
            tracy_client::plot!("dispatched", dispatched as f64);
        }

        self.notify(backend);
        dispatched
    }

    fn run_cycle<M: Memory + ?Sized>(&mut self, memory: &M) -> usize {
        for dispatched in 1..=self.config.max_instructions {
            let op = Op::decode(memory, self.address());
            trace!(cursor = self.state.cursor, %op);
            if let Flow::EndCycle = self.run_op(op) {
                return dispatched;
            }
        }
        debug!(
            cursor = self.state.cursor,
            "instruction limit reached, ending cycle"
        );
        self.config.max_instructions
    }

    fn address(&self) -> usize {
        self.base.wrapping_add(self.state.cursor as usize)
    }

    fn run_op(&mut self, op: Op) -> Flow {
        let state = &mut self.state;
        match op {
            Op::Nop => {
                state.advance(1);
                Flow::EndCycle
            }
            Op::Halt => {
                state.requests.set_halt(true);
                state.advance(1);
                Flow::EndCycle
            }
            Op::Jump(addr) => {
                state.cursor = addr;
                Flow::Continue
            }
            Op::IfJump(addr) => state.branch(state.accumulator, addr),
            Op::IfNotJump(addr) => state.branch(!state.accumulator, addr),
            Op::Syscall(code) => {
                state.syscode = code;
                state.requests.set_syscall(true);
                state.advance(3);
                Flow::EndCycle
            }
            Op::Set(v) => state.with_register(|_| v),
            Op::Add(v) => state.with_register(|r| r.wrapping_add(v)),
            Op::Sub(v) => state.with_register(|r| r.wrapping_sub(v)),
            Op::Equal(v) => state.compare(|r| r == v),
            Op::Lt(v) => state.compare(|r| r < v),
            Op::Gt(v) => state.compare(|r| r > v),
            Op::LtEqual(v) => state.compare(|r| r <= v),
            Op::GtEqual(v) => state.compare(|r| r >= v),
            Op::Ticks(v) => {
                state.set_ticks(v as u16);
                state.advance(2);
                Flow::EndCycle
            }
            Op::Ticks16(v) => {
                state.set_ticks(v);
                state.advance(3);
                Flow::EndCycle
            }
            Op::Wait(v) => {
                state.wait = v as u16;
                state.advance(2);
                Flow::EndCycle
            }
            Op::Wait16(v) => {
                state.wait = v;
                state.advance(3);
                Flow::EndCycle
            }
            Op::Instrument(v) => {
                state.instrument = v;
                state.advance(2);
                Flow::Continue
            }
            Op::Play(note) => {
                state.request_play(note);
                state.advance(2);
                Flow::EndCycle
            }
            Op::Note(note) => {
                state.request_play(note);
                state.advance(1);
                Flow::EndCycle
            }
        }
    }

    /// Hand pending requests to the backend
    fn notify<B: Backend + ?Sized>(&self, backend: &mut B) {
        let state = &self.state;
        if state.sent_play() {
            backend.play(state.note, state);
        }
        if state.sent_syscall() {
            backend.syscall(state.syscode, state);
        }
        if state.sent_halt() {
            backend.halt(state);
        }
    }
}

impl TrackState {
    fn advance(&mut self, len: u16) {
        self.cursor = self.cursor.wrapping_add(len);
    }

    fn branch(&mut self, taken: bool, addr: u16) -> Flow {
        if taken {
            self.cursor = addr;
            Flow::Continue
        } else {
            self.advance(3);
            Flow::EndCycle
        }
    }

    fn with_register(&mut self, f: impl FnOnce(u8) -> u8) -> Flow {
        self.register = f(self.register);
        self.advance(2);
        Flow::Continue
    }

    fn compare(&mut self, f: impl FnOnce(u8) -> bool) -> Flow {
        self.accumulator = f(self.register);
        self.advance(2);
        Flow::Continue
    }

    fn set_ticks(&mut self, rate: u16) {
        self.ticks_rate = rate;
        self.counter = rate;
    }

    fn request_play(&mut self, note: u8) {
        self.note = note;
        self.requests.set_play(true);
    }
}
