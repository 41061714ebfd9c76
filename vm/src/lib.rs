//! The track sequencer: a tiny bytecode interpreter that asks its host to play notes.
//!
//! Programs are flat byte arrays. Opcodes sit at `0xEC..=0xFF`, operands follow
//! (16-bit ones little-endian) and every other byte in opcode position is a note.
pub mod backend;
pub mod interpret;
pub mod memory;
pub mod op;
pub mod state;

pub use backend::{Backend, NoopBackend, Recorder, Request};
pub use interpret::{Track, TrackConfig};
pub use memory::Memory;
pub use op::{disassemble, listing, Op, Opcode};
pub use state::{Requests, TrackState};
