//! Multi-channel host for track bytecode and the console framebuffer.
//!
//! Each channel runs a [vm::Track] over its own program, compiled with [lang]. The
//! [sequencer::Sequencer] ticks them in lockstep and turns their requests into
//! [sequencer::Event]s, either inline or on a [threads::SequencerThread] at a fixed rate.
//!
//! ```
//! use chiptrack::{Event, Sequencer, SequencerConfig};
//!
//! let lead = lang::compile("instrument 1\nplay 60\nhalt").unwrap();
//! let mut sequencer = Sequencer::new(SequencerConfig::default(), [lead]);
//! sequencer.tick();
//! assert_eq!(
//!     sequencer.drain_events(),
//!     vec![Event::Play { channel: 0, note: 60, instrument: 1 }]
//! );
//! ```
pub mod framebuffer;
pub mod preview;
pub mod sequencer;
pub mod threads;
#[cfg(feature = "tracing")]
pub mod trace;

pub use framebuffer::Framebuffers;
pub use preview::preview;
pub use sequencer::{Event, Sequencer, SequencerConfig};
pub use threads::{Message, SequencerComms, SequencerThread};

pub use lang;
pub use surface;
pub use vm;
