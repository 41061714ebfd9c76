//! Track assembly: a builder for emitting bytecode by hand, and a small line-based
//! language compiled to the same bytes.
//!
//! ```text
//!     ticks 4          ; four idle ticks between notes
//! again:
//!     instrument 1
//!     play 60
//!     note 64
//!     jump again
//! ```
pub mod assemble;
pub mod builder;
pub mod compile;
pub mod generate;
pub mod parse;

pub use assemble::{assemble, AssembleError};
pub use builder::Assembler;
pub use compile::{compile, compile_padded};
pub use generate::generate;
pub use parse::parse;
