#![doc = include_str!("../README.md")]

pub mod chunk;
pub mod error;
pub mod part;
pub mod wire;

pub use chunk::Chunk;
pub use error::{StreamError, WireError};
pub use part::{Part, PartKind, TextState, ToolPart, ToolState};
