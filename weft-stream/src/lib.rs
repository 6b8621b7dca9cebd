#![doc = include_str!("../README.md")]

pub mod assemble;
pub mod classify;
pub mod gate;
pub mod pipeline;
pub mod serialize;

pub use assemble::{Assembled, PartAssembler};
pub use classify::{Classification, ToolIdentity, ToolTable, classify};
pub use gate::StepGate;
pub use pipeline::{ChunkPipeline, ChunkStream, PartPipeline, PartStream, PartView, SubChain};
pub use serialize::{fresh_id, serialize_part};
