//! Step-boundary gate: suppresses boundary markers around empty steps.
//!
//! The gate sits at the output side of a pipeline, after every
//! content-dropping stage, so its decisions are driven by what actually
//! survived. A `step-start` is buffered until the first content chunk of its
//! step arrives; if the step's content was filtered away entirely, both the
//! start and its matching `step-end` vanish.

use weft_types::Chunk;

/// Stateful filter pairing step boundary markers with surviving content.
#[derive(Debug, Default)]
pub struct StepGate {
    pending_start: Option<Chunk>,
    start_emitted: bool,
}

impl StepGate {
    /// Create a gate with no step in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one surviving chunk; returns the chunks to emit downstream,
    /// in order (zero, one, or two).
    pub fn push(&mut self, chunk: Chunk) -> Vec<Chunk> {
        match chunk {
            Chunk::StepStart => {
                if self.pending_start.is_some() {
                    tracing::debug!("dropping empty step with no end marker");
                }
                self.pending_start = Some(chunk);
                self.start_emitted = false;
                Vec::new()
            }
            Chunk::StepEnd => {
                let emitted = self.start_emitted;
                self.pending_start = None;
                self.start_emitted = false;
                if emitted { vec![chunk] } else { Vec::new() }
            }
            _ if chunk.is_meta() => vec![chunk],
            _ => match self.pending_start.take() {
                Some(start) => {
                    self.start_emitted = true;
                    vec![start, chunk]
                }
                None => vec![chunk],
            },
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
