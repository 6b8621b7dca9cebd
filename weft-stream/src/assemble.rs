//! Part assembly: folds id-scoped chunk runs into sealed [`Part`]s.
//!
//! Open parts are keyed by `(kind family, id)`, never by stream position, so
//! chunks for unrelated parts may interleave freely without corrupting either
//! assembly. Protocol inconsistencies (a terminal chunk with no open part)
//! degrade to best-effort parts instead of failing; a lossy transport must
//! not take the pipeline down with it.

use weft_types::{Chunk, Part, TextState, ToolPart, ToolState};

use crate::classify::ToolTable;

/// Outcome of feeding one chunk to the assembler.
#[derive(Debug)]
pub enum Assembled {
    /// Message-level or boundary chunk that is not assembled; forward as-is.
    Passthrough(Chunk),
    /// The chunk advanced an in-progress part.
    Pending,
    /// The chunk sealed a part.
    Sealed(Part),
}

/// Key identifying one in-progress id-scoped chunk run.
///
/// The id spaces of the kind families are independent: a text part and a
/// tool call may share the literal id string without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PartKey {
    Text(String),
    Reasoning(String),
    Tool(String),
}

/// The run key of a multi-chunk content chunk, if it belongs to one.
pub(crate) fn part_key(chunk: &Chunk) -> Option<PartKey> {
    match chunk {
        Chunk::TextStart { id, .. } | Chunk::TextDelta { id, .. } | Chunk::TextEnd { id, .. } => {
            Some(PartKey::Text(id.clone()))
        }
        Chunk::ReasoningStart { id, .. }
        | Chunk::ReasoningDelta { id, .. }
        | Chunk::ReasoningEnd { id, .. } => Some(PartKey::Reasoning(id.clone())),
        Chunk::ToolInputStart { tool_call_id, .. }
        | Chunk::ToolInputDelta { tool_call_id, .. }
        | Chunk::ToolInputAvailable { tool_call_id, .. }
        | Chunk::ToolInputError { tool_call_id, .. }
        | Chunk::ToolOutputAvailable { tool_call_id, .. }
        | Chunk::ToolOutputError { tool_call_id, .. } => {
            Some(PartKey::Tool(tool_call_id.clone()))
        }
        _ => None,
    }
}

/// Whether this chunk seals the run it belongs to.
pub(crate) fn is_terminal(chunk: &Chunk) -> bool {
    matches!(
        chunk,
        Chunk::TextEnd { .. }
            | Chunk::ReasoningEnd { .. }
            | Chunk::ToolInputError { .. }
            | Chunk::ToolOutputAvailable { .. }
            | Chunk::ToolOutputError { .. }
    )
}

/// Folds a content-chunk stream into sealed [`Part`]s.
///
/// Multiple id-scoped runs may be open concurrently; each seals on its own
/// terminal chunk, in the relative order its chunks arrived. [`finish`]
/// flushes runs still open at end of stream, in arrival order.
///
/// [`finish`]: PartAssembler::finish
#[derive(Debug, Default)]
pub struct PartAssembler {
    tools: ToolTable,
    // Arrival-ordered; lookups are linear over the few concurrently-open runs.
    open: Vec<(PartKey, Part)>,
}

impl PartAssembler {
    /// Create an assembler with no open parts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, in arrival order.
    pub fn push(&mut self, chunk: Chunk) -> Assembled {
        match chunk {
            Chunk::Start { .. }
            | Chunk::Finish { .. }
            | Chunk::Abort
            | Chunk::MessageMetadata { .. }
            | Chunk::Error { .. }
            | Chunk::StepEnd => Assembled::Passthrough(chunk),

            Chunk::StepStart => Assembled::Sealed(Part::StepStart),

            Chunk::TextStart { id, provider_metadata } => {
                self.open_run(
                    PartKey::Text(id),
                    Part::Text { text: String::new(), state: TextState::Streaming, provider_metadata },
                );
                Assembled::Pending
            }
            Chunk::TextDelta { id, delta, .. } => {
                self.append_text(PartKey::Text(id), delta);
                Assembled::Pending
            }
            Chunk::TextEnd { id, provider_metadata } => {
                let part = match self.take(&PartKey::Text(id)) {
                    Some(Part::Text { text, provider_metadata: start_metadata, .. }) => Part::Text {
                        text,
                        state: TextState::Done,
                        provider_metadata: provider_metadata.or(start_metadata),
                    },
                    _ => {
                        tracing::debug!("text-end with no open text part; sealing empty");
                        Part::Text { text: String::new(), state: TextState::Done, provider_metadata }
                    }
                };
                Assembled::Sealed(part)
            }

            Chunk::ReasoningStart { id, provider_metadata } => {
                self.open_run(
                    PartKey::Reasoning(id),
                    Part::Reasoning {
                        text: String::new(),
                        state: TextState::Streaming,
                        provider_metadata,
                    },
                );
                Assembled::Pending
            }
            Chunk::ReasoningDelta { id, delta, .. } => {
                self.append_text(PartKey::Reasoning(id), delta);
                Assembled::Pending
            }
            Chunk::ReasoningEnd { id, provider_metadata } => {
                let part = match self.take(&PartKey::Reasoning(id)) {
                    Some(Part::Reasoning { text, provider_metadata: start_metadata, .. }) => {
                        Part::Reasoning {
                            text,
                            state: TextState::Done,
                            provider_metadata: provider_metadata.or(start_metadata),
                        }
                    }
                    _ => {
                        tracing::debug!("reasoning-end with no open reasoning part; sealing empty");
                        Part::Reasoning {
                            text: String::new(),
                            state: TextState::Done,
                            provider_metadata,
                        }
                    }
                };
                Assembled::Sealed(part)
            }

            Chunk::ToolInputStart { tool_call_id, tool_name, dynamic, provider_executed } => {
                self.tools.record(&tool_call_id, &tool_name, dynamic);
                let part = Part::Tool(ToolPart {
                    tool_call_id: tool_call_id.clone(),
                    tool_name,
                    dynamic,
                    provider_executed,
                    state: ToolState::InputStreaming,
                    input: None,
                    output: None,
                    error_text: None,
                    provider_metadata: None,
                });
                self.open_run(PartKey::Tool(tool_call_id), part);
                Assembled::Pending
            }
            Chunk::ToolInputDelta { tool_call_id, .. } => {
                // Raw fragments are surfaced to chunk-level observers only;
                // the sealed part carries the parsed input, not the text.
                if self.get(&PartKey::Tool(tool_call_id.clone())).is_none() {
                    tracing::debug!(%tool_call_id, "input delta for unopened call");
                    let part = self.orphan_tool(&tool_call_id, ToolState::InputStreaming);
                    self.open_run(PartKey::Tool(tool_call_id), Part::Tool(part));
                }
                Assembled::Pending
            }
            Chunk::ToolInputAvailable {
                tool_call_id,
                input,
                tool_name,
                dynamic,
                provider_executed,
                provider_metadata,
            } => {
                let key = PartKey::Tool(tool_call_id.clone());
                if let Some(pos) = self.position(&key) {
                    if let Part::Tool(tool) = &mut self.open[pos].1 {
                        tool.input = Some(input);
                        tool.state = ToolState::InputAvailable;
                        if provider_executed.is_some() {
                            tool.provider_executed = provider_executed;
                        }
                        if provider_metadata.is_some() {
                            tool.provider_metadata = provider_metadata;
                        }
                    }
                } else {
                    // Provider-executed calls may open with their input
                    // already complete.
                    let mut tool = self.orphan_tool(&tool_call_id, ToolState::InputAvailable);
                    if let Some(name) = tool_name {
                        tool.tool_name = name;
                        tool.dynamic = dynamic.unwrap_or(false);
                    }
                    tool.input = Some(input);
                    tool.provider_executed = provider_executed;
                    tool.provider_metadata = provider_metadata;
                    self.open_run(key, Part::Tool(tool));
                }
                Assembled::Pending
            }
            Chunk::ToolInputError { tool_call_id, input, error_text, tool_name, dynamic } => {
                let key = PartKey::Tool(tool_call_id.clone());
                let mut tool = match self.take(&key) {
                    Some(Part::Tool(tool)) => tool,
                    _ => {
                        tracing::debug!(%tool_call_id, "input error for unopened call");
                        let mut tool = self.orphan_tool(&tool_call_id, ToolState::OutputError);
                        if let Some(name) = tool_name {
                            tool.tool_name = name;
                            tool.dynamic = dynamic.unwrap_or(false);
                        }
                        tool
                    }
                };
                if input.is_some() {
                    tool.input = input;
                }
                tool.state = ToolState::OutputError;
                tool.error_text = Some(error_text);
                Assembled::Sealed(Part::Tool(tool))
            }
            Chunk::ToolOutputAvailable { tool_call_id, output, provider_executed } => {
                let mut tool = match self.take(&PartKey::Tool(tool_call_id.clone())) {
                    Some(Part::Tool(tool)) => tool,
                    _ => {
                        tracing::debug!(%tool_call_id, "output for unopened call; sealing best-effort");
                        self.orphan_tool(&tool_call_id, ToolState::OutputAvailable)
                    }
                };
                tool.output = Some(output);
                tool.state = ToolState::OutputAvailable;
                if provider_executed.is_some() {
                    tool.provider_executed = provider_executed;
                }
                Assembled::Sealed(Part::Tool(tool))
            }
            Chunk::ToolOutputError { tool_call_id, error_text, provider_executed } => {
                let mut tool = match self.take(&PartKey::Tool(tool_call_id.clone())) {
                    Some(Part::Tool(tool)) => tool,
                    _ => {
                        tracing::debug!(%tool_call_id, "output error for unopened call; sealing best-effort");
                        self.orphan_tool(&tool_call_id, ToolState::OutputError)
                    }
                };
                tool.state = ToolState::OutputError;
                tool.error_text = Some(error_text);
                if provider_executed.is_some() {
                    tool.provider_executed = provider_executed;
                }
                Assembled::Sealed(Part::Tool(tool))
            }

            Chunk::SourceUrl { source_id, url, title, provider_metadata } => Assembled::Sealed(
                Part::SourceUrl { source_id, url, title, provider_metadata },
            ),
            Chunk::SourceDocument { source_id, media_type, title, filename, provider_metadata } => {
                Assembled::Sealed(Part::SourceDocument {
                    source_id,
                    media_type,
                    title,
                    filename,
                    provider_metadata,
                })
            }
            Chunk::File { url, media_type, provider_metadata } => {
                Assembled::Sealed(Part::File { url, media_type, provider_metadata })
            }
            Chunk::Data { name, id, data } => Assembled::Sealed(Part::Data { name, id, data }),

            Chunk::Unknown { kind, body } => Assembled::Sealed(Part::Unknown { kind, body }),
        }
    }

    /// Flush runs still open at end of stream, in arrival order, sealed
    /// in whatever lifecycle state they reached.
    pub fn finish(&mut self) -> Vec<Part> {
        std::mem::take(&mut self.open).into_iter().map(|(_, part)| part).collect()
    }

    /// The in-progress part a chunk run is accumulating, if open.
    pub(crate) fn open_part(&self, key: &PartKey) -> Option<&Part> {
        self.get(key)
    }

    fn open_run(&mut self, key: PartKey, part: Part) {
        if let Some(pos) = self.open.iter().position(|(k, _)| k == &key) {
            tracing::debug!("duplicate start for an open run; replacing");
            self.open.remove(pos);
        }
        self.open.push((key, part));
    }

    fn append_text(&mut self, key: PartKey, delta: String) {
        if let Some(pos) = self.position(&key) {
            if let Part::Text { text, .. } | Part::Reasoning { text, .. } = &mut self.open[pos].1 {
                text.push_str(&delta);
            }
            return;
        }
        tracing::debug!("delta with no open run; opening best-effort");
        let part = match &key {
            PartKey::Reasoning(_) => Part::Reasoning {
                text: delta,
                state: TextState::Streaming,
                provider_metadata: None,
            },
            _ => Part::Text { text: delta, state: TextState::Streaming, provider_metadata: None },
        };
        self.open.push((key, part));
    }

    /// Best-effort tool part for a call id never opened by a
    /// `tool-input-start`; identity comes from the side-table when it can.
    fn orphan_tool(&self, tool_call_id: &str, state: ToolState) -> ToolPart {
        let identity = self.tools.lookup(tool_call_id);
        ToolPart {
            tool_call_id: tool_call_id.to_string(),
            tool_name: identity.map(|i| i.name.clone()).unwrap_or_default(),
            dynamic: identity.is_some_and(|i| i.dynamic),
            provider_executed: None,
            state,
            input: None,
            output: None,
            error_text: None,
            provider_metadata: None,
        }
    }

    fn get(&self, key: &PartKey) -> Option<&Part> {
        self.open.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    fn position(&self, key: &PartKey) -> Option<usize> {
        self.open.iter().position(|(k, _)| k == key)
    }

    fn take(&mut self, key: &PartKey) -> Option<Part> {
        self.position(key).map(|pos| self.open.remove(pos).1)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seal(assembler: &mut PartAssembler, chunks: Vec<Chunk>) -> Vec<Part> {
        let mut parts = Vec::new();
        for chunk in chunks {
            if let Assembled::Sealed(part) = assembler.push(chunk) {
                parts.push(part);
            }
        }
        parts
    }

    #[test]
    fn text_triplet_assembles_by_concatenation() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![
                Chunk::text_start("t1"),
                Chunk::text_delta("t1", "Hel"),
                Chunk::text_delta("t1", "lo"),
                Chunk::text_end("t1"),
            ],
        );
        assert_eq!(
            parts,
            vec![Part::Text { text: "Hello".into(), state: TextState::Done, provider_metadata: None }]
        );
    }

    #[test]
    fn tool_lifecycle_seals_on_output() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![
                Chunk::ToolInputStart {
                    tool_call_id: "call_9".into(),
                    tool_name: "weather".into(),
                    dynamic: false,
                    provider_executed: None,
                },
                Chunk::ToolInputDelta {
                    tool_call_id: "call_9".into(),
                    input_text_delta: r#"{"location""#.into(),
                },
                Chunk::ToolInputAvailable {
                    tool_call_id: "call_9".into(),
                    input: json!({"location": "NYC"}),
                    tool_name: None,
                    dynamic: None,
                    provider_executed: None,
                    provider_metadata: None,
                },
                Chunk::ToolOutputAvailable {
                    tool_call_id: "call_9".into(),
                    output: json!({"temp": 65}),
                    provider_executed: None,
                },
            ],
        );
        assert_eq!(parts.len(), 1);
        let tool = parts[0].as_tool().unwrap();
        assert_eq!(tool.tool_name, "weather");
        assert_eq!(tool.state, ToolState::OutputAvailable);
        assert_eq!(tool.input, Some(json!({"location": "NYC"})));
        assert_eq!(tool.output, Some(json!({"temp": 65})));
    }

    #[test]
    fn input_error_seals_immediately_as_output_error() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![
                Chunk::ToolInputStart {
                    tool_call_id: "call_1".into(),
                    tool_name: "search".into(),
                    dynamic: false,
                    provider_executed: None,
                },
                Chunk::ToolInputError {
                    tool_call_id: "call_1".into(),
                    input: None,
                    error_text: "bad json".into(),
                    tool_name: None,
                    dynamic: None,
                },
            ],
        );
        assert_eq!(parts.len(), 1);
        let tool = parts[0].as_tool().unwrap();
        assert_eq!(tool.state, ToolState::OutputError);
        assert_eq!(tool.error_text.as_deref(), Some("bad json"));
    }

    #[test]
    fn interleaved_runs_assemble_independently() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![
                Chunk::text_start("a"),
                Chunk::reasoning_start("b"),
                Chunk::text_delta("a", "A1"),
                Chunk::reasoning_delta("b", "B1"),
                Chunk::text_delta("a", "A2"),
                Chunk::reasoning_end("b"),
                Chunk::text_end("a"),
            ],
        );
        assert_eq!(
            parts,
            vec![
                Part::Reasoning {
                    text: "B1".into(),
                    state: TextState::Done,
                    provider_metadata: None
                },
                Part::Text { text: "A1A2".into(), state: TextState::Done, provider_metadata: None },
            ]
        );
    }

    #[test]
    fn data_chunk_between_tool_chunks_does_not_disturb_the_call() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![
                Chunk::ToolInputStart {
                    tool_call_id: "call_9".into(),
                    tool_name: "weather".into(),
                    dynamic: false,
                    provider_executed: None,
                },
                Chunk::ToolInputDelta {
                    tool_call_id: "call_9".into(),
                    input_text_delta: "{".into(),
                },
                Chunk::Data { name: "weather".into(), id: None, data: json!({"eta": 2}) },
                Chunk::ToolInputAvailable {
                    tool_call_id: "call_9".into(),
                    input: json!({}),
                    tool_name: None,
                    dynamic: None,
                    provider_executed: None,
                    provider_metadata: None,
                },
                Chunk::ToolOutputAvailable {
                    tool_call_id: "call_9".into(),
                    output: json!({"temp": 65}),
                    provider_executed: None,
                },
            ],
        );
        // The data part seals first (single chunk); the tool part seals on
        // its own terminal chunk, with the tool's identity, not the data tag.
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], Part::Data { name, .. } if name == "weather"));
        let tool = parts[1].as_tool().unwrap();
        assert_eq!(tool.tool_name, "weather");
        assert_eq!(tool.state, ToolState::OutputAvailable);
    }

    #[test]
    fn orphan_terminal_chunk_seals_best_effort() {
        let mut assembler = PartAssembler::new();
        let parts = seal(
            &mut assembler,
            vec![Chunk::ToolOutputAvailable {
                tool_call_id: "ghost".into(),
                output: json!(42),
                provider_executed: None,
            }],
        );
        assert_eq!(parts.len(), 1);
        let tool = parts[0].as_tool().unwrap();
        assert_eq!(tool.tool_call_id, "ghost");
        assert_eq!(tool.output, Some(json!(42)));
        assert_eq!(tool.state, ToolState::OutputAvailable);
    }

    #[test]
    fn step_start_seals_as_a_part_and_step_end_passes_through() {
        let mut assembler = PartAssembler::new();
        assert!(matches!(
            assembler.push(Chunk::StepStart),
            Assembled::Sealed(Part::StepStart)
        ));
        assert!(matches!(
            assembler.push(Chunk::StepEnd),
            Assembled::Passthrough(Chunk::StepEnd)
        ));
    }

    #[test]
    fn finish_flushes_open_runs_in_arrival_order() {
        let mut assembler = PartAssembler::new();
        assembler.push(Chunk::text_start("t1"));
        assembler.push(Chunk::ToolInputStart {
            tool_call_id: "call_1".into(),
            tool_name: "search".into(),
            dynamic: false,
            provider_executed: None,
        });
        assembler.push(Chunk::text_delta("t1", "partial"));

        let parts = assembler.finish();
        assert_eq!(parts.len(), 2);
        assert!(
            matches!(&parts[0], Part::Text { text, state: TextState::Streaming, .. } if text == "partial")
        );
        assert_eq!(parts[1].as_tool().unwrap().state, ToolState::InputStreaming);
        assert!(assembler.finish().is_empty());
    }
}
