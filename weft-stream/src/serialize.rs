//! Part re-serialization: the inverse of assembly.
//!
//! Emits the minimal ordered chunk sequence representing a part, so that
//! transformed (or brand-new) parts can be spliced back into a chunk stream
//! indistinguishable in kind from the original wire format.

use weft_types::{Chunk, Part, StreamError, ToolPart, ToolState};

/// Synthesize a stream-unique part identifier.
///
/// Parts introduced by transforms have no chunk history to borrow an id
/// from, so one is minted here; v4 uuids keep ids unique across the whole
/// pipeline lifetime without shared state.
#[must_use]
pub fn fresh_id() -> String {
    format!("weft_{}", uuid::Uuid::new_v4())
}

/// Serialize one part into the chunk sequence that represents it.
///
/// Text and reasoning parts emit a start/delta/end triplet sharing one
/// synthesized id (the delta is omitted when the text is empty). Tool parts
/// re-use their stored call id and emit as far into the input/output
/// lifecycle as their state reached. Single-chunk kinds emit their one
/// chunk.
///
/// # Errors
///
/// [`StreamError::UnserializableType`] for [`Part::Unknown`]: there is no
/// safe chunk shape to invent for a kind this crate does not know.
pub fn serialize_part(part: &Part) -> Result<Vec<Chunk>, StreamError> {
    let chunks = match part {
        Part::Text { text, provider_metadata, .. } => {
            text_triplet(text, provider_metadata.clone(), false)
        }
        Part::Reasoning { text, provider_metadata, .. } => {
            text_triplet(text, provider_metadata.clone(), true)
        }
        Part::Tool(tool) => tool_chunks(tool),
        Part::File { url, media_type, provider_metadata } => vec![Chunk::File {
            url: url.clone(),
            media_type: media_type.clone(),
            provider_metadata: provider_metadata.clone(),
        }],
        Part::SourceUrl { source_id, url, title, provider_metadata } => vec![Chunk::SourceUrl {
            source_id: borrow_or_fresh(source_id),
            url: url.clone(),
            title: title.clone(),
            provider_metadata: provider_metadata.clone(),
        }],
        Part::SourceDocument { source_id, media_type, title, filename, provider_metadata } => {
            vec![Chunk::SourceDocument {
                source_id: borrow_or_fresh(source_id),
                media_type: media_type.clone(),
                title: title.clone(),
                filename: filename.clone(),
                provider_metadata: provider_metadata.clone(),
            }]
        }
        Part::Data { name, id, data } => vec![Chunk::Data {
            name: name.clone(),
            id: id.clone(),
            data: data.clone(),
        }],
        Part::StepStart => vec![Chunk::StepStart],
        Part::Unknown { kind, .. } => {
            return Err(StreamError::UnserializableType(kind.clone()));
        }
    };
    Ok(chunks)
}

fn borrow_or_fresh(id: &str) -> String {
    if id.is_empty() { fresh_id() } else { id.to_string() }
}

fn text_triplet(
    text: &str,
    provider_metadata: Option<serde_json::Value>,
    reasoning: bool,
) -> Vec<Chunk> {
    let id = fresh_id();
    let mut chunks = Vec::with_capacity(3);
    if reasoning {
        chunks.push(Chunk::reasoning_start(&id));
        if !text.is_empty() {
            chunks.push(Chunk::reasoning_delta(&id, text));
        }
        chunks.push(Chunk::ReasoningEnd { id, provider_metadata });
    } else {
        chunks.push(Chunk::text_start(&id));
        if !text.is_empty() {
            chunks.push(Chunk::text_delta(&id, text));
        }
        chunks.push(Chunk::TextEnd { id, provider_metadata });
    }
    chunks
}

fn tool_chunks(tool: &ToolPart) -> Vec<Chunk> {
    let tool_call_id = borrow_or_fresh(&tool.tool_call_id);
    let mut chunks = vec![Chunk::ToolInputStart {
        tool_call_id: tool_call_id.clone(),
        tool_name: tool.tool_name.clone(),
        dynamic: tool.dynamic,
        provider_executed: tool.provider_executed,
    }];

    let input_available = |chunks: &mut Vec<Chunk>| {
        chunks.push(Chunk::ToolInputAvailable {
            tool_call_id: tool_call_id.clone(),
            input: tool.input.clone().unwrap_or(serde_json::Value::Null),
            tool_name: None,
            dynamic: None,
            provider_executed: tool.provider_executed,
            provider_metadata: tool.provider_metadata.clone(),
        });
    };

    match tool.state {
        ToolState::InputStreaming => {}
        ToolState::InputAvailable => input_available(&mut chunks),
        ToolState::OutputAvailable => {
            input_available(&mut chunks);
            chunks.push(Chunk::ToolOutputAvailable {
                tool_call_id: tool_call_id.clone(),
                output: tool.output.clone().unwrap_or(serde_json::Value::Null),
                provider_executed: tool.provider_executed,
            });
        }
        ToolState::OutputError => {
            let error_text = tool.error_text.clone().unwrap_or_default();
            if tool.input.is_some() {
                input_available(&mut chunks);
                chunks.push(Chunk::ToolOutputError {
                    tool_call_id: tool_call_id.clone(),
                    error_text,
                    provider_executed: tool.provider_executed,
                });
            } else {
                // Without an input value there is no faithful
                // `tool-input-available` to emit; the error belongs to the
                // input phase.
                chunks.push(Chunk::ToolInputError {
                    tool_call_id: tool_call_id.clone(),
                    input: None,
                    error_text,
                    tool_name: None,
                    dynamic: None,
                });
            }
        }
    }
    chunks
}

// ─── Tests ───────────────────────────────────────────────────────────────────
