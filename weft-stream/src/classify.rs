//! Chunk classification and the tool-call side-table.
//!
//! Most content chunks name their part kind directly. Tool chunks after
//! `tool-input-start` carry only the opaque call id, so classification keeps
//! a side-table mapping call id to tool identity. The table is written once
//! per call, on its `tool-input-start` chunk, and only read afterwards.

use std::collections::HashMap;

use weft_types::{Chunk, PartKind};

/// Identity of a tool call, captured from its `tool-input-start` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolIdentity {
    /// The tool name.
    pub name: String,
    /// Whether the tool was not statically declared.
    pub dynamic: bool,
}

/// Side-table mapping call ids to tool identities.
///
/// Scoped to one pipeline instance; never shared across pipelines. Entries
/// are first-write-wins: a call id is recorded once and later writes for the
/// same id are ignored.
#[derive(Debug, Default)]
pub struct ToolTable {
    entries: HashMap<String, ToolIdentity>,
}

impl ToolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call's identity. First write wins.
    pub fn record(&mut self, tool_call_id: &str, name: &str, dynamic: bool) {
        self.entries
            .entry(tool_call_id.to_string())
            .or_insert_with(|| ToolIdentity { name: name.to_string(), dynamic });
    }

    /// Look up a call's identity.
    #[must_use]
    pub fn lookup(&self, tool_call_id: &str) -> Option<&ToolIdentity> {
        self.entries.get(tool_call_id)
    }
}

/// What a chunk is, from the part state machine's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Message-level chunk; passes through untouched, never assembled.
    Meta,
    /// Step boundary marker; no content of its own.
    StepBoundary,
    /// Content chunk belonging to a part of the given kind.
    Content(PartKind),
}

/// Classify one chunk, resolving tool chunks through `tools`.
///
/// The only side effect is recording the tool identity when the chunk is a
/// `tool-input-start`. Tool chunks whose call id is not in the table resolve
/// from their own fields when they have them; otherwise they classify as an
/// unknown part-type equal to the chunk's wire tag. Never fails.
pub fn classify(chunk: &Chunk, tools: &mut ToolTable) -> Classification {
    match chunk {
        Chunk::Start { .. }
        | Chunk::Finish { .. }
        | Chunk::Abort
        | Chunk::MessageMetadata { .. }
        | Chunk::Error { .. } => Classification::Meta,

        Chunk::StepStart | Chunk::StepEnd => Classification::StepBoundary,

        Chunk::TextStart { .. } | Chunk::TextDelta { .. } | Chunk::TextEnd { .. } => {
            Classification::Content(PartKind::Text)
        }
        Chunk::ReasoningStart { .. }
        | Chunk::ReasoningDelta { .. }
        | Chunk::ReasoningEnd { .. } => Classification::Content(PartKind::Reasoning),

        Chunk::ToolInputStart { tool_call_id, tool_name, dynamic, .. } => {
            tools.record(tool_call_id, tool_name, *dynamic);
            Classification::Content(PartKind::Tool { name: tool_name.clone(), dynamic: *dynamic })
        }
        Chunk::ToolInputAvailable { tool_call_id, tool_name, dynamic, .. }
        | Chunk::ToolInputError { tool_call_id, tool_name, dynamic, .. } => {
            Classification::Content(resolve_tool(
                tools,
                tool_call_id,
                tool_name.as_deref(),
                *dynamic,
                &chunk.kind(),
            ))
        }
        Chunk::ToolInputDelta { tool_call_id, .. }
        | Chunk::ToolOutputAvailable { tool_call_id, .. }
        | Chunk::ToolOutputError { tool_call_id, .. } => {
            Classification::Content(resolve_tool(tools, tool_call_id, None, None, &chunk.kind()))
        }

        Chunk::SourceUrl { .. } => Classification::Content(PartKind::SourceUrl),
        Chunk::SourceDocument { .. } => Classification::Content(PartKind::SourceDocument),
        Chunk::File { .. } => Classification::Content(PartKind::File),
        Chunk::Data { name, .. } => {
            Classification::Content(PartKind::Data { name: name.clone() })
        }
        Chunk::Unknown { kind, .. } => {
            Classification::Content(PartKind::Unknown { kind: kind.clone() })
        }
    }
}

/// Resolve a tool chunk that may only carry its call id.
///
/// Order: side-table entry, then the chunk's own fields, then the unknown
/// fallback carrying the chunk's wire tag.
fn resolve_tool(
    tools: &ToolTable,
    tool_call_id: &str,
    chunk_tool_name: Option<&str>,
    chunk_dynamic: Option<bool>,
    chunk_kind: &str,
) -> PartKind {
    if let Some(identity) = tools.lookup(tool_call_id) {
        return PartKind::Tool { name: identity.name.clone(), dynamic: identity.dynamic };
    }
    if let Some(name) = chunk_tool_name {
        return PartKind::Tool {
            name: name.to_string(),
            dynamic: chunk_dynamic.unwrap_or(false),
        };
    }
    tracing::debug!(tool_call_id, chunk_kind, "tool chunk with unresolvable call id");
    PartKind::Unknown { kind: chunk_kind.to_string() }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weft_types::Chunk;

    use super::*;

    #[test]
    fn meta_and_boundary_chunks() {
        let mut tools = ToolTable::new();
        assert_eq!(
            classify(&Chunk::Start { message_id: None, message_metadata: None }, &mut tools),
            Classification::Meta
        );
        assert_eq!(classify(&Chunk::StepStart, &mut tools), Classification::StepBoundary);
        assert_eq!(classify(&Chunk::StepEnd, &mut tools), Classification::StepBoundary);
    }

    #[test]
    fn tool_chunks_resolve_through_the_table() {
        let mut tools = ToolTable::new();
        let start = Chunk::ToolInputStart {
            tool_call_id: "call_1".into(),
            tool_name: "weather".into(),
            dynamic: false,
            provider_executed: None,
        };
        let expected = PartKind::Tool { name: "weather".into(), dynamic: false };
        assert_eq!(classify(&start, &mut tools), Classification::Content(expected.clone()));

        // Later chunks carry only the call id.
        let delta = Chunk::ToolInputDelta {
            tool_call_id: "call_1".into(),
            input_text_delta: "{".into(),
        };
        assert_eq!(classify(&delta, &mut tools), Classification::Content(expected.clone()));

        let output = Chunk::ToolOutputAvailable {
            tool_call_id: "call_1".into(),
            output: json!({"temp": 65}),
            provider_executed: None,
        };
        assert_eq!(classify(&output, &mut tools), Classification::Content(expected));
    }

    #[test]
    fn table_entries_are_write_once() {
        let mut tools = ToolTable::new();
        tools.record("call_1", "weather", false);
        tools.record("call_1", "other", true);
        assert_eq!(
            tools.lookup("call_1"),
            Some(&ToolIdentity { name: "weather".into(), dynamic: false })
        );
    }

    #[test]
    fn orphan_tool_chunk_falls_back_to_its_own_fields() {
        let mut tools = ToolTable::new();
        let available = Chunk::ToolInputAvailable {
            tool_call_id: "call_9".into(),
            input: json!({}),
            tool_name: Some("search".into()),
            dynamic: Some(true),
            provider_executed: None,
            provider_metadata: None,
        };
        assert_eq!(
            classify(&available, &mut tools),
            Classification::Content(PartKind::Tool { name: "search".into(), dynamic: true })
        );
    }

    #[test]
    fn orphan_tool_chunk_without_fields_becomes_its_own_tag() {
        let mut tools = ToolTable::new();
        let output = Chunk::ToolOutputAvailable {
            tool_call_id: "nope".into(),
            output: json!(null),
            provider_executed: None,
        };
        assert_eq!(
            classify(&output, &mut tools),
            Classification::Content(PartKind::Unknown { kind: "tool-output-available".into() })
        );
    }

    #[test]
    fn data_chunks_carry_their_tag_suffix() {
        let mut tools = ToolTable::new();
        let data = Chunk::Data { name: "weather".into(), id: None, data: json!(1) };
        assert_eq!(
            classify(&data, &mut tools),
            Classification::Content(PartKind::Data { name: "weather".into() })
        );
    }
}
