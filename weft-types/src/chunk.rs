//! Wire-level chunk types for the streaming UI message protocol.

use serde_json::Value;

/// One wire-level fragment of a streaming UI message.
///
/// Chunks come in three families: *meta* chunks carry message-level
/// information and never belong to a part; *step boundary* chunks demarcate
/// one turn of part production and carry no content; *content* chunks belong
/// to exactly one logical part, identified by the chunk's id field (text and
/// reasoning `id`, tool `tool_call_id`, source `source_id`).
///
/// The [`Unknown`](Chunk::Unknown) variant is produced only by the wire
/// decoder when it meets a type tag this crate does not know. It passes
/// through chunk-level processing untouched so a newer peer's chunks are not
/// lost in transit.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Message start. First chunk of a stream.
    Start {
        /// Server-assigned message identifier, if any.
        message_id: Option<String>,
        /// Message-level metadata attached at the start of the stream.
        message_metadata: Option<Value>,
    },
    /// Message finish. Last chunk of a normally-terminated stream.
    Finish {
        /// Message-level metadata attached at the end of the stream.
        message_metadata: Option<Value>,
    },
    /// The producer aborted the message before finishing it.
    Abort,
    /// Standalone message-metadata update.
    MessageMetadata {
        /// The metadata value. Merged into the message by consumers.
        message_metadata: Value,
    },
    /// A message-level error reported by the producer.
    Error {
        /// Human-readable error text.
        error_text: String,
    },

    /// Opens one step (one turn of part production).
    StepStart,
    /// Closes the step opened by the matching [`StepStart`](Chunk::StepStart).
    StepEnd,

    /// Opens a text part.
    TextStart {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// Appends a text fragment to the text part with the same `id`.
    TextDelta {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// The text fragment. Concatenated without separators.
        delta: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// Seals the text part with the same `id`.
    TextEnd {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },

    /// Opens a reasoning part.
    ReasoningStart {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// Appends a reasoning fragment to the reasoning part with the same `id`.
    ReasoningDelta {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// The reasoning fragment. Concatenated without separators.
        delta: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// Seals the reasoning part with the same `id`.
    ReasoningEnd {
        /// Part id correlating the start/delta/end triplet.
        id: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },

    /// Opens a tool call. The only chunk that names the tool; later chunks
    /// carry the call id alone.
    ToolInputStart {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// Name of the tool being invoked.
        tool_name: String,
        /// Whether the tool was not statically declared ("dynamic").
        dynamic: bool,
        /// Whether the provider executes the tool server-side.
        provider_executed: Option<bool>,
    },
    /// A raw fragment of the tool input JSON being streamed.
    ToolInputDelta {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// The raw input text fragment.
        input_text_delta: String,
    },
    /// The tool input is complete and parsed.
    ToolInputAvailable {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// The parsed input value.
        input: Value,
        /// Tool name, repeated for consumers that missed the start chunk.
        tool_name: Option<String>,
        /// Dynamic flag, repeated for consumers that missed the start chunk.
        dynamic: Option<bool>,
        /// Whether the provider executes the tool server-side.
        provider_executed: Option<bool>,
        /// Provider-specific metadata for the call.
        provider_metadata: Option<Value>,
    },
    /// The tool input could not be produced or parsed. Terminal.
    ToolInputError {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// Whatever input value was recovered, if any.
        input: Option<Value>,
        /// Human-readable error text.
        error_text: String,
        /// Tool name, repeated for consumers that missed the start chunk.
        tool_name: Option<String>,
        /// Dynamic flag, repeated for consumers that missed the start chunk.
        dynamic: Option<bool>,
    },
    /// The tool produced its output. Terminal.
    ToolOutputAvailable {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// The tool's output value.
        output: Value,
        /// Whether the provider executed the tool server-side.
        provider_executed: Option<bool>,
    },
    /// The tool execution failed. Terminal.
    ToolOutputError {
        /// Opaque identifier correlating this call's chunks.
        tool_call_id: String,
        /// Human-readable error text.
        error_text: String,
        /// Whether the provider executed the tool server-side.
        provider_executed: Option<bool>,
    },

    /// A URL source reference. One chunk, one part.
    SourceUrl {
        /// Source identifier.
        source_id: String,
        /// The referenced URL.
        url: String,
        /// Optional human-readable title.
        title: Option<String>,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// A document source reference. One chunk, one part.
    SourceDocument {
        /// Source identifier.
        source_id: String,
        /// Media type of the document.
        media_type: String,
        /// Human-readable title.
        title: String,
        /// Optional filename.
        filename: Option<String>,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// A generated file reference. One chunk, one part.
    File {
        /// Location of the file contents.
        url: String,
        /// Media type of the file.
        media_type: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// An application-defined `data-<name>` chunk. One chunk, one part.
    Data {
        /// The tag suffix: a `data-weather` chunk has name `"weather"`.
        name: String,
        /// Optional part id (lets producers overwrite a prior data part).
        id: Option<String>,
        /// The payload.
        data: Value,
    },

    /// A chunk whose wire type tag this crate does not recognize.
    Unknown {
        /// The unrecognized type tag.
        kind: String,
        /// The full wire object, preserved for pass-through.
        body: Value,
    },
}

impl Chunk {
    /// The wire type tag of this chunk (`"text-delta"`, `"data-weather"`, …).
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            Chunk::Start { .. } => "start".into(),
            Chunk::Finish { .. } => "finish".into(),
            Chunk::Abort => "abort".into(),
            Chunk::MessageMetadata { .. } => "message-metadata".into(),
            Chunk::Error { .. } => "error".into(),
            Chunk::StepStart => "step-start".into(),
            Chunk::StepEnd => "step-end".into(),
            Chunk::TextStart { .. } => "text-start".into(),
            Chunk::TextDelta { .. } => "text-delta".into(),
            Chunk::TextEnd { .. } => "text-end".into(),
            Chunk::ReasoningStart { .. } => "reasoning-start".into(),
            Chunk::ReasoningDelta { .. } => "reasoning-delta".into(),
            Chunk::ReasoningEnd { .. } => "reasoning-end".into(),
            Chunk::ToolInputStart { .. } => "tool-input-start".into(),
            Chunk::ToolInputDelta { .. } => "tool-input-delta".into(),
            Chunk::ToolInputAvailable { .. } => "tool-input-available".into(),
            Chunk::ToolInputError { .. } => "tool-input-error".into(),
            Chunk::ToolOutputAvailable { .. } => "tool-output-available".into(),
            Chunk::ToolOutputError { .. } => "tool-output-error".into(),
            Chunk::SourceUrl { .. } => "source-url".into(),
            Chunk::SourceDocument { .. } => "source-document".into(),
            Chunk::File { .. } => "file".into(),
            Chunk::Data { name, .. } => format!("data-{name}"),
            Chunk::Unknown { kind, .. } => kind.clone(),
        }
    }

    /// Whether this chunk carries message-level (not part-level) information.
    #[must_use]
    pub fn is_meta(&self) -> bool {
        matches!(
            self,
            Chunk::Start { .. }
                | Chunk::Finish { .. }
                | Chunk::Abort
                | Chunk::MessageMetadata { .. }
                | Chunk::Error { .. }
        )
    }

    /// Whether this chunk is a step boundary marker.
    #[must_use]
    pub fn is_step_boundary(&self) -> bool {
        matches!(self, Chunk::StepStart | Chunk::StepEnd)
    }

    /// The id scoping this chunk to its part, if it has one.
    #[must_use]
    pub fn part_id(&self) -> Option<&str> {
        match self {
            Chunk::TextStart { id, .. }
            | Chunk::TextDelta { id, .. }
            | Chunk::TextEnd { id, .. }
            | Chunk::ReasoningStart { id, .. }
            | Chunk::ReasoningDelta { id, .. }
            | Chunk::ReasoningEnd { id, .. } => Some(id),
            Chunk::ToolInputStart { tool_call_id, .. }
            | Chunk::ToolInputDelta { tool_call_id, .. }
            | Chunk::ToolInputAvailable { tool_call_id, .. }
            | Chunk::ToolInputError { tool_call_id, .. }
            | Chunk::ToolOutputAvailable { tool_call_id, .. }
            | Chunk::ToolOutputError { tool_call_id, .. } => Some(tool_call_id),
            Chunk::SourceUrl { source_id, .. } | Chunk::SourceDocument { source_id, .. } => {
                Some(source_id)
            }
            Chunk::Data { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Create a `text-start` chunk with no provider metadata.
    #[must_use]
    pub fn text_start(id: impl Into<String>) -> Self {
        Chunk::TextStart { id: id.into(), provider_metadata: None }
    }

    /// Create a `text-delta` chunk with no provider metadata.
    #[must_use]
    pub fn text_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Chunk::TextDelta { id: id.into(), delta: delta.into(), provider_metadata: None }
    }

    /// Create a `text-end` chunk with no provider metadata.
    #[must_use]
    pub fn text_end(id: impl Into<String>) -> Self {
        Chunk::TextEnd { id: id.into(), provider_metadata: None }
    }

    /// Create a `reasoning-start` chunk with no provider metadata.
    #[must_use]
    pub fn reasoning_start(id: impl Into<String>) -> Self {
        Chunk::ReasoningStart { id: id.into(), provider_metadata: None }
    }

    /// Create a `reasoning-delta` chunk with no provider metadata.
    #[must_use]
    pub fn reasoning_delta(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Chunk::ReasoningDelta { id: id.into(), delta: delta.into(), provider_metadata: None }
    }

    /// Create a `reasoning-end` chunk with no provider metadata.
    #[must_use]
    pub fn reasoning_end(id: impl Into<String>) -> Self {
        Chunk::ReasoningEnd { id: id.into(), provider_metadata: None }
    }
}
