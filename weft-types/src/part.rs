//! Assembled message parts and the part-type vocabulary.

use std::fmt;

use serde_json::Value;

/// Lifecycle state of a text or reasoning part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextState {
    /// Deltas are still arriving.
    Streaming,
    /// The part's end chunk arrived and the text is final.
    Done,
}

/// Lifecycle state of a tool part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    /// Input fragments are still streaming.
    InputStreaming,
    /// The input is complete; the call awaits its output.
    InputAvailable,
    /// The call finished with an output. Terminal.
    OutputAvailable,
    /// The call failed (input or execution error). Terminal.
    OutputError,
}

/// An assembled tool invocation.
///
/// Covers both the `tool-<name>` and `dynamic-tool` part types; the
/// [`dynamic`](ToolPart::dynamic) flag selects between them.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPart {
    /// Opaque identifier correlating this call's chunks.
    pub tool_call_id: String,
    /// Resolved tool name.
    pub tool_name: String,
    /// Whether the tool was not statically declared.
    pub dynamic: bool,
    /// Whether the provider executes the tool server-side.
    pub provider_executed: Option<bool>,
    /// Where the call is in its lifecycle.
    pub state: ToolState,
    /// The parsed input, once available.
    pub input: Option<Value>,
    /// The output, once available.
    pub output: Option<Value>,
    /// Error text for the `output-error` state.
    pub error_text: Option<String>,
    /// Provider-specific metadata for the call.
    pub provider_metadata: Option<Value>,
}

impl ToolPart {
    /// The part-type string: `tool-<name>`, or `dynamic-tool`.
    #[must_use]
    pub fn type_name(&self) -> String {
        if self.dynamic {
            "dynamic-tool".to_string()
        } else {
            format!("tool-{}", self.tool_name)
        }
    }
}

/// One assembled logical unit of message content.
///
/// A part is built from one or more chunks and is immutable once sealed.
/// Parts produced by transforms need not have originated from chunks at all;
/// the serializer synthesizes fresh identifiers where needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Accumulated text content.
    Text {
        /// The text accumulated from deltas, concatenated without separators.
        text: String,
        /// Lifecycle state.
        state: TextState,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// Accumulated reasoning content.
    Reasoning {
        /// The reasoning text accumulated from deltas.
        text: String,
        /// Lifecycle state.
        state: TextState,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// A tool invocation.
    Tool(ToolPart),
    /// A generated file reference.
    File {
        /// Location of the file contents.
        url: String,
        /// Media type of the file.
        media_type: String,
        /// Provider-specific metadata.
        provider_metadata: Option<Value>,
    },
    /// A URL source reference.
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
    /// A document source reference.
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
    /// An application-defined data part.
    Data {
        /// The tag suffix: a `data-weather` part has name `"weather"`.
        name: String,
        /// Optional part id.
        id: Option<String>,
        /// The payload.
        data: Value,
    },
    /// Marks the beginning of one step in the assembled message.
    StepStart,
    /// A part assembled from a chunk whose wire type this crate does not
    /// recognize. Serializing it fails: there is no chunk shape to invent.
    Unknown {
        /// The unrecognized type tag.
        kind: String,
        /// The originating wire object.
        body: Value,
    },
}

impl Part {
    /// The part-type of this part.
    #[must_use]
    pub fn kind(&self) -> PartKind {
        match self {
            Part::Text { .. } => PartKind::Text,
            Part::Reasoning { .. } => PartKind::Reasoning,
            Part::Tool(tool) => PartKind::Tool {
                name: tool.tool_name.clone(),
                dynamic: tool.dynamic,
            },
            Part::File { .. } => PartKind::File,
            Part::SourceUrl { .. } => PartKind::SourceUrl,
            Part::SourceDocument { .. } => PartKind::SourceDocument,
            Part::Data { name, .. } => PartKind::Data { name: name.clone() },
            Part::StepStart => PartKind::StepStart,
            Part::Unknown { kind, .. } => PartKind::Unknown { kind: kind.clone() },
        }
    }

    /// The part-type string (`"text"`, `"tool-weather"`, `"data-chart"`, …).
    #[must_use]
    pub fn type_name(&self) -> String {
        self.kind().to_string()
    }

    /// The accumulated text, for text and reasoning parts.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } | Part::Reasoning { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The tool part, if this is one.
    #[must_use]
    pub fn as_tool(&self) -> Option<&ToolPart> {
        match self {
            Part::Tool(tool) => Some(tool),
            _ => None,
        }
    }
}

/// The part-type vocabulary: which logical part a content chunk belongs to.
///
/// Produced by the classifier for every content chunk and exposed on every
/// assembled [`Part`]. The `Display` impl yields the part-type string used on
/// the wire (`text`, `tool-<name>`, `dynamic-tool`, `data-<tag>`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// A text part.
    Text,
    /// A reasoning part.
    Reasoning,
    /// A tool part for the named tool.
    Tool {
        /// Resolved tool name.
        name: String,
        /// Whether the tool was not statically declared.
        dynamic: bool,
    },
    /// A generated file part.
    File,
    /// A URL source part.
    SourceUrl,
    /// A document source part.
    SourceDocument,
    /// An application-defined data part.
    Data {
        /// The tag suffix after `data-`.
        name: String,
    },
    /// A step-start part.
    StepStart,
    /// Fallback for chunks whose part-type cannot be resolved; carries the
    /// chunk's own wire tag.
    Unknown {
        /// The unresolved wire tag.
        kind: String,
    },
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Text => f.write_str("text"),
            PartKind::Reasoning => f.write_str("reasoning"),
            PartKind::Tool { dynamic: true, .. } => f.write_str("dynamic-tool"),
            PartKind::Tool { name, .. } => write!(f, "tool-{name}"),
            PartKind::File => f.write_str("file"),
            PartKind::SourceUrl => f.write_str("source-url"),
            PartKind::SourceDocument => f.write_str("source-document"),
            PartKind::Data { name } => write!(f, "data-{name}"),
            PartKind::StepStart => f.write_str("step-start"),
            PartKind::Unknown { kind } => f.write_str(kind),
        }
    }
}
