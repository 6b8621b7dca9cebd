//! JSON wire codec for [`Chunk`] and [`Part`].
//!
//! The protocol uses kebab-case `type` tags and camelCase field names, with
//! two open-ended tag families (`data-<tag>` chunks and parts,
//! `tool-<name>` parts) that a derived tagged enum cannot express, so the
//! codec is hand-rolled over [`serde_json::Value`]. Optional fields are
//! omitted when absent and `dynamic: true` is emitted only when set, keeping
//! the output structurally identical to the upstream protocol.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::chunk::Chunk;
use crate::error::WireError;
use crate::part::{Part, TextState, ToolPart, ToolState};

// ─── Encoding helpers ────────────────────────────────────────────────────────

fn tagged(kind: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(kind.to_string()));
    map
}

fn put_str(map: &mut Map<String, Value>, key: &str, value: &str) {
    map.insert(key.to_string(), Value::String(value.to_string()));
}

fn put_opt_str(map: &mut Map<String, Value>, key: &str, value: Option<&String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

fn put_value(map: &mut Map<String, Value>, key: &str, value: &Value) {
    map.insert(key.to_string(), value.clone());
}

fn put_opt_value(map: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.clone());
    }
}

fn put_opt_bool(map: &mut Map<String, Value>, key: &str, value: Option<bool>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::Bool(v));
    }
}

// ─── Decoding helpers ────────────────────────────────────────────────────────

fn as_object(value: &Value) -> Result<&Map<String, Value>, WireError> {
    value
        .as_object()
        .ok_or_else(|| WireError::Malformed("expected a JSON object".to_string()))
}

fn tag_of<'m>(obj: &'m Map<String, Value>) -> Result<&'m str, WireError> {
    obj.get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WireError::Malformed("missing `type` tag".to_string()))
}

fn required_str(
    obj: &Map<String, Value>,
    kind: &str,
    field: &'static str,
) -> Result<String, WireError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WireError::MissingField { kind: kind.to_string(), field })
}

fn required_value(
    obj: &Map<String, Value>,
    kind: &str,
    field: &'static str,
) -> Result<Value, WireError> {
    obj.get(field)
        .cloned()
        .ok_or_else(|| WireError::MissingField { kind: kind.to_string(), field })
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn optional_value(obj: &Map<String, Value>, field: &str) -> Option<Value> {
    obj.get(field).filter(|v| !v.is_null()).cloned()
}

fn optional_bool(obj: &Map<String, Value>, field: &str) -> Option<bool> {
    obj.get(field).and_then(Value::as_bool)
}

// ─── Chunk codec ─────────────────────────────────────────────────────────────

impl Chunk {
    /// Encode this chunk as its JSON wire object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map = match self {
            Chunk::Start { message_id, message_metadata } => {
                let mut m = tagged("start");
                put_opt_str(&mut m, "messageId", message_id.as_ref());
                put_opt_value(&mut m, "messageMetadata", message_metadata.as_ref());
                m
            }
            Chunk::Finish { message_metadata } => {
                let mut m = tagged("finish");
                put_opt_value(&mut m, "messageMetadata", message_metadata.as_ref());
                m
            }
            Chunk::Abort => tagged("abort"),
            Chunk::MessageMetadata { message_metadata } => {
                let mut m = tagged("message-metadata");
                put_value(&mut m, "messageMetadata", message_metadata);
                m
            }
            Chunk::Error { error_text } => {
                let mut m = tagged("error");
                put_str(&mut m, "errorText", error_text);
                m
            }
            Chunk::StepStart => tagged("step-start"),
            Chunk::StepEnd => tagged("step-end"),
            Chunk::TextStart { id, provider_metadata } => {
                triplet_chunk("text-start", id, None, provider_metadata.as_ref())
            }
            Chunk::TextDelta { id, delta, provider_metadata } => {
                triplet_chunk("text-delta", id, Some(delta), provider_metadata.as_ref())
            }
            Chunk::TextEnd { id, provider_metadata } => {
                triplet_chunk("text-end", id, None, provider_metadata.as_ref())
            }
            Chunk::ReasoningStart { id, provider_metadata } => {
                triplet_chunk("reasoning-start", id, None, provider_metadata.as_ref())
            }
            Chunk::ReasoningDelta { id, delta, provider_metadata } => {
                triplet_chunk("reasoning-delta", id, Some(delta), provider_metadata.as_ref())
            }
            Chunk::ReasoningEnd { id, provider_metadata } => {
                triplet_chunk("reasoning-end", id, None, provider_metadata.as_ref())
            }
            Chunk::ToolInputStart { tool_call_id, tool_name, dynamic, provider_executed } => {
                let mut m = tagged("tool-input-start");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_str(&mut m, "toolName", tool_name);
                if *dynamic {
                    m.insert("dynamic".to_string(), Value::Bool(true));
                }
                put_opt_bool(&mut m, "providerExecuted", *provider_executed);
                m
            }
            Chunk::ToolInputDelta { tool_call_id, input_text_delta } => {
                let mut m = tagged("tool-input-delta");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_str(&mut m, "inputTextDelta", input_text_delta);
                m
            }
            Chunk::ToolInputAvailable {
                tool_call_id,
                input,
                tool_name,
                dynamic,
                provider_executed,
                provider_metadata,
            } => {
                let mut m = tagged("tool-input-available");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_value(&mut m, "input", input);
                put_opt_str(&mut m, "toolName", tool_name.as_ref());
                put_opt_bool(&mut m, "dynamic", *dynamic);
                put_opt_bool(&mut m, "providerExecuted", *provider_executed);
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Chunk::ToolInputError { tool_call_id, input, error_text, tool_name, dynamic } => {
                let mut m = tagged("tool-input-error");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_opt_value(&mut m, "input", input.as_ref());
                put_str(&mut m, "errorText", error_text);
                put_opt_str(&mut m, "toolName", tool_name.as_ref());
                put_opt_bool(&mut m, "dynamic", *dynamic);
                m
            }
            Chunk::ToolOutputAvailable { tool_call_id, output, provider_executed } => {
                let mut m = tagged("tool-output-available");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_value(&mut m, "output", output);
                put_opt_bool(&mut m, "providerExecuted", *provider_executed);
                m
            }
            Chunk::ToolOutputError { tool_call_id, error_text, provider_executed } => {
                let mut m = tagged("tool-output-error");
                put_str(&mut m, "toolCallId", tool_call_id);
                put_str(&mut m, "errorText", error_text);
                put_opt_bool(&mut m, "providerExecuted", *provider_executed);
                m
            }
            Chunk::SourceUrl { source_id, url, title, provider_metadata } => {
                let mut m = tagged("source-url");
                put_str(&mut m, "sourceId", source_id);
                put_str(&mut m, "url", url);
                put_opt_str(&mut m, "title", title.as_ref());
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Chunk::SourceDocument { source_id, media_type, title, filename, provider_metadata } => {
                let mut m = tagged("source-document");
                put_str(&mut m, "sourceId", source_id);
                put_str(&mut m, "mediaType", media_type);
                put_str(&mut m, "title", title);
                put_opt_str(&mut m, "filename", filename.as_ref());
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Chunk::File { url, media_type, provider_metadata } => {
                let mut m = tagged("file");
                put_str(&mut m, "url", url);
                put_str(&mut m, "mediaType", media_type);
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Chunk::Data { name, id, data } => {
                let mut m = tagged(&format!("data-{name}"));
                put_opt_str(&mut m, "id", id.as_ref());
                put_value(&mut m, "data", data);
                m
            }
            Chunk::Unknown { body, .. } => return body.clone(),
        };
        Value::Object(map)
    }

    /// Decode a chunk from its JSON wire object.
    ///
    /// An unrecognized `type` tag yields [`Chunk::Unknown`], not an error;
    /// missing required fields on a recognized tag are decode errors.
    pub fn from_value(value: &Value) -> Result<Self, WireError> {
        let obj = as_object(value)?;
        let kind = tag_of(obj)?;

        let chunk = match kind {
            "start" => Chunk::Start {
                message_id: optional_str(obj, "messageId"),
                message_metadata: optional_value(obj, "messageMetadata"),
            },
            "finish" => Chunk::Finish {
                message_metadata: optional_value(obj, "messageMetadata"),
            },
            "abort" => Chunk::Abort,
            "message-metadata" => Chunk::MessageMetadata {
                message_metadata: required_value(obj, kind, "messageMetadata")?,
            },
            "error" => Chunk::Error {
                error_text: required_str(obj, kind, "errorText")?,
            },
            "step-start" => Chunk::StepStart,
            "step-end" => Chunk::StepEnd,
            "text-start" => Chunk::TextStart {
                id: required_str(obj, kind, "id")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "text-delta" => Chunk::TextDelta {
                id: required_str(obj, kind, "id")?,
                delta: required_str(obj, kind, "delta")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "text-end" => Chunk::TextEnd {
                id: required_str(obj, kind, "id")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "reasoning-start" => Chunk::ReasoningStart {
                id: required_str(obj, kind, "id")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "reasoning-delta" => Chunk::ReasoningDelta {
                id: required_str(obj, kind, "id")?,
                delta: required_str(obj, kind, "delta")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "reasoning-end" => Chunk::ReasoningEnd {
                id: required_str(obj, kind, "id")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "tool-input-start" => Chunk::ToolInputStart {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                tool_name: required_str(obj, kind, "toolName")?,
                dynamic: optional_bool(obj, "dynamic").unwrap_or(false),
                provider_executed: optional_bool(obj, "providerExecuted"),
            },
            "tool-input-delta" => Chunk::ToolInputDelta {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                input_text_delta: required_str(obj, kind, "inputTextDelta")?,
            },
            "tool-input-available" => Chunk::ToolInputAvailable {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                input: required_value(obj, kind, "input")?,
                tool_name: optional_str(obj, "toolName"),
                dynamic: optional_bool(obj, "dynamic"),
                provider_executed: optional_bool(obj, "providerExecuted"),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "tool-input-error" => Chunk::ToolInputError {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                input: optional_value(obj, "input"),
                error_text: required_str(obj, kind, "errorText")?,
                tool_name: optional_str(obj, "toolName"),
                dynamic: optional_bool(obj, "dynamic"),
            },
            "tool-output-available" => Chunk::ToolOutputAvailable {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                output: required_value(obj, kind, "output")?,
                provider_executed: optional_bool(obj, "providerExecuted"),
            },
            "tool-output-error" => Chunk::ToolOutputError {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                error_text: required_str(obj, kind, "errorText")?,
                provider_executed: optional_bool(obj, "providerExecuted"),
            },
            "source-url" => Chunk::SourceUrl {
                source_id: required_str(obj, kind, "sourceId")?,
                url: required_str(obj, kind, "url")?,
                title: optional_str(obj, "title"),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "source-document" => Chunk::SourceDocument {
                source_id: required_str(obj, kind, "sourceId")?,
                media_type: required_str(obj, kind, "mediaType")?,
                title: required_str(obj, kind, "title")?,
                filename: optional_str(obj, "filename"),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "file" => Chunk::File {
                url: required_str(obj, kind, "url")?,
                media_type: required_str(obj, kind, "mediaType")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            _ => {
                if let Some(name) = kind.strip_prefix("data-") {
                    Chunk::Data {
                        name: name.to_string(),
                        id: optional_str(obj, "id"),
                        data: required_value(obj, kind, "data")?,
                    }
                } else {
                    Chunk::Unknown { kind: kind.to_string(), body: value.clone() }
                }
            }
        };
        Ok(chunk)
    }
}

fn triplet_chunk(
    kind: &str,
    id: &str,
    delta: Option<&str>,
    provider_metadata: Option<&Value>,
) -> Map<String, Value> {
    let mut m = tagged(kind);
    put_str(&mut m, "id", id);
    if let Some(d) = delta {
        put_str(&mut m, "delta", d);
    }
    put_opt_value(&mut m, "providerMetadata", provider_metadata);
    m
}

impl Serialize for Chunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Chunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Chunk::from_value(&value).map_err(D::Error::custom)
    }
}

// ─── Part codec ──────────────────────────────────────────────────────────────

fn text_state_str(state: TextState) -> &'static str {
    match state {
        TextState::Streaming => "streaming",
        TextState::Done => "done",
    }
}

fn parse_text_state(obj: &Map<String, Value>) -> TextState {
    match obj.get("state").and_then(Value::as_str) {
        Some("streaming") => TextState::Streaming,
        _ => TextState::Done,
    }
}

fn tool_state_str(state: ToolState) -> &'static str {
    match state {
        ToolState::InputStreaming => "input-streaming",
        ToolState::InputAvailable => "input-available",
        ToolState::OutputAvailable => "output-available",
        ToolState::OutputError => "output-error",
    }
}

fn parse_tool_state(obj: &Map<String, Value>) -> ToolState {
    match obj.get("state").and_then(Value::as_str) {
        Some("input-streaming") => ToolState::InputStreaming,
        Some("output-available") => ToolState::OutputAvailable,
        Some("output-error") => ToolState::OutputError,
        _ => ToolState::InputAvailable,
    }
}

impl Part {
    /// Encode this part as its JSON wire object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map = match self {
            Part::Text { text, state, provider_metadata } => {
                let mut m = tagged("text");
                put_str(&mut m, "text", text);
                put_str(&mut m, "state", text_state_str(*state));
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Part::Reasoning { text, state, provider_metadata } => {
                let mut m = tagged("reasoning");
                put_str(&mut m, "text", text);
                put_str(&mut m, "state", text_state_str(*state));
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Part::Tool(tool) => {
                let mut m = tagged(&tool.type_name());
                put_str(&mut m, "toolCallId", &tool.tool_call_id);
                if tool.dynamic {
                    put_str(&mut m, "toolName", &tool.tool_name);
                }
                put_str(&mut m, "state", tool_state_str(tool.state));
                put_opt_value(&mut m, "input", tool.input.as_ref());
                put_opt_value(&mut m, "output", tool.output.as_ref());
                put_opt_str(&mut m, "errorText", tool.error_text.as_ref());
                put_opt_bool(&mut m, "providerExecuted", tool.provider_executed);
                put_opt_value(&mut m, "callProviderMetadata", tool.provider_metadata.as_ref());
                m
            }
            Part::File { url, media_type, provider_metadata } => {
                let mut m = tagged("file");
                put_str(&mut m, "url", url);
                put_str(&mut m, "mediaType", media_type);
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Part::SourceUrl { source_id, url, title, provider_metadata } => {
                let mut m = tagged("source-url");
                put_str(&mut m, "sourceId", source_id);
                put_str(&mut m, "url", url);
                put_opt_str(&mut m, "title", title.as_ref());
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Part::SourceDocument { source_id, media_type, title, filename, provider_metadata } => {
                let mut m = tagged("source-document");
                put_str(&mut m, "sourceId", source_id);
                put_str(&mut m, "mediaType", media_type);
                put_str(&mut m, "title", title);
                put_opt_str(&mut m, "filename", filename.as_ref());
                put_opt_value(&mut m, "providerMetadata", provider_metadata.as_ref());
                m
            }
            Part::Data { name, id, data } => {
                let mut m = tagged(&format!("data-{name}"));
                put_opt_str(&mut m, "id", id.as_ref());
                put_value(&mut m, "data", data);
                m
            }
            Part::StepStart => tagged("step-start"),
            Part::Unknown { body, .. } => return body.clone(),
        };
        Value::Object(map)
    }

    /// Decode a part from its JSON wire object.
    pub fn from_value(value: &Value) -> Result<Self, WireError> {
        let obj = as_object(value)?;
        let kind = tag_of(obj)?;

        let part = match kind {
            "text" => Part::Text {
                text: required_str(obj, kind, "text")?,
                state: parse_text_state(obj),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "reasoning" => Part::Reasoning {
                text: required_str(obj, kind, "text")?,
                state: parse_text_state(obj),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "dynamic-tool" => Part::Tool(ToolPart {
                tool_call_id: required_str(obj, kind, "toolCallId")?,
                tool_name: required_str(obj, kind, "toolName")?,
                dynamic: true,
                provider_executed: optional_bool(obj, "providerExecuted"),
                state: parse_tool_state(obj),
                input: optional_value(obj, "input"),
                output: optional_value(obj, "output"),
                error_text: optional_str(obj, "errorText"),
                provider_metadata: optional_value(obj, "callProviderMetadata"),
            }),
            "file" => Part::File {
                url: required_str(obj, kind, "url")?,
                media_type: required_str(obj, kind, "mediaType")?,
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "source-url" => Part::SourceUrl {
                source_id: required_str(obj, kind, "sourceId")?,
                url: required_str(obj, kind, "url")?,
                title: optional_str(obj, "title"),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "source-document" => Part::SourceDocument {
                source_id: required_str(obj, kind, "sourceId")?,
                media_type: required_str(obj, kind, "mediaType")?,
                title: required_str(obj, kind, "title")?,
                filename: optional_str(obj, "filename"),
                provider_metadata: optional_value(obj, "providerMetadata"),
            },
            "step-start" => Part::StepStart,
            _ => {
                if let Some(name) = kind.strip_prefix("data-") {
                    Part::Data {
                        name: name.to_string(),
                        id: optional_str(obj, "id"),
                        data: required_value(obj, kind, "data")?,
                    }
                } else if let Some(name) = kind.strip_prefix("tool-") {
                    Part::Tool(ToolPart {
                        tool_call_id: required_str(obj, kind, "toolCallId")?,
                        tool_name: name.to_string(),
                        dynamic: false,
                        provider_executed: optional_bool(obj, "providerExecuted"),
                        state: parse_tool_state(obj),
                        input: optional_value(obj, "input"),
                        output: optional_value(obj, "output"),
                        error_text: optional_str(obj, "errorText"),
                        provider_metadata: optional_value(obj, "callProviderMetadata"),
                    })
                } else {
                    Part::Unknown { kind: kind.to_string(), body: value.clone() }
                }
            }
        };
        Ok(part)
    }
}

impl Serialize for Part {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Part::from_value(&value).map_err(D::Error::custom)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
