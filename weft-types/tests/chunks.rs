//! Integration tests for the chunk data model and accessors.

use serde_json::json;
use weft_types::Chunk;

#[test]
fn meta_chunks_are_meta() {
    let chunks = [
        Chunk::Start { message_id: None, message_metadata: None },
        Chunk::Finish { message_metadata: None },
        Chunk::Abort,
        Chunk::MessageMetadata { message_metadata: json!({"a": 1}) },
        Chunk::Error { error_text: "boom".into() },
    ];
    for chunk in &chunks {
        assert!(chunk.is_meta(), "{} should be meta", chunk.kind());
        assert!(!chunk.is_step_boundary());
        assert_eq!(chunk.part_id(), None);
    }
}

#[test]
fn step_boundaries_are_not_meta() {
    assert!(Chunk::StepStart.is_step_boundary());
    assert!(Chunk::StepEnd.is_step_boundary());
    assert!(!Chunk::StepStart.is_meta());
}

#[test]
fn part_id_follows_the_kind_family() {
    assert_eq!(Chunk::text_delta("t1", "hi").part_id(), Some("t1"));
    assert_eq!(Chunk::reasoning_end("r1").part_id(), Some("r1"));
    let tool = Chunk::ToolInputDelta { tool_call_id: "call_9".into(), input_text_delta: "{".into() };
    assert_eq!(tool.part_id(), Some("call_9"));
    let source = Chunk::SourceUrl {
        source_id: "s1".into(),
        url: "https://example.com".into(),
        title: None,
        provider_metadata: None,
    };
    assert_eq!(source.part_id(), Some("s1"));
    let data = Chunk::Data { name: "weather".into(), id: None, data: json!(1) };
    assert_eq!(data.part_id(), None);
}

#[test]
fn kind_strings_match_the_wire_tags() {
    assert_eq!(Chunk::StepStart.kind(), "step-start");
    assert_eq!(Chunk::text_start("t").kind(), "text-start");
    assert_eq!(
        Chunk::Data { name: "chart".into(), id: None, data: json!(null) }.kind(),
        "data-chart"
    );
}

#[test]
fn wire_decode_of_every_family() {
    let stream = json!([
        {"type": "start", "messageId": "m1"},
        {"type": "step-start"},
        {"type": "text-start", "id": "t1"},
        {"type": "text-delta", "id": "t1", "delta": "Hel"},
        {"type": "text-end", "id": "t1"},
        {"type": "reasoning-start", "id": "r1"},
        {"type": "reasoning-delta", "id": "r1", "delta": "hmm"},
        {"type": "reasoning-end", "id": "r1"},
        {"type": "tool-input-start", "toolCallId": "c1", "toolName": "weather"},
        {"type": "tool-input-delta", "toolCallId": "c1", "inputTextDelta": "{}"},
        {"type": "tool-input-available", "toolCallId": "c1", "input": {}},
        {"type": "tool-output-available", "toolCallId": "c1", "output": {"temp": 65}},
        {"type": "source-url", "sourceId": "s1", "url": "https://a"},
        {"type": "source-document", "sourceId": "s2", "mediaType": "application/pdf", "title": "Doc"},
        {"type": "file", "url": "https://f", "mediaType": "image/png"},
        {"type": "data-weather", "data": {"temp": 65}},
        {"type": "step-end"},
        {"type": "finish"},
    ]);

    let chunks: Vec<Chunk> = stream
        .as_array()
        .unwrap()
        .iter()
        .map(|v| Chunk::from_value(v).unwrap())
        .collect();
    assert_eq!(chunks.len(), 18);

    // Every decoded chunk re-encodes to exactly the wire object it came from.
    for (chunk, wire) in chunks.iter().zip(stream.as_array().unwrap()) {
        assert_eq!(&chunk.to_value(), wire, "round-trip of {}", chunk.kind());
    }
}
