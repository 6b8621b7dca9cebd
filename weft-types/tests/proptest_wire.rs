//! Property-based tests: wire codec round-trip for chunks and parts.

use proptest::prelude::*;
use serde_json::{Value, json};
use weft_types::{Chunk, Part, TextState, ToolPart, ToolState};

fn arb_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,12}"
}

fn arb_payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,16}".prop_map(Value::from),
        ("[a-z]{1,8}", any::<i32>()).prop_map(|(k, v)| json!({ k: v })),
    ]
}

// Optional part fields encode `Some(Null)` and `None` identically (the field
// is omitted), so part strategies stick to non-null payloads.
fn arb_nonnull_payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,16}".prop_map(Value::from),
        ("[a-z]{1,8}", any::<i32>()).prop_map(|(k, v)| json!({ k: v })),
    ]
}

fn arb_chunk() -> impl Strategy<Value = Chunk> {
    prop_oneof![
        Just(Chunk::Abort),
        Just(Chunk::StepStart),
        Just(Chunk::StepEnd),
        proptest::option::of(arb_id()).prop_map(|message_id| Chunk::Start {
            message_id,
            message_metadata: None,
        }),
        ".{0,24}".prop_map(|error_text| Chunk::Error { error_text }),
        (arb_id(), ".{0,24}").prop_map(|(id, delta)| Chunk::text_delta(id, delta)),
        arb_id().prop_map(Chunk::text_start),
        arb_id().prop_map(Chunk::text_end),
        (arb_id(), ".{0,24}").prop_map(|(id, delta)| Chunk::reasoning_delta(id, delta)),
        (arb_id(), "[a-z_]{1,10}", any::<bool>()).prop_map(|(id, name, dynamic)| {
            Chunk::ToolInputStart {
                tool_call_id: id,
                tool_name: name,
                dynamic,
                provider_executed: None,
            }
        }),
        (arb_id(), arb_payload()).prop_map(|(id, input)| Chunk::ToolInputAvailable {
            tool_call_id: id,
            input,
            tool_name: None,
            dynamic: None,
            provider_executed: None,
            provider_metadata: None,
        }),
        (arb_id(), arb_payload()).prop_map(|(id, output)| Chunk::ToolOutputAvailable {
            tool_call_id: id,
            output,
            provider_executed: None,
        }),
        ("[a-z]{1,10}", proptest::option::of(arb_id()), arb_payload())
            .prop_map(|(name, id, data)| Chunk::Data { name, id, data }),
    ]
}

fn arb_tool_state() -> impl Strategy<Value = ToolState> {
    prop_oneof![
        Just(ToolState::InputStreaming),
        Just(ToolState::InputAvailable),
        Just(ToolState::OutputAvailable),
        Just(ToolState::OutputError),
    ]
}

fn arb_part() -> impl Strategy<Value = Part> {
    prop_oneof![
        (".{0,32}", any::<bool>()).prop_map(|(text, done)| Part::Text {
            text,
            state: if done { TextState::Done } else { TextState::Streaming },
            provider_metadata: None,
        }),
        ".{0,32}".prop_map(|text| Part::Reasoning {
            text,
            state: TextState::Done,
            provider_metadata: None,
        }),
        (arb_id(), "[a-z_]{1,10}", any::<bool>(), arb_tool_state(), arb_nonnull_payload()).prop_map(
            |(tool_call_id, tool_name, dynamic, state, input)| {
                Part::Tool(ToolPart {
                    tool_call_id,
                    tool_name,
                    dynamic,
                    provider_executed: None,
                    state,
                    input: Some(input),
                    output: None,
                    error_text: None,
                    provider_metadata: None,
                })
            }
        ),
        ("[a-z]{1,10}", arb_payload()).prop_map(|(name, data)| Part::Data {
            name,
            id: None,
            data,
        }),
        Just(Part::StepStart),
    ]
}

proptest! {
    #[test]
    fn chunk_wire_roundtrip(chunk in arb_chunk()) {
        let wire = chunk.to_value();
        let back = Chunk::from_value(&wire).unwrap();
        prop_assert_eq!(back, chunk);
    }

    #[test]
    fn chunk_serde_roundtrip(chunk in arb_chunk()) {
        let text = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, chunk);
    }

    #[test]
    fn part_wire_roundtrip(part in arb_part()) {
        let wire = part.to_value();
        let back = Part::from_value(&wire).unwrap();
        prop_assert_eq!(back, part);
    }

    #[test]
    fn part_type_name_matches_wire_tag(part in arb_part()) {
        let wire = part.to_value();
        prop_assert_eq!(wire["type"].as_str().unwrap(), part.type_name());
    }
}
