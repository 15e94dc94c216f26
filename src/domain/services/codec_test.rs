use insta::assert_snapshot;

use super::Codec;
use crate::domain::models::InboundEvent;
use crate::domain::models::OutboundEvent;

#[test]
fn it_decodes_hello_frames() {
    let res = Codec::decode(br#"{"type":"hello","token":"anything-goes"}"#);
    assert_eq!(res, Some(InboundEvent::Hello));
}

#[test]
fn it_decodes_user_messages() {
    let res = Codec::decode(br#"{"type":"user_message","text":"Hello","conversationId":"c1"}"#);
    assert_eq!(
        res,
        Some(InboundEvent::UserMessage {
            text: "Hello".to_string(),
            conversation_id: Some("c1".to_string()),
        })
    );
}

#[test]
fn it_decodes_user_messages_without_a_conversation_id() {
    let res = Codec::decode(br#"{"type":"user_message","text":"Hello"}"#);
    assert_eq!(
        res,
        Some(InboundEvent::UserMessage {
            text: "Hello".to_string(),
            conversation_id: None,
        })
    );
}

#[test]
fn it_decodes_reserved_tool_invokes() {
    let res = Codec::decode(br#"{"type":"tool_invoke","name":"clock.now"}"#);
    assert_eq!(res, Some(InboundEvent::ToolInvoke));
}

#[test]
fn it_drops_malformed_frames() {
    assert_eq!(Codec::decode(b"definitely not json"), None);
    assert_eq!(Codec::decode(b"{\"type\":"), None);
    assert_eq!(Codec::decode(b""), None);
}

#[test]
fn it_drops_unknown_event_types() {
    assert_eq!(Codec::decode(br#"{"type":"shutdown"}"#), None);
    assert_eq!(Codec::decode(br#"{"event":"hello"}"#), None);
}

#[test]
fn it_drops_user_messages_without_text() {
    assert_eq!(Codec::decode(br#"{"type":"user_message"}"#), None);
}

#[test]
fn it_encodes_outbound_events() {
    assert_snapshot!(
        Codec::encode(&OutboundEvent::AssistantDelta {
            delta: "Hi".to_string(),
        }),
        @r#"{"type":"assistant_delta","delta":"Hi"}"#
    );

    assert_snapshot!(
        Codec::encode(&OutboundEvent::AssistantDone {
            message_id: "m1".to_string(),
            conversation_id: Some("c1".to_string()),
        }),
        @r#"{"type":"assistant_done","messageId":"m1","conversationId":"c1"}"#
    );

    assert_snapshot!(
        Codec::encode(&OutboundEvent::AssistantDone {
            message_id: "m1".to_string(),
            conversation_id: None,
        }),
        @r#"{"type":"assistant_done","messageId":"m1"}"#
    );

    assert_snapshot!(
        Codec::encode(&OutboundEvent::ToolMessage {
            name: "clock.now".to_string(),
            content: "2024-01-01T00:00:00.000Z".to_string(),
        }),
        @r#"{"type":"tool_message","name":"clock.now","content":"2024-01-01T00:00:00.000Z"}"#
    );

    assert_snapshot!(
        Codec::encode(&OutboundEvent::Error {
            message: "Model error".to_string(),
        }),
        @r#"{"type":"error","message":"Model error"}"#
    );
}
