use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A decoded client frame. Unknown `type` discriminants and structurally
/// invalid frames fail to decode and are dropped by the codec.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Hook point for a future authentication handshake. Any payload is
    /// accepted and ignored.
    Hello,
    #[serde(rename_all = "camelCase")]
    UserMessage {
        text: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },
    /// Reserved for direct tool calls. Unimplemented.
    ToolInvoke,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    AssistantDelta {
        delta: String,
    },
    #[serde(rename_all = "camelCase")]
    AssistantDone {
        message_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
    ToolMessage {
        name: String,
        content: String,
    },
    Error {
        message: String,
    },
}
