#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;

use crate::domain::models::InboundEvent;
use crate::domain::models::OutboundEvent;

pub struct Codec {}

impl Codec {
    /// Decodes one wire frame in to a typed event. Malformed frames and
    /// unknown event types decode to `None` and are dropped without an error
    /// event, garbage never tears down a connection.
    pub fn decode(raw: &[u8]) -> Option<InboundEvent> {
        match serde_json::from_slice::<InboundEvent>(raw) {
            Ok(event) => return Some(event),
            Err(err) => {
                tracing::debug!(error = %err, "dropping undecodable frame");
                return None;
            }
        }
    }

    pub fn encode(event: &OutboundEvent) -> String {
        // Outbound events only carry strings, serializing cannot fail.
        return serde_json::to_string(event).unwrap();
    }
}
