#[cfg(test)]
#[path = "clock_test.rs"]
mod tests;

use chrono::SecondsFormat;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::OutboundEvent;

static TIME_WORDS: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"(?i)(time|date|เวลา|วันที่)").unwrap();
});

pub struct ClockService {}

impl ClockService {
    /// Rule-based side channel: when the user's text asks about the time or
    /// date (English or Thai), a clock.now tool message carrying the current
    /// UTC timestamp follows the completed answer. This is independent of
    /// whatever the model actually replied.
    pub fn tool_message(user_text: &str) -> Option<OutboundEvent> {
        if !TIME_WORDS.is_match(user_text) {
            return None;
        }

        return Some(OutboundEvent::ToolMessage {
            name: "clock.now".to_string(),
            content: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
    }
}
