use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;

/// One utterance in a conversation. Turns are immutable once appended to a
/// session's history, and their order defines the dialogue sequence fed to
/// the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub author: Author,
    pub text: String,
}

impl Turn {
    pub fn new(author: Author, text: &str) -> Turn {
        return Turn {
            author,
            text: text.to_string(),
        };
    }
}
