use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Model,
}

impl Author {
    /// The role string the Gemini API expects for this author.
    pub fn wire_role(&self) -> &'static str {
        match self {
            Author::User => return "user",
            Author::Model => return "model",
        }
    }
}
