use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use strum::EnumVariantNames;
use tokio::sync::mpsc;

use super::Turn;

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Result<BackendName> {
        if text == BackendName::Gemini.to_string() {
            return Ok(BackendName::Gemini);
        }

        bail!(format!("{text} is not a valid backend"))
    }
}

/// One item in a completion stream. Fragments arrive with `done` false in
/// backend emission order, followed by a single `done` marker.
pub struct BackendResponse {
    pub text: String,
    pub done: bool,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work
    /// with the backend.
    async fn health_check(&self) -> Result<()>;

    /// Requests a streamed completion for an ordered turn sequence, pushing
    /// each text fragment through the channel as it arrives, followed by a
    /// final `done` marker.
    ///
    /// Backend failures (auth, rate limit, network) surface as a single
    /// returned error. No retries happen here; retry policy belongs to the
    /// caller.
    async fn get_completion<'a>(
        &self,
        turns: Vec<Turn>,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()>;
}

/// Backends hold read-only configuration, a single instance is shared by all
/// concurrent sessions.
pub type BackendBox = Arc<dyn Backend + Send + Sync>;
