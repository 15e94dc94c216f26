#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use uuid::Uuid;

use super::ClockService;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Author;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendResponse;
use crate::domain::models::InboundEvent;
use crate::domain::models::OutboundEvent;
use crate::domain::models::Turn;

const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 120_000;

/// Aborts the in-flight completion worker when dropped, so tearing down a
/// session mid-stream never leaves a generation running with nowhere to
/// deliver output.
struct CompletionGuard(JoinHandle<Result<()>>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Owns one connection's conversation history and drives one generation
/// request at a time. Created on connect, discarded on disconnect, never
/// persisted.
pub struct Session {
    backend: BackendBox,
    history: Vec<Turn>,
    timeout_ms: u64,
}

impl Session {
    pub fn new(backend: BackendBox) -> Session {
        let timeout_ms = Config::get(ConfigKey::BackendTimeout)
            .parse::<u64>()
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_MS);

        return Session {
            backend,
            history: vec![],
            timeout_ms,
        };
    }

    pub fn history(&self) -> &[Turn] {
        return &self.history;
    }

    /// Processes one inbound event. Errors only surface when the outbound
    /// channel is gone, which means the connection is being torn down.
    pub async fn handle(
        &mut self,
        event: InboundEvent,
        tx: &mpsc::UnboundedSender<OutboundEvent>,
    ) -> Result<()> {
        match event {
            InboundEvent::Hello => {
                // Auth hook. Validation is not implemented, any hello is
                // accepted and the connection stays open.
            }
            InboundEvent::UserMessage {
                text,
                conversation_id,
            } => {
                self.user_message(text, conversation_id, tx).await?;
            }
            InboundEvent::ToolInvoke => {
                tracing::debug!("tool_invoke is reserved, ignoring");
            }
        }

        return Ok(());
    }

    async fn user_message(
        &mut self,
        text: String,
        conversation_id: Option<String>,
        tx: &mpsc::UnboundedSender<OutboundEvent>,
    ) -> Result<()> {
        self.history.push(Turn::new(Author::User, &text));

        match self.complete(tx).await {
            Ok(assistant_text) => {
                tx.send(OutboundEvent::AssistantDone {
                    message_id: Uuid::new_v4().to_string(),
                    conversation_id,
                })?;
                self.history.push(Turn::new(Author::Model, &assistant_text));

                if let Some(tool_message) = ClockService::tool_message(&text) {
                    tx.send(tool_message)?;
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "completion failed");

                // The user turn stays in history. Failed attempts append no
                // model turn and the next user message replays a consistent
                // history.
                tx.send(OutboundEvent::Error {
                    message: format!("The backend failed with the following error: {err:?}"),
                })?;
            }
        }

        return Ok(());
    }

    /// Streams one completion for the entire accumulated history, forwarding
    /// every non-empty fragment as an assistant_delta in arrival order, and
    /// returns the aggregated assistant text.
    async fn complete(&self, tx: &mpsc::UnboundedSender<OutboundEvent>) -> Result<String> {
        let (fragment_tx, mut fragment_rx) = mpsc::unbounded_channel::<BackendResponse>();
        let backend = self.backend.clone();
        let turns = self.history.clone();

        let mut worker = CompletionGuard(tokio::spawn(async move {
            return backend.get_completion(turns, &fragment_tx).await;
        }));

        let mut assistant_text = "".to_string();
        let drain = async {
            while let Some(fragment) = fragment_rx.recv().await {
                if fragment.done {
                    break;
                }
                if fragment.text.is_empty() {
                    continue;
                }

                assistant_text += &fragment.text;
                tx.send(OutboundEvent::AssistantDelta {
                    delta: fragment.text,
                })?;
            }

            // Joining the worker inside the deadline means a backend whose
            // request future never resolves still fails the generation.
            (&mut worker.0).await??;

            return Ok::<(), anyhow::Error>(());
        };

        let timeout_ms = self.timeout_ms;
        match time::timeout(Duration::from_millis(timeout_ms), drain).await {
            Ok(res) => res?,
            Err(_) => bail!("backend timed out after {timeout_ms}ms"),
        }

        return Ok(assistant_text);
    }
}

pub struct SessionService {}

impl SessionService {
    /// Runs one session until its inbound channel closes. Events are handled
    /// strictly in arrival order: a user_message arriving while a generation
    /// is in flight waits in the channel and is handled after the current
    /// request's terminal event.
    pub async fn start(
        backend: BackendBox,
        tx: mpsc::UnboundedSender<OutboundEvent>,
        mut rx: mpsc::UnboundedReceiver<InboundEvent>,
    ) -> Result<()> {
        let mut session = Session::new(backend);

        loop {
            let event = rx.recv().await;
            if event.is_none() {
                return Ok(());
            }

            session.handle(event.unwrap(), &tx).await?;
        }
    }
}
