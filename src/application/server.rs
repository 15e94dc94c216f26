#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use anyhow::Result;
use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::ErrorResponse;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::handshake::server::Response;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::InboundEvent;
use crate::domain::models::OutboundEvent;
use crate::domain::services::Codec;
use crate::domain::services::SessionService;

const STREAM_PATH: &str = "/stream";

fn is_stream_path(path: &str) -> bool {
    return path == STREAM_PATH;
}

pub struct Server {}

impl Server {
    /// Accept loop. Each connection gets its own session task, sessions share
    /// nothing but the read-only backend handle, so one failing session never
    /// affects another.
    pub async fn start(backend: BackendBox) -> Result<()> {
        let addr = format!(
            "{}:{}",
            Config::get(ConfigKey::Host),
            Config::get(ConfigKey::Port)
        );
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = addr.as_str(), "listening for websocket connections");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let backend = backend.clone();
                    tokio::spawn(async move {
                        tracing::info!(peer = %peer, "client connected");
                        if let Err(err) = handle_connection(stream, backend).await {
                            tracing::warn!(peer = %peer, error = ?err, "session ended with error");
                        }
                        tracing::info!(peer = %peer, "client disconnected");
                    });
                }
                Err(err) => {
                    tracing::error!(error = ?err, "failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, backend: BackendBox) -> Result<()> {
    // Upgrades are only served on /stream, anything else gets a 404 before
    // the handshake completes.
    let ws_stream = accept_hdr_async(stream, |req: &Request, res: Response| {
        if !is_stream_path(req.uri().path()) {
            tracing::debug!(path = req.uri().path(), "rejected upgrade on unknown path");
            let mut not_found = ErrorResponse::new(None);
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            return Err(not_found);
        }

        return Ok(res);
    })
    .await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundEvent>();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundEvent>();

    let session = tokio::spawn(SessionService::start(backend, outbound_tx, inbound_rx));

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let frame = Codec::encode(&event);
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(raw)) => {
                if let Some(event) = Codec::decode(raw.as_bytes()) {
                    if inbound_tx.send(event).is_err() {
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(_) => {
                break;
            }
        }
    }

    // Socket gone. Abort the session so an in-flight generation is dropped
    // instead of streaming in to the void.
    session.abort();
    writer.abort();

    return Ok(());
}
