use std::io::Write;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::Gemini;
use crate::domain::models::Author;
use crate::domain::models::Backend;
use crate::domain::models::BackendResponse;
use crate::domain::models::Turn;

impl Gemini {
    fn with_url(url: String) -> Gemini {
        return Gemini {
            url,
            token: "abc".to_string(),
            model: "models/model-1".to_string(),
            timeout: "200".to_string(),
        };
    }
}

fn to_res(fragment: Option<BackendResponse>) -> Result<BackendResponse> {
    match fragment {
        Some(res) => return Ok(res),
        None => bail!("channel closed early"),
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(200)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(500)
        .create();

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks_without_a_token() {
    let backend = Gemini {
        url: "http://localhost:0".to_string(),
        token: "".to_string(),
        model: "models/model-1".to_string(),
        timeout: "200".to_string(),
    };

    let res = backend.health_check().await;
    assert!(res.is_err());
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = [
        "[{",
        "\"candidates\": [{",
        "\"content\": {",
        "\"parts\": [{",
        "\"text\": \"Hello \"",
        "}]",
        "}",
        "}]",
        "},",
        "{",
        "\"candidates\": [{",
        "\"content\": {",
        "\"parts\": [{",
        "\"text\": \"World\"",
        "}]",
        "}",
        "}]",
        "}]",
    ]
    .join("\n");

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?key=abc")
        .with_status(200)
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();

    let backend = Gemini::with_url(server.url());
    let turns = vec![Turn::new(Author::User, "Say hi to the world")];
    backend.get_completion(turns, &tx).await?;

    mock.assert();

    let first_recv = to_res(rx.recv().await)?;
    let second_recv = to_res(rx.recv().await)?;
    let third_recv = to_res(rx.recv().await)?;

    assert_eq!(first_recv.text, "Hello ".to_string());
    assert!(!first_recv.done);

    assert_eq!(second_recv.text, "World".to_string());
    assert!(!second_recv.done);

    assert_eq!(third_recv.text, "".to_string());
    assert!(third_recv.done);

    return Ok(());
}

#[tokio::test]
async fn it_fails_completions_when_the_stream_is_interrupted() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?key=abc")
        .with_status(200)
        .with_chunked_body(|writer| {
            writer.write_all(b"[{\n\"text\": \"Hello \"\n},\n")?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "connection reset",
            ));
        })
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();

    let backend = Gemini::with_url(server.url());
    let turns = vec![Turn::new(Author::User, "Say hi to the world")];
    let res = backend.get_completion(turns, &tx).await;

    mock.assert();

    assert!(res.is_err());

    // Fragments delivered before the fault are fine, but the done marker
    // must never follow a broken stream.
    while let Ok(fragment) = rx.try_recv() {
        assert!(!fragment.done);
    }

    return Ok(());
}

#[tokio::test]
async fn it_fails_completions_on_error_statuses() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?key=abc")
        .with_status(429)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();

    let backend = Gemini::with_url(server.url());
    let turns = vec![Turn::new(Author::User, "Say hi to the world")];
    let res = backend.get_completion(turns, &tx).await;

    mock.assert();

    assert!(res.is_err());
    assert!(rx.try_recv().is_err());

    return Ok(());
}
