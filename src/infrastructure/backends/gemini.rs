#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendResponse;
use crate::domain::models::Turn;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    role: String,
    parts: Vec<ContentPart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    text: String,
}

pub struct Gemini {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            model: Config::get(ConfigKey::Model),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Gemini URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Gemini token is not defined");
        }

        let url = format!(
            "{url}/v1beta/{model}?key={key}",
            url = self.url,
            model = self.model,
            key = self.token
        );

        let res = reqwest::Client::new()
            .get(&url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Gemini is not reachable");
            bail!("Gemini is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            bail!("Gemini health check failed");
        }

        return Ok(());
    }

    async fn get_completion<'a>(
        &self,
        turns: Vec<Turn>,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()> {
        let contents = turns
            .iter()
            .map(|turn| {
                return Content {
                    role: turn.author.wire_role().to_string(),
                    parts: vec![ContentPart {
                        text: turn.text.to_string(),
                    }],
                };
            })
            .collect::<Vec<Content>>();

        let mut system_instruction = None;
        let system_prompt = Config::get(ConfigKey::SystemPrompt);
        if !system_prompt.is_empty() {
            system_instruction = Some(Content {
                role: "".to_string(),
                parts: vec![ContentPart {
                    text: system_prompt,
                }],
            });
        }

        let req = CompletionRequest {
            system_instruction,
            contents,
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/{model}:streamGenerateContent?key={key}",
                url = self.url,
                model = self.model,
                key = self.token,
            ))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Gemini"
            );
            bail!(format!(
                "Failed to make completion request to Gemini, {}",
                res.status().as_u16()
            ));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        // A transport fault mid-stream surfaces as a failure, never as a
        // truncated completion.
        while let Some(line) = lines_reader.next_line().await? {
            let cleaned_line = line.trim().trim_end_matches(',').to_string();
            if !cleaned_line.starts_with("\"text\":") {
                continue;
            }

            let ores: GenerateContentResponse =
                serde_json::from_str(&format!("{{ {text} }}", text = cleaned_line))?;

            if ores.text.is_empty() {
                continue;
            }

            tx.send(BackendResponse {
                text: ores.text,
                done: false,
            })?;
        }

        tx.send(BackendResponse {
            text: "".to_string(),
            done: true,
        })?;

        return Ok(());
    }
}
