#[cfg(test)]
#[path = "rest_test.rs"]
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
use tokio::time;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AttachmentUpload;
use crate::domain::models::Backend;
use crate::domain::models::ChatDelta;
use crate::domain::models::ChatPrompt;
use crate::domain::models::ConversationSummary;
use crate::domain::models::DocumentSummary;
use crate::domain::models::Event;
use crate::domain::models::FinancialSnapshot;
use crate::domain::models::HistoryEntry;
use crate::domain::models::ReceiptAnalysis;
use crate::domain::models::TransactionSummary;

const DONE_SENTINEL: &str = "[DONE]";

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

/// A bearer token must look like a token before it goes on the wire. A
/// missing token degrades the request to unauthenticated; a mangled one is
/// an error, never a fabricated credential.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Ok(());
    }

    if token.len() > 4096 || token.chars().any(|c| return !c.is_ascii_graphic()) {
        bail!("The configured auth token is malformed. Re-authenticate and set a fresh token.")
    }

    return Ok(());
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: String,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    financial_context: Option<FinancialSnapshot>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Lines on the stream are forward-compatible: anything without a `chunk`
/// field is ignored.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StreamLine {
    chunk: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ConversationsResponse {
    #[serde(default)]
    conversations: Vec<ConversationSummary>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeImageRequest {
    image: String,
    user_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AnalyzeImageResponse {
    #[serde(default)]
    success: bool,
    data: Option<ReceiptAnalysis>,
    error: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AnalyzeDocumentResponse {
    #[serde(default)]
    success: bool,
    data: Option<DocumentSummary>,
    error: Option<String>,
}

pub struct RestBackend {
    url: String,
    token: String,
    idle_timeout: Duration,
}

impl RestBackend {
    pub fn from_config() -> Result<RestBackend> {
        let token = Config::get(ConfigKey::AuthToken);
        validate_token(&token)?;

        let millis = Config::get(ConfigKey::StreamIdleTimeout).parse::<u64>()?;
        return Ok(RestBackend {
            url: Config::get(ConfigKey::ApiBaseURL)
                .trim_end_matches('/')
                .to_string(),
            token,
            idle_timeout: Duration::from_millis(millis),
        });
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = reqwest::Client::new().request(method, format!("{}{path}", self.url));
        if !self.token.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.token));
        }

        return req;
    }
}

/// Pulls the server's error message out of a failed response, falling back
/// to a generic status line.
async fn error_message(res: reqwest::Response) -> String {
    let status = res.status().as_u16();
    if let Ok(body) = res.json::<ErrorResponse>().await {
        if let Some(error) = body.error {
            return error;
        }
    }

    return format!("HTTP error! status: {status}");
}

#[async_trait]
impl Backend for RestBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("The backend URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/api/health", url = self.url))
            .timeout(Duration::from_millis(1000))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Backend is not reachable");
            bail!("Backend is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Backend health check failed");
            bail!("Backend health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stream_chat<'a>(
        &self,
        prompt: ChatPrompt,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        if prompt.user_id.is_empty() {
            bail!("A user id is required before chatting");
        }
        if prompt.message.is_empty() {
            bail!("Cannot send an empty message");
        }

        let req = ChatRequest {
            message: prompt.message,
            user_id: prompt.user_id,
            financial_context: prompt.financial_context,
        };

        let res = self
            .request(reqwest::Method::POST, "/api/ai/stream")
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            tracing::error!(status = status, "Failed to open chat stream");
            bail!(error_message(res).await);
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        loop {
            let line = match time::timeout(self.idle_timeout, lines_reader.next_line()).await {
                Ok(res) => res?,
                Err(_) => bail!("The stream went idle and timed out"),
            };

            let Some(line) = line else {
                break;
            };

            let cleaned_line = line.trim();
            if !cleaned_line.starts_with("data:") {
                continue;
            }

            let payload = cleaned_line["data:".len()..].trim();
            if payload == DONE_SENTINEL {
                break;
            }

            // Malformed lines are skipped, not fatal.
            let Ok(parsed) = serde_json::from_str::<StreamLine>(payload) else {
                tracing::debug!(line = payload, "Skipping unparseable stream line");
                continue;
            };

            if let Some(text) = parsed.chunk {
                if text.is_empty() {
                    continue;
                }
                tx.send(Event::AssistantDelta(ChatDelta {
                    request_id: prompt.request_id,
                    text,
                    done: false,
                }))?;
            }
        }

        tx.send(Event::AssistantDelta(ChatDelta {
            request_id: prompt.request_id,
            text: "".to_string(),
            done: true,
        }))?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn chat(&self, prompt: ChatPrompt) -> Result<String> {
        if prompt.user_id.is_empty() {
            bail!("A user id is required before chatting");
        }

        let req = ChatRequest {
            message: prompt.message,
            user_id: prompt.user_id,
            financial_context: prompt.financial_context,
        };

        let res = self
            .request(reqwest::Method::POST, "/api/ai/chat")
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(res.json::<ChatResponse>().await?.response);
    }

    #[allow(clippy::implicit_return)]
    async fn history(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        let res = self
            .request(reqwest::Method::GET, &format!("/api/ai/history/{user_id}"))
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(res.json::<HistoryResponse>().await?.history);
    }

    #[allow(clippy::implicit_return)]
    async fn conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let res = self
            .request(
                reqwest::Method::GET,
                &format!("/api/ai/conversations/{user_id}"),
            )
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(res.json::<ConversationsResponse>().await?.conversations);
    }

    #[allow(clippy::implicit_return)]
    async fn clear_history(&self, user_id: &str) -> Result<()> {
        let res = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/ai/history/{user_id}"),
            )
            .send()
            .await?;

        // Clearing an already empty history is a success.
        if !res.status().is_success() && res.status().as_u16() != 404 {
            bail!(error_message(res).await);
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn analyze_image(&self, image: &str, user_id: &str) -> Result<ReceiptAnalysis> {
        let req = AnalyzeImageRequest {
            image: image.to_string(),
            user_id: user_id.to_string(),
        };

        let res = self
            .request(reqwest::Method::POST, "/api/ai/analyze-image")
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        let body = res.json::<AnalyzeImageResponse>().await?;
        if !body.success {
            bail!(body
                .error
                .unwrap_or_else(|| return "Image analysis failed".to_string()));
        }

        return match body.data {
            Some(data) => Ok(data),
            None => bail!("Image analysis returned no data"),
        };
    }

    #[allow(clippy::implicit_return)]
    async fn analyze_document(&self, upload: AttachmentUpload) -> Result<DocumentSummary> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .request(reqwest::Method::POST, "/api/documents/analyze")
            .multipart(form)
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        let body = res.json::<AnalyzeDocumentResponse>().await?;
        if !body.success {
            bail!(body
                .error
                .unwrap_or_else(|| return "Document analysis failed".to_string()));
        }

        return match body.data {
            Some(data) => Ok(data),
            None => bail!("Document analysis returned no data"),
        };
    }

    #[allow(clippy::implicit_return)]
    async fn transaction_summary(&self, user_id: &str) -> Result<TransactionSummary> {
        let res = self
            .request(
                reqwest::Method::GET,
                &format!("/api/transactions/summary/{user_id}"),
            )
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(res.json::<TransactionSummary>().await?);
    }
}
