use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

/// Responses API client that sends one request per text chunk.
#[derive(Debug, Clone)]
pub struct ResponsesClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    text: TextOptions,
    store: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ResponsesClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            endpoint: responses_endpoint(base_url),
            api_key,
            model,
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends every chunk in order with the same instructions and returns the
    /// outputs in chunk order. Stops at the first failing chunk.
    pub async fn text_chunks(
        &self,
        instructions: &str,
        chunks: &[String],
    ) -> anyhow::Result<Vec<String>> {
        let total = chunks.len();
        let mut outputs = Vec::with_capacity(total);
        for (idx, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                outputs.push(chunk.clone());
                continue;
            }
            tracing::debug!(
                model = %self.model,
                chunk = idx + 1,
                total,
                chars = chunk.chars().count(),
                "responses request"
            );
            let output = self
                .text(instructions, chunk)
                .await
                .with_context(|| format!("chunk {}/{total}", idx + 1))?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    async fn text(&self, instructions: &str, input: &str) -> anyhow::Result<String> {
        let body = request_body(&self.model, instructions, input, self.temperature);
        let endpoint = &self.endpoint;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read OpenAI response body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            anyhow::bail!("OpenAI API error ({status}): {message}");
        }

        let reply: ResponsesReply = serde_json::from_str(&raw).context("parse OpenAI response")?;
        output_text(reply)
    }
}

fn request_body<'a>(
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    temperature: f32,
) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model,
        instructions,
        input,
        text: TextOptions {
            format: TextFormat { kind: "text" },
        },
        store: false,
        // NOTE: GPT-5 models reject sampling params like `temperature`.
        temperature: (!model.starts_with("gpt-5")).then_some(temperature),
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    serde_json::from_str::<ErrorReply>(raw_json)
        .ok()
        .map(|reply| reply.error.message)
}

fn output_text(reply: ResponsesReply) -> anyhow::Result<String> {
    let text = reply
        .output
        .into_iter()
        .filter_map(|item| match item {
            OutputItem::Message { content } => Some(content),
            OutputItem::Other => None,
        })
        .flatten()
        .filter_map(|part| match part {
            ContentPart::OutputText { text } => Some(text),
            ContentPart::Other => None,
        })
        .collect::<String>();

    if text.trim().is_empty() {
        anyhow::bail!("OpenAI output text is empty");
    }
    Ok(text)
}
