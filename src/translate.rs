use std::process::Stdio;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use crate::cli::{Engine, TranslatorArgs};
use crate::openai::ResponsesClient;

/// `translate(text, lang) -> text`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, to: &str) -> anyhow::Result<String>;
}

pub fn from_args(
    args: &TranslatorArgs,
    source_language: &str,
) -> anyhow::Result<Box<dyn Translator>> {
    let translator: Box<dyn Translator> = match args.engine {
        Engine::Noop => Box::new(NoopTranslator),
        Engine::Command => {
            let Some(program) = args.command.clone() else {
                anyhow::bail!("missing --command (required when --engine=command)");
            };
            Box::new(CommandTranslator {
                program,
                args: args.command_args.clone(),
                from: source_language.to_owned(),
            })
        }
        Engine::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
            if args.openai_max_chars == 0 {
                anyhow::bail!("--openai-max-chars must be > 0");
            }
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .context("build http client")?;
            Box::new(OpenaiTranslator {
                client: ResponsesClient::new(
                    client,
                    &args.openai_base_url,
                    api_key,
                    args.openai_model.clone(),
                    args.openai_temperature,
                ),
                from: source_language.to_owned(),
                max_chars: args.openai_max_chars,
            })
        }
    };
    Ok(translator)
}

/// Calls `translator` and rejects blank output for non-blank input.
pub async fn translate_checked(
    translator: &dyn Translator,
    text: &str,
    to: &str,
) -> anyhow::Result<String> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    let translated = translator
        .translate(text, to)
        .await
        .with_context(|| format!("translate into {to}"))?;
    if translated.trim().is_empty() {
        anyhow::bail!("translation into {to} is empty");
    }
    Ok(translated.trim().to_owned())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _to: &str) -> anyhow::Result<String> {
        Ok(text.to_owned())
    }
}

/// Runs an external program per call: text on stdin, translation on stdout.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    pub program: String,
    pub args: Vec<String>,
    pub from: String,
}

#[async_trait]
impl Translator for CommandTranslator {
    async fn translate(&self, text: &str, to: &str) -> anyhow::Result<String> {
        let program = self.program.as_str();
        tracing::debug!(engine = "command", command = program, to, "translate");

        let mut child = Command::new(program)
            .args(&self.args)
            .env("NOVELMIRROR_TRANSLATE_FROM", &self.from)
            .env("NOVELMIRROR_TRANSLATE_TO", to)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawn translator command: {program}"))?;

        let mut stdin = child.stdin.take().context("open translator stdin")?;
        let input = text.as_bytes().to_vec();
        let write = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.context("wait translator process")?;
        if !output.status.success() {
            anyhow::bail!("translator command failed: {program} ({})", output.status);
        }
        written.context("write translator stdin")?;
        String::from_utf8(output.stdout).context("translator stdout is not valid UTF-8")
    }
}

pub struct OpenaiTranslator {
    client: ResponsesClient,
    from: String,
    max_chars: usize,
}

impl OpenaiTranslator {
    fn instructions(&self, to: &str) -> String {
        format!(
            "You are a translation engine for serialized fiction.\n\
Task: Translate the input text from language code `{from}` into language code `{to}`.\n\
\n\
Hard rules:\n\
- Keep one output line per input line, in the same order.\n\
- Keep empty lines.\n\
- Keep character names consistent.\n\
- Do not summarize and do not add commentary, notes or headings.\n\
\n\
Output:\n\
- Output ONLY the translated text.\n",
            from = &self.from,
        )
    }
}

#[async_trait]
impl Translator for OpenaiTranslator {
    async fn translate(&self, text: &str, to: &str) -> anyhow::Result<String> {
        let chunks = chunk_by_lines(text, self.max_chars);
        let instructions = self.instructions(to);
        tracing::debug!(
            engine = "openai",
            model = self.client.model(),
            to,
            chunks = chunks.len(),
            "translate"
        );

        let outputs = self
            .client
            .text_chunks(&instructions, &chunks)
            .await
            .with_context(|| format!("openai translate into {to}"))?;
        Ok(join_translated_chunks(&chunks, &outputs))
    }
}

/// Concatenates chunk translations, giving each the trailing newlines of its
/// source chunk so blank lines at chunk boundaries survive.
fn join_translated_chunks(chunks: &[String], outputs: &[String]) -> String {
    let mut out = String::new();
    for (chunk, translated) in chunks.iter().zip(outputs) {
        out.push_str(translated.trim_end_matches('\n'));
        let trailing = chunk.len() - chunk.trim_end_matches('\n').len();
        out.extend(std::iter::repeat_n('\n', trailing));
    }
    out
}

/// Splits `input` into chunks of at most `max_chars` characters, breaking at
/// line ends where possible and inside a line only when the line alone is
/// longer than `max_chars`.
pub fn chunk_by_lines(input: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0_usize;

    for line in input.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars > 0 && current_chars + line_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if line_chars <= max_chars {
            current.push_str(line);
            current_chars += line_chars;
            continue;
        }

        for ch in line.chars() {
            if current_chars == max_chars {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            current.push(ch);
            current_chars += 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
