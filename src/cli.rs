use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate one chapter and refresh the index.
    Run(RunArgs),
    /// Regenerate `index.html` from the ledger.
    Index(IndexArgs),
    /// Print the classified source listing as JSON Lines.
    List(ListArgs),
    /// Print the classification of one chapter identifier as JSON.
    Classify(ClassifyArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Output directory for chapter pages, the ledger and the index.
    #[arg(long)]
    pub out: String,

    /// YAML config file (built-in defaults when omitted).
    #[arg(long)]
    pub config: Option<String>,

    /// Which listing entry to translate when `--chapter` is not given.
    #[arg(long, value_enum, default_value_t = SelectPolicy::NewestUnprocessed)]
    pub select: SelectPolicy,

    /// Translate this chapter identifier.
    #[arg(long, conflicts_with = "select")]
    pub chapter: Option<String>,

    #[command(flatten)]
    pub translator: TranslatorArgs,
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Output directory holding the ledger.
    #[arg(long)]
    pub out: String,

    /// YAML config file (built-in defaults when omitted).
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// YAML config file (built-in defaults when omitted).
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Chapter identifier, e.g. `697` or `ss12`.
    pub id: String,

    /// YAML config file (built-in defaults when omitted).
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectPolicy {
    /// Newest listing entry that is not in the ledger yet.
    NewestUnprocessed,
    /// Newest listing entry; nothing to do when it is already recorded.
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Copy the source text unchanged.
    Noop,
    /// Pipe the text through an external program.
    Command,
    /// OpenAI Responses API (`OPENAI_API_KEY`).
    Openai,
}

#[derive(Debug, Clone, Args)]
pub struct TranslatorArgs {
    /// Translation engine.
    #[arg(long, value_enum, default_value_t = Engine::Openai)]
    pub engine: Engine,

    /// Program to run when `--engine=command` (text on stdin, translation on stdout).
    #[arg(long)]
    pub command: Option<String>,

    /// Arguments passed to `--command`.
    #[arg(last = true)]
    pub command_args: Vec<String>,

    #[arg(long, default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, default_value = "gpt-4.1-mini")]
    pub openai_model: String,

    #[arg(long, default_value_t = 0.2)]
    pub openai_temperature: f32,

    /// Maximum characters per translation request.
    #[arg(long, default_value_t = 4000)]
    pub openai_max_chars: usize,
}
