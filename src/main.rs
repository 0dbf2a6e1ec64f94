use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    novelmirror::logging::init().context("init logging")?;

    let cli = novelmirror::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        novelmirror::cli::Command::Run(args) => {
            let outcome = novelmirror::run::run(args).await.context("run")?;
            tracing::debug!(?outcome, "run finished");
        }
        novelmirror::cli::Command::Index(args) => {
            novelmirror::index::run(args).await.context("index")?;
        }
        novelmirror::cli::Command::List(args) => {
            novelmirror::listing::list(args).await.context("list")?;
        }
        novelmirror::cli::Command::Classify(args) => {
            novelmirror::listing::classify_one(args).context("classify")?;
        }
    }

    Ok(())
}
