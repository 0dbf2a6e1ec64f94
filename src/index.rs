use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::IndexArgs;
use crate::config::Config;
use crate::ledger::{LEDGER_FILE_NAME, Ledger};
use crate::page::{INDEX_FILE_NAME, render_index_page, write_page};

pub async fn run(args: IndexArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref().map(Path::new))?;
    let out_dir = PathBuf::from(&args.out);
    let ledger = Ledger::load(out_dir.join(LEDGER_FILE_NAME)).await?;
    write(&config, &ledger, &out_dir).await
}

/// Rewrites `index.html` from every ledger record, newest first.
pub async fn write(config: &Config, ledger: &Ledger, out_dir: &Path) -> anyhow::Result<()> {
    let html = render_index_page(config, ledger.sorted_by_date()).context("render index")?;
    let path = out_dir.join(INDEX_FILE_NAME);
    write_page(&path, &html).await.context("write index")?;
    tracing::info!(chapters = ledger.len(), path = %path.display(), "index written");
    Ok(())
}
