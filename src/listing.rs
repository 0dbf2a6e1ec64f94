use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::classify::{classify, classify_entries};
use crate::cli::{ClassifyArgs, ListArgs};
use crate::config::Config;
use crate::source::{ChapterSource as _, SyosetuSource};

pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref().map(Path::new))?;
    let source = SyosetuSource::new(config.listing_url()?, config.max_listing_pages)?;
    let entries = source.fetch_listing().await?;

    let mut stdout = std::io::stdout().lock();
    for entry in classify_entries(entries, &config.arc) {
        serde_json::to_writer(&mut stdout, &entry).context("serialize listing entry")?;
        stdout.write_all(b"\n").context("write newline")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}

pub fn classify_one(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref().map(Path::new))?;
    let classification = classify(&args.id, &config.arc);
    let json = serde_json::to_string(&classification).context("serialize classification")?;
    println!("{json}");
    Ok(())
}
