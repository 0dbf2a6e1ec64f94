use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::adjacency::Neighbors;
use crate::classify::classify_entries;
use crate::cli::{RunArgs, SelectPolicy};
use crate::config::Config;
use crate::formats::{ChapterKind, ChapterRecord, ClassifiedEntry};
use crate::ledger::{LEDGER_FILE_NAME, Ledger};
use crate::page::{ChapterPage, chapter_page_file_name, render_chapter_page, write_page};
use crate::source::{ChapterSource, SyosetuSource};
use crate::translate::{self, Translator, translate_checked};

/// Which listing entry a run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    NewestUnprocessed,
    Latest,
    Chapter(String),
}

impl Selection {
    pub fn from_args(select: SelectPolicy, chapter: Option<String>) -> Self {
        match (chapter, select) {
            (Some(id), _) => Selection::Chapter(id),
            (None, SelectPolicy::NewestUnprocessed) => Selection::NewestUnprocessed,
            (None, SelectPolicy::Latest) => Selection::Latest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Translated { id: String, pages: usize },
    AlreadyRecorded { id: String },
    NotListed { id: String },
    NothingToDo,
    Failed { id: Option<String>, error: String },
}

pub async fn run(args: RunArgs) -> anyhow::Result<RunOutcome> {
    let config = Config::load(args.config.as_deref().map(Path::new))?;
    let translator = translate::from_args(&args.translator, &config.source_language)
        .context("build translator")?;
    let source = SyosetuSource::new(config.listing_url()?, config.max_listing_pages)?;

    let out_dir = PathBuf::from(&args.out);
    let mut ledger = Ledger::load(out_dir.join(LEDGER_FILE_NAME)).await?;
    let selection = Selection::from_args(args.select, args.chapter);

    process(
        &config,
        &source,
        translator.as_ref(),
        &mut ledger,
        &out_dir,
        &selection,
    )
    .await
}

/// One pass: select a chapter, translate it into every configured language,
/// write its pages, record it, refresh the index.
///
/// Failures while handling the chapter are logged and returned as
/// [`RunOutcome::Failed`] with the ledger unchanged. Only a failure to write
/// the index after a successful append is returned as an error.
pub async fn process(
    config: &Config,
    source: &dyn ChapterSource,
    translator: &dyn Translator,
    ledger: &mut Ledger,
    out_dir: &Path,
    selection: &Selection,
) -> anyhow::Result<RunOutcome> {
    let entries = match source.fetch_listing().await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!(?err, "fetch listing failed");
            return Ok(RunOutcome::Failed {
                id: None,
                error: format!("{err:#}"),
            });
        }
    };
    let classified = classify_entries(entries, &config.arc);
    let ids = classified
        .iter()
        .map(|c| c.entry.id.as_str())
        .collect::<Vec<_>>();

    let target = match select(&classified, ledger, selection) {
        Ok(target) => target,
        Err(outcome) => {
            report(&outcome);
            return Ok(outcome);
        }
    };
    let id = target.entry.id.clone();

    tracing::info!(
        id = %id,
        title = %target.entry.title,
        kind = %target.classification.kind,
        "translating chapter"
    );
    let record = match translate_chapter(config, source, translator, out_dir, target, &ids).await
    {
        Ok(record) => record,
        Err(err) => {
            let outcome = RunOutcome::Failed {
                id: Some(id),
                error: format!("{err:#}"),
            };
            report(&outcome);
            return Ok(outcome);
        }
    };

    let pages = record.languages.len();
    match ledger.append(record).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(id = %id, "chapter was recorded concurrently; ledger unchanged"),
        Err(err) => {
            let outcome = RunOutcome::Failed {
                id: Some(id),
                error: format!("{err:#}"),
            };
            report(&outcome);
            return Ok(outcome);
        }
    }

    crate::index::write(config, ledger, out_dir)
        .await
        .context("regenerate index")?;

    let outcome = RunOutcome::Translated { id, pages };
    report(&outcome);
    Ok(outcome)
}

fn select<'a>(
    classified: &'a [ClassifiedEntry],
    ledger: &Ledger,
    selection: &Selection,
) -> Result<&'a ClassifiedEntry, RunOutcome> {
    let target = match selection {
        Selection::NewestUnprocessed => {
            return classified
                .iter()
                .rev()
                .find(|c| !ledger.contains(&c.entry.id))
                .ok_or(RunOutcome::NothingToDo);
        }
        Selection::Latest => classified.last().ok_or(RunOutcome::NothingToDo)?,
        Selection::Chapter(id) => classified
            .iter()
            .find(|c| &c.entry.id == id)
            .ok_or_else(|| RunOutcome::NotListed { id: id.clone() })?,
    };

    if ledger.contains(&target.entry.id) {
        return Err(RunOutcome::AlreadyRecorded {
            id: target.entry.id.clone(),
        });
    }
    Ok(target)
}

async fn translate_chapter(
    config: &Config,
    source: &dyn ChapterSource,
    translator: &dyn Translator,
    out_dir: &Path,
    target: &ClassifiedEntry,
    ids: &[&str],
) -> anyhow::Result<ChapterRecord> {
    let entry = &target.entry;
    let classification = &target.classification;
    if classification.kind == ChapterKind::Unclassified {
        tracing::warn!(id = %entry.id, "chapter identifier has an unrecognized shape");
    }

    let neighbors = Neighbors::resolve(&entry.id, ids);
    let body = source
        .fetch_body(&entry.url)
        .await
        .context("fetch chapter body")?;

    let record_title = translate_checked(translator, &entry.title, &config.title_language)
        .await
        .context("translate title")?;

    // Pages are written only once every language is translated.
    let mut pages = Vec::with_capacity(config.languages.len());
    for language in &config.languages {
        let lang = language.code.as_str();
        let title = if lang == config.title_language {
            record_title.clone()
        } else {
            translate_checked(translator, &entry.title, lang)
                .await
                .context("translate title")?
        };
        let translated = translate_checked(translator, &body, lang)
            .await
            .context("translate body")?;
        tracing::info!(id = %entry.id, lang, "translated");

        let html = render_chapter_page(
            config,
            &ChapterPage {
                id: &entry.id,
                lang,
                title: &title,
                body: &translated,
                date: &entry.date,
                classification,
                neighbors: &neighbors,
            },
        )
        .with_context(|| format!("render page: {lang}"))?;
        pages.push((out_dir.join(chapter_page_file_name(&entry.id, lang)), html));
    }

    for (path, html) in &pages {
        write_page(path, html).await?;
    }

    Ok(ChapterRecord {
        id: entry.id.clone(),
        title: record_title,
        arc: classification.arc.clone(),
        chapter_num: classification.chapter_label.clone(),
        kind: classification.kind,
        date: entry.date.clone(),
        languages: config
            .languages
            .iter()
            .map(|language| language.code.clone())
            .collect(),
    })
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Translated { id, pages } => {
            tracing::info!(id = %id, pages, "chapter translated");
        }
        RunOutcome::AlreadyRecorded { id } => {
            tracing::info!(id = %id, "chapter already translated; nothing to do");
        }
        RunOutcome::NotListed { id } => {
            tracing::warn!(id = %id, "chapter is not in the source listing");
        }
        RunOutcome::NothingToDo => {
            tracing::info!("every listed chapter is already translated");
        }
        RunOutcome::Failed { id, error } => {
            tracing::error!(id = ?id, error = %error, "chapter processing failed");
        }
    }
}
