use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::adjacency::Neighbors;
use crate::config::Config;
use crate::formats::{ChapterRecord, Classification};

pub const INDEX_FILE_NAME: &str = "index.html";

const STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css";

pub fn chapter_page_file_name(id: &str, lang: &str) -> String {
    format!("chapter_{id}_{lang}.html")
}

/// Everything needed to render one (chapter, language) page.
#[derive(Debug, Clone)]
pub struct ChapterPage<'a> {
    pub id: &'a str,
    pub lang: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub date: &'a str,
    pub classification: &'a Classification,
    pub neighbors: &'a Neighbors,
}

pub fn render_chapter_page(config: &Config, page: &ChapterPage<'_>) -> anyhow::Result<String> {
    let mut out = String::new();
    let lang = html_escape(page.lang);
    let title = html_escape(page.title);

    out.push_str("<!DOCTYPE html>\n");
    writeln!(out, "<html lang='{lang}'>")?;
    out.push_str("<head>\n<meta charset='utf-8'>\n");
    out.push_str("<meta name='viewport' content='width=device-width, initial-scale=1.0'>\n");
    writeln!(out, "<title>{title}</title>")?;
    writeln!(out, "<link href='{STYLESHEET}' rel='stylesheet'>")?;
    out.push_str("</head>\n<body class='bg-light'>\n<div class='container py-5'>\n");
    writeln!(out, "<h1 class='mb-3'>{title}</h1>")?;
    writeln!(
        out,
        "<p class='text-muted'>{} · {} · {} · {}</p>",
        html_escape(page.classification.kind.as_str()),
        html_escape(&page.classification.arc),
        html_escape(&page.classification.chapter_label),
        html_escape(page.date),
    )?;

    out.push_str("<div class='chapter-body'>\n");
    for line in page.body.lines() {
        let line = line.trim();
        if line.is_empty() {
            out.push_str("<br>\n");
        } else {
            writeln!(out, "<p>{}</p>", html_escape(line))?;
        }
    }
    out.push_str("</div>\n");

    out.push_str(&render_nav(page.lang, page.neighbors)?);
    writeln!(
        out,
        "<p class='text-center text-muted mt-4'>{}</p>",
        html_escape(&config.attribution)
    )?;
    out.push_str("</div>\n</body>\n</html>\n");
    Ok(out)
}

fn render_nav(lang: &str, neighbors: &Neighbors) -> anyhow::Result<String> {
    let mut nav = String::from("<div class='d-flex justify-content-between mt-5'>\n");
    match neighbors.prev.as_deref() {
        Some(prev) => {
            writeln!(
                nav,
                "<a href='{}' class='btn btn-outline-secondary'>← Previous</a>",
                html_escape(&chapter_page_file_name(prev, lang))
            )?;
        }
        None => nav.push_str("<div></div>\n"),
    }
    writeln!(
        nav,
        "<a href='{INDEX_FILE_NAME}' class='btn btn-outline-primary'>All Chapters</a>"
    )?;
    match neighbors.next.as_deref() {
        Some(next) => {
            writeln!(
                nav,
                "<a href='{}' class='btn btn-outline-secondary'>Next →</a>",
                html_escape(&chapter_page_file_name(next, lang))
            )?;
        }
        None => nav.push_str("<div></div>\n"),
    }
    nav.push_str("</div>\n");
    Ok(nav)
}

/// Index table of `records`, in the order given.
pub fn render_index_page<'a>(
    config: &Config,
    records: impl IntoIterator<Item = &'a ChapterRecord>,
) -> anyhow::Result<String> {
    let site_title = html_escape(&config.site_title);
    let mut rows = String::new();

    for record in records {
        let link_lang = if record.languages.contains(&config.title_language) {
            Some(config.title_language.as_str())
        } else {
            record.languages.first().map(String::as_str)
        };
        let title = html_escape(&record.title);
        let title_cell = match link_lang {
            Some(lang) => format!(
                "<a href='{}'>{title}</a>",
                html_escape(&chapter_page_file_name(&record.id, lang))
            ),
            None => title,
        };

        let languages = record
            .languages
            .iter()
            .map(|code| {
                format!(
                    "<a href='{}' class='btn btn-sm btn-outline-secondary m-1'>{}</a>",
                    html_escape(&chapter_page_file_name(&record.id, code)),
                    html_escape(config.language_name(code))
                )
            })
            .collect::<String>();

        writeln!(
            rows,
            "<tr><td>{}</td><td>{title_cell}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{languages}</td></tr>",
            html_escape(&record.id),
            html_escape(&record.arc),
            html_escape(&record.chapter_num),
            html_escape(record.kind.as_str()),
            html_escape(&record.date),
        )?;
    }

    Ok(format!(
        "<!DOCTYPE html>
<html lang='en'>
<head>
<meta charset='UTF-8'>
<meta name='viewport' content='width=device-width, initial-scale=1.0'>
<title>{site_title}</title>
<link href='{STYLESHEET}' rel='stylesheet'>
</head>
<body class='bg-light'>
<div class='container py-5'>
<h1 class='mb-3 text-center'>{site_title}</h1>
<p class='text-center text-muted'>{attribution}</p>
<div class='table-responsive'>
<table class='table table-striped'>
<thead class='table-dark'><tr><th>ID</th><th>Title</th><th>Arc</th><th>Chapter</th><th>Type</th><th>Date</th><th>Languages</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</div>
</div>
</body>
</html>
",
        attribution = html_escape(&config.attribution),
    ))
}

pub async fn write_page(path: &Path, html: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create page dir: {}", parent.display()))?;
    }
    tokio::fs::write(path, html)
        .await
        .with_context(|| format!("write page: {}", path.display()))
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
