use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::formats::ListingEntry;

const UNKNOWN_DATE: &str = "Unknown";

/// Where chapters come from. Listing entries are returned oldest first.
#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch_listing(&self) -> anyhow::Result<Vec<ListingEntry>>;
    async fn fetch_body(&self, url: &str) -> anyhow::Result<String>;
}

/// A syosetu-style novel index and its chapter pages.
#[derive(Debug, Clone)]
pub struct SyosetuSource {
    client: reqwest::Client,
    listing_url: Url,
    max_listing_pages: usize,
}

impl SyosetuSource {
    pub fn new(listing_url: Url, max_listing_pages: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build source http client")?;

        Ok(Self {
            client,
            listing_url,
            max_listing_pages: max_listing_pages.max(1),
        })
    }

    async fn get_html(&self, url: &Url) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, concat!("novelmirror/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: unexpected status {status}");
        }

        response
            .text()
            .await
            .with_context(|| format!("read response body: {url}"))
    }
}

#[async_trait]
impl ChapterSource for SyosetuSource {
    async fn fetch_listing(&self) -> anyhow::Result<Vec<ListingEntry>> {
        let mut entries = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut seen_pages = HashSet::new();
        let mut next = Some(self.listing_url.clone());

        while let Some(page_url) = next.take() {
            if seen_pages.len() >= self.max_listing_pages {
                tracing::warn!(
                    max_pages = self.max_listing_pages,
                    "listing has more pages than max_listing_pages; stopping"
                );
                break;
            }
            if !seen_pages.insert(page_url.to_string()) {
                break;
            }

            tracing::debug!(url = %page_url, "fetch listing page");
            let html = self.get_html(&page_url).await.context("fetch listing")?;
            let page = parse_listing(&html, &page_url)
                .with_context(|| format!("parse listing: {page_url}"))?;

            for entry in page.entries {
                if seen_ids.insert(entry.id.clone()) {
                    entries.push(entry);
                }
            }
            next = page.next_page;
        }

        tracing::info!(chapters = entries.len(), "fetched listing");
        Ok(entries)
    }

    async fn fetch_body(&self, url: &str) -> anyhow::Result<String> {
        let url = Url::parse(url).with_context(|| format!("parse chapter url: {url}"))?;
        let html = self.get_html(&url).await.context("fetch chapter")?;
        parse_chapter_body(&html).with_context(|| format!("parse chapter: {url}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    pub next_page: Option<Url>,
}

/// Extracts listing rows from either the legacy (`dl.novel_sublist2`) or the
/// current (`div.p-eplist__sublist`) index layout.
pub fn parse_listing(html: &str, page_url: &Url) -> anyhow::Result<ListingPage> {
    let document = Html::parse_document(html);

    let legacy_row = selector("dl.novel_sublist2")?;
    let current_row = selector("div.p-eplist__sublist")?;
    let anchor = selector("a[href]")?;
    let current_anchor = selector("a.p-eplist__subtitle[href]")?;
    let subtitle = selector("span.subtitle, .subtitle")?;
    let legacy_date = selector("dt")?;
    let current_date = selector("div.p-eplist__update")?;
    let next_link = selector("a.c-pager__item--next[href]")?;

    let mut entries = Vec::new();

    for row in document.select(&legacy_row) {
        let Some(a) = row.select(&anchor).next() else {
            continue;
        };
        let title = a
            .select(&subtitle)
            .next()
            .or_else(|| row.select(&subtitle).next())
            .map_or_else(|| element_text(a), element_text);
        let date = row
            .select(&legacy_date)
            .next()
            .map(first_line_text)
            .unwrap_or_default();
        if let Some(entry) = listing_entry(page_url, a, title, date)? {
            entries.push(entry);
        }
    }

    for row in document.select(&current_row) {
        let Some(a) = row.select(&current_anchor).next() else {
            continue;
        };
        let date = row
            .select(&current_date)
            .next()
            .map(first_line_text)
            .unwrap_or_default();
        if let Some(entry) = listing_entry(page_url, a, element_text(a), date)? {
            entries.push(entry);
        }
    }

    if entries.is_empty() {
        anyhow::bail!("no chapter rows found");
    }

    let next_page = document
        .select(&next_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| page_url.join(href))
        .transpose()
        .context("resolve next listing page url")?;

    Ok(ListingPage { entries, next_page })
}

/// Extracts the chapter text, one line per paragraph.
pub fn parse_chapter_body(html: &str) -> anyhow::Result<String> {
    let document = Html::parse_document(html);
    let body = selector(
        "#novel_honbun, div.p-novel__text:not(.p-novel__text--preface):not(.p-novel__text--afterword)",
    )?;
    let paragraph = selector("p")?;

    let node = document
        .select(&body)
        .next()
        .ok_or_else(|| anyhow::anyhow!("chapter body node not found"))?;

    let paragraphs = node.select(&paragraph).collect::<Vec<_>>();
    let text = if paragraphs.is_empty() {
        paragraph_text(node)
    } else {
        paragraphs
            .into_iter()
            .map(paragraph_text)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let text = text.trim().to_owned();
    if text.is_empty() {
        anyhow::bail!("chapter body is empty");
    }
    Ok(text)
}

fn listing_entry(
    page_url: &Url,
    a: ElementRef<'_>,
    title: String,
    date: String,
) -> anyhow::Result<Option<ListingEntry>> {
    let Some(href) = a.value().attr("href") else {
        return Ok(None);
    };
    let url = page_url
        .join(href)
        .with_context(|| format!("resolve chapter href: {href}"))?;
    let Some(id) = chapter_id_from_url(&url) else {
        tracing::debug!(%url, "skip listing link without chapter id");
        return Ok(None);
    };

    Ok(Some(ListingEntry {
        id,
        url: url.to_string(),
        title: title.trim().to_owned(),
        date: if date.is_empty() {
            UNKNOWN_DATE.to_owned()
        } else {
            date
        },
    }))
}

/// Last non-empty path segment, e.g. `/n2267be/697/` -> `697`.
pub fn chapter_id_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .filter(|segment| *segment != "." && *segment != "..")
        .map(str::to_owned)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Element text without ruby readings (`rt` / `rp`).
fn paragraph_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_ruby_annotation = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "rt" | "rp"))
        });
        if !in_ruby_annotation {
            out.push_str(text);
        }
    }
    out.trim().to_owned()
}

fn first_line_text(element: ElementRef<'_>) -> String {
    let text = element.text().collect::<String>();
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_owned()
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse selector {css:?}: {err}"))
}
