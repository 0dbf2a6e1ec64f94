use std::collections::HashSet;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

/// Static settings for one mirrored novel. Loaded once and passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub listing_url: String,
    pub max_listing_pages: usize,
    pub site_title: String,
    pub attribution: String,
    pub source_language: String,
    pub title_language: String,
    pub arc: ArcConfig,
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcConfig {
    pub label: String,
    /// Identifier ordinal of the arc's first chapter.
    pub start: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Default for Config {
    fn default() -> Self {
        let languages = [
            ("en", "English"),
            ("ar", "Arabic"),
            ("fr", "French"),
            ("es", "Spanish"),
            ("de", "German"),
            ("ru", "Russian"),
            ("zh-cn", "Chinese"),
            ("ja", "Japanese"),
            ("ko", "Korean"),
            ("pt", "Portuguese"),
            ("hi", "Hindi"),
            ("it", "Italian"),
            ("tr", "Turkish"),
            ("id", "Indonesian"),
        ]
        .into_iter()
        .map(|(code, name)| Language {
            code: code.to_owned(),
            name: name.to_owned(),
        })
        .collect();

        Self {
            listing_url: "https://ncode.syosetu.com/n2267be/".to_owned(),
            max_listing_pages: 20,
            site_title: "Re:Zero - Translated Chapters".to_owned(),
            attribution: "Automatically translated. All rights to Tappei Nagatsuki (長月達平)."
                .to_owned(),
            source_language: "ja".to_owned(),
            title_language: "en".to_owned(),
            arc: ArcConfig {
                label: "Arc 9".to_owned(),
                start: 697,
            },
            languages,
        }
    }
}

impl Config {
    /// Reads a YAML config, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("read config: {}", path.display()))?;
                serde_yaml::from_str::<Config>(&yaml)
                    .with_context(|| format!("parse config: {}", path.display()))?
            }
            None => Config::default(),
        };
        config.validate().context("validate config")?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.listing_url).context("parse listing_url")?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("listing_url must be http/https: {url}");
        }
        if self.max_listing_pages == 0 {
            anyhow::bail!("max_listing_pages must be > 0");
        }
        if self.languages.is_empty() {
            anyhow::bail!("languages must not be empty");
        }

        let mut seen = HashSet::new();
        for language in &self.languages {
            if language.code.is_empty()
                || !language
                    .code
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                anyhow::bail!("invalid language code: {:?}", language.code);
            }
            if !seen.insert(language.code.as_str()) {
                anyhow::bail!("duplicate language code: {}", language.code);
            }
        }

        Ok(())
    }

    pub fn listing_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.listing_url).context("parse listing_url")
    }

    pub fn language_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.languages
            .iter()
            .find(|language| language.code == code)
            .map_or(code, |language| language.name.as_str())
    }
}
