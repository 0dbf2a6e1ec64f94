use std::fmt;

use serde::{Deserialize, Serialize};

/// One row of the source listing, in the order the site publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChapterKind {
    Main,
    #[serde(rename = "Side Story")]
    SideStory,
    Extra,
    Unclassified,
}

impl ChapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChapterKind::Main => "Main",
            ChapterKind::SideStory => "Side Story",
            ChapterKind::Extra => "Extra",
            ChapterKind::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for ChapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub kind: ChapterKind,
    pub arc: String,
    #[serde(rename = "chapter_num")]
    pub chapter_label: String,
}

/// A listing entry together with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    #[serde(flatten)]
    pub entry: ListingEntry,
    #[serde(flatten)]
    pub classification: Classification,
}

/// Ledger row. Field names match the `translated_data.json` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: String,
    pub title: String,
    pub arc: String,
    pub chapter_num: String,
    #[serde(rename = "type")]
    pub kind: ChapterKind,
    pub date: String,
    pub languages: Vec<String>,
}
