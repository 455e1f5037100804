//! Per-source configuration. Every source runs through the same pipeline; only
//! the seed, the origin, and the cascade strategies differ.

use crate::cascade::{Cascade, ScopeCascade};
use crate::error::{Error, Result};
use derive_builder::Builder;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use url::Url;

mod komiku;
mod nineanime;
mod westmanga;

#[derive(AsExpression, FromSqlRow, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sql_type = "Text"]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Komiku,
    Westmanga,
    Nineanime,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Komiku, Source::Westmanga, Source::Nineanime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Komiku => "komiku",
            Self::Westmanga => "westmanga",
            Self::Nineanime => "nineanime",
        }
    }

    /// Preset configuration for this source.
    pub fn config(&self) -> Result<SourceConfig> {
        match self {
            Self::Komiku => komiku::config(),
            Self::Westmanga => westmanga::config(),
            Self::Nineanime => nineanime::config(),
        }
    }
}

impl ToSql<Text, Sqlite> for Source {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Sqlite>) -> serialize::Result {
        <String as ToSql<Text, Sqlite>>::to_sql(&self.as_str().to_string(), out)
    }
}

impl FromSql<Text, Sqlite> for Source {
    fn from_sql(bytes: Option<&<Sqlite as Backend>::RawValue>) -> deserialize::Result<Self> {
        Ok(<String as FromSql<Text, Sqlite>>::from_sql(bytes)?.parse()?)
    }
}

impl std::str::FromStr for Source {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "komiku" => Ok(Self::Komiku),
            "westmanga" => Ok(Self::Westmanga),
            "nineanime" => Ok(Self::Nineanime),
            _ => Err("Unrecognized source name"),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategies for listing pages.
#[derive(Debug, Clone, Default)]
pub struct ListingStrategies {
    /// Item containers; field cascades below run inside each one.
    pub items: ScopeCascade,
    pub title: Cascade,
    /// Detail link, relative links are resolved against the listing page.
    pub url: Cascade,
    pub cover: Cascade,
    pub kind: Cascade,
    /// Link to the next listing page, searched document-wide.
    pub next_page: Cascade,
    /// When set, only items of these kinds are kept (case-insensitive).
    pub allowed_kinds: Vec<String>,
    /// Guess the kind from item text ("manhwa", "manhua") when `kind` misses.
    pub infer_kind: bool,
}

/// Strategies for work detail pages.
#[derive(Debug, Clone, Default)]
pub struct DetailStrategies {
    pub title: Cascade,
    /// Decorative title prefix stripped case-insensitively when whitespace follows it, e.g. `"Komik"`.
    pub title_prefix: Option<String>,
    pub cover: Cascade,
    pub synopsis: Cascade,
    pub genres: Cascade,
    /// Genres longer than this are taken as mis-matched text and dropped.
    pub max_genre_len: usize,
    /// Label/value rows scanned for the author.
    pub info_rows: ScopeCascade,
    /// Value cascade inside a matched info row; the next sibling is used when it misses.
    pub info_value: Cascade,
    /// Lowercase labels that mark an author row.
    pub author_labels: Vec<String>,
    /// Chapter link elements, one per chapter.
    pub chapters: ScopeCascade,
    /// Chapter title inside a chapter link; falls back to the link text.
    pub chapter_title: Cascade,
    pub chapter_url: Cascade,
}

/// Navigation timeouts per stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTimeouts {
    pub listing: Duration,
    pub detail: Duration,
    pub chapter: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(90),
            detail: Duration::from_secs(60),
            chapter: Duration::from_secs(120),
        }
    }
}

/// Everything the pipeline needs to know about one source.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct SourceConfig {
    pub source: Source,
    pub seed_url: Url,
    /// Origin that listing pagination must stay on. Defaults to the seed's origin.
    #[builder(setter(strip_option), default)]
    origin: Option<Url>,
    #[builder(default)]
    pub listing: ListingStrategies,
    #[builder(default)]
    pub detail: DetailStrategies,
    /// Image cascades for chapter reader pages. Empty means chapters carry no pages.
    #[builder(default)]
    pub reader: Cascade,
    #[builder(default)]
    pub timeouts: StageTimeouts,
}

impl SourceConfig {
    pub fn builder() -> SourceConfigBuilder {
        SourceConfigBuilder::default()
    }

    pub fn origin(&self) -> Url {
        match &self.origin {
            Some(origin) => origin.clone(),
            None => {
                let mut origin = self.seed_url.clone();
                origin.set_path("/");
                origin.set_query(None);
                origin.set_fragment(None);
                origin
            }
        }
    }

    /// Same source, different seed listing.
    pub fn with_seed(mut self, seed_url: Url) -> Self {
        self.seed_url = seed_url;
        self
    }
}

impl SourceConfigBuilder {
    pub fn finish(&self) -> Result<SourceConfig> {
        self.build().map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_build() {
        for source in Source::ALL.iter() {
            let config = source.config().unwrap();
            assert_eq!(config.source, *source);
            assert!(!config.listing.items.is_empty());
            assert!(!config.detail.chapters.is_empty());
        }
        assert!(Source::Nineanime.config().unwrap().reader.is_empty());
        assert!(!Source::Komiku.config().unwrap().reader.is_empty());
    }

    #[test]
    fn source_names_round_trip() {
        for source in Source::ALL.iter() {
            assert_eq!(source.as_str().parse::<Source>(), Ok(*source));
        }
        assert!("mangadex".parse::<Source>().is_err());
    }

    #[test]
    fn origin_defaults_to_seed_origin() {
        let config = SourceConfig::builder()
            .source(Source::Westmanga)
            .seed_url(Url::parse("https://westmanga.me/manga/?order=update&page=1").unwrap())
            .finish()
            .unwrap();
        assert_eq!(config.origin().as_str(), "https://westmanga.me/");
        assert_eq!(config.timeouts, StageTimeouts::default());
    }

    #[test]
    fn missing_seed_is_a_config_error() {
        let err = SourceConfig::builder().source(Source::Komiku).finish();
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
