use crate::schema::{chapters, genres, pages, work_genres, works};
use crate::source::Source;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Queryable, Insertable, Serialize, Debug, Clone, PartialEq)]
#[table_name = "works"]
pub struct WorkRecord {
    pub id: String,
    pub title: String,
    #[column_name = "source_name"]
    pub source: Source,
    pub source_url: String,
    pub cover_image_url: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub last_ingested_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct GenreRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Debug)]
#[table_name = "genres"]
pub(crate) struct NewGenre<'a> {
    pub(crate) name: &'a str,
}

#[derive(Insertable, Debug)]
#[table_name = "work_genres"]
pub(crate) struct WorkGenreLink<'a> {
    pub(crate) work_id: &'a str,
    pub(crate) genre_id: i32,
}

#[derive(Queryable, Insertable, Serialize, Debug, Clone, PartialEq)]
#[table_name = "chapters"]
pub struct ChapterRecord {
    pub id: String,
    pub work_id: String,
    /// Sort descending, `None` last.
    pub order_key: Option<f64>,
    pub title: String,
    pub source_url: Option<String>,
    /// Position in the detail page's chapter list at the last ingestion.
    pub list_position: i32,
    pub scraped_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i32,
    pub work_id: String,
    pub chapter_id: String,
    pub ordinal: i32,
    pub image_url: String,
}

#[derive(Insertable, Debug)]
#[table_name = "pages"]
pub(crate) struct NewPage<'a> {
    pub(crate) work_id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) ordinal: i32, // 1-based index
    pub(crate) image_url: &'a str,
}

/// A stored work with its chapter count, for listings.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WorkListing {
    #[serde(flatten)]
    pub work: WorkRecord,
    pub chapters: i64,
}
