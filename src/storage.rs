//! Catalog database.
//! Uses diesel with SQLite backend. Each work is reconciled in its own transaction.

use crate::catalog::{Chapter, Work};
use crate::error::{Error, Result};
use crate::models::{
    ChapterRecord, GenreRecord, NewGenre, NewPage, PageRecord, WorkGenreLink, WorkListing, WorkRecord,
};
use crate::order::cmp_order_keys;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

embed_migrations!("migrations");

/// Row counts of every catalog table.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogCounts {
    pub works: i64,
    pub chapters: i64,
    pub pages: i64,
    pub genres: i64,
    pub genre_links: i64,
}

/// Database wrapper instance.
pub struct Storage {
    conn: SqliteConnection,
}

impl Storage {
    /// Opens (or creates) the database at `path` and applies pending migrations.
    pub fn open(path: &str) -> Result<Self> {
        let conn = SqliteConnection::establish(path)?;
        conn.execute("PRAGMA foreign_keys = ON")?;
        embedded_migrations::run(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub fn connection(&self) -> &SqliteConnection {
        &self.conn
    }

    /// Writes one work with its genres, chapters and pages in a single transaction.
    ///
    /// Chapters and pages are replaced by what `work` carries; chapters no longer
    /// listed are removed. On error nothing of this work is changed.
    pub fn reconcile(&self, work: &Work) -> Result<()> {
        self.reconcile_with(work, true)
    }

    /// Like [`reconcile`](Self::reconcile), but keeps the stored pages of chapters that remain.
    pub fn reconcile_metadata(&self, work: &Work) -> Result<()> {
        self.reconcile_with(work, false)
    }

    fn reconcile_with(&self, work: &Work, replace_pages: bool) -> Result<()> {
        let now = chrono::Local::now().naive_local();
        self.conn.transaction::<_, Error, _>(|| {
            self.upsert_work(work, now)?;
            self.relink_genres(work)?;
            self.remove_stale_chapters(work)?;
            for (position, chapter) in work.chapters.iter().enumerate() {
                self.upsert_chapter(&work.id, chapter, position as i32, now)?;
                if replace_pages {
                    self.replace_pages(&work.id, chapter)?;
                }
            }
            Ok(())
        })?;

        log::debug!(
            "Reconciled {} ({} chapters, {} pages)",
            work.id,
            work.chapters.len(),
            work.page_count()
        );
        Ok(())
    }

    fn upsert_work(&self, work: &Work, now: NaiveDateTime) -> Result<()> {
        use crate::schema::works::dsl::*;

        let existing = works
            .find(&work.id)
            .select(created_at)
            .first::<NaiveDateTime>(&self.conn)
            .optional()?;

        if existing.is_some() {
            diesel::update(works.find(&work.id))
                .set((
                    title.eq(&work.title),
                    source_name.eq(work.source),
                    source_url.eq(work.url.as_str()),
                    cover_image_url.eq(work.cover.as_deref()),
                    author.eq(work.author.as_deref()),
                    description.eq(work.description.as_deref()),
                    kind.eq(work.kind.as_deref()),
                    last_ingested_at.eq(now),
                    updated_at.eq(now),
                ))
                .execute(&self.conn)?;
        } else {
            diesel::insert_into(works)
                .values(&WorkRecord {
                    id: work.id.clone(),
                    title: work.title.clone(),
                    source: work.source,
                    source_url: work.url.to_string(),
                    cover_image_url: work.cover.clone(),
                    author: work.author.clone(),
                    description: work.description.clone(),
                    kind: work.kind.clone(),
                    last_ingested_at: now,
                    created_at: now,
                    updated_at: now,
                })
                .execute(&self.conn)?;
        }
        Ok(())
    }

    fn relink_genres(&self, work: &Work) -> Result<()> {
        use crate::schema::work_genres::dsl::*;

        diesel::delete(work_genres.filter(work_id.eq(&work.id))).execute(&self.conn)?;
        for name in &work.genres {
            let genre = self.genre_id(name)?;
            diesel::insert_or_ignore_into(work_genres)
                .values(&WorkGenreLink {
                    work_id: &work.id,
                    genre_id: genre,
                })
                .execute(&self.conn)?;
        }
        Ok(())
    }

    /// Gets or creates the genre row for `genre_name`.
    fn genre_id(&self, genre_name: &str) -> Result<i32> {
        use crate::schema::genres::dsl::*;

        diesel::insert_or_ignore_into(genres)
            .values(&NewGenre { name: genre_name })
            .execute(&self.conn)?;
        Ok(genres
            .filter(name.eq(genre_name))
            .select(id)
            .first::<i32>(&self.conn)?)
    }

    fn remove_stale_chapters(&self, work: &Work) -> Result<()> {
        use crate::schema::{chapters, pages};

        let keep = work.chapters.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        diesel::delete(
            pages::table
                .filter(pages::work_id.eq(&work.id))
                .filter(pages::chapter_id.ne_all(keep.clone())),
        )
        .execute(&self.conn)?;
        let removed = diesel::delete(
            chapters::table
                .filter(chapters::work_id.eq(&work.id))
                .filter(chapters::id.ne_all(keep)),
        )
        .execute(&self.conn)?;
        if removed > 0 {
            log::debug!("Removed {} chapters no longer listed for {}", removed, work.id);
        }
        Ok(())
    }

    fn upsert_chapter(
        &self,
        work: &str,
        chapter: &Chapter,
        position: i32,
        now: NaiveDateTime,
    ) -> Result<()> {
        use crate::schema::chapters::dsl::*;

        let key = (chapter.id.as_str(), work);
        let url = chapter.url.as_ref().map(|u| u.as_str());
        let existing = chapters
            .find(key)
            .select(created_at)
            .first::<NaiveDateTime>(&self.conn)
            .optional()?;

        if existing.is_some() {
            diesel::update(chapters.find(key))
                .set((
                    title.eq(&chapter.title),
                    order_key.eq(chapter.order_key),
                    source_url.eq(url),
                    list_position.eq(position),
                    scraped_at.eq(now),
                    updated_at.eq(now),
                ))
                .execute(&self.conn)?;
        } else {
            diesel::insert_into(chapters)
                .values(&ChapterRecord {
                    id: chapter.id.clone(),
                    work_id: work.to_string(),
                    order_key: chapter.order_key,
                    title: chapter.title.clone(),
                    source_url: url.map(String::from),
                    list_position: position,
                    scraped_at: now,
                    created_at: now,
                    updated_at: now,
                })
                .execute(&self.conn)?;
        }
        Ok(())
    }

    fn replace_pages(&self, work: &str, chapter: &Chapter) -> Result<()> {
        use crate::schema::pages::dsl::*;

        diesel::delete(pages.filter(work_id.eq(work)).filter(chapter_id.eq(&chapter.id)))
            .execute(&self.conn)?;

        let recs = chapter
            .pages
            .iter()
            .map(|page| NewPage {
                work_id: work,
                chapter_id: &chapter.id,
                ordinal: page.ordinal,
                image_url: &page.image_url,
            })
            .collect::<Vec<_>>();
        if !recs.is_empty() {
            diesel::insert_into(pages).values(&recs).execute(&self.conn)?;
        }
        Ok(())
    }

    /// Stored works ordered by title, with their chapter counts.
    pub fn works(&self) -> Result<Vec<WorkListing>> {
        use crate::schema::{chapters, works};

        let recs = works::table
            .order_by(works::title)
            .load::<WorkRecord>(&self.conn)?;
        recs.into_iter()
            .map(|work| {
                let count = chapters::table
                    .filter(chapters::work_id.eq(&work.id))
                    .count()
                    .get_result::<i64>(&self.conn)?;
                Ok(WorkListing {
                    work,
                    chapters: count,
                })
            })
            .collect()
    }

    pub fn work(&self, work: &str) -> Result<Option<WorkRecord>> {
        use crate::schema::works::dsl::*;
        Ok(works.find(work).first::<WorkRecord>(&self.conn).optional()?)
    }

    /// Chapters of a work: order key descending with keyless chapters last,
    /// ties broken by creation time, then by list position.
    pub fn chapters_of(&self, work: &str) -> Result<Vec<ChapterRecord>> {
        use crate::schema::chapters::dsl::*;

        let mut recs = chapters
            .filter(work_id.eq(work))
            .load::<ChapterRecord>(&self.conn)?;
        recs.sort_by(|a, b| {
            cmp_order_keys(a.order_key, b.order_key)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.list_position.cmp(&b.list_position))
        });
        Ok(recs)
    }

    /// Pages of a chapter by ordinal. Empty when the chapter has no pages yet.
    pub fn pages_of(&self, work: &str, chapter: &str) -> Result<Vec<PageRecord>> {
        use crate::schema::pages::dsl::*;

        Ok(pages
            .filter(work_id.eq(work))
            .filter(chapter_id.eq(chapter))
            .order_by(ordinal)
            .load::<PageRecord>(&self.conn)?)
    }

    pub fn genres_of(&self, work: &str) -> Result<Vec<String>> {
        use crate::schema::{genres, work_genres};

        Ok(work_genres::table
            .inner_join(genres::table)
            .filter(work_genres::work_id.eq(work))
            .select(genres::name)
            .order_by(genres::name)
            .load::<String>(&self.conn)?)
    }

    pub fn genres(&self) -> Result<Vec<GenreRecord>> {
        use crate::schema::genres::dsl::*;
        Ok(genres.order_by(name).load::<GenreRecord>(&self.conn)?)
    }

    pub fn counts(&self) -> Result<CatalogCounts> {
        use crate::schema::{chapters, genres, pages, work_genres, works};

        Ok(CatalogCounts {
            works: works::table.count().get_result(&self.conn)?,
            chapters: chapters::table.count().get_result(&self.conn)?,
            pages: pages::table.count().get_result(&self.conn)?,
            genres: genres::table.count().get_result(&self.conn)?,
            genre_links: work_genres::table.count().get_result(&self.conn)?,
        })
    }
}
