#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

#[cfg(feature = "browser")]
pub mod browser;
pub mod cascade;
pub mod catalog;
pub mod detail;
pub mod document;
pub mod error;
pub mod models;
pub mod order;
pub mod pages;
pub mod report;
pub mod schema;
pub mod scraper;
pub mod session;
pub mod source;
pub mod storage;
pub mod util;
pub mod walker;
#[cfg(feature = "serve")]
pub mod web;

pub use crate::catalog::{Chapter, Page, Stub, Work};
pub use crate::error::{Error, Result};
pub use crate::report::{IngestSummary, RunEvent, StopReason};
pub use crate::scraper::{ingest, ingest_with, Ingestor, RunOptions};
pub use crate::source::{Source, SourceConfig};
pub use crate::storage::Storage;
