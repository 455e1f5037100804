//! On-demand ingestion trigger and read-only catalog endpoints over HTTP.
//!
//! - `POST /ingest/<source>?seed=<url>&max_items=<n>&max_pages=<n>` runs one ingestion
//! - `GET /works`
//! - `GET /works/<id>`
//! - `GET /works/<id>/chapters/<chapter>`

use crate::error::{Error, Result};
use crate::report::IngestSummary;
use crate::scraper::{self, RunOptions};
use crate::source::Source;
use crate::storage::Storage;
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server};
use url::Url;

#[derive(Debug, PartialEq)]
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &Error::from(e)),
        }
    }

    fn error(status: u16, message: &dyn std::fmt::Display) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.to_string() }).to_string(),
        }
    }
}

#[derive(Serialize)]
struct WorkDetail<'a> {
    #[serde(flatten)]
    work: &'a crate::models::WorkRecord,
    genres: Vec<String>,
    chapters: Vec<crate::models::ChapterRecord>,
}

/// Serves requests one at a time until the listener fails.
pub fn serve(addr: impl std::net::ToSocketAddrs, storage: Storage) -> Result<()> {
    let server = Server::http(addr).map_err(|e| Error::Server(e.to_string()))?;
    log::info!("Listening on {}", server.server_addr());

    let json = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| Error::Server("invalid content type header".to_string()))?;

    for request in server.incoming_requests() {
        let reply = handle(&storage, request.method(), request.url(), scraper::ingest);
        log::info!("{} {} -> {}", request.method(), request.url(), reply.status);

        let response = Response::from_string(reply.body)
            .with_status_code(reply.status)
            .with_header(json.clone());
        if let Err(e) = request.respond(response) {
            log::warn!("Cannot send response: {}", e);
        }
    }
    Ok(())
}

pub(crate) fn handle<F>(storage: &Storage, method: &Method, url: &str, ingest: F) -> Reply
where
    F: FnOnce(&Storage, Source, Option<Url>, RunOptions) -> Result<IngestSummary>,
{
    let url = match Url::parse("http://localhost/").and_then(|base| base.join(url)) {
        Ok(url) => url,
        Err(e) => return Reply::error(400, &e),
    };
    let segments = url
        .path_segments()
        .map(|s| s.filter(|s| !s.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default();

    match (method, segments.as_slice()) {
        (Method::Post, ["ingest", source]) => {
            let source = match source.parse::<Source>() {
                Ok(source) => source,
                Err(e) => return Reply::error(404, &e),
            };
            let (seed, options) = match run_params(&url) {
                Ok(params) => params,
                Err(e) => return Reply::error(400, &e),
            };
            match ingest(storage, source, seed, options) {
                Ok(summary) => Reply::json(200, &summary),
                Err(e) => {
                    log::error!("Ingestion of {} failed: {}", source, e);
                    Reply::error(500, &e)
                }
            }
        }
        (Method::Get, ["works"]) => match storage.works() {
            Ok(works) => Reply::json(200, &works),
            Err(e) => Reply::error(500, &e),
        },
        (Method::Get, ["works", id]) => match work_detail(storage, id) {
            Ok(Some(reply)) => reply,
            Ok(None) => Reply::error(404, &format!("no work {}", id)),
            Err(e) => Reply::error(500, &e),
        },
        (Method::Get, ["works", id, "chapters", chapter]) => match storage.pages_of(id, chapter) {
            Ok(pages) => Reply::json(200, &pages),
            Err(e) => Reply::error(500, &e),
        },
        _ => Reply::error(404, &"not found"),
    }
}

fn work_detail(storage: &Storage, id: &str) -> Result<Option<Reply>> {
    let work = match storage.work(id)? {
        Some(work) => work,
        None => return Ok(None),
    };
    let detail = WorkDetail {
        work: &work,
        genres: storage.genres_of(id)?,
        chapters: storage.chapters_of(id)?,
    };
    Ok(Some(Reply::json(200, &detail)))
}

fn run_params(url: &Url) -> std::result::Result<(Option<Url>, RunOptions), String> {
    let mut seed = None;
    let mut options = RunOptions::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "seed" => seed = Some(Url::parse(&value).map_err(|e| format!("seed: {}", e))?),
            "max_items" => {
                options.max_items = Some(value.parse().map_err(|_| format!("max_items: {}", value))?)
            }
            "max_pages" => options.max_pages = value.parse().map_err(|_| format!("max_pages: {}", value))?,
            "pages" => options.resolve_pages = value != "0" && value != "false",
            other => return Err(format!("unknown parameter {}", other)),
        }
    }
    Ok((seed, options))
}
