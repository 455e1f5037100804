use anyhow::Context;
use komikin::report::IngestSummary;
use komikin::{RunOptions, Source, Storage};
use std::path::{Path, PathBuf};
use std::time::Duration;
use structopt::StructOpt;
use url::Url;

const DEFAULT_DATABASE_NAME: &str = "komikin.sqlite";
const DEFAULT_LOG_ENV: &str = "komikin=info";

#[derive(Debug, StructOpt)]
#[structopt(name = "komikin", about = "comic catalog ingester")]
enum Cmd {
    /// Run DB migrations on given database path.
    #[structopt(name = "setup")]
    Setup {
        /// Database path. If not provided defaults to ~/komikin.sqlite
        #[structopt(parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Ingest one source into the catalog.
    #[structopt(name = "ingest")]
    Ingest {
        /// One of komiku, westmanga, nineanime.
        source: Source,
        /// Database path. If not provided defaults to ~/komikin.sqlite
        #[structopt(parse(from_os_str))]
        db: Option<PathBuf>,
        /// Listing URL to start from instead of the source's default.
        #[structopt(long)]
        seed: Option<Url>,
        /// Listing pages to walk at most.
        #[structopt(long, default_value = "20")]
        max_pages: usize,
        /// Works to process at most.
        #[structopt(long)]
        max_items: Option<usize>,
        /// Stop after this many seconds.
        #[structopt(long)]
        deadline_secs: Option<u64>,
        /// Skip chapter reader pages; stored pages are kept.
        #[structopt(long)]
        no_pages: bool,
        /// Print the run summary as JSON.
        #[structopt(long)]
        json: bool,
        /// Browse with a headless Chromium so script-loaded reader pages are settled.
        #[structopt(long)]
        browser: bool,
    },

    /// List stored works with their chapter counts.
    #[structopt(name = "list")]
    List {
        /// Database path. If not provided defaults to ~/komikin.sqlite
        #[structopt(parse(from_os_str))]
        db: Option<PathBuf>,
    },

    /// Serve the ingestion trigger and catalog over HTTP.
    #[structopt(name = "serve")]
    Serve {
        /// Database path. If not provided defaults to ~/komikin.sqlite
        #[structopt(parse(from_os_str))]
        db: Option<PathBuf>,
        /// Address to listen HTTP requests.
        #[structopt(short, long, default_value = "localhost:8333")]
        addr: String,
    },
}

impl Cmd {
    fn process(self) -> anyhow::Result<()> {
        match self {
            Cmd::Setup { db } => {
                let dbpath = database_path(db)?;
                log::info!("Setup executing on {:?}", &dbpath);
                open_storage(&dbpath)?;
                log::info!("Setup succeeded.");
            }
            Cmd::Ingest {
                source,
                db,
                seed,
                max_pages,
                max_items,
                deadline_secs,
                no_pages,
                json,
                browser,
            } => {
                let storage = open_storage(&database_path(db)?)?;

                let mut builder = RunOptions::builder();
                builder.max_pages(max_pages).resolve_pages(!no_pages);
                if let Some(n) = max_items {
                    builder.max_items(n);
                }
                if let Some(secs) = deadline_secs {
                    builder.deadline(Duration::from_secs(secs));
                }
                let options = builder.build().map_err(|e| anyhow::anyhow!(e.to_string()))?;

                let summary = if browser {
                    ingest_in_browser(&storage, source, seed, options)
                } else {
                    komikin::ingest(&storage, source, seed, options).map_err(anyhow::Error::from)
                }
                .with_context(|| format!("Ingestion of {} failed", source))?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    print_summary(&summary);
                }
            }
            Cmd::List { db } => {
                let storage = open_storage(&database_path(db)?)?;
                for listing in storage.works()? {
                    println!(
                        "{}\t{}\t{}\t{} chapters",
                        listing.work.source, listing.work.id, listing.work.title, listing.chapters
                    );
                }
            }
            #[cfg(not(feature = "serve"))]
            Cmd::Serve { .. } => anyhow::bail!("Feature `serve` not enabled for this subcommand"),
            #[cfg(feature = "serve")]
            Cmd::Serve { db, addr } => {
                let dbpath = database_path(db)?;
                let storage = open_storage(&dbpath)?;
                log::info!("Serving {:?} on {}", dbpath, addr);
                komikin::web::serve(addr, storage)?;
            }
        }

        Ok(())
    }
}

fn database_path(db: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => {
            let mut path = dirs::home_dir().context("Unable to get home directory of current user")?;
            path.push(DEFAULT_DATABASE_NAME);
            Ok(path)
        }
    }
}

fn open_storage(dbpath: &Path) -> anyhow::Result<Storage> {
    if log::log_enabled!(log::Level::Info) {
        log::info!("Opening SQLite DB at {:?}", dbpath);
    }
    let path = dbpath.to_str().context("Converting PathBuf to &str failed")?;
    Storage::open(path).with_context(|| format!("Cannot open database {}", path))
}

#[cfg(feature = "browser")]
fn ingest_in_browser(
    storage: &Storage,
    source: Source,
    seed: Option<Url>,
    options: RunOptions,
) -> anyhow::Result<IngestSummary> {
    let session = komikin::browser::BrowserSession::launch(None, options.delay)?;
    Ok(komikin::ingest_with(session, storage, source, seed, options)?)
}

#[cfg(not(feature = "browser"))]
fn ingest_in_browser(_: &Storage, _: Source, _: Option<Url>, _: RunOptions) -> anyhow::Result<IngestSummary> {
    anyhow::bail!("Feature `browser` not enabled for --browser")
}

fn print_summary(summary: &IngestSummary) {
    println!(
        "{}: ingested {} of {} discovered ({} resolved)",
        summary.source, summary.ingested, summary.discovered, summary.resolved
    );
    if let Some(reason) = summary.stopped {
        println!("stopped early: {:?}", reason);
    }
    for work in &summary.works {
        println!("  {}\t{} chapters\t{} pages", work.id, work.chapters, work.pages);
    }
    for event in &summary.events {
        println!("  [{:?}/{:?}] {}: {}", event.stage, event.kind, event.target, event.message);
    }
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(DEFAULT_LOG_ENV));

    let opt = Cmd::from_args();
    log::debug!("opt: {:?}", opt);

    if let Err(e) = opt.process() {
        log::error!("Error: {:#}", e);
        std::process::exit(1)
    }
}
