use komikin::report::{EventKind, Stage};
use komikin::session::HttpSession;
use komikin::{Ingestor, RunOptions, Source, Storage};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use url::Url;

const LISTING_1: &str = r#"<html><body>
  <div class="listupd">
    <div class="bs"><a href="/manga/tower/"><img data-src="/covers/tower.jpg" src="/blank.gif"><span class="type">Manhwa</span><div class="tt">Tower</div></a></div>
    <div class="bs"><a href="/manga/gone/"><span class="type">Manhua</span><div class="tt">Gone</div></a></div>
  </div>
  <div class="hpage"><a class="r" href="/manga/?order=update&amp;page=2">Next</a></div>
</body></html>"#;

const LISTING_2: &str = r#"<html><body>
  <div class="listupd">
    <div class="bs"><a href="/manga/tower/"><span class="type">Manhwa</span><div class="tt">Tower (again)</div></a></div>
    <div class="bs"><a href="/manga/river/"><span class="type">Manhua</span><div class="tt">River</div></a></div>
  </div>
</body></html>"#;

const TOWER: &str = r#"<html><body>
  <h1 class="entry-title">Komik Tower</h1>
  <div class="infox"><div class="fmed"><b>Author</b><span>SIU</span></div></div>
  <div class="entry-content"><p>A boy climbs a tower.</p></div>
  <div class="mgen"><a>Action</a><a>Fantasy</a></div>
  <div id="chapterlist"><ul>
    <li><a href="/tower-chapter-2/"><span class="chapternum">Chapter 2</span></a></li>
    <li><a href="/tower-chapter-1/"><span class="chapternum">Chapter 1</span></a></li>
  </ul></div>
</body></html>"#;

const RIVER: &str = r#"<html><body>
  <h1 class="entry-title">River</h1>
  <p>Author: Mo Xiang</p>
  <div class="mgen"><a>Fantasy</a></div>
  <div id="chapterlist"><ul>
    <li><a href="/river-chapter-1/"><span class="chapternum">Chapter 1</span></a></li>
  </ul></div>
</body></html>"#;

const TOWER_2: &str = r#"<div class="reader-area">
  <img data-src="/img/t2-1.jpg" src="/blank.gif"><img data-src="/img/t2-1.jpg" src="/blank.gif"><img data-src="/img/t2-2.jpg" src="/blank.gif">
</div>"#;

const TOWER_1: &str = r#"<div class="reader-area"><img src="/img/t1-1.jpg"></div>"#;

fn spawn_site() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", server.server_addr());
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }
        let request = match server.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(_) => break,
        };

        let body = match request.url() {
            "/manga/?order=update" => Some(LISTING_1),
            "/manga/?order=update&page=2" => Some(LISTING_2),
            "/manga/tower/" => Some(TOWER),
            "/manga/river/" => Some(RIVER),
            "/tower-chapter-2/" => Some(TOWER_2),
            "/tower-chapter-1/" => Some(TOWER_1),
            _ => None,
        };
        let response = match body {
            Some(html) => tiny_http::Response::from_data(html.as_bytes().to_vec())
                .with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                        .unwrap(),
                ),
            None => tiny_http::Response::from_data(b"not found".to_vec()).with_status_code(tiny_http::StatusCode(404)),
        };
        let _ = request.respond(response);
    });

    (base_url, shutdown_tx, handle)
}

fn options() -> RunOptions {
    RunOptions::builder()
        .delay((Duration::from_millis(0), Duration::from_millis(0)))
        .build()
        .unwrap()
}

#[test]
fn ingests_fixture_site_over_http() {
    let (base_url, shutdown, handle) = spawn_site();
    let config = Source::Westmanga
        .config()
        .unwrap()
        .with_seed(Url::parse(&format!("{}/manga/?order=update", base_url)).unwrap());
    let storage = Storage::in_memory().unwrap();

    let session = HttpSession::open(None, options().delay).unwrap();
    let summary = Ingestor::new(session, &storage, options()).run(&config).unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.ingested, 2);
    let skipped = summary.events_for(Stage::Detail).collect::<Vec<_>>();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].kind, EventKind::Skipped);
    assert!(skipped[0].target.ends_with("/manga/gone/"));

    // river's only chapter 404s and is kept without pages
    assert_eq!(summary.events_for(Stage::Pages).count(), 1);

    let tower = storage.work("tower").unwrap().unwrap();
    assert_eq!(tower.title, "Tower");
    assert_eq!(tower.author.as_deref(), Some("SIU"));
    assert_eq!(tower.cover_image_url, Some(format!("{}/covers/tower.jpg", base_url)));
    assert_eq!(storage.work("river").unwrap().unwrap().author.as_deref(), Some("Mo Xiang"));

    let chapters = storage.chapters_of("tower").unwrap();
    assert_eq!(
        chapters.iter().map(|c| c.order_key).collect::<Vec<_>>(),
        vec![Some(2.0), Some(1.0)]
    );
    let pages = storage.pages_of("tower", "tower-chapter-2").unwrap();
    assert_eq!(
        pages.iter().map(|p| (p.ordinal, p.image_url.clone())).collect::<Vec<_>>(),
        vec![
            (1, format!("{}/img/t2-1.jpg", base_url)),
            (2, format!("{}/img/t2-2.jpg", base_url)),
        ]
    );
    assert!(storage.pages_of("river", "river-chapter-1").unwrap().is_empty());

    let counts = storage.counts().unwrap();
    assert_eq!((counts.works, counts.chapters, counts.pages, counts.genres), (2, 3, 3, 2));

    // a second pass over the unchanged site leaves the catalog as it was
    let session = HttpSession::open(None, options().delay).unwrap();
    Ingestor::new(session, &storage, options()).run(&config).unwrap();
    assert_eq!(storage.counts().unwrap(), counts);

    shutdown.send(()).unwrap();
    handle.join().unwrap();
}

#[test]
fn unreachable_seed_fails_the_run() {
    let (base_url, shutdown, handle) = spawn_site();
    let config = Source::Westmanga
        .config()
        .unwrap()
        .with_seed(Url::parse(&format!("{}/missing/", base_url)).unwrap());
    let storage = Storage::in_memory().unwrap();

    let session = HttpSession::open(None, options().delay).unwrap();
    let err = Ingestor::new(session, &storage, options()).run(&config).unwrap_err();
    assert!(matches!(err, komikin::Error::Status(404, _)));
    assert_eq!(storage.counts().unwrap().works, 0);

    shutdown.send(()).unwrap();
    handle.join().unwrap();
}
