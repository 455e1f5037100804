use super::{DetailStrategies, ListingStrategies, Source, SourceConfig};
use crate::cascade::{Cascade, ScopeCascade, Strategy};
use crate::document::{Extract, LastChild, Selector};
use crate::error::Result;
use select::predicate::{And, Attr, Class, Descendant, Name};
use url::Url;

const SEED_URL: &str = "https://westmanga.me/manga/?order=update";

pub(crate) fn config() -> Result<SourceConfig> {
    let listing = ListingStrategies {
        items: ScopeCascade::new(vec![
            Selector::new(Descendant(Class("listupd"), Class("bs"))),
            Selector::new(Descendant(Class("listupd"), Class("utao"))),
            Selector::new(Class("bsx")),
        ]),
        title: Cascade::new(vec![
            Strategy::text(Class("tt")),
            Strategy::attr(And(Name("a"), Attr("title", ())), "title"),
        ]),
        url: Cascade::new(vec![Strategy::attr(Name("a"), "href")]),
        cover: Cascade::new(vec![Strategy::new(Name("img"), Extract::first_attr(&["data-src", "src"]))]),
        kind: Cascade::new(vec![
            Strategy::text(Class("type")),
            Strategy::text(Descendant(Class("limit"), Class("type"))),
        ]),
        next_page: Cascade::new(vec![
            Strategy::attr(Descendant(Class("hpage"), And(Name("a"), Class("r"))), "href"),
            Strategy::attr(And(Name("a"), And(Class("next"), Class("page-numbers"))), "href"),
            Strategy::attr(And(Name("link"), Attr("rel", "next")), "href"),
        ]),
        allowed_kinds: Vec::new(),
        infer_kind: false,
    };

    let detail = DetailStrategies {
        title: Cascade::new(vec![
            Strategy::text(And(Name("h1"), Class("entry-title"))),
            Strategy::text(Name("h1")),
        ]),
        title_prefix: Some("Komik".to_string()),
        cover: Cascade::new(vec![
            Strategy::new(Descendant(Class("thumb"), Name("img")), Extract::first_attr(&["src", "data-src"])),
            Strategy::attr(And(Name("meta"), Attr("property", "og:image")), "content"),
        ]),
        synopsis: Cascade::new(vec![
            Strategy::text(Descendant(And(Class("entry-content"), Attr("itemprop", "description")), Name("p"))),
            Strategy::text(Descendant(Class("entry-content"), Name("p"))),
            Strategy::text(Class("entry-content")),
        ]),
        genres: Cascade::new(vec![
            Strategy::text(Descendant(Class("genre-info"), Name("a"))),
            Strategy::text(Descendant(Class("mgen"), Name("a"))),
            Strategy::text(Descendant(Class("seriestogenre"), Name("a"))),
        ]),
        max_genre_len: 40,
        info_rows: ScopeCascade::new(vec![
            Selector::new(Descendant(Class("infox"), Class("fmed"))),
            Selector::new(Descendant(Class("tsinfo"), Class("imptdt"))),
            Selector::new(Descendant(And(Name("table"), Class("infotable")), Name("tr"))),
        ]),
        info_value: Cascade::new(vec![
            Strategy::text(Name("span")),
            Strategy::text(Name("i")),
            Strategy::text(And(Name("td"), LastChild)),
        ]),
        author_labels: vec![
            "author".to_string(),
            "pengarang".to_string(),
            "penulis".to_string(),
        ],
        chapters: ScopeCascade::new(vec![
            Selector::new(Descendant(Descendant(Attr("id", "chapterlist"), Name("li")), Name("a"))),
            Selector::new(Descendant(Descendant(Class("eplister"), Name("li")), Name("a"))),
            Selector::new(Descendant(Descendant(Class("cl"), Name("li")), Name("a"))),
        ]),
        chapter_title: Cascade::new(vec![
            Strategy::text(Class("chapternum")),
            Strategy::this(Extract::Text),
        ]),
        chapter_url: Cascade::new(vec![Strategy::this(Extract::attr("href"))]),
    };

    let lazy_img = || Extract::first_attr(&["data-src", "data-lazy-src", "src"]);
    SourceConfig::builder()
        .source(Source::Westmanga)
        .seed_url(Url::parse(SEED_URL)?)
        .listing(listing)
        .detail(detail)
        .reader(Cascade::new(vec![
            Strategy::new(Descendant(Class("reader-area"), Name("img")), lazy_img()),
            Strategy::new(Descendant(Attr("id", "readerarea"), Name("img")), lazy_img()),
        ]))
        .finish()
}
