use super::{DetailStrategies, ListingStrategies, Source, SourceConfig};
use crate::cascade::{Cascade, ScopeCascade, Strategy};
use crate::document::{Extract, FirstChild, LastChild, Selector};
use crate::error::Result;
use select::predicate::{And, Attr, Child, Class, Descendant, Name, Or};
use url::Url;

const SEED_URL: &str = "https://komiku.id/daftar-komik/";

pub(crate) fn config() -> Result<SourceConfig> {
    let listing = ListingStrategies {
        items: ScopeCascade::new(vec![
            Selector::new(Or(And(Name("div"), Class("ls4")), And(Name("div"), Class("ls1")))),
            Selector::new(And(Name("div"), Class("bge"))),
            Selector::new(And(Name("article"), Class("manga"))),
        ]),
        title: Cascade::new(vec![
            Strategy::text(Descendant(Name("h4"), Name("a"))),
            Strategy::text(Descendant(Name("h3"), Name("a"))),
            Strategy::text(Name("h3")),
        ]),
        url: Cascade::new(vec![
            Strategy::attr(Descendant(Name("h4"), Name("a")), "href"),
            Strategy::attr(Descendant(Name("h3"), Name("a")), "href"),
            Strategy::attr(Name("a"), "href"),
        ]),
        cover: Cascade::new(vec![Strategy::new(Name("img"), Extract::first_attr(&["data-src", "src"]))]),
        kind: Cascade::new(vec![
            Strategy::text(Child(And(Name("span"), Class("kotak")), And(Name("span"), FirstChild))),
            Strategy::text(Descendant(And(Name("div"), Class("ls4jdl")), And(Name("span"), FirstChild))),
            Strategy::text(Descendant(And(Name("div"), Class("tpe1_inf")), Name("b"))),
        ]),
        next_page: Cascade::new(vec![
            Strategy::attr(And(Name("a"), And(Class("next"), Class("page-numbers"))), "href"),
            Strategy::attr(And(Name("link"), Attr("rel", "next")), "href"),
            Strategy::attr(
                Descendant(And(Name("div"), Class("pagination")), And(Name("a"), Class("next"))),
                "href",
            ),
        ]),
        allowed_kinds: vec!["Manhwa".to_string(), "Manhua".to_string()],
        infer_kind: true,
    };

    let cover_img = || Extract::first_attr(&["src", "data-src"]);
    let detail = DetailStrategies {
        title: Cascade::new(vec![
            Strategy::text(And(Name("h1"), Class("title"))),
            Strategy::text(Descendant(Attr("id", "Judul"), Name("h1"))),
            Strategy::text(Name("h1")),
        ]),
        title_prefix: Some("Komik".to_string()),
        cover: Cascade::new(vec![
            Strategy::new(Descendant(And(Name("div"), Class("ims")), Name("img")), cover_img()),
            Strategy::new(Descendant(And(Name("div"), Class("thumb")), Name("img")), cover_img()),
        ]),
        synopsis: Cascade::new(vec![
            Strategy::text(Descendant(Attr("id", "Sinopsis"), Name("p"))),
            Strategy::text(Descendant(And(Name("div"), Class("desc")), Name("p"))),
            Strategy::text(Descendant(Class("series-synops"), Name("p"))),
            Strategy::text(Descendant(And(Name("div"), Class("entry-content")), Name("p"))),
        ]),
        genres: Cascade::new(vec![
            Strategy::text(Descendant(Class("genre-info"), Name("a"))),
            Strategy::text(Descendant(Descendant(And(Name("ul"), Class("genre")), Name("li")), Name("a"))),
            Strategy::text(Descendant(Class("gnr"), Name("a"))),
            Strategy::text(Descendant(Class("seriestogenre"), Name("a"))),
        ]),
        max_genre_len: 40,
        info_rows: ScopeCascade::new(vec![
            Selector::new(Descendant(And(Name("table"), Class("inftable")), Name("tr"))),
            Selector::new(Descendant(And(Name("table"), Class("tbl")), Name("tr"))),
            Selector::new(Descendant(Class("spe"), Name("span"))),
            Selector::new(Descendant(Class("infox"), Class("fmed"))),
        ]),
        info_value: Cascade::new(vec![
            Strategy::text(And(Name("td"), LastChild)),
            Strategy::text(Descendant(Name("span"), Name("a"))),
            Strategy::text(Descendant(Name("span"), Name("b"))),
            Strategy::text(Name("a")),
        ]),
        author_labels: vec![
            "author".to_string(),
            "pengarang".to_string(),
            "penulis".to_string(),
            "komikus".to_string(),
        ],
        chapters: ScopeCascade::new(vec![
            Selector::new(Descendant(
                Descendant(Attr("id", "Daftar_Chapter"), And(Name("td"), Class("judulseries"))),
                Name("a"),
            )),
            Selector::new(Descendant(Descendant(Class("eps_lst"), Name("li")), Name("a"))),
            Selector::new(Descendant(Descendant(And(Name("ul"), Class("clstyle")), Name("li")), Name("a"))),
            Selector::new(Descendant(Descendant(Class("chapterlist"), Name("li")), Name("a"))),
        ]),
        chapter_title: Cascade::new(vec![
            Strategy::text(Class("chapternum")),
            Strategy::text(Name("span")),
            Strategy::this(Extract::Text),
        ]),
        chapter_url: Cascade::new(vec![Strategy::this(Extract::attr("href"))]),
    };

    let lazy_img = || Extract::first_attr(&["data-src", "data-lazy-src", "src"]);
    SourceConfig::builder()
        .source(Source::Komiku)
        .seed_url(Url::parse(SEED_URL)?)
        .listing(listing)
        .detail(detail)
        .reader(Cascade::new(vec![
            Strategy::new(Descendant(Attr("id", "Baca_Komik"), Name("img")), lazy_img()),
            Strategy::new(Descendant(And(Name("div"), Class("reader-area")), Name("img")), lazy_img()),
            Strategy::new(Descendant(Attr("id", "readerarea"), Name("img")), lazy_img()),
        ]))
        .finish()
}
