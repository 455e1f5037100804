use super::{DetailStrategies, ListingStrategies, Source, SourceConfig};
use crate::cascade::{Cascade, ScopeCascade, Strategy};
use crate::document::{Extract, Selector};
use crate::error::Result;
use select::predicate::{And, Attr, Class, Descendant, Name};
use url::Url;

const SEED_URL: &str = "https://9animetv.to/home";

/// Episodes are stored as chapters. Video sources are not extracted, so there is no reader cascade.
pub(crate) fn config() -> Result<SourceConfig> {
    let listing = ListingStrategies {
        items: ScopeCascade::new(vec![Selector::new(Descendant(Class("film_list-wrap"), Class("flw-item")))]),
        title: Cascade::new(vec![
            Strategy::text(Class("film-name")),
            Strategy::attr(Class("film-poster-ahref"), "title"),
        ]),
        url: Cascade::new(vec![
            Strategy::attr(Class("film-poster-ahref"), "href"),
            Strategy::attr(Descendant(Class("film-name"), Name("a")), "href"),
        ]),
        cover: Cascade::new(vec![Strategy::new(Name("img"), Extract::first_attr(&["data-src", "src"]))]),
        kind: Cascade::new(vec![Strategy::text(Descendant(Class("fd-infor"), Class("fdi-item")))]),
        next_page: Cascade::new(vec![
            Strategy::attr(Descendant(Class("pagination"), And(Name("a"), Attr("title", "Next"))), "href"),
            Strategy::attr(And(Name("a"), And(Class("page-link"), Attr("title", "Next"))), "href"),
        ]),
        allowed_kinds: Vec::new(),
        infer_kind: false,
    };

    let detail = DetailStrategies {
        title: Cascade::new(vec![
            Strategy::text(And(Name("h2"), Class("film-name"))),
            Strategy::text(Class("film-name")),
        ]),
        title_prefix: None,
        cover: Cascade::new(vec![Strategy::attr(Descendant(Class("film-poster"), Name("img")), "src")]),
        synopsis: Cascade::new(vec![
            Strategy::text(Descendant(Class("film-description"), Class("shorting"))),
            Strategy::text(Class("film-description")),
        ]),
        genres: Cascade::new(vec![Strategy::text(Descendant(
            Descendant(Class("film-info"), Class("genres")),
            Name("a"),
        ))]),
        max_genre_len: 40,
        info_rows: ScopeCascade::new(vec![Selector::new(Descendant(Class("meta"), Class("item")))]),
        info_value: Cascade::new(vec![Strategy::text(Class("item-content"))]),
        author_labels: vec!["studios".to_string()],
        chapters: ScopeCascade::new(vec![
            Selector::new(Descendant(Class("ss-list"), Name("a"))),
            Selector::new(Descendant(Class("episodes-ul"), Name("a"))),
        ]),
        chapter_title: Cascade::new(vec![
            Strategy::this(Extract::attr("title")),
            Strategy::this(Extract::Text),
        ]),
        chapter_url: Cascade::new(vec![Strategy::this(Extract::attr("href"))]),
    };

    SourceConfig::builder()
        .source(Source::Nineanime)
        .seed_url(Url::parse(SEED_URL)?)
        .listing(listing)
        .detail(detail)
        .finish()
}
