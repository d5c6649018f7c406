//! First `<img>` element in the document.

use super::{ImageStrategy, Lookup, MatchSource};
use scraper::{Html, Selector};

pub struct ImgTagStrategy;

impl ImageStrategy for ImgTagStrategy {
    fn find(&self, doc: &Html) -> Lookup {
        let img_sel = Selector::parse("img").unwrap();
        // Later images are never consulted, even when the first has no src.
        doc.select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.is_empty())
            .map(str::to_string)
            .into()
    }

    fn source(&self) -> MatchSource {
        MatchSource::ImgTag
    }
}
