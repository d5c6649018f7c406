//! Open Graph `og:image` meta tag.

use super::{ImageStrategy, Lookup, MatchSource};
use scraper::{Html, Selector};

pub struct OgImageStrategy;

impl ImageStrategy for OgImageStrategy {
    fn find(&self, doc: &Html) -> Lookup {
        let meta_sel = Selector::parse(r#"meta[property="og:image"]"#).unwrap();
        // Only the first og:image tag counts. A tag without a content
        // attribute ends the lookup with no result.
        match doc.select(&meta_sel).next() {
            Some(meta) => match meta.value().attr("content") {
                Some(content) => Lookup::Found(content.to_string()),
                None => Lookup::Unusable,
            },
            None => Lookup::Missing,
        }
    }

    fn source(&self) -> MatchSource {
        MatchSource::OgImage
    }
}
