//! Inline `background-image:url(...)` on a `bg-cover` header.
//!
//! Street-art marker pages render the artwork as a CSS background on a
//! `<header class="... bg-cover ...">` instead of an `<img>`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{ImageStrategy, Lookup, MatchSource};

static BACKGROUND_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"background-image:url\((.*?)\)").unwrap());

pub struct BackgroundCoverStrategy;

impl ImageStrategy for BackgroundCoverStrategy {
    fn find(&self, doc: &Html) -> Lookup {
        let header_sel = Selector::parse(r#"header[class*="bg-cover"]"#).unwrap();
        let Some(header) = doc.select(&header_sel).next() else {
            return Lookup::Missing;
        };
        let style = header.value().attr("style").unwrap_or("");
        background_image_url(style).map(str::to_string).into()
    }

    fn source(&self) -> MatchSource {
        MatchSource::BackgroundCover
    }
}

/// Text between `background-image:url(` and the next `)`, untrimmed.
fn background_image_url(style: &str) -> Option<&str> {
    BACKGROUND_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
