//! Image URL strategies and the priority-ordered registry that runs them.
//!
//! Each strategy looks for one kind of image reference in a parsed page.
//! The registry tries them in a fixed order and the first hit wins. A
//! strategy can also end the search early when its element is present but
//! unusable.

mod background_cover;
mod img_tag;
mod og_image;

use html5ever::driver::{self, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use scraper::{Html, HtmlTreeSink};

pub use background_cover::BackgroundCoverStrategy;
pub use img_tag::ImgTagStrategy;
pub use og_image::OgImageStrategy;

// ---------------------------------------------------------------------------
// Match types
// ---------------------------------------------------------------------------

/// Which heuristic produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// `<meta property="og:image" content="...">`
    OgImage,
    /// First `<img src="...">` in the document.
    ImgTag,
    /// `background-image:url(...)` on a `bg-cover` header.
    BackgroundCover,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OgImage => "og:image",
            Self::ImgTag => "img",
            Self::BackgroundCover => "bg-cover",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image URL found in a page, verbatim as written in the HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    pub url: String,
    pub source: MatchSource,
}

/// What a single strategy made of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Raw URL text, verbatim.
    Found(String),
    /// The element this strategy keys on exists but carries no usable URL.
    /// Lower-priority strategies are not consulted.
    Unusable,
    /// Nothing for this strategy; try the next one.
    Missing,
}

impl Lookup {
    pub fn into_url(self) -> Option<String> {
        match self {
            Self::Found(url) => Some(url),
            Self::Unusable | Self::Missing => None,
        }
    }
}

impl From<Option<String>> for Lookup {
    fn from(found: Option<String>) -> Self {
        found.map_or(Self::Missing, Self::Found)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A single image-finding heuristic.
pub trait ImageStrategy: Send + Sync {
    /// Look for this heuristic's image reference in the document.
    fn find(&self, doc: &Html) -> Lookup;

    /// Tag attached to matches from this strategy.
    fn source(&self) -> MatchSource;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the strategies in priority order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl StrategyRegistry {
    /// og:image first, then the first `<img>`, then a `bg-cover` header.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(OgImageStrategy),
                Box::new(ImgTagStrategy),
                Box::new(BackgroundCoverStrategy),
            ],
        }
    }

    /// Run the strategies in order and return the first match. An
    /// [`Lookup::Unusable`] result stops the search with no match.
    pub fn find(&self, doc: &Html) -> Option<ImageMatch> {
        for strategy in &self.strategies {
            match strategy.find(doc) {
                Lookup::Found(url) => {
                    return Some(ImageMatch {
                        url,
                        source: strategy.source(),
                    });
                }
                Lookup::Unusable => {
                    tracing::debug!(source = %strategy.source(), "element present without a URL");
                    return None;
                }
                Lookup::Missing => {}
            }
        }
        None
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a page with scripting disabled, so `<noscript>` content is
/// ordinary markup and its `<img>` elements are visible to the strategies.
pub fn parse_page(html: &str) -> Html {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    driver::parse_document(HtmlTreeSink::new(Html::new_document()), opts).one(html)
}

/// Parse `html` and run the default strategies over it.
pub fn find_image_url(html: &str) -> Option<ImageMatch> {
    let doc = parse_page(html);
    StrategyRegistry::new().find(&doc)
}
