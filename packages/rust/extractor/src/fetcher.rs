//! Page fetching and image URL extraction.
//!
//! One GET per call, no retries, no redirect or URL post-processing. The
//! response body is parsed whatever the HTTP status.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use artfill_shared::{ArtfillError, HttpConfig, Result};

use crate::strategies::{ImageMatch, StrategyRegistry, parse_page};

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// Why a page produced no image URL.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection, DNS, TLS, timeout, or other transport failure.
    #[error("{url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// The response arrived but its body could not be read.
    #[error("{url}: body read failed: {reason}")]
    Body { url: String, reason: String },

    /// The page was fetched but none of the heuristics matched.
    #[error("{url}: no image found")]
    NoMatch { url: String },
}

impl ExtractError {
    /// Whether the page itself could not be retrieved.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Body { .. })
    }
}

// ---------------------------------------------------------------------------
// ImageExtractor
// ---------------------------------------------------------------------------

/// Fetches pages and runs the image strategies over them.
pub struct ImageExtractor {
    client: Client,
    registry: StrategyRegistry,
}

impl ImageExtractor {
    /// Build an extractor with the configured User-Agent and optional timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| ArtfillError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            registry: StrategyRegistry::new(),
        })
    }

    /// Fetch `page_url` and return the first image URL the strategies find.
    #[instrument(skip(self))]
    pub async fn extract(&self, page_url: &str) -> std::result::Result<ImageMatch, ExtractError> {
        let url = Url::parse(page_url).map_err(|e| ExtractError::InvalidUrl {
            url: page_url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ExtractError::Unreachable {
                url: page_url.to_string(),
                reason: e.to_string(),
            })?;

        debug!(status = response.status().as_u16(), "page fetched");

        let body = response.text().await.map_err(|e| ExtractError::Body {
            url: page_url.to_string(),
            reason: e.to_string(),
        })?;

        let doc = parse_page(&body);
        match self.registry.find(&doc) {
            Some(found) => {
                debug!(source = %found.source, image_url = %found.url, "image found");
                Ok(found)
            }
            None => Err(ExtractError::NoMatch {
                url: page_url.to_string(),
            }),
        }
    }

    /// Same as [`extract`](Self::extract) but with every failure logged and
    /// collapsed into `None`.
    pub async fn get_image_url(&self, page_url: &str) -> Option<String> {
        match self.extract(page_url).await {
            Ok(found) => Some(found.url),
            Err(e @ ExtractError::NoMatch { .. }) => {
                debug!(error = %e, "no image on page");
                None
            }
            Err(e) => {
                warn!(url = page_url, error = %e, "failed to fetch page");
                None
            }
        }
    }
}

#[cfg(test)]
mod fetcher_tests {
    use super::*;
    use crate::strategies::MatchSource;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor() -> ImageExtractor {
        ImageExtractor::new(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn sends_browser_user_agent() {
        let server = MockServer::start().await;
        let page = r#"<html><head>
            <meta property="og:image" content="https://cdn.example.com/og.jpg">
        </head><body></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/markers/1"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .expect(1)
            .mount(&server)
            .await;

        let found = extractor()
            .extract(&format!("{}/markers/1", server.uri()))
            .await
            .expect("match");
        assert_eq!(found.url, "https://cdn.example.com/og.jpg");
        assert_eq!(found.source, MatchSource::OgImage);
    }

    #[tokio::test]
    async fn error_status_body_is_still_parsed() {
        let server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"<html><body><img src="/404.png"></body></html>"#),
            )
            .mount(&server)
            .await;

        let url = extractor()
            .get_image_url(&format!("{}/gone", server.uri()))
            .await;
        assert_eq!(url.as_deref(), Some("/404.png"));
    }

    #[tokio::test]
    async fn no_match_is_distinguished_from_unreachable() {
        let server = MockServer::start().await;
        Mock::given(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing here</p>"))
            .mount(&server)
            .await;

        let err = extractor()
            .extract(&format!("{}/plain", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoMatch { .. }));
        assert!(!err.is_unreachable());
    }

    #[tokio::test]
    async fn og_image_without_content_yields_no_image() {
        let server = MockServer::start().await;
        let page = r#"<html><head><meta property="og:image"></head>
            <body><noscript><img src="/fallback.jpg"></noscript></body></html>"#;
        Mock::given(path("/markers/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let url = format!("{}/markers/2", server.uri());
        let err = extractor().extract(&url).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoMatch { .. }));
        assert_eq!(extractor().get_image_url(&url).await, None);
    }

    #[tokio::test]
    async fn unreachable_host_returns_none() {
        // Bind and drop a listener so the port is closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let page_url = format!("http://127.0.0.1:{port}/markers/1");

        let ex = extractor();
        let err = ex.extract(&page_url).await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(ex.get_image_url(&page_url).await.is_none());
    }

    #[tokio::test]
    async fn invalid_url_returns_none() {
        let ex = extractor();
        let err = ex.extract("not a url").await.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUrl { .. }));
        assert!(ex.get_image_url("not a url").await.is_none());
    }

    #[tokio::test]
    async fn timeout_is_reported_as_unreachable() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<img src=\"late.png\">")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = HttpConfig {
            timeout_secs: Some(1),
            ..HttpConfig::default()
        };
        let ex = ImageExtractor::new(&config).unwrap();
        let err = ex
            .extract(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }
}
