//! Picture lookup through Bing image search.
//!
//! Bing's asynchronous results page embeds the original image URL of every
//! hit as `murl&quot;:&quot;<url>&quot;`. The page is sometimes empty on the
//! first request, so it is fetched up to [`SEARCH_ATTEMPTS`] times. Candidate
//! URLs are then probed with `HEAD` until one answers `200` with an image
//! content type, and that one is downloaded.

use super::MediaError;
use log::debug;
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use std::sync::LazyLock;
use std::time::Duration;

/// Produces image bytes for a search query.
pub trait ImageSource {
    fn fetch_image(&self, query: &str) -> Result<Vec<u8>, MediaError>;
}

const SEARCH_URL: &str = "https://www.bing.com/images/async";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.11 (KHTML, like Gecko) Chrome/23.0.1271.64 Safari/537.11";
pub const SEARCH_ATTEMPTS: usize = 5;
const RESULT_COUNT: usize = 15;
const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

static IMAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("murl&quot;:&quot;(.*?)&quot;").expect("valid regex"));

/// Bing `qft` value for a filter shorthand. Unknown shorthands mean no filter.
pub fn filter_param(shorthand: &str) -> &'static str {
    match shorthand {
        "line" | "linedrawing" => "+filterui:photo-linedrawing",
        "photo" => "+filterui:photo-photo",
        "clipart" => "+filterui:photo-clipart",
        "transparent" => "+filterui:photo-transparent",
        _ => "",
    }
}

/// `Accept-Language` preferring `language`, falling back to US English.
pub fn accept_language(language: &str) -> String {
    let region = match language {
        "en" => "en-US",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "es" => "es-ES",
        other => other,
    };
    format!("{region};q=1, en-US;q=0.5")
}

/// Quotes make Bing search for the literal phrase; strip them.
pub fn search_query(query: &str) -> &str {
    query.trim_matches(|c| c == '"' || c == '\'')
}

/// Image URLs embedded in a results page, in page order.
pub fn extract_image_urls(page: &str) -> Vec<String> {
    IMAGE_URL
        .captures_iter(page)
        .map(|c| c[1].to_string())
        .collect()
}

pub fn is_image_content_type(content_type: &str) -> bool {
    IMAGE_CONTENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Blocking Bing image search client.
pub struct BingImageSearch {
    client: Client,
    accept_language: String,
    adult: String,
    filter: &'static str,
}

impl BingImageSearch {
    pub fn new(
        language: &str,
        adult: &str,
        filter: &str,
        timeout: Duration,
    ) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            accept_language: accept_language(language),
            adult: adult.to_string(),
            filter: filter_param(filter),
        })
    }

    /// The results page URL for `query`.
    pub fn search_url(&self, query: &str) -> Result<Url, MediaError> {
        let count = RESULT_COUNT.to_string();
        let mut url = Url::parse_with_params(
            SEARCH_URL,
            [
                ("q", search_query(query)),
                ("first", "0"),
                ("count", count.as_str()),
                ("adlt", self.adult.as_str()),
            ],
        )
        .map_err(|e| MediaError::InvalidRequest(e.to_string()))?;
        // `qft` uses a literal `+` as separator, which form encoding would escape.
        let query_string = format!("{}&qft={}", url.query().unwrap_or_default(), self.filter);
        url.set_query(Some(&query_string));
        Ok(url)
    }

    fn candidate_urls(&self, query: &str) -> Result<Vec<String>, MediaError> {
        let url = self.search_url(query)?;
        for attempt in 1..=SEARCH_ATTEMPTS {
            let page = self
                .client
                .get(url.clone())
                .header(ACCEPT_LANGUAGE, &self.accept_language)
                .send()?
                .text()?;
            let urls = extract_image_urls(&page);
            if !urls.is_empty() {
                return Ok(urls);
            }
            debug!("no results for '{query}' (attempt {attempt}/{SEARCH_ATTEMPTS})");
        }
        Ok(Vec::new())
    }

    fn is_reachable_image(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) if response.status().as_u16() == 200 => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                let ok = is_image_content_type(content_type);
                if !ok {
                    debug!("{url} has content type {content_type:?}");
                }
                ok
            }
            Ok(response) => {
                debug!("{url} returned {}", response.status());
                false
            }
            Err(e) => {
                debug!("{url} unreachable: {e}");
                false
            }
        }
    }
}

impl ImageSource for BingImageSearch {
    fn fetch_image(&self, query: &str) -> Result<Vec<u8>, MediaError> {
        let url = self
            .candidate_urls(query)?
            .into_iter()
            .find(|url| self.is_reachable_image(url))
            .ok_or_else(|| MediaError::NoImage(query.to_string()))?;
        debug!("image for '{query}': {url}");
        let bytes = self.client.get(&url).send()?.error_for_status()?.bytes()?;
        Ok(bytes.to_vec())
    }
}
