//! Source adapter contracts + one adapter per ATS platform.
//!
//! Every adapter exposes the same two operations: fetch the platform's public
//! listing endpoint into a sequence of raw postings, and normalize one raw
//! posting into the common intermediate shape. Defensive throughout: missing
//! arrays, wrapped vs unwrapped shapes, and platform error payloads are zero
//! results, never errors.

mod ashby;
mod greenhouse;
mod lever;
mod workday;

pub use ashby::AshbyAdapter;
pub use greenhouse::GreenhouseAdapter;
pub use lever::LeverAdapter;
pub use workday::WorkdayRssAdapter;

use async_trait::async_trait;
use harbor_core::{AtsPlatform, NormalizedPosting};
use harbor_storage::fetch::{FetchError, ProxyFetcher};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

pub const CRATE_NAME: &str = "harbor-adapters";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("fetch failed for {platform} board {identifier}: {source}")]
    Fetch {
        platform: AtsPlatform,
        identifier: String,
        #[source]
        source: FetchError,
    },
    #[error("bad identifier {identifier:?} for {platform}: {reason}")]
    BadIdentifier {
        platform: AtsPlatform,
        identifier: String,
        reason: String,
    },
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn platform(&self) -> AtsPlatform;

    /// Fetch the board's raw postings. Zero results is valid and not an
    /// error; only an exhausted fetch chain surfaces as `AdapterError`.
    async fn fetch_raw(
        &self,
        http: &ProxyFetcher,
        identifier: &str,
    ) -> Result<Vec<JsonValue>, AdapterError>;

    /// Normalize one raw posting. Returns `None` when the posting is missing
    /// a title or apply link and should be dropped from the batch.
    fn normalize(&self, raw: &JsonValue, company_id: Uuid) -> Option<NormalizedPosting>;
}

pub fn adapter_for_platform(platform: AtsPlatform) -> Box<dyn SourceAdapter> {
    match platform {
        AtsPlatform::Greenhouse => Box::new(GreenhouseAdapter),
        AtsPlatform::Lever => Box::new(LeverAdapter),
        AtsPlatform::Ashby => Box::new(AshbyAdapter),
        AtsPlatform::WorkdayRss => Box::new(WorkdayRssAdapter),
    }
}

/// Walk a path of object keys.
pub(crate) fn json_str<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_str()
}

/// First non-empty string among top-level keys, in priority order.
pub(crate) fn first_str<'a>(value: &'a JsonValue, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(JsonValue::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Flatten an HTML fragment to whitespace-normalized text.
pub(crate) fn html_to_text(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
