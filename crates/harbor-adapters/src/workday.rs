//! Workday RSS adapter. Many enterprise boards expose a public per-site RSS
//! feed (`https://{company}.wd{n}.myworkdayjobs.com/{site_id}/rss`); items are
//! extracted with tag-scoped, CDATA-aware regexes since the feeds are not
//! reliably well-formed XML. The roster identifier encodes `domain/site_id`.

use async_trait::async_trait;
use harbor_core::{AtsPlatform, NormalizedPosting};
use harbor_storage::fetch::ProxyFetcher;
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use tracing::warn;
use uuid::Uuid;

use crate::{html_to_text, non_empty, AdapterError, SourceAdapter};

pub struct WorkdayRssAdapter;

#[async_trait]
impl SourceAdapter for WorkdayRssAdapter {
    fn platform(&self) -> AtsPlatform {
        AtsPlatform::WorkdayRss
    }

    async fn fetch_raw(
        &self,
        http: &ProxyFetcher,
        identifier: &str,
    ) -> Result<Vec<JsonValue>, AdapterError> {
        let Some((domain, site_id)) = identifier.split_once('/') else {
            return Err(AdapterError::BadIdentifier {
                platform: self.platform(),
                identifier: identifier.to_string(),
                reason: "expected domain/site_id".to_string(),
            });
        };
        let url = format!("https://{domain}/{site_id}/rss");
        let xml = http.fetch_text(&url).await.map_err(|source| AdapterError::Fetch {
            platform: self.platform(),
            identifier: identifier.to_string(),
            source,
        })?;
        let items = parse_rss_items(&xml);
        if items.is_empty() {
            warn!(identifier, "no job items found in RSS feed");
        }
        Ok(items)
    }

    fn normalize(&self, raw: &JsonValue, company_id: Uuid) -> Option<NormalizedPosting> {
        let title = raw.get("title").and_then(JsonValue::as_str).and_then(non_empty)?;
        let apply_link = raw.get("link").and_then(JsonValue::as_str).and_then(non_empty)?;
        let location = raw
            .get("location")
            .and_then(JsonValue::as_str)
            .and_then(non_empty)
            .unwrap_or("Remote");
        let description = raw
            .get("description")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();

        Some(NormalizedPosting {
            company_id,
            title: title.to_string(),
            location: location.to_string(),
            category_hint: "Engineering".to_string(),
            apply_link: apply_link.to_string(),
            description: description.to_string(),
            job_type_hint: "full_time".to_string(),
        })
    }
}

/// Per-tag extraction, CDATA form first, then the plain form.
struct TagMatcher {
    cdata: Regex,
    plain: Regex,
}

impl TagMatcher {
    fn new(tag: &str) -> Self {
        let cdata = Regex::new(&format!(r"(?s)<{tag}[^>]*><!\[CDATA\[(.*?)\]\]></{tag}>"))
            .expect("static tag pattern");
        let plain =
            Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")).expect("static tag pattern");
        Self { cdata, plain }
    }

    fn extract(&self, item: &str) -> Option<String> {
        self.cdata
            .captures(item)
            .or_else(|| self.plain.captures(item))
            .map(|caps| caps[1].to_string())
    }
}

fn parse_rss_items(xml: &str) -> Vec<JsonValue> {
    let item_re = Regex::new(r"(?s)<item>(.*?)</item>").expect("static item pattern");
    let title_tag = TagMatcher::new("title");
    let link_tag = TagMatcher::new("link");
    let description_tag = TagMatcher::new("description");
    let pub_date_tag = TagMatcher::new("pubDate");

    let mut items = Vec::new();
    for caps in item_re.captures_iter(xml) {
        let body = &caps[1];
        let Some(title) = title_tag.extract(body).map(|t| clean_text(&t)) else {
            continue;
        };
        let Some(link) = link_tag.extract(body).map(|l| clean_text(&l)) else {
            continue;
        };
        if title.is_empty() || link.is_empty() {
            continue;
        }
        let description = description_tag
            .extract(body)
            .map(|d| clean_text(&d))
            .unwrap_or_default();
        let location = extract_location(&title, &description);

        items.push(json!({
            "title": title,
            "link": link,
            "description": description,
            "pubDate": pub_date_tag.extract(body).map(|d| d.trim().to_string()),
            "location": location,
        }));
    }
    items
}

/// Decode common double-escaped entities, then flatten any remaining markup.
fn clean_text(text: &str) -> String {
    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    html_to_text(&decoded)
}

/// Workday puts the location in the title or description, not a feed field.
/// Common shapes: "Role - City, ST", "Role (City, ST)", "... in City, ST",
/// "Location: City, ST".
fn extract_location(title: &str, description: &str) -> String {
    let combined = format!("{title} {description}");
    let patterns = [
        r"[-\u{2013}\u{2014}]\s*([A-Za-z\s]+,\s*[A-Z]{2})",
        r"\(([A-Za-z\s]+,\s*[A-Z]{2})\)",
        r"\bin\s+([A-Za-z\s]+,\s*[A-Z]{2})",
        r"Location[:\s]+([A-Za-z\s]+,\s*[A-Z]{2})",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("static location pattern");
        if let Some(caps) = re.captures(&combined) {
            return caps[1].trim().to_string();
        }
    }
    let remote_re = Regex::new(r"(?i)\bremote\b").expect("static remote pattern");
    if remote_re.is_match(&combined) {
        return "Remote".to_string();
    }
    "Not Specified".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Careers</title>
    <item>
      <title><![CDATA[Senior Software Engineer - Austin, TX]]></title>
      <link><![CDATA[https://acme.wd1.myworkdayjobs.com/Careers/job/1]]></link>
      <description><![CDATA[&lt;p&gt;Build &amp;amp; run services&lt;/p&gt;]]></description>
      <pubDate>Mon, 02 Jun 2025 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Data Analyst (Remote)</title>
      <link>https://acme.wd1.myworkdayjobs.com/Careers/job/2</link>
      <description>Fully remote role</description>
    </item>
    <item>
      <description>malformed, no title or link</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_cdata_and_plain_items_and_skips_malformed() {
        let items = parse_rss_items(FEED);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0]["title"], "Senior Software Engineer - Austin, TX");
        assert_eq!(items[0]["link"], "https://acme.wd1.myworkdayjobs.com/Careers/job/1");
        assert_eq!(items[0]["description"], "Build & run services");
        assert_eq!(items[0]["location"], "Austin, TX");

        assert_eq!(items[1]["title"], "Data Analyst (Remote)");
        assert_eq!(items[1]["location"], "Remote");
    }

    #[test]
    fn location_extraction_patterns() {
        assert_eq!(extract_location("Engineer - Austin, TX", ""), "Austin, TX");
        assert_eq!(extract_location("Engineer (Seattle, WA)", ""), "Seattle, WA");
        assert_eq!(extract_location("Engineer", "based in Denver, CO"), "Denver, CO");
        assert_eq!(extract_location("Engineer", "Location: Boston, MA"), "Boston, MA");
        assert_eq!(extract_location("Engineer", "work remote friendly"), "Remote");
        assert_eq!(extract_location("Engineer", "onsite role"), "Not Specified");
    }

    #[test]
    fn normalize_requires_title_and_link() {
        let ok = json!({"title": "Engineer", "link": "https://a.test/1", "location": "Remote"});
        assert!(WorkdayRssAdapter.normalize(&ok, Uuid::nil()).is_some());
        let missing = json!({"title": "Engineer"});
        assert!(WorkdayRssAdapter.normalize(&missing, Uuid::nil()).is_none());
    }

    #[tokio::test]
    async fn bad_identifier_is_an_error() {
        let transport = harbor_storage::fetch::ScriptedTransport::new();
        let http = ProxyFetcher::new(std::sync::Arc::new(transport));
        let err = WorkdayRssAdapter.fetch_raw(&http, "no-slash").await.unwrap_err();
        assert!(matches!(err, AdapterError::BadIdentifier { .. }));
    }
}
