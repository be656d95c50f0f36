//! Lever postings adapter. The listing endpoint returns a bare JSON array,
//! not an object; anything else is treated as zero results.

use async_trait::async_trait;
use harbor_core::{AtsPlatform, NormalizedPosting};
use harbor_storage::fetch::ProxyFetcher;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{first_str, json_str, non_empty, AdapterError, SourceAdapter};

pub struct LeverAdapter;

#[async_trait]
impl SourceAdapter for LeverAdapter {
    fn platform(&self) -> AtsPlatform {
        AtsPlatform::Lever
    }

    async fn fetch_raw(
        &self,
        http: &ProxyFetcher,
        identifier: &str,
    ) -> Result<Vec<JsonValue>, AdapterError> {
        let url = format!("https://api.lever.co/v0/postings/{identifier}?mode=json");
        let data = http.fetch_json(&url).await.map_err(|source| AdapterError::Fetch {
            platform: self.platform(),
            identifier: identifier.to_string(),
            source,
        })?;
        match data {
            JsonValue::Array(items) => Ok(items),
            // Error payloads arrive as objects ({"ok": false, ...}).
            _ => Ok(Vec::new()),
        }
    }

    fn normalize(&self, raw: &JsonValue, company_id: Uuid) -> Option<NormalizedPosting> {
        let title = raw.get("text").and_then(JsonValue::as_str).and_then(non_empty)?;
        let apply_link = first_str(raw, &["hostedUrl", "applyUrl"])?;

        let location = json_str(raw, &["categories", "location"])
            .and_then(non_empty)
            .unwrap_or("Remote");
        let category_hint = json_str(raw, &["categories", "team"])
            .and_then(non_empty)
            .unwrap_or("Engineering");
        let description = first_str(raw, &["description", "descriptionPlain"]).unwrap_or_default();
        let job_type_hint = json_str(raw, &["categories", "commitment"])
            .and_then(non_empty)
            .unwrap_or("full_time");

        Some(NormalizedPosting {
            company_id,
            title: title.to_string(),
            location: location.to_string(),
            category_hint: category_hint.to_string(),
            apply_link: apply_link.to_string(),
            description: description.to_string(),
            job_type_hint: job_type_hint.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use harbor_storage::fetch::{ProxyFetcher, ScriptedTransport};
    use serde_json::json;

    #[tokio::test]
    async fn bare_array_response_yields_every_element() {
        let transport = ScriptedTransport::new();
        transport.push_ok(
            "https://api.lever.co/v0/postings/acme?mode=json",
            r#"[{"text": "Engineer"}, {"text": "Designer"}]"#,
        );
        let http = ProxyFetcher::new(Arc::new(transport));

        let raw = LeverAdapter.fetch_raw(&http, "acme").await.unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["text"], "Engineer");
    }

    #[tokio::test]
    async fn object_response_is_zero_results() {
        let transport = ScriptedTransport::new();
        transport.push_ok(
            "https://api.lever.co/v0/postings/acme?mode=json",
            r#"{"ok": false, "error": "Document not found"}"#,
        );
        let http = ProxyFetcher::new(Arc::new(transport));

        let raw = LeverAdapter.fetch_raw(&http, "acme").await.unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn normalize_prefers_hosted_url_and_team() {
        let raw = json!({
            "text": "Account Executive",
            "hostedUrl": "https://jobs.lever.co/acme/1",
            "applyUrl": "https://jobs.lever.co/acme/1/apply",
            "categories": {"location": "London", "team": "Sales", "commitment": "Full-time"},
            "description": "<div>Sell things</div>"
        });
        let norm = LeverAdapter.normalize(&raw, Uuid::nil()).unwrap();
        assert_eq!(norm.apply_link, "https://jobs.lever.co/acme/1");
        assert_eq!(norm.category_hint, "Sales");
        assert_eq!(norm.location, "London");
        assert_eq!(norm.job_type_hint, "Full-time");
    }

    #[test]
    fn normalize_falls_back_to_apply_url_and_defaults() {
        let raw = json!({
            "text": "Engineer",
            "applyUrl": "https://jobs.lever.co/acme/2/apply"
        });
        let norm = LeverAdapter.normalize(&raw, Uuid::nil()).unwrap();
        assert_eq!(norm.apply_link, "https://jobs.lever.co/acme/2/apply");
        assert_eq!(norm.location, "Remote");
        assert_eq!(norm.category_hint, "Engineering");
        assert_eq!(norm.job_type_hint, "full_time");
    }
}
