//! Greenhouse board adapter: `{jobs: [...]}` from the public boards API.

use async_trait::async_trait;
use harbor_core::{AtsPlatform, NormalizedPosting};
use harbor_storage::fetch::ProxyFetcher;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{json_str, non_empty, AdapterError, SourceAdapter};

pub struct GreenhouseAdapter;

#[async_trait]
impl SourceAdapter for GreenhouseAdapter {
    fn platform(&self) -> AtsPlatform {
        AtsPlatform::Greenhouse
    }

    async fn fetch_raw(
        &self,
        http: &ProxyFetcher,
        identifier: &str,
    ) -> Result<Vec<JsonValue>, AdapterError> {
        let url = format!(
            "https://boards-api.greenhouse.io/v1/boards/{identifier}/jobs?content=true"
        );
        let data = http.fetch_json(&url).await.map_err(|source| AdapterError::Fetch {
            platform: self.platform(),
            identifier: identifier.to_string(),
            source,
        })?;
        // Error payloads carry no "jobs" array and fall out as zero results.
        Ok(data
            .get("jobs")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn normalize(&self, raw: &JsonValue, company_id: Uuid) -> Option<NormalizedPosting> {
        let title = raw.get("title").and_then(JsonValue::as_str).and_then(non_empty)?;
        let apply_link = raw
            .get("absolute_url")
            .and_then(JsonValue::as_str)
            .and_then(non_empty)?;

        let location = json_str(raw, &["location", "name"])
            .and_then(non_empty)
            .unwrap_or("Remote");
        let category_hint = raw
            .get("departments")
            .and_then(JsonValue::as_array)
            .and_then(|deps| deps.first())
            .and_then(|dep| dep.get("name"))
            .and_then(JsonValue::as_str)
            .and_then(non_empty)
            .unwrap_or("Engineering");
        let description = raw
            .get("content")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let job_type_hint = raw
            .get("metadata")
            .and_then(JsonValue::as_array)
            .and_then(|entries| {
                entries.iter().find(|entry| {
                    entry.get("name").and_then(JsonValue::as_str) == Some("Employment Type")
                })
            })
            .and_then(|entry| entry.get("value"))
            .and_then(JsonValue::as_str)
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
    use serde_json::json;

    fn sample_job() -> JsonValue {
        json!({
            "id": 4011,
            "title": "Senior Backend Engineer",
            "absolute_url": "https://boards.greenhouse.io/acme/jobs/4011",
            "location": {"name": "Austin, TX"},
            "departments": [{"id": 1, "name": "Engineering"}],
            "content": "<p>Build services</p>",
            "metadata": [{"name": "Employment Type", "value": "Contract"}]
        })
    }

    #[test]
    fn normalize_extracts_all_fields() {
        let norm = GreenhouseAdapter.normalize(&sample_job(), Uuid::nil()).unwrap();
        assert_eq!(norm.title, "Senior Backend Engineer");
        assert_eq!(norm.location, "Austin, TX");
        assert_eq!(norm.category_hint, "Engineering");
        assert_eq!(norm.apply_link, "https://boards.greenhouse.io/acme/jobs/4011");
        assert_eq!(norm.description, "<p>Build services</p>");
        assert_eq!(norm.job_type_hint, "Contract");
    }

    #[test]
    fn normalize_applies_fallbacks() {
        let raw = json!({
            "title": "Engineer",
            "absolute_url": "https://boards.greenhouse.io/acme/jobs/1"
        });
        let norm = GreenhouseAdapter.normalize(&raw, Uuid::nil()).unwrap();
        assert_eq!(norm.location, "Remote");
        assert_eq!(norm.category_hint, "Engineering");
        assert_eq!(norm.description, "");
        assert_eq!(norm.job_type_hint, "full_time");
    }

    #[test]
    fn normalize_drops_postings_missing_title_or_link() {
        let no_title = json!({"absolute_url": "https://a.test/1"});
        assert!(GreenhouseAdapter.normalize(&no_title, Uuid::nil()).is_none());
        let no_link = json!({"title": "Engineer"});
        assert!(GreenhouseAdapter.normalize(&no_link, Uuid::nil()).is_none());
    }
}
