//! Ashby job-board adapter. The posting API answers with either
//! `{jobs: [...]}` or `{jobPostings: [...]}` depending on board vintage.

use async_trait::async_trait;
use harbor_core::{AtsPlatform, NormalizedPosting};
use harbor_storage::fetch::ProxyFetcher;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{first_str, non_empty, AdapterError, SourceAdapter};

pub struct AshbyAdapter;

#[async_trait]
impl SourceAdapter for AshbyAdapter {
    fn platform(&self) -> AtsPlatform {
        AtsPlatform::Ashby
    }

    async fn fetch_raw(
        &self,
        http: &ProxyFetcher,
        identifier: &str,
    ) -> Result<Vec<JsonValue>, AdapterError> {
        let url = format!("https://api.ashbyhq.com/posting-api/job-board/{identifier}");
        let data = http.fetch_json(&url).await.map_err(|source| AdapterError::Fetch {
            platform: self.platform(),
            identifier: identifier.to_string(),
            source,
        })?;
        let items = data
            .get("jobs")
            .or_else(|| data.get("jobPostings"))
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(items)
    }

    fn normalize(&self, raw: &JsonValue, company_id: Uuid) -> Option<NormalizedPosting> {
        let title = raw.get("title").and_then(JsonValue::as_str).and_then(non_empty)?;
        let apply_link = first_str(raw, &["jobUrl", "applyUrl"])?;

        let location = raw
            .get("location")
            .and_then(JsonValue::as_str)
            .and_then(non_empty)
            .unwrap_or("Remote");
        let category_hint = raw
            .get("department")
            .and_then(JsonValue::as_str)
            .and_then(non_empty)
            .unwrap_or("Engineering");
        let description = first_str(raw, &["descriptionHtml", "description"]).unwrap_or_default();
        let job_type_hint = raw
            .get("employmentType")
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
    use std::sync::Arc;

    use harbor_storage::fetch::{ProxyFetcher, ScriptedTransport};
    use serde_json::json;

    #[tokio::test]
    async fn accepts_both_wrapper_shapes() {
        let url = "https://api.ashbyhq.com/posting-api/job-board/acme";
        let transport = ScriptedTransport::new();
        transport.push_ok(url, r#"{"jobs": [{"title": "A"}]}"#);
        transport.push_ok(url, r#"{"jobPostings": [{"title": "B"}, {"title": "C"}]}"#);
        let http = ProxyFetcher::new(Arc::new(transport));

        let first = AshbyAdapter.fetch_raw(&http, "acme").await.unwrap();
        assert_eq!(first.len(), 1);
        let second = AshbyAdapter.fetch_raw(&http, "acme").await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn normalize_prefers_html_description() {
        let raw = json!({
            "title": "Product Designer",
            "jobUrl": "https://jobs.ashbyhq.com/acme/1",
            "location": "Berlin",
            "department": "Design",
            "descriptionHtml": "<p>Design</p>",
            "description": "Design plain",
            "employmentType": "PartTime"
        });
        let norm = AshbyAdapter.normalize(&raw, Uuid::nil()).unwrap();
        assert_eq!(norm.description, "<p>Design</p>");
        assert_eq!(norm.job_type_hint, "PartTime");
        assert_eq!(norm.category_hint, "Design");
    }
}
