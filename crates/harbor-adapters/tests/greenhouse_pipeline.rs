//! End-to-end adapter exercise: board fetch through the proxy chain, then
//! normalization of every raw posting.

use std::sync::Arc;

use harbor_adapters::{adapter_for_platform, GreenhouseAdapter, SourceAdapter};
use harbor_core::AtsPlatform;
use harbor_storage::fetch::{ProxyFetcher, ScriptedTransport, TransportError};
use uuid::Uuid;

const BOARD_URL: &str = "https://boards-api.greenhouse.io/v1/boards/acme/jobs?content=true";

const BOARD_BODY: &str = r#"{
  "jobs": [
    {
      "id": 1,
      "title": "Senior Backend Engineer",
      "absolute_url": "https://boards.greenhouse.io/acme/jobs/1",
      "location": {"name": "Austin, TX"},
      "departments": [{"name": "Engineering"}],
      "content": "<p>Build the platform</p>"
    },
    {
      "id": 2,
      "title": "",
      "absolute_url": "https://boards.greenhouse.io/acme/jobs/2"
    },
    {
      "id": 3,
      "title": "Account Executive",
      "absolute_url": "https://boards.greenhouse.io/acme/jobs/3",
      "departments": [{"name": "Sales"}]
    }
  ]
}"#;

#[tokio::test]
async fn fetch_and_normalize_drops_only_incomplete_postings() {
    let transport = ScriptedTransport::new();
    transport.push_ok(BOARD_URL, BOARD_BODY);
    let http = ProxyFetcher::new(Arc::new(transport));

    let adapter = adapter_for_platform(AtsPlatform::Greenhouse);
    let raw = adapter.fetch_raw(&http, "acme").await.unwrap();
    assert_eq!(raw.len(), 3);

    let company_id = Uuid::new_v4();
    let normalized: Vec<_> = raw
        .iter()
        .filter_map(|job| adapter.normalize(job, company_id))
        .collect();

    // The titleless posting is dropped; the rest keep their fields.
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].title, "Senior Backend Engineer");
    assert_eq!(normalized[0].location, "Austin, TX");
    assert_eq!(normalized[1].category_hint, "Sales");
    assert_eq!(normalized[1].location, "Remote");
    assert!(normalized.iter().all(|n| n.company_id == company_id));
}

#[tokio::test]
async fn board_recovered_through_proxy_after_direct_block() {
    let transport = ScriptedTransport::new();
    // Direct request blocked by an anti-bot HTML page, first proxy down,
    // second proxy (passthrough) succeeds.
    transport.push_ok(BOARD_URL, "<html>Access denied</html>");
    transport.push(
        &format!(
            "https://api.allorigins.win/get?url={}",
            urlencoding::encode(BOARD_URL)
        ),
        Err(TransportError("bad gateway".to_string())),
    );
    transport.push_ok(
        &format!("https://corsproxy.io/?{}", urlencoding::encode(BOARD_URL)),
        BOARD_BODY,
    );
    let http = ProxyFetcher::new(Arc::new(transport));

    let raw = GreenhouseAdapter.fetch_raw(&http, "acme").await.unwrap();
    assert_eq!(raw.len(), 3);
}

#[tokio::test]
async fn exhausted_chain_surfaces_as_adapter_error() {
    let transport = ScriptedTransport::new();
    let http = ProxyFetcher::new(Arc::new(transport));

    let err = GreenhouseAdapter.fetch_raw(&http, "acme").await.unwrap_err();
    assert!(err.to_string().contains("greenhouse"));
}
