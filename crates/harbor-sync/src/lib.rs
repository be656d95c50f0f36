//! Harvest orchestration: iterate the company roster, fetch and normalize
//! postings through the platform adapters, classify, resolve company
//! identity, and reconcile the store (upsert, expire vanished postings,
//! purge long-stale ones).

pub mod dedup;
pub mod identity;
pub mod roster;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use harbor_adapters::adapter_for_platform;
use harbor_core::classify::{classify_category, classify_experience, classify_job_type};
use harbor_core::location::parse_location;
use harbor_core::{slugify, NormalizedPosting};
use harbor_storage::fetch::{FetchConfig, ProxyFetcher};
use harbor_storage::pg::PgStore;
use harbor_storage::{JobStore, JobUpsert, NewCompany};
use serde::Serialize;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::identity::resolve_company;
use crate::roster::{load_roster, Roster, RosterEntry};

pub const CRATE_NAME: &str = "harbor-sync";

const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_COMPANY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub database_url: String,
    pub roster_path: PathBuf,
    pub company_delay: Duration,
    pub retention_days: i64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub scheduler_enabled: bool,
    pub harvest_crons: Vec<String>,
}

impl HarvestConfig {
    /// Build from the environment. Missing store credentials are fatal here,
    /// before any network activity.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set; refusing to harvest without a store")?;
        Ok(Self {
            database_url,
            roster_path: std::env::var("HARBOR_ROSTER")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("companies.yaml")),
            company_delay: Duration::from_millis(
                std::env::var("HARBOR_COMPANY_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_COMPANY_DELAY_MS),
            ),
            retention_days: std::env::var("HARBOR_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            http_timeout_secs: std::env::var("HARBOR_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            user_agent: std::env::var("HARBOR_USER_AGENT")
                .unwrap_or_else(|_| FetchConfig::default().user_agent),
            scheduler_enabled: std::env::var("HARBOR_SCHEDULER_ENABLED")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            harvest_crons: vec![
                std::env::var("HARVEST_CRON_1").unwrap_or_else(|_| "0 0 6 * * *".to_string()),
                std::env::var("HARVEST_CRON_2").unwrap_or_else(|_| "0 0 18 * * *".to_string()),
            ],
        })
    }
}

/// Cooperative cancellation checked between companies.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Structured end-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub companies_processed: usize,
    pub found: usize,
    pub synced: usize,
    pub marked_expired: u64,
    pub deleted: u64,
    pub failed: usize,
    pub categories: BTreeMap<String, usize>,
    pub experience_levels: BTreeMap<String, usize>,
}

impl HarvestSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            companies_processed: 0,
            found: 0,
            synced: 0,
            marked_expired: 0,
            deleted: 0,
            failed: 0,
            categories: BTreeMap::new(),
            experience_levels: BTreeMap::new(),
        }
    }

    fn record_classification(&mut self, job: &JobUpsert) {
        *self
            .categories
            .entry(job.category.as_str().to_string())
            .or_default() += 1;
        if let Some(level) = job.experience_level {
            *self
                .experience_levels
                .entry(level.as_str().to_string())
                .or_default() += 1;
        }
    }

    /// Operator-facing rendering of the run.
    pub fn render(&self) -> String {
        let mut lines = vec![
            "harvest summary".to_string(),
            format!("  companies processed: {}", self.companies_processed),
            format!("  postings found:      {}", self.found),
            format!("  postings synced:     {}", self.synced),
            format!("  marked expired:      {}", self.marked_expired),
            format!("  purged:              {}", self.deleted),
            format!("  failed:              {}", self.failed),
        ];
        if !self.categories.is_empty() {
            lines.push("  categories:".to_string());
            for (category, count) in &self.categories {
                lines.push(format!("    {category}: {count}"));
            }
        }
        if !self.experience_levels.is_empty() {
            lines.push("  experience levels:".to_string());
            for (level, count) in &self.experience_levels {
                lines.push(format!("    {level}: {count}"));
            }
        }
        lines.join("\n")
    }
}

pub struct Harvester {
    store: Arc<dyn JobStore>,
    http: ProxyFetcher,
    company_delay: Duration,
    retention: chrono::Duration,
    cancel: CancelFlag,
}

impl Harvester {
    pub fn new(store: Arc<dyn JobStore>, http: ProxyFetcher) -> Self {
        Self {
            store,
            http,
            company_delay: Duration::from_millis(DEFAULT_COMPANY_DELAY_MS),
            retention: chrono::Duration::days(DEFAULT_RETENTION_DAYS),
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_company_delay(mut self, delay: Duration) -> Self {
        self.company_delay = delay;
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention = chrono::Duration::days(days);
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// One harvest pass over the roster, then the run-level retention purge.
    pub async fn run(&self, roster: &Roster) -> Result<HarvestSummary> {
        let mut summary = HarvestSummary::new(Utc::now());

        for entry in roster.enabled() {
            if self.cancel.is_cancelled() {
                warn!("harvest cancelled; skipping remaining companies");
                break;
            }
            info!(company = %entry.name, platform = %entry.platform, "harvesting");
            self.harvest_company(entry, &mut summary).await;
            summary.companies_processed += 1;
            // Courtesy pause between boards; these are free public endpoints.
            if !self.company_delay.is_zero() {
                tokio::time::sleep(self.company_delay).await;
            }
        }

        let cutoff = Utc::now() - self.retention;
        match self.store.purge_inactive_before(cutoff).await {
            Ok(deleted) => summary.deleted = deleted,
            Err(err) => warn!(%err, "retention purge failed"),
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }

    async fn harvest_company(&self, entry: &RosterEntry, summary: &mut HarvestSummary) {
        let adapter = adapter_for_platform(entry.platform);

        let raw = match adapter.fetch_raw(&self.http, &entry.identifier).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(company = %entry.name, %err, "fetch failed");
                summary.failed += 1;
                return;
            }
        };
        summary.found += raw.len();

        if raw.is_empty() {
            // An emptied board is indistinguishable from an error-shaped
            // payload, so active postings are left untouched rather than
            // mass-expired on an inconclusive fetch.
            info!(company = %entry.name, "no postings upstream");
            return;
        }

        let resolution = match resolve_company(
            self.store.as_ref(),
            &entry.name,
            entry.platform,
            &entry.identifier,
        )
        .await
        {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(company = %entry.name, %err, "identity resolution failed; skipping batch");
                summary.failed += 1;
                return;
            }
        };

        let now = Utc::now();
        let batch: Vec<JobUpsert> = raw
            .iter()
            .filter_map(|posting| adapter.normalize(posting, resolution.company_id))
            .map(build_upsert)
            .collect();

        if batch.is_empty() {
            warn!(company = %entry.name, raw = raw.len(), "no normalizable postings in batch");
            return;
        }
        for job in &batch {
            summary.record_classification(job);
        }

        match self.store.upsert_postings(&batch, now).await {
            Ok(written) => {
                summary.synced += written;
                let seen: Vec<String> = batch.iter().map(|job| job.apply_link.clone()).collect();
                match self
                    .store
                    .deactivate_missing(resolution.company_id, &seen, now)
                    .await
                {
                    Ok(flipped) => summary.marked_expired += flipped,
                    Err(err) => warn!(company = %entry.name, %err, "staleness reconciliation failed"),
                }
                if let Err(err) = self.store.touch_company_sync(resolution.company_id, now).await {
                    warn!(company = %entry.name, %err, "failed to record sync timestamp");
                }
            }
            Err(err) => {
                // Leave this company unreconciled for the pass: stale rows
                // beat deactivating live postings on an inconclusive write.
                error!(company = %entry.name, %err, "store write failed; batch left unreconciled");
                summary.failed += batch.len();
            }
        }
    }
}

/// Classify and geo-resolve one normalized posting into its store row.
fn build_upsert(norm: NormalizedPosting) -> JobUpsert {
    let parsed = parse_location(&norm.location);
    let category = classify_category(&norm.category_hint, &norm.title);
    let job_type = classify_job_type(&norm.location, &norm.title, &norm.job_type_hint);
    let experience = classify_experience(&norm.title, &norm.description);
    JobUpsert {
        company_id: norm.company_id,
        title: norm.title,
        category,
        job_type,
        experience_level: Some(experience),
        location_city: parsed.city,
        location_country: parsed.country,
        apply_link: norm.apply_link,
        description: norm.description,
    }
}

/// Upsert the roster into the companies table, keyed on the ATS pair.
pub async fn seed_roster(store: &dyn JobStore, roster: &Roster) -> Result<usize> {
    let mut seeded = 0usize;
    for entry in &roster.companies {
        store
            .seed_company(NewCompany {
                name: entry.name.clone(),
                slug: slugify(&entry.name),
                logo_url: None,
                website_url: None,
                ats_platform: entry.platform,
                ats_identifier: entry.identifier.clone(),
                active: entry.enabled,
                auto_created: false,
                verified: false,
            })
            .await
            .with_context(|| format!("seeding {}", entry.name))?;
        seeded += 1;
    }
    Ok(seeded)
}

/// Connect, migrate, and run a single harvest pass; Ctrl-C aborts cleanly
/// between companies.
pub async fn run_harvest_once(config: &HarvestConfig) -> Result<HarvestSummary> {
    let roster = load_roster(&config.roster_path)?;
    let store = PgStore::connect(&config.database_url)
        .await
        .context("connecting to store")?;
    // The apply_link uniqueness constraint must exist before any write.
    store.migrate().await.context("applying migrations")?;

    let http = ProxyFetcher::over_http(FetchConfig {
        timeout: Duration::from_secs(config.http_timeout_secs),
        user_agent: config.user_agent.clone(),
    })?;
    let harvester = Harvester::new(Arc::new(store), http)
        .with_company_delay(config.company_delay)
        .with_retention_days(config.retention_days);

    let cancel = harvester.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing current company");
            cancel.cancel();
        }
    });

    harvester.run(&roster).await
}

/// Seed the roster into the store.
pub async fn run_seed_once(config: &HarvestConfig) -> Result<usize> {
    let roster = load_roster(&config.roster_path)?;
    let store = PgStore::connect(&config.database_url)
        .await
        .context("connecting to store")?;
    store.migrate().await.context("applying migrations")?;
    seed_roster(&store, &roster).await
}

/// Offline duplicate-company report over the store's display names.
pub async fn duplicate_company_report(store: &dyn JobStore) -> Result<Vec<Vec<String>>> {
    let names = store.company_names().await?;
    Ok(dedup::find_duplicates(&names))
}

/// Optional cron-driven harvesting; `None` when disabled by configuration.
pub async fn build_scheduler(config: Arc<HarvestConfig>) -> Result<Option<JobScheduler>> {
    if !config.scheduler_enabled {
        return Ok(None);
    }

    let sched = JobScheduler::new().await.context("creating scheduler")?;
    for cron in &config.harvest_crons {
        let config = Arc::clone(&config);
        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let config = Arc::clone(&config);
            Box::pin(async move {
                match run_harvest_once(&config).await {
                    Ok(summary) => info!(
                        found = summary.found,
                        synced = summary.synced,
                        expired = summary.marked_expired,
                        "scheduled harvest complete"
                    ),
                    Err(err) => warn!(%err, "scheduled harvest failed"),
                }
            })
        })
        .with_context(|| format!("creating scheduler job for cron {cron}"))?;
        sched.add(job).await.context("adding scheduler job")?;
    }
    Ok(Some(sched))
}
