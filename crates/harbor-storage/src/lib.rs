//! Persistent store contract + Postgres and in-memory implementations, and
//! the resilient HTTP fetch layer shared by all source adapters.

pub mod fetch;
pub mod memory;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harbor_core::{
    AtsPlatform, Company, ExperienceLevel, JobCategory, JobPosting, JobType,
};
use thiserror::Error;
use uuid::Uuid;

pub const CRATE_NAME: &str = "harbor-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{0}")]
    Message(String),
}

/// Fields for a company row that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub ats_platform: AtsPlatform,
    pub ats_identifier: String,
    pub active: bool,
    pub auto_created: bool,
    pub verified: bool,
}

/// One posting in an upsert batch. The store keys the write on `apply_link`
/// and sets `is_active = true` on every upserted row.
#[derive(Debug, Clone)]
pub struct JobUpsert {
    pub company_id: Uuid,
    pub title: String,
    pub category: JobCategory,
    pub job_type: JobType,
    pub experience_level: Option<ExperienceLevel>,
    pub location_city: String,
    pub location_country: String,
    pub apply_link: String,
    pub description: String,
}

/// Persistent backing for companies and postings.
///
/// All mutations are idempotent upserts or conditional updates keyed on
/// apply_link or company id, so repeated runs converge rather than duplicate.
/// Timestamps are passed in by the caller so reconciliation and retention are
/// deterministic under test.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn company_by_slug(&self, slug: &str) -> Result<Option<Company>, StoreError>;

    async fn company_by_name_ci(&self, name: &str) -> Result<Option<Company>, StoreError>;

    async fn company_by_ats(
        &self,
        platform: AtsPlatform,
        identifier: &str,
    ) -> Result<Option<Company>, StoreError>;

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError>;

    /// Roster seeding: insert-or-reactivate keyed on the ATS pair.
    async fn seed_company(&self, company: NewCompany) -> Result<(), StoreError>;

    async fn touch_company_sync(
        &self,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Display names of every known company, for the offline dedup report.
    async fn company_names(&self) -> Result<Vec<String>, StoreError>;

    /// Bulk upsert keyed on apply_link; returns the number of rows written.
    async fn upsert_postings(
        &self,
        batch: &[JobUpsert],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Apply links of the company's currently-active postings.
    async fn active_apply_links(&self, company_id: Uuid) -> Result<Vec<String>, StoreError>;

    /// Flip to inactive every active posting of the company whose apply link
    /// is absent from `seen`. Returns the number of postings deactivated.
    async fn deactivate_missing(
        &self,
        company_id: Uuid,
        seen: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Delete postings that are inactive and were last updated before the
    /// cutoff. Returns the number of postings deleted.
    async fn purge_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Active postings, for the sitemap/export consumer.
    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError>;

    /// Active companies, for the sitemap/export consumer.
    async fn active_companies(&self) -> Result<Vec<Company>, StoreError>;

    /// Active postings never posted to social, or last posted before the
    /// repost cutoff, oldest first.
    async fn postings_due_for_social(
        &self,
        reposted_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<JobPosting>, StoreError>;

    async fn mark_posted_to_social(
        &self,
        posting_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
