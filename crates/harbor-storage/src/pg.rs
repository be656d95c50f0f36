//! Postgres-backed `JobStore` over sqlx. Schema lives in `migrations/`; the
//! apply_link uniqueness constraint is load-bearing for upsert semantics and
//! must exist before any write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harbor_core::{
    AtsPlatform, Company, ExperienceLevel, JobCategory, JobPosting, JobType,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::{JobStore, JobUpsert, NewCompany, StoreError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from the embedded `migrations/` directory.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

fn company_from_row(row: &PgRow) -> Result<Company, StoreError> {
    let platform: String = row.try_get("ats_platform")?;
    let ats_platform = AtsPlatform::parse(&platform)
        .ok_or_else(|| StoreError::Message(format!("unknown ats_platform {platform:?}")))?;
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        logo_url: row.try_get("logo_url")?,
        website_url: row.try_get("website_url")?,
        ats_platform,
        ats_identifier: row.try_get("ats_identifier")?,
        active: row.try_get("active")?,
        auto_created: row.try_get("auto_created")?,
        verified: row.try_get("verified")?,
        last_sync_at: row.try_get("last_sync_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn posting_from_row(row: &PgRow) -> Result<JobPosting, StoreError> {
    let category: String = row.try_get("category")?;
    let job_type: String = row.try_get("job_type")?;
    let experience: Option<String> = row.try_get("experience_level")?;
    Ok(JobPosting {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        title: row.try_get("title")?,
        category: JobCategory::parse(&category)
            .ok_or_else(|| StoreError::Message(format!("unknown category {category:?}")))?,
        job_type: JobType::parse(&job_type)
            .ok_or_else(|| StoreError::Message(format!("unknown job_type {job_type:?}")))?,
        experience_level: experience.as_deref().and_then(ExperienceLevel::parse),
        location_city: row.try_get("location_city")?,
        location_country: row.try_get("location_country")?,
        apply_link: row.try_get("apply_link")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        posted_to_social_at: row.try_get("posted_to_social_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const COMPANY_COLUMNS: &str = "id, name, slug, logo_url, website_url, ats_platform, \
     ats_identifier, active, auto_created, verified, last_sync_at, created_at";

const JOB_COLUMNS: &str = "id, company_id, title, category, job_type, experience_level, \
     location_city, location_country, apply_link, description, is_active, \
     posted_to_social_at, created_at, updated_at";

#[async_trait]
impl JobStore for PgStore {
    async fn company_by_slug(&self, slug: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn company_by_name_ci(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE LOWER(name) = LOWER($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn company_by_ats(
        &self,
        platform: AtsPlatform,
        identifier: &str,
    ) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies \
             WHERE ats_platform = $1 AND ats_identifier = $2"
        ))
        .bind(platform.as_str())
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO companies \
                 (name, slug, logo_url, website_url, ats_platform, ats_identifier, \
                  active, auto_created, verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.logo_url)
        .bind(&company.website_url)
        .bind(company.ats_platform.as_str())
        .bind(&company.ats_identifier)
        .bind(company.active)
        .bind(company.auto_created)
        .bind(company.verified)
        .fetch_one(&self.pool)
        .await?;
        company_from_row(&row)
    }

    async fn seed_company(&self, company: NewCompany) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO companies \
                 (name, slug, logo_url, website_url, ats_platform, ats_identifier, \
                  active, auto_created, verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (ats_platform, ats_identifier) \
             DO UPDATE SET name = EXCLUDED.name, active = TRUE",
        )
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.logo_url)
        .bind(&company.website_url)
        .bind(company.ats_platform.as_str())
        .bind(&company.ats_identifier)
        .bind(company.active)
        .bind(company.auto_created)
        .bind(company.verified)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_company_sync(
        &self,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE companies SET last_sync_at = $2 WHERE id = $1")
            .bind(company_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn company_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT name FROM companies ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(StoreError::from))
            .collect()
    }

    async fn upsert_postings(
        &self,
        batch: &[JobUpsert],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut written = 0usize;
        for job in batch {
            sqlx::query(
                "INSERT INTO jobs \
                     (company_id, title, category, job_type, experience_level, \
                      location_city, location_country, apply_link, description, \
                      is_active, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10) \
                 ON CONFLICT (apply_link) DO UPDATE SET \
                     company_id = EXCLUDED.company_id, \
                     title = EXCLUDED.title, \
                     category = EXCLUDED.category, \
                     job_type = EXCLUDED.job_type, \
                     experience_level = EXCLUDED.experience_level, \
                     location_city = EXCLUDED.location_city, \
                     location_country = EXCLUDED.location_country, \
                     description = EXCLUDED.description, \
                     is_active = TRUE, \
                     updated_at = EXCLUDED.updated_at",
            )
            .bind(job.company_id)
            .bind(&job.title)
            .bind(job.category.as_str())
            .bind(job.job_type.as_str())
            .bind(job.experience_level.map(|level| level.as_str()))
            .bind(&job.location_city)
            .bind(&job.location_country)
            .bind(&job.apply_link)
            .bind(&job.description)
            .bind(now)
            .execute(&self.pool)
            .await?;
            written += 1;
        }
        Ok(written)
    }

    async fn active_apply_links(&self, company_id: Uuid) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT apply_link FROM jobs WHERE company_id = $1 AND is_active = TRUE",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("apply_link").map_err(StoreError::from))
            .collect()
    }

    async fn deactivate_missing(
        &self,
        company_id: Uuid,
        seen: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET is_active = FALSE, updated_at = $3 \
             WHERE company_id = $1 AND is_active = TRUE \
               AND NOT (apply_link = ANY($2))",
        )
        .bind(company_id)
        .bind(seen)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn purge_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE is_active = FALSE AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE is_active = TRUE ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(posting_from_row).collect()
    }

    async fn active_companies(&self) -> Result<Vec<Company>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE active = TRUE ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(company_from_row).collect()
    }

    async fn postings_due_for_social(
        &self,
        reposted_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             WHERE is_active = TRUE \
               AND (posted_to_social_at IS NULL OR posted_to_social_at < $1) \
             ORDER BY posted_to_social_at ASC NULLS FIRST, created_at ASC \
             LIMIT $2"
        ))
        .bind(reposted_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(posting_from_row).collect()
    }

    async fn mark_posted_to_social(
        &self,
        posting_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE jobs SET posted_to_social_at = $2 WHERE id = $1")
            .bind(posting_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
