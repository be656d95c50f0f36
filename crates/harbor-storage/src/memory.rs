//! In-memory `JobStore` with the same upsert/reconcile semantics as the
//! Postgres store. Used by pipeline tests; write failures can be injected to
//! exercise the unreconciled-batch path.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harbor_core::{AtsPlatform, Company, JobPosting};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{JobStore, JobUpsert, NewCompany, StoreError};

#[derive(Default)]
struct Inner {
    companies: Vec<Company>,
    // keyed on apply_link, mirroring the uniqueness constraint
    postings: HashMap<String, JobPosting>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent posting writes fail with a store error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a posting row directly, bypassing upsert semantics.
    pub async fn insert_posting_raw(&self, posting: JobPosting) {
        let mut inner = self.inner.lock().await;
        inner.postings.insert(posting.apply_link.clone(), posting);
    }

    pub async fn posting_by_link(&self, apply_link: &str) -> Option<JobPosting> {
        let inner = self.inner.lock().await;
        inner.postings.get(apply_link).cloned()
    }

    pub async fn all_postings(&self) -> Vec<JobPosting> {
        let inner = self.inner.lock().await;
        inner.postings.values().cloned().collect()
    }

    pub async fn company_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.companies.len()
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Message("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn company_by_slug(&self, slug: &str) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.companies.iter().find(|c| c.slug == slug).cloned())
    }

    async fn company_by_name_ci(&self, name: &str) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .companies
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn company_by_ats(
        &self,
        platform: AtsPlatform,
        identifier: &str,
    ) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .companies
            .iter()
            .find(|c| c.ats_platform == platform && c.ats_identifier == identifier)
            .cloned())
    }

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.lock().await;
        let record = Company {
            id: Uuid::new_v4(),
            name: company.name,
            slug: company.slug,
            logo_url: company.logo_url,
            website_url: company.website_url,
            ats_platform: company.ats_platform,
            ats_identifier: company.ats_identifier,
            active: company.active,
            auto_created: company.auto_created,
            verified: company.verified,
            last_sync_at: None,
            created_at: Utc::now(),
        };
        inner.companies.push(record.clone());
        Ok(record)
    }

    async fn seed_company(&self, company: NewCompany) -> Result<(), StoreError> {
        self.check_writes()?;
        {
            let mut inner = self.inner.lock().await;
            if let Some(existing) = inner.companies.iter_mut().find(|c| {
                c.ats_platform == company.ats_platform && c.ats_identifier == company.ats_identifier
            }) {
                existing.name = company.name;
                existing.active = true;
                return Ok(());
            }
        }
        self.insert_company(company).await.map(|_| ())
    }

    async fn touch_company_sync(
        &self,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(company) = inner.companies.iter_mut().find(|c| c.id == company_id) {
            company.last_sync_at = Some(at);
        }
        Ok(())
    }

    async fn company_names(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let mut names: Vec<String> = inner.companies.iter().map(|c| c.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn upsert_postings(
        &self,
        batch: &[JobUpsert],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.lock().await;
        for job in batch {
            match inner.postings.entry(job.apply_link.clone()) {
                Entry::Occupied(mut entry) => {
                    let existing = entry.get_mut();
                    existing.company_id = job.company_id;
                    existing.title = job.title.clone();
                    existing.category = job.category;
                    existing.job_type = job.job_type;
                    existing.experience_level = job.experience_level;
                    existing.location_city = job.location_city.clone();
                    existing.location_country = job.location_country.clone();
                    existing.description = job.description.clone();
                    existing.is_active = true;
                    existing.updated_at = now;
                }
                Entry::Vacant(entry) => {
                    entry.insert(JobPosting {
                        id: Uuid::new_v4(),
                        company_id: job.company_id,
                        title: job.title.clone(),
                        category: job.category,
                        job_type: job.job_type,
                        experience_level: job.experience_level,
                        location_city: job.location_city.clone(),
                        location_country: job.location_country.clone(),
                        apply_link: job.apply_link.clone(),
                        description: job.description.clone(),
                        is_active: true,
                        posted_to_social_at: None,
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
        }
        Ok(batch.len())
    }

    async fn active_apply_links(&self, company_id: Uuid) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .postings
            .values()
            .filter(|p| p.company_id == company_id && p.is_active)
            .map(|p| p.apply_link.clone())
            .collect())
    }

    async fn deactivate_missing(
        &self,
        company_id: Uuid,
        seen: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.lock().await;
        let mut flipped = 0u64;
        for posting in inner.postings.values_mut() {
            if posting.company_id == company_id
                && posting.is_active
                && !seen.contains(&posting.apply_link)
            {
                posting.is_active = false;
                posting.updated_at = now;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn purge_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.postings.len();
        inner
            .postings
            .retain(|_, p| p.is_active || p.updated_at >= cutoff);
        Ok((before - inner.postings.len()) as u64)
    }

    async fn active_postings(&self) -> Result<Vec<JobPosting>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .postings
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn active_companies(&self) -> Result<Vec<Company>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.companies.iter().filter(|c| c.active).cloned().collect())
    }

    async fn postings_due_for_social(
        &self,
        reposted_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<JobPosting>, StoreError> {
        let inner = self.inner.lock().await;
        let mut due: Vec<JobPosting> = inner
            .postings
            .values()
            .filter(|p| {
                p.is_active
                    && p.posted_to_social_at
                        .map_or(true, |at| at < reposted_before)
            })
            .cloned()
            .collect();
        due.sort_by_key(|p| (p.posted_to_social_at, p.created_at));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn mark_posted_to_social(
        &self,
        posting_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(posting) = inner.postings.values_mut().find(|p| p.id == posting_id) {
            posting.posted_to_social_at = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use harbor_core::{JobCategory, JobType};

    fn upsert(company_id: Uuid, link: &str, title: &str) -> JobUpsert {
        JobUpsert {
            company_id,
            title: title.to_string(),
            category: JobCategory::It,
            job_type: JobType::Remote,
            experience_level: None,
            location_city: "Remote".to_string(),
            location_country: "Global".to_string(),
            apply_link: link.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn upsert_same_link_yields_one_record_with_latest_values() {
        let store = MemoryStore::new();
        let company_id = Uuid::new_v4();
        let now = Utc::now();

        store
            .upsert_postings(&[upsert(company_id, "https://a.test/1", "Old Title")], now)
            .await
            .unwrap();
        store
            .upsert_postings(&[upsert(company_id, "https://a.test/1", "New Title")], now)
            .await
            .unwrap();

        let all = store.all_postings().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New Title");
        assert!(all[0].is_active);
    }

    #[tokio::test]
    async fn retention_purges_only_past_cutoff() {
        let store = MemoryStore::new();
        let company_id = Uuid::new_v4();
        let now = Utc::now();

        for (link, age_days, active) in [
            ("https://a.test/fresh", 5i64, false),
            ("https://a.test/stale", 31, false),
            ("https://a.test/active-old", 45, true),
        ] {
            store
                .upsert_postings(&[upsert(company_id, link, "t")], now - Duration::days(age_days))
                .await
                .unwrap();
            if !active {
                store
                    .deactivate_missing(company_id, &[], now - Duration::days(age_days))
                    .await
                    .unwrap();
            }
        }

        let deleted = store
            .purge_inactive_before(now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(store.posting_by_link("https://a.test/stale").await.is_none());
        assert!(store.posting_by_link("https://a.test/fresh").await.is_some());
        assert!(store.posting_by_link("https://a.test/active-old").await.is_some());
    }

    #[tokio::test]
    async fn social_rotation_picks_unposted_then_stale_posted() {
        let store = MemoryStore::new();
        let company_id = Uuid::new_v4();
        let now = Utc::now();
        store
            .upsert_postings(
                &[
                    upsert(company_id, "https://a.test/never", "Never Posted"),
                    upsert(company_id, "https://a.test/stale", "Posted Long Ago"),
                    upsert(company_id, "https://a.test/recent", "Posted Recently"),
                ],
                now,
            )
            .await
            .unwrap();
        let stale = store.posting_by_link("https://a.test/stale").await.unwrap();
        store
            .mark_posted_to_social(stale.id, now - Duration::days(40))
            .await
            .unwrap();
        let recent = store.posting_by_link("https://a.test/recent").await.unwrap();
        store
            .mark_posted_to_social(recent.id, now - Duration::days(2))
            .await
            .unwrap();

        let due = store
            .postings_due_for_social(now - Duration::days(30), 10)
            .await
            .unwrap();

        let links: Vec<&str> = due.iter().map(|p| p.apply_link.as_str()).collect();
        assert_eq!(links, vec!["https://a.test/never", "https://a.test/stale"]);
    }

    #[tokio::test]
    async fn export_queries_only_see_active_rows() {
        let store = MemoryStore::new();
        let company = store
            .insert_company(crate::NewCompany {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                logo_url: None,
                website_url: None,
                ats_platform: AtsPlatform::Greenhouse,
                ats_identifier: "acme".to_string(),
                active: true,
                auto_created: false,
                verified: true,
            })
            .await
            .unwrap();
        let now = Utc::now();
        store
            .upsert_postings(
                &[
                    upsert(company.id, "https://a.test/live", "Live"),
                    upsert(company.id, "https://a.test/gone", "Gone"),
                ],
                now,
            )
            .await
            .unwrap();
        store
            .deactivate_missing(company.id, &["https://a.test/live".to_string()], now)
            .await
            .unwrap();

        let postings = store.active_postings().await.unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].apply_link, "https://a.test/live");
        assert_eq!(store.active_companies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deactivate_missing_spares_seen_links() {
        let store = MemoryStore::new();
        let company_id = Uuid::new_v4();
        let now = Utc::now();
        let links = ["https://a.test/a", "https://a.test/b", "https://a.test/c"];
        let batch: Vec<JobUpsert> = links
            .iter()
            .map(|l| upsert(company_id, l, "t"))
            .collect();
        store.upsert_postings(&batch, now).await.unwrap();

        let seen = vec![links[0].to_string(), links[1].to_string()];
        let flipped = store.deactivate_missing(company_id, &seen, now).await.unwrap();

        assert_eq!(flipped, 1);
        assert!(store.posting_by_link(links[0]).await.unwrap().is_active);
        assert!(store.posting_by_link(links[1]).await.unwrap().is_active);
        assert!(!store.posting_by_link(links[2]).await.unwrap().is_active);
    }
}
