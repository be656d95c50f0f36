//! Company identity resolution: map an incoming company name to an existing
//! record or create one. Lookup order is slug exact, display-name
//! case-insensitive, then the (platform, identifier) pair; only a full miss
//! creates a record, flagged auto_created/unverified with best-guess logo and
//! website URLs derived from the slug.

use harbor_core::{slugify, AtsPlatform};
use harbor_storage::{JobStore, NewCompany, StoreError};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub company_id: Uuid,
    pub was_created: bool,
}

pub async fn resolve_company(
    store: &dyn JobStore,
    name: &str,
    platform: AtsPlatform,
    identifier: &str,
) -> Result<Resolution, StoreError> {
    let slug = slugify(name);

    if let Some(company) = store.company_by_slug(&slug).await? {
        return Ok(Resolution { company_id: company.id, was_created: false });
    }
    if let Some(company) = store.company_by_name_ci(name).await? {
        return Ok(Resolution { company_id: company.id, was_created: false });
    }
    if let Some(company) = store.company_by_ats(platform, identifier).await? {
        return Ok(Resolution { company_id: company.id, was_created: false });
    }

    let created = store
        .insert_company(NewCompany {
            name: name.to_string(),
            logo_url: Some(format!("https://logo.clearbit.com/{slug}.com")),
            website_url: Some(format!("https://www.{slug}.com")),
            slug,
            ats_platform: platform,
            ats_identifier: identifier.to_string(),
            active: true,
            auto_created: true,
            verified: false,
        })
        .await?;
    info!(company = name, "created company record");
    Ok(Resolution { company_id: created.id, was_created: true })
}
