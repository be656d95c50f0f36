//! Core domain model for the harbor job aggregation pipeline.

pub mod classify;
pub mod location;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "harbor-core";

/// Platform an external job board is hosted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AtsPlatform {
    Greenhouse,
    Lever,
    Ashby,
    WorkdayRss,
}

impl AtsPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtsPlatform::Greenhouse => "greenhouse",
            AtsPlatform::Lever => "lever",
            AtsPlatform::Ashby => "ashby",
            AtsPlatform::WorkdayRss => "workday-rss",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "greenhouse" => Some(AtsPlatform::Greenhouse),
            "lever" => Some(AtsPlatform::Lever),
            "ashby" => Some(AtsPlatform::Ashby),
            "workday-rss" => Some(AtsPlatform::WorkdayRss),
            _ => None,
        }
    }
}

impl fmt::Display for AtsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functional category a posting is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobCategory {
    Sales,
    Marketing,
    Finance,
    Legal,
    ResearchDevelopment,
    Management,
    It,
}

impl JobCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Sales => "sales",
            JobCategory::Marketing => "marketing",
            JobCategory::Finance => "finance",
            JobCategory::Legal => "legal",
            JobCategory::ResearchDevelopment => "research-development",
            JobCategory::Management => "management",
            JobCategory::It => "it",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sales" => Some(JobCategory::Sales),
            "marketing" => Some(JobCategory::Marketing),
            "finance" => Some(JobCategory::Finance),
            "legal" => Some(JobCategory::Legal),
            "research-development" => Some(JobCategory::ResearchDevelopment),
            "management" => Some(JobCategory::Management),
            "it" => Some(JobCategory::It),
            _ => None,
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working arrangement of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Remote,
    #[serde(rename = "On-site")]
    OnSite,
    Hybrid,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Remote => "Remote",
            JobType::OnSite => "On-site",
            JobType::Hybrid => "Hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Remote" => Some(JobType::Remote),
            "On-site" => Some(JobType::OnSite),
            "Hybrid" => Some(JobType::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seniority band derived from free-text title/description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    Internship,
    EntryLevel,
    MidLevel,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "internship",
            ExperienceLevel::EntryLevel => "entry-level",
            ExperienceLevel::MidLevel => "mid-level",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "internship" => Some(ExperienceLevel::Internship),
            "entry-level" => Some(ExperienceLevel::EntryLevel),
            "mid-level" => Some(ExperienceLevel::MidLevel),
            "senior" => Some(ExperienceLevel::Senior),
            "lead" => Some(ExperienceLevel::Lead),
            "executive" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company whose board is harvested. Created on first sighting, never
/// deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub ats_platform: AtsPlatform,
    pub ats_identifier: String,
    pub active: bool,
    pub auto_created: bool,
    pub verified: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A stored posting. `apply_link` is the sole deduplication key; the store
/// enforces its uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub category: JobCategory,
    pub job_type: JobType,
    pub experience_level: Option<ExperienceLevel>,
    pub location_city: String,
    pub location_country: String,
    pub apply_link: String,
    pub description: String,
    pub is_active: bool,
    pub posted_to_social_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Common intermediate shape every source adapter produces before
/// classification. Held only for the duration of one harvest pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub company_id: Uuid,
    pub title: String,
    pub location: String,
    pub category_hint: String,
    pub apply_link: String,
    pub description: String,
    pub job_type_hint: String,
}

/// Lowercase a name and collapse every run of non-alphanumeric characters to
/// a single hyphen, trimming hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_runs_and_trims() {
        assert_eq!(slugify("Stripe"), "stripe");
        assert_eq!(slugify("Stripe Inc."), "stripe-inc");
        assert_eq!(slugify("  Warby   Parker  "), "warby-parker");
        assert_eq!(slugify("Better.com"), "better-com");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn enum_round_trips_through_text() {
        assert_eq!(
            JobCategory::parse(JobCategory::ResearchDevelopment.as_str()),
            Some(JobCategory::ResearchDevelopment)
        );
        assert_eq!(JobType::parse("On-site"), Some(JobType::OnSite));
        assert_eq!(
            ExperienceLevel::parse("entry-level"),
            Some(ExperienceLevel::EntryLevel)
        );
        assert_eq!(AtsPlatform::parse("workday-rss"), Some(AtsPlatform::WorkdayRss));
        assert_eq!(AtsPlatform::parse("taleo"), None);
    }

    #[test]
    fn kebab_case_serde_matches_as_str() {
        let json = serde_json::to_string(&JobCategory::ResearchDevelopment).unwrap();
        assert_eq!(json, "\"research-development\"");
        let json = serde_json::to_string(&ExperienceLevel::MidLevel).unwrap();
        assert_eq!(json, "\"mid-level\"");
        let json = serde_json::to_string(&JobType::OnSite).unwrap();
        assert_eq!(json, "\"On-site\"");
    }
}
