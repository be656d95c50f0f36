//! Keyword-rule classification of postings into category, working
//! arrangement, and experience level.
//!
//! Matching is word-boundary aware: both the keyword and the candidate text
//! are tokenized on non-alphanumeric characters and a keyword hits only when
//! its token sequence appears contiguously in the text. This deliberately
//! tightens the historical substring behaviour, where short keywords such as
//! `ae` or `intern` could fire inside unrelated words.

use crate::{ExperienceLevel, JobCategory, JobType};

/// Ordered category rule table; the first matching row wins. Sales and
/// marketing are checked before management and it, since most roles would
/// otherwise fall through to it.
const CATEGORY_RULES: &[(JobCategory, &[&str])] = &[
    (
        JobCategory::Sales,
        &[
            "sales",
            "account executive",
            "ae",
            "business development",
            "bdr",
            "sdr",
            "revenue",
            "account manager",
            "customer success",
            "partnerships",
            "commercial",
        ],
    ),
    (
        JobCategory::Marketing,
        &[
            "marketing",
            "brand",
            "growth",
            "content",
            "seo",
            "sem",
            "digital marketing",
            "campaign",
            "social media",
            "community",
            "creative",
            "copywriter",
        ],
    ),
    (
        JobCategory::Finance,
        &[
            "finance",
            "accounting",
            "controller",
            "financial",
            "audit",
            "fp&a",
            "cfo",
            "tax",
            "payroll",
        ],
    ),
    (
        JobCategory::Legal,
        &[
            "legal",
            "attorney",
            "counsel",
            "compliance",
            "lawyer",
            "paralegal",
            "regulatory",
            "contracts",
        ],
    ),
    (
        JobCategory::ResearchDevelopment,
        &[
            "research",
            "scientist",
            "science",
            "r&d",
            "algorithm",
            "lab",
            "phd",
            "postdoc",
            "ml researcher",
            "ai researcher",
        ],
    ),
    (
        JobCategory::Management,
        &[
            "ceo",
            "cto",
            "coo",
            "cmo",
            "chief",
            "vp",
            "vice president",
            "director of",
            "head of",
            "hr",
            "human resources",
            "people ops",
        ],
    ),
    (
        JobCategory::It,
        &[
            "engineer",
            "developer",
            "software",
            "frontend",
            "backend",
            "devops",
            "sre",
            "architect",
            "programming",
            "cloud",
            "security",
        ],
    ),
];

/// Ordered experience rule table; first match wins, default is mid-level.
/// Internship sits first so "Marketing Intern" never lands in marketing-era
/// entry keywords, and executive outranks lead ("VP, Engineering Lead").
const EXPERIENCE_RULES: &[(ExperienceLevel, &[&str])] = &[
    (
        ExperienceLevel::Internship,
        &["intern", "internship", "co-op", "apprentice", "new grad", "student", "campus"],
    ),
    (
        ExperienceLevel::Executive,
        &[
            "ceo",
            "cto",
            "coo",
            "cfo",
            "cmo",
            "chief",
            "vp",
            "vice president",
            "executive director",
            "managing director",
        ],
    ),
    (
        ExperienceLevel::Lead,
        &["lead", "principal", "staff", "architect", "head of"],
    ),
    (ExperienceLevel::Senior, &["senior", "sr", "expert"]),
    (
        ExperienceLevel::EntryLevel,
        &["junior", "jr", "graduate", "entry", "entry level", "associate", "trainee"],
    ),
];

/// Lowercased alphanumeric tokens of a text.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// True when the keyword's token sequence appears contiguously in the text's
/// token sequence.
fn matches_keyword(text_tokens: &[String], keyword: &str) -> bool {
    let needle = tokenize(keyword);
    if needle.is_empty() || needle.len() > text_tokens.len() {
        return false;
    }
    text_tokens
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(a, b)| a == b))
}

fn first_matching<T: Copy>(rules: &[(T, &[&str])], text_tokens: &[String]) -> Option<T> {
    for (value, keywords) in rules {
        if keywords.iter().any(|kw| matches_keyword(text_tokens, kw)) {
            return Some(*value);
        }
    }
    None
}

/// Derive a category from the department hint and title. Defaults to it.
pub fn classify_category(department_hint: &str, title: &str) -> JobCategory {
    let tokens = tokenize(&format!("{department_hint} {title}"));
    first_matching(CATEGORY_RULES, &tokens).unwrap_or(JobCategory::It)
}

/// Derive an experience level from the title and description. Defaults to
/// mid-level, the most common band for unannotated roles.
pub fn classify_experience(title: &str, description: &str) -> ExperienceLevel {
    let tokens = tokenize(&format!("{title} {description}"));
    first_matching(EXPERIENCE_RULES, &tokens).unwrap_or(ExperienceLevel::MidLevel)
}

/// Derive the working arrangement from the location string, title, and the
/// employment-type hint carried on the normalized posting.
pub fn classify_job_type(location: &str, title: &str, job_type_hint: &str) -> JobType {
    let tokens = tokenize(&format!("{location} {title} {job_type_hint}"));
    if matches_keyword(&tokens, "remote") || matches_keyword(&tokens, "anywhere") {
        return JobType::Remote;
    }
    if matches_keyword(&tokens, "hybrid") {
        return JobType::Hybrid;
    }
    JobType::OnSite
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ordering_prefers_sales_over_it() {
        assert_eq!(classify_category("", "Account Executive, EMEA"), JobCategory::Sales);
        assert_eq!(classify_category("Sales Engineering", "Solutions Engineer"), JobCategory::Sales);
    }

    #[test]
    fn category_defaults_to_it() {
        assert_eq!(classify_category("", "Senior Backend Engineer"), JobCategory::It);
        assert_eq!(classify_category("", "Office Coordinator"), JobCategory::It);
    }

    #[test]
    fn category_matches_each_table() {
        assert_eq!(classify_category("Brand Studio", "Designer"), JobCategory::Marketing);
        assert_eq!(classify_category("", "Payroll Specialist"), JobCategory::Finance);
        assert_eq!(classify_category("", "Corporate Counsel"), JobCategory::Legal);
        assert_eq!(
            classify_category("", "ML Researcher, Perception"),
            JobCategory::ResearchDevelopment
        );
        assert_eq!(classify_category("People Ops", "Generalist"), JobCategory::Management);
    }

    #[test]
    fn experience_matches_spec_fixtures() {
        assert_eq!(classify_experience("Staff Software Engineer", ""), ExperienceLevel::Lead);
        assert_eq!(classify_experience("Marketing Intern", ""), ExperienceLevel::Internship);
        assert_eq!(classify_experience("Senior Backend Engineer", ""), ExperienceLevel::Senior);
        assert_eq!(classify_experience("VP of Engineering", ""), ExperienceLevel::Executive);
        assert_eq!(classify_experience("Software Engineer II", ""), ExperienceLevel::MidLevel);
        assert_eq!(classify_experience("Junior QA Analyst", ""), ExperienceLevel::EntryLevel);
    }

    #[test]
    fn internship_outranks_entry_keywords() {
        // "Graduate Intern" carries both entry and internship signals.
        assert_eq!(classify_experience("Graduate Intern", ""), ExperienceLevel::Internship);
    }

    // Keywords whose semantics changed versus naive substring matching.
    // Each input used to match the named keyword as a raw substring.
    #[test]
    fn boundary_matching_rejects_embedded_intern() {
        // naive: "internal".contains("intern") == true
        assert_eq!(classify_experience("Internal Tools Engineer", ""), ExperienceLevel::MidLevel);
        assert_eq!(classify_experience("International Payroll Lead", ""), ExperienceLevel::Lead);
    }

    #[test]
    fn boundary_matching_rejects_embedded_ae_and_hr() {
        // naive: "maelstrom" contains "ae" and "threads" contains "hr"
        assert_eq!(classify_category("", "Maelstrom Platform Operator"), JobCategory::It);
        assert_eq!(classify_category("", "Threads Growth Analyst"), JobCategory::Marketing);
        assert_eq!(classify_category("", "HR Business Partner"), JobCategory::Management);
    }

    #[test]
    fn boundary_matching_rejects_embedded_sr() {
        // naive: "sre" begins with "sr" and "sr." needed dot-stripping;
        // tokenized "sre" stays an it keyword, "Sr." still reads senior.
        assert_eq!(classify_experience("SRE, Platform", ""), ExperienceLevel::MidLevel);
        assert_eq!(classify_experience("Sr. Data Engineer", ""), ExperienceLevel::Senior);
    }

    #[test]
    fn job_type_from_location_title_and_hint() {
        assert_eq!(classify_job_type("Remote", "Engineer", ""), JobType::Remote);
        assert_eq!(classify_job_type("Anywhere (EU)", "Engineer", ""), JobType::Remote);
        assert_eq!(classify_job_type("London", "Engineer (Hybrid)", ""), JobType::Hybrid);
        assert_eq!(classify_job_type("Austin, TX", "Engineer", "full_time"), JobType::OnSite);
        assert_eq!(classify_job_type("Berlin", "Engineer", "remote"), JobType::Remote);
    }
}
