//! Company roster loading. The roster is a YAML file listing each company's
//! display name, ATS platform, and board identifier; Workday entries encode
//! the identifier as `domain/site_id`.

use std::path::Path;

use anyhow::{Context, Result};
use harbor_core::AtsPlatform;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Roster {
    pub companies: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub platform: AtsPlatform,
    pub identifier: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Roster {
    pub fn enabled(&self) -> impl Iterator<Item = &RosterEntry> {
        self.companies.iter().filter(|entry| entry.enabled)
    }
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_roster_and_defaults_enabled() {
        let yaml = r#"
companies:
  - name: Stripe
    platform: greenhouse
    identifier: stripe
  - name: Uber
    platform: workday-rss
    identifier: uber.wd1.myworkdayjobs.com/Uber_Careers
    enabled: false
"#;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(yaml.as_bytes()).expect("write roster");

        let roster = load_roster(file.path()).expect("load roster");
        assert_eq!(roster.companies.len(), 2);
        assert!(roster.companies[0].enabled);
        assert_eq!(roster.companies[0].platform, AtsPlatform::Greenhouse);
        assert_eq!(roster.companies[1].platform, AtsPlatform::WorkdayRss);
        assert_eq!(roster.enabled().count(), 1);
    }

    #[test]
    fn unknown_platform_is_a_parse_error() {
        let yaml = "companies:\n  - name: X\n    platform: taleo\n    identifier: x\n";
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(yaml.as_bytes()).expect("write roster");
        assert!(load_roster(file.path()).is_err());
    }
}
