//! Offline company duplicate detection. Groups names into similarity
//! clusters via normalized exact match, substring containment, and
//! levenshtein distance <= 2. Meant for cleanup reports, not the live
//! resolution path.

use strsim::levenshtein;

const LEGAL_SUFFIXES: &[&str] = &["inc", "llc", "ltd", "corp", "corporation", "company", "co"];

const MAX_EDIT_DISTANCE: usize = 2;

/// Lowercase, drop legal suffixes and non-alphanumerics, collapse whitespace.
pub fn normalize_company_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty() && !LEGAL_SUFFIXES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two display names likely refer to the same company.
pub fn are_similar(a: &str, b: &str) -> bool {
    let norm_a = normalize_company_name(a);
    let norm_b = normalize_company_name(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return norm_a == norm_b;
    }
    if norm_a == norm_b {
        return true;
    }
    // "Google" vs "Google Cloud"
    if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        return true;
    }
    levenshtein(&norm_a, &norm_b) <= MAX_EDIT_DISTANCE
}

/// Greedy single-pass clustering; only groups with more than one member are
/// reported.
pub fn find_duplicates(names: &[String]) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut taken = vec![false; names.len()];

    for i in 0..names.len() {
        if taken[i] {
            continue;
        }
        taken[i] = true;
        let mut group = vec![names[i].clone()];
        for j in (i + 1)..names.len() {
            if taken[j] {
                continue;
            }
            if are_similar(&names[i], &names[j]) {
                taken[j] = true;
                group.push(names[j].clone());
            }
        }
        if group.len() > 1 {
            groups.push(group);
        }
    }

    groups
}
