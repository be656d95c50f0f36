//! Best-effort mapping of free-text location strings to city/country/state.
//!
//! Not a geocoder. Ambiguous city names (a London exists in both the UK and
//! Canada) resolve to the first table that contains the match, in the fixed
//! order Indian -> US -> UK -> Canadian -> Australian -> European -> Asian.

use serde::{Deserialize, Serialize};

/// Parsed form of a posting's location string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub city: String,
    pub country: String,
    pub state: Option<String>,
    pub is_remote: bool,
}

impl ParsedLocation {
    fn remote() -> Self {
        Self {
            city: "Remote".to_string(),
            country: "Global".to_string(),
            state: None,
            is_remote: true,
        }
    }
}

const INDIAN_CITIES: &[&str] = &[
    "bangalore", "bengaluru", "mumbai", "delhi", "gurgaon", "gurugram", "hyderabad",
    "chennai", "pune", "kolkata", "ahmedabad", "jaipur", "surat", "lucknow",
    "kanpur", "nagpur", "indore", "thane", "bhopal", "visakhapatnam", "pimpri",
    "patna", "vadodara", "ghaziabad", "ludhiana", "agra", "nashik", "faridabad",
    "meerut", "rajkot", "kalyan", "vasai", "varanasi", "srinagar", "aurangabad",
    "dhanbad", "amritsar", "navi mumbai", "allahabad", "prayagraj", "ranchi",
    "howrah", "coimbatore", "jabalpur", "gwalior", "vijayawada", "jodhpur",
    "madurai", "raipur", "kota", "chandigarh", "guwahati", "noida", "greater noida",
];

const US_CITIES: &[&str] = &[
    "new york", "los angeles", "chicago", "houston", "phoenix", "philadelphia",
    "san antonio", "san diego", "dallas", "san jose", "austin", "jacksonville",
    "fort worth", "columbus", "charlotte", "san francisco", "indianapolis",
    "seattle", "denver", "washington", "boston", "nashville", "detroit",
    "portland", "las vegas", "memphis", "louisville", "baltimore", "milwaukee",
    "albuquerque", "tucson", "fresno", "sacramento", "kansas city", "atlanta",
    "miami", "oakland", "raleigh", "minneapolis", "tulsa", "cleveland",
    "new orleans", "tampa", "honolulu", "colorado springs", "st. louis",
];

const UK_CITIES: &[&str] = &[
    "london", "birmingham", "manchester", "glasgow", "liverpool", "edinburgh",
    "leeds", "bristol", "sheffield", "cardiff", "belfast", "newcastle",
    "nottingham", "southampton", "leicester", "coventry", "bradford", "stoke",
];

const CANADIAN_CITIES: &[&str] = &[
    "toronto", "montreal", "vancouver", "calgary", "edmonton", "ottawa",
    "winnipeg", "quebec city", "hamilton", "kitchener", "london", "victoria",
];

const AUSTRALIAN_CITIES: &[&str] = &[
    "sydney", "melbourne", "brisbane", "perth", "adelaide", "gold coast",
    "canberra", "newcastle", "wollongong", "logan city", "geelong", "hobart",
];

const EUROPEAN_CITIES: &[(&str, &str)] = &[
    ("paris", "France"), ("berlin", "Germany"), ("madrid", "Spain"),
    ("rome", "Italy"), ("amsterdam", "Netherlands"), ("barcelona", "Spain"),
    ("munich", "Germany"), ("milan", "Italy"), ("prague", "Czech Republic"),
    ("vienna", "Austria"), ("budapest", "Hungary"), ("warsaw", "Poland"),
    ("dublin", "Ireland"), ("brussels", "Belgium"), ("zurich", "Switzerland"),
    ("stockholm", "Sweden"), ("copenhagen", "Denmark"), ("oslo", "Norway"),
    ("helsinki", "Finland"), ("athens", "Greece"), ("lisbon", "Portugal"),
];

const ASIAN_CITIES: &[(&str, &str)] = &[
    ("singapore", "Singapore"), ("tokyo", "Japan"), ("shanghai", "China"),
    ("beijing", "China"), ("hong kong", "Hong Kong"), ("seoul", "South Korea"),
    ("bangkok", "Thailand"), ("kuala lumpur", "Malaysia"), ("manila", "Philippines"),
    ("jakarta", "Indonesia"), ("dubai", "United Arab Emirates"), ("tel aviv", "Israel"),
    ("taipei", "Taiwan"), ("ho chi minh", "Vietnam"), ("hanoi", "Vietnam"),
];

const US_STATES: &[&str] = &[
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id",
    "il", "in", "ia", "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms",
    "mo", "mt", "ne", "nv", "nh", "nj", "nm", "ny", "nc", "nd", "oh", "ok",
    "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt", "va", "wa", "wv",
    "wi", "wy",
];

const REMOTE_KEYWORDS: &[&str] = &["remote", "anywhere", "wfh", "work from home"];

/// Parse a posting's location string.
///
/// Handles shapes like "Bangalore, India", "Austin, TX", "London, UK",
/// "Remote", and bare city names.
pub fn parse_location(location: &str) -> ParsedLocation {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return ParsedLocation::remote();
    }

    let normalized = trimmed.to_lowercase();
    if REMOTE_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
        return ParsedLocation::remote();
    }

    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let city = parts[0].to_string();
    let city_lower = city.to_lowercase();

    if parts.len() >= 2 {
        let second = parts[1].to_lowercase();
        // Two-letter second segments are treated as US states before country
        // abbreviations: "City, CA" and "City, IN" almost always mean a US
        // state in job postings, not Canada or India.
        if US_STATES.contains(&second.as_str()) {
            return ParsedLocation {
                city,
                country: "United States".to_string(),
                state: Some(parts[1].to_string()),
                is_remote: false,
            };
        }
        if let Some(country) = country_from_name(&second) {
            let state = if country == "United States" {
                parts.get(2).map(|s| s.to_string())
            } else {
                None
            };
            return ParsedLocation {
                city,
                country: country.to_string(),
                state,
                is_remote: false,
            };
        }
    }

    ParsedLocation {
        country: infer_country_from_city(&city_lower).to_string(),
        city,
        state: None,
        is_remote: false,
    }
}

fn country_from_name(segment: &str) -> Option<&'static str> {
    match segment {
        "india" => Some("India"),
        "usa" | "united states" | "us" => Some("United States"),
        "uk" | "united kingdom" | "england" => Some("United Kingdom"),
        "canada" => Some("Canada"),
        "australia" | "au" => Some("Australia"),
        _ => None,
    }
}

fn infer_country_from_city(city_lower: &str) -> &'static str {
    if INDIAN_CITIES.contains(&city_lower) {
        return "India";
    }
    if US_CITIES.contains(&city_lower) {
        return "United States";
    }
    if UK_CITIES.contains(&city_lower) {
        return "United Kingdom";
    }
    if CANADIAN_CITIES.contains(&city_lower) {
        return "Canada";
    }
    if AUSTRALIAN_CITIES.contains(&city_lower) {
        return "Australia";
    }
    if let Some((_, country)) = EUROPEAN_CITIES.iter().find(|(c, _)| *c == city_lower) {
        return country;
    }
    if let Some((_, country)) = ASIAN_CITIES.iter().find(|(c, _)| *c == city_lower) {
        return country;
    }
    "Global"
}

/// Render a parsed location back to display form.
pub fn format_location(parsed: &ParsedLocation) -> String {
    if parsed.is_remote {
        return "Remote".to_string();
    }
    match &parsed.state {
        Some(state) => format!("{}, {}, {}", parsed.city, state, parsed.country),
        None => format!("{}, {}", parsed.city, parsed.country),
    }
}
