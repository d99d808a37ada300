//! Domain-based source credibility classification.
//!
//! Pure and total: the tier is a function of the URL's hostname only,
//! with no external lookups.

use url::Url;

use crate::domain::Credibility;

/// Wire services, major broadcasters, health/science authorities,
/// and fact-checking organizations.
const TRUSTED_DOMAINS: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.co.uk",
    "bbc.com",
    "citizentv.co.ke",
    "ktntv.com",
    "aljazeera.com",
    "cnn.com",
    "foxnews.com",
    "kbc.co.ke",
    "ntv.co.ke",
    "who.int",
    "cdc.gov",
    "nih.gov",
    "nature.com",
    "science.org",
    "snopes.com",
    "politifact.com",
    "factcheck.org",
];

const LOW_CRED_DOMAINS: &[&str] = &["beforeitsnews.com"];

fn matches_domain_set(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Classify a source URL into a credibility tier.
///
/// The publisher is currently unused beyond presence; classification is
/// driven entirely by the hostname.
pub fn label_credibility(url: Option<&str>, _publisher: Option<&str>) -> Credibility {
    let Some(url) = url else {
        return Credibility::Unknown;
    };

    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if matches_domain_set(&host, TRUSTED_DOMAINS) {
        return Credibility::Trusted;
    }
    if matches_domain_set(&host, LOW_CRED_DOMAINS) {
        return Credibility::Low;
    }

    // Neutral when the hostname looks like a real domain.
    if !host.is_empty() && host.contains('.') {
        return Credibility::Neutral;
    }

    Credibility::Unknown
}
