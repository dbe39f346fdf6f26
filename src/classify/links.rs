// Outbound link domains.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Hostname of a link entity. Scheme-less links ("example.com/path") are
/// read as https. Returns `None` for anything without a host.
pub fn link_host(link: &str) -> Option<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{trimmed}"))
    };
    parsed
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_lowercase)
}

/// Count hostnames across links, most frequent first (ties by domain).
///
/// Links without a parseable host are ignored, so the sum of the counts is
/// the number of usable outbound links.
pub fn count_domains<'a>(links: impl IntoIterator<Item = &'a str>) -> Vec<DomainCount> {
    let mut counter: HashMap<String, usize> = HashMap::new();
    for host in links.into_iter().filter_map(link_host) {
        *counter.entry(host).or_insert(0) += 1;
    }
    let mut domains: Vec<DomainCount> = counter
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();
    domains.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    domains
}
