//! Domain-shape helpers shared by the checks.

use std::net::IpAddr;
use url::Url;

/// Second-level labels that form part of a public suffix (e.g. `co.uk`).
const SHORT_SUFFIXES: &[&str] = &["co", "com", "org", "net", "gov", "edu", "ac"];

/// Returns the lower-cased host of a URL, without a trailing dot or IPv6
/// brackets.
pub fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = host.trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// True when the host is a literal IPv4 or IPv6 address.
pub fn is_ip_host(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}

/// Extracts the registrable root of a host name.
///
/// The last three labels are kept when the second-to-last label is a known
/// short suffix (`bbc.co.uk`), otherwise the last two (`google.com`). IP
/// hosts are returned unchanged.
pub fn root_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if is_ip_host(&host) {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let keep = if SHORT_SUFFIXES.contains(&labels[labels.len() - 2]) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

/// Drops the public suffix from a root domain, leaving the brand label
/// (`paypal.com` -> `paypal`, `bbc.co.uk` -> `bbc`).
pub fn strip_tld(root: &str) -> String {
    if is_ip_host(root) {
        return root.to_string();
    }
    root.split('.').next().unwrap_or(root).to_lowercase()
}

/// Top-level label of a host, if it has one.
pub fn tld(host: &str) -> Option<&str> {
    if is_ip_host(host) {
        return None;
    }
    host.trim_end_matches('.').rsplit('.').next().filter(|t| !t.is_empty())
}

/// Number of labels in front of the root domain.
pub fn subdomain_count(host: &str) -> usize {
    let root_labels = root_domain(host).split('.').count();
    let host_labels = host.split('.').filter(|l| !l.is_empty()).count();
    host_labels.saturating_sub(root_labels)
}

/// True when `s` contains a run of at least `len` ASCII digits.
pub fn has_digit_run(s: &str, len: usize) -> bool {
    let mut run = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Undoes the common look-alike digit substitutions.
pub fn normalize_leetspeak(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '0' => 'o',
            '1' => 'l',
            '5' => 's',
            '8' => 'b',
            other => other,
        })
        .collect()
}
