//! Which saved credentials apply to a site.

use std::fmt;
use std::str::FromStr;

use crate::types::CredentialRecord;

/// Policy for matching a record's `website` label against a page host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainMatch {
    /// Label equals the host, or the host is a subdomain of the label.
    #[default]
    Suffix,
    /// Either string contains the other. Matches far more than intended on
    /// short labels; kept for compatibility with existing vaults.
    Substring,
}

impl DomainMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suffix => "suffix",
            Self::Substring => "substring",
        }
    }

    pub fn matches(self, label: &str, host: &str) -> bool {
        let label = normalize_label(label);
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if label.is_empty() || host.is_empty() {
            return false;
        }
        match self {
            Self::Suffix => {
                host == label
                    || host
                        .strip_suffix(label.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            Self::Substring => host.contains(&label) || label.contains(&host),
        }
    }

    /// Domains to query the host with, most specific first.
    ///
    /// The host filters by "query is contained in the label", so a page on
    /// `login.example.com` never gets an `example.com` record back from a
    /// query for its own host. Under `Suffix` the parent domains are queried
    /// too, down to two labels. IP literals have no parents.
    pub fn lookup_domains(self, host: &str) -> Vec<String> {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return Vec::new();
        }
        let mut domains = vec![host.clone()];
        if self == Self::Substring || host.parse::<std::net::IpAddr>().is_ok() {
            return domains;
        }
        let mut rest = host.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if !parent.contains('.') {
                break;
            }
            domains.push(parent.to_string());
            rest = parent;
        }
        domains
    }

    /// Records whose label applies to `host`, in their original order.
    pub fn filter<'a>(self, records: &'a [CredentialRecord], host: &str) -> Vec<&'a CredentialRecord> {
        records
            .iter()
            .filter(|r| self.matches(&r.website, host))
            .collect()
    }
}

impl fmt::Display for DomainMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suffix" => Ok(Self::Suffix),
            "substring" => Ok(Self::Substring),
            _ => Err(format!("unknown domain match policy: {s}")),
        }
    }
}

/// Labels are often typed as URLs; reduce them to a bare host name.
fn normalize_label(label: &str) -> String {
    let label = label.trim().to_ascii_lowercase();
    let label = label
        .split_once("://")
        .map_or(label.as_str(), |(_, rest)| rest);
    let label = label.strip_prefix("www.").unwrap_or(label);
    label
        .split(['/', '?', '#', ':'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_string()
}
