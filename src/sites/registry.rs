//! Site registry construction
//!
//! A registry is the ordered list of rendered addresses that partitioning works on.
//! It is built either from a delimited configuration list or from the API's
//! site listing. Both paths deduplicate while keeping first-seen order, so the
//! same configuration always yields the same registry.

use super::{AddressType, SiteEntry};
use crate::error::{ConnectorError, Result, ValidationFailure};

use std::collections::HashSet;

/// Separates `address` from `type` inside one list item
pub const SITE_KV_DELIMITER: &str = "__SITE_KV_DELIMITER__";
/// Separates list items
pub const SITE_DELIMITER: &str = "__SITE_DELIMITER__";

/// Ordered, duplicate-free sequence of rendered site addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteRegistry {
    sites: Vec<String>,
}

impl SiteRegistry {
    /// Build from site entries, rendering each exactly once
    pub fn from_entries(entries: &[SiteEntry]) -> Self {
        Self::from_rendered(entries.iter().map(SiteEntry::rendered))
    }

    /// Build from addresses that already carry their prefix (e.g. the site listing)
    pub fn from_rendered(sites: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let sites = sites
            .into_iter()
            .filter(|site| seen.insert(site.clone()))
            .collect();
        Self { sites }
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Parse a `address<KV>type<SITE>address<KV>type` list into entries.
///
/// Duplicates by `(address, type)` are dropped; first occurrence wins.
pub fn parse_site_list(list: &str) -> Result<Vec<SiteEntry>> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for item in list.split(SITE_DELIMITER) {
        if item.trim().is_empty() {
            continue;
        }
        let (address, site_type) = item.split_once(SITE_KV_DELIMITER).ok_or_else(|| {
            ConnectorError::PartitionInput(format!("site entry '{}' has no type", item))
        })?;
        let address = address.trim();
        if address.is_empty() {
            return Err(ConnectorError::PartitionInput(format!(
                "site entry '{}' has an empty address",
                item
            )));
        }
        let address_type: AddressType = site_type
            .parse()
            .map_err(|e| ConnectorError::PartitionInput(format!("{} in '{}'", e, item)))?;

        let entry = SiteEntry::new(address, address_type);
        if seen.insert(entry.clone()) {
            entries.push(entry);
        }
    }

    if entries.is_empty() {
        return Err(ConnectorError::PartitionInput(
            "site list contains no entries".to_string(),
        ));
    }

    log::debug!("Parsed {} site(s) from configured list", entries.len());
    Ok(entries)
}

/// Render entries back into the delimited list format
pub fn format_site_list(entries: &[SiteEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}{}{}", e.address, SITE_KV_DELIMITER, e.address_type.label()))
        .collect::<Vec<_>>()
        .join(SITE_DELIMITER)
}

/// Report every configured entry the credential cannot see
pub fn check_sites_accessible(
    entries: &[SiteEntry],
    available: &[String],
) -> Vec<ValidationFailure> {
    let available: HashSet<&str> = available.iter().map(String::as_str).collect();
    entries
        .iter()
        .filter(|entry| !available.contains(entry.rendered().as_str()))
        .map(|entry| ValidationFailure::new("Site not accessible:", entry.address.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[(&str, &str)]) -> String {
        items
            .iter()
            .map(|(a, t)| format!("{}{}{}", a, SITE_KV_DELIMITER, t))
            .collect::<Vec<_>>()
            .join(SITE_DELIMITER)
    }

    #[test]
    fn test_parse_site_list() {
        let input = list(&[
            ("example.com", "Domain"),
            ("https://shop.example.com/", "Url Prefix"),
        ]);
        let entries = parse_site_list(&input).unwrap();
        assert_eq!(
            entries,
            vec![
                SiteEntry::new("example.com", AddressType::Domain),
                SiteEntry::new("https://shop.example.com/", AddressType::UrlPrefix),
            ]
        );
    }

    #[test]
    fn test_parse_site_list_dedups_keeping_order() {
        let input = list(&[
            ("b.com", "Domain"),
            ("a.com", "Domain"),
            ("b.com", "Domain"),
            ("b.com", "Url Prefix"),
        ]);
        let entries = parse_site_list(&input).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].address, "b.com");
        assert_eq!(entries[1].address, "a.com");
        assert_eq!(entries[2].address_type, AddressType::UrlPrefix);
    }

    #[test]
    fn test_parse_site_list_missing_type() {
        let err = parse_site_list("example.com").unwrap_err();
        assert!(matches!(err, ConnectorError::PartitionInput(_)));
    }

    #[test]
    fn test_parse_site_list_unknown_type() {
        let err = parse_site_list(&list(&[("example.com", "Folder")])).unwrap_err();
        assert!(err.to_string().contains("unknown site type"));
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_site_list("").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let entries = vec![
            SiteEntry::new("example.com", AddressType::Domain),
            SiteEntry::new("https://example.org/", AddressType::UrlPrefix),
        ];
        let parsed = parse_site_list(&format_site_list(&entries)).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_registry_renders_and_keeps_order() {
        let registry = SiteRegistry::from_entries(&[
            SiteEntry::new("z.com", AddressType::Domain),
            SiteEntry::new("https://a.com/", AddressType::UrlPrefix),
        ]);
        assert_eq!(registry.sites(), ["sc-domain:z.com", "https://a.com/"]);
    }

    #[test]
    fn test_registry_from_listing_dedups() {
        let registry = SiteRegistry::from_rendered(vec![
            "sc-domain:a.com".to_string(),
            "sc-domain:a.com".to_string(),
            "https://b.com/".to_string(),
        ]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_check_sites_accessible() {
        let entries = vec![
            SiteEntry::new("a.com", AddressType::Domain),
            SiteEntry::new("https://b.com/", AddressType::UrlPrefix),
        ];
        let available = vec!["sc-domain:a.com".to_string()];
        let failures = check_sites_accessible(&entries, &available);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].correction, "https://b.com/");
    }
}
