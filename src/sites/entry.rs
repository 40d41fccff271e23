//! Site addressing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix the reporting API expects in front of domain properties
pub const DOMAIN_PREFIX: &str = "sc-domain:";

/// How a site address is interpreted by the reporting API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    /// A whole domain, addressed as `sc-domain:<address>`
    Domain,
    /// A URL prefix such as `https://example.com/`, addressed as-is
    UrlPrefix,
}

impl AddressType {
    /// Human readable label written into the `type` field of every row
    pub fn label(&self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::UrlPrefix => "Url Prefix",
        }
    }

    /// Address type of an already rendered address
    pub fn of_rendered(rendered: &str) -> Self {
        if rendered.starts_with(DOMAIN_PREFIX) {
            Self::Domain
        } else {
            Self::UrlPrefix
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domain" => Ok(Self::Domain),
            "url prefix" | "urlprefix" | "url_prefix" => Ok(Self::UrlPrefix),
            other => Err(format!("unknown site type '{}'", other)),
        }
    }
}

/// One queryable source: a bare address and how to interpret it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteEntry {
    pub address: String,
    pub address_type: AddressType,
}

impl SiteEntry {
    pub fn new(address: impl Into<String>, address_type: AddressType) -> Self {
        Self {
            address: address.into(),
            address_type,
        }
    }

    /// Address as used in API calls and partitioning
    pub fn rendered(&self) -> String {
        match self.address_type {
            AddressType::Domain => format!("{}{}", DOMAIN_PREFIX, self.address),
            AddressType::UrlPrefix => self.address.clone(),
        }
    }
}

impl fmt::Display for SiteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.address_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_renders_with_prefix() {
        let entry = SiteEntry::new("example.com", AddressType::Domain);
        assert_eq!(entry.rendered(), "sc-domain:example.com");
    }

    #[test]
    fn test_url_prefix_renders_unchanged() {
        let entry = SiteEntry::new("https://example.com/", AddressType::UrlPrefix);
        assert_eq!(entry.rendered(), "https://example.com/");
    }

    #[test]
    fn test_type_of_rendered_address() {
        assert_eq!(
            AddressType::of_rendered("sc-domain:example.com"),
            AddressType::Domain
        );
        assert_eq!(
            AddressType::of_rendered("https://example.com/"),
            AddressType::UrlPrefix
        );
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Domain".parse::<AddressType>(), Ok(AddressType::Domain));
        assert_eq!("Url Prefix".parse::<AddressType>(), Ok(AddressType::UrlPrefix));
        assert!("folder".parse::<AddressType>().is_err());
    }

    #[test]
    fn test_label_round_trips() {
        for t in [AddressType::Domain, AddressType::UrlPrefix] {
            assert_eq!(t.label().parse::<AddressType>(), Ok(t));
        }
    }
}
