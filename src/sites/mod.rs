//! Sites: the logical reporting sources that work is partitioned over.

mod entry;
mod registry;

pub use entry::{AddressType, DOMAIN_PREFIX, SiteEntry};
pub use registry::{
    SITE_DELIMITER, SITE_KV_DELIMITER, SiteRegistry, check_sites_accessible, format_site_list,
    parse_site_list,
};
