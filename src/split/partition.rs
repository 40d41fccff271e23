//! Deterministic partitioning of a site registry into work splits

use super::WorkSplit;
use crate::sites::SiteRegistry;

/// Split `registry` into at most `desired_splits` balanced groups.
///
/// Site `i` lands in group `i / per_group` with
/// `per_group = ceil(len / min(desired_splits, len))`, so every split holds at most
/// `per_group` sites and only the last one may hold fewer. Registry order is kept
/// inside each split. A non-positive `desired_splits` or an empty registry yields no
/// splits at all.
pub fn partition(registry: &SiteRegistry, desired_splits: i32) -> Vec<WorkSplit> {
    let total = registry.len();
    if desired_splits <= 0 || total == 0 {
        log::debug!(
            "Nothing to partition ({} site(s), {} split(s) requested)",
            total,
            desired_splits
        );
        return Vec::new();
    }

    let effective = usize::try_from(desired_splits)
        .unwrap_or(usize::MAX)
        .min(total);
    let per_group = total.div_ceil(effective);

    let splits: Vec<WorkSplit> = registry
        .sites()
        .chunks(per_group)
        .map(|group| WorkSplit::new(group.to_vec()))
        .collect();

    log::debug!(
        "Partitioned {} site(s) into {} split(s) of at most {}",
        total,
        splits.len(),
        per_group
    );
    splits
}
