//! Target selection among candidate configurations.

use buildgate_core::BuildConfiguration;

fn load_key(config: &BuildConfiguration) -> (bool, usize) {
    (!config.idle, config.active_count)
}

/// Order candidates idle-first, then by ascending active count.
///
/// The sort is stable, so ties keep discovery order.
pub fn rank_candidates(candidates: &mut [BuildConfiguration]) {
    candidates.sort_by_key(load_key);
}

/// Pick the least-loaded candidate without reordering.
///
/// Busy candidates are still eligible when nothing is idle. Returns `None`
/// only for an empty slice.
pub fn select_target(candidates: &[BuildConfiguration]) -> Option<&BuildConfiguration> {
    // min_by_key keeps the first of equal minima
    candidates.iter().min_by_key(|c| load_key(c))
}
