//! Weighted scenario selection

use stampede_core::Scenario;

/// Pick a scenario with probability proportional to its weight
///
/// When every weight is zero the pick is uniform. Negative weights are
/// rejected by validation and count as zero here. Returns `None` only for an
/// empty slice.
pub fn select<'a>(scenarios: &'a [Scenario], rng: &mut fastrand::Rng) -> Option<&'a Scenario> {
    let first = scenarios.first()?;

    let total_weight = scenarios
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(effective_weight(s)));

    if total_weight == 0 {
        return scenarios.get(rng.usize(..scenarios.len()));
    }

    let target = rng.u64(..total_weight);
    let mut cumulative = 0u64;
    for scenario in scenarios {
        cumulative = cumulative.saturating_add(effective_weight(scenario));
        if cumulative > target {
            return Some(scenario);
        }
    }

    Some(first)
}

fn effective_weight(scenario: &Scenario) -> u64 {
    scenario.weight.max(0) as u64
}
