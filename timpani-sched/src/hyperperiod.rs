use tracing::warn;

/// Hyperperiods above this are reported, not rejected — almost always a
/// sign of incompatible task periods rather than an intentional workload
/// (spec §4.3).
const HYPERPERIOD_WARN_THRESHOLD_US: u64 = 3_600_000_000; // 1 hour

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b)) * b
}

/// The hyperperiod of a set of task periods: the LCM of the distinct values
/// present, iteratively reduced (spec §4.3,
/// `original_source/src/scheduler_utils.cpp::calculateHyperperiod`).
///
/// Returns `0` for an empty set.
pub fn compute_hyperperiod(periods_us: &[u64]) -> u64 {
    let mut distinct: Vec<u64> = periods_us.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let Some(&first) = distinct.first() else {
        return 0;
    };

    let result = distinct.iter().skip(1).fold(first, |acc, &p| lcm(acc, p));
    if result > HYPERPERIOD_WARN_THRESHOLD_US {
        warn!(
            hyperperiod_us = result,
            "hyperperiod exceeds 1 hour; periods are likely incompatible"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_periods_yield_zero() {
        assert_eq!(compute_hyperperiod(&[]), 0);
    }

    #[test]
    fn single_period_is_its_own_hyperperiod() {
        assert_eq!(compute_hyperperiod(&[100_000]), 100_000);
    }

    #[test]
    fn lcm_of_distinct_periods() {
        assert_eq!(compute_hyperperiod(&[100_000, 150_000]), 300_000);
    }

    #[test]
    fn duplicate_periods_do_not_change_the_result() {
        assert_eq!(compute_hyperperiod(&[200_000, 200_000, 100_000]), 200_000);
    }

    #[test]
    fn three_coprime_periods_multiply() {
        assert_eq!(compute_hyperperiod(&[3, 5, 7]), 105);
    }
}
