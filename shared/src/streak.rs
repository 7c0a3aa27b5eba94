use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Longest run of consecutive calendar days on which at least one push
/// happened. Counts distinct dates, not push volume: a single isolated
/// push-day yields 1, no pushes yields 0.
pub fn longest_push_streak(dates: impl IntoIterator<Item = NaiveDate>) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();

    let mut longest = 0u32;
    let mut current = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        current = match previous {
            Some(prev) if (day - prev).num_days() == 1 => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }

    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn empty_input_has_no_streak() {
        assert_eq!(longest_push_streak([]), 0);
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(longest_push_streak([day(10)]), 1);
    }

    #[test]
    fn gap_breaks_the_run() {
        // D, D+1, D+2, D+5 -> the run is 3, not 4
        assert_eq!(longest_push_streak([day(1), day(2), day(3), day(6)]), 3);
    }

    #[test]
    fn duplicate_dates_collapse() {
        assert_eq!(longest_push_streak([day(4), day(4), day(5)]), 2);
    }

    #[test]
    fn unordered_input_is_sorted_first() {
        assert_eq!(
            longest_push_streak([day(9), day(7), day(8), day(20), day(21)]),
            3
        );
    }
}
