//! First-fit allocation over a byte region.
//!
//! Occupancy is never stored. Callers pass the ranges currently in use and
//! the free runs are derived from them, so releasing space is just a matter
//! of forgetting a range. The same policy serves the file data region and
//! the kernel's variable memory.

use std::ops::Range;

/// The free runs of `region` not covered by any of `occupied`, lowest first.
///
/// Occupied ranges may be unsorted, empty, or reach outside the region.
pub fn free_runs<I>(occupied: I, region: Range<usize>) -> Vec<Range<usize>>
where
    I: IntoIterator<Item = Range<usize>>,
{
    let mut used: Vec<Range<usize>> = occupied
        .into_iter()
        .map(|r| r.start.max(region.start)..r.end.min(region.end))
        .filter(|r| r.start < r.end)
        .collect();
    used.sort_by_key(|r| r.start);

    let mut runs = Vec::new();
    let mut cursor = region.start;
    for range in used {
        if range.start > cursor {
            runs.push(cursor..range.start);
        }
        cursor = cursor.max(range.end);
    }
    if cursor < region.end {
        runs.push(cursor..region.end);
    }
    runs
}

/// Lowest address in `region` where `size` contiguous bytes are free.
///
/// A zero-size request always fits at the start of the region.
pub fn first_fit<I>(occupied: I, region: Range<usize>, size: usize) -> Option<usize>
where
    I: IntoIterator<Item = Range<usize>>,
{
    if size == 0 {
        return Some(region.start);
    }
    free_runs(occupied, region)
        .into_iter()
        .find(|run| run.len() >= size)
        .map(|run| run.start)
}

/// Length of the longest free run in `region`.
pub fn largest_run<I>(occupied: I, region: Range<usize>) -> usize
where
    I: IntoIterator<Item = Range<usize>>,
{
    free_runs(occupied, region)
        .iter()
        .map(|run| run.len())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_one_run() {
        assert_eq!(free_runs(Vec::new(), 10..50), vec![10..50]);
        assert_eq!(largest_run(Vec::new(), 10..50), 40);
    }

    #[test]
    fn runs_skip_occupied_ranges() {
        let occupied = vec![30..35, 10..20];
        assert_eq!(free_runs(occupied, 10..50), vec![20..30, 35..50]);
    }

    #[test]
    fn first_fit_takes_lowest_hole() {
        // Holes: 20..25 (5), 30..40 (10), 45..100 (55)
        let occupied = vec![10..20, 25..30, 40..45];
        assert_eq!(first_fit(occupied.clone(), 10..100, 5), Some(20));
        assert_eq!(first_fit(occupied.clone(), 10..100, 6), Some(30));
        assert_eq!(first_fit(occupied.clone(), 10..100, 11), Some(45));
        assert_eq!(first_fit(occupied, 10..100, 56), None);
    }

    #[test]
    fn zero_size_always_fits() {
        assert_eq!(first_fit(vec![10..100], 10..100, 0), Some(10));
    }

    #[test]
    fn out_of_region_ranges_are_clamped() {
        assert_eq!(free_runs(vec![0..15, 95..200], 10..100), vec![15..95]);
    }

    #[test]
    fn overlapping_ranges_merge() {
        assert_eq!(free_runs(vec![10..30, 20..25], 0..40), vec![0..10, 30..40]);
        assert_eq!(largest_run(vec![0..40], 0..40), 0);
    }
}
