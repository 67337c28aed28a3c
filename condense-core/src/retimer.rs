//! Map an original subtitle event's `(start, end)` onto the condensed
//! timeline described by a [`TimeRanges`]. See spec §4.2.

use crate::time_ranges::TimeRanges;

/// Compute the new `(start, end)` of an event under `ranges`, or `None`
/// if the event falls entirely in a removed region.
///
/// `ranges` must share the event's units-per-second; retiming across
/// units is the caller's responsibility (rescale first).
pub fn retime(start: u64, end: u64, ranges: &mut TimeRanges) -> Option<(u64, u64)> {
    if ranges.is_empty() {
        return None;
    }

    let len = ranges.len();

    let mut guess_idx = ranges.index_of(start);
    if guess_idx >= len {
        guess_idx -= 1;
    }

    // Walk backward to the first range whose end >= start.
    let mut first_idx = guess_idx;
    for i in (0..=guess_idx).rev() {
        if ranges.get(i).end < start {
            first_idx = i + 1;
            break;
        }
        first_idx = i;
    }

    if first_idx >= len {
        return None;
    }

    // Walk forward to the last range whose start <= end. If even the
    // guessed range starts after `end`, the event lies entirely before
    // every kept range on the timeline and must be dropped.
    let mut last_idx = None;
    for i in guess_idx..len {
        if ranges.get(i).start > end {
            last_idx = i.checked_sub(1);
            break;
        }
        last_idx = Some(i);
    }
    let last_idx = match last_idx {
        Some(idx) => idx,
        None => return None,
    };

    let mut start = start;
    let mut end = end;

    let first_range = ranges.get(first_idx);
    let last_range = ranges.get(last_idx);

    if first_range.start >= start {
        start = first_range.start;
    }
    if last_range.end <= end {
        end = last_range.end;
    }

    let skip_before = ranges.cumulative_skip(first_idx);
    let skip_during = ranges.cumulative_skip(last_idx);

    let new_start = start.saturating_sub(skip_before);
    let new_end = end.saturating_sub(skip_during);

    if new_end <= new_start {
        None
    } else {
        Some((new_start, new_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(pairs: &[(u64, u64)], ups: u64) -> TimeRanges {
        TimeRanges::from_unsorted(pairs.to_vec(), ups)
    }

    #[test]
    fn s1_empty_ranges_drops() {
        let mut r = TimeRanges::empty(1000);
        assert_eq!(retime(0, 100, &mut r), None);
    }

    #[test]
    fn s2_single_range_identity() {
        let mut r = ranges(&[(0, 100)], 1000);
        assert_eq!(retime(0, 100, &mut r), Some((0, 100)));
    }

    #[test]
    fn s3_consolidated_touching_ranges() {
        let mut r = ranges(&[(0, 50), (50, 100)], 1000);
        assert_eq!(retime(0, 100, &mut r), Some((0, 100)));
    }

    #[test]
    fn s4_clips_to_single_range() {
        let mut r = ranges(&[(20, 80)], 1000);
        assert_eq!(retime(0, 100, &mut r), Some((0, 60)));
    }

    #[test]
    fn s5_straddles_a_hole() {
        let mut r = ranges(&[(0, 20), (80, 100)], 1000);
        assert_eq!(retime(0, 100, &mut r), Some((0, 40)));
    }

    #[test]
    fn s6_multiple_ranges() {
        let mut r = ranges(&[(10, 20), (40, 50), (80, 90)], 1000);
        assert_eq!(retime(50, 150, &mut r), Some((20, 30)));
        assert_eq!(retime(0, 100, &mut r), Some((0, 30)));
    }

    #[test]
    fn event_inside_hole_drops() {
        let mut r = ranges(&[(0, 10), (50, 60)], 1000);
        assert_eq!(retime(20, 30, &mut r), None);
    }

    #[test]
    fn event_past_every_range_drops() {
        let mut r = ranges(&[(0, 10)], 1000);
        assert_eq!(retime(50, 60, &mut r), None);
    }

    #[test]
    fn surviving_events_preserve_order() {
        let mut r = ranges(&[(0, 10), (20, 30), (40, 50)], 1000);
        let a = retime(0, 10, &mut r).unwrap();
        let b = retime(20, 30, &mut r).unwrap();
        let c = retime(40, 50, &mut r).unwrap();
        assert!(a.0 < b.0 && b.0 < c.0);
    }
}
