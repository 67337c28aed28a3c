//! A sorted, non-overlapping set of half-open integer intervals, with
//! merging, padding, unit rescaling, binary search and a cumulative-skip
//! index. See spec §3/§4.1.

use crate::error::{ErrorKind, Result};

/// A `[start, end)` span of non-negative integers in some
/// `units_per_second`. Touching spans (`a.end == b.start`) are treated
/// as overlapping by every operation in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Interval { start, end }
    }

    fn overlaps(&self, other: &Interval) -> bool {
        (self.start >= other.start && self.start <= other.end)
            || (other.start >= self.start && other.start <= self.end)
    }

    fn merge(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<(u64, u64)> for Interval {
    fn from(pair: (u64, u64)) -> Self {
        Interval::new(pair.0, pair.1)
    }
}

fn consolidate(mut ranges: Vec<Interval>) -> Vec<Interval> {
    if ranges.len() <= 1 {
        return ranges;
    }

    let mut out: Vec<Interval> = Vec::with_capacity(ranges.len());
    out.push(ranges.remove(0));

    for r in ranges {
        let last = out.last().copied().unwrap();
        if last.overlaps(&r) {
            *out.last_mut().unwrap() = last.merge(&r);
        } else {
            out.push(r);
        }
    }

    out
}

/// An ordered, consolidated set of [`Interval`]s together with a
/// `units_per_second` denominator. See spec §3 for the invariants
/// maintained on every mutation.
#[derive(Debug, Clone)]
pub struct TimeRanges {
    ranges: Vec<Interval>,
    units_per_second: u64,
    cumulative_skip: Option<Vec<u64>>,
}

impl TimeRanges {
    /// A range set with no intervals at the given units-per-second.
    pub fn empty(units_per_second: u64) -> Self {
        TimeRanges {
            ranges: Vec::new(),
            units_per_second,
            cumulative_skip: None,
        }
    }

    /// Accept any finite iterable of `(start, end)` pairs, sort by
    /// start, then consolidate.
    pub fn from_unsorted<I, P>(pairs: I, units_per_second: u64) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Interval>,
    {
        let mut ranges: Vec<Interval> = pairs.into_iter().map(Into::into).collect();
        ranges.sort_by_key(|r| r.start);
        let ranges = consolidate(ranges);

        TimeRanges {
            ranges,
            units_per_second,
            cumulative_skip: None,
        }
    }

    pub fn units_per_second(&self) -> u64 {
        self.units_per_second
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.ranges.iter()
    }

    pub fn get(&self, idx: usize) -> Interval {
        self.ranges[idx]
    }

    /// Rescale every range to a new units-per-second. `start` floors,
    /// `end` ceils, so the new union is always a superset of the old
    /// union scaled by the same factor — retiming never clips an event
    /// because of integer rounding. Clears the cached skip vector.
    pub fn with_units_per_second(&self, new_ups: u64) -> Result<Self> {
        if self.units_per_second == new_ups {
            return Ok(self.clone());
        }

        let factor = new_ups as f64 / self.units_per_second as f64;

        if !factor.is_finite() || factor <= 0.0 {
            return Err(ErrorKind::Invalid(format!(
                "bad rescale factor {} (from {} to {})",
                factor, self.units_per_second, new_ups
            ))
            .into());
        }

        let ranges: Vec<Interval> = self
            .ranges
            .iter()
            .map(|r| {
                Interval::new(
                    (r.start as f64 * factor).floor() as u64,
                    (r.end as f64 * factor).ceil() as u64,
                )
            })
            .collect();

        // Downscaling can bring two previously-separate ranges into
        // contact (floor-start/ceil-end each grow relative to the
        // gap between them), so re-consolidate before returning.
        Ok(TimeRanges {
            ranges: consolidate(ranges),
            units_per_second: new_ups,
            cumulative_skip: None,
        })
    }

    /// Add `start_pad` units (measured at `pad_ups`) to the left and
    /// `end_pad` to the right of every range, clipping the left pad at
    /// zero. A no-op when both pads are zero. See spec §4.1.
    pub fn pad(&mut self, start_pad: u64, end_pad: u64, pad_ups: u64) -> Result<()> {
        if start_pad == 0 && end_pad == 0 {
            return Ok(());
        }

        let (mut effective_start_pad, mut effective_end_pad) = (start_pad, end_pad);
        let mut base = self.clone();

        if pad_ups > self.units_per_second {
            base = self.with_units_per_second(pad_ups)?;
        } else if pad_ups < self.units_per_second {
            let factor = self.units_per_second as f64 / pad_ups as f64;
            effective_start_pad = (start_pad as f64 * factor).floor() as u64;
            effective_end_pad = (end_pad as f64 * factor).ceil() as u64;
        }

        let ranges = base
            .ranges
            .iter()
            .map(|r| {
                Interval::new(
                    r.start.saturating_sub(effective_start_pad),
                    r.end + effective_end_pad,
                )
            })
            .collect::<Vec<_>>();

        self.ranges = consolidate(ranges);
        self.units_per_second = base.units_per_second;
        self.cumulative_skip = None;

        Ok(())
    }

    /// Binary-search insertion point by `start`: the position `i` such
    /// that `ranges[i].start >= t > ranges[i-1].start`.
    pub fn index_of(&self, t: u64) -> usize {
        if self.ranges.is_empty() {
            return 0;
        }

        if self.ranges[0].start > t {
            return 0;
        }

        if self.ranges[self.ranges.len() - 1].start < t {
            return self.ranges.len();
        }

        let mut low = 0usize;
        let mut high = self.ranges.len();

        while low < high {
            let mid = (low + high) / 2;
            let mid_start = self.ranges[mid].start;

            if mid_start == t {
                return mid;
            } else if mid_start < t {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        low
    }

    fn consolidate_around(&mut self, index: usize) {
        if self.ranges.len() <= 1 {
            return;
        }

        let mut index = index;

        while index > 0 && self.ranges[index - 1].overlaps(&self.ranges[index]) {
            let merged = self.ranges[index - 1].merge(&self.ranges[index]);
            self.ranges[index - 1] = merged;
            self.ranges.remove(index);
            index -= 1;
        }

        while index + 1 < self.ranges.len() && self.ranges[index].overlaps(&self.ranges[index + 1])
        {
            let merged = self.ranges[index].merge(&self.ranges[index + 1]);
            self.ranges[index] = merged;
            self.ranges.remove(index + 1);
        }
    }

    /// Insert `(start, end)` at its sorted position then re-consolidate
    /// locally. Invalidates the cached skip vector.
    pub fn add(&mut self, start: u64, end: u64) {
        let idx = self.index_of(start);
        self.ranges.insert(idx, Interval::new(start, end));
        self.consolidate_around(idx);
        self.cumulative_skip = None;
    }

    fn rebuild_cumulative_skip(&mut self) {
        if self.ranges.is_empty() {
            self.cumulative_skip = Some(Vec::new());
            return;
        }

        let mut cache = Vec::with_capacity(self.ranges.len());
        cache.push(self.ranges[0].start);

        for i in 1..self.ranges.len() {
            let this_skip = self.ranges[i].start - self.ranges[i - 1].end;
            cache.push(cache[i - 1] + this_skip);
        }

        self.cumulative_skip = Some(cache);
    }

    /// The total removed time preceding (and excluding) range `idx` on
    /// the condensed timeline. Callers must not query this on an empty
    /// set.
    pub fn cumulative_skip(&mut self, idx: usize) -> u64 {
        if self.cumulative_skip.is_none() {
            self.rebuild_cumulative_skip();
        }
        self.cumulative_skip.as_ref().unwrap()[idx]
    }
}

impl<'a> IntoIterator for &'a TimeRanges {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_unsorted_sorts_and_consolidates() {
        let r = TimeRanges::from_unsorted(vec![(50, 100), (0, 50)], 1000);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0), Interval::new(0, 100));
    }

    #[test]
    fn touching_ranges_merge() {
        let r = TimeRanges::from_unsorted(vec![(0, 50), (50, 100)], 1000);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0), Interval::new(0, 100));
    }

    #[test]
    fn disjoint_ranges_stay_separate() {
        let r = TimeRanges::from_unsorted(vec![(0, 20), (80, 100)], 1000);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn pad_zero_zero_is_noop() {
        let mut r = TimeRanges::from_unsorted(vec![(20, 80)], 1000);
        let before = r.clone();
        r.pad(0, 0, 1000).unwrap();
        assert_eq!(r.get(0), before.get(0));
        assert_eq!(r.len(), before.len());
    }

    #[test]
    fn pad_then_pad_zero_is_idempotent() {
        let mut a = TimeRanges::from_unsorted(vec![(20, 80)], 1000);
        a.pad(10, 5, 1000).unwrap();

        let mut b = a.clone();
        b.pad(0, 0, 1000).unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn pad_clips_left_at_zero() {
        let mut r = TimeRanges::from_unsorted(vec![(5, 80)], 1000);
        r.pad(10, 0, 1000).unwrap();
        assert_eq!(r.get(0).start, 0);
    }

    #[test]
    fn pad_merges_overlapping_neighbors() {
        let mut r = TimeRanges::from_unsorted(vec![(0, 20), (30, 50)], 1000);
        r.pad(0, 15, 1000).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0), Interval::new(0, 65));
    }

    #[test]
    fn with_units_per_second_floors_start_ceils_end() {
        let r = TimeRanges::from_unsorted(vec![(1, 3)], 3);
        let rescaled = r.with_units_per_second(2).unwrap();
        // factor = 2/3; floor(1 * 2/3) = 0; ceil(3 * 2/3) = 2
        assert_eq!(rescaled.get(0), Interval::new(0, 2));
    }

    #[test]
    fn with_units_per_second_is_a_covering_rescale() {
        let r = TimeRanges::from_unsorted(vec![(10, 37)], 100);
        let up = r.with_units_per_second(1000).unwrap();
        let down = up.with_units_per_second(7).unwrap();
        // union of `down` must be a superset of the 100->7 scaled union of `r`
        let direct = r.with_units_per_second(7).unwrap();
        assert!(down.get(0).start <= direct.get(0).start);
        assert!(down.get(0).end >= direct.get(0).end);
    }

    #[test]
    fn downscale_reconsolidates_ranges_that_now_touch() {
        // At ups=100, (0,10) and (11,20) are separate. Scaled down by
        // 1/10, floor-start/ceil-end gives (0,1) and (1,2), which now
        // touch and must be merged to preserve the invariant.
        let r = TimeRanges::from_unsorted(vec![(0, 10), (11, 20)], 100);
        let down = r.with_units_per_second(10).unwrap();
        assert_eq!(down.len(), 1);
        assert_eq!(down.get(0), Interval::new(0, 2));
    }

    #[test]
    fn add_inserts_and_consolidates() {
        let mut r = TimeRanges::empty(1000);
        r.add(100, 500);
        r.add(500, 1000);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(0), Interval::new(100, 1000));
    }

    #[test]
    fn index_of_matches_documented_semantics() {
        let r = TimeRanges::from_unsorted(vec![(10, 20), (40, 50), (80, 90)], 1000);
        assert_eq!(r.index_of(0), 0);
        assert_eq!(r.index_of(10), 0);
        assert_eq!(r.index_of(15), 1);
        assert_eq!(r.index_of(40), 1);
        assert_eq!(r.index_of(100), 3);
    }

    #[test]
    fn cumulative_skip_sequence() {
        let mut r = TimeRanges::from_unsorted(vec![(10, 20), (40, 50), (80, 90)], 1000);
        assert_eq!(r.cumulative_skip(0), 10);
        assert_eq!(r.cumulative_skip(1), 10 + (40 - 20));
        assert_eq!(r.cumulative_skip(2), 10 + 20 + (80 - 50));
    }

    #[test]
    fn rescale_rejects_nonfinite_factor() {
        let r = TimeRanges::from_unsorted(vec![(0, 10)], 0);
        let err = r.with_units_per_second(100);
        assert!(err.is_err());
    }

    fn assert_invariants(r: &TimeRanges) {
        for i in 0..r.len() {
            assert!(r.get(i).start <= r.get(i).end);
        }
        for i in 1..r.len() {
            let prev = r.get(i - 1);
            let cur = r.get(i);
            assert!(cur.start > prev.end, "adjacent ranges must not overlap or touch");
        }
    }

    // spec §8 property 1: from_unsorted and any sequence of add/pad/
    // with_units_per_second calls must leave the range list strictly
    // ordered, non-overlapping, non-touching, start >= 0.
    #[test]
    fn randomized_scenarios_preserve_invariants() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pair_count = rng.gen_range(0, 20);
            let pairs: Vec<(u64, u64)> = (0..pair_count)
                .map(|_| {
                    let start = rng.gen_range(0, 1000);
                    let end = start + rng.gen_range(0, 200);
                    (start, end)
                })
                .collect();

            let mut r = TimeRanges::from_unsorted(pairs, 1000);
            assert_invariants(&r);

            for _ in 0..5 {
                match rng.gen_range(0, 3) {
                    0 => {
                        let start = rng.gen_range(0, 1000);
                        let end = start + rng.gen_range(0, 200);
                        r.add(start, end);
                    }
                    1 => {
                        let start_pad = rng.gen_range(0, 50);
                        let end_pad = rng.gen_range(0, 50);
                        r.pad(start_pad, end_pad, 1000).unwrap();
                    }
                    _ => {
                        let new_ups = rng.gen_range(1, 2000);
                        r = r.with_units_per_second(new_ups).unwrap();
                    }
                }
                assert_invariants(&r);
            }
        }
    }
}
