//! Distribution template and the bucket-based sorts built on it.
//!
//! [`save`] scans a range once and files every index under the key produced
//! by a [`BucketSource`]; [`load`] writes the buckets back contiguously in
//! key order and reports the range each bucket landed in. Descending runs
//! mirror the key (`count - 1 - key`) so buckets are always loaded in
//! ascending numeric key order.

use std::sync::Arc;

use crate::algorithm::{BucketSource, SortAlgorithm};
use crate::context::SortContext;
use crate::element::{Element, IndexRange, Order, Tag};
use crate::error::{Result, SortError};
use crate::registry::AlgorithmId;

/// Largest `max - min + 1` accepted by the dense one-slot-per-value sorts.
pub const DENSE_SPAN_LIMIT: u64 = 1 << 20;

/// Smallest and largest value of `low..=high`.
pub(crate) fn value_bounds(source: &[Element], low: usize, high: usize) -> (i32, i32) {
    source[low..=high]
        .iter()
        .fold((i32::MAX, i32::MIN), |(min, max), e| (min.min(e.value), max.max(e.value)))
}

/// Reject ranges whose value span needs more than [`DENSE_SPAN_LIMIT`] slots.
pub(crate) fn dense_span(algorithm: AlgorithmId, min: i32, max: i32) -> Result<usize> {
    let span = (i64::from(max) - i64::from(min) + 1) as u64;
    if span > DENSE_SPAN_LIMIT {
        return Err(SortError::SpanTooWide { algorithm, span, limit: DENSE_SPAN_LIMIT });
    }
    Ok(span as usize)
}

/// One bucket per value in `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct ValueSlots {
    pub min: i32,
    pub count: usize,
}

impl BucketSource for ValueSlots {
    fn bucket_count(&self) -> usize {
        self.count
    }

    fn bucket_of(&self, element: &Element) -> usize {
        (i64::from(element.value) - i64::from(self.min)) as usize
    }
}

/// `count` equal-width buckets over `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct ScaledBuckets {
    pub min: i32,
    pub max: i32,
    pub count: usize,
}

impl BucketSource for ScaledBuckets {
    fn bucket_count(&self) -> usize {
        self.count
    }

    fn bucket_of(&self, element: &Element) -> usize {
        let span = i64::from(self.max) - i64::from(self.min) + 1;
        let offset = i64::from(element.value) - i64::from(self.min);
        (offset * self.count as i64 / span) as usize
    }
}

/// Flash sort classes: only the maximum lands in the top class.
#[derive(Debug, Clone, Copy)]
pub struct FlashClasses {
    pub min: i32,
    pub max: i32,
    pub classes: usize,
}

impl BucketSource for FlashClasses {
    fn bucket_count(&self) -> usize {
        self.classes
    }

    fn bucket_of(&self, element: &Element) -> usize {
        let span = i64::from(self.max) - i64::from(self.min);
        let offset = i64::from(element.value) - i64::from(self.min);
        ((self.classes as i64 - 1) * offset / span) as usize
    }
}

/// File every index of `low..=high` under its key.
pub fn save(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
    keys: &dyn BucketSource,
    order: Order,
) -> Result<Vec<Vec<usize>>> {
    let count = keys.bucket_count();
    let mut buckets = cx.take_buckets(count);
    for i in low..=high {
        let key = keys.bucket_of(&source[i]);
        let key = match order {
            Order::Ascending => key,
            Order::Descending => count - 1 - key,
        };
        if let Err(err) = cx.highlight(source, i, Tag::Bucket) {
            cx.restore_buckets(buckets);
            return Err(err);
        }
        buckets[key].push(i);
    }
    Ok(buckets)
}

/// Write `buckets` back from `low` in key order and return the range of every
/// non-empty bucket. Hands the buckets back to the scratch arena.
pub fn load(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, buckets: Vec<Vec<usize>>) -> Result<Vec<IndexRange>> {
    let mut ranked = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
    let mut ranges = Vec::new();
    for bucket in buckets.iter().filter(|b| !b.is_empty()) {
        let start = low + ranked.len();
        ranked.extend_from_slice(bucket);
        ranges.push(IndexRange::new(start, low + ranked.len() - 1));
    }
    cx.restore_buckets(buckets);
    cx.arrange(source, low, &ranked)?;
    Ok(ranges)
}

/// Counting sort: key histogram, prefix sums, then a backward scan assigns
/// every element its slot.
#[derive(Debug, Default)]
pub struct CountingSort;

impl CountingSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (min, max) = value_bounds(source, low, high);
        let span = dense_span(AlgorithmId::CountingSort, min, max)?;
        let slots = ValueSlots { min, count: span };
        let key = |e: &Element| match order {
            Order::Ascending => slots.bucket_of(e),
            Order::Descending => span - 1 - slots.bucket_of(e),
        };

        let mut counts = vec![0usize; span];
        for i in low..=high {
            cx.highlight(source, i, Tag::Bucket)?;
            counts[key(&source[i])] += 1;
        }
        for k in 1..span {
            counts[k] += counts[k - 1];
        }

        let mut targets = cx.take_indices();
        targets.resize(high - low + 1, 0);
        for i in (low..=high).rev() {
            let k = key(&source[i]);
            counts[k] -= 1;
            targets[i - low] = low + counts[k];
        }
        let result = cx.permute(source, low, &mut targets);
        cx.restore_indices(targets);
        result
    }
}

impl SortAlgorithm for CountingSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::CountingSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// One hole per value; loading the holes in order sorts the range.
#[derive(Debug, Default)]
pub struct PigeonholeSort;

impl PigeonholeSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (min, max) = value_bounds(source, low, high);
        let count = dense_span(AlgorithmId::PigeonholeSort, min, max)?;
        let buckets = save(cx, source, low, high, &ValueSlots { min, count }, order)?;
        load(cx, source, low, buckets)?;
        Ok(())
    }
}

impl SortAlgorithm for PigeonholeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::PigeonholeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// `ceil(sqrt(n))` equal-width buckets, each finished by insertion sort.
#[derive(Debug)]
pub struct BucketSort {
    insertion: Arc<dyn SortAlgorithm>,
}

impl BucketSort {
    pub fn new(insertion: Arc<dyn SortAlgorithm>) -> Self {
        BucketSort { insertion }
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (min, max) = value_bounds(source, low, high);
        let len = high - low + 1;
        let count = ((len as f64).sqrt().ceil() as usize).max(1);
        let buckets = save(cx, source, low, high, &ScaledBuckets { min, max, count }, order)?;
        for range in load(cx, source, low, buckets)? {
            self.insertion.sort_range(cx, source, range.start, range.end, order)?;
        }
        Ok(())
    }
}

impl SortAlgorithm for BucketSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BucketSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

/// Flash sort: classify into `0.43 n` classes, recurse into big classes and
/// insertion-sort small ones.
#[derive(Debug)]
pub struct FlashSort {
    insertion: Arc<dyn SortAlgorithm>,
}

/// Classes at most this long are finished by insertion sort.
const FLASH_SMALL_CLASS: usize = 16;

impl FlashSort {
    pub fn new(insertion: Arc<dyn SortAlgorithm>) -> Self {
        FlashSort { insertion }
    }

    fn flash(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (min, max) = value_bounds(source, low, high);
        if min == max {
            return Ok(());
        }
        let classes = ((0.43 * (high - low + 1) as f64) as usize).max(2);
        let buckets = save(cx, source, low, high, &FlashClasses { min, max, classes }, order)?;
        for range in load(cx, source, low, buckets)? {
            if range.len() > FLASH_SMALL_CLASS {
                self.flash(cx, source, range.start, range.end, order)?;
            } else {
                self.insertion.sort_range(cx, source, range.start, range.end, order)?;
            }
        }
        Ok(())
    }
}

impl SortAlgorithm for FlashSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::FlashSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.flash(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.flash(cx, source, low, high, Order::Descending)
    }
}

/// Splits the value range into thirds and recurses into every slot.
#[derive(Debug, Default)]
pub struct ThreeSlotBucketSort;

impl ThreeSlotBucketSort {
    fn slots(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        let (min, max) = value_bounds(source, low, high);
        if min == max {
            return Ok(());
        }
        let buckets = save(cx, source, low, high, &ScaledBuckets { min, max, count: 3 }, order)?;
        for range in load(cx, source, low, buckets)? {
            Self::slots(cx, source, range.start, range.end, order)?;
        }
        Ok(())
    }
}

impl SortAlgorithm for ThreeSlotBucketSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::ThreeSlotBucketSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::slots(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::slots(cx, source, low, high, Order::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CountingSink;
    use crate::element::{elements_from, is_sorted, values_of};
    use crate::options::SortOptions;
    use crate::sorts::insertion::InsertSort;
    use rand::Rng;

    fn check(algorithm: &dyn SortAlgorithm, values: &[i32]) {
        for order in [Order::Ascending, Order::Descending] {
            let mut sink = CountingSink::default();
            let mut data = elements_from(values);
            let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 2);
            algorithm.sort(&mut cx, &mut data, order).unwrap();
            assert!(is_sorted(&data, order), "{} failed for {order}: {:?}", algorithm.id(), values_of(&data));
            assert!(cx.scratch().is_empty());
        }
    }

    #[test]
    fn test_distribution_family_random() {
        let mut rng = rand::thread_rng();
        let insertion: Arc<dyn SortAlgorithm> = Arc::new(InsertSort);
        let algorithms: Vec<Box<dyn SortAlgorithm>> = vec![
            Box::new(CountingSort),
            Box::new(PigeonholeSort),
            Box::new(BucketSort::new(insertion.clone())),
            Box::new(FlashSort::new(insertion)),
            Box::new(ThreeSlotBucketSort),
        ];
        for len in [2, 7, 64, 200] {
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(-500..500)).collect();
            for algorithm in &algorithms {
                check(algorithm.as_ref(), &values);
            }
        }
        let constant = vec![4; 30];
        for algorithm in &algorithms {
            check(algorithm.as_ref(), &constant);
        }
    }

    #[test]
    fn test_save_load_groups_by_key() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[5, 1, 4, 1, 5, 2]);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 2);
        let slots = ValueSlots { min: 1, count: 5 };
        let buckets = save(&mut cx, &mut data, 0, 5, &slots, Order::Descending).unwrap();
        let ranges = load(&mut cx, &mut data, 0, buckets).unwrap();
        assert_eq!(values_of(&data), vec![5, 5, 4, 2, 1, 1]);
        assert_eq!(
            ranges,
            vec![IndexRange::new(0, 1), IndexRange::new(2, 2), IndexRange::new(3, 3), IndexRange::new(4, 5)]
        );
        assert!(cx.scratch().is_empty());
    }

    #[test]
    fn test_dense_sorts_refuse_wide_spans() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[i32::MIN, 0, i32::MAX]);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 2);
        let err = CountingSort.sort(&mut cx, &mut data, Order::Ascending).unwrap_err();
        assert!(matches!(err, SortError::SpanTooWide { algorithm: AlgorithmId::CountingSort, .. }));
        assert_eq!(values_of(&data), vec![i32::MIN, 0, i32::MAX]);
    }

    #[test]
    fn test_extreme_values_in_scaled_buckets() {
        let insertion: Arc<dyn SortAlgorithm> = Arc::new(InsertSort);
        check(&BucketSort::new(insertion), &[i32::MAX, i32::MIN, 0, -1, 1, i32::MAX]);
        check(&ThreeSlotBucketSort, &[i32::MAX, i32::MIN, 0, -1, 1, i32::MAX]);
    }
}
