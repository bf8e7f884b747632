//! Radix sorts: LSD and MSD over the `radix_base` digit alphabet, plus
//! in-place variants that move elements only by shifting.
//!
//! Keys are `value - min(0, min)`, so negative inputs are handled by offsetting
//! the whole range. While a radix sort runs, every element carries its key
//! rendered as a zero-padded digit string in `radix_key`; the strings are
//! removed before the sort returns.
//!
//! Complexity: O(n * w) exchanges for the bucketed variants, where w is the
//! number of digits of the largest key.

use crate::algorithm::{BucketSource, SortAlgorithm};
use crate::context::{Frame, SortContext};
use crate::element::{Element, IndexRange, Order, Tag};
use crate::error::Result;
use crate::options::RadixBase;
use crate::registry::AlgorithmId;
use crate::sorts::distribution::{load, save, value_bounds};

/// Digit layout of one range.
#[derive(Debug, Clone, Copy)]
pub struct Digits {
    base: RadixBase,
    offset: i64,
    width: usize,
}

impl Digits {
    /// Measure `low..=high`: key offset and the digit count of the largest key.
    pub fn measure(source: &[Element], low: usize, high: usize, base: RadixBase) -> Self {
        let (min, max) = value_bounds(source, low, high);
        let offset = i64::from(min.min(0));
        let width = base.width_of((i64::from(max) - offset) as u64);
        Digits { base, offset, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn key(&self, element: &Element) -> u64 {
        (i64::from(element.value) - self.offset) as u64
    }

    /// Digit at `position`, counted from the least significant.
    pub fn digit(&self, element: &Element, position: usize) -> usize {
        let base = u64::from(self.base.get());
        ((self.key(element) / base.pow(position as u32)) % base) as usize
    }

    fn label(&self, source: &mut [Element], low: usize, high: usize) {
        for element in &mut source[low..=high] {
            element.radix_key = Some(self.base.render(self.key(element), self.width));
        }
    }
}

fn clear_labels(source: &mut [Element], low: usize, high: usize) {
    for element in &mut source[low..=high] {
        element.radix_key = None;
    }
}

/// Bucket key for one digit position.
struct DigitKey<'a> {
    digits: &'a Digits,
    position: usize,
}

impl BucketSource for DigitKey<'_> {
    fn bucket_count(&self) -> usize {
        self.digits.base.get() as usize
    }

    fn bucket_of(&self, element: &Element) -> usize {
        self.digits.digit(element, self.position)
    }
}

/// Label the range, run `body`, then strip the labels whatever the outcome.
fn labelled<F>(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, body: F) -> Result<()>
where
    F: FnOnce(&mut SortContext<'_>, &mut [Element], &Digits) -> Result<()>,
{
    let digits = Digits::measure(source, low, high, cx.options().radix_base);
    digits.label(source, low, high);
    let result = body(cx, source, &digits);
    clear_labels(source, low, high);
    result
}

/// Least-significant-digit radix sort.
#[derive(Debug, Default)]
pub struct RadixLsdSort;

impl RadixLsdSort {
    /// One stable counting pass over the digit at `position`.
    pub fn digit_pass(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        digits: &Digits,
        position: usize,
        order: Order,
    ) -> Result<()> {
        log::trace!("LSD digit pass {position} over {low}..={high}");
        let buckets = digits.base.get() as usize;
        let bucket_of = |e: &Element| {
            let digit = digits.digit(e, position);
            match order {
                Order::Ascending => digit,
                Order::Descending => buckets - 1 - digit,
            }
        };

        // Build histogram (count occurrences of each digit)
        let mut histogram = vec![0usize; buckets];
        for i in low..=high {
            cx.highlight(source, i, Tag::Bucket)?;
            histogram[bucket_of(&source[i])] += 1;
        }

        // Convert histogram to prefix sums (exclusive scan)
        let mut sum = 0usize;
        for count in histogram.iter_mut() {
            let c = *count;
            *count = sum;
            sum += c;
        }

        // Scatter: every element gets the next free slot of its digit
        let mut targets = cx.take_indices();
        targets.resize(high - low + 1, 0);
        for i in low..=high {
            let digit = bucket_of(&source[i]);
            targets[i - low] = low + histogram[digit];
            histogram[digit] += 1;
        }
        let result = cx.permute(source, low, &mut targets);
        cx.restore_indices(targets);
        result
    }

    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        labelled(cx, source, low, high, |cx, source, digits| {
            for position in 0..digits.width() {
                Self::digit_pass(cx, source, low, high, digits, position, order)?;
            }
            Ok(())
        })
    }
}

impl SortAlgorithm for RadixLsdSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::RadixLsdSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// Most-significant-digit radix sort, recursive or over an explicit stack.
#[derive(Debug)]
pub struct RadixMsdSort {
    iterative: bool,
}

impl RadixMsdSort {
    pub fn recursive() -> Self {
        RadixMsdSort { iterative: false }
    }

    pub fn iterative() -> Self {
        RadixMsdSort { iterative: true }
    }

    /// Distribute `low..=high` on the digit for `level` (0 = most significant).
    fn split(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        digits: &Digits,
        level: usize,
        order: Order,
    ) -> Result<Vec<IndexRange>> {
        let position = digits.width() - 1 - level;
        log::trace!("MSD split on digit {position} over {low}..={high}");
        let keys = DigitKey { digits, position };
        let buckets = save(cx, source, low, high, &keys, order)?;
        load(cx, source, low, buckets)
    }

    fn recurse(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        digits: &Digits,
        level: usize,
        order: Order,
    ) -> Result<()> {
        if high <= low || level >= digits.width() {
            return Ok(());
        }
        for range in Self::split(cx, source, low, high, digits, level, order)? {
            Self::recurse(cx, source, range.start, range.end, digits, level + 1, order)?;
        }
        Ok(())
    }

    fn drain(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        stack: &mut Vec<Frame>,
        digits: &Digits,
        order: Order,
    ) -> Result<()> {
        while let Some(frame) = stack.pop() {
            if frame.high <= frame.low || frame.depth >= digits.width() {
                continue;
            }
            let ranges = Self::split(cx, source, frame.low, frame.high, digits, frame.depth, order)?;
            for range in ranges.iter().rev() {
                stack.push(Frame::new(range.start, range.end, frame.depth + 1));
            }
        }
        Ok(())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let iterative = self.iterative;
        labelled(cx, source, low, high, |cx, source, digits| {
            if !iterative {
                return Self::recurse(cx, source, low, high, digits, 0, order);
            }
            let mut stack = cx.take_stack();
            stack.push(Frame::new(low, high, 0));
            let result = Self::drain(cx, source, &mut stack, digits, order);
            cx.restore_stack(stack);
            result
        })
    }
}

impl SortAlgorithm for RadixMsdSort {
    fn id(&self) -> AlgorithmId {
        if self.iterative {
            AlgorithmId::RadixMsdSortIter
        } else {
            AlgorithmId::RadixMsdSort
        }
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

/// Gather every element whose digit at `position` equals each digit value in
/// turn, shifting it to the bucket boundary. Ascending fills from `low`,
/// descending from `high`. Returns the range of every non-empty bucket.
fn shift_pass(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
    digits: &Digits,
    position: usize,
    order: Order,
) -> Result<Vec<IndexRange>> {
    let base = digits.base.get() as usize;
    let mut ranges = Vec::new();
    match order {
        Order::Ascending => {
            let mut boundary = low;
            for digit in 0..base {
                let start = boundary;
                for j in boundary..=high {
                    cx.highlight_pair(source, boundary.min(high), Tag::Cursor, j, Tag::Compare)?;
                    if digits.digit(&source[j], position) == digit {
                        cx.shift(source, j, boundary)?;
                        boundary += 1;
                    }
                }
                if boundary > start {
                    ranges.push(IndexRange::new(start, boundary - 1));
                }
                if boundary > high {
                    break;
                }
            }
        }
        Order::Descending => {
            let mut boundary = high as isize;
            for digit in 0..base {
                let end = boundary;
                let mut j = boundary;
                while j >= low as isize {
                    let at = j as usize;
                    cx.highlight_pair(source, boundary as usize, Tag::Cursor, at, Tag::Compare)?;
                    if digits.digit(&source[at], position) == digit {
                        cx.shift(source, at, boundary as usize)?;
                        boundary -= 1;
                    }
                    j -= 1;
                }
                if boundary < end {
                    ranges.push(IndexRange::new((boundary + 1) as usize, end as usize));
                }
                if boundary < low as isize {
                    break;
                }
            }
        }
    }
    Ok(ranges)
}

/// LSD radix sort that moves elements only by shifting them into their
/// digit bucket.
#[derive(Debug, Default)]
pub struct InPlaceRadixLsdSort;

impl InPlaceRadixLsdSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        labelled(cx, source, low, high, |cx, source, digits| {
            for position in 0..digits.width() {
                shift_pass(cx, source, low, high, digits, position, order)?;
            }
            Ok(())
        })
    }
}

impl SortAlgorithm for InPlaceRadixLsdSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::InPlaceRadixLsdSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// MSD radix sort built on the shifting digit pass.
#[derive(Debug, Default)]
pub struct InPlaceRadixMsdSort;

impl InPlaceRadixMsdSort {
    fn recurse(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        digits: &Digits,
        level: usize,
        order: Order,
    ) -> Result<()> {
        if high <= low || level >= digits.width() {
            return Ok(());
        }
        let position = digits.width() - 1 - level;
        for range in shift_pass(cx, source, low, high, digits, position, order)? {
            Self::recurse(cx, source, range.start, range.end, digits, level + 1, order)?;
        }
        Ok(())
    }

    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        labelled(cx, source, low, high, |cx, source, digits| Self::recurse(cx, source, low, high, digits, 0, order))
    }
}

impl SortAlgorithm for InPlaceRadixMsdSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::InPlaceRadixMsdSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CountingSink, RecordingSink};
    use crate::element::{elements_from, is_sorted, values_of};
    use crate::options::SortOptions;
    use rand::Rng;

    const TEXTBOOK: [i32; 8] = [170, 45, 75, 90, 802, 24, 2, 66];

    fn algorithms() -> Vec<Box<dyn SortAlgorithm>> {
        vec![
            Box::new(RadixLsdSort),
            Box::new(RadixMsdSort::recursive()),
            Box::new(RadixMsdSort::iterative()),
            Box::new(InPlaceRadixLsdSort),
            Box::new(InPlaceRadixMsdSort),
        ]
    }

    fn sorted(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order, options: SortOptions) -> (Vec<i32>, u64) {
        let mut sink = CountingSink::default();
        let mut data = elements_from(values);
        let mut cx = SortContext::seeded(&mut sink, options, 4);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(is_sorted(&data, order), "{} failed for {order}: {:?}", algorithm.id(), values_of(&data));
        assert!(data.iter().all(|e| e.radix_key.is_none()));
        (values_of(&data), cx.steps())
    }

    #[test]
    fn test_first_lsd_pass_groups_by_last_digit() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&TEXTBOOK);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 4);
        let digits = Digits::measure(&data, 0, 7, RadixBase::Decimal);
        assert_eq!(digits.width(), 3);
        RadixLsdSort::digit_pass(&mut cx, &mut data, 0, 7, &digits, 0, Order::Ascending).unwrap();
        assert_eq!(values_of(&data), vec![170, 90, 802, 2, 24, 45, 75, 66]);
    }

    #[test]
    fn test_every_base_and_order() {
        let mut rng = rand::thread_rng();
        let values: Vec<i32> = (0..64).map(|_| rng.gen_range(-300..300)).collect();
        for base in [2, 8, 10, 16] {
            let options = SortOptions::new(base, 4, 4).unwrap();
            for algorithm in algorithms() {
                sorted(algorithm.as_ref(), &values, Order::Ascending, options);
                sorted(algorithm.as_ref(), &values, Order::Descending, options);
            }
        }
    }

    #[test]
    fn test_msd_recursive_iterative_parity() {
        for order in [Order::Ascending, Order::Descending] {
            let recursive = sorted(&RadixMsdSort::recursive(), &TEXTBOOK, order, SortOptions::default());
            let iterative = sorted(&RadixMsdSort::iterative(), &TEXTBOOK, order, SortOptions::default());
            assert_eq!(recursive, iterative);
        }
    }

    #[test]
    fn test_keys_visible_during_run() {
        let mut sink = RecordingSink::default();
        let mut data = elements_from(&TEXTBOOK);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 4);
        RadixLsdSort.sort(&mut cx, &mut data, Order::Ascending).unwrap();
        drop(cx);
        let first = &sink.snapshots[0];
        assert_eq!(first.elements[1].radix_key.as_deref(), Some("045"));
        assert!(data.iter().all(|e| e.radix_key.is_none()));
    }

    #[test]
    fn test_negative_values_are_offset() {
        let digits = Digits::measure(&elements_from(&[-5, 3, 12]), 0, 2, RadixBase::Decimal);
        assert_eq!(digits.key(&Element::new(-5)), 0);
        assert_eq!(digits.key(&Element::new(12)), 17);
        assert_eq!(digits.width(), 2);
        assert_eq!(digits.digit(&Element::new(12), 1), 1);
    }
}
