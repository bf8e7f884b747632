//! Quicksort template and its partition schemes.
//!
//! [`QuickSort`] owns the recursion (or the explicit frame stack for the
//! iterative variants) and hands each range to a [`Partitioner`]. Ranges of
//! at most [`INSERTION_THRESHOLD`] elements always go to the insertion-sort
//! collaborator.

use std::sync::Arc;

use rand::Rng;

use crate::algorithm::{PartitionResult, Partitioner, SortAlgorithm};
use crate::context::{Frame, SortContext};
use crate::element::{Element, IndexRange, Order, Tag};
use crate::error::Result;
use crate::registry::AlgorithmId;

/// Ranges this short are finished by insertion sort.
pub const INSERTION_THRESHOLD: usize = 8;

/// Compare `j` against the pivot and, if `take`, move it into the growing
/// side at `boundary`.
#[inline]
fn take_into(cx: &mut SortContext<'_>, source: &mut [Element], boundary: usize, j: usize, take: bool) -> Result<()> {
    cx.compare_and_swap(source, boundary, j, take && boundary != j, Tag::Compare, Tag::Exchange, Tag::Neutral)?;
    Ok(())
}

/// Lomuto partition around the last element.
pub(crate) fn lomuto_ascending(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
) -> Result<PartitionResult> {
    let pivot = source[high].value;
    cx.highlight(source, high, Tag::Pivot)?;
    let mut i = low;
    for j in low..high {
        let take = source[j].value <= pivot;
        take_into(cx, source, i, j, take)?;
        if take {
            i += 1;
        }
    }
    cx.exchange(source, i, high)?;
    Ok(PartitionResult::Pivot { mid: i })
}

/// Lomuto partition around the first element, smaller values pushed right.
pub(crate) fn lomuto_descending(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
) -> Result<PartitionResult> {
    let pivot = source[low].value;
    cx.highlight(source, low, Tag::Pivot)?;
    let mut i = high;
    for j in (low + 1..=high).rev() {
        let take = source[j].value <= pivot;
        take_into(cx, source, i, j, take)?;
        if take {
            i -= 1;
        }
    }
    cx.exchange(source, low, i)?;
    Ok(PartitionResult::Pivot { mid: i })
}

#[derive(Debug, Default)]
pub struct Lomuto;

impl Partitioner for Lomuto {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        lomuto_ascending(cx, source, low, high)
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        lomuto_descending(cx, source, low, high)
    }
}

/// Hoare's two-way scheme: two cursors converge and exchange misplaced pairs.
#[derive(Debug, Default)]
pub struct Hoare;

impl Partitioner for Hoare {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let pivot = source[low].value;
        let (mut i, mut j) = (low, high + 1);
        loop {
            loop {
                i += 1;
                cx.highlight_pair(source, i, Tag::Compare, low, Tag::Pivot)?;
                if source[i].value >= pivot || i == high {
                    break;
                }
            }
            loop {
                j -= 1;
                cx.highlight_pair(source, j, Tag::Compare, low, Tag::Pivot)?;
                if source[j].value <= pivot || j == low {
                    break;
                }
            }
            if i >= j {
                break;
            }
            cx.exchange(source, i, j)?;
        }
        cx.exchange(source, low, j)?;
        Ok(PartitionResult::Pivot { mid: j })
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        // mirror image: pivot at `high`, cursors start outside the opposite ends
        let pivot = source[high].value;
        let (mut i, mut j) = (high as isize, low as isize - 1);
        loop {
            loop {
                i -= 1;
                let at = i as usize;
                cx.highlight_pair(source, at, Tag::Compare, high, Tag::Pivot)?;
                if source[at].value >= pivot || at == low {
                    break;
                }
            }
            loop {
                j += 1;
                let at = j as usize;
                cx.highlight_pair(source, at, Tag::Compare, high, Tag::Pivot)?;
                if source[at].value <= pivot || at == high {
                    break;
                }
            }
            if i <= j {
                break;
            }
            cx.exchange(source, i as usize, j as usize)?;
        }
        let mid = j as usize;
        cx.exchange(source, high, mid)?;
        Ok(PartitionResult::Pivot { mid })
    }
}

/// Dutch national flag pass around `pivot`, which must occur in the range.
///
/// Returns the bounds of the run of pivot-equal elements.
pub fn dutch_flag(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
    pivot: i32,
    order: Order,
) -> Result<PartitionResult> {
    // `front` collects elements that belong before the pivot run, `back` those after it
    let (mut front, mut i, mut back) = (low, low, high as isize);
    while i as isize <= back {
        let value = source[i].value;
        let (goes_front, goes_back) = match order {
            Order::Ascending => (value < pivot, value > pivot),
            Order::Descending => (value > pivot, value < pivot),
        };
        if goes_front {
            cx.exchange(source, front, i)?;
            front += 1;
            i += 1;
        } else if goes_back {
            cx.exchange(source, i, back as usize)?;
            back -= 1;
        } else {
            cx.highlight(source, i, Tag::Pivot)?;
            i += 1;
        }
    }
    Ok(PartitionResult::Equal { low: front, high: back as usize })
}

/// Three-way partition around the middle element.
#[derive(Debug, Default)]
pub struct ThreeWay;

impl Partitioner for ThreeWay {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let pivot = source[low + (high - low + 1) / 2].value;
        dutch_flag(cx, source, low, high, pivot, Order::Ascending)
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let pivot = source[low + (high - low) / 2].value;
        dutch_flag(cx, source, low, high, pivot, Order::Descending)
    }
}

/// Yaroslavskiy's dual-pivot partition.
#[derive(Debug, Default)]
pub struct DualPivot;

impl Partitioner for DualPivot {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let out_of_order = source[low].value > source[high].value;
        cx.swap_if(source, low, high, out_of_order)?;
        let (p, q) = (source[low].value, source[high].value);

        let (mut l, mut g, mut k) = (low + 1, high - 1, low + 1);
        while k <= g {
            cx.highlight_many(source, &[(low, Tag::Pivot), (high, Tag::Pivot), (k, Tag::Compare)])?;
            if source[k].value < p {
                cx.exchange(source, k, l)?;
                l += 1;
            } else if source[k].value >= q {
                while source[g].value > q && k < g {
                    g -= 1;
                }
                cx.exchange(source, k, g)?;
                g -= 1;
                if source[k].value < p {
                    cx.exchange(source, k, l)?;
                    l += 1;
                }
            }
            k += 1;
        }
        l -= 1;
        g += 1;
        cx.exchange(source, low, l)?;
        cx.exchange(source, high, g)?;
        Ok(PartitionResult::Between { low: l, high: g })
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        // reflection of the ascending scheme about the middle of the range
        let out_of_order = source[high].value > source[low].value;
        cx.swap_if(source, low, high, out_of_order)?;
        let (p, q) = (source[high].value, source[low].value);

        let (mut l, mut g, mut k) = (high - 1, low + 1, high - 1);
        while k >= g {
            cx.highlight_many(source, &[(low, Tag::Pivot), (high, Tag::Pivot), (k, Tag::Compare)])?;
            if source[k].value < p {
                cx.exchange(source, k, l)?;
                l -= 1;
            } else if source[k].value >= q {
                while source[g].value > q && k > g {
                    g += 1;
                }
                cx.exchange(source, k, g)?;
                g += 1;
                if source[k].value < p {
                    cx.exchange(source, k, l)?;
                    l -= 1;
                }
            }
            k -= 1;
        }
        l += 1;
        g -= 1;
        cx.exchange(source, high, l)?;
        cx.exchange(source, low, g)?;
        Ok(PartitionResult::Between { low: g, high: l })
    }
}

fn min_max(source: &[Element], low: usize, high: usize) -> (i32, i32) {
    source[low..=high]
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), e| (lo.min(e.value), hi.max(e.value)))
}

/// Splits around the arithmetic mean instead of an element.
#[derive(Debug, Default)]
pub struct AveragePivot;

impl AveragePivot {
    fn split(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<PartitionResult> {
        let (min, max) = min_max(source, low, high);
        if min == max {
            return Ok(PartitionResult::Equal { low, high });
        }
        let sum: i64 = source[low..=high].iter().map(|e| i64::from(e.value)).sum();
        let average = sum.div_euclid((high - low + 1) as i64);

        let mut boundary = low;
        for j in low..=high {
            let value = i64::from(source[j].value);
            let take = match order {
                Order::Ascending => value <= average,
                Order::Descending => value > average,
            };
            take_into(cx, source, boundary, j, take)?;
            if take {
                boundary += 1;
            }
        }
        Ok(PartitionResult::Boundary { mid: boundary })
    }
}

impl Partitioner for AveragePivot {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        Self::split(cx, source, low, high, Order::Ascending)
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        Self::split(cx, source, low, high, Order::Descending)
    }
}

/// Splits at the midpoint of `log2(value - min + 1)`, halving the value range
/// geometrically.
#[derive(Debug, Default)]
pub struct LogPivot;

impl LogPivot {
    fn split(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<PartitionResult> {
        let (min, _) = min_max(source, low, high);
        let (mut key_min, mut key_max) = (f64::MAX, f64::MIN);
        for element in &mut source[low..=high] {
            let key = ((i64::from(element.value) - i64::from(min) + 1) as f64).log2();
            key_min = key_min.min(key);
            key_max = key_max.max(key);
            element.pivot_key = Some(key);
        }

        if key_max - key_min < f64::EPSILON {
            Self::clear_keys(source, low, high);
            return Ok(PartitionResult::Equal { low, high });
        }

        let threshold = (key_min + key_max) / 2.0;
        let mut boundary = low;
        for j in low..=high {
            let key = source[j].pivot_key.unwrap_or(key_min);
            let take = match order {
                Order::Ascending => key <= threshold,
                Order::Descending => key > threshold,
            };
            take_into(cx, source, boundary, j, take)?;
            if take {
                boundary += 1;
            }
        }
        Self::clear_keys(source, low, high);
        Ok(PartitionResult::Boundary { mid: boundary })
    }

    fn clear_keys(source: &mut [Element], low: usize, high: usize) {
        for element in &mut source[low..=high] {
            element.pivot_key = None;
        }
    }
}

impl Partitioner for LogPivot {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        Self::split(cx, source, low, high, Order::Ascending)
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        Self::split(cx, source, low, high, Order::Descending)
    }
}

/// Lomuto around a pivot drawn from the run's RNG.
#[derive(Debug, Default)]
pub struct RandomPivot;

impl Partitioner for RandomPivot {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let chosen = cx.rng().gen_range(low..=high);
        cx.exchange(source, chosen, high)?;
        lomuto_ascending(cx, source, low, high)
    }

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult> {
        let chosen = cx.rng().gen_range(low..=high);
        cx.exchange(source, chosen, low)?;
        lomuto_descending(cx, source, low, high)
    }
}

/// Move the longest range to the end, keeping the others in order.
///
/// Ties keep the later range last.
pub(crate) fn largest_last(ranges: &mut Vec<IndexRange>) {
    let largest = ranges.iter().enumerate().max_by_key(|(_, range)| range.len()).map(|(k, _)| k);
    if let Some(k) = largest {
        let range = ranges.remove(k);
        ranges.push(range);
    }
}

/// Quicksort over any partition scheme.
#[derive(Debug)]
pub struct QuickSort {
    id: AlgorithmId,
    partitioner: Box<dyn Partitioner>,
    insertion: Arc<dyn SortAlgorithm>,
    iterative: bool,
}

impl QuickSort {
    pub fn new(id: AlgorithmId, partitioner: Box<dyn Partitioner>, insertion: Arc<dyn SortAlgorithm>) -> Self {
        QuickSort { id, partitioner, insertion, iterative: false }
    }

    /// Same partitioning, driven by an explicit frame stack.
    pub fn iterative(id: AlgorithmId, partitioner: Box<dyn Partitioner>, insertion: Arc<dyn SortAlgorithm>) -> Self {
        QuickSort { id, partitioner, insertion, iterative: true }
    }

    /// Partition repeatedly, looping on the largest sub-range and recursing
    /// into the others, so recursion depth stays within `log2(n)`.
    fn tail_sort(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        mut low: usize,
        mut high: usize,
        order: Order,
    ) -> Result<()> {
        loop {
            if high - low + 1 <= INSERTION_THRESHOLD {
                return self.insertion.sort_range(cx, source, low, high, order);
            }
            let mut ranges = self.partitioner.partition(cx, source, low, high, order)?.subranges(low, high);
            largest_last(&mut ranges);
            let Some((last, rest)) = ranges.split_last() else {
                return Ok(());
            };
            for range in rest {
                self.tail_sort(cx, source, range.start, range.end, order)?;
            }
            low = last.start;
            high = last.end;
        }
    }

    fn stack_sort(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<()> {
        let mut stack = cx.take_stack();
        stack.push(Frame::new(low, high, 0));
        let result = self.drain(cx, source, &mut stack, order);
        cx.restore_stack(stack);
        result
    }

    fn drain(&self, cx: &mut SortContext<'_>, source: &mut [Element], stack: &mut Vec<Frame>, order: Order) -> Result<()> {
        while let Some(frame) = stack.pop() {
            if frame.high - frame.low + 1 <= INSERTION_THRESHOLD {
                self.insertion.sort_range(cx, source, frame.low, frame.high, order)?;
                continue;
            }
            let ranges = self.partitioner.partition(cx, source, frame.low, frame.high, order)?.subranges(frame.low, frame.high);
            for range in ranges.iter().rev() {
                stack.push(Frame::new(range.start, range.end, frame.depth + 1));
            }
        }
        Ok(())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if self.iterative {
            self.stack_sort(cx, source, low, high, order)
        } else {
            self.tail_sort(cx, source, low, high, order)
        }
    }
}

impl SortAlgorithm for QuickSort {
    fn id(&self) -> AlgorithmId {
        self.id
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}
