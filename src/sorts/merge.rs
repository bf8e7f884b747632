//! Merge template and merge-family sorts.
//!
//! Buffered merges compute the merged order in an index buffer and apply it
//! with [`SortContext::arrange`], so the array is a valid permutation after
//! every exchange. In-place merges move elements with adjacent shifts only.

use std::sync::Arc;

use crate::algorithm::SortAlgorithm;
use crate::context::{Frame, SortContext};
use crate::element::{Element, Order, Tag};
use crate::error::Result;
use crate::registry::AlgorithmId;

/// Ranges this short are handed to the finisher by hybrid merge sort.
pub const HYBRID_CUTOFF: usize = 16;

/// Stable merge of the sorted runs `low..=mid` and `mid + 1..=high`.
pub(crate) fn merge_buffered(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    mid: usize,
    high: usize,
    order: Order,
) -> Result<()> {
    let mut ranked = Vec::with_capacity(high - low + 1);
    let (mut i, mut j) = (low, mid + 1);
    while i <= mid && j <= high {
        cx.highlight_pair(source, i, Tag::Compare, j, Tag::Compare)?;
        if order.precedes(source[i].value, source[j].value) {
            ranked.push(i);
            i += 1;
        } else {
            ranked.push(j);
            j += 1;
        }
    }
    ranked.extend(i..=mid);
    ranked.extend(j..=high);
    cx.arrange(source, low, &ranked)
}

/// Stable merge without a buffer: out-of-place right-run elements are
/// shifted down into the left run.
pub(crate) fn merge_in_place(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    mut mid: usize,
    high: usize,
    order: Order,
) -> Result<()> {
    let (mut i, mut j) = (low, mid + 1);
    while i <= mid && j <= high {
        cx.highlight_pair(source, i, Tag::Compare, j, Tag::Compare)?;
        if order.precedes(source[i].value, source[j].value) {
            i += 1;
        } else {
            cx.shift(source, j, i)?;
            i += 1;
            mid += 1;
            j += 1;
        }
    }
    Ok(())
}

/// Alternate the two runs without comparing them; the caller repairs the
/// order afterwards.
fn weave(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, mid: usize, high: usize) -> Result<()> {
    let mut ranked = Vec::with_capacity(high - low + 1);
    let (mut i, mut j) = (low, mid + 1);
    while i <= mid || j <= high {
        if i <= mid {
            ranked.push(i);
            i += 1;
        }
        if j <= high {
            ranked.push(j);
            j += 1;
        }
    }
    cx.arrange(source, low, &ranked)
}

/// Bottom-up merging of runs that start `width` long. Ascending runs are
/// anchored at `low`, descending runs at `high`.
pub(crate) fn merge_runs(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    low: usize,
    high: usize,
    mut width: usize,
    order: Order,
) -> Result<()> {
    let len = high - low + 1;
    while width < len {
        match order {
            Order::Ascending => {
                let mut start = low;
                while start + width <= high {
                    let mid = start + width - 1;
                    let end = (start + 2 * width - 1).min(high);
                    merge_buffered(cx, source, start, mid, end, order)?;
                    start += 2 * width;
                }
            }
            Order::Descending => {
                let mut end = high as isize;
                while end - width as isize >= low as isize {
                    let right = end as usize;
                    let mid = right - width;
                    let start = (end - 2 * width as isize + 1).max(low as isize) as usize;
                    merge_buffered(cx, source, start, mid, right, order)?;
                    end -= 2 * width as isize;
                }
            }
        }
        width *= 2;
    }
    Ok(())
}

#[derive(Debug)]
enum Combine {
    Buffered,
    InPlace,
    /// Weave, then an insertion pass with the collaborator.
    Weave(Arc<dyn SortAlgorithm>),
}

/// Top-down merge sort with a pluggable combine step.
#[derive(Debug)]
pub struct MergeSort {
    id: AlgorithmId,
    combine: Combine,
    iterative: bool,
    /// Sorts short ranges instead of splitting further.
    finisher: Option<Arc<dyn SortAlgorithm>>,
}

impl MergeSort {
    pub fn top_down() -> Self {
        MergeSort { id: AlgorithmId::MergeSort, combine: Combine::Buffered, iterative: false, finisher: None }
    }

    pub fn iterative() -> Self {
        MergeSort { id: AlgorithmId::MergeSortIter, combine: Combine::Buffered, iterative: true, finisher: None }
    }

    pub fn in_place() -> Self {
        MergeSort { id: AlgorithmId::InPlaceMergeSort, combine: Combine::InPlace, iterative: false, finisher: None }
    }

    pub fn weave(insertion: Arc<dyn SortAlgorithm>) -> Self {
        MergeSort {
            id: AlgorithmId::WeaveMergeSort,
            combine: Combine::Weave(insertion),
            iterative: false,
            finisher: None,
        }
    }

    /// Merge sort that stops splitting at [`HYBRID_CUTOFF`] elements.
    pub fn hybrid(insertion: Arc<dyn SortAlgorithm>) -> Self {
        MergeSort {
            id: AlgorithmId::HybridMergeSort,
            combine: Combine::Buffered,
            iterative: false,
            finisher: Some(insertion),
        }
    }

    /// Split point and the last index of the left run.
    fn halves(low: usize, high: usize, order: Order) -> (usize, usize) {
        match order {
            Order::Ascending => {
                let mid = low + (high - low) / 2;
                (mid, mid)
            }
            Order::Descending => {
                let mid = low + (high - low + 1) / 2;
                (mid, mid - 1)
            }
        }
    }

    fn combine(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        left_end: usize,
        high: usize,
        order: Order,
    ) -> Result<()> {
        match &self.combine {
            Combine::Buffered => merge_buffered(cx, source, low, left_end, high, order),
            Combine::InPlace => merge_in_place(cx, source, low, left_end, high, order),
            Combine::Weave(insertion) => {
                weave(cx, source, low, left_end, high)?;
                insertion.sort_range(cx, source, low, high, order)
            }
        }
    }

    fn split(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        if let Some(finisher) = &self.finisher {
            if high - low + 1 <= HYBRID_CUTOFF {
                return finisher.sort_range(cx, source, low, high, order);
            }
        }
        let (mid, left_end) = Self::halves(low, high, order);
        match order {
            Order::Ascending => {
                self.split(cx, source, low, mid, order)?;
                self.split(cx, source, mid + 1, high, order)?;
            }
            Order::Descending => {
                self.split(cx, source, mid, high, order)?;
                self.split(cx, source, low, mid - 1, order)?;
            }
        }
        self.combine(cx, source, low, left_end, high, order)
    }

    /// Post-order walk over an explicit stack, visiting ranges in the same
    /// order as [`MergeSort::split`].
    fn walk(&self, cx: &mut SortContext<'_>, source: &mut [Element], stack: &mut Vec<Frame>, order: Order) -> Result<()> {
        while let Some(mut frame) = stack.pop() {
            if frame.high <= frame.low {
                continue;
            }
            let (mid, left_end) = Self::halves(frame.low, frame.high, order);
            if frame.expanded {
                self.combine(cx, source, frame.low, left_end, frame.high, order)?;
                continue;
            }
            frame.expanded = true;
            stack.push(frame);
            let depth = frame.depth + 1;
            match order {
                Order::Ascending => {
                    stack.push(Frame::new(mid + 1, frame.high, depth));
                    stack.push(Frame::new(frame.low, mid, depth));
                }
                Order::Descending => {
                    stack.push(Frame::new(frame.low, mid - 1, depth));
                    stack.push(Frame::new(mid, frame.high, depth));
                }
            }
        }
        Ok(())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if !self.iterative {
            return self.split(cx, source, low, high, order);
        }
        let mut stack = cx.take_stack();
        stack.push(Frame::new(low, high, 0));
        let result = self.walk(cx, source, &mut stack, order);
        cx.restore_stack(stack);
        result
    }
}

impl SortAlgorithm for MergeSort {
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

#[derive(Debug, Default)]
pub struct BottomUpMergeSort;

impl SortAlgorithm for BottomUpMergeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BottomUpMergeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        merge_runs(cx, source, low, high, 1, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        merge_runs(cx, source, low, high, 1, Order::Descending)
    }
}

/// k-way merge sort; `k` is the `merge_fanout` option.
#[derive(Debug, Default)]
pub struct MultiWayMergeSort;

impl MultiWayMergeSort {
    fn parts(low: usize, high: usize, fanout: usize) -> Vec<(usize, usize)> {
        let len = high - low + 1;
        let count = fanout.min(len);
        (0..count)
            .map(|p| (low + p * len / count, low + (p + 1) * len / count - 1))
            .collect()
    }

    fn merge_parts(cx: &mut SortContext<'_>, source: &mut [Element], parts: &[(usize, usize)], order: Order) -> Result<()> {
        let mut heads: Vec<usize> = parts.iter().map(|&(start, _)| start).collect();
        let mut ranked = Vec::with_capacity(parts.iter().map(|&(s, e)| e - s + 1).sum());
        loop {
            let mut best: Option<usize> = None;
            for (p, &(_, end)) in parts.iter().enumerate() {
                if heads[p] > end {
                    continue;
                }
                match best {
                    None => best = Some(p),
                    Some(b) => {
                        cx.highlight_pair(source, heads[b], Tag::Cursor, heads[p], Tag::Compare)?;
                        if !order.precedes(source[heads[b]].value, source[heads[p]].value) {
                            best = Some(p);
                        }
                    }
                }
            }
            let Some(b) = best else { break };
            ranked.push(heads[b]);
            heads[b] += 1;
        }
        cx.arrange(source, parts[0].0, &ranked)
    }

    fn split(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        let parts = Self::parts(low, high, cx.options().merge_fanout.get());
        match order {
            Order::Ascending => {
                for &(start, end) in &parts {
                    Self::split(cx, source, start, end, order)?;
                }
            }
            Order::Descending => {
                for &(start, end) in parts.iter().rev() {
                    Self::split(cx, source, start, end, order)?;
                }
            }
        }
        Self::merge_parts(cx, source, &parts, order)
    }
}

impl SortAlgorithm for MultiWayMergeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::MultiWayMergeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::split(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::split(cx, source, low, high, Order::Descending)
    }
}

/// Strand sort: pull an ordered strand out of the unsorted rest, merge it
/// into the sorted region, repeat.
#[derive(Debug, Default)]
pub struct StrandSort;

impl SortAlgorithm for StrandSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::StrandSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        // sorted prefix is low..sorted_end
        let mut sorted_end = low;
        while sorted_end <= high {
            let mut strand_end = sorted_end;
            for j in sorted_end + 1..=high {
                cx.highlight_pair(source, strand_end, Tag::Cursor, j, Tag::Compare)?;
                if source[j].value >= source[strand_end].value {
                    cx.shift(source, j, strand_end + 1)?;
                    strand_end += 1;
                }
            }
            if sorted_end > low {
                merge_buffered(cx, source, low, sorted_end - 1, strand_end, Order::Ascending)?;
            }
            sorted_end = strand_end + 1;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        // sorted suffix is sorted_start..=high, strands grow leftwards
        let mut sorted_start = high + 1;
        while sorted_start > low {
            let mut strand_start = sorted_start - 1;
            for j in (low..strand_start).rev() {
                cx.highlight_pair(source, strand_start, Tag::Cursor, j, Tag::Compare)?;
                if source[j].value >= source[strand_start].value {
                    cx.shift(source, j, strand_start - 1)?;
                    strand_start -= 1;
                }
            }
            if sorted_start <= high {
                merge_buffered(cx, source, strand_start, sorted_start - 1, high, Order::Descending)?;
            }
            sorted_start = strand_start;
        }
        Ok(())
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

    fn run_with(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order, options: SortOptions) -> (Vec<i32>, u64) {
        let mut sink = CountingSink::default();
        let mut data = elements_from(values);
        let mut cx = SortContext::seeded(&mut sink, options, 9);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(is_sorted(&data, order), "{} failed for {order}: {:?}", algorithm.id(), values_of(&data));
        (values_of(&data), cx.steps())
    }

    fn run(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order) -> (Vec<i32>, u64) {
        run_with(algorithm, values, order, SortOptions::default())
    }

    fn family() -> Vec<Box<dyn SortAlgorithm>> {
        let insertion: Arc<dyn SortAlgorithm> = Arc::new(InsertSort);
        vec![
            Box::new(MergeSort::top_down()),
            Box::new(MergeSort::iterative()),
            Box::new(MergeSort::in_place()),
            Box::new(MergeSort::weave(insertion.clone())),
            Box::new(MergeSort::hybrid(insertion)),
            Box::new(BottomUpMergeSort),
            Box::new(MultiWayMergeSort),
            Box::new(StrandSort),
        ]
    }

    #[test]
    fn test_merge_family_random() {
        let mut rng = rand::thread_rng();
        for len in [2, 3, 13, 50, 64] {
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(-40..40)).collect();
            let mut expected = values.clone();
            expected.sort();
            for algorithm in family() {
                assert_eq!(run(algorithm.as_ref(), &values, Order::Ascending).0, expected);
                let descending: Vec<i32> = expected.iter().rev().copied().collect();
                assert_eq!(run(algorithm.as_ref(), &values, Order::Descending).0, descending);
            }
        }
    }

    #[test]
    fn test_merge_sort_iterative_step_parity() {
        let mut rng = rand::thread_rng();
        let values: Vec<i32> = (0..45).map(|_| rng.gen_range(0..30)).collect();
        for order in [Order::Ascending, Order::Descending] {
            assert_eq!(run(&MergeSort::top_down(), &values, order), run(&MergeSort::iterative(), &values, order));
        }
    }

    #[test]
    fn test_multi_way_every_fanout() {
        let values: Vec<i32> = (0..70).map(|i| (i * 31 % 17) - 8).collect();
        for fanout in [3, 4, 6, 8] {
            let options = SortOptions::new(10, fanout, 4).unwrap();
            run_with(&MultiWayMergeSort, &values, Order::Ascending, options);
            run_with(&MultiWayMergeSort, &values, Order::Descending, options);
        }
    }

    #[test]
    fn test_merges_leave_sorted_input_alone() {
        let ascending: Vec<i32> = (0..33).map(|i| i / 3).collect();
        let descending: Vec<i32> = ascending.iter().rev().copied().collect();
        let algorithms: [&dyn SortAlgorithm; 5] =
            [&MergeSort::top_down(), &MergeSort::in_place(), &BottomUpMergeSort, &MultiWayMergeSort, &StrandSort];
        for algorithm in algorithms {
            assert_eq!(run(algorithm, &ascending, Order::Ascending).1, 0, "{}", algorithm.id());
            assert_eq!(run(algorithm, &descending, Order::Descending).1, 0, "{}", algorithm.id());
        }
    }

    #[test]
    fn test_merge_buffered_is_stable() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[1, 3, 3, 2, 3, 4]);
        // tag the right-hand 3 so we can see where it lands
        data[4].radix_key = Some("right".to_string());
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 9);
        merge_buffered(&mut cx, &mut data, 0, 2, 5, Order::Ascending).unwrap();
        assert_eq!(values_of(&data), vec![1, 2, 3, 3, 3, 4]);
        assert_eq!(data[4].radix_key.as_deref(), Some("right"));
    }
}
