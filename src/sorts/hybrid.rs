//! Hybrid sorts: introsort and Tim sort. Hybrid merge sort is the
//! [`MergeSort::hybrid`](crate::sorts::merge::MergeSort::hybrid)
//! configuration of the merge template.

use std::sync::Arc;

use crate::algorithm::{Partitioner, SortAlgorithm};
use crate::context::SortContext;
use crate::element::{Element, Order};
use crate::error::Result;
use crate::registry::AlgorithmId;
use crate::sorts::merge::merge_runs;
use crate::sorts::quick::{largest_last, INSERTION_THRESHOLD};

/// Partition depth allowed before falling back to heap sort.
///
/// Small inputs get a little slack, very large inputs give up sooner.
pub fn depth_budget(len: usize) -> usize {
    if len < 2 {
        return 0;
    }
    let log2 = (usize::BITS - 1 - len.leading_zeros()) as usize;
    match len {
        0..=255 => 2 * log2 + 2,
        256..=1_048_575 => 2 * log2,
        _ => 3 * log2 / 2,
    }
}

/// Quicksort with a depth budget; exhausted ranges are heap sorted.
#[derive(Debug)]
pub struct IntroSort {
    partitioner: Box<dyn Partitioner>,
    insertion: Arc<dyn SortAlgorithm>,
    heap: Arc<dyn SortAlgorithm>,
    fixed_depth: Option<usize>,
}

impl IntroSort {
    pub fn new(partitioner: Box<dyn Partitioner>, insertion: Arc<dyn SortAlgorithm>, heap: Arc<dyn SortAlgorithm>) -> Self {
        IntroSort { partitioner, insertion, heap, fixed_depth: None }
    }

    /// Override the computed depth budget.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.fixed_depth = Some(depth);
        self
    }

    fn intro(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        mut low: usize,
        mut high: usize,
        mut depth: usize,
        order: Order,
    ) -> Result<()> {
        loop {
            if high - low + 1 <= INSERTION_THRESHOLD {
                return self.insertion.sort_range(cx, source, low, high, order);
            }
            if depth == 0 {
                log::trace!("introsort depth exhausted on {low}..={high}, heap sorting");
                return self.heap.sort_range(cx, source, low, high, order);
            }
            depth -= 1;
            let mut ranges = self.partitioner.partition(cx, source, low, high, order)?.subranges(low, high);
            largest_last(&mut ranges);
            let Some((last, rest)) = ranges.split_last() else {
                return Ok(());
            };
            for range in rest {
                self.intro(cx, source, range.start, range.end, depth, order)?;
            }
            low = last.start;
            high = last.end;
        }
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let depth = self.fixed_depth.unwrap_or_else(|| depth_budget(high - low + 1));
        self.intro(cx, source, low, high, depth, order)
    }
}

impl SortAlgorithm for IntroSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::IntroSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

/// Tim sort: insertion-sorted runs of `min_run` elements merged bottom-up.
#[derive(Debug)]
pub struct TimSort {
    insertion: Arc<dyn SortAlgorithm>,
}

/// Run length in `32..=64` such that `n / min_run` is close to a power of two.
pub fn min_run(mut n: usize) -> usize {
    let mut carry = 0;
    while n >= 64 {
        carry |= n & 1;
        n >>= 1;
    }
    n + carry
}

impl TimSort {
    pub fn new(insertion: Arc<dyn SortAlgorithm>) -> Self {
        TimSort { insertion }
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let run = min_run(high - low + 1);
        match order {
            Order::Ascending => {
                for start in (low..=high).step_by(run) {
                    self.insertion.sort_range(cx, source, start, (start + run - 1).min(high), order)?;
                }
            }
            Order::Descending => {
                // runs anchored at the right end, matching the merge layout
                let mut end = high as isize;
                while end >= low as isize {
                    let start = (end - run as isize + 1).max(low as isize);
                    self.insertion.sort_range(cx, source, start as usize, end as usize, order)?;
                    end = start - 1;
                }
            }
        }
        merge_runs(cx, source, low, high, run, order)
    }
}

impl SortAlgorithm for TimSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::TimSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CountingSink;
    use crate::element::{elements_from, is_sorted, values_of};
    use crate::options::SortOptions;
    use crate::sorts::insertion::InsertSort;
    use crate::sorts::quick::Hoare;
    use crate::sorts::selection::HeapSort;
    use rand::Rng;

    fn intro() -> IntroSort {
        IntroSort::new(Box::new(Hoare), Arc::new(InsertSort), Arc::new(HeapSort))
    }

    fn run(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order) -> (Vec<i32>, u64) {
        let mut sink = CountingSink::default();
        let mut data = elements_from(values);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 6);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(is_sorted(&data, order), "{} failed for {order}: {:?}", algorithm.id(), values_of(&data));
        (values_of(&data), cx.steps())
    }

    #[test]
    fn test_hybrids_random() {
        let mut rng = rand::thread_rng();
        let algorithms: Vec<Box<dyn SortAlgorithm>> =
            vec![Box::new(intro()), Box::new(intro().with_depth(1)), Box::new(TimSort::new(Arc::new(InsertSort)))];
        for len in [2, 9, 65, 150] {
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(-60..60)).collect();
            for algorithm in &algorithms {
                run(algorithm.as_ref(), &values, Order::Ascending);
                run(algorithm.as_ref(), &values, Order::Descending);
            }
        }
    }

    #[test]
    fn test_zero_depth_falls_back_to_heap_sort() {
        let values: Vec<i32> = (0..40).map(|i| (i * 17) % 40).collect();
        for order in [Order::Ascending, Order::Descending] {
            let exhausted = run(&intro().with_depth(0), &values, order);
            let heap = run(&HeapSort, &values, order);
            assert_eq!(exhausted, heap);
        }
    }

    #[test]
    fn test_heap_fallback_bounds_lopsided_partitions() {
        // even values descending, then odd values ascending
        let len = 12_000;
        let values: Vec<i32> = (0..len).rev().filter(|v| v % 2 == 0).chain((0..len).filter(|v| v % 2 == 1)).collect();
        let worker = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let mut sink = CountingSink::default();
                let mut data = elements_from(&values);
                let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 6);
                intro().sort(&mut cx, &mut data, Order::Ascending).unwrap();
                drop(cx);
                assert!(is_sorted(&data, Order::Ascending));
                sink.emitted
            })
            .unwrap();
        let snapshots = worker.join().unwrap();
        // plain quicksort needs on the order of len^2 snapshots here
        assert!(snapshots < 1_000 * len as u64, "{snapshots} snapshots for {len} elements");
    }

    #[test]
    fn test_depth_budget_bands() {
        assert_eq!(depth_budget(1), 0);
        assert_eq!(depth_budget(16), 10);
        assert_eq!(depth_budget(1024), 20);
        assert_eq!(depth_budget(1 << 20), 30);
    }

    #[test]
    fn test_min_run() {
        assert_eq!(min_run(10), 10);
        assert_eq!(min_run(64), 32);
        assert_eq!(min_run(65), 33);
        assert!((32..=64).contains(&min_run(100_000)));
    }
}
