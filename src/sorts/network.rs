//! Sorting networks: bitonic (recursive and iterative), Batcher's odd-even
//! merge, the pairwise network and shear sort.
//!
//! A network is a fixed comparator sequence for the whole array, so these
//! algorithms cannot sort a sub-range on behalf of another algorithm and
//! reject [`SortAlgorithm::sort_range`]. The direction flag decides which
//! end of each comparator receives the larger value.
//!
//! Complexity: O(n * log²n) comparators for the merge networks.

use std::sync::Arc;

use crate::algorithm::SortAlgorithm;
use crate::context::SortContext;
use crate::element::{Element, Order};
use crate::error::{Result, SortError};
use crate::registry::AlgorithmId;

/// Comparator: `ascending` puts the smaller value at `i` (`i < j`).
#[inline]
fn comparator(cx: &mut SortContext<'_>, source: &mut [Element], i: usize, j: usize, ascending: bool) -> Result<()> {
    let out_of_order = if ascending {
        source[i].value > source[j].value
    } else {
        source[i].value < source[j].value
    };
    cx.swap_if(source, i, j, out_of_order)?;
    Ok(())
}

fn reject_range(algorithm: AlgorithmId) -> Result<()> {
    Err(SortError::Unsupported { algorithm, operation: "sort_range" })
}

/// Recursive bitonic sort for any length: the halves are sorted in opposite
/// directions and the bitonic result merged with the greatest power of two
/// below the length as the first comparator distance.
#[derive(Debug, Default)]
pub struct BitonicSort;

impl BitonicSort {
    fn sort_block(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, len: usize, ascending: bool) -> Result<()> {
        if len > 1 {
            let half = len / 2;
            Self::sort_block(cx, source, low, half, !ascending)?;
            Self::sort_block(cx, source, low + half, len - half, ascending)?;
            Self::merge_block(cx, source, low, len, ascending)?;
        }
        Ok(())
    }

    fn merge_block(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, len: usize, ascending: bool) -> Result<()> {
        if len > 1 {
            let distance = greatest_power_of_two_below(len);
            for i in low..low + len - distance {
                comparator(cx, source, i, i + distance, ascending)?;
            }
            Self::merge_block(cx, source, low, distance, ascending)?;
            Self::merge_block(cx, source, low + distance, len - distance, ascending)?;
        }
        Ok(())
    }
}

fn greatest_power_of_two_below(len: usize) -> usize {
    let mut power = 1;
    while power * 2 < len {
        power *= 2;
    }
    power
}

impl SortAlgorithm for BitonicSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BitonicSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::sort_block(cx, source, low, high - low + 1, true)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::sort_block(cx, source, low, high - low + 1, false)
    }

    fn sort_range(&self, _: &mut SortContext<'_>, _: &mut [Element], _: usize, _: usize, _: Order) -> Result<()> {
        reject_range(self.id())
    }
}

/// Iterative bitonic sort in the "flip" formulation: every comparator points
/// the same way, so lengths that are not a power of two behave as if padded
/// at the end with values that never move.
#[derive(Debug, Default)]
pub struct BitonicSortIter;

impl BitonicSortIter {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, ascending: bool) -> Result<()> {
        let n = high - low + 1;
        let size = n.next_power_of_two();

        // k is the size of the bitonic sequence being built
        let mut k = 2;
        while k <= size {
            // flip: compare i with its mirror inside the k-block
            for i in 0..size {
                let partner = i ^ (k - 1);
                if partner > i && partner < n {
                    comparator(cx, source, low + i, low + partner, ascending)?;
                }
            }
            // j is the distance between elements being compared
            let mut j = k / 4;
            while j > 0 {
                for i in 0..size {
                    let partner = i ^ j;
                    if partner > i && partner < n {
                        comparator(cx, source, low + i, low + partner, ascending)?;
                    }
                }
                j /= 2;
            }
            k *= 2;
        }
        Ok(())
    }
}

impl SortAlgorithm for BitonicSortIter {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BitonicSortIter
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, true)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, false)
    }

    fn sort_range(&self, _: &mut SortContext<'_>, _: &mut [Element], _: usize, _: usize, _: Order) -> Result<()> {
        reject_range(self.id())
    }
}

/// Batcher's odd-even merge sort, arbitrary-length form.
#[derive(Debug, Default)]
pub struct OddEvenMergeSort;

impl OddEvenMergeSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, ascending: bool) -> Result<()> {
        let n = high - low + 1;
        let mut p = 1;
        while p < n {
            let mut k = p;
            while k > 0 {
                let mut j = k % p;
                while j + k < n {
                    for i in 0..k.min(n - j - k) {
                        // only pairs inside the same 2p-block
                        if (i + j) / (2 * p) == (i + j + k) / (2 * p) {
                            comparator(cx, source, low + i + j, low + i + j + k, ascending)?;
                        }
                    }
                    j += 2 * k;
                }
                k /= 2;
            }
            p *= 2;
        }
        Ok(())
    }
}

impl SortAlgorithm for OddEvenMergeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::OddEvenMergeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, true)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, false)
    }

    fn sort_range(&self, _: &mut SortContext<'_>, _: &mut [Element], _: usize, _: usize, _: Order) -> Result<()> {
        reject_range(self.id())
    }
}

/// Parberry's pairwise sorting network.
#[derive(Debug, Default)]
pub struct PairwiseSort;

impl PairwiseSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, ascending: bool) -> Result<()> {
        let n = high - low + 1;

        // Sort pairs, then pairs of pairs, ...
        let mut a = 1;
        while a < n {
            let (mut b, mut c) = (a, 0);
            while b < n {
                comparator(cx, source, low + b - a, low + b, ascending)?;
                c = (c + 1) % a;
                b += 1;
                if c == 0 {
                    b += a;
                }
            }
            a *= 2;
        }

        // Merge back down
        a /= 4;
        let mut e = 1;
        while a > 0 {
            let mut d = e;
            while d > 0 {
                let (mut b, mut c) = ((d + 1) * a, 0);
                while b < n {
                    comparator(cx, source, low + b - d * a, low + b, ascending)?;
                    c = (c + 1) % a;
                    b += 1;
                    if c == 0 {
                        b += a;
                    }
                }
                d /= 2;
            }
            a /= 2;
            e = 2 * e + 1;
        }
        Ok(())
    }
}

impl SortAlgorithm for PairwiseSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::PairwiseSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, true)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, false)
    }

    fn sort_range(&self, _: &mut SortContext<'_>, _: &mut [Element], _: usize, _: usize, _: Order) -> Result<()> {
        reject_range(self.id())
    }
}

/// Shear sort on a `ceil(sqrt(n))`-wide grid.
///
/// The full rows are snake-sorted and column-sorted `log2(rows) + 1` times,
/// odd rows are reversed to read in one direction, and a final insertion pass
/// settles the partial last row.
#[derive(Debug)]
pub struct ShearSort {
    insertion: Arc<dyn SortAlgorithm>,
}

struct Grid {
    low: usize,
    cols: usize,
    rows: usize,
}

impl Grid {
    fn new(low: usize, n: usize) -> Self {
        let cols = ((n as f64).sqrt().ceil() as usize).max(1);
        Grid { low, cols, rows: n / cols }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        self.low + row * self.cols + col
    }
}

impl ShearSort {
    pub fn new(insertion: Arc<dyn SortAlgorithm>) -> Self {
        ShearSort { insertion }
    }

    /// Odd-even transposition over `count` cells addressed by `cell`.
    fn transpose_sort<F>(cx: &mut SortContext<'_>, source: &mut [Element], count: usize, ascending: bool, cell: F) -> Result<()>
    where
        F: Fn(usize) -> usize,
    {
        for round in 0..count {
            let mut k = round % 2;
            while k + 1 < count {
                comparator(cx, source, cell(k), cell(k + 1), ascending)?;
                k += 2;
            }
        }
        Ok(())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let ascending = order == Order::Ascending;
        let grid = Grid::new(low, high - low + 1);
        if grid.rows > 1 {
            let phases = (usize::BITS - grid.rows.leading_zeros()) as usize + 1;
            for _ in 0..phases {
                for row in 0..grid.rows {
                    let forward = (row % 2 == 0) == ascending;
                    Self::transpose_sort(cx, source, grid.cols, forward, |col| grid.at(row, col))?;
                }
                for col in 0..grid.cols {
                    Self::transpose_sort(cx, source, grid.rows, ascending, |row| grid.at(row, col))?;
                }
            }
            // un-snake: odd rows read the other way
            for row in (1..grid.rows).step_by(2) {
                for col in 0..grid.cols / 2 {
                    cx.exchange(source, grid.at(row, col), grid.at(row, grid.cols - 1 - col))?;
                }
            }
        }
        self.insertion.sort_range(cx, source, low, high, order)
    }
}

impl SortAlgorithm for ShearSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::ShearSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }

    fn sort_range(&self, _: &mut SortContext<'_>, _: &mut [Element], _: usize, _: usize, _: Order) -> Result<()> {
        reject_range(self.id())
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

    fn networks() -> Vec<Box<dyn SortAlgorithm>> {
        vec![
            Box::new(BitonicSort),
            Box::new(BitonicSortIter),
            Box::new(OddEvenMergeSort),
            Box::new(PairwiseSort),
            Box::new(ShearSort::new(Arc::new(InsertSort))),
        ]
    }

    #[test]
    fn test_networks_sort_any_length() {
        let mut rng = rand::thread_rng();
        for len in 1..=40 {
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(0..25)).collect();
            for algorithm in networks() {
                for order in [Order::Ascending, Order::Descending] {
                    let mut sink = CountingSink::default();
                    let mut data = elements_from(&values);
                    let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 8);
                    algorithm.sort(&mut cx, &mut data, order).unwrap();
                    assert!(
                        is_sorted(&data, order),
                        "{} failed for {order} at length {len}: {:?}",
                        algorithm.id(),
                        values_of(&data)
                    );
                }
            }
        }
    }

    #[test]
    fn test_networks_reject_sub_ranges() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[3, 2, 1, 0]);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 8);
        for algorithm in networks() {
            let err = algorithm.sort_range(&mut cx, &mut data, 1, 3, Order::Ascending).unwrap_err();
            assert!(matches!(err, SortError::Unsupported { operation: "sort_range", .. }));
        }
        assert_eq!(values_of(&data), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_greatest_power_of_two_below() {
        assert_eq!(greatest_power_of_two_below(2), 1);
        assert_eq!(greatest_power_of_two_below(5), 4);
        assert_eq!(greatest_power_of_two_below(8), 4);
        assert_eq!(greatest_power_of_two_below(9), 8);
    }
}
