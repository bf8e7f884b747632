//! Exchange sorts: bubble, cocktail shaker, comb, odd-even (brick), simple
//! exchange and circle sort.
//!
//! Descending variants walk the array from the opposite end instead of
//! inverting the comparison, so the largest values settle on the left.

use crate::algorithm::SortAlgorithm;
use crate::context::{Frame, SortContext};
use crate::element::Element;
use crate::error::Result;
use crate::registry::AlgorithmId;

#[derive(Debug, Default)]
pub struct BubbleSort;

impl SortAlgorithm for BubbleSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BubbleSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut end = high;
        while end > low {
            let mut swapped = false;
            for j in low..end {
                let out_of_order = source[j].value > source[j + 1].value;
                swapped |= cx.swap_if(source, j, j + 1, out_of_order)?;
            }
            if !swapped {
                break;
            }
            end -= 1;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut start = low;
        while start < high {
            let mut swapped = false;
            for j in (start + 1..=high).rev() {
                let out_of_order = source[j].value > source[j - 1].value;
                swapped |= cx.swap_if(source, j - 1, j, out_of_order)?;
            }
            if !swapped {
                break;
            }
            start += 1;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CocktailSort;

impl SortAlgorithm for CocktailSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::CocktailSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let (mut start, mut end) = (low, high);
        while start < end {
            let mut swapped = false;
            for j in start..end {
                let out_of_order = source[j].value > source[j + 1].value;
                swapped |= cx.swap_if(source, j, j + 1, out_of_order)?;
            }
            if !swapped {
                break;
            }
            end -= 1;

            swapped = false;
            for j in (start..end).rev() {
                let out_of_order = source[j].value > source[j + 1].value;
                swapped |= cx.swap_if(source, j, j + 1, out_of_order)?;
            }
            if !swapped {
                break;
            }
            start += 1;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let (mut start, mut end) = (low, high);
        while start < end {
            let mut swapped = false;
            for j in (start..end).rev() {
                let out_of_order = source[j + 1].value > source[j].value;
                swapped |= cx.swap_if(source, j, j + 1, out_of_order)?;
            }
            if !swapped {
                break;
            }
            start += 1;

            swapped = false;
            for j in start..end {
                let out_of_order = source[j + 1].value > source[j].value;
                swapped |= cx.swap_if(source, j, j + 1, out_of_order)?;
            }
            if !swapped {
                break;
            }
            end -= 1;
        }
        Ok(())
    }
}

/// Comb sort with the usual 1.3 shrink factor.
#[derive(Debug, Default)]
pub struct CombSort;

const COMB_SHRINK: f64 = 1.3;

fn next_gap(gap: usize) -> usize {
    ((gap as f64 / COMB_SHRINK) as usize).max(1)
}

impl SortAlgorithm for CombSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::CombSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut gap = high - low + 1;
        let mut swapped = true;
        while gap > 1 || swapped {
            gap = next_gap(gap);
            swapped = false;
            for j in low..=high - gap {
                let out_of_order = source[j].value > source[j + gap].value;
                swapped |= cx.swap_if(source, j, j + gap, out_of_order)?;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut gap = high - low + 1;
        let mut swapped = true;
        while gap > 1 || swapped {
            gap = next_gap(gap);
            swapped = false;
            for j in (low + gap..=high).rev() {
                let out_of_order = source[j].value > source[j - gap].value;
                swapped |= cx.swap_if(source, j - gap, j, out_of_order)?;
            }
        }
        Ok(())
    }
}

/// Odd-even transposition (brick) sort.
#[derive(Debug, Default)]
pub struct OddEvenSort;

impl SortAlgorithm for OddEvenSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::OddEvenSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut sorted = false;
        while !sorted {
            sorted = true;
            for phase in [1, 0] {
                let mut j = low + phase;
                while j < high {
                    let out_of_order = source[j].value > source[j + 1].value;
                    if cx.swap_if(source, j, j + 1, out_of_order)? {
                        sorted = false;
                    }
                    j += 2;
                }
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut sorted = false;
        while !sorted {
            sorted = true;
            for phase in [1, 0] {
                // pairs (j - 1, j) anchored at the right end
                let mut j = high as isize - phase as isize;
                while j > low as isize {
                    let right = j as usize;
                    let out_of_order = source[right].value > source[right - 1].value;
                    if cx.swap_if(source, right - 1, right, out_of_order)? {
                        sorted = false;
                    }
                    j -= 2;
                }
            }
        }
        Ok(())
    }
}

/// Compares every position against every later position.
#[derive(Debug, Default)]
pub struct ExchangeSort;

impl SortAlgorithm for ExchangeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::ExchangeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in low..high {
            for j in i + 1..=high {
                let out_of_order = source[i].value > source[j].value;
                cx.swap_if(source, i, j, out_of_order)?;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in (low + 1..=high).rev() {
            for j in (low..i).rev() {
                let out_of_order = source[j].value < source[i].value;
                cx.swap_if(source, j, i, out_of_order)?;
            }
        }
        Ok(())
    }
}

/// Circle sort: compare mirrored pairs of a range, recurse into both halves,
/// repeat full passes until one makes no exchange.
#[derive(Debug)]
pub struct CircleSort {
    iterative: bool,
}

impl CircleSort {
    pub fn recursive() -> Self {
        CircleSort { iterative: false }
    }

    pub fn iterative() -> Self {
        CircleSort { iterative: true }
    }

    /// Mirrored-pair pass over one range; returns the split point.
    fn circle_ascending(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<(bool, usize)> {
        let mut swapped = false;
        let (mut i, mut j) = (low, high);
        while i < j {
            let out_of_order = source[i].value > source[j].value;
            swapped |= cx.swap_if(source, i, j, out_of_order)?;
            i += 1;
            j -= 1;
        }
        if i == j {
            let out_of_order = source[i].value > source[j + 1].value;
            swapped |= cx.swap_if(source, i, j + 1, out_of_order)?;
        }
        Ok((swapped, low + (high - low) / 2))
    }

    fn circle_descending(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<(bool, usize)> {
        let mut swapped = false;
        let (mut i, mut j) = (high, low);
        while j < i {
            let out_of_order = source[j].value < source[i].value;
            swapped |= cx.swap_if(source, j, i, out_of_order)?;
            i -= 1;
            j += 1;
        }
        if i == j {
            let out_of_order = source[i - 1].value < source[i].value;
            swapped |= cx.swap_if(source, i - 1, i, out_of_order)?;
        }
        Ok((swapped, low + (high - low + 1) / 2))
    }

    fn pass_recursive(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        ascending: bool,
    ) -> Result<bool> {
        if low >= high {
            return Ok(false);
        }
        if ascending {
            let (swapped, mid) = Self::circle_ascending(cx, source, low, high)?;
            let left = self.pass_recursive(cx, source, low, mid, true)?;
            let right = self.pass_recursive(cx, source, mid + 1, high, true)?;
            Ok(swapped || left || right)
        } else {
            let (swapped, mid) = Self::circle_descending(cx, source, low, high)?;
            let right = self.pass_recursive(cx, source, mid, high, false)?;
            let left = self.pass_recursive(cx, source, low, mid - 1, false)?;
            Ok(swapped || left || right)
        }
    }

    fn pass_iterative(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        ascending: bool,
    ) -> Result<bool> {
        let mut stack = cx.take_stack();
        stack.push(Frame::new(low, high, 0));
        let result = Self::drain(cx, source, &mut stack, ascending);
        cx.restore_stack(stack);
        result
    }

    fn drain(cx: &mut SortContext<'_>, source: &mut [Element], stack: &mut Vec<Frame>, ascending: bool) -> Result<bool> {
        let mut swapped = false;
        while let Some(frame) = stack.pop() {
            if frame.low >= frame.high {
                continue;
            }
            if ascending {
                let (changed, mid) = Self::circle_ascending(cx, source, frame.low, frame.high)?;
                swapped |= changed;
                stack.push(Frame::new(mid + 1, frame.high, frame.depth + 1));
                stack.push(Frame::new(frame.low, mid, frame.depth + 1));
            } else {
                let (changed, mid) = Self::circle_descending(cx, source, frame.low, frame.high)?;
                swapped |= changed;
                stack.push(Frame::new(frame.low, mid - 1, frame.depth + 1));
                stack.push(Frame::new(mid, frame.high, frame.depth + 1));
            }
        }
        Ok(swapped)
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, ascending: bool) -> Result<()> {
        loop {
            let swapped = if self.iterative {
                self.pass_iterative(cx, source, low, high, ascending)?
            } else {
                self.pass_recursive(cx, source, low, high, ascending)?
            };
            if !swapped {
                return Ok(());
            }
        }
    }
}

impl SortAlgorithm for CircleSort {
    fn id(&self) -> AlgorithmId {
        if self.iterative {
            AlgorithmId::CircleSortIter
        } else {
            AlgorithmId::CircleSort
        }
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, true)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CountingSink, SnapshotSink};
    use crate::element::{elements_from, is_sorted, values_of, Order};
    use crate::error::SortError;
    use crate::options::SortOptions;
    use rand::Rng;

    fn run(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order) -> (Vec<i32>, u64) {
        let mut sink = CountingSink::default();
        let mut data = elements_from(values);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 1);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(is_sorted(&data, order), "{} failed for {order}", algorithm.id());
        (values_of(&data), cx.steps())
    }

    fn random_values(len: usize) -> Vec<i32> {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(-50..50)).collect()
    }

    #[test]
    fn test_exchange_family_sorts_both_orders() {
        let algorithms: Vec<Box<dyn SortAlgorithm>> = vec![
            Box::new(BubbleSort),
            Box::new(CocktailSort),
            Box::new(CombSort),
            Box::new(OddEvenSort),
            Box::new(ExchangeSort),
            Box::new(CircleSort::recursive()),
            Box::new(CircleSort::iterative()),
        ];
        for len in [2, 3, 7, 16, 33] {
            let values = random_values(len);
            for algorithm in &algorithms {
                run(algorithm.as_ref(), &values, Order::Ascending);
                run(algorithm.as_ref(), &values, Order::Descending);
            }
        }
    }

    #[test]
    fn test_bubble_sort_counts_inversions() {
        // every exchange removes exactly one inversion
        let (sorted, steps) = run(&BubbleSort, &[4, 3, 2, 1], Order::Ascending);
        assert_eq!(sorted, vec![1, 2, 3, 4]);
        assert_eq!(steps, 6);
        let (_, steps) = run(&BubbleSort, &[1, 2, 3, 4], Order::Descending);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_circle_sort_recursive_and_iterative_agree() {
        for _ in 0..10 {
            let values = random_values(29);
            for order in [Order::Ascending, Order::Descending] {
                let recursive = run(&CircleSort::recursive(), &values, order);
                let iterative = run(&CircleSort::iterative(), &values, order);
                assert_eq!(recursive, iterative);
            }
        }
    }

    /// Accepts `remaining` snapshots, then reports the consumer gone.
    struct StopAfter {
        remaining: u64,
    }

    impl SnapshotSink for StopAfter {
        fn emit(&mut self, _step_count: u64, _elements: &[Element]) -> Result<()> {
            if self.remaining == 0 {
                return Err(SortError::Cancelled);
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_circle_sort_iter_returns_frame_stack_when_cancelled() {
        let mut sink = StopAfter { remaining: 5 };
        let mut data = elements_from(&[9, 3, 7, 1, 8, 2, 6, 4]);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 1);
        let err = CircleSort::iterative().sort(&mut cx, &mut data, Order::Ascending).unwrap_err();
        assert!(matches!(err, SortError::Cancelled));
        // the stack taken for the pass went back to the arena, not dropped
        assert!(cx.take_stack().capacity() > 0);
    }

    #[test]
    fn test_sorted_input_needs_no_exchanges() {
        let ascending: Vec<i32> = (0..20).collect();
        let descending: Vec<i32> = (0..20).rev().collect();
        for algorithm in [&BubbleSort as &dyn SortAlgorithm, &CocktailSort, &CombSort, &OddEvenSort, &ExchangeSort] {
            assert_eq!(run(algorithm, &ascending, Order::Ascending).1, 0);
            assert_eq!(run(algorithm, &descending, Order::Descending).1, 0);
        }
    }
}
