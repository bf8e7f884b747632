//! Curious sorts: randomised, joke and physical-model algorithms.
//!
//! Sleep sort is the only algorithm in the crate with real concurrency: one
//! delay task per element runs on a dedicated rayon pool and records its
//! wake-up; the recorded order is applied afterwards on the run's thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use crate::algorithm::SortAlgorithm;
use crate::context::{Frame, SortContext};
use crate::element::{Element, Order, Tag};
use crate::error::{Result, SortError};
use crate::registry::AlgorithmId;
use crate::sorts::distribution::{dense_span, value_bounds};
use crate::sorts::merge::merge_in_place;

/// Scan adjacent pairs, highlighting each, until one is out of order.
fn in_order(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<bool> {
    for i in low..high {
        cx.highlight_pair(source, i, Tag::Compare, i + 1, Tag::Compare)?;
        if !order.precedes(source[i].value, source[i + 1].value) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Shuffle until sorted.
#[derive(Debug, Default)]
pub struct BogoSort;

impl BogoSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        while !in_order(cx, source, low, high, order)? {
            for i in (low + 1..=high).rev() {
                let j = cx.rng().gen_range(low..=i);
                cx.exchange(source, i, j)?;
            }
        }
        Ok(())
    }
}

impl SortAlgorithm for BogoSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BogoSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// Swap two random elements until sorted.
#[derive(Debug, Default)]
pub struct BozoSort;

impl BozoSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        while !in_order(cx, source, low, high, order)? {
            let i = cx.rng().gen_range(low..=high);
            let j = cx.rng().gen_range(low..=high);
            cx.exchange(source, i, j)?;
        }
        Ok(())
    }
}

impl SortAlgorithm for BozoSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BozoSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// Stalin sort that keeps every element: out-of-order elements are sent to
/// the far end instead of being dropped, sorted the same way, and merged back.
#[derive(Debug, Default)]
pub struct StalinSort;

impl SortAlgorithm for StalinSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::StalinSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        // kept elements are low..=kept, exiles collect in tail..=high
        let (mut kept, mut tail) = (low, high + 1);
        while kept + 1 < tail {
            let next = kept + 1;
            cx.highlight_pair(source, kept, Tag::Cursor, next, Tag::Compare)?;
            if source[kept].value <= source[next].value {
                kept = next;
            } else {
                cx.shift(source, next, high)?;
                tail -= 1;
            }
        }
        if tail <= high {
            self.sort_ascending(cx, source, tail, high)?;
            merge_in_place(cx, source, low, kept, high, Order::Ascending)?;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        // kept elements are kept..=high, exiles collect in low..head
        let (mut kept, mut head) = (high, low);
        while kept > head {
            let next = kept - 1;
            cx.highlight_pair(source, kept, Tag::Cursor, next, Tag::Compare)?;
            if source[next].value >= source[kept].value {
                kept = next;
            } else {
                cx.shift(source, next, low)?;
                head += 1;
            }
        }
        if head > low {
            self.sort_descending(cx, source, low, head - 1)?;
            merge_in_place(cx, source, low, head - 1, high, Order::Descending)?;
        }
        Ok(())
    }
}

/// Longest total sleep of one sleep-sort run.
const SLEEP_WINDOW_MICROS: u64 = 250_000;
/// Sleep per unit of value when the span fits the window.
const SLEEP_UNIT_MICROS: u64 = 1_000;
/// Upper bound on sleeper threads.
const MAX_SLEEPERS: usize = 256;

/// Sleep sort: each element sleeps in proportion to its value, and the wake
/// order is the sorted order. Close values can wake out of order, so an
/// insertion pass repairs the result.
#[derive(Debug)]
pub struct SleepSort {
    insertion: Arc<dyn SortAlgorithm>,
}

impl SleepSort {
    pub fn new(insertion: Arc<dyn SortAlgorithm>) -> Self {
        SleepSort { insertion }
    }

    /// Indices of `low..=high` in the order their sleepers woke up.
    fn wake_order(source: &[Element], low: usize, high: usize, order: Order) -> Result<Vec<usize>> {
        let (min, max) = value_bounds(source, low, high);
        let span = (i64::from(max) - i64::from(min)).max(1) as u64;
        let sleepers = (high - low + 1).min(MAX_SLEEPERS);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(sleepers)
            .thread_name(|i| format!("sleeper-{i}"))
            .build()
            .map_err(|e| SortError::Worker(e.to_string()))?;

        let woken = Mutex::new(Vec::with_capacity(high - low + 1));
        pool.scope(|scope| {
            for (index, element) in source.iter().enumerate().take(high + 1).skip(low) {
                let distance = match order {
                    Order::Ascending => i64::from(element.value) - i64::from(min),
                    Order::Descending => i64::from(max) - i64::from(element.value),
                } as u64;
                // one unit per value step, squeezed into the window for wide spans
                let delay = (distance * SLEEP_UNIT_MICROS).min(distance * SLEEP_WINDOW_MICROS / span);
                let woken = &woken;
                scope.spawn(move |_| {
                    thread::sleep(Duration::from_micros(delay));
                    log::trace!("sleeper for index {index} woke");
                    woken.lock().push(index);
                });
            }
        });
        Ok(woken.into_inner())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let woken = Self::wake_order(source, low, high, order)?;
        cx.arrange(source, low, &woken)?;
        self.insertion.sort_range(cx, source, low, high, order)
    }
}

impl SortAlgorithm for SleepSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::SleepSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

/// Multiply and surrender: sort both halves, move the larger maximum to
/// the end, then sort everything but the end.
#[derive(Debug, Default)]
pub struct SlowSort;

impl SortAlgorithm for SlowSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::SlowSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        if low >= high {
            return Ok(());
        }
        let mid = low + (high - low) / 2;
        self.sort_ascending(cx, source, low, mid)?;
        self.sort_ascending(cx, source, mid + 1, high)?;
        let out_of_order = source[mid].value > source[high].value;
        cx.swap_if(source, mid, high, out_of_order)?;
        self.sort_ascending(cx, source, low, high - 1)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        if low >= high {
            return Ok(());
        }
        let mid = low + (high - low + 1) / 2;
        self.sort_descending(cx, source, mid, high)?;
        self.sort_descending(cx, source, low, mid - 1)?;
        let out_of_order = source[mid].value > source[low].value;
        cx.swap_if(source, low, mid, out_of_order)?;
        self.sort_descending(cx, source, low + 1, high)
    }
}

/// Stooge sort: fix the ends, then sort the first two thirds, the last two
/// thirds and the first two thirds again.
#[derive(Debug)]
pub struct StoogeSort {
    iterative: bool,
}

impl StoogeSort {
    pub fn recursive() -> Self {
        StoogeSort { iterative: false }
    }

    pub fn iterative() -> Self {
        StoogeSort { iterative: true }
    }

    /// Order the ends of `low..=high` and return the three child ranges in
    /// visiting order.
    fn visit(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<Option<[(usize, usize); 3]>> {
        let out_of_order = match order {
            Order::Ascending => source[low].value > source[high].value,
            Order::Descending => source[low].value < source[high].value,
        };
        cx.swap_if(source, low, high, out_of_order)?;
        let len = high - low + 1;
        if len <= 2 {
            return Ok(None);
        }
        let third = len / 3;
        let (head, tail) = ((low, high - third), (low + third, high));
        Ok(Some(match order {
            Order::Ascending => [head, tail, head],
            Order::Descending => [tail, head, tail],
        }))
    }

    fn recurse(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if let Some(children) = Self::visit(cx, source, low, high, order)? {
            for (start, end) in children {
                Self::recurse(cx, source, start, end, order)?;
            }
        }
        Ok(())
    }

    fn drain(cx: &mut SortContext<'_>, source: &mut [Element], stack: &mut Vec<Frame>, order: Order) -> Result<()> {
        while let Some(frame) = stack.pop() {
            if let Some(children) = Self::visit(cx, source, frame.low, frame.high, order)? {
                for &(start, end) in children.iter().rev() {
                    stack.push(Frame::new(start, end, frame.depth + 1));
                }
            }
        }
        Ok(())
    }

    fn run(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        if !self.iterative {
            return Self::recurse(cx, source, low, high, order);
        }
        let mut stack = cx.take_stack();
        stack.push(Frame::new(low, high, 0));
        let result = Self::drain(cx, source, &mut stack, order);
        cx.restore_stack(stack);
        result
    }
}

impl SortAlgorithm for StoogeSort {
    fn id(&self) -> AlgorithmId {
        if self.iterative {
            AlgorithmId::StoogeSortIter
        } else {
            AlgorithmId::StoogeSort
        }
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        self.run(cx, source, low, high, Order::Descending)
    }
}

/// Spaghetti sort: lower a hand onto the rods, take the tallest one it
/// touches, lay it at the boundary, repeat.
#[derive(Debug, Default)]
pub struct SpaghettiSort;

impl SpaghettiSort {
    /// Tallest rod in `from..=to`, nearest to `to` on ties.
    fn tallest_towards_end(cx: &mut SortContext<'_>, source: &mut [Element], from: usize, to: usize) -> Result<usize> {
        let mut tallest = to;
        for j in (from..to).rev() {
            cx.highlight_pair(source, tallest, Tag::Cursor, j, Tag::Compare)?;
            if source[j].value > source[tallest].value {
                tallest = j;
            }
        }
        Ok(tallest)
    }

    /// Tallest rod in `from..=to`, nearest to `from` on ties.
    fn tallest_towards_start(cx: &mut SortContext<'_>, source: &mut [Element], from: usize, to: usize) -> Result<usize> {
        let mut tallest = from;
        for j in from + 1..=to {
            cx.highlight_pair(source, tallest, Tag::Cursor, j, Tag::Compare)?;
            if source[j].value > source[tallest].value {
                tallest = j;
            }
        }
        Ok(tallest)
    }
}

impl SortAlgorithm for SpaghettiSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::SpaghettiSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for boundary in (low + 1..=high).rev() {
            let tallest = Self::tallest_towards_end(cx, source, low, boundary)?;
            cx.shift(source, tallest, boundary)?;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for boundary in low..high {
            let tallest = Self::tallest_towards_start(cx, source, boundary, high)?;
            cx.shift(source, tallest, boundary)?;
        }
        Ok(())
    }
}

/// Bead (gravity) sort: every value is a rod of beads; after the beads fall,
/// level `l` holds as many beads as there are rods at least `l` tall, which
/// fixes every element's final row.
#[derive(Debug, Default)]
pub struct GravitySort;

impl GravitySort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (min, max) = value_bounds(source, low, high);
        let span = dense_span(AlgorithmId::GravitySort, min, max)?;
        let height = |e: &Element| (i64::from(e.value) - i64::from(min)) as usize;

        // rods per height, then beads per level (rods at least that tall)
        let mut rods = vec![0usize; span];
        for i in low..=high {
            cx.highlight(source, i, Tag::Bucket)?;
            rods[height(&source[i])] += 1;
        }
        let mut beads = vec![0usize; span + 1];
        for level in (0..span).rev() {
            beads[level] = beads[level + 1] + rods[level];
        }

        let len = high - low + 1;
        let mut placed = vec![0usize; span];
        let mut targets = cx.take_indices();
        targets.resize(len, 0);
        for i in low..=high {
            let h = height(&source[i]);
            let before = match order {
                Order::Ascending => len - beads[h],
                Order::Descending => beads[h + 1],
            };
            targets[i - low] = low + before + placed[h];
            placed[h] += 1;
        }
        let result = cx.permute(source, low, &mut targets);
        cx.restore_indices(targets);
        result
    }
}

impl SortAlgorithm for GravitySort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::GravitySort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// Cycle sort: each element is exchanged directly into its final slot.
#[derive(Debug, Default)]
pub struct CycleSort;

impl CycleSort {
    fn count_smaller(cx: &mut SortContext<'_>, source: &mut [Element], anchor: usize, others: impl Iterator<Item = usize>) -> Result<usize> {
        let mut smaller = 0;
        for j in others {
            cx.highlight_pair(source, anchor, Tag::Cursor, j, Tag::Compare)?;
            if source[j].value < source[anchor].value {
                smaller += 1;
            }
        }
        Ok(smaller)
    }
}

impl SortAlgorithm for CycleSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::CycleSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for start in low..high {
            loop {
                let value = source[start].value;
                let mut pos = start + Self::count_smaller(cx, source, start, start + 1..=high)?;
                if pos == start {
                    break;
                }
                while source[pos].value == value {
                    pos += 1;
                }
                cx.exchange(source, start, pos)?;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for start in (low + 1..=high).rev() {
            loop {
                let value = source[start].value;
                let mut pos = start - Self::count_smaller(cx, source, start, low..start)?;
                if pos == start {
                    break;
                }
                while source[pos].value == value {
                    pos -= 1;
                }
                cx.exchange(source, start, pos)?;
            }
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

    fn run(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order) -> (Vec<i32>, u64) {
        let mut sink = CountingSink::default();
        let mut data = elements_from(values);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 21);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(is_sorted(&data, order), "{} failed for {order}: {:?}", algorithm.id(), values_of(&data));
        let mut got = values_of(&data);
        got.sort();
        let mut expected = values.to_vec();
        expected.sort();
        assert_eq!(got, expected, "{} lost elements", algorithm.id());
        (values_of(&data), cx.steps())
    }

    fn random_values(len: usize, range: std::ops::Range<i32>) -> Vec<i32> {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(range.clone())).collect()
    }

    #[test]
    fn test_randomised_sorts_small_inputs() {
        let values = random_values(6, 0..10);
        for algorithm in [&BogoSort as &dyn SortAlgorithm, &BozoSort] {
            run(algorithm, &values, Order::Ascending);
            run(algorithm, &values, Order::Descending);
        }
    }

    #[test]
    fn test_deterministic_curious_sorts() {
        let algorithms: Vec<Box<dyn SortAlgorithm>> = vec![
            Box::new(StalinSort),
            Box::new(SlowSort),
            Box::new(StoogeSort::recursive()),
            Box::new(StoogeSort::iterative()),
            Box::new(SpaghettiSort),
            Box::new(GravitySort),
            Box::new(CycleSort),
        ];
        for len in [2, 3, 11, 20] {
            let values = random_values(len, -15..15);
            for algorithm in &algorithms {
                run(algorithm.as_ref(), &values, Order::Ascending);
                run(algorithm.as_ref(), &values, Order::Descending);
            }
        }
    }

    #[test]
    fn test_sleep_sort_with_repair() {
        let algorithm = SleepSort::new(Arc::new(InsertSort));
        let values = random_values(16, 0..20);
        run(&algorithm, &values, Order::Ascending);
        run(&algorithm, &values, Order::Descending);
    }

    #[test]
    fn test_stooge_recursive_iterative_parity() {
        let values = random_values(25, 0..40);
        for order in [Order::Ascending, Order::Descending] {
            assert_eq!(run(&StoogeSort::recursive(), &values, order), run(&StoogeSort::iterative(), &values, order));
        }
    }

    #[test]
    fn test_stalin_sort_keeps_exiles() {
        let (sorted, _) = run(&StalinSort, &[1, 5, 2, 6, 3, 7, 0], Order::Ascending);
        assert_eq!(sorted, vec![0, 1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_cycle_sort_duplicates() {
        run(&CycleSort, &[3, 1, 3, 2, 1, 3, 3, 0], Order::Ascending);
        run(&CycleSort, &[3, 1, 3, 2, 1, 3, 3, 0], Order::Descending);
    }

    #[test]
    fn test_gravity_sort_refuses_wide_span() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[0, 1 << 25]);
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), 21);
        let err = GravitySort.sort(&mut cx, &mut data, Order::Ascending).unwrap_err();
        assert!(matches!(err, SortError::SpanTooWide { .. }));
    }
}
