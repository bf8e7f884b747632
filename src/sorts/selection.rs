//! Selection-family sorts: plain and double selection, binary, k-ary and
//! Leonardo heaps, pancake flipping and a tournament tree.
//!
//! The heap sorts run one max-heap routine over a [`HeapView`] that maps
//! virtual heap slots onto the physical range either left-to-right
//! (ascending) or right-to-left (descending).

use crate::algorithm::SortAlgorithm;
use crate::context::SortContext;
use crate::element::{Element, Order, Tag};
use crate::error::Result;
use crate::registry::AlgorithmId;

#[derive(Debug, Default)]
pub struct SelectSort;

impl SortAlgorithm for SelectSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::SelectSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in low..high {
            let mut min = i;
            for j in i + 1..=high {
                cx.highlight_pair(source, min, Tag::Cursor, j, Tag::Compare)?;
                if source[j].value < source[min].value {
                    min = j;
                }
            }
            cx.exchange(source, i, min)?;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in (low + 1..=high).rev() {
            let mut min = i;
            for j in (low..i).rev() {
                cx.highlight_pair(source, min, Tag::Cursor, j, Tag::Compare)?;
                if source[j].value < source[min].value {
                    min = j;
                }
            }
            cx.exchange(source, i, min)?;
        }
        Ok(())
    }
}

/// Selects the minimum and maximum of the unsorted middle on every pass.
#[derive(Debug, Default)]
pub struct DoubleSelectSort;

impl DoubleSelectSort {
    fn extremes(cx: &mut SortContext<'_>, source: &mut [Element], lo: usize, hi: usize) -> Result<(usize, usize)> {
        let (mut min, mut max) = (lo, lo);
        for j in lo + 1..=hi {
            cx.highlight_many(source, &[(min, Tag::Cursor), (max, Tag::Cursor), (j, Tag::Compare)])?;
            if source[j].value < source[min].value {
                min = j;
            }
            if source[j].value > source[max].value {
                max = j;
            }
        }
        Ok((min, max))
    }

    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let (mut lo, mut hi) = (low, high);
        while lo < hi {
            let (min, max) = Self::extremes(cx, source, lo, hi)?;
            let (first, mut last) = match order {
                Order::Ascending => (min, max),
                Order::Descending => (max, min),
            };
            cx.exchange(source, lo, first)?;
            if last == lo {
                last = first;
            }
            cx.exchange(source, hi, last)?;
            lo += 1;
            hi -= 1;
        }
        Ok(())
    }
}

impl SortAlgorithm for DoubleSelectSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::DoubleSelectSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}

/// Maps virtual heap slot `v` to a physical index.
#[derive(Debug, Clone, Copy)]
struct HeapView {
    low: usize,
    high: usize,
    ascending: bool,
}

impl HeapView {
    fn new(low: usize, high: usize, order: Order) -> Self {
        HeapView { low, high, ascending: order == Order::Ascending }
    }

    #[inline]
    fn at(&self, v: usize) -> usize {
        if self.ascending {
            self.low + v
        } else {
            self.high - v
        }
    }

    fn len(&self) -> usize {
        self.high - self.low + 1
    }
}

/// Restore the max-heap property below `root` within the first `end` slots.
fn sift_down(
    cx: &mut SortContext<'_>,
    source: &mut [Element],
    view: HeapView,
    arity: usize,
    mut root: usize,
    end: usize,
) -> Result<()> {
    loop {
        let first = arity * root + 1;
        if first >= end {
            return Ok(());
        }
        let mut largest = root;
        for child in first..(first + arity).min(end) {
            cx.highlight_pair(source, view.at(largest), Tag::Cursor, view.at(child), Tag::Compare)?;
            if source[view.at(child)].value > source[view.at(largest)].value {
                largest = child;
            }
        }
        if largest == root {
            return Ok(());
        }
        cx.exchange(source, view.at(root), view.at(largest))?;
        root = largest;
    }
}

fn heap_sort(cx: &mut SortContext<'_>, source: &mut [Element], view: HeapView, arity: usize) -> Result<()> {
    let len = view.len();
    for root in (0..=(len - 2) / arity).rev() {
        sift_down(cx, source, view, arity, root, len)?;
    }
    for end in (1..len).rev() {
        cx.exchange(source, view.at(0), view.at(end))?;
        sift_down(cx, source, view, arity, 0, end)?;
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct HeapSort;

impl SortAlgorithm for HeapSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::HeapSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        heap_sort(cx, source, HeapView::new(low, high, Order::Ascending), 2)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        heap_sort(cx, source, HeapView::new(low, high, Order::Descending), 2)
    }
}

/// Heap sort with `heap_arity` children per node.
#[derive(Debug, Default)]
pub struct KHeapSort;

impl SortAlgorithm for KHeapSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::KHeapSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let arity = cx.options().heap_arity.get();
        heap_sort(cx, source, HeapView::new(low, high, Order::Ascending), arity)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let arity = cx.options().heap_arity.get();
        heap_sort(cx, source, HeapView::new(low, high, Order::Descending), arity)
    }
}

/// Dijkstra's smoothsort over a forest of Leonardo heaps.
#[derive(Debug, Default)]
pub struct SmoothSort;

/// Leonardo numbers up to and including the first one of at least `len`.
fn leonardo_numbers(len: usize) -> Vec<usize> {
    let mut numbers = vec![1, 1];
    while numbers[numbers.len() - 1] < len {
        let n = numbers.len();
        numbers.push(numbers[n - 1] + numbers[n - 2] + 1);
    }
    numbers
}

struct Forest<'a> {
    view: HeapView,
    leonardo: &'a [usize],
    /// Heap orders, leftmost heap first.
    orders: Vec<usize>,
}

impl Forest<'_> {
    fn value(&self, source: &[Element], v: usize) -> i32 {
        source[self.view.at(v)].value
    }

    fn root_of(&self, heap: usize) -> usize {
        self.orders[..=heap].iter().map(|&k| self.leonardo[k]).sum::<usize>() - 1
    }

    /// Children of a root of order `k >= 2`: (left, right).
    fn children(&self, root: usize, k: usize) -> (usize, usize) {
        let right = root - 1;
        (right - self.leonardo[k - 2], right)
    }

    fn sift(&self, cx: &mut SortContext<'_>, source: &mut [Element], mut root: usize, mut k: usize) -> Result<()> {
        while k >= 2 {
            let (left, right) = self.children(root, k);
            cx.highlight_pair(source, self.view.at(left), Tag::Compare, self.view.at(right), Tag::Compare)?;
            let (child, child_order) =
                if self.value(source, left) >= self.value(source, right) { (left, k - 1) } else { (right, k - 2) };
            cx.highlight_pair(source, self.view.at(root), Tag::Cursor, self.view.at(child), Tag::Compare)?;
            if self.value(source, root) >= self.value(source, child) {
                return Ok(());
            }
            cx.exchange(source, self.view.at(root), self.view.at(child))?;
            root = child;
            k = child_order;
        }
        Ok(())
    }

    /// Move the root of `heap` leftwards past smaller roots, then sift it.
    fn rectify(&self, cx: &mut SortContext<'_>, source: &mut [Element], mut heap: usize) -> Result<()> {
        let mut root = self.root_of(heap);
        while heap > 0 {
            let previous = self.root_of(heap - 1);
            let mut largest = self.value(source, root);
            let k = self.orders[heap];
            if k >= 2 {
                let (left, right) = self.children(root, k);
                largest = largest.max(self.value(source, left)).max(self.value(source, right));
            }
            cx.highlight_pair(source, self.view.at(previous), Tag::Compare, self.view.at(root), Tag::Cursor)?;
            if self.value(source, previous) <= largest {
                break;
            }
            cx.exchange(source, self.view.at(previous), self.view.at(root))?;
            root = previous;
            heap -= 1;
        }
        self.sift(cx, source, root, self.orders[heap])
    }
}

impl SmoothSort {
    fn run(cx: &mut SortContext<'_>, source: &mut [Element], view: HeapView) -> Result<()> {
        let len = view.len();
        let leonardo = leonardo_numbers(len);
        let mut forest = Forest { view, leonardo: &leonardo, orders: Vec::new() };

        for _ in 0..len {
            let count = forest.orders.len();
            if count >= 2 && forest.orders[count - 2] == forest.orders[count - 1] + 1 {
                forest.orders.pop();
                if let Some(order) = forest.orders.last_mut() {
                    *order += 1;
                }
            } else if forest.orders.last() == Some(&1) {
                forest.orders.push(0);
            } else {
                forest.orders.push(1);
            }
            forest.rectify(cx, source, forest.orders.len() - 1)?;
        }

        for _ in 1..len {
            let Some(k) = forest.orders.pop() else { break };
            if k >= 2 {
                forest.orders.push(k - 1);
                forest.rectify(cx, source, forest.orders.len() - 1)?;
                forest.orders.push(k - 2);
                forest.rectify(cx, source, forest.orders.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl SortAlgorithm for SmoothSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::SmoothSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, HeapView::new(low, high, Order::Ascending))
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, HeapView::new(low, high, Order::Descending))
    }
}

/// Pancake sort: only prefix reversals ("flips") move elements.
#[derive(Debug, Default)]
pub struct PancakeSort;

impl PancakeSort {
    fn flip(cx: &mut SortContext<'_>, source: &mut [Element], mut from: usize, mut to: usize) -> Result<()> {
        while from < to {
            cx.exchange(source, from, to)?;
            from += 1;
            to -= 1;
        }
        Ok(())
    }

    fn max_in(cx: &mut SortContext<'_>, source: &mut [Element], from: usize, to: usize) -> Result<usize> {
        let mut max = from;
        for j in from + 1..=to {
            cx.highlight_pair(source, max, Tag::Cursor, j, Tag::Compare)?;
            if source[j].value > source[max].value {
                max = j;
            }
        }
        Ok(max)
    }
}

impl SortAlgorithm for PancakeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::PancakeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for end in (low + 1..=high).rev() {
            let max = Self::max_in(cx, source, low, end)?;
            if max != end {
                Self::flip(cx, source, low, max)?;
                Self::flip(cx, source, low, end)?;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        // flips are anchored at `high`
        for start in low..high {
            let max = Self::max_in(cx, source, start, high)?;
            if max != start {
                Self::flip(cx, source, max, high)?;
                Self::flip(cx, source, start, high)?;
            }
        }
        Ok(())
    }
}

/// Tournament (winner tree) sort.
#[derive(Debug, Default)]
pub struct TournamentSort;

impl TournamentSort {
    fn play(
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        order: Order,
        a: Option<usize>,
        b: Option<usize>,
    ) -> Result<Option<usize>> {
        match (a, b) {
            (Some(x), Some(y)) => {
                cx.highlight_pair(source, x, Tag::Compare, y, Tag::Compare)?;
                Ok(Some(if order.precedes(source[x].value, source[y].value) { x } else { y }))
            }
            (x, None) => Ok(x),
            (None, y) => Ok(y),
        }
    }

    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let len = high - low + 1;
        let leaves = len.next_power_of_two();
        let mut tree: Vec<Option<usize>> = vec![None; 2 * leaves];
        for (k, slot) in tree[leaves..leaves + len].iter_mut().enumerate() {
            *slot = Some(low + k);
        }
        for node in (1..leaves).rev() {
            tree[node] = Self::play(cx, source, order, tree[2 * node], tree[2 * node + 1])?;
        }

        let mut ranked = Vec::with_capacity(len);
        while let Some(winner) = tree[1] {
            ranked.push(winner);
            let mut node = leaves + (winner - low);
            tree[node] = None;
            while node > 1 {
                node /= 2;
                tree[node] = Self::play(cx, source, order, tree[2 * node], tree[2 * node + 1])?;
            }
        }
        cx.arrange(source, low, &ranked)
    }
}

impl SortAlgorithm for TournamentSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::TournamentSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, Order::Descending)
    }
}
