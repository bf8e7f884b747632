//! Insertion-family sorts.
//!
//! `InsertSort` is also the small-range finisher composed into quicksort,
//! bucket sort, flash sort, Tim sort and friends, so its range form must work
//! on any `low..=high` window of a larger array.

use crate::algorithm::SortAlgorithm;
use crate::context::SortContext;
use crate::element::{Element, Order, Tag};
use crate::error::Result;
use crate::registry::AlgorithmId;

#[derive(Debug, Default)]
pub struct InsertSort;

impl SortAlgorithm for InsertSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::InsertSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in low + 1..=high {
            let mut j = i;
            while j > low {
                let out_of_order = source[j - 1].value > source[j].value;
                cx.swap_if(source, j - 1, j, out_of_order)?;
                if !out_of_order {
                    break;
                }
                j -= 1;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        // grows a sorted suffix leftwards
        for i in (low..high).rev() {
            let mut j = i;
            while j < high {
                let out_of_order = source[j + 1].value > source[j].value;
                cx.swap_if(source, j, j + 1, out_of_order)?;
                if !out_of_order {
                    break;
                }
                j += 1;
            }
        }
        Ok(())
    }
}

/// Insertion sort with a binary search for the insertion point.
#[derive(Debug, Default)]
pub struct BinaryInsertSort;

impl SortAlgorithm for BinaryInsertSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::BinaryInsertSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in low + 1..=high {
            let value = source[i].value;
            let (mut lo, mut hi) = (low, i);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                cx.highlight_pair(source, mid, Tag::Compare, i, Tag::Cursor)?;
                if source[mid].value <= value {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
            cx.shift(source, i, lo)?;
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for i in (low..high).rev() {
            let value = source[i].value;
            let (mut lo, mut hi) = (i + 1, high + 1);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                cx.highlight_pair(source, mid, Tag::Compare, i, Tag::Cursor)?;
                if source[mid].value > value {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
            cx.shift(source, i, lo - 1)?;
        }
        Ok(())
    }
}

/// Shell sort over Knuth's `3h + 1` gaps.
#[derive(Debug, Default)]
pub struct ShellSort;

fn knuth_gaps(len: usize) -> Vec<usize> {
    let mut gaps = vec![1];
    while let Some(&last) = gaps.last() {
        let next = 3 * last + 1;
        if next >= len {
            break;
        }
        gaps.push(next);
    }
    gaps.reverse();
    gaps
}

impl SortAlgorithm for ShellSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::ShellSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for gap in knuth_gaps(high - low + 1) {
            for i in low + gap..=high {
                let mut j = i;
                while j >= low + gap {
                    let out_of_order = source[j - gap].value > source[j].value;
                    cx.swap_if(source, j - gap, j, out_of_order)?;
                    if !out_of_order {
                        break;
                    }
                    j -= gap;
                }
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        for gap in knuth_gaps(high - low + 1) {
            if gap > high - low {
                continue;
            }
            for i in (low..=high - gap).rev() {
                let mut j = i;
                while j + gap <= high {
                    let out_of_order = source[j + gap].value > source[j].value;
                    cx.swap_if(source, j, j + gap, out_of_order)?;
                    if !out_of_order {
                        break;
                    }
                    j += gap;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GnomeSort;

impl SortAlgorithm for GnomeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::GnomeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        let mut pos = low + 1;
        while pos <= high {
            if pos == low {
                pos += 1;
                continue;
            }
            let out_of_order = source[pos - 1].value > source[pos].value;
            if cx.swap_if(source, pos - 1, pos, out_of_order)? {
                pos -= 1;
            } else {
                pos += 1;
            }
        }
        Ok(())
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        // `pos` is the left slot of the pair under inspection
        let mut pos = high as isize - 1;
        while pos >= low as isize {
            let left = pos as usize;
            if left == high {
                pos -= 1;
                continue;
            }
            let out_of_order = source[left + 1].value > source[left].value;
            if cx.swap_if(source, left, left + 1, out_of_order)? {
                pos += 1;
            } else {
                pos -= 1;
            }
        }
        Ok(())
    }
}

/// Library sort: insertion into a gapped shelf that is respaced whenever the
/// number of shelved elements reaches a power of two.
#[derive(Debug, Default)]
pub struct LibrarySort;

impl LibrarySort {
    fn shelve(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, order: Order) -> Result<()> {
        let len = high - low + 1;
        let mut shelf: Vec<Option<usize>> = vec![None; 2 * len];
        shelf[0] = Some(low);
        let mut shelved: usize = 1;

        for current in low + 1..=high {
            let value = source[current].value;
            let (mut lo, mut hi) = (0, shelf.len());
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                let mut probe = mid;
                while probe < hi && shelf[probe].is_none() {
                    probe += 1;
                }
                let Some(index) = shelf.get(probe).copied().flatten().filter(|_| probe < hi) else {
                    hi = mid;
                    continue;
                };
                cx.highlight_pair(source, index, Tag::Compare, current, Tag::Cursor)?;
                if order.precedes(source[index].value, value) {
                    lo = probe + 1;
                } else {
                    hi = mid;
                }
            }
            Self::place(&mut shelf, lo, current);
            shelved += 1;
            if shelved.is_power_of_two() {
                Self::respace(&mut shelf);
            }
        }

        let ranked: Vec<usize> = shelf.into_iter().flatten().collect();
        cx.arrange(source, low, &ranked)
    }

    /// Put `index` between the occupants before and from `slot`, borrowing
    /// the nearest gap.
    fn place(shelf: &mut [Option<usize>], slot: usize, index: usize) {
        if slot < shelf.len() && shelf[slot].is_none() {
            shelf[slot] = Some(index);
            return;
        }
        if let Some(gap) = (slot..shelf.len()).find(|&g| shelf[g].is_none()) {
            shelf[slot..=gap].rotate_right(1);
            shelf[slot] = Some(index);
        } else if let Some(gap) = (0..slot).rev().find(|&g| shelf[g].is_none()) {
            shelf[gap..slot].rotate_left(1);
            shelf[slot - 1] = Some(index);
        }
    }

    /// Spread the occupants out so every one is followed by a gap.
    fn respace(shelf: &mut [Option<usize>]) {
        let occupants: Vec<usize> = shelf.iter().flatten().copied().collect();
        shelf.fill(None);
        for (k, index) in occupants.into_iter().enumerate() {
            shelf[2 * k] = Some(index);
        }
    }
}

impl SortAlgorithm for LibrarySort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::LibrarySort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::shelve(cx, source, low, high, Order::Ascending)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::shelve(cx, source, low, high, Order::Descending)
    }
}

/// Binary search tree sort; the in-order walk gives the final ranks.
#[derive(Debug, Default)]
pub struct TreeSort;

#[derive(Debug)]
struct Node {
    index: usize,
    left: Option<usize>,
    right: Option<usize>,
}

impl TreeSort {
    fn build(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<Vec<Node>> {
        let mut nodes = Vec::with_capacity(high - low + 1);
        nodes.push(Node { index: low, left: None, right: None });
        for current in low + 1..=high {
            let value = source[current].value;
            let mut at = 0;
            loop {
                let index = nodes[at].index;
                cx.highlight_pair(source, index, Tag::Compare, current, Tag::Cursor)?;
                let next = if value < source[index].value { nodes[at].left } else { nodes[at].right };
                match next {
                    Some(child) => at = child,
                    None => {
                        let id = nodes.len();
                        if value < source[index].value {
                            nodes[at].left = Some(id);
                        } else {
                            nodes[at].right = Some(id);
                        }
                        nodes.push(Node { index: current, left: None, right: None });
                        break;
                    }
                }
            }
        }
        Ok(nodes)
    }

    /// In-order walk; `reverse` visits right subtrees first.
    fn walk(nodes: &[Node], reverse: bool) -> Vec<usize> {
        let mut ranked = Vec::with_capacity(nodes.len());
        let mut pending = Vec::new();
        let mut at = Some(0);
        while at.is_some() || !pending.is_empty() {
            while let Some(node) = at {
                pending.push(node);
                at = if reverse { nodes[node].right } else { nodes[node].left };
            }
            if let Some(node) = pending.pop() {
                ranked.push(nodes[node].index);
                at = if reverse { nodes[node].left } else { nodes[node].right };
            }
        }
        ranked
    }

    fn run(cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize, reverse: bool) -> Result<()> {
        let nodes = Self::build(cx, source, low, high)?;
        let ranked = Self::walk(&nodes, reverse);
        cx.arrange(source, low, &ranked)
    }
}

impl SortAlgorithm for TreeSort {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::TreeSort
    }

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, false)
    }

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize) -> Result<()> {
        Self::run(cx, source, low, high, true)
    }
}
