//! Capability traits implemented by the concrete algorithms.
//!
//! Rather than a class chain, each algorithm implements [`SortAlgorithm`] and
//! composes whichever helpers it needs: a [`Partitioner`] for the quicksort
//! family, a [`BucketSource`] for distribution sorts, and other algorithms as
//! collaborators injected at construction.

use std::fmt;

use crate::context::SortContext;
use crate::element::{Element, IndexRange, Order};
use crate::error::Result;
use crate::registry::AlgorithmId;

/// Ascending and descending entry points of one algorithm.
///
/// `low` and `high` are inclusive and `low <= high` on entry.
pub trait SortAlgorithm: Send + Sync + fmt::Debug {
    fn id(&self) -> AlgorithmId;

    fn sort_ascending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize)
        -> Result<()>;

    fn sort_descending(&self, cx: &mut SortContext<'_>, source: &mut [Element], low: usize, high: usize)
        -> Result<()>;

    /// Sort a sub-range on behalf of a composing algorithm.
    fn sort_range(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<()> {
        if high <= low {
            return Ok(());
        }
        match order {
            Order::Ascending => self.sort_ascending(cx, source, low, high),
            Order::Descending => self.sort_descending(cx, source, low, high),
        }
    }

    /// Sort the whole array.
    fn sort(&self, cx: &mut SortContext<'_>, source: &mut [Element], order: Order) -> Result<()> {
        if source.len() < 2 {
            return Ok(());
        }
        let high = source.len() - 1;
        match order {
            Order::Ascending => self.sort_ascending(cx, source, 0, high)?,
            Order::Descending => self.sort_descending(cx, source, 0, high)?,
        }
        debug_assert!(cx.scratch().is_empty(), "{} left scratch behind", self.id());
        Ok(())
    }
}

/// Outcome of one quicksort partitioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionResult {
    /// Pivot settled at `mid`; recurse on both sides of it.
    Pivot { mid: usize },
    /// No pivot element; `mid` is the first index of the right side.
    Boundary { mid: usize },
    /// Elements equal to the pivot occupy `low..=high`; only the strict sides recurse.
    Equal { low: usize, high: usize },
    /// Two pivots settled at `low` and `high`; all three regions recurse.
    Between { low: usize, high: usize },
}

impl PartitionResult {
    /// Non-empty sub-ranges left to sort, left to right.
    pub fn subranges(&self, start: usize, end: usize) -> Vec<IndexRange> {
        let mut ranges = Vec::with_capacity(3);
        let mut push = |from: usize, to: Option<usize>| {
            if let Some(to) = to {
                if from <= to {
                    ranges.push(IndexRange::new(from, to));
                }
            }
        };
        match *self {
            PartitionResult::Pivot { mid } => {
                push(start, mid.checked_sub(1));
                push(mid + 1, Some(end));
            }
            PartitionResult::Boundary { mid } => {
                push(start, mid.checked_sub(1));
                push(mid, Some(end));
            }
            PartitionResult::Equal { low, high } => {
                push(start, low.checked_sub(1));
                push(high + 1, Some(end));
            }
            PartitionResult::Between { low, high } => {
                push(start, low.checked_sub(1));
                push(low + 1, high.checked_sub(1));
                push(high + 1, Some(end));
            }
        }
        ranges
    }
}

/// Quicksort partition scheme, one method per direction.
pub trait Partitioner: Send + Sync + fmt::Debug {
    fn partition_ascending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult>;

    fn partition_descending(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
    ) -> Result<PartitionResult>;

    fn partition(
        &self,
        cx: &mut SortContext<'_>,
        source: &mut [Element],
        low: usize,
        high: usize,
        order: Order,
    ) -> Result<PartitionResult> {
        match order {
            Order::Ascending => self.partition_ascending(cx, source, low, high),
            Order::Descending => self.partition_descending(cx, source, low, high),
        }
    }
}

/// Pure bucket-key function used by the distribution template.
pub trait BucketSource {
    /// Number of distinct keys.
    fn bucket_count(&self) -> usize;

    /// Key of `element` in `0..bucket_count()`, ascending with value.
    fn bucket_of(&self, element: &Element) -> usize;
}
