//! Instrumented primitive operations.
//!
//! Every value exchange in the crate goes through
//! [`SortContext::compare_and_swap`]; the derived helpers (`swap_if`,
//! `exchange`, `shift`, `permute`) are built on it, so the step counter is the
//! number of exchanges performed and every algorithm's trace is replayable.
//!
//! The context also owns the per-run [`Scratch`] arena. Algorithms take a
//! container for the duration of one call and hand it back; handing back
//! clears it, so a cached algorithm instance never sees leftovers from an
//! earlier run.

use std::mem;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::element::{Element, Snapshot, Tag};
use crate::error::Result;
use crate::options::SortOptions;

/// Receiver of emitted array states.
pub trait SnapshotSink: Send {
    /// Called after every visible mutation; an error aborts the algorithm.
    fn emit(&mut self, step_count: u64, elements: &[Element]) -> Result<()>;
}

/// Discards snapshots and only counts them.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub emitted: u64,
}

impl SnapshotSink for CountingSink {
    fn emit(&mut self, _step_count: u64, _elements: &[Element]) -> Result<()> {
        self.emitted += 1;
        Ok(())
    }
}

/// Keeps a copy of every snapshot.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotSink for RecordingSink {
    fn emit(&mut self, step_count: u64, elements: &[Element]) -> Result<()> {
        self.snapshots.push(Snapshot { step_count, elements: elements.to_vec() });
        Ok(())
    }
}

/// Explicit recursion frame for iterative variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub low: usize,
    pub high: usize,
    pub depth: usize,
    /// Set once the frame's children have been scheduled (post-order walks).
    pub expanded: bool,
}

impl Frame {
    pub fn new(low: usize, high: usize, depth: usize) -> Self {
        Frame { low, high, depth, expanded: false }
    }
}

/// Per-run scratch arena.
#[derive(Debug, Default)]
pub struct Scratch {
    indices: Vec<usize>,
    stack: Vec<Frame>,
    buckets: Vec<Vec<usize>>,
}

impl Scratch {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.stack.is_empty() && self.buckets.is_empty()
    }
}

/// State threaded through one algorithm run.
pub struct SortContext<'s> {
    sink: &'s mut dyn SnapshotSink,
    options: SortOptions,
    steps: u64,
    rng: StdRng,
    scratch: Scratch,
}

impl<'s> SortContext<'s> {
    /// Create a context seeded from OS entropy.
    pub fn new(sink: &'s mut dyn SnapshotSink, options: SortOptions) -> Self {
        Self::with_rng(sink, options, StdRng::from_entropy())
    }

    /// Create a context with a fixed seed for reproducible randomised runs.
    pub fn seeded(sink: &'s mut dyn SnapshotSink, options: SortOptions, seed: u64) -> Self {
        Self::with_rng(sink, options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sink: &'s mut dyn SnapshotSink, options: SortOptions, rng: StdRng) -> Self {
        SortContext { sink, options, steps: 0, rng, scratch: Scratch::default() }
    }

    /// Number of exchanges performed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub(crate) fn take_indices(&mut self) -> Vec<usize> {
        let mut indices = mem::take(&mut self.scratch.indices);
        indices.clear();
        indices
    }

    pub(crate) fn restore_indices(&mut self, mut indices: Vec<usize>) {
        indices.clear();
        self.scratch.indices = indices;
    }

    pub(crate) fn take_stack(&mut self) -> Vec<Frame> {
        let mut stack = mem::take(&mut self.scratch.stack);
        stack.clear();
        stack
    }

    pub(crate) fn restore_stack(&mut self, mut stack: Vec<Frame>) {
        stack.clear();
        self.scratch.stack = stack;
    }

    /// Take `count` empty bucket lists.
    pub(crate) fn take_buckets(&mut self, count: usize) -> Vec<Vec<usize>> {
        let mut buckets = mem::take(&mut self.scratch.buckets);
        buckets.clear();
        buckets.resize_with(count, Vec::new);
        buckets
    }

    pub(crate) fn restore_buckets(&mut self, mut buckets: Vec<Vec<usize>>) {
        buckets.clear();
        self.scratch.buckets = buckets;
    }

    #[inline]
    fn emit(&mut self, source: &[Element]) -> Result<()> {
        self.sink.emit(self.steps, source)
    }

    /// Flash one index: apply `tag`, then clear it. Does not advance the step count.
    pub fn highlight(&mut self, source: &mut [Element], index: usize, tag: Tag) -> Result<()> {
        source[index].tag = tag;
        self.emit(source)?;
        source[index].tag = Tag::Neutral;
        self.emit(source)
    }

    pub fn highlight_pair(
        &mut self,
        source: &mut [Element],
        first: usize,
        first_tag: Tag,
        second: usize,
        second_tag: Tag,
    ) -> Result<()> {
        self.highlight_many(source, &[(first, first_tag), (second, second_tag)])
    }

    pub fn highlight_many(&mut self, source: &mut [Element], marks: &[(usize, Tag)]) -> Result<()> {
        for &(index, tag) in marks {
            source[index].tag = tag;
        }
        self.emit(source)?;
        for &(index, _) in marks {
            source[index].tag = Tag::Neutral;
        }
        self.emit(source)
    }

    /// Show `i` and `j` being compared and exchange them if `should_swap`.
    ///
    /// Comparing an index with itself only flashes a highlight. Returns
    /// whether an exchange happened.
    #[allow(clippy::too_many_arguments)]
    pub fn compare_and_swap(
        &mut self,
        source: &mut [Element],
        i: usize,
        j: usize,
        should_swap: bool,
        before: Tag,
        after: Tag,
        neutral: Tag,
    ) -> Result<bool> {
        if i == j {
            self.highlight(source, i, before)?;
            return Ok(false);
        }

        source[i].tag = before;
        source[j].tag = before;
        self.emit(source)?;

        if should_swap {
            source.swap(i, j);
            self.steps += 1;
            source[i].tag = after;
            source[j].tag = after;
            self.emit(source)?;
        }

        source[i].tag = neutral;
        source[j].tag = neutral;
        self.emit(source)?;
        Ok(should_swap)
    }

    /// `compare_and_swap` with the default compare/exchange tags.
    #[inline]
    pub fn swap_if(&mut self, source: &mut [Element], i: usize, j: usize, should_swap: bool) -> Result<bool> {
        self.compare_and_swap(source, i, j, should_swap, Tag::Compare, Tag::Exchange, Tag::Neutral)
    }

    /// Unconditional exchange; a no-op highlight when `i == j`.
    #[inline]
    pub fn exchange(&mut self, source: &mut [Element], i: usize, j: usize) -> Result<()> {
        self.swap_if(source, i, j, i != j).map(|_| ())
    }

    /// Move the element at `from` to `to` by adjacent exchanges, shifting the
    /// elements in between by one slot. Stable.
    pub fn shift(&mut self, source: &mut [Element], from: usize, to: usize) -> Result<()> {
        if from > to {
            for k in (to..from).rev() {
                self.exchange(source, k, k + 1)?;
            }
        } else {
            for k in from..to {
                self.exchange(source, k, k + 1)?;
            }
        }
        Ok(())
    }

    /// Apply a destination map to `source[low..low + targets.len()]`.
    ///
    /// `targets[k]` is the absolute destination of the element currently at
    /// `low + k` and must be a permutation of that range. Cycles are followed
    /// so each exchange settles at least one element; an identity map costs no
    /// exchanges. `targets` is consumed (left as the identity).
    pub fn permute(&mut self, source: &mut [Element], low: usize, targets: &mut [usize]) -> Result<()> {
        for k in 0..targets.len() {
            while targets[k] != low + k {
                let target = targets[k];
                self.exchange(source, low + k, target)?;
                targets.swap(k, target - low);
            }
        }
        Ok(())
    }

    /// Move the element at `ranked[r]` to `low + r` for every rank `r`.
    ///
    /// `ranked` must list each index of `low..low + ranked.len()` once.
    pub fn arrange(&mut self, source: &mut [Element], low: usize, ranked: &[usize]) -> Result<()> {
        let mut targets = self.take_indices();
        targets.resize(ranked.len(), 0);
        for (rank, &index) in ranked.iter().enumerate() {
            targets[index - low] = low + rank;
        }
        let result = self.permute(source, low, &mut targets);
        self.restore_indices(targets);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{elements_from, values_of};

    fn context(sink: &mut dyn SnapshotSink) -> SortContext<'_> {
        SortContext::seeded(sink, SortOptions::default(), 7)
    }

    #[test]
    fn test_highlight_emits_two_snapshots_without_steps() {
        let mut sink = RecordingSink::default();
        let mut data = elements_from(&[3, 1]);
        let mut cx = context(&mut sink);
        cx.highlight(&mut data, 1, Tag::Pivot).unwrap();
        assert_eq!(cx.steps(), 0);
        drop(cx);
        assert_eq!(sink.snapshots.len(), 2);
        assert_eq!(sink.snapshots[0].elements[1].tag, Tag::Pivot);
        assert_eq!(sink.snapshots[1].elements[1].tag, Tag::Neutral);
    }

    #[test]
    fn test_compare_and_swap_counts_only_swaps() {
        let mut sink = RecordingSink::default();
        let mut data = elements_from(&[3, 1, 2]);
        let mut cx = context(&mut sink);
        assert!(cx.swap_if(&mut data, 0, 1, true).unwrap());
        assert!(!cx.swap_if(&mut data, 1, 2, false).unwrap());
        assert!(!cx.swap_if(&mut data, 2, 2, true).unwrap());
        assert_eq!(cx.steps(), 1);
        drop(cx);
        // swap: 3 snapshots, compare only: 2, self-compare: 2
        assert_eq!(sink.snapshots.len(), 7);
        assert_eq!(sink.snapshots[1].elements[0].tag, Tag::Exchange);
        assert_eq!(sink.snapshots[1].step_count, 1);
        assert_eq!(values_of(&data), vec![1, 3, 2]);
    }

    #[test]
    fn test_shift_both_directions() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[1, 2, 3, 4, 5]);
        let mut cx = context(&mut sink);
        cx.shift(&mut data, 4, 1).unwrap();
        assert_eq!(values_of(&data), vec![1, 5, 2, 3, 4]);
        cx.shift(&mut data, 1, 4).unwrap();
        assert_eq!(values_of(&data), vec![1, 2, 3, 4, 5]);
        assert_eq!(cx.steps(), 6);
    }

    #[test]
    fn test_permute_applies_destinations() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[9, 30, 10, 20]);
        let mut cx = context(&mut sink);
        // elements at 1..=3 go to 3, 1, 2
        let mut targets = vec![3, 1, 2];
        cx.permute(&mut data, 1, &mut targets).unwrap();
        assert_eq!(values_of(&data), vec![9, 10, 20, 30]);
        assert_eq!(cx.steps(), 2);
    }

    #[test]
    fn test_permute_identity_is_free() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[1, 2, 3]);
        let mut cx = context(&mut sink);
        let mut targets = vec![0, 1, 2];
        cx.permute(&mut data, 0, &mut targets).unwrap();
        assert_eq!(cx.steps(), 0);
        drop(cx);
        assert_eq!(sink.emitted, 0);
    }

    #[test]
    fn test_arrange_by_rank() {
        let mut sink = CountingSink::default();
        let mut data = elements_from(&[7, 40, 20, 30, 10]);
        let mut cx = context(&mut sink);
        cx.arrange(&mut data, 1, &[4, 2, 3, 1]).unwrap();
        assert_eq!(values_of(&data), vec![7, 10, 20, 30, 40]);
        assert!(cx.scratch().is_empty());
    }

    #[test]
    fn test_scratch_is_cleared_on_restore() {
        let mut sink = CountingSink::default();
        let mut cx = context(&mut sink);
        let mut indices = cx.take_indices();
        indices.extend([4, 5, 6]);
        cx.restore_indices(indices);
        let mut buckets = cx.take_buckets(3);
        buckets[1].push(2);
        cx.restore_buckets(buckets);
        let mut stack = cx.take_stack();
        stack.push(Frame::new(0, 4, 0));
        cx.restore_stack(stack);
        assert!(cx.scratch().is_empty());
    }
}
