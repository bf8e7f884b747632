//! Run driver: executes one algorithm on a worker thread and streams its
//! snapshots back through a bounded channel.
//!
//! The worker blocks on every emission while the channel is full, so a slow
//! consumer throttles the algorithm. Dropping the [`SnapshotStream`]
//! disconnects the channel; the worker's next emission fails with
//! [`SortError::Cancelled`] and the run unwinds.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::algorithm::SortAlgorithm;
use crate::context::{CountingSink, SnapshotSink, SortContext};
use crate::element::{Element, Order, Snapshot};
use crate::error::{Result, SortError};
use crate::options::SortOptions;
use crate::registry::{AlgorithmId, Registry};

/// Default number of snapshots buffered between worker and consumer.
pub const DEFAULT_CAPACITY: usize = 16;

/// Driver settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Snapshots buffered before the worker blocks
    pub capacity: usize,
    /// Pause after every emitted snapshot
    pub throttle: Option<Duration>,
    /// Seed for randomised algorithms; entropy when unset
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig { capacity: DEFAULT_CAPACITY, throttle: None, seed: None }
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub algorithm: AlgorithmId,
    pub order: Order,
    pub elements: Vec<Element>,
    pub step_count: u64,
    pub snapshots: u64,
}

/// Counters of a headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub step_count: u64,
    pub snapshots: u64,
}

enum StreamEvent {
    Snapshot(Snapshot),
    Completed(RunOutcome),
    Failed(SortError),
}

/// Forwards snapshots into the run channel.
struct ChannelSink {
    tx: Sender<StreamEvent>,
    throttle: Option<Duration>,
    emitted: u64,
}

impl SnapshotSink for ChannelSink {
    fn emit(&mut self, step_count: u64, elements: &[Element]) -> Result<()> {
        let snapshot = Snapshot { step_count, elements: elements.to_vec() };
        self.tx.send(StreamEvent::Snapshot(snapshot)).map_err(|_| SortError::Cancelled)?;
        self.emitted += 1;
        if let Some(delay) = self.throttle {
            thread::sleep(delay);
        }
        Ok(())
    }
}

fn context(sink: &mut dyn SnapshotSink, options: SortOptions, seed: Option<u64>) -> SortContext<'_> {
    match seed {
        Some(seed) => SortContext::seeded(sink, options, seed),
        None => SortContext::new(sink, options),
    }
}

fn work(
    algorithm: Arc<dyn SortAlgorithm>,
    mut elements: Vec<Element>,
    order: Order,
    options: SortOptions,
    config: RunConfig,
    tx: Sender<StreamEvent>,
) {
    let mut sink = ChannelSink { tx: tx.clone(), throttle: config.throttle, emitted: 0 };
    let result = {
        let mut cx = context(&mut sink, options, config.seed);
        algorithm.sort(&mut cx, &mut elements, order).map(|()| cx.steps())
    };

    let event = match result {
        Ok(step_count) => {
            log::debug!("{} finished {order}: {step_count} steps, {} snapshots", algorithm.id(), sink.emitted);
            StreamEvent::Completed(RunOutcome {
                algorithm: algorithm.id(),
                order,
                elements,
                step_count,
                snapshots: sink.emitted,
            })
        }
        Err(SortError::Cancelled) => {
            log::debug!("{} cancelled after {} snapshots", algorithm.id(), sink.emitted);
            return;
        }
        Err(e) => {
            log::warn!("{} failed: {e}", algorithm.id());
            StreamEvent::Failed(e)
        }
    };
    // the consumer may already be gone
    let _ = tx.send(event);
}

/// Start `algorithm` on a worker thread.
///
/// The stream yields every snapshot in emission order, then ends; a failed
/// run yields one error as its last item.
pub fn run(
    algorithm: Arc<dyn SortAlgorithm>,
    elements: Vec<Element>,
    order: Order,
    options: SortOptions,
    config: RunConfig,
) -> Result<SnapshotStream> {
    let (tx, rx) = crossbeam_channel::bounded(config.capacity);
    log::debug!("starting {} {order} on {} elements ({options})", algorithm.id(), elements.len());
    let worker = thread::Builder::new()
        .name(format!("sort-{}", algorithm.id()))
        .spawn(move || work(algorithm, elements, order, options, config, tx))
        .map_err(|e| SortError::Worker(e.to_string()))?;
    Ok(SnapshotStream { rx, worker: Some(worker), outcome: None, finished: false })
}

/// Resolve `name` in family `type_tag` and start it.
pub fn run_named(
    registry: &Registry,
    type_tag: u8,
    name: &str,
    elements: Vec<Element>,
    order: Order,
    options: SortOptions,
    config: RunConfig,
) -> Result<SnapshotStream> {
    let algorithm = registry.resolve(type_tag, name)?;
    run(algorithm, elements, order, options, config)
}

/// Run synchronously on the calling thread, counting snapshots only.
pub fn execute(
    algorithm: &dyn SortAlgorithm,
    elements: &mut [Element],
    order: Order,
    options: SortOptions,
    seed: Option<u64>,
) -> Result<RunStats> {
    let mut sink = CountingSink::default();
    let step_count = {
        let mut cx = context(&mut sink, options, seed);
        algorithm.sort(&mut cx, elements, order)?;
        cx.steps()
    };
    Ok(RunStats { step_count, snapshots: sink.emitted })
}

/// Consumer side of a run.
pub struct SnapshotStream {
    rx: Receiver<StreamEvent>,
    worker: Option<JoinHandle<()>>,
    outcome: Option<RunOutcome>,
    finished: bool,
}

impl SnapshotStream {
    /// Final state, available once the stream has ended successfully.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Drain the remaining snapshots and return the outcome.
    pub fn wait(mut self) -> Result<RunOutcome> {
        for item in self.by_ref() {
            item?;
        }
        self.outcome.take().ok_or_else(|| SortError::Worker("run ended without an outcome".to_string()))
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("sort worker panicked");
            }
        }
    }
}

impl Iterator for SnapshotStream {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.rx.recv() {
            Ok(StreamEvent::Snapshot(snapshot)) => Some(Ok(snapshot)),
            Ok(StreamEvent::Completed(outcome)) => {
                self.finished = true;
                self.outcome = Some(outcome);
                self.join();
                None
            }
            Ok(StreamEvent::Failed(e)) => {
                self.finished = true;
                self.join();
                Some(Err(e))
            }
            Err(_) => {
                self.finished = true;
                self.join();
                Some(Err(SortError::Worker("worker exited without reporting".to_string())))
            }
        }
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        // disconnect first so a blocked worker wakes up and cancels
        drop(std::mem::replace(&mut self.rx, crossbeam_channel::never()));
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{elements_from, is_sorted, values_of};
    use crate::registry::Family;
    use crate::sorts::curious::GravitySort;
    use crate::sorts::exchange::BubbleSort;
    use crate::sorts::insertion::InsertSort;

    #[test]
    fn test_stream_yields_snapshots_then_outcome() {
        let values = [5, 3, 8, 1, 9, 2];
        let mut stream = run(
            Arc::new(BubbleSort),
            elements_from(&values),
            Order::Ascending,
            SortOptions::default(),
            RunConfig::default(),
        )
        .unwrap();

        let snapshots: Vec<Snapshot> = stream.by_ref().map(|s| s.unwrap()).collect();
        let outcome = stream.outcome().unwrap().clone();
        assert_eq!(outcome.algorithm, AlgorithmId::BubbleSort);
        assert_eq!(values_of(&outcome.elements), vec![1, 2, 3, 5, 8, 9]);
        assert_eq!(outcome.snapshots, snapshots.len() as u64);
        assert_eq!(snapshots.last().unwrap().step_count, outcome.step_count);
        assert!(snapshots.windows(2).all(|w| w[0].step_count <= w[1].step_count));
    }

    #[test]
    fn test_stream_matches_headless_execution() {
        let values: Vec<i32> = (0..30).map(|i| (i * 7) % 30).collect();
        let outcome = run(
            Arc::new(InsertSort),
            elements_from(&values),
            Order::Descending,
            SortOptions::default(),
            RunConfig { capacity: 1, ..RunConfig::default() },
        )
        .unwrap()
        .wait()
        .unwrap();

        let mut data = elements_from(&values);
        let stats = execute(&InsertSort, &mut data, Order::Descending, SortOptions::default(), None).unwrap();
        assert_eq!(stats.step_count, outcome.step_count);
        assert_eq!(stats.snapshots, outcome.snapshots);
        assert!(is_sorted(&outcome.elements, Order::Descending));
    }

    #[test]
    fn test_dropping_stream_cancels_worker() {
        let values: Vec<i32> = (0..200).rev().collect();
        let mut stream = run(
            Arc::new(BubbleSort),
            elements_from(&values),
            Order::Ascending,
            SortOptions::default(),
            RunConfig { capacity: 2, ..RunConfig::default() },
        )
        .unwrap();
        for _ in 0..5 {
            stream.next().unwrap().unwrap();
        }
        // returns once the worker has observed the disconnect
        drop(stream);
    }

    #[test]
    fn test_failure_is_last_item() {
        let mut stream = run(
            Arc::new(GravitySort),
            elements_from(&[0, i32::MAX]),
            Order::Ascending,
            SortOptions::default(),
            RunConfig::default(),
        )
        .unwrap();
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, SortError::SpanTooWide { .. }));
        assert!(stream.next().is_none());
        assert!(stream.outcome().is_none());
    }

    #[test]
    fn test_single_element_completes_without_snapshots() {
        let outcome = run(
            Arc::new(BubbleSort),
            elements_from(&[4]),
            Order::Ascending,
            SortOptions::default(),
            RunConfig::default(),
        )
        .unwrap()
        .wait()
        .unwrap();
        assert_eq!(outcome.snapshots, 0);
        assert_eq!(outcome.step_count, 0);
    }

    #[test]
    fn test_run_named_resolves_through_registry() {
        let registry = Registry::new();
        let outcome = run_named(
            &registry,
            Family::Hybrid.tag(),
            "tim-sort",
            elements_from(&[3, 1, 2]),
            Order::Ascending,
            SortOptions::default(),
            RunConfig::default(),
        )
        .unwrap()
        .wait()
        .unwrap();
        assert_eq!(values_of(&outcome.elements), vec![1, 2, 3]);

        let err = run_named(
            &registry,
            9,
            "tim-sort",
            Vec::new(),
            Order::Ascending,
            SortOptions::default(),
            RunConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SortError::UnknownFamily(9)));
    }
}
