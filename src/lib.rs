//! Instrumented sorting algorithms.
//!
//! Every algorithm in the catalog sorts an array of [`Element`]s in place and
//! reports each comparison and exchange as a [`Snapshot`] of the whole array,
//! so a renderer can replay the run step by step. Algorithms are looked up by
//! family tag and name through the flyweight [`Registry`] and started with
//! [`driver::run`], which streams snapshots from a worker thread.
//!
//! ```no_run
//! use sortviz::{driver, elements_from, Order, Registry, RunConfig, SortOptions};
//!
//! let registry = Registry::new();
//! let quick = registry.resolve(1, "quick-sort")?;
//! let stream = driver::run(quick, elements_from(&[3, 1, 2]), Order::Ascending, SortOptions::default(), RunConfig::default())?;
//! for snapshot in stream {
//!     println!("{:?}", snapshot?.step_count);
//! }
//! # Ok::<(), sortviz::SortError>(())
//! ```

pub mod algorithm;
pub mod context;
pub mod driver;
pub mod element;
pub mod error;
pub mod options;
pub mod registry;
pub mod report;
pub mod sorts;

pub use algorithm::{BucketSource, PartitionResult, Partitioner, SortAlgorithm};
pub use context::{CountingSink, RecordingSink, SnapshotSink, SortContext};
pub use driver::{RunConfig, RunOutcome, RunStats, SnapshotStream};
pub use element::{elements_from, is_sorted, values_of, Element, IndexRange, Order, Snapshot, Tag};
pub use error::{Result, SortError};
pub use options::{HeapArity, MergeFanout, RadixBase, SortOptions};
pub use registry::{AlgorithmId, Family, Registry};
