//! Concrete algorithms, grouped by technique.
//!
//! - [`exchange`], [`insertion`], [`selection`]: elementary comparison sorts
//! - [`quick`]: partition schemes and the quicksort template
//! - [`merge`]: the merge template and its configurations
//! - [`distribution`], [`radix`]: bucket and digit based sorts
//! - [`network`]: data-oblivious comparator networks
//! - [`hybrid`]: introsort and Tim sort
//! - [`curious`]: randomised, joke and physical-model sorts

pub mod curious;
pub mod distribution;
pub mod exchange;
pub mod hybrid;
pub mod insertion;
pub mod merge;
pub mod network;
pub mod quick;
pub mod radix;
pub mod selection;
