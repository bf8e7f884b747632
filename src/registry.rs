//! Algorithm identities and the flyweight registry.
//!
//! Every algorithm has a stable kebab-case name and belongs to exactly one
//! family. The registry builds an instance the first time a name is resolved
//! and hands out the same `Arc` until [`Registry::evict_all`] is called.
//! Collaborators (the insertion sort a quicksort finishes with, the heap sort
//! introsort falls back to) are resolved through the registry as well, so
//! they are shared with direct lookups of the same name.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::algorithm::SortAlgorithm;
use crate::error::{Result, SortError};
use crate::sorts::curious::{
    BogoSort, BozoSort, CycleSort, GravitySort, SleepSort, SlowSort, SpaghettiSort, StalinSort, StoogeSort,
};
use crate::sorts::distribution::{BucketSort, CountingSort, FlashSort, PigeonholeSort, ThreeSlotBucketSort};
use crate::sorts::exchange::{BubbleSort, CircleSort, CocktailSort, CombSort, ExchangeSort, OddEvenSort};
use crate::sorts::hybrid::{IntroSort, TimSort};
use crate::sorts::insertion::{BinaryInsertSort, GnomeSort, InsertSort, LibrarySort, ShellSort, TreeSort};
use crate::sorts::merge::{BottomUpMergeSort, MergeSort, MultiWayMergeSort, StrandSort};
use crate::sorts::network::{BitonicSort, BitonicSortIter, OddEvenMergeSort, PairwiseSort, ShearSort};
use crate::sorts::quick::{AveragePivot, DualPivot, Hoare, LogPivot, Lomuto, QuickSort, RandomPivot, ThreeWay};
use crate::sorts::radix::{InPlaceRadixLsdSort, InPlaceRadixMsdSort, RadixLsdSort, RadixMsdSort};
use crate::sorts::selection::{
    DoubleSelectSort, HeapSort, KHeapSort, PancakeSort, SelectSort, SmoothSort, TournamentSort,
};

/// Algorithm family, addressed by a numeric type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Comparison = 1,
    Distribution = 2,
    Parallel = 3,
    Hybrid = 4,
    Curious = 5,
}

impl Family {
    pub const ALL: [Family; 5] =
        [Family::Comparison, Family::Distribution, Family::Parallel, Family::Hybrid, Family::Curious];

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Members of this family in catalog order.
    pub fn algorithms(self) -> impl Iterator<Item = AlgorithmId> {
        AlgorithmId::ALL.iter().copied().filter(move |id| id.family() == self)
    }

    fn slot(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for Family {
    type Error = SortError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Family::Comparison),
            2 => Ok(Family::Distribution),
            3 => Ok(Family::Parallel),
            4 => Ok(Family::Hybrid),
            5 => Ok(Family::Curious),
            _ => Err(SortError::UnknownFamily(tag)),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Comparison => "comparison",
            Family::Distribution => "distribution",
            Family::Parallel => "parallel",
            Family::Hybrid => "hybrid",
            Family::Curious => "curious",
        };
        f.write_str(name)
    }
}

macro_rules! catalog {
    ($($variant:ident => $name:literal, $family:ident;)*) => {
        /// Identity of every algorithm in the catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum AlgorithmId {
            $($variant,)*
        }

        impl AlgorithmId {
            pub const ALL: &'static [AlgorithmId] = &[$(AlgorithmId::$variant,)*];

            /// Stable lookup name.
            pub fn name(self) -> &'static str {
                match self {
                    $(AlgorithmId::$variant => $name,)*
                }
            }

            pub fn family(self) -> Family {
                match self {
                    $(AlgorithmId::$variant => Family::$family,)*
                }
            }

            pub fn from_name(name: &str) -> Option<AlgorithmId> {
                match name {
                    $($name => Some(AlgorithmId::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

catalog! {
    BubbleSort => "bubble-sort", Comparison;
    CocktailSort => "cocktail-sort", Comparison;
    CombSort => "comb-sort", Comparison;
    OddEvenSort => "odd-even-sort", Comparison;
    ExchangeSort => "exchange-sort", Comparison;
    CircleSort => "circle-sort", Comparison;
    CircleSortIter => "circle-sort-iter", Comparison;
    InsertSort => "insert-sort", Comparison;
    BinaryInsertSort => "binary-insert-sort", Comparison;
    ShellSort => "shell-sort", Comparison;
    GnomeSort => "gnome-sort", Comparison;
    LibrarySort => "library-sort", Comparison;
    TreeSort => "tree-sort", Comparison;
    SelectSort => "select-sort", Comparison;
    DoubleSelectSort => "double-select-sort", Comparison;
    HeapSort => "heap-sort", Comparison;
    KHeapSort => "k-heap-sort", Comparison;
    SmoothSort => "smooth-sort", Comparison;
    PancakeSort => "pancake-sort", Comparison;
    TournamentSort => "tournament-sort", Comparison;
    QuickSort => "quick-sort", Comparison;
    QuickSortIter => "quick-sort-iter", Comparison;
    TwoWayQuickSort => "two-way-quick-sort", Comparison;
    ThreeWayQuickSort => "three-way-quick-sort", Comparison;
    ThreeWayQuickSortIter => "three-way-quick-sort-iter", Comparison;
    DualPivotQuickSort => "dual-pivot-quick-sort", Comparison;
    DualPivotQuickSortIter => "dual-pivot-quick-sort-iter", Comparison;
    AveragePivotQuickSort => "average-pivot-quick-sort", Comparison;
    LogPivotQuickSort => "log-pivot-quick-sort", Comparison;
    RandomPivotQuickSort => "random-pivot-quick-sort", Comparison;
    MergeSort => "merge-sort", Comparison;
    MergeSortIter => "merge-sort-iter", Comparison;
    BottomUpMergeSort => "bottom-up-merge-sort", Comparison;
    InPlaceMergeSort => "in-place-merge-sort", Comparison;
    WeaveMergeSort => "weave-merge-sort", Comparison;
    MultiWayMergeSort => "multi-way-merge-sort", Comparison;
    StrandSort => "strand-sort", Comparison;
    CountingSort => "counting-sort", Distribution;
    PigeonholeSort => "pigeonhole-sort", Distribution;
    BucketSort => "bucket-sort", Distribution;
    FlashSort => "flash-sort", Distribution;
    ThreeSlotBucketSort => "three-slot-bucket-sort", Distribution;
    RadixLsdSort => "radix-lsd-sort", Distribution;
    RadixMsdSort => "radix-msd-sort", Distribution;
    RadixMsdSortIter => "radix-msd-sort-iter", Distribution;
    InPlaceRadixLsdSort => "in-place-radix-lsd-sort", Distribution;
    InPlaceRadixMsdSort => "in-place-radix-msd-sort", Distribution;
    BitonicSort => "bitonic-sort", Parallel;
    BitonicSortIter => "bitonic-sort-iter", Parallel;
    OddEvenMergeSort => "odd-even-merge-sort", Parallel;
    PairwiseSort => "pairwise-sort", Parallel;
    ShearSort => "shear-sort", Parallel;
    IntroSort => "intro-sort", Hybrid;
    TimSort => "tim-sort", Hybrid;
    HybridMergeSort => "hybrid-merge-sort", Hybrid;
    BogoSort => "bogo-sort", Curious;
    BozoSort => "bozo-sort", Curious;
    StalinSort => "stalin-sort", Curious;
    SleepSort => "sleep-sort", Curious;
    SlowSort => "slow-sort", Curious;
    StoogeSort => "stooge-sort", Curious;
    StoogeSortIter => "stooge-sort-iter", Curious;
    SpaghettiSort => "spaghetti-sort", Curious;
    GravitySort => "gravity-sort", Curious;
    CycleSort => "cycle-sort", Curious;
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AlgorithmId::from_name(s).ok_or_else(|| format!("unknown algorithm '{s}'"))
    }
}

type Instances = HashMap<AlgorithmId, Arc<dyn SortAlgorithm>>;

/// Name to instance cache, one sub-cache per family.
#[derive(Default)]
pub struct Registry {
    families: [Mutex<Instances>; 5],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` within the family addressed by `type_tag`.
    pub fn resolve(&self, type_tag: u8, name: &str) -> Result<Arc<dyn SortAlgorithm>> {
        let family = Family::try_from(type_tag)?;
        match AlgorithmId::from_name(name) {
            Some(id) if id.family() == family => Ok(self.resolve_id(id)),
            _ => Err(SortError::UnknownAlgorithm { family, name: name.to_string() }),
        }
    }

    /// Cached instance for `id`, built on first use.
    pub fn resolve_id(&self, id: AlgorithmId) -> Arc<dyn SortAlgorithm> {
        let cache = &self.families[id.family().slot()];
        if let Some(instance) = cache.lock().get(&id) {
            return Arc::clone(instance);
        }
        // built without the lock held: collaborators resolve through the same cache
        let built = self.build(id);
        log::debug!("built {} ({} family)", id, id.family());
        Arc::clone(cache.lock().entry(id).or_insert(built))
    }

    /// Drop every cached instance; the next lookup builds afresh.
    pub fn evict_all(&self) {
        let mut evicted = 0;
        for cache in &self.families {
            let mut instances = cache.lock();
            evicted += instances.len();
            instances.clear();
        }
        log::debug!("evicted {evicted} cached algorithm instances");
    }

    /// Number of instances currently cached.
    pub fn cached(&self) -> usize {
        self.families.iter().map(|cache| cache.lock().len()).sum()
    }

    pub fn is_cached(&self, id: AlgorithmId) -> bool {
        self.families[id.family().slot()].lock().contains_key(&id)
    }

    fn build(&self, id: AlgorithmId) -> Arc<dyn SortAlgorithm> {
        let insertion = || self.resolve_id(AlgorithmId::InsertSort);
        match id {
            AlgorithmId::BubbleSort => Arc::new(BubbleSort),
            AlgorithmId::CocktailSort => Arc::new(CocktailSort),
            AlgorithmId::CombSort => Arc::new(CombSort),
            AlgorithmId::OddEvenSort => Arc::new(OddEvenSort),
            AlgorithmId::ExchangeSort => Arc::new(ExchangeSort),
            AlgorithmId::CircleSort => Arc::new(CircleSort::recursive()),
            AlgorithmId::CircleSortIter => Arc::new(CircleSort::iterative()),
            AlgorithmId::InsertSort => Arc::new(InsertSort),
            AlgorithmId::BinaryInsertSort => Arc::new(BinaryInsertSort),
            AlgorithmId::ShellSort => Arc::new(ShellSort),
            AlgorithmId::GnomeSort => Arc::new(GnomeSort),
            AlgorithmId::LibrarySort => Arc::new(LibrarySort),
            AlgorithmId::TreeSort => Arc::new(TreeSort),
            AlgorithmId::SelectSort => Arc::new(SelectSort),
            AlgorithmId::DoubleSelectSort => Arc::new(DoubleSelectSort),
            AlgorithmId::HeapSort => Arc::new(HeapSort),
            AlgorithmId::KHeapSort => Arc::new(KHeapSort),
            AlgorithmId::SmoothSort => Arc::new(SmoothSort),
            AlgorithmId::PancakeSort => Arc::new(PancakeSort),
            AlgorithmId::TournamentSort => Arc::new(TournamentSort),
            AlgorithmId::QuickSort => Arc::new(QuickSort::new(id, Box::new(Lomuto), insertion())),
            AlgorithmId::QuickSortIter => Arc::new(QuickSort::iterative(id, Box::new(Lomuto), insertion())),
            AlgorithmId::TwoWayQuickSort => Arc::new(QuickSort::new(id, Box::new(Hoare), insertion())),
            AlgorithmId::ThreeWayQuickSort => Arc::new(QuickSort::new(id, Box::new(ThreeWay), insertion())),
            AlgorithmId::ThreeWayQuickSortIter => Arc::new(QuickSort::iterative(id, Box::new(ThreeWay), insertion())),
            AlgorithmId::DualPivotQuickSort => Arc::new(QuickSort::new(id, Box::new(DualPivot), insertion())),
            AlgorithmId::DualPivotQuickSortIter => Arc::new(QuickSort::iterative(id, Box::new(DualPivot), insertion())),
            AlgorithmId::AveragePivotQuickSort => Arc::new(QuickSort::new(id, Box::new(AveragePivot), insertion())),
            AlgorithmId::LogPivotQuickSort => Arc::new(QuickSort::new(id, Box::new(LogPivot), insertion())),
            AlgorithmId::RandomPivotQuickSort => Arc::new(QuickSort::new(id, Box::new(RandomPivot), insertion())),
            AlgorithmId::MergeSort => Arc::new(MergeSort::top_down()),
            AlgorithmId::MergeSortIter => Arc::new(MergeSort::iterative()),
            AlgorithmId::BottomUpMergeSort => Arc::new(BottomUpMergeSort),
            AlgorithmId::InPlaceMergeSort => Arc::new(MergeSort::in_place()),
            AlgorithmId::WeaveMergeSort => Arc::new(MergeSort::weave(insertion())),
            AlgorithmId::MultiWayMergeSort => Arc::new(MultiWayMergeSort),
            AlgorithmId::StrandSort => Arc::new(StrandSort),
            AlgorithmId::CountingSort => Arc::new(CountingSort),
            AlgorithmId::PigeonholeSort => Arc::new(PigeonholeSort),
            AlgorithmId::BucketSort => Arc::new(BucketSort::new(insertion())),
            AlgorithmId::FlashSort => Arc::new(FlashSort::new(insertion())),
            AlgorithmId::ThreeSlotBucketSort => Arc::new(ThreeSlotBucketSort),
            AlgorithmId::RadixLsdSort => Arc::new(RadixLsdSort),
            AlgorithmId::RadixMsdSort => Arc::new(RadixMsdSort::recursive()),
            AlgorithmId::RadixMsdSortIter => Arc::new(RadixMsdSort::iterative()),
            AlgorithmId::InPlaceRadixLsdSort => Arc::new(InPlaceRadixLsdSort),
            AlgorithmId::InPlaceRadixMsdSort => Arc::new(InPlaceRadixMsdSort),
            AlgorithmId::BitonicSort => Arc::new(BitonicSort),
            AlgorithmId::BitonicSortIter => Arc::new(BitonicSortIter),
            AlgorithmId::OddEvenMergeSort => Arc::new(OddEvenMergeSort),
            AlgorithmId::PairwiseSort => Arc::new(PairwiseSort),
            AlgorithmId::ShearSort => Arc::new(ShearSort::new(insertion())),
            AlgorithmId::IntroSort => Arc::new(IntroSort::new(
                Box::new(Hoare),
                insertion(),
                self.resolve_id(AlgorithmId::HeapSort),
            )),
            AlgorithmId::TimSort => Arc::new(TimSort::new(insertion())),
            AlgorithmId::HybridMergeSort => Arc::new(MergeSort::hybrid(insertion())),
            AlgorithmId::BogoSort => Arc::new(BogoSort),
            AlgorithmId::BozoSort => Arc::new(BozoSort),
            AlgorithmId::StalinSort => Arc::new(StalinSort),
            AlgorithmId::SleepSort => Arc::new(SleepSort::new(insertion())),
            AlgorithmId::SlowSort => Arc::new(SlowSort),
            AlgorithmId::StoogeSort => Arc::new(StoogeSort::recursive()),
            AlgorithmId::StoogeSortIter => Arc::new(StoogeSort::iterative()),
            AlgorithmId::SpaghettiSort => Arc::new(SpaghettiSort),
            AlgorithmId::GravitySort => Arc::new(GravitySort),
            AlgorithmId::CycleSort => Arc::new(CycleSort),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("cached", &self.cached()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_catalog_names_round_trip() {
        assert_eq!(AlgorithmId::ALL.len(), 65);
        for &id in AlgorithmId::ALL {
            assert_eq!(AlgorithmId::from_name(id.name()), Some(id));
            assert_eq!(id.to_string().parse::<AlgorithmId>().unwrap(), id);
            assert!(id.name().ends_with("-sort") || id.name().ends_with("-sort-iter"), "{id}");
        }
    }

    #[test]
    fn test_serde_uses_catalog_names() {
        for &id in AlgorithmId::ALL {
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", id.name()));
        }
        assert_eq!(serde_json::to_string(&Family::Parallel).unwrap(), "\"parallel\"");
    }

    #[test]
    fn test_family_sizes() {
        let sizes: Vec<usize> = Family::ALL.iter().map(|f| f.algorithms().count()).collect();
        assert_eq!(sizes, vec![37, 10, 5, 3, 10]);
    }

    #[test]
    fn test_every_algorithm_builds_with_its_own_id() {
        let registry = Registry::new();
        for &id in AlgorithmId::ALL {
            assert_eq!(registry.resolve_id(id).id(), id);
        }
        assert_eq!(registry.cached(), AlgorithmId::ALL.len());
    }

    #[test]
    fn test_flyweight_identity_and_eviction() {
        let registry = Registry::new();
        let first = registry.resolve(1, "insert-sort").unwrap();
        let second = registry.resolve(1, "insert-sort").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.evict_all();
        assert_eq!(registry.cached(), 0);
        let third = registry.resolve(1, "insert-sort").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_collaborators_are_shared() {
        let registry = Registry::new();
        registry.resolve(4, "intro-sort").unwrap();
        assert!(registry.is_cached(AlgorithmId::InsertSort));
        assert!(registry.is_cached(AlgorithmId::HeapSort));
        assert_eq!(registry.cached(), 3);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(255)]
    fn test_unknown_family(#[case] tag: u8) {
        let err = Registry::new().resolve(tag, "insert-sort").unwrap_err();
        assert!(matches!(err, SortError::UnknownFamily(t) if t == tag));
    }

    #[rstest]
    #[case(1, "bitonic-sort")]
    #[case(5, "quick-sort")]
    #[case(2, "no-such-sort")]
    fn test_unknown_algorithm_in_family(#[case] tag: u8, #[case] name: &str) {
        let err = Registry::new().resolve(tag, name).unwrap_err();
        assert!(matches!(err, SortError::UnknownAlgorithm { .. }), "{err}");
    }
}
