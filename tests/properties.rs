//! Catalog-wide properties: every algorithm, both orders, through the registry.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use sortviz::sorts::quick::dutch_flag;
use sortviz::sorts::radix::{Digits, RadixLsdSort};
use sortviz::{
    driver, elements_from, is_sorted, values_of, AlgorithmId, CountingSink, Family, Order, PartitionResult,
    RecordingSink, Registry, RunConfig, SortAlgorithm, SortContext, SortError, SortOptions,
};

const SEED: u64 = 0x5eed;

/// Input length each algorithm finishes quickly on.
fn test_len(id: AlgorithmId) -> usize {
    match id {
        AlgorithmId::BogoSort | AlgorithmId::BozoSort => 6,
        AlgorithmId::SlowSort => 20,
        _ => 40,
    }
}

fn inputs(len: usize) -> Vec<Vec<i32>> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let random: Vec<i32> = (0..len).map(|_| rng.gen_range(-50..50)).collect();
    let few_keys: Vec<i32> = (0..len).map(|_| rng.gen_range(0..3)).collect();
    let ascending: Vec<i32> = (0..len as i32).collect();
    let descending: Vec<i32> = ascending.iter().rev().copied().collect();
    vec![random, few_keys, ascending, descending, vec![7; len], vec![2, 1], vec![1], vec![]]
}

fn sort_with(algorithm: &dyn SortAlgorithm, values: &[i32], order: Order, options: SortOptions) -> (Vec<i32>, u64) {
    let mut sink = CountingSink::default();
    let mut data = elements_from(values);
    let steps = {
        let mut cx = SortContext::seeded(&mut sink, options, SEED);
        algorithm.sort(&mut cx, &mut data, order).unwrap();
        assert!(cx.scratch().is_empty(), "{} left scratch behind", algorithm.id());
        cx.steps()
    };
    (values_of(&data), steps)
}

fn sorted_copy(values: &[i32], order: Order) -> Vec<i32> {
    let mut expected = values.to_vec();
    expected.sort();
    if order == Order::Descending {
        expected.reverse();
    }
    expected
}

#[rstest]
fn every_algorithm_sorts_every_input(#[values(Order::Ascending, Order::Descending)] order: Order) {
    let registry = Registry::new();
    for &id in AlgorithmId::ALL {
        let algorithm = registry.resolve(id.family().tag(), id.name()).unwrap();
        for values in inputs(test_len(id)) {
            let (sorted, _) = sort_with(algorithm.as_ref(), &values, order, SortOptions::default());
            assert_eq!(sorted, sorted_copy(&values, order), "{id} {order} on {values:?}");
        }
    }
}

#[rstest]
#[case(2, 3, 3)]
#[case(8, 6, 6)]
#[case(16, 8, 8)]
fn option_sensitive_algorithms(#[case] radix: u32, #[case] fanout: u32, #[case] arity: u32) {
    let options = SortOptions::new(radix, fanout, arity).unwrap();
    let registry = Registry::new();
    let readers = [
        AlgorithmId::KHeapSort,
        AlgorithmId::MultiWayMergeSort,
        AlgorithmId::RadixLsdSort,
        AlgorithmId::RadixMsdSort,
        AlgorithmId::RadixMsdSortIter,
        AlgorithmId::InPlaceRadixLsdSort,
        AlgorithmId::InPlaceRadixMsdSort,
    ];
    for id in readers {
        let algorithm = registry.resolve_id(id);
        for values in inputs(50) {
            for order in [Order::Ascending, Order::Descending] {
                let (sorted, _) = sort_with(algorithm.as_ref(), &values, order, options);
                assert_eq!(sorted, sorted_copy(&values, order), "{id} {order} with {options}");
            }
        }
    }
}

#[rstest]
#[case(AlgorithmId::QuickSort, AlgorithmId::QuickSortIter)]
#[case(AlgorithmId::ThreeWayQuickSort, AlgorithmId::ThreeWayQuickSortIter)]
#[case(AlgorithmId::DualPivotQuickSort, AlgorithmId::DualPivotQuickSortIter)]
#[case(AlgorithmId::MergeSort, AlgorithmId::MergeSortIter)]
#[case(AlgorithmId::CircleSort, AlgorithmId::CircleSortIter)]
#[case(AlgorithmId::StoogeSort, AlgorithmId::StoogeSortIter)]
#[case(AlgorithmId::RadixMsdSort, AlgorithmId::RadixMsdSortIter)]
fn recursive_and_iterative_variants_agree(#[case] recursive: AlgorithmId, #[case] iterative: AlgorithmId) {
    let registry = Registry::new();
    let (recursive, iterative) = (registry.resolve_id(recursive), registry.resolve_id(iterative));
    for values in inputs(60) {
        for order in [Order::Ascending, Order::Descending] {
            let options = SortOptions::default();
            assert_eq!(
                sort_with(recursive.as_ref(), &values, order, options),
                sort_with(iterative.as_ref(), &values, order, options),
                "{} vs {} {order} on {values:?}",
                recursive.id(),
                iterative.id()
            );
        }
    }
}

#[rstest]
fn sorted_input_needs_no_exchanges(
    #[values(
        AlgorithmId::BubbleSort,
        AlgorithmId::CocktailSort,
        AlgorithmId::CombSort,
        AlgorithmId::OddEvenSort,
        AlgorithmId::ExchangeSort,
        AlgorithmId::InsertSort,
        AlgorithmId::BinaryInsertSort,
        AlgorithmId::ShellSort,
        AlgorithmId::GnomeSort,
        AlgorithmId::QuickSort,
        AlgorithmId::MergeSort,
        AlgorithmId::InPlaceMergeSort,
        AlgorithmId::BottomUpMergeSort,
        AlgorithmId::MultiWayMergeSort,
        AlgorithmId::StrandSort,
        AlgorithmId::TimSort,
        AlgorithmId::CycleSort,
        AlgorithmId::StalinSort,
        AlgorithmId::SpaghettiSort,
        AlgorithmId::GravitySort
    )]
    id: AlgorithmId,
    #[values(Order::Ascending, Order::Descending)] order: Order,
) {
    let algorithm = Registry::new().resolve_id(id);
    let mut rng = StdRng::seed_from_u64(SEED);
    let raw: Vec<i32> = (0..80).map(|_| rng.gen_range(0..30)).collect();
    let sorted = sorted_copy(&raw, order);
    let (after, steps) = sort_with(algorithm.as_ref(), &sorted, order, SortOptions::default());
    assert_eq!(after, sorted);
    assert_eq!(steps, 0, "{id} exchanged elements of already sorted input");
}

#[test]
fn cached_instance_behaves_like_a_fresh_one() {
    let cached = Registry::new();
    let mut rng = StdRng::seed_from_u64(SEED);
    let first: Vec<i32> = (0..30).map(|_| rng.gen_range(-20..20)).collect();
    let second: Vec<i32> = (0..30).map(|_| rng.gen_range(-20..20)).collect();

    for &id in AlgorithmId::ALL {
        // wake order depends on the scheduler
        if matches!(id, AlgorithmId::SleepSort | AlgorithmId::BogoSort | AlgorithmId::BozoSort) {
            continue;
        }
        let reused = cached.resolve_id(id);
        sort_with(reused.as_ref(), &first, Order::Descending, SortOptions::default());
        let again = sort_with(reused.as_ref(), &second, Order::Ascending, SortOptions::default());
        let fresh = sort_with(Registry::new().resolve_id(id).as_ref(), &second, Order::Ascending, SortOptions::default());
        assert_eq!(again, fresh, "{id} kept state between runs");
    }
}

#[test]
fn flyweight_identity() {
    let registry = Registry::new();
    let first = registry.resolve(1, "insert-sort").unwrap();
    assert!(Arc::ptr_eq(&first, &registry.resolve(1, "insert-sort").unwrap()));
    registry.evict_all();
    assert!(!Arc::ptr_eq(&first, &registry.resolve(1, "insert-sort").unwrap()));
}

#[test]
fn every_family_resolves_its_own_members_only() {
    let registry = Registry::new();
    for family in Family::ALL {
        for id in family.algorithms() {
            assert!(registry.resolve(family.tag(), id.name()).is_ok());
            let other = Family::ALL.iter().find(|f| **f != family).unwrap();
            assert!(matches!(registry.resolve(other.tag(), id.name()), Err(SortError::UnknownAlgorithm { .. })));
        }
    }
}

#[rstest]
fn networks_reject_sub_range_delegation(
    #[values(
        AlgorithmId::BitonicSort,
        AlgorithmId::BitonicSortIter,
        AlgorithmId::OddEvenMergeSort,
        AlgorithmId::PairwiseSort,
        AlgorithmId::ShearSort
    )]
    id: AlgorithmId,
) {
    let algorithm = Registry::new().resolve_id(id);
    let mut sink = CountingSink::default();
    let mut data = elements_from(&[4, 3, 2, 1]);
    let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), SEED);
    let err = algorithm.sort_range(&mut cx, &mut data, 1, 3, Order::Ascending).unwrap_err();
    assert!(matches!(err, SortError::Unsupported { algorithm, operation: "sort_range" } if algorithm == id));
    assert_eq!(values_of(&data), vec![4, 3, 2, 1]);
}

#[rstest]
#[case(r#"{"radix_base": 7}"#)]
#[case(r#"{"merge_fanout": 5}"#)]
#[case(r#"{"heap_arity": 2}"#)]
fn invalid_option_documents_are_rejected(#[case] json: &str) {
    assert!(matches!(SortOptions::from_json(json), Err(SortError::Config(_))));
}

#[test]
fn three_way_partition_groups_around_pivot() {
    let mut sink = CountingSink::default();
    let mut data = elements_from(&[1, 3, 2, 3, 3, 4]);
    let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), SEED);
    let result = dutch_flag(&mut cx, &mut data, 0, 5, 3, Order::Ascending).unwrap();
    assert_eq!(result, PartitionResult::Equal { low: 2, high: 4 });
    let values = values_of(&data);
    assert!(values[..2].iter().all(|&v| v < 3));
    assert_eq!(&values[2..5], &[3, 3, 3]);
    assert_eq!(values[5], 4);
}

#[test]
fn lsd_first_digit_pass() {
    let mut sink = CountingSink::default();
    let mut data = elements_from(&[170, 45, 75, 90, 802, 24, 2, 66]);
    let options = SortOptions::default();
    let mut cx = SortContext::seeded(&mut sink, options, SEED);
    let digits = Digits::measure(&data, 0, 7, options.radix_base);
    RadixLsdSort::digit_pass(&mut cx, &mut data, 0, 7, &digits, 0, Order::Ascending).unwrap();
    assert_eq!(values_of(&data), vec![170, 90, 802, 2, 24, 45, 75, 66]);
}

#[test]
fn recorded_trace_replays_to_the_result() {
    let registry = Registry::new();
    let algorithm = registry.resolve(2, "radix-lsd-sort").unwrap();
    let mut sink = RecordingSink::default();
    let mut data = elements_from(&[170, 45, 75, 90, 802, 24, 2, 66]);
    {
        let mut cx = SortContext::seeded(&mut sink, SortOptions::default(), SEED);
        algorithm.sort(&mut cx, &mut data, Order::Ascending).unwrap();
    }
    let last = sink.snapshots.last().unwrap();
    assert_eq!(values_of(&last.elements), values_of(&data));
    assert!(sink.snapshots.iter().any(|s| s.elements.iter().any(|e| e.radix_key.is_some())));
    assert!(data.iter().all(|e| e.radix_key.is_none()));
}

#[test]
fn driver_streams_registry_algorithms() {
    let registry = Registry::new();
    let values: Vec<i32> = (0..25).map(|i| (i * 11) % 25).collect();
    let mut stream = driver::run_named(
        &registry,
        4,
        "intro-sort",
        elements_from(&values),
        Order::Descending,
        SortOptions::default(),
        RunConfig { capacity: 4, ..RunConfig::default() },
    )
    .unwrap();
    let count = stream.by_ref().map(|s| s.unwrap()).count() as u64;
    let outcome = stream.outcome().unwrap();
    assert_eq!(outcome.snapshots, count);
    assert!(is_sorted(&outcome.elements, Order::Descending));
}
