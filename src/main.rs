//! sortviz command line
//!
//! - `list`: print the algorithm catalog grouped by family
//! - `run`: run one algorithm on random data, optionally tracing every snapshot
//! - `bench`: run every algorithm of a family over several array sizes and
//!   optionally write a Links Notation report

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use sortviz::driver::{self, RunConfig, DEFAULT_CAPACITY};
use sortviz::report::{RunRecord, RunReport};
use sortviz::{elements_from, is_sorted, values_of, AlgorithmId, Family, Order, Registry, SortOptions};

#[derive(Parser, Debug)]
#[command(version, about = "Instrumented sorting algorithms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List algorithms by family
    List {
        /// Only list this family tag (1-5)
        #[arg(long)]
        family: Option<u8>,
    },
    /// Run one algorithm
    Run(RunArgs),
    /// Run every algorithm of a family over several sizes
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Digit base for radix sorts (2, 8, 10, 16)
    #[arg(long, default_value_t = 10)]
    radix_base: u32,
    /// Merge width for multi-way merge sort (3, 4, 6, 8)
    #[arg(long, default_value_t = 4)]
    merge_fanout: u32,
    /// Children per node for k-ary heap sort (3, 4, 6, 8)
    #[arg(long, default_value_t = 4)]
    heap_arity: u32,
    /// JSON options document; overrides the flags above
    #[arg(long)]
    options: Option<PathBuf>,
}

impl OptionArgs {
    fn resolve(&self) -> Result<SortOptions> {
        match &self.options {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                Ok(SortOptions::from_json(&json)?)
            }
            None => Ok(SortOptions::new(self.radix_base, self.merge_fanout, self.heap_arity)?),
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Family tag (1 comparison, 2 distribution, 3 parallel, 4 hybrid, 5 curious)
    #[arg(long)]
    family: u8,
    /// Algorithm name, e.g. quick-sort
    #[arg(long)]
    name: String,
    /// Number of elements
    #[arg(long, default_value_t = 32)]
    size: usize,
    /// Largest generated value
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(i32).range(0..))]
    max_value: i32,
    /// asc or desc
    #[arg(long, default_value = "asc")]
    order: Order,
    /// Seed for the input and for randomised algorithms
    #[arg(long)]
    seed: Option<u64>,
    /// Snapshots buffered between the algorithm and the printer
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
    /// Delay after every snapshot, in milliseconds
    #[arg(long)]
    throttle_ms: Option<u64>,
    /// Print every snapshot
    #[arg(long)]
    trace: bool,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args, Debug)]
struct BenchArgs {
    /// Family tag (1-5)
    #[arg(long)]
    family: u8,
    /// Comma-separated array sizes
    #[arg(long, value_delimiter = ',', default_values_t = vec![64, 256, 1024])]
    sizes: Vec<usize>,
    /// Largest generated value
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(i32).range(0..))]
    max_value: i32,
    /// asc or desc
    #[arg(long, default_value = "asc")]
    order: Order,
    #[arg(long)]
    seed: Option<u64>,
    /// Write a Links Notation report here
    #[arg(long)]
    report: Option<PathBuf>,
    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Serialize)]
struct RunSummary {
    algorithm: AlgorithmId,
    family: Family,
    order: Order,
    size: usize,
    steps: u64,
    snapshots: u64,
    time_ms: f64,
    verified: bool,
}

fn random_values(size: usize, max_value: i32, seed: Option<u64>) -> Vec<i32> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..size).map(|_| rng.gen_range(0..=max_value)).collect()
}

/// Largest input an algorithm finishes on in reasonable time.
fn size_limit(id: AlgorithmId) -> usize {
    match id {
        AlgorithmId::BogoSort | AlgorithmId::BozoSort => 8,
        AlgorithmId::SlowSort | AlgorithmId::StalinSort => 128,
        AlgorithmId::StoogeSort | AlgorithmId::StoogeSortIter => 512,
        AlgorithmId::SleepSort => 256,
        _ => usize::MAX,
    }
}

fn list(family: Option<u8>) -> Result<()> {
    let families = match family {
        Some(tag) => vec![Family::try_from(tag)?],
        None => Family::ALL.to_vec(),
    };
    for family in families {
        println!("{} ({}):", family, family.tag());
        for id in family.algorithms() {
            println!("  {id}");
        }
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let options = args.options.resolve()?;
    let registry = Registry::new();
    let algorithm = registry.resolve(args.family, &args.name)?;
    let id = algorithm.id();
    let values = random_values(args.size, args.max_value, args.seed);
    if !args.json {
        println!("{id} {} on {} elements ({options})", args.order, values.len());
        println!("input: {values:?}");
    }

    let config = RunConfig {
        capacity: args.capacity,
        throttle: args.throttle_ms.map(Duration::from_millis),
        seed: args.seed,
    };
    let start = Instant::now();
    let mut stream = driver::run(algorithm, elements_from(&values), args.order, options, config)?;
    for snapshot in stream.by_ref() {
        let snapshot = snapshot?;
        if args.trace {
            println!("step {:>6}: {:?}", snapshot.step_count, values_of(&snapshot.elements));
        }
    }
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;
    let outcome = stream.wait()?;

    let summary = RunSummary {
        algorithm: id,
        family: id.family(),
        order: outcome.order,
        size: outcome.elements.len(),
        steps: outcome.step_count,
        snapshots: outcome.snapshots,
        time_ms,
        verified: is_sorted(&outcome.elements, outcome.order),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("output: {:?}", values_of(&outcome.elements));
        println!(
            "{} steps, {} snapshots, {:.3} ms, verified: {}",
            summary.steps,
            summary.snapshots,
            summary.time_ms,
            if summary.verified { "OK" } else { "FAILED" }
        );
    }
    Ok(())
}

fn bench(args: BenchArgs) -> Result<()> {
    let family = Family::try_from(args.family)?;
    let options = args.options.resolve()?;
    let registry = Registry::new();
    let mut report = RunReport::new(&format!("{family} family, {} ({options})", args.order));

    println!("{:>26} | {:>8} | {:>12} | {:>12} | {:>10} | {:>8}", "Algorithm", "Size", "Steps", "Snapshots", "Time (ms)", "Verified");
    println!("{:-<26}-+-{:-<8}-+-{:-<12}-+-{:-<12}-+-{:-<10}-+-{:-<8}", "", "", "", "", "", "");

    for &size in &args.sizes {
        let values = random_values(size, args.max_value, args.seed);
        for id in family.algorithms() {
            if size > size_limit(id) {
                info!("skipping {id} at {size} elements");
                continue;
            }
            let algorithm = registry.resolve_id(id);
            let mut data = elements_from(&values);
            let start = Instant::now();
            let stats = match driver::execute(algorithm.as_ref(), &mut data, args.order, options, args.seed) {
                Ok(stats) => stats,
                Err(e) => {
                    println!("{id:>26} | {size:>8} | ERROR: {e}");
                    continue;
                }
            };
            let time_ms = start.elapsed().as_secs_f64() * 1000.0;
            let verified = is_sorted(&data, args.order);
            println!(
                "{:>26} | {:>8} | {:>12} | {:>12} | {:>10.3} | {:>8}",
                id.name(),
                size,
                stats.step_count,
                stats.snapshots,
                time_ms,
                if verified { "OK" } else { "FAILED" }
            );
            report.add_record(RunRecord {
                algorithm: id.name().to_string(),
                family: family.to_string(),
                order: args.order.to_string(),
                array_size: size,
                steps: stats.step_count,
                snapshots: stats.snapshots,
                time_ms,
                verified,
            });
        }
    }

    if let Some(path) = args.report {
        report.save_lino(&path)?;
        println!("\nReport written to: {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::List { family } => list(family),
        Command::Run(args) => run(args),
        Command::Bench(args) => bench(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_max_value_is_rejected() {
        assert!(Cli::try_parse_from(["sortviz", "run", "--family", "1", "--name", "quick-sort", "--max-value", "-1"]).is_err());
        assert!(Cli::try_parse_from(["sortviz", "bench", "--family", "1", "--max-value", "-5"]).is_err());
        assert!(Cli::try_parse_from(["sortviz", "run", "--family", "1", "--name", "quick-sort", "--max-value", "0"]).is_ok());
    }

    #[test]
    fn test_cubic_sorts_are_capped() {
        for id in [AlgorithmId::SlowSort, AlgorithmId::StalinSort, AlgorithmId::StoogeSort, AlgorithmId::BogoSort] {
            assert!(size_limit(id) < 1024, "{id} has no bench size cap");
        }
        assert_eq!(size_limit(AlgorithmId::QuickSort), usize::MAX);
    }

    #[test]
    fn test_random_values_stay_in_range() {
        let values = random_values(200, 0, Some(3));
        assert!(values.iter().all(|&v| v == 0));
        let values = random_values(200, 9, Some(3));
        assert!(values.iter().all(|v| (0..=9).contains(v)));
        assert_eq!(values, random_values(200, 9, Some(3)));
    }
}
