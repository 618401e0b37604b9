//! Benchmark driver: times the mapping verbs of every container against
//! seeded datasets and reports wall-clock and memory figures.

use std::collections::{HashMap as StdHashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use probetable::chained::ChainedMap;
use probetable::cuckoo::CuckooMap;
use probetable::elastic::ElasticMap;
use probetable::funnel::FunnelMap;
use probetable::hashing::hashers::XXH3Hasher;
use probetable::iceberg::IcebergMap;
use probetable::linear::LinearMap;
use probetable::partitioned::PartitionedMap;
use probetable::perfect::PerfectMap;
use probetable_core::Map;

const DATASET_SEED: u64 = 42;
const KEY_RANGE: u64 = 100_000_000;

#[derive(Parser)]
#[command(
    name = "probetable_bench",
    about = "Times and sizes the probetable containers against seeded datasets"
)]
struct Cli {
    /// Number of distinct keys in the dataset.
    #[arg(long = "numKeys", default_value_t = 100_000)]
    num_keys: usize,

    /// Target load factor; capacity hints are numKeys / load.
    #[arg(long, default_value_t = 1.0)]
    load: f64,

    /// Key type of the dataset.
    #[arg(long = "type", value_enum, default_value_t = KeyKind::Number)]
    key_type: KeyKind,

    /// Which container to run.
    #[arg(long, value_enum, default_value_t = Variant::All)]
    hashtable: Variant,

    /// Measure resident-memory growth instead of timing the verbs.
    #[arg(long, value_enum, default_value_t = Mode::Time)]
    mode: Mode,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyKind {
    Number,
    String,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Number => write!(f, "number"),
            KeyKind::String => write!(f, "string"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Time,
    Space,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Time => write!(f, "time"),
            Mode::Space => write!(f, "space"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Std,
    Lp,
    Chain,
    Cuckoo,
    Perfect,
    Iceberg,
    Funnel,
    Elastic,
    Partition,
    All,
}

impl Variant {
    const EACH: [Variant; 9] = [
        Variant::Std,
        Variant::Lp,
        Variant::Chain,
        Variant::Cuckoo,
        Variant::Perfect,
        Variant::Iceberg,
        Variant::Funnel,
        Variant::Elastic,
        Variant::Partition,
    ];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Std => "std",
            Variant::Lp => "lp",
            Variant::Chain => "chain",
            Variant::Cuckoo => "cuckoo",
            Variant::Perfect => "perfect",
            Variant::Iceberg => "iceberg",
            Variant::Funnel => "funnel",
            Variant::Elastic => "elastic",
            Variant::Partition => "partition",
            Variant::All => "all",
        };
        write!(f, "{name}")
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if cli.load <= 0.0 || cli.load > 100.0 {
        return Err(format!("load must lie in (0, 100], got {}", cli.load).into());
    }
    if cli.num_keys == 0 {
        return Err("numKeys must be positive".into());
    }

    let capacity = (cli.num_keys as f64 / cli.load) as usize;

    fs::create_dir_all("./output")?;
    let path = format!(
        "./output/{}_{}_{}_{}_{}.txt",
        cli.mode, cli.hashtable, cli.key_type, cli.num_keys, cli.load
    );
    let mut report = Report {
        file: File::create(&path)?,
    };

    report.line(&format!(
        "=== Benchmark Configuration: hashtable={}, type={}, capacity={}, load_factor={}, num_keys={} ===\n",
        cli.hashtable, cli.key_type, capacity, cli.load, cli.num_keys
    ))?;

    let variants: Vec<Variant> = if cli.hashtable == Variant::All {
        Variant::EACH.to_vec()
    } else {
        vec![cli.hashtable]
    };

    match cli.key_type {
        KeyKind::Number => {
            let dataset = generate_number_dataset(cli.num_keys, KEY_RANGE);
            for variant in variants {
                run_number(variant, capacity, &dataset, cli.mode, &mut report)?;
            }
        }
        KeyKind::String => {
            let dataset = generate_string_dataset(cli.num_keys, KEY_RANGE);
            for variant in variants {
                run_string(variant, capacity, &dataset, cli.mode, &mut report)?;
            }
        }
    }

    report.line(&format!("\nReport written to {path}"))?;
    Ok(())
}

struct Report {
    file: File,
}

impl Report {
    fn line(&mut self, text: &str) -> std::io::Result<()> {
        println!("{text}");
        writeln!(self.file, "{text}")
    }
}

fn generate_number_dataset(count: usize, range: u64) -> Vec<(u64, u64)> {
    let mut rng = ChaCha20Rng::seed_from_u64(DATASET_SEED);
    let mut used = HashSet::new();
    let mut dataset = Vec::with_capacity(count);
    while dataset.len() < count {
        let key = rng.random_range(1..=range);
        if used.insert(key) {
            dataset.push((key, key.wrapping_mul(10)));
        }
    }
    dataset
}

fn generate_string_dataset(count: usize, range: u64) -> Vec<(String, String)> {
    let mut rng = ChaCha20Rng::seed_from_u64(DATASET_SEED);
    let mut used = HashSet::new();
    let mut dataset = Vec::with_capacity(count);
    while dataset.len() < count {
        let n = rng.random_range(1..=range);
        let key = format!("key{n}");
        if used.insert(key.clone()) {
            dataset.push((key, format!("val{n}")));
        }
    }
    dataset
}

/// VmRSS of this process in kilobytes; 0 where /proc is unavailable.
fn memory_usage_kb() -> u64 {
    let Ok(status) = fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
        }
    }
    0
}

fn run_number(
    variant: Variant,
    capacity: usize,
    dataset: &[(u64, u64)],
    mode: Mode,
    report: &mut Report,
) -> Result<(), Box<dyn std::error::Error>> {
    type H = XXH3Hasher<u64>;
    match variant {
        Variant::Std => bench_std(dataset, mode, report),
        Variant::Lp => bench(
            "lp",
            LinearMap::<u64, u64, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Chain => bench(
            "chain",
            ChainedMap::<u64, u64, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Cuckoo => bench(
            "cuckoo",
            CuckooMap::<u64, u64, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Perfect => bench(
            "perfect",
            PerfectMap::<u64, u64, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Iceberg => bench(
            "iceberg",
            IcebergMap::<u64, u64, H>::new((capacity / 72).max(1)),
            dataset,
            mode,
            report,
        ),
        Variant::Funnel => bench(
            "funnel",
            FunnelMap::<u64, u64, H>::new(capacity, 0.1)?,
            dataset,
            mode,
            report,
        ),
        Variant::Elastic => bench(
            "elastic",
            ElasticMap::<u64, u64, H>::new(capacity, 0.1)?,
            dataset,
            mode,
            report,
        ),
        Variant::Partition => bench(
            "partition",
            PartitionedMap::<u64, u64, H>::new(capacity, 2.0),
            dataset,
            mode,
            report,
        ),
        Variant::All => unreachable!(),
    }
}

fn run_string(
    variant: Variant,
    capacity: usize,
    dataset: &[(String, String)],
    mode: Mode,
    report: &mut Report,
) -> Result<(), Box<dyn std::error::Error>> {
    type H = XXH3Hasher<String>;
    match variant {
        Variant::Std => bench_std(dataset, mode, report),
        Variant::Lp => bench(
            "lp",
            LinearMap::<String, String, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Chain => bench(
            "chain",
            ChainedMap::<String, String, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Cuckoo => bench(
            "cuckoo",
            CuckooMap::<String, String, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Perfect => bench(
            "perfect",
            PerfectMap::<String, String, H>::new(capacity),
            dataset,
            mode,
            report,
        ),
        Variant::Iceberg => bench(
            "iceberg",
            IcebergMap::<String, String, H>::new((capacity / 72).max(1)),
            dataset,
            mode,
            report,
        ),
        Variant::Funnel => bench(
            "funnel",
            FunnelMap::<String, String, H>::new(capacity, 0.1)?,
            dataset,
            mode,
            report,
        ),
        Variant::Elastic => bench(
            "elastic",
            ElasticMap::<String, String, H>::new(capacity, 0.1)?,
            dataset,
            mode,
            report,
        ),
        Variant::Partition => bench(
            "partition",
            PartitionedMap::<String, String, H>::new(capacity, 2.0),
            dataset,
            mode,
            report,
        ),
        Variant::All => unreachable!(),
    }
}

fn bench<K, V, M>(
    name: &str,
    mut table: M,
    dataset: &[(K, V)],
    mode: Mode,
    report: &mut Report,
) -> Result<(), Box<dyn std::error::Error>>
where
    K: Eq + Clone,
    V: Eq + Clone + fmt::Debug,
    M: Map<K, V>,
{
    match mode {
        Mode::Space => {
            let before = memory_usage_kb();
            for (key, value) in dataset {
                table.insert(key.clone(), value.clone())?;
            }
            let after = memory_usage_kb();
            report.line(&format!(
                "[{name}] Memory usage: {} KB",
                after.saturating_sub(before)
            ))?;
        }
        Mode::Time => {
            let start = Instant::now();
            for (key, value) in dataset {
                table.insert(key.clone(), value.clone())?;
            }
            report.line(&format!(
                "[{name}] Insert: {} ms",
                start.elapsed().as_millis()
            ))?;

            let start = Instant::now();
            for (key, value) in dataset {
                debug_assert_eq!(table.get(key), Some(value));
                let _ = table.get(key);
            }
            report.line(&format!(
                "[{name}] Lookup: {} ms",
                start.elapsed().as_millis()
            ))?;

            let start = Instant::now();
            for (key, value) in dataset {
                table.update(key, value.clone());
            }
            report.line(&format!(
                "[{name}] Update: {} ms",
                start.elapsed().as_millis()
            ))?;

            let start = Instant::now();
            for (key, _) in dataset {
                table.remove(key);
            }
            report.line(&format!(
                "[{name}] Delete: {} ms",
                start.elapsed().as_millis()
            ))?;
        }
    }
    Ok(())
}

/// Baseline: `std::collections::HashMap` run through the same passes.
fn bench_std<K, V>(
    dataset: &[(K, V)],
    mode: Mode,
    report: &mut Report,
) -> Result<(), Box<dyn std::error::Error>>
where
    K: Eq + std::hash::Hash + Clone,
    V: Eq + Clone,
{
    let mut table = StdHashMap::new();
    match mode {
        Mode::Space => {
            let before = memory_usage_kb();
            for (key, value) in dataset {
                table.insert(key.clone(), value.clone());
            }
            let after = memory_usage_kb();
            report.line(&format!(
                "[std] Memory usage: {} KB",
                after.saturating_sub(before)
            ))?;
        }
        Mode::Time => {
            let start = Instant::now();
            for (key, value) in dataset {
                table.insert(key.clone(), value.clone());
            }
            report.line(&format!("[std] Insert: {} ms", start.elapsed().as_millis()))?;

            let start = Instant::now();
            for (key, _) in dataset {
                let _ = table.get(key);
            }
            report.line(&format!("[std] Lookup: {} ms", start.elapsed().as_millis()))?;

            let start = Instant::now();
            for (key, value) in dataset {
                if let Some(slot) = table.get_mut(key) {
                    *slot = value.clone();
                }
            }
            report.line(&format!("[std] Update: {} ms", start.elapsed().as_millis()))?;

            let start = Instant::now();
            for (key, _) in dataset {
                table.remove(key);
            }
            report.line(&format!("[std] Delete: {} ms", start.elapsed().as_millis()))?;
        }
    }
    Ok(())
}
