use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::{ArgGroup, Parser};
use log::LevelFilter;
use hiercache::config::{CoherenceMode, HierarchyConfig, ReplacementPolicyConfig};
use hiercache::io::get_reader;
use hiercache::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Two-level inclusive/exclusive cache simulator"))]
#[command(group(ArgGroup::new("policy").args(["lru", "lfu"])))]
struct Args {
    /// JSON cache configuration
    #[arg(short, long)]
    config: String,

    /// Memory trace to replay
    #[arg(short, long)]
    trace: String,

    /// Use LRU eviction
    #[arg(short = 'L', long)]
    lru: bool,

    /// Use LFU eviction
    #[arg(short = 'F', long)]
    lfu: bool,

    /// Coherence discipline between L1 and L2, overrides the configuration
    #[arg(short, long, value_enum)]
    mode: Option<CoherenceMode>,

    /// Don't print a line per trace entry
    #[arg(short, long)]
    quiet: bool,

    /// Print the summary as JSON
    #[arg(short, long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,

    /// Log evictions and cross-level moves
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    // RUST_LOG still takes precedence
    env_logger::Builder::new()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config = HierarchyConfig::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    let policy = match (args.lru, args.lfu) {
        (_, true) => ReplacementPolicyConfig::LeastFrequentlyUsed,
        (true, _) => ReplacementPolicyConfig::LeastRecentlyUsed,
        _ => config.policy,
    };
    let mode = args.mode.unwrap_or(config.mode);
    let mut simulator = Simulator::new(&config, policy, mode).map_err(|e| format!("Couldn't build the caches: {e}"))?;

    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace_reader = get_reader(trace_file)?;
    let quiet = args.quiet;
    let result = simulator
        .simulate(trace_reader, |entry, report| {
            if !quiet {
                println!("{report} (size {})", entry.size);
            }
        })
        .map_err(|e| format!("Simulation failed: {e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    } else {
        for cache in &result.caches {
            println!("{cache}");
        }
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}, policy: {policy:?}, mode: {mode}");
        let vacant_lines = simulator.vacant_line_counts();
        let formatted = simulator.result().caches
            .iter()
            .map(|c| c.name.clone())
            .zip(vacant_lines.iter())
            .map(|(name, count)| format!("{name}: {}", *count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Vacant cache lines by layer: ({formatted})");
        println!("Total vacant cache lines: {}", vacant_lines.iter().sum::<u64>())
    }
    Ok(())
}
