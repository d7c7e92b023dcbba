//! djmatch CLI entry point.
//!
//! Replays a KONECT delta stream through every configured algorithm for
//! every configured number of matchings, and reports one CSV row per
//! (b, delta, algorithm).

mod config;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use djmatch_core::konect::read_konect_file;
use djmatch_core::DynamicWeightedDiGraph;
use djmatch_algorithms::DisjointMatching;

use crate::config::RunConfig;
use crate::report::{ResultsTable, Row};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "djmatch")]
#[command(version = VERSION)]
#[command(about = "Dynamic b-disjoint matching benchmark driver", long_about = None)]
struct Args {
    /// Input graph in KONECT edge-list format
    #[arg(short, long)]
    graph: PathBuf,

    /// Run configuration (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Write the result table to this file (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let config = RunConfig::from_file(&args.config)?;
    let mut algorithms = config.build_algorithms();
    for algorithm in &mut algorithms {
        algorithm.configure(&config.run);
    }
    if config.run.algorithm_order_seed != 0 {
        let mut rng = StdRng::seed_from_u64(config.run.algorithm_order_seed);
        algorithms.shuffle(&mut rng);
    }

    let io_timer = Instant::now();
    let mut dynamic = read_konect_file(&args.graph)?;
    log::info!("Input I/O took {:.3}s", io_timer.elapsed().as_secs_f64());
    log::info!(
        "n,m = {},{}",
        dynamic.graph().size(),
        dynamic.graph().num_arcs()
    );

    let output_path = args.output.as_ref().or(config.run.output_file.as_ref());
    let writer: Box<dyn Write> = match output_path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to open output file '{}'", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let mut table = ResultsTable::new(writer);
    table.write_header()?;

    for &b in &config.run.all_bs {
        for algorithm in &mut algorithms {
            run_algorithm(&mut dynamic, algorithm.as_mut(), b, &mut table)?;
        }
    }

    Ok(())
}

/// Replays the full delta stream through one algorithm.
fn run_algorithm(
    dynamic: &mut DynamicWeightedDiGraph,
    algorithm: &mut dyn DisjointMatching,
    b: u32,
    table: &mut ResultsTable<Box<dyn Write>>,
) -> Result<()> {
    log::info!("Running {} with b = {}", algorithm.name(), b);
    dynamic.reset_to_big_bang();
    algorithm.set_num_matchings(b);
    algorithm.init();

    let mut delta_counter = 0;
    let mut delta_timer = Instant::now();
    loop {
        let applied = dynamic.apply_next_delta(|graph, weights, arc, old, new| {
            algorithm.on_weight_change(graph, weights, arc, old, new);
        });
        if !applied {
            break;
        }
        delta_counter += 1;
        let delta_time = delta_timer.elapsed().as_secs_f64();

        let run_timer = Instant::now();
        algorithm.run(dynamic.graph(), dynamic.weights());
        let run_time = run_timer.elapsed().as_secs_f64();
        algorithm.post_run(dynamic.graph(), dynamic.weights())?;

        table.write_row(&Row {
            b,
            delta: delta_counter,
            algorithm: algorithm.name(),
            weight: algorithm.deliver(),
            time_s: run_time,
            delta_time_s: delta_time,
            fine: algorithm.fine_counts(),
            coarse: algorithm.coarse_counts(),
            num_arcs: dynamic.graph().num_arcs(),
            delta_size: dynamic.last_delta_size(),
        })?;

        delta_timer = Instant::now();
    }
    log::debug!(
        "{} finished after {} deltas with weight {}",
        algorithm.short_name(),
        delta_counter,
        algorithm.deliver()
    );
    Ok(())
}
