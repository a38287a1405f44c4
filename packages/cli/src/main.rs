#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for the charging infrastructure analysis.
//!
//! Loads the station registry, population table and area boundaries,
//! runs the pipeline and writes the per-area metrics, the demand ranking
//! and the quality report. Uses `indicatif-log-bridge` (via
//! [`evision_cli_utils::init_logger`]) so log lines and the progress bar
//! never fight for the terminal.

mod output;
mod summary;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use evision_cli_utils::{IndicatifProgress, MultiProgress};
use evision_config::{PipelineConfig, default_config, load_config};
use evision_pipeline::{PipelineOutput, ResultCache};
use evision_source::SourcePaths;

#[derive(Parser)]
#[command(
    name = "evision",
    about = "Charging infrastructure demand analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis and write metrics, ranking and quality report
    Run(RunArgs),
    /// Run the analysis and print the quality summary without writing
    /// outputs
    Check(SourceArgs),
    /// Print the effective configuration as TOML
    Config {
        /// Configuration file (defaults to the shipped configuration)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Where the configuration and the three source files come from.
#[derive(Args)]
struct SourceArgs {
    /// Configuration file (defaults to the shipped configuration)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Station registry file (overrides the configured path)
    #[arg(long)]
    stations: Option<PathBuf>,

    /// Population table file (overrides the configured path)
    #[arg(long)]
    population: Option<PathBuf>,

    /// Area boundary file (overrides the configured path)
    #[arg(long)]
    geometry: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// Directory for the output files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for cached results
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the result cache
    #[arg(long)]
    no_cache: bool,

    /// Recompute even if a cached result matches
    #[arg(long)]
    force: bool,

    /// Number of ranked areas to log
    #[arg(long, default_value_t = 10)]
    top: usize,
}

impl SourceArgs {
    fn config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        resolve_config(self.config.as_deref())
    }

    fn paths(&self, config: &PipelineConfig) -> SourcePaths {
        let mut paths = SourcePaths::from_config(config);
        if let Some(path) = &self.stations {
            paths.stations.clone_from(path);
        }
        if let Some(path) = &self.population {
            paths.population.clone_from(path);
        }
        if let Some(path) = &self.geometry {
            paths.geometry.clone_from(path);
        }
        paths
    }
}

fn resolve_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => load_config(path)?,
        None => default_config(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = evision_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&multi, &args)?,
        Commands::Check(args) => check(&multi, &args)?,
        Commands::Config { config } => {
            print!("{}", resolve_config(config.as_deref())?.to_toml_string()?);
        }
    }

    Ok(())
}

fn run(multi: &MultiProgress, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut config = args.sources.config()?;
    if let Some(dir) = &args.output_dir {
        config.paths.output_dir.clone_from(dir);
    }
    if let Some(dir) = &args.cache_dir {
        config.paths.cache_dir.clone_from(dir);
    }
    let paths = args.sources.paths(&config);
    let progress = IndicatifProgress::stages_bar(multi, "Loading sources");

    let output = if args.no_cache {
        evision_pipeline::run(&config, &paths, &progress)?
    } else {
        let cache = ResultCache::new(&config.paths.cache_dir);
        let (output, outcome) =
            evision_pipeline::run_cached(&config, &paths, &cache, args.force, &progress)?;
        log::info!("Result cache: {outcome}");
        output
    };

    let written = output::write_all(&config.paths.output_dir, &output)?;
    for path in &written {
        log::info!("Wrote {}", path.display());
    }

    log_top_areas(&output, args.top);
    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn check(multi: &MultiProgress, args: &SourceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config()?;
    let paths = args.paths(&config);
    let progress = IndicatifProgress::stages_bar(multi, "Loading sources");

    let output = evision_pipeline::run(&config, &paths, &progress)?;
    print!("{}", summary::render(&output));

    Ok(())
}

fn log_top_areas(output: &PipelineOutput, top: usize) {
    for score in output.ranking.ranking.iter().take(top) {
        log::info!(
            "#{:<3} {}  {:>9.1} residents/station  {:>6} residents  {:>3} stations  {}",
            score.rank,
            score.area_code,
            score.residents_per_station,
            score.population,
            score.station_count,
            score.priority_class
        );
    }
    if !output.ranking.population_unknown.is_empty() {
        log::warn!(
            "{} areas not ranked (population unknown)",
            output.ranking.population_unknown.len()
        );
    }
}
