//! Strata CLI - multi-source temporal composite resolution

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strata_algorithms::SpectralIndex;
use strata_cloud::{StacCatalog, StacClientOptions, StacConfig, StacProber};
use strata_core::{BBox, Region};
use strata_engine::{
    CompositeEngine, CompositeResult, EngineConfig, FamilyAttempt, LocalArchive, PlanReport,
    Product, Provenance,
};

/// Years resolved when none are given
const DEFAULT_YEARS: [i32; 5] = [2005, 2010, 2015, 2020, 2025];

#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about = "Best-effort annual composites with provenance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration (families, policy, [stac] sources)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve composites from a local frame manifest
    Resolve {
        /// Frame manifest (TOML)
        #[arg(short, long)]
        manifest: PathBuf,
        /// Region bounds as "west,south,east,north"
        #[arg(long, allow_hyphen_values = true)]
        bbox: BBox,
        /// Pixel size in region units
        #[arg(short, long)]
        resolution: f64,
        /// Target year (repeatable)
        #[arg(short, long = "year")]
        years: Vec<i32>,
        /// Product: true-color, red-nir, spectral
        #[arg(short, long, default_value = "true-color")]
        product: Product,
        /// Also derive a spectral index (ndvi, evi)
        #[arg(short, long)]
        index: Option<SpectralIndex>,
        /// Region name used in logs and output
        #[arg(long, default_value = "region")]
        name: String,
        /// Print provenance as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe a STAC catalog and report which family and tier each year would use
    Plan {
        /// Region bounds as "west,south,east,north"
        #[arg(long, allow_hyphen_values = true)]
        bbox: BBox,
        /// Pixel size in region units
        #[arg(short, long, default_value = "0.00025")]
        resolution: f64,
        /// Target year (repeatable)
        #[arg(short, long = "year")]
        years: Vec<i32>,
        /// Catalog: "pc", "es", or a custom search URL
        #[arg(long)]
        catalog: Option<String>,
        /// Region name used in logs and output
        #[arg(long, default_value = "region")]
        name: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the sensor priority policy
    Policy,
    /// Show registered source families
    Registry,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(EngineConfig::builtin()),
    }
}

fn target_years(years: Vec<i32>) -> Vec<i32> {
    if years.is_empty() {
        DEFAULT_YEARS.to_vec()
    } else {
        years
    }
}

// ─── Output ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ResolveRecord<'a> {
    provenance: &'a Provenance,
    bands: Vec<&'a str>,
    shape: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_mean: Option<f64>,
    trace: &'a [FamilyAttempt],
}

fn print_result(result: &CompositeResult, index: Option<(SpectralIndex, Option<f64>)>) {
    let p = &result.provenance;
    println!(
        "{}  {:<8} {:<22} succeeded={:<5}  frames={:<4} bands=[{}]",
        p.year,
        p.family,
        p.tier.to_string(),
        p.succeeded,
        p.frame_count,
        result.band_names().join(", ")
    );
    if let Some(rejected) = p.rejected_tier {
        println!("      rejected for band mismatch: {}", rejected);
    }
    if let Some((index, mean)) = index {
        match mean {
            Some(mean) => println!("      {} mean: {:.4}", index, mean),
            None => println!("      {} mean: n/a (no valid pixels)", index),
        }
    }
}

fn print_plan(report: &PlanReport) {
    println!(
        "{}  {:<8} {:<22} succeeded={:<5}  frames={}",
        report.year,
        report.family,
        report.tier.to_string(),
        report.succeeded,
        report.frame_count
    );
    for attempt in &report.attempts {
        let probes: Vec<String> = attempt
            .probes
            .iter()
            .map(|p| format!("T{}={}", p.tier.index(), p.count))
            .collect();
        println!(
            "      {}{}: {}",
            attempt.family,
            if attempt.fallback { " (fallback)" } else { "" },
            probes.join(" ")
        );
    }
}

// ─── Commands ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_resolve(
    config: &EngineConfig,
    manifest: &Path,
    bbox: BBox,
    resolution: f64,
    years: Vec<i32>,
    product: Product,
    index: Option<SpectralIndex>,
    name: String,
    json: bool,
) -> Result<()> {
    let region = Region::new(name, bbox, resolution).context("Invalid region")?;
    let archive = LocalArchive::from_manifest(manifest)
        .with_context(|| format!("Failed to load manifest: {}", manifest.display()))?;
    info!(frames = archive.len(), region = %region.name, "archive loaded");

    let engine = CompositeEngine::new(config, &archive);
    let years = target_years(years);

    let pb = spinner("Resolving...");
    let mut results = Vec::with_capacity(years.len());
    for &year in &years {
        pb.set_message(format!("Resolving {}...", year));
        let result = engine
            .resolve(year, product, &region)
            .with_context(|| format!("Failed to resolve {}", year))?;
        let mean = match index {
            Some(index) => Some(result.index(index)?.statistics().mean),
            None => None,
        };
        results.push((result, mean));
    }
    pb.finish_and_clear();

    if json {
        let records: Vec<ResolveRecord> = results
            .iter()
            .map(|(result, mean)| ResolveRecord {
                provenance: &result.provenance,
                bands: result.band_names(),
                shape: result.raster.shape(),
                index_mean: mean.flatten(),
                trace: &result.trace,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for (result, mean) in &results {
            print_result(result, index.zip(*mean));
        }
        let ok = results.iter().filter(|(r, _)| r.succeeded()).count();
        println!("{} of {} years resolved with data", ok, results.len());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_plan(
    config: &EngineConfig,
    config_path: Option<&Path>,
    bbox: BBox,
    resolution: f64,
    years: Vec<i32>,
    catalog: Option<String>,
    name: String,
    json: bool,
) -> Result<()> {
    let region = Region::new(name, bbox, resolution).context("Invalid region")?;
    let mut stac = match config_path {
        Some(path) => StacConfig::load(path)
            .with_context(|| format!("Failed to load [stac] config: {}", path.display()))?,
        None => StacConfig::default(),
    };
    if let Some(catalog) = catalog {
        stac.catalog = StacCatalog::from_str_or_url(&catalog);
    }
    info!(catalog = %stac.catalog.search_url(), "probing catalog");

    let prober = StacProber::new(stac, StacClientOptions::default())
        .context("Failed to create STAC client")?;
    let engine = CompositeEngine::new(config, &prober);

    let pb = spinner("Probing...");
    let mut reports = Vec::new();
    for year in target_years(years) {
        pb.set_message(format!("Probing {}...", year));
        let report = engine
            .plan(year, &region)
            .with_context(|| format!("Failed to plan {}", year))?;
        reports.push(report);
    }
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_plan(report);
        }
    }
    Ok(())
}

fn run_policy(config: &EngineConfig) {
    for entry in config.policy.entries() {
        let years = match entry.to {
            Some(to) => format!("{}-{}", entry.from, to),
            None => format!("{}-", entry.from),
        };
        let fallback = entry
            .fallback
            .as_ref()
            .map(|group| group.label())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} families: {:<12} fallback: {}",
            years,
            entry.families.join(", "),
            fallback
        );
    }
}

fn run_registry(config: &EngineConfig) {
    for family in config.registry.families() {
        println!("{}", family.id);
        println!("  tiers: {}", family.tiers.join(", "));
        let bands: Vec<String> = family
            .bands
            .iter()
            .map(|(role, native)| format!("{}={}", role.as_str(), native))
            .collect();
        println!("  bands: {}", bands.join(", "));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            manifest,
            bbox,
            resolution,
            years,
            product,
            index,
            name,
            json,
        } => run_resolve(
            &config, &manifest, bbox, resolution, years, product, index, name, json,
        ),
        Commands::Plan {
            bbox,
            resolution,
            years,
            catalog,
            name,
            json,
        } => run_plan(
            &config,
            cli.config.as_deref(),
            bbox,
            resolution,
            years,
            catalog,
            name,
            json,
        ),
        Commands::Policy => {
            run_policy(&config);
            Ok(())
        }
        Commands::Registry => {
            run_registry(&config);
            Ok(())
        }
    }
}
