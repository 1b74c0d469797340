#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the envrisk pipeline.
//!
//! Each subcommand runs one stage (pollution timelines, densification,
//! county enrichment, smoothed risk surfaces, synthetic terrain, scenario
//! generation) and writes JSON to stdout or `--output`.
//!
//! Uses `indicatif-log-bridge` (via [`envrisk_cli_utils::init_logger`]) so
//! log lines and the densification progress bar share the terminal.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::PipelineConfig;

#[derive(Parser)]
#[command(name = "envrisk", about = "Environmental risk surfaces and pollution timelines")]
struct Cli {
    /// Pipeline configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout.
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate pollution readings into a monthly timeline
    Timeline {
        /// CSV file of readings for one chemical
        #[arg(long, conflicts_with = "data_dir", required_unless_present = "data_dir")]
        csv: Option<PathBuf>,
        /// Registered chemical the CSV holds (enables its danger-scaled colors)
        #[arg(long, requires = "csv")]
        chemical: Option<String>,
        /// Directory holding every registered chemical's CSV; timelines are combined
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Emit only the summary
        #[arg(long)]
        summary_only: bool,
        /// Emit only the month at this index (clamped)
        #[arg(long)]
        month: Option<usize>,
    },
    /// Fill a region with interpolated points around scenario values
    Densify {
        /// Scenario API response (JSON)
        #[arg(long)]
        scenario: PathBuf,
        /// County boundaries (GeoJSON or ArcGIS JSON); restricts points to counties
        #[arg(long)]
        boundaries: Option<PathBuf>,
        /// Total point count to aim for
        #[arg(long)]
        target: Option<usize>,
        /// Keep only the scenario points, without interpolation
        #[arg(long)]
        direct: bool,
    },
    /// Join scenario values onto county boundaries
    Enrich {
        /// County boundaries (GeoJSON or ArcGIS JSON). Downloaded when omitted.
        #[arg(long)]
        boundaries: Option<PathBuf>,
        /// Registered boundary source to download
        #[arg(long, default_value = envrisk_geography::registry::DEFAULT_SOURCE_ID)]
        source: String,
        /// Scenario API response (JSON)
        #[arg(long)]
        scenario: PathBuf,
    },
    /// Interpolate and smooth scenario values into a colored raster
    Surface {
        /// Scenario API response (JSON)
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long, default_value_t = 128)]
        width: usize,
        #[arg(long, default_value_t = 128)]
        height: usize,
        /// Emit a triangulated heightfield instead of the raster
        #[arg(long)]
        mesh: bool,
    },
    /// Generate the synthetic weighted risk terrain
    Terrain {
        #[arg(long, default_value_t = envrisk_spatial::terrain::DEFAULT_RESOLUTION)]
        resolution: usize,
        /// Air quality weight, in percent
        #[arg(long)]
        air_quality: Option<f64>,
        /// Noise pollution weight, in percent
        #[arg(long)]
        noise: Option<f64>,
        /// Flood and climate weight, in percent
        #[arg(long)]
        flood: Option<f64>,
        /// Emit a triangulated heightfield instead of the raster
        #[arg(long)]
        mesh: bool,
    },
    /// Generate a scenario from a prompt via the scenario API
    Simulate {
        #[arg(long)]
        prompt: String,
    },
    /// Check that the scenario API is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = envrisk_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Timeline {
            csv,
            chemical,
            data_dir,
            summary_only,
            month,
        } => {
            let options = commands::TimelineOptions {
                summary_only,
                month,
            };
            match (csv, data_dir) {
                (Some(csv), _) => {
                    commands::timeline(&csv, chemical.as_deref(), options, output)?;
                }
                (None, Some(dir)) => commands::combined_timeline(&dir, options, output)?,
                (None, None) => return Err("either --csv or --data-dir is required".into()),
            }
        }
        Commands::Densify {
            scenario,
            boundaries,
            target,
            direct,
        } => {
            let options = commands::DensifyOptions {
                boundaries: boundaries.as_deref(),
                target,
                direct,
            };
            commands::densify(&config, &multi, &scenario, &options, output)?;
        }
        Commands::Enrich {
            boundaries,
            source,
            scenario,
        } => {
            commands::enrich(&scenario, boundaries.as_deref(), &source, output).await?;
        }
        Commands::Surface {
            scenario,
            width,
            height,
            mesh,
        } => commands::surface(&config, &multi, &scenario, width, height, mesh, output)?,
        Commands::Terrain {
            resolution,
            air_quality,
            noise,
            flood,
            mesh,
        } => {
            let percents = commands::WeightPercents {
                air_quality,
                noise,
                flood,
            };
            commands::terrain(&config, &multi, resolution, percents, mesh, output)?;
        }
        Commands::Simulate { prompt } => commands::simulate(&config, &prompt, output).await?,
        Commands::Health => commands::health(&config, output).await?,
    }

    Ok(())
}
