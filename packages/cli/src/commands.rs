//! Subcommand implementations.

use std::collections::BTreeMap;
use std::error::Error;
use std::io::Write as _;
use std::path::Path;

use envrisk_cli_utils::{IndicatifProgress, MultiProgress};
use envrisk_color::pollution::pollution_scale_for_danger;
use envrisk_color::{
    ColorScale, LegendEntry, PollutionLevel, RiskLevel, pollution_scale, risk_scale,
};
use envrisk_geography::cache::BoundaryCache;
use envrisk_geography::enrich::enrich_collection;
use envrisk_geography::fetch::{fetch_cached, parse_boundaries};
use envrisk_geography::index::CountyIndex;
use envrisk_pollution::aggregate::peak_average;
use envrisk_pollution::combine::combine_chemicals;
use envrisk_pollution::parsing::IngestReport;
use envrisk_pollution::timeline::{Timeline, format_year_month};
use envrisk_pollution::{ChemicalConfig, MonthlyAggregate, TimelineSummary};
use envrisk_scenario::{ScenarioClient, SimulationData, SimulationResponse};
use envrisk_spatial::densify::densify as densify_samples;
use envrisk_spatial::interpolate::estimate;
use envrisk_spatial::mesh::{DEFAULT_ELEVATION_MULTIPLIER, HeightfieldMesh};
use envrisk_spatial::raster::RasterGrid;
use envrisk_spatial::region::{Region, direct_samples};
use envrisk_spatial::terrain::generate_risk_terrain;
use envrisk_spatial_models::{LonLat, RiskFactor, RiskWeights, ScalarSample};
use serde::Serialize;

use crate::config::PipelineConfig;

type CommandResult = Result<(), Box<dyn Error>>;

/// Writes pretty JSON to `output`, or stdout when `None`.
fn write_json<T: Serialize + ?Sized>(output: Option<&Path>, value: &T) -> CommandResult {
    match output {
        Some(path) => {
            let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Reads scenario data saved from the API: either the full response or
/// just its `data` object.
fn load_scenario(path: &Path) -> Result<SimulationData, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let data = if value.get("data").is_some() {
        serde_json::from_value::<SimulationResponse>(value)?.data
    } else {
        serde_json::from_value::<SimulationData>(value)?
    };
    log::info!(
        "Loaded scenario '{}' with {} county values from {}",
        data.metric,
        data.data_points.len(),
        path.display()
    );
    Ok(data)
}

fn load_boundaries(path: &Path) -> Result<geojson::FeatureCollection, Box<dyn Error>> {
    let collection = parse_boundaries(&std::fs::read_to_string(path)?)?;
    log::info!(
        "Loaded {} boundary features from {}",
        collection.features.len(),
        path.display()
    );
    Ok(collection)
}

#[derive(Debug, Clone, Copy)]
pub struct TimelineOptions {
    pub summary_only: bool,
    pub month: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColoredMonth<'a, M> {
    label: String,
    #[serde(flatten)]
    month: &'a M,
    /// RGBA per data point, parallel to `dataPoints`.
    colors: Vec<[u8; 4]>,
    levels: Vec<PollutionLevel>,
}

fn color_month<'a>(
    month: &'a MonthlyAggregate,
    scale: &ColorScale<PollutionLevel>,
) -> ColoredMonth<'a, MonthlyAggregate> {
    let (colors, levels) = month
        .data_points
        .iter()
        .map(|p| {
            let (color, level) = scale.classify(p.normalized_amount);
            (color.to_array(), level)
        })
        .unzip();
    ColoredMonth {
        label: format_year_month(&month.year_month),
        month,
        colors,
        levels,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthCursor<T> {
    index: usize,
    count: usize,
    progress: f64,
    can_go_previous: bool,
    can_go_next: bool,
    month: T,
}

/// A pollution legend row with the level's health guidance.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PollutionLegendRow {
    #[serde(flatten)]
    entry: LegendEntry<PollutionLevel>,
    description: &'static str,
}

fn pollution_legend(scale: &ColorScale<PollutionLevel>) -> Vec<PollutionLegendRow> {
    scale
        .legend()
        .into_iter()
        .map(|entry| PollutionLegendRow {
            description: entry.level.description(),
            entry,
        })
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineOutput<'a> {
    chemical: Option<&'a ChemicalConfig>,
    ingest: IngestReport,
    summary: TimelineSummary,
    legend: Vec<PollutionLegendRow>,
    months: Vec<ColoredMonth<'a, MonthlyAggregate>>,
}

/// Picks the color scale for a chemical's timeline: the default pollution
/// scale, with the danger band moved to the chemical's threshold when
/// that threshold falls inside the observed range.
fn scale_for(
    chemical: Option<&ChemicalConfig>,
    months: &[MonthlyAggregate],
) -> ColorScale<PollutionLevel> {
    let fraction = chemical
        .zip(peak_average(months))
        .and_then(|(c, peak)| c.danger_fraction(peak));
    match fraction.map(pollution_scale_for_danger) {
        Some(Ok(scale)) => scale,
        Some(Err(e)) => {
            log::warn!("Using the default pollution scale: {e}");
            pollution_scale().clone()
        }
        None => pollution_scale().clone(),
    }
}

/// `timeline --csv`.
///
/// # Errors
///
/// Returns an error if the chemical is unknown, the CSV cannot be read,
/// or the output cannot be written.
pub fn timeline(
    csv: &Path,
    chemical_id: Option<&str>,
    options: TimelineOptions,
    output: Option<&Path>,
) -> CommandResult {
    let chemical = chemical_id
        .map(|id| {
            envrisk_pollution::registry::chemical(id)
                .ok_or_else(|| format!("Unknown chemical '{id}'"))
        })
        .transpose()?;

    let (months, ingest) = envrisk_pollution::load_timeline(csv)?;
    let summary = TimelineSummary::from_months(&months);

    if options.summary_only {
        return write_json(output, &summary);
    }

    let scale = scale_for(chemical.as_ref(), &months);

    if let Some(index) = options.month {
        let mut cursor = Timeline::new(&months, false);
        let month = cursor
            .go_to(index)
            .ok_or("Timeline is empty; no month to select")?;
        return write_json(
            output,
            &MonthCursor {
                index: cursor.index(),
                count: cursor.len(),
                progress: cursor.progress(),
                can_go_previous: cursor.can_go_previous(),
                can_go_next: cursor.can_go_next(),
                month: color_month(month, &scale),
            },
        );
    }

    write_json(
        output,
        &TimelineOutput {
            chemical: chemical.as_ref(),
            ingest,
            summary,
            legend: pollution_legend(&scale),
            months: months.iter().map(|m| color_month(m, &scale)).collect(),
        },
    )
}

/// `timeline --data-dir`: loads every registered chemical whose CSV is
/// present and merges them month by month.
///
/// # Errors
///
/// Returns an error if no chemical CSV is found, one cannot be read, or
/// the output cannot be written.
pub fn combined_timeline(
    dir: &Path,
    options: TimelineOptions,
    output: Option<&Path>,
) -> CommandResult {
    let chemicals = envrisk_pollution::registry::all_chemicals();
    let mut timelines = BTreeMap::new();

    for chemical in &chemicals {
        let path = dir.join(&chemical.file_name);
        if !path.exists() {
            log::warn!("No data for {} ({} not found)", chemical.name, path.display());
            continue;
        }
        let (months, _) = envrisk_pollution::load_timeline(&path)?;
        timelines.insert(chemical.id.clone(), months);
    }

    if timelines.is_empty() {
        return Err(format!("No chemical CSV files found in {}", dir.display()).into());
    }

    let combined = combine_chemicals(&timelines, &chemicals);
    let summary = TimelineSummary::from_months(&combined);

    if options.summary_only {
        return write_json(output, &summary);
    }

    if let Some(index) = options.month {
        let mut cursor = Timeline::new(&combined, false);
        let month = cursor
            .go_to(index)
            .ok_or("Timeline is empty; no month to select")?;
        return write_json(
            output,
            &MonthCursor {
                index: cursor.index(),
                count: cursor.len(),
                progress: cursor.progress(),
                can_go_previous: cursor.can_go_previous(),
                can_go_next: cursor.can_go_next(),
                month,
            },
        );
    }

    write_json(
        output,
        &serde_json::json!({
            "chemicals": timelines.keys().collect::<Vec<_>>(),
            "summary": summary,
            "legend": pollution_legend(pollution_scale()),
            "months": combined,
        }),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColoredSample {
    position: LonLat,
    value: f64,
    color: [u8; 4],
    level: RiskLevel,
}

impl From<&ScalarSample> for ColoredSample {
    fn from(sample: &ScalarSample) -> Self {
        let (color, level) = risk_scale().classify(sample.value);
        Self {
            position: sample.position,
            value: sample.value,
            color: color.to_array(),
            level,
        }
    }
}

pub struct DensifyOptions<'a> {
    pub boundaries: Option<&'a Path>,
    pub target: Option<usize>,
    pub direct: bool,
}

/// `densify`.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, densification rejects
/// the configuration, or the output cannot be written.
pub fn densify(
    config: &PipelineConfig,
    multi: &MultiProgress,
    scenario: &Path,
    options: &DensifyOptions<'_>,
    output: Option<&Path>,
) -> CommandResult {
    let samples = load_scenario(scenario)?.samples();

    let index = options
        .boundaries
        .map(|path| -> Result<CountyIndex, Box<dyn Error>> {
            Ok(CountyIndex::from_collection(&load_boundaries(path)?)?)
        })
        .transpose()?;
    let region: &dyn Region = match &index {
        Some(index) => index,
        None => &config.region,
    };

    let points = if options.direct {
        direct_samples(&samples, region)
    } else {
        let target = options.target.unwrap_or(config.densify.target_point_count);
        let params = config.densify.params(config.interpolation.params());
        let progress = IndicatifProgress::work_bar(multi, "Densifying");
        densify_samples(&samples, region, target, &params, &*progress)?
    };

    let colored: Vec<ColoredSample> = points.iter().map(ColoredSample::from).collect();
    write_json(output, &colored)
}

/// `enrich`.
///
/// # Errors
///
/// Returns an error if the scenario or boundaries cannot be loaded or
/// downloaded, or the output cannot be written.
pub async fn enrich(
    scenario: &Path,
    boundaries: Option<&Path>,
    source_id: &str,
    output: Option<&Path>,
) -> CommandResult {
    let records = load_scenario(scenario)?.scenario_records();

    let collection = match boundaries {
        Some(path) => load_boundaries(path)?,
        None => {
            let source = envrisk_geography::registry::source(source_id)
                .ok_or_else(|| format!("Unknown boundary source '{source_id}'"))?;
            let client = reqwest::Client::new();
            let cache = BoundaryCache::new();
            fetch_cached(&client, &cache, &source).await?.as_ref().clone()
        }
    };

    let (enriched, summary) = enrich_collection(&collection, &records);
    if summary.unmatched > 0 {
        log::warn!(
            "{} of {} counties have no scenario data: {}",
            summary.unmatched,
            summary.total,
            summary.unmatched_names.join(", ")
        );
    }
    write_json(output, &enriched)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SurfaceOutput {
    grid: RasterGrid,
    colors: Vec<[u8; 4]>,
    levels: Vec<RiskLevel>,
    legend: Vec<LegendEntry<RiskLevel>>,
}

impl SurfaceOutput {
    fn new(grid: RasterGrid) -> Self {
        let scale = risk_scale();
        let (colors, levels) = grid
            .values()
            .iter()
            .map(|&v| {
                let (color, level) = scale.classify(v);
                (color.to_array(), level)
            })
            .unzip();
        Self {
            grid,
            colors,
            levels,
            legend: scale.legend(),
        }
    }
}

/// `surface`: IDW over the configured region, then Gaussian smoothing.
///
/// # Errors
///
/// Returns an error if the scenario has no values, the raster cannot be
/// built, or the output cannot be written.
pub fn surface(
    config: &PipelineConfig,
    multi: &MultiProgress,
    scenario: &Path,
    width: usize,
    height: usize,
    mesh: bool,
    output: Option<&Path>,
) -> CommandResult {
    let samples = load_scenario(scenario)?.samples();
    if samples.is_empty() {
        return Err("Scenario has no data points to interpolate".into());
    }
    let idw = config.interpolation.params();
    // Rejects bad parameters once instead of per cell.
    estimate(samples[0].position, &samples, &idw)?;

    let steps = IndicatifProgress::steps_bar(multi, "Surface", 3);
    steps.set_message(format!("Interpolating {width}x{height} cells"));
    let raw = RasterGrid::from_fn(&config.region, width, height, |point| {
        estimate(point, &samples, &idw).unwrap_or(0.0)
    })?;
    steps.inc(1);

    steps.set_message("Smoothing".to_string());
    let smoothed = raw.smoothed(config.smoothing.sigma, config.smoothing.passes)?;
    steps.inc(1);
    log::info!(
        "Built {width}x{height} surface (sigma {}, {} passes)",
        config.smoothing.sigma,
        config.smoothing.passes
    );

    steps.set_message("Writing".to_string());
    if mesh {
        write_json(
            output,
            &HeightfieldMesh::build(&smoothed, DEFAULT_ELEVATION_MULTIPLIER)?,
        )?;
    } else {
        write_json(output, &SurfaceOutput::new(smoothed))?;
    }
    steps.inc(1);
    steps.finish("Surface written".to_string());

    Ok(())
}

/// Optional weight overrides for `terrain`, in percent.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightPercents {
    pub air_quality: Option<f64>,
    pub noise: Option<f64>,
    pub flood: Option<f64>,
}

impl WeightPercents {
    fn apply(self, weights: RiskWeights) -> RiskWeights {
        [
            (RiskFactor::AirQuality, self.air_quality),
            (RiskFactor::NoisePollution, self.noise),
            (RiskFactor::FloodClimate, self.flood),
        ]
        .into_iter()
        .fold(weights, |w, (factor, percent)| {
            percent.map_or(w, |p| w.with_percent(factor, p))
        })
    }
}

/// `terrain`.
///
/// # Errors
///
/// Returns an error if the resolution or region is unusable, or the
/// output cannot be written.
pub fn terrain(
    config: &PipelineConfig,
    multi: &MultiProgress,
    resolution: usize,
    percents: WeightPercents,
    mesh: bool,
    output: Option<&Path>,
) -> CommandResult {
    let steps = IndicatifProgress::steps_bar(multi, "Terrain", 2);
    steps.set_message(format!("Evaluating {resolution}x{resolution} cells"));
    let weights = percents.apply(RiskWeights::default()).normalized();
    let terrain = generate_risk_terrain(&config.region, resolution, &weights)?;
    steps.inc(1);

    steps.set_message("Writing".to_string());
    if mesh {
        write_json(
            output,
            &HeightfieldMesh::build(&terrain.grid, DEFAULT_ELEVATION_MULTIPLIER)?,
        )?;
    } else {
        write_json(output, &terrain)?;
    }
    steps.inc(1);
    steps.finish("Terrain written".to_string());

    Ok(())
}

fn scenario_client(config: &PipelineConfig) -> Result<ScenarioClient, Box<dyn Error>> {
    Ok(ScenarioClient::new(
        &config.scenario_api.base_url,
        config.scenario_api.timeout(),
    )?)
}

/// `simulate`.
///
/// # Errors
///
/// Returns an error if the API call fails or the output cannot be
/// written.
pub async fn simulate(
    config: &PipelineConfig,
    prompt: &str,
    output: Option<&Path>,
) -> CommandResult {
    let client = scenario_client(config)?;
    let response = client.simulate(prompt).await?;
    write_json(output, &response)
}

/// `health`.
///
/// # Errors
///
/// Returns an error if the API is unreachable or unhealthy.
pub async fn health(config: &PipelineConfig, output: Option<&Path>) -> CommandResult {
    let client = scenario_client(config)?;
    let status = client.health().await?;
    log::info!("Scenario API at {} is {}", client.base_url(), status.status);
    write_json(output, &status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_overrides_only_touch_given_factors() {
        let weights = WeightPercents {
            noise: Some(50.0),
            ..WeightPercents::default()
        }
        .apply(RiskWeights::default());

        let defaults = RiskWeights::default();
        assert!((weights.get(RiskFactor::NoisePollution) - 0.5).abs() < 1e-12);
        assert!(
            (weights.get(RiskFactor::AirQuality) - defaults.get(RiskFactor::AirQuality)).abs()
                < 1e-12
        );
    }

    #[test]
    fn colored_samples_use_the_risk_scale() {
        let colored = ColoredSample::from(&ScalarSample::new(-122.3, 47.6, 0.0));
        assert_eq!(colored.level, RiskLevel::VeryLow);
        assert_eq!(colored.color, [34, 197, 94, 255]);
    }

    #[test]
    fn pollution_legend_carries_health_guidance() {
        let legend = serde_json::to_value(pollution_legend(pollution_scale())).unwrap();
        let rows = legend.as_array().unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["level"], "good");
        assert_eq!(
            rows[0]["description"],
            PollutionLevel::Good.description()
        );
        assert_eq!(rows[4]["level"], "hazardous");
        assert!(rows[4]["startColor"].is_object());
    }

    #[test]
    fn terrain_writes_one_breakdown_per_cell() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let path = std::env::temp_dir().join(format!("envrisk-terrain-{}.json", std::process::id()));

        terrain(
            &PipelineConfig::default(),
            &multi,
            4,
            WeightPercents::default(),
            false,
            Some(&path),
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(json["breakdowns"].as_array().unwrap().len(), 16);
    }

    #[test]
    fn scale_without_chemical_is_the_default() {
        assert_eq!(&scale_for(None, &[]), pollution_scale());
    }
}
