use std::path::Path;

use anyhow::{Context, Result, bail};
use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use shd_ingest::{ReadOptions, discover_snapshots};
use shd_model::{CoercionReport, YearSelector};
use shd_standards::{Standards, load_standards};
use shd_transform::{
    Highlight, INCOME_GROUPS, MergeReport, Ranking, Snapshot, SourceFrame, SubsetSpec,
    build_time_series, coerce_columns, correlate, export_subset, filter_year, indicator_summary,
    merge_left,
};

use crate::cli::{CommonArgs, CorrelateArgs, DescribeArgs, RenewablesArgs};
use crate::config::{PrepConfig, audit_path};
use crate::pipeline::{Artifact, canonicalize, ingest, log_inventory, read_cleaned, write_artifacts};
use crate::types::JobResult;

/// Value column of the yearly happiness snapshots.
const SNAPSHOT_VALUE: &str = "happiness_score";

/// Builds the run configuration: defaults, then `--config`, then flags.
pub fn resolve_config(args: &CommonArgs) -> Result<PrepConfig> {
    let mut config = match &args.config {
        Some(path) => PrepConfig::load(path)?,
        None => PrepConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(dir) = &args.out_dir {
        config.out_dir.clone_from(dir);
    }
    if let Some(dir) = &args.standards_dir {
        config.standards_dir = Some(dir.clone());
    }
    if let Some(policy) = args.collision_policy {
        config.collision_policy = policy.into();
    }
    if let Some(policy) = args.overlap_policy {
        config.overlap_policy = policy.into();
    }
    Ok(config)
}

fn apply_renewables_args(config: &mut PrepConfig, args: &RenewablesArgs) {
    let settings = &mut config.renewables;
    if let Some(year) = args.year {
        settings.year = year;
    }
    if let Some(region) = &args.region {
        settings.region.clone_from(region);
    }
    if let Some(country) = &args.highlight {
        settings.highlight = Some(country.clone());
    }
    if args.no_highlight {
        settings.highlight = None;
    }
}

pub fn load_job_standards(config: &PrepConfig) -> Result<Standards> {
    load_standards(config.standards_dir.as_deref()).context("load standards")
}

// ============================================================================
// global
// ============================================================================

/// The merged and coerced global dataset, before anything is written.
#[derive(Debug)]
pub struct GlobalBuild {
    pub frame: DataFrame,
    pub merge: MergeReport,
    pub coercion: CoercionReport,
}

/// Reads the four country tables and builds the global dataset.
pub fn build_global(config: &PrepConfig, standards: &Standards) -> Result<GlobalBuild> {
    let inputs = &config.inputs;
    let sources = [
        ("codes", &inputs.codes),
        ("plastic", &inputs.plastic),
        ("gef", &inputs.gef),
        ("whr", &inputs.whr),
    ];

    let mut raw_tables = Vec::with_capacity(sources.len());
    for (label, source) in sources {
        raw_tables.push((label, ingest(&config.input_path(source), &source.read_options())?));
    }

    let mut frames = Vec::with_capacity(raw_tables.len());
    for (label, raw) in &raw_tables {
        let table = canonicalize(
            raw,
            label,
            config.collision_policy,
            &standards.column_renames,
        )?;
        frames.push(SourceFrame::new(table.label, table.frame));
    }
    let Some((base, joins)) = frames.split_first() else {
        bail!("no source tables to merge");
    };

    let (merged, merge) =
        merge_left(base, joins, &config.key, config.overlap_policy).context("merge sources")?;
    log_inventory("before coercion", &merged);

    let schema = standards.schema("global")?;
    let (frame, coercion) = coerce_columns(&merged, schema).context("coerce global dataset")?;
    log_inventory("after coercion", &frame);

    Ok(GlobalBuild {
        frame,
        merge,
        coercion,
    })
}

fn global_result(
    config: &PrepConfig,
    build: &GlobalBuild,
    dry_run: bool,
) -> Result<JobResult> {
    let output = config.global_output();
    let artifacts = [
        Artifact::Table {
            path: output.clone(),
            frame: build.frame.clone(),
        },
        Artifact::Coercion {
            path: audit_path(&output),
            report: build.coercion.clone(),
        },
    ];
    let mut result = JobResult::new("global");
    result.outputs = write_artifacts(&artifacts, dry_run)?;
    result.parse_failures = build.coercion.total_failures();
    result.joins.clone_from(&build.merge.steps);
    Ok(result)
}

pub fn run_global(args: &CommonArgs) -> Result<JobResult> {
    let config = resolve_config(args)?;
    let standards = load_job_standards(&config)?;
    global_job(&config, &standards, args.dry_run)
}

pub fn global_job(config: &PrepConfig, standards: &Standards, dry_run: bool) -> Result<JobResult> {
    let span = info_span!("global", data_dir = %config.data_dir.display());
    let _guard = span.enter();
    let build = build_global(config, standards)?;
    global_result(config, &build, dry_run)
}

// ============================================================================
// timeseries
// ============================================================================

pub fn run_timeseries(args: &CommonArgs) -> Result<JobResult> {
    let config = resolve_config(args)?;
    let standards = load_job_standards(&config)?;
    timeseries_job(&config, &standards, args.dry_run)
}

pub fn timeseries_job(
    config: &PrepConfig,
    standards: &Standards,
    dry_run: bool,
) -> Result<JobResult> {
    let dir = config.timeseries_dir();
    let span = info_span!("timeseries", dir = %dir.display());
    let _guard = span.enter();

    let files = discover_snapshots(&dir).context("discover snapshot files")?;
    if files.is_empty() {
        bail!("no snapshot files in {}", dir.display());
    }
    info!(files = files.len(), "discovered snapshots");

    let raw_tables = files
        .iter()
        .map(|file| ingest(&file.path, &ReadOptions::default()).map(|raw| (file, raw)))
        .collect::<Result<Vec<_>>>()?;

    let schema = standards.schema("snapshot")?;
    let mut parse_failures = 0usize;
    let mut snapshots = Vec::with_capacity(raw_tables.len());
    for (file, raw) in &raw_tables {
        let label = format!("snapshot {}", file.year);
        let table = canonicalize(
            raw,
            &label,
            config.collision_policy,
            &standards.column_renames,
        )?;
        let (typed, report) =
            coerce_columns(&table.frame, schema).with_context(|| format!("coerce {label}"))?;
        parse_failures += report.total_failures();
        snapshots.push(Snapshot::new(file.year.clone(), typed));
    }

    let series = build_time_series(&snapshots, &config.key, SNAPSHOT_VALUE)
        .context("build time series")?;

    let artifacts = [Artifact::Table {
        path: config.timeseries_output(),
        frame: series,
    }];
    let mut result = JobResult::new("timeseries");
    result.outputs = write_artifacts(&artifacts, dry_run)?;
    result.parse_failures = parse_failures;
    Ok(result)
}

// ============================================================================
// renewables
// ============================================================================

pub fn run_renewables(args: &RenewablesArgs) -> Result<JobResult> {
    let mut config = resolve_config(&args.common)?;
    apply_renewables_args(&mut config, args);
    let standards = load_job_standards(&config)?;
    renewables_job(&config, &standards, args.common.dry_run)
}

pub fn renewables_job(
    config: &PrepConfig,
    standards: &Standards,
    dry_run: bool,
) -> Result<JobResult> {
    let settings = &config.renewables;
    let span = info_span!("renewables", year = %settings.year, region = %settings.region);
    let _guard = span.enter();

    let source = &config.inputs.renewables;
    let raw = ingest(&config.input_path(source), &source.read_options())?;
    let region = standards.region(&settings.region)?.clone();

    let table = canonicalize(
        &raw,
        "renewables",
        config.collision_policy,
        &standards.column_renames,
    )?;
    let schema = standards.schema("renewables")?;
    let (renewables, coercion) =
        coerce_columns(&table.frame, schema).context("coerce renewables")?;

    let (year_slice, year) = filter_year(&renewables, &settings.year_column, settings.year)
        .context("filter renewables by year")?;

    let mut spec = SubsetSpec::new(settings.key.as_str())
        .with_year(settings.year_column.as_str(), YearSelector::Year(year))
        .with_aliases(standards.country_aliases.clone())
        .with_region(region);
    if let Some(ranking) = &settings.ranking {
        spec = spec.with_ranking(Ranking {
            column: ranking.column.clone(),
            top_n: ranking.top_n,
        });
    }
    if let Some(country) = &settings.highlight {
        spec = spec.with_highlight(Highlight {
            column: settings.highlight_column.clone(),
            country: country.clone(),
            label: country.clone(),
            other: settings.highlight_other.clone(),
        });
    }
    let (subset, report) = export_subset(&year_slice, &spec).context("export subset")?;
    if subset.height() == 0 {
        warn!(year, region = %settings.region, "subset is empty");
    }

    let artifacts = [
        Artifact::Table {
            path: config.renewables_year_output(year),
            frame: year_slice,
        },
        Artifact::Table {
            path: config.renewables_subset_output(year),
            frame: subset,
        },
    ];
    let mut result = JobResult::new("renewables");
    result.outputs = write_artifacts(&artifacts, dry_run)?;
    result.parse_failures = coercion.total_failures();
    result.subset = Some(report);
    Ok(result)
}

// ============================================================================
// correlate / describe
// ============================================================================

pub fn run_correlate(args: &CorrelateArgs) -> Result<JobResult> {
    let mut config = resolve_config(&args.common)?;
    if let Some(x) = &args.x {
        config.correlate.x.clone_from(x);
    }
    if let Some(y) = &args.y {
        config.correlate.y.clone_from(y);
    }
    if args.no_groups {
        config.correlate.group_column = None;
    }
    let input = args.input.clone().unwrap_or_else(|| config.global_output());
    let global = read_cleaned(&input, config.collision_policy)?;
    correlate_job(&config, &global, args.json.as_deref(), args.common.dry_run)
}

pub fn correlate_job(
    config: &PrepConfig,
    global: &DataFrame,
    json: Option<&Path>,
    dry_run: bool,
) -> Result<JobResult> {
    let settings = &config.correlate;
    let span = info_span!("correlate", x = %settings.x, y = %settings.y);
    let _guard = span.enter();

    let summaries = correlate(
        global,
        &settings.x,
        &settings.y,
        settings.group_column.as_deref(),
        &INCOME_GROUPS,
    )
    .context("correlate indicators")?;

    let mut result = JobResult::new("correlate");
    if let Some(path) = json {
        let artifacts = [Artifact::Correlations {
            path: path.to_path_buf(),
            summaries: summaries.clone(),
        }];
        result.outputs = write_artifacts(&artifacts, dry_run)?;
    }
    result.correlations = summaries;
    Ok(result)
}

pub fn run_describe(args: &DescribeArgs) -> Result<JobResult> {
    let config = resolve_config(&args.common)?;
    let input = args.input.clone().unwrap_or_else(|| config.global_output());
    let global = read_cleaned(&input, config.collision_policy)?;

    let span = info_span!("describe", input = %input.display());
    let _guard = span.enter();
    let mut result = JobResult::new("describe");
    for column in &args.columns {
        let summary = indicator_summary(&global, column, &config.key, args.top)
            .with_context(|| format!("describe {column}"))?;
        result.indicators.push(summary);
    }
    Ok(result)
}

// ============================================================================
// all
// ============================================================================

/// Runs every job. The correlation uses the in-memory global dataset, so it
/// also works on a dry run.
pub fn run_all(args: &RenewablesArgs) -> Result<Vec<JobResult>> {
    let mut config = resolve_config(&args.common)?;
    apply_renewables_args(&mut config, args);
    let standards = load_job_standards(&config)?;
    let dry_run = args.common.dry_run;

    let build = {
        let span = info_span!("global", data_dir = %config.data_dir.display());
        let _guard = span.enter();
        build_global(&config, &standards)?
    };
    let global = global_result(&config, &build, dry_run)?;
    let timeseries = timeseries_job(&config, &standards, dry_run)?;
    let renewables = renewables_job(&config, &standards, dry_run)?;
    let correlations = correlate_job(&config, &build.frame, None, dry_run)?;
    Ok(vec![global, timeseries, renewables, correlations])
}

