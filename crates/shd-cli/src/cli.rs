//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use shd_model::{CollisionPolicy, OverlapPolicy, YearSelector};

#[derive(Parser)]
#[command(
    name = "shd",
    version,
    about = "Prepare the sustainability and happiness datasets",
    long_about = "Merge, clean and reshape the public CSV datasets read by the \
                  sustainability and happiness dashboard.\n\n\
                  Every job reads all of its inputs before writing anything, and \
                  each output appears only once it is complete."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge the country tables into the cleaned global dataset.
    Global(CommonArgs),

    /// Pivot the yearly happiness snapshots into a country-by-year table.
    Timeseries(CommonArgs),

    /// Cut the one-year, one-region renewables subset.
    Renewables(RenewablesArgs),

    /// Correlate two indicators of the global dataset per income group.
    Correlate(CorrelateArgs),

    /// Print coverage, mean and leaders of global dataset indicators.
    Describe(DescribeArgs),

    /// Run global, timeseries, renewables and correlate in order.
    All(RenewablesArgs),
}

/// Options shared by every job.
#[derive(Args, Clone, Default)]
pub struct CommonArgs {
    /// TOML run configuration.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the source CSV files.
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving the outputs.
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Directory of replacement standards tables (also SHD_STANDARDS_DIR).
    #[arg(long = "standards-dir", value_name = "DIR")]
    pub standards_dir: Option<PathBuf>,

    /// What to do when two headers normalize to the same name.
    #[arg(long = "collision-policy", value_enum)]
    pub collision_policy: Option<CollisionPolicyArg>,

    /// What to do when a joined table repeats an existing column.
    #[arg(long = "overlap-policy", value_enum)]
    pub overlap_policy: Option<OverlapPolicyArg>,

    /// Run every stage and report, but write no files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Clone, Default)]
pub struct RenewablesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Year to keep, or `latest`.
    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<YearSelector>,

    /// Region whose members are kept.
    #[arg(long = "region", value_name = "NAME")]
    pub region: Option<String>,

    /// Country marked in the highlight column.
    #[arg(long = "highlight", value_name = "COUNTRY", conflicts_with = "no_highlight")]
    pub highlight: Option<String>,

    /// Leave out the highlight column.
    #[arg(long = "no-highlight")]
    pub no_highlight: bool,
}

#[derive(Args, Clone, Default)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Cleaned global dataset (default: the global output path).
    #[arg(long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Indicator on the x axis.
    #[arg(long = "x", value_name = "COLUMN")]
    pub x: Option<String>,

    /// Indicator on the y axis.
    #[arg(long = "y", value_name = "COLUMN")]
    pub y: Option<String>,

    /// Correlate over all rows only, without income groups.
    #[arg(long = "no-groups")]
    pub no_groups: bool,

    /// Also write the summaries as JSON.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Cleaned global dataset (default: the global output path).
    #[arg(long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Indicator columns to describe.
    #[arg(
        long = "column",
        value_name = "COLUMN",
        default_values_t = [
            "happiness_score".to_string(),
            "sdgi".to_string(),
            "hdi".to_string(),
            "per_capita_gdp".to_string(),
        ]
    )]
    pub columns: Vec<String>,

    /// Leaders listed per indicator.
    #[arg(long = "top", value_name = "N", default_value_t = 3)]
    pub top: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CollisionPolicyArg {
    Error,
    FirstWins,
    LastWins,
    Suffix,
}

impl From<CollisionPolicyArg> for CollisionPolicy {
    fn from(value: CollisionPolicyArg) -> Self {
        match value {
            CollisionPolicyArg::Error => CollisionPolicy::Error,
            CollisionPolicyArg::FirstWins => CollisionPolicy::FirstWins,
            CollisionPolicyArg::LastWins => CollisionPolicy::LastWins,
            CollisionPolicyArg::Suffix => CollisionPolicy::Suffix,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OverlapPolicyArg {
    Error,
    KeepLeft,
    KeepRight,
    Suffix,
    SuffixXy,
}

impl From<OverlapPolicyArg> for OverlapPolicy {
    fn from(value: OverlapPolicyArg) -> Self {
        match value {
            OverlapPolicyArg::Error => OverlapPolicy::Error,
            OverlapPolicyArg::KeepLeft => OverlapPolicy::KeepLeft,
            OverlapPolicyArg::KeepRight => OverlapPolicy::KeepRight,
            OverlapPolicyArg::Suffix => OverlapPolicy::Suffix,
            OverlapPolicyArg::SuffixXy => OverlapPolicy::SuffixXy,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_renewables_flags() {
        let cli = Cli::try_parse_from([
            "shd",
            "renewables",
            "--data-dir",
            "data",
            "--year",
            "latest",
            "--region",
            "EU27",
            "--overlap-policy",
            "keep-left",
        ])
        .unwrap();
        let Command::Renewables(args) = cli.command else {
            panic!("expected renewables");
        };
        assert_eq!(args.year, Some(YearSelector::Latest));
        assert_eq!(args.region.as_deref(), Some("EU27"));
        assert_eq!(args.common.data_dir, Some(PathBuf::from("data")));
        assert!(matches!(
            args.common.overlap_policy,
            Some(OverlapPolicyArg::KeepLeft)
        ));
    }

    #[test]
    fn rejects_bad_year() {
        assert!(Cli::try_parse_from(["shd", "renewables", "--year", "soon"]).is_err());
    }
}
