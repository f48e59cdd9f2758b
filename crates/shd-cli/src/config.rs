//! Run configuration.
//!
//! Defaults reproduce the file names the dashboard expects, so a bare
//! `shd all --data-dir data` needs no config file. A TOML file passed with
//! `--config` overrides any subset of the settings, and command-line flags
//! override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shd_ingest::{ReadOptions, SourceEncoding};
use shd_model::{CollisionPolicy, OverlapPolicy, YearSelector};

/// Placeholder in output file names replaced by the resolved year.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// One source file and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    /// Path relative to the data directory.
    pub path: PathBuf,
    #[serde(default)]
    pub encoding: SourceEncoding,
    /// Extra cell values read as missing.
    #[serde(default)]
    pub na_tokens: Vec<String>,
}

impl SourceFile {
    fn utf8(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            encoding: SourceEncoding::Utf8,
            na_tokens: Vec::new(),
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            na_tokens: self.na_tokens.clone(),
            ..ReadOptions::default().with_encoding(self.encoding)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputFiles {
    /// Base table every other source is joined onto.
    pub codes: SourceFile,
    pub plastic: SourceFile,
    pub gef: SourceFile,
    pub whr: SourceFile,
    /// Directory of yearly happiness snapshots.
    pub timeseries_dir: PathBuf,
    pub renewables: SourceFile,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            codes: SourceFile::utf8("plotly_countries_and_codes.csv"),
            plastic: SourceFile::utf8("global_plastic_waste.csv"),
            gef: SourceFile {
                encoding: SourceEncoding::Latin1,
                ..SourceFile::utf8("GEF_2023.csv")
            },
            whr: SourceFile::utf8("WHR_2023.csv"),
            timeseries_dir: PathBuf::from("timeseries"),
            renewables: SourceFile::utf8("renewables.csv"),
        }
    }
}

/// Output file names, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputFiles {
    pub global: PathBuf,
    pub timeseries: PathBuf,
    /// One-year renewables slice. `{year}` is replaced by the year kept.
    pub renewables_year: String,
    /// Region subset of the renewables slice. `{year}` is replaced too.
    pub renewables_subset: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            global: PathBuf::from("global_data_new.csv"),
            timeseries: PathBuf::from("whr_timeseries.csv"),
            renewables_year: "renewables{year}.csv".to_string(),
            renewables_subset: "EUrenewables{year}.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankingSettings {
    pub column: String,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenewablesSettings {
    pub key: String,
    pub year_column: String,
    pub year: YearSelector,
    /// Region name looked up in the standards tables.
    pub region: String,
    /// Country marked in the highlight column; none when unset.
    pub highlight: Option<String>,
    pub highlight_column: String,
    pub highlight_other: String,
    pub ranking: Option<RankingSettings>,
}

impl Default for RenewablesSettings {
    fn default() -> Self {
        Self {
            key: "entity".to_string(),
            year_column: "year".to_string(),
            year: YearSelector::Year(2020),
            region: "eu27".to_string(),
            highlight: Some("Finland".to_string()),
            highlight_column: "highlight".to_string(),
            highlight_other: "Other".to_string(),
            ranking: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrelateSettings {
    pub x: String,
    pub y: String,
    /// Column holding the income group of each country.
    pub group_column: Option<String>,
}

impl Default for CorrelateSettings {
    fn default() -> Self {
        Self {
            x: "sdgi".to_string(),
            y: "happiness_score".to_string(),
            group_column: Some("income_group".to_string()),
        }
    }
}

/// Settings for every job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub standards_dir: Option<PathBuf>,
    /// Join key of the global merge.
    pub key: String,
    pub collision_policy: CollisionPolicy,
    pub overlap_policy: OverlapPolicy,
    pub inputs: InputFiles,
    pub outputs: OutputFiles,
    pub renewables: RenewablesSettings,
    pub correlate: CorrelateSettings,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            out_dir: PathBuf::from("."),
            standards_dir: None,
            key: "country".to_string(),
            collision_policy: CollisionPolicy::default(),
            overlap_policy: OverlapPolicy::default(),
            inputs: InputFiles::default(),
            outputs: OutputFiles::default(),
            renewables: RenewablesSettings::default(),
            correlate: CorrelateSettings::default(),
        }
    }
}

impl PrepConfig {
    /// Reads a config file. Relative directories in it are resolved against
    /// the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: PrepConfig =
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.data_dir = base.join(&config.data_dir);
            config.out_dir = base.join(&config.out_dir);
            config.standards_dir = config.standards_dir.map(|dir| base.join(dir));
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn input_path(&self, source: &SourceFile) -> PathBuf {
        self.data_dir.join(&source.path)
    }

    pub fn timeseries_dir(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.timeseries_dir)
    }

    pub fn global_output(&self) -> PathBuf {
        self.out_dir.join(&self.outputs.global)
    }

    pub fn timeseries_output(&self) -> PathBuf {
        self.out_dir.join(&self.outputs.timeseries)
    }

    pub fn renewables_year_output(&self, year: i64) -> PathBuf {
        self.out_dir
            .join(with_year(&self.outputs.renewables_year, year))
    }

    pub fn renewables_subset_output(&self, year: i64) -> PathBuf {
        self.out_dir
            .join(with_year(&self.outputs.renewables_subset, year))
    }
}

fn with_year(name: &str, year: i64) -> String {
    name.replace(YEAR_PLACEHOLDER, &year.to_string())
}

/// Path of the coercion audit written next to a CSV output.
pub fn audit_path(output: &Path) -> PathBuf {
    output.with_extension("coercion.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_files() {
        let config = PrepConfig::default();
        assert_eq!(
            config.global_output(),
            PathBuf::from("./global_data_new.csv")
        );
        assert_eq!(
            config.renewables_subset_output(2020),
            PathBuf::from("./EUrenewables2020.csv")
        );
        assert_eq!(config.inputs.gef.encoding, SourceEncoding::Latin1);
        assert_eq!(
            audit_path(&config.global_output()),
            PathBuf::from("./global_data_new.coercion.json")
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let text = r#"
            out_dir = "build"
            overlap_policy = "keep_left"

            [inputs.whr]
            path = "WHR_2024.csv"

            [renewables]
            year = "latest"
            highlight = "Sweden"
        "#;
        let config: PrepConfig = toml::from_str(text).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("build"));
        assert_eq!(config.overlap_policy, OverlapPolicy::KeepLeft);
        assert_eq!(config.inputs.whr.path, PathBuf::from("WHR_2024.csv"));
        assert_eq!(config.inputs.codes, InputFiles::default().codes);
        assert_eq!(config.renewables.year, YearSelector::Latest);
        assert_eq!(config.renewables.highlight.as_deref(), Some("Sweden"));
        assert_eq!(config.renewables.region, "eu27");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<PrepConfig, _> = toml::from_str("outdir = \"x\"");
        assert!(result.is_err());
    }
}
