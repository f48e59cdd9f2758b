//! Year and region filtered subsets.
//!
//! The subset pipeline runs in a fixed order: country aliases, year filter,
//! region filter, optional ranking, then the highlight column.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;
use shd_common::{column_f64_values, column_text_values};
use shd_model::{MappingTable, Region, YearSelector};

use crate::coerce::coerce_integer;
use crate::error::{Result, TransformError};

/// Keep the top rows by a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub column: String,
    /// Rows kept after sorting; all when `None`.
    pub top_n: Option<usize>,
}

/// Categorical column marking one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub column: String,
    pub country: String,
    /// Value for the highlighted country's rows.
    pub label: String,
    /// Value for every other row.
    pub other: String,
}

impl Highlight {
    /// Highlights `country` in a column named `highlight`, labelled with the
    /// country name against `Other`.
    pub fn country(country: impl Into<String>) -> Self {
        let country = country.into();
        Self {
            column: "highlight".to_string(),
            label: country.clone(),
            country,
            other: "Other".to_string(),
        }
    }
}

/// What to cut out of a table.
#[derive(Debug, Clone)]
pub struct SubsetSpec {
    /// Country key column.
    pub key: String,
    pub year_column: String,
    /// No year filter when `None`.
    pub year: Option<YearSelector>,
    pub aliases: Option<MappingTable>,
    /// No region filter when `None`.
    pub region: Option<Region>,
    pub ranking: Option<Ranking>,
    pub highlight: Option<Highlight>,
}

impl SubsetSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            year_column: "year".to_string(),
            year: None,
            aliases: None,
            region: None,
            ranking: None,
            highlight: None,
        }
    }

    pub fn with_year(mut self, column: impl Into<String>, year: YearSelector) -> Self {
        self.year_column = column.into();
        self.year = Some(year);
        self
    }

    pub fn with_aliases(mut self, aliases: MappingTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_ranking(mut self, ranking: Ranking) -> Self {
        self.ranking = Some(ranking);
        self
    }

    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }
}

/// Row counts through each subset stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubsetReport {
    pub rows_in: usize,
    /// Key cells rewritten by the alias table.
    pub aliased: usize,
    /// Year the filter kept, after resolving `latest`.
    pub year: Option<i64>,
    pub rows_after_year: usize,
    pub rows_after_region: usize,
    /// Region members with no row in the output.
    pub missing_members: Vec<String>,
    pub rows_out: usize,
    /// Rows carrying the highlight label.
    pub highlighted: usize,
}

/// Rewrites key values found in the alias table.
///
/// Returns the new frame and the number of cells changed.
pub fn apply_aliases(df: &DataFrame, key: &str, aliases: &MappingTable) -> Result<(DataFrame, usize)> {
    let column = require(df, key)?;
    let mut changed = 0usize;
    let values: Vec<Option<String>> = column_text_values(column)
        .into_iter()
        .map(|value| {
            value.map(|value| match aliases.get(&value) {
                Some(target) => {
                    changed += 1;
                    target.to_string()
                }
                None => value,
            })
        })
        .collect();
    let mut out = df.clone();
    out.with_column(Column::new(key.into(), values))?;
    if changed > 0 {
        tracing::info!(column = key, changed, "applied country aliases");
    }
    Ok((out, changed))
}

/// Year values of a column; text is parsed, non-integral values are `None`.
fn year_values(column: &Column) -> Vec<Option<i64>> {
    column_text_values(column)
        .into_iter()
        .map(|value| value.and_then(|value| coerce_integer(&value)))
        .collect()
}

/// Resolves `selector` against the years present in `column`.
///
/// `latest` is the maximum year of the whole column.
pub fn resolve_year(df: &DataFrame, column: &str, selector: YearSelector) -> Result<i64> {
    match selector {
        YearSelector::Year(year) => Ok(year),
        YearSelector::Latest => year_values(require(df, column)?)
            .into_iter()
            .flatten()
            .max()
            .ok_or_else(|| TransformError::NoYearValues {
                column: column.to_string(),
            }),
    }
}

/// Keeps the rows whose `column` equals the selected year.
pub fn filter_year(df: &DataFrame, column: &str, selector: YearSelector) -> Result<(DataFrame, i64)> {
    let year = resolve_year(df, column, selector)?;
    let mask: Vec<bool> = year_values(require(df, column)?)
        .into_iter()
        .map(|value| value == Some(year))
        .collect();
    let filtered = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
    if filtered.height() == 0 {
        tracing::warn!(column, year, "no rows for the selected year");
    }
    tracing::debug!(column, year, rows = filtered.height(), "filtered by year");
    Ok((filtered, year))
}

/// Keeps the rows whose key is a member of `region`.
pub fn filter_region(df: &DataFrame, key: &str, region: &Region) -> Result<DataFrame> {
    let mask: Vec<bool> = column_text_values(require(df, key)?)
        .iter()
        .map(|value| value.as_deref().is_some_and(|value| region.contains(value)))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

/// Sorts descending by `ranking.column`, nulls last, and keeps the top rows.
///
/// Ties keep their input order.
pub fn rank_rows(df: &DataFrame, ranking: &Ranking) -> Result<DataFrame> {
    let values = column_f64_values(require(df, &ranking.column)?);
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| match (values[a], values[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    if let Some(top_n) = ranking.top_n {
        order.truncate(top_n);
    }
    let indices = IdxCa::from_vec(
        "idx".into(),
        order.into_iter().map(|idx| idx as IdxSize).collect(),
    );
    Ok(df.take(&indices)?)
}

/// Adds (or replaces) the highlight column.
///
/// Returns the new frame and the number of highlighted rows.
pub fn add_highlight(df: &DataFrame, key: &str, highlight: &Highlight) -> Result<(DataFrame, usize)> {
    let mut highlighted = 0usize;
    let labels: Vec<&str> = column_text_values(require(df, key)?)
        .iter()
        .map(|value| {
            if value.as_deref() == Some(highlight.country.as_str()) {
                highlighted += 1;
                highlight.label.as_str()
            } else {
                highlight.other.as_str()
            }
        })
        .collect();
    let mut out = df.clone();
    out.with_column(Column::new(highlight.column.as_str().into(), labels))?;
    if highlighted == 0 {
        tracing::warn!(country = %highlight.country, "highlighted country not in subset");
    }
    Ok((out, highlighted))
}

/// Runs the full subset pipeline.
pub fn export_subset(df: &DataFrame, spec: &SubsetSpec) -> Result<(DataFrame, SubsetReport)> {
    let _span = tracing::info_span!("subset", key = %spec.key).entered();
    require(df, &spec.key)?;
    let mut report = SubsetReport {
        rows_in: df.height(),
        ..SubsetReport::default()
    };

    let aliased = match &spec.aliases {
        Some(aliases) => {
            let (aliased, changed) = apply_aliases(df, &spec.key, aliases)?;
            report.aliased = changed;
            aliased
        }
        None => df.clone(),
    };

    let by_year = match spec.year {
        Some(selector) => {
            let (filtered, year) = filter_year(&aliased, &spec.year_column, selector)?;
            report.year = Some(year);
            filtered
        }
        None => aliased,
    };
    report.rows_after_year = by_year.height();

    let by_region = match &spec.region {
        Some(region) => {
            let filtered = filter_region(&by_year, &spec.key, region)?;
            let present: BTreeSet<String> = column_text_values(require(&filtered, &spec.key)?)
                .into_iter()
                .flatten()
                .collect();
            report.missing_members = region
                .members
                .iter()
                .filter(|member| !present.contains(*member))
                .cloned()
                .collect();
            if !report.missing_members.is_empty() {
                tracing::warn!(
                    region = %region.name,
                    missing = ?report.missing_members,
                    "region members without rows"
                );
            }
            filtered
        }
        None => by_year,
    };
    report.rows_after_region = by_region.height();

    let ranked = match &spec.ranking {
        Some(ranking) => rank_rows(&by_region, ranking)?,
        None => by_region,
    };

    let subset = match &spec.highlight {
        Some(highlight) => {
            let (highlighted, count) = add_highlight(&ranked, &spec.key, highlight)?;
            report.highlighted = count;
            highlighted
        }
        None => ranked,
    };
    report.rows_out = subset.height();

    tracing::info!(
        rows_in = report.rows_in,
        rows_after_year = report.rows_after_year,
        rows_after_region = report.rows_after_region,
        rows_out = report.rows_out,
        "subset complete"
    );
    Ok((subset, report))
}

fn require<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Column> {
    df.column(column).map_err(|_| TransformError::ColumnNotFound {
        table: "subset input".to_string(),
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shd_model::{MappingEntry, MappingKind};

    fn renewables() -> DataFrame {
        df!(
            "entity" => ["Finland", "Sweden", "Norway", "Finland", "Czechia", "Sweden"],
            "year" => [2020i64, 2020, 2020, 2019, 2020, 2021],
            "renewables_share" => [Some(45.0), Some(60.1), Some(98.0), Some(40.0), None, Some(62.0)]
        )
        .unwrap()
    }

    fn nordic_eu() -> Region {
        Region::new("nordic_eu", ["Finland", "Sweden"])
    }

    #[test]
    fn test_region_filter_exactness() {
        let spec = SubsetSpec::new("entity")
            .with_year("year", YearSelector::Year(2020))
            .with_region(nordic_eu());
        let (subset, report) = export_subset(&renewables(), &spec).unwrap();

        let entities = subset.column("entity").unwrap().str().unwrap();
        let names: Vec<_> = entities.into_iter().flatten().collect();
        assert_eq!(names, vec!["Finland", "Sweden"]);
        assert_eq!(report.year, Some(2020));
        assert_eq!(report.rows_after_year, 4);
        assert!(report.missing_members.is_empty());
    }

    #[test]
    fn test_latest_is_whole_table_max() {
        let (filtered, year) =
            filter_year(&renewables(), "year", YearSelector::Latest).unwrap();
        assert_eq!(year, 2021);
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn test_latest_on_text_years() {
        let df = df!("year" => [Some("2019"), None, Some("2020.0")]).unwrap();
        assert_eq!(resolve_year(&df, "year", YearSelector::Latest).unwrap(), 2020);

        let empty = df!("year" => [None::<&str>]).unwrap();
        assert!(matches!(
            resolve_year(&empty, "year", YearSelector::Latest),
            Err(TransformError::NoYearValues { .. })
        ));
    }

    #[test]
    fn test_alias_applies_before_region_filter() {
        let aliases = MappingTable::new(
            MappingKind::CountryAlias,
            vec![MappingEntry::new("Czechia", "Czech Republic")],
        )
        .unwrap();
        let region = Region::new("central", ["Czech Republic"]);
        let spec = SubsetSpec::new("entity")
            .with_aliases(aliases)
            .with_year("year", YearSelector::Year(2020))
            .with_region(region);
        let (subset, report) = export_subset(&renewables(), &spec).unwrap();

        assert_eq!(report.aliased, 1);
        assert_eq!(subset.height(), 1);
        assert_eq!(
            subset.column("entity").unwrap().str().unwrap().get(0),
            Some("Czech Republic")
        );
    }

    #[test]
    fn test_ranking_puts_nulls_last() {
        let ranking = Ranking {
            column: "renewables_share".to_string(),
            top_n: Some(3),
        };
        let spec = SubsetSpec::new("entity")
            .with_year("year", YearSelector::Year(2020))
            .with_ranking(ranking);
        let (subset, _) = export_subset(&renewables(), &spec).unwrap();
        let names: Vec<_> = subset
            .column("entity")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        assert_eq!(names, vec!["Norway", "Sweden", "Finland"]);
    }

    #[test]
    fn test_highlight_column() {
        let spec = SubsetSpec::new("entity")
            .with_year("year", YearSelector::Year(2020))
            .with_region(nordic_eu())
            .with_highlight(Highlight::country("Finland"));
        let (subset, report) = export_subset(&renewables(), &spec).unwrap();

        let highlight = subset.column("highlight").unwrap().str().unwrap();
        assert_eq!(highlight.get(0), Some("Finland"));
        assert_eq!(highlight.get(1), Some("Other"));
        assert_eq!(report.highlighted, 1);
    }

    #[test]
    fn test_missing_members_reported() {
        let region = Region::new("nordics", ["Finland", "Denmark"]);
        let spec = SubsetSpec::new("entity").with_region(region);
        let (_, report) = export_subset(&renewables(), &spec).unwrap();
        assert_eq!(report.missing_members, vec!["Denmark"]);
        assert_eq!(report.rows_out, 2);
    }
}
