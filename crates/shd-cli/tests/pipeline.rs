//! Integration tests running the jobs on small fixture datasets.

use std::fs;
use std::path::{Path, PathBuf};

use shd_cli::cli::{CommonArgs, RenewablesArgs};
use shd_cli::commands::{run_all, run_global, run_renewables, run_timeseries};
use shd_common::parse_f64;
use shd_ingest::{RawTable, ReadOptions, read_raw_table};
use shd_model::YearSelector;
use tempfile::TempDir;

fn write_fixtures(data: &Path) {
    fs::write(
        data.join("plotly_countries_and_codes.csv"),
        "Country,Code,Region,Income Group\n\
         Finland,FIN,EU-27,HI\n\
         Sweden,SWE,EU-27,HI\n\
         Côte d'Ivoire,CIV,Africa,LM\n\
         Atlantis,ATL,Ocean,HI\n",
    )
    .unwrap();
    fs::write(
        data.join("global_plastic_waste.csv"),
        "Country,Recycling Rate,Per Capita Waste (KG)\n\
         Finland,0.3,80\n\
         Sweden,0.4,90\n\
         Norway,0.5,95\n",
    )
    .unwrap();
    // ISO-8859-1: 0xF4 is "ô".
    fs::write(
        data.join("GEF_2023.csv"),
        b"Country,Region,Life Exectancy,HDI,Per Capita GDP,Population (millions),SDGi,Forest land,Total biocapacity,Carbon Footprint\n\
          Finland,EU-27,82.0,0.94,\"$53,000\",5.5,86.8,12.1,12.4,3.1\n\
          Sweden,EU-27,83.0,0.95,\"$60,000\",10.4,86.0,8.5,9.5,2.0\n\
          C\xf4te d'Ivoire,Africa,58.0,0.55,unknown,26.4,..,0.9,1.1,0.5\n",
    )
    .unwrap();
    fs::write(
        data.join("WHR_2023.csv"),
        "Country,Happiness score\n\
         Finland,7.8\n\
         Sweden,7.4\n\
         Côte d'Ivoire,5.1\n",
    )
    .unwrap();

    let timeseries = data.join("timeseries");
    fs::create_dir(&timeseries).unwrap();
    fs::write(
        timeseries.join("whr_2020.csv"),
        "Country,Happiness Score\nIceland,7.5\nFinland,7.8\n",
    )
    .unwrap();
    fs::write(
        timeseries.join("whr_2018.csv"),
        "Country,Happiness Score\nFinland,7.6\n",
    )
    .unwrap();

    fs::write(
        data.join("renewables.csv"),
        "Entity,Code,Year,Electricity from renewables (TWh),Electricity from fossil fuels (TWh)\n\
         Finland,FIN,2020,40.1,10.2\n\
         Finland,FIN,2019,38.0,12.0\n\
         Czechia,CZE,2020,9.0,50.0\n\
         Sweden,SWE,2020,100.0,2.0\n\
         Norway,NOR,2020,150.0,1.0\n",
    )
    .unwrap();
}

struct Workspace {
    _root: TempDir,
    data: PathBuf,
    out: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        let out = root.path().join("out");
        fs::create_dir(&data).unwrap();
        write_fixtures(&data);
        Self {
            _root: root,
            data,
            out,
        }
    }

    fn args(&self) -> CommonArgs {
        CommonArgs {
            data_dir: Some(self.data.clone()),
            out_dir: Some(self.out.clone()),
            ..CommonArgs::default()
        }
    }

    fn read_output(&self, name: &str) -> RawTable {
        read_raw_table(&self.out.join(name), &ReadOptions::default()).unwrap()
    }
}

fn row<'a>(table: &'a RawTable, key: &str) -> &'a [Option<String>] {
    table
        .rows()
        .iter()
        .find(|row| row[0].as_deref() == Some(key))
        .unwrap()
}

fn cell<'a>(table: &'a RawTable, key: &str, column: &str) -> Option<&'a str> {
    let idx = table.position(column).unwrap();
    row(table, key)[idx].as_deref()
}

#[test]
fn global_job_merges_and_coerces() {
    let ws = Workspace::new();
    let result = run_global(&ws.args()).unwrap();

    assert_eq!(result.parse_failures, 2);
    assert_eq!(result.joins.len(), 3);
    assert!(result.outputs.iter().all(|output| output.written));

    let global = ws.read_output("global_data_new.csv");
    assert_eq!(
        global.headers().join(","),
        "country,code,region_x,income_group,recycling_rate,per_capita_waste_kg,region_y,\
         life_expectancy,hdi,per_capita_gdp,population_millions,sdgi,forest_land,\
         total_biocapacity,carbon_footprint,happiness_score"
    );
    assert_eq!(global.height(), 4);

    let gdp = cell(&global, "Finland", "per_capita_gdp").and_then(parse_f64);
    assert_eq!(gdp, Some(53000.0));
    // Latin-1 source joined on the UTF-8 key.
    let life = cell(&global, "Côte d'Ivoire", "life_expectancy").and_then(parse_f64);
    assert_eq!(life, Some(58.0));
    assert_eq!(cell(&global, "Côte d'Ivoire", "per_capita_gdp"), None);
    assert_eq!(cell(&global, "Côte d'Ivoire", "sdgi"), None);

    assert_eq!(cell(&global, "Finland", "region_x"), Some("EU-27"));
    assert_eq!(cell(&global, "Atlantis", "region_y"), None);

    let atlantis = row(&global, "Atlantis");
    assert_eq!(atlantis[1].as_deref(), Some("ATL"));
    assert!(atlantis[4..].iter().all(Option::is_none));

    let audit: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(ws.out.join("global_data_new.coercion.json")).unwrap(),
    )
    .unwrap();
    let gdp_audit = audit["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|column| column["column"] == "per_capita_gdp")
        .unwrap();
    assert_eq!(gdp_audit["failures"][0]["value"], "unknown");
}

#[test]
fn timeseries_job_pivots_snapshots() {
    let ws = Workspace::new();
    run_timeseries(&ws.args()).unwrap();

    let text = fs::read_to_string(ws.out.join("whr_timeseries.csv")).unwrap();
    insta::assert_snapshot!(text.trim_end(), @r"
    country,2018,2020
    Finland,7.6,7.8
    Iceland,,7.5
    ");
}

#[test]
fn renewables_job_writes_slice_and_subset() {
    let ws = Workspace::new();
    let args = RenewablesArgs {
        common: ws.args(),
        ..RenewablesArgs::default()
    };
    let result = run_renewables(&args).unwrap();

    let slice = ws.read_output("renewables2020.csv");
    assert_eq!(slice.height(), 4);
    assert!(row(&slice, "Czechia")[0].is_some());

    let subset = ws.read_output("EUrenewables2020.csv");
    let entities: Vec<_> = subset
        .rows()
        .iter()
        .map(|row| row[0].clone().unwrap())
        .collect();
    assert_eq!(entities, vec!["Finland", "Czech Republic", "Sweden"]);
    assert_eq!(cell(&subset, "Finland", "highlight"), Some("Finland"));
    assert_eq!(cell(&subset, "Sweden", "highlight"), Some("Other"));
    assert_eq!(cell(&subset, "Sweden", "year"), Some("2020"));

    let report = result.subset.unwrap();
    assert_eq!(report.aliased, 1);
    assert_eq!(report.rows_out, 3);
    assert_eq!(report.missing_members.len(), 24);
}

#[test]
fn latest_year_names_outputs_after_the_year() {
    let ws = Workspace::new();
    let args = RenewablesArgs {
        common: ws.args(),
        year: Some(YearSelector::Latest),
        no_highlight: true,
        ..RenewablesArgs::default()
    };
    run_renewables(&args).unwrap();

    let subset = ws.read_output("EUrenewables2020.csv");
    assert!(subset.position("highlight").is_none());
}

#[test]
fn missing_input_writes_nothing() {
    let ws = Workspace::new();
    fs::remove_file(ws.data.join("WHR_2023.csv")).unwrap();

    let error = run_global(&ws.args()).unwrap_err();

    assert!(format!("{error:#}").contains("WHR_2023.csv"));
    assert!(!ws.out.exists());
}

#[test]
fn failed_subset_write_keeps_year_slice_unwritten() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.out.join("EUrenewables2020.csv")).unwrap();
    let args = RenewablesArgs {
        common: ws.args(),
        ..RenewablesArgs::default()
    };

    let error = run_renewables(&args).unwrap_err();

    assert!(format!("{error:#}").contains("EUrenewables2020.csv"));
    assert!(!ws.out.join("renewables2020.csv").exists());
    let entries: Vec<_> = fs::read_dir(&ws.out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["EUrenewables2020.csv"]);
}

#[test]
fn dry_run_writes_nothing() {
    let ws = Workspace::new();
    let args = RenewablesArgs {
        common: CommonArgs {
            dry_run: true,
            ..ws.args()
        },
        ..RenewablesArgs::default()
    };

    let results = run_all(&args).unwrap();

    assert_eq!(results.len(), 4);
    assert!(
        results
            .iter()
            .flat_map(|result| &result.outputs)
            .all(|output| !output.written)
    );
    assert!(!ws.out.exists());

    let correlations = &results[3].correlations;
    assert_eq!(correlations[0].group, "all");
    assert_eq!(correlations[0].pairs, 2);
    assert_eq!(correlations.len(), 5);
}
