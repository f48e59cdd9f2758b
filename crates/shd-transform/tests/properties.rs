//! End-to-end checks of the preparation stages on small frames.

use polars::prelude::*;
use shd_common::{column_names, format_numeric};
use shd_ingest::RawTable;
use shd_model::{
    CollisionPolicy, ColumnSpec, ColumnType, OverlapPolicy, Region, TableSchema, YearSelector,
};
use shd_transform::{
    Snapshot, SourceFrame, SubsetSpec, build_time_series, coerce_columns, coerce_value,
    export_subset, merge_left, normalize_column_name, normalize_table, CoercedValue,
};

fn raw(source: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        source,
        headers.iter().map(|h| (*h).to_string()).collect(),
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| (*cell).to_string()))
                    .collect()
            })
            .collect(),
    )
}

#[test]
fn normalizer_is_idempotent() {
    let once = normalize_column_name(" Per Capita GDP! ");
    assert_eq!(once, "per_capita_gdp");
    assert_eq!(normalize_column_name(&once), once);
}

#[test]
fn merge_keeps_base_row_count() {
    let (codes, _) = normalize_table(
        &raw(
            "plotly_countries_and_codes.csv",
            &["Country", "Code"],
            &[&["Finland", "FIN"], &["Sweden", "SWE"], &["Atlantis", "ATL"]],
        ),
        CollisionPolicy::Error,
    )
    .unwrap();
    let (plastic, _) = normalize_table(
        &raw(
            "global_plastic_waste.csv",
            &["Country", "Recycling Rate", "Per Capita Waste (KG)"],
            &[
                &["Finland", "0.3", "20"],
                &["Sweden", "0.4", "22"],
                &["Norway", "0.5", "24"],
                &["Chad", "", "1"],
            ],
        ),
        CollisionPolicy::Error,
    )
    .unwrap();
    let (whr, _) = normalize_table(
        &raw(
            "WHR_2023.csv",
            &["Country", "Happiness Score", "Life Exectancy"],
            &[&["Finland", "7.8", "82"], &["Sweden", "7.4", "83"]],
        ),
        CollisionPolicy::Error,
    )
    .unwrap();

    let (merged, report) = merge_left(
        &SourceFrame::new("codes", codes),
        &[SourceFrame::new("plastic", plastic), SourceFrame::new("whr", whr)],
        "country",
        OverlapPolicy::Suffix,
    )
    .unwrap();

    assert_eq!(merged.height(), 3);
    assert!(report.steps.iter().all(|step| step.rows_after == 3));
    assert_eq!(
        column_names(&merged),
        vec![
            "country",
            "code",
            "recycling_rate",
            "per_capita_waste_kg",
            "happiness_score",
            "life_exectancy"
        ]
    );

    // Atlantis has no match anywhere: every joined column is null, not absent.
    let atlantis = 2;
    for name in ["recycling_rate", "per_capita_waste_kg", "happiness_score", "life_exectancy"] {
        let column = merged.column(name).unwrap();
        assert!(column.get(atlantis).unwrap().is_null(), "{name} should be null");
    }
}

#[test]
fn currency_coercion() {
    assert_eq!(
        coerce_value("$12,345", ColumnType::Currency),
        Some(CoercedValue::Float(12345.0))
    );
    assert_eq!(coerce_value("N/A", ColumnType::Currency), None);
    assert_eq!(
        coerce_value("7.5", ColumnType::Currency),
        Some(CoercedValue::Float(7.5))
    );

    let df = df!("per_capita_gdp" => ["$12,345", "N/A", "7.5"]).unwrap();
    let schema = TableSchema::new("global", "country")
        .with_column(ColumnSpec::new("per_capita_gdp", ColumnType::Currency));
    let (coerced, report) = coerce_columns(&df, &schema).unwrap();
    let gdp = coerced.column("per_capita_gdp").unwrap().f64().unwrap();
    assert_eq!(gdp.get(0), Some(12345.0));
    assert_eq!(gdp.get(1), None);
    assert_eq!(gdp.get(2), Some(7.5));
    assert!(!report.has_failures());
}

#[test]
fn time_series_pivot_completeness() {
    let snapshot = |year: &str, rows: &[&[&str]]| {
        let (frame, _) = normalize_table(
            &raw(&format!("whr_{year}.csv"), &["Country", "Happiness Score"], rows),
            CollisionPolicy::Error,
        )
        .unwrap();
        Snapshot::new(year, frame)
    };
    let snapshots = vec![
        snapshot("2020", &[&["Iceland", "7.5"], &["Finland", "7.8"]]),
        snapshot("2018", &[&["Finland", "7.6"]]),
    ];

    let df = build_time_series(&snapshots, "country", "happiness_score").unwrap();

    let mut rendered = column_names(&df).join(",");
    for row in 0..df.height() {
        rendered.push('\n');
        let cells: Vec<String> = df
            .get_columns()
            .iter()
            .map(|column| match column.get(row).unwrap() {
                AnyValue::Null => String::new(),
                AnyValue::Float64(v) => format_numeric(v),
                other => other.str_value().to_string(),
            })
            .collect();
        rendered.push_str(&cells.join(","));
    }
    insta::assert_snapshot!(rendered, @r"
    country,2018,2020
    Finland,7.6,7.8
    Iceland,,7.5
    ");
}

#[test]
fn region_filter_exactness() {
    let renewables = df!(
        "entity" => ["Finland", "Sweden", "Norway", "Finland", "Germany", "Sweden"],
        "year" => ["2020", "2020", "2020", "2019", "2020", "2021"],
        "electricity_from_renewables_twh" => ["30", "100", "140", "28", "250", "105"]
    )
    .unwrap();
    let schema = TableSchema::new("renewables", "entity")
        .with_column(ColumnSpec::new("year", ColumnType::Integer));
    let (typed, _) = coerce_columns(&renewables, &schema).unwrap();

    let spec = SubsetSpec::new("entity")
        .with_year("year", YearSelector::Year(2020))
        .with_region(Region::new("pair", ["Finland", "Sweden"]));
    let (subset, _) = export_subset(&typed, &spec).unwrap();

    let entities: Vec<_> = subset
        .column("entity")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    let years: Vec<_> = subset
        .column("year")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(entities, vec!["Finland", "Sweden"]);
    assert_eq!(years, vec![2020, 2020]);
}
