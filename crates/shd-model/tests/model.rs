use shd_model::{
    CoercionReport, ColumnCoercion, ColumnType, MappingEntry, MappingKind, MappingTable,
    ModelError, ParseFailure, Region,
};

#[test]
fn coercion_report_counts_failures() {
    let mut gdp = ColumnCoercion::new("per_capita_gdp", ColumnType::Currency);
    gdp.total = 4;
    gdp.converted = 2;
    gdp.missing_before = 0;
    gdp.failures = vec![
        ParseFailure {
            row: 1,
            value: "N/A".to_string(),
        },
        ParseFailure {
            row: 3,
            value: "N/A".to_string(),
        },
    ];
    let report = CoercionReport {
        skipped: Vec::new(),
        columns: vec![gdp, ColumnCoercion::new("hdi", ColumnType::Float)],
    };

    assert_eq!(report.total_failures(), 2);
    assert!(report.has_failures());
    let column = report.column("per_capita_gdp").unwrap();
    assert_eq!(column.missing_after(), 2);
    assert_eq!(column.distinct_failures(), vec!["N/A"]);
}

#[test]
fn coercion_report_serializes() {
    let report = CoercionReport {
        skipped: vec!["forest_land".to_string()],
        columns: vec![ColumnCoercion::new("sdgi", ColumnType::Float)],
    };
    let json = serde_json::to_string(&report).expect("serialize report");
    assert!(json.contains("\"column_type\":\"float\""));
    let round: CoercionReport = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(round, report);
}

#[test]
fn duplicate_sources_are_rejected() {
    let result = MappingTable::new(
        MappingKind::ColumnRename,
        vec![
            MappingEntry::new("life_exectancy", "life_expectancy"),
            MappingEntry::new("life_exectancy", "lifespan"),
        ],
    );
    assert!(matches!(result, Err(ModelError::DuplicateSource { .. })));
}

#[test]
fn blank_entries_are_rejected() {
    let result = MappingTable::new(
        MappingKind::CountryAlias,
        vec![MappingEntry::new("  ", "Czech Republic")],
    );
    assert!(matches!(result, Err(ModelError::EmptyEntry { index: 0, .. })));
}

#[test]
fn unsupported_version_is_rejected() {
    let mut table = MappingTable::empty(MappingKind::CountryAlias);
    table.version = 7;
    assert!(matches!(
        table.validate(),
        Err(ModelError::UnsupportedVersion { found: 7, .. })
    ));
}

#[test]
fn region_membership_is_exact() {
    let region = Region::new("nordics", ["Finland", "Sweden"]);
    assert!(region.contains("Finland"));
    assert!(!region.contains("finland"));
    assert!(region.validate().is_ok());
    assert!(
        Region::new("dup", ["Finland", "Finland"])
            .validate()
            .is_err()
    );
}
