//! Reading a snapshot directory end to end.

use std::fs;

use shd_ingest::{ReadOptions, discover_snapshots, read_raw_table};
use tempfile::TempDir;

#[test]
fn snapshot_directory_reads_in_year_order() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("whr_2020.csv"),
        "country,happiness_score\nFinland,7.8\nIceland,7.5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("whr_2018.csv"),
        "country,happiness_score\nFinland,7.6\n",
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "not a snapshot").unwrap();

    let snapshots = discover_snapshots(dir.path()).unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].year, "2018");

    let tables: Vec<_> = snapshots
        .iter()
        .map(|snapshot| read_raw_table(&snapshot.path, &ReadOptions::default()).unwrap())
        .collect();
    assert_eq!(tables[0].height(), 1);
    assert_eq!(tables[1].height(), 2);
    assert_eq!(tables[1].column(0)[1].as_deref(), Some("Iceland"));
}

#[test]
fn duplicate_headers_are_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plastic.csv");
    fs::write(&path, "Country,Rate,rate \nFinland,1,2\n").unwrap();

    let table = read_raw_table(&path, &ReadOptions::default()).unwrap();
    assert_eq!(table.headers(), ["Country", "Rate", "rate "]);
}
