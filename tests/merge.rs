use std::fs;

use kira_bashthebug::consensus::{ConsensusConfig, GroupBy, MeasurementTable, build_measurements};
use kira_bashthebug::io::secondary::read_secondary;
use kira_bashthebug::merge::{MergeError, SecondaryDataset, merge_into, parse_secondary};
use tempfile::TempDir;

mod common;

const IMAGE_A: &str = "02-0002-2017-7654321-07-zooniverse-BDQ";
const IMAGE_B: &str = "02-0002-2017-7654321-10-zooniverse-BDQ";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn table_with_groups() -> MeasurementTable {
    // one decoded row per image is enough to create the group keys
    let rows = vec![common::row(IMAGE_A, 3), common::row(IMAGE_B, 4)];
    build_measurements(&rows, GroupBy::PlateImage, &ConsensusConfig::default())
}

#[test]
fn three_column_dataset_is_rejected() {
    let err = parse_secondary(&strings(&["filename", "IM", "extra"]), &[], "IM").unwrap_err();
    assert_eq!(err, MergeError::ColumnCount { found: 3 });
}

#[test]
fn missing_columns_are_rejected() {
    let err = parse_secondary(&strings(&["image", "IM"]), &[], "IM").unwrap_err();
    assert_eq!(err, MergeError::MissingKeyColumn);
    let err = parse_secondary(&strings(&["filename", "IM"]), &[], "OTHER").unwrap_err();
    assert!(matches!(err, MergeError::MissingValueColumn { .. }));
}

#[test]
fn non_numeric_values_are_rejected() {
    let records = vec![strings(&[IMAGE_A, "high"])];
    let err = parse_secondary(&strings(&["filename", "IM"]), &records, "IM").unwrap_err();
    assert!(matches!(err, MergeError::NonNumeric { row: 1, .. }));
}

#[test]
fn existing_column_name_is_rejected_and_table_untouched() {
    let mut table = table_with_groups();
    let before = table.clone();
    let dataset = SecondaryDataset {
        value_column: "median".to_string(),
        rows: vec![(IMAGE_A.to_string(), Some(1.0))],
    };
    let err = merge_into(&mut table, &dataset).unwrap_err();
    assert_eq!(
        err,
        MergeError::ColumnExists {
            column: "median".to_string()
        }
    );
    assert_eq!(table, before);
}

#[test]
fn merging_same_column_twice_is_rejected() {
    let mut table = table_with_groups();
    let dataset = SecondaryDataset {
        value_column: "IM".to_string(),
        rows: vec![(IMAGE_A.to_string(), Some(1.0))],
    };
    merge_into(&mut table, &dataset).unwrap();
    let err = merge_into(&mut table, &dataset).unwrap_err();
    assert!(matches!(err, MergeError::ColumnExists { .. }));
}

#[test]
fn left_join_summarises_per_group() {
    let mut table = table_with_groups();
    let dataset = SecondaryDataset {
        value_column: "IM".to_string(),
        rows: vec![
            (IMAGE_A.to_string(), Some(0.2)),
            (IMAGE_A.to_string(), Some(0.6)),
            (IMAGE_A.to_string(), None),
            ("03-0003-2019-1111111-14-zooniverse-BDQ".to_string(), Some(9.0)),
            ("garbage".to_string(), Some(1.0)),
        ],
    };
    let report = merge_into(&mut table, &dataset).unwrap();
    assert_eq!(report.rows, 5);
    assert_eq!(report.matched_groups, 1);
    assert_eq!(report.unmatched_keys, 1);
    assert_eq!(report.unparsed_filenames, 1);

    let a = &table.rows[0].merged["IM"];
    assert_eq!(a.count, 2);
    assert!((a.median.unwrap() - 0.4).abs() < 1e-12);
    let b = &table.rows[1].merged["IM"];
    assert_eq!(b.count, 0);
    assert_eq!(b.median, None);

    let columns = table.columns();
    assert_eq!(&columns[columns.len() - 2..], &["IM_median", "IM_count"]);
}

#[test]
fn plate_image_keys_ignore_the_reading_day_token() {
    let current = "01-0001-2018-1234567-14-001-UKMYC6-zooniverse-INH";
    let odd_day = "01-0001-2018-1234567-XX-001-UKMYC6-zooniverse-INH";
    let dataset = SecondaryDataset {
        value_column: "IM".to_string(),
        rows: vec![
            (current.to_string(), Some(2.0)),
            (odd_day.to_string(), Some(5.0)),
        ],
    };

    let rows = vec![common::row(current, 3)];
    let mut by_image = build_measurements(&rows, GroupBy::PlateImage, &ConsensusConfig::default());
    let report = merge_into(&mut by_image, &dataset).unwrap();
    assert_eq!(report.matched_groups, 1);
    assert_eq!(report.unmatched_keys, 1);
    assert_eq!(report.unparsed_filenames, 0);
    assert_eq!(by_image.rows[0].merged["IM"].count, 1);

    let mut by_day = build_measurements(&rows, GroupBy::ReadingDay, &ConsensusConfig::default());
    let report = merge_into(&mut by_day, &dataset).unwrap();
    assert_eq!(report.matched_groups, 1);
    assert_eq!(report.unparsed_filenames, 1);
}

#[test]
fn reads_csv_and_tsv_datasets() {
    let tmp = TempDir::new().unwrap();
    let csv = tmp.path().join("growth.csv");
    fs::write(&csv, format!("filename,IM\n{},0.5\n{},\n", IMAGE_A, IMAGE_B)).unwrap();
    let dataset = read_secondary(&csv, "IM").unwrap();
    assert_eq!(dataset.rows.len(), 2);
    assert_eq!(dataset.rows[0].1, Some(0.5));
    assert_eq!(dataset.rows[1].1, None);

    let tsv = tmp.path().join("growth.tsv");
    fs::write(&tsv, format!("IM\tfilename\n0.7\t{}\n", IMAGE_A)).unwrap();
    let dataset = read_secondary(&tsv, "IM").unwrap();
    assert_eq!(dataset.rows, vec![(IMAGE_A.to_string(), Some(0.7))]);

    let txt = tmp.path().join("growth.txt");
    fs::write(&txt, "filename,IM\n").unwrap();
    let err = read_secondary(&txt, "IM").unwrap_err();
    assert!(matches!(err, MergeError::UnsupportedFormat { .. }));
}
