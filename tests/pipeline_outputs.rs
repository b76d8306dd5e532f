use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

mod common;

use common::{ExportRow, V1_LABEL, write_export};

const IMAGE_A: &str = "01-0001-2018-1234567-14-001-UKMYC6-zooniverse-BDQ";
const IMAGE_B: &str = "02-0002-2017-7654321-07-zooniverse-INH";

const USERS: [&str; 4] = ["alice", "bob", "carol", "not-logged-in-9f"];

fn write_fixture(path: &Path) {
    let ids: Vec<String> = (1..=27).map(|i| i.to_string()).collect();
    let mut rows = Vec::new();
    // image A: 12 unreadable plus 8 readings
    for i in 0..12 {
        let mut r = ExportRow::new(&ids[i], USERS[i % 4], IMAGE_A, "Cannot classify");
        r.label = V1_LABEL;
        rows.push(r);
    }
    for (j, well) in ["3", "3", "3", "3", "4", "4", "4", "5"].into_iter().enumerate() {
        rows.push(ExportRow::new(&ids[12 + j], USERS[j % 2], IMAGE_A, well));
    }
    // image B: too few to summarise
    for (j, well) in ["2", "3", "3", "4", "5"].into_iter().enumerate() {
        rows.push(ExportRow::new(&ids[20 + j], "carol", IMAGE_B, well));
    }
    let mut archived = ExportRow::new(&ids[25], "dave", IMAGE_B, "6");
    archived.live = false;
    rows.push(archived);
    let mut late = ExportRow::new(&ids[26], "erin", IMAGE_B, "6");
    late.created_at = "2019-06-01 09:00:00 UTC";
    rows.push(late);
    write_export(path, &rows);
}

fn run_pipeline(input: &Path, out: &Path, extra: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("kira-bashthebug").unwrap();
    cmd.arg("run")
        .arg("--input")
        .arg(input)
        .arg("--out")
        .arg(out)
        .arg("--json")
        .args(extra);
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

fn read_tsv(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn measurements_table_reports_consensus() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let out = tmp.path().join("out");
    run_pipeline(&input, &out, &[]);

    let table = read_tsv(&out.join("measurements.tsv"));
    assert_eq!(
        table[0].join("\t"),
        "plate_image\tdrug\tmedian\tmean\tstd\tmin\tmax\tcount\tn_failed\tn_cannot_read\tn_valid"
    );
    assert_eq!(table.len(), 3);

    let a = &table[1];
    assert_eq!(a[0], "01-0001-2018-1234567-14-001");
    assert_eq!(a[1], "BDQ");
    assert_eq!(a[2], "4");
    assert_eq!(a[3], "3.625000");
    assert_eq!(&a[5..], &["3", "5", "20", "0", "8", "8"]);

    let b = &table[2];
    assert_eq!(b[0], "02-0002-2017-7654321-07");
    assert_eq!(&b[2..7], &["", "", "", "", ""]);
    // the archived row is dropped, the late row is still in the default window
    assert_eq!(b[7], "6");
}

#[test]
fn classification_and_user_tables() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let out = tmp.path().join("out");
    run_pipeline(&input, &out, &[]);

    let classifications = read_tsv(&out.join("classifications.tsv"));
    let header = &classifications[0];
    let col = |name: &str| header.iter().position(|h| h == name).unwrap();
    assert_eq!(classifications.len(), 27);
    let first = &classifications[1];
    assert_eq!(first[col("dilution_code")], "-1");
    assert_eq!(first[col("plate_design")], "UKMYC6");
    assert_eq!(first[col("reading_day")], "14");
    assert_eq!(first[col("study_id")], "current");
    assert_eq!(first[col("task_duration_secs")], "12.500000");

    let users = read_tsv(&out.join("users.tsv"));
    assert_eq!(users[0][0], "user_name");
    assert_eq!(users[1][0], "carol");
    assert_eq!(users[1][1], "8");
    let anon = users.iter().find(|u| u[0] == "not-logged-in-9f").unwrap();
    assert_eq!(anon[2], "true");
}

#[test]
fn json_report_and_filters() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let out = tmp.path().join("out");
    let stdout = run_pipeline(
        &input,
        &out,
        &["--to-date", "2018-12-31", "--group-by", "reading-day"],
    );
    assert!(stdout.contains("Total classifications: 25"));

    let v: Value = serde_json::from_slice(&fs::read(out.join("bashthebug.json")).unwrap()).unwrap();
    assert_eq!(v["tool"], "kira-bashthebug");
    assert_eq!(v["input"]["rows_read"], 27);
    assert_eq!(v["input"]["rows_live"], 26);
    assert_eq!(v["input"]["rows_in_window"], 25);
    assert_eq!(v["input"]["group_by"], "reading_day");
    assert_eq!(v["input"]["well_index_version"], "v1");
    assert_eq!(v["codes"]["-1"], 12);
    assert_eq!(v["measurements"]["computed"], 1);
    assert_eq!(v["measurements"]["insufficient"], 1);

    let table = read_tsv(&out.join("measurements.tsv"));
    assert_eq!(table[0][..3].join("\t"), "plate\treading_day\tdrug");
    assert_eq!(table[1][..3].join("\t"), "01-0001-2018-1234567\t14\tBDQ");
}

#[test]
fn merged_dataset_adds_columns() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let growth = tmp.path().join("growth.csv");
    fs::write(
        &growth,
        format!("filename,IM_GROWTH\n{},0.25\n{},0.75\n", IMAGE_A, IMAGE_A),
    )
    .unwrap();
    let out = tmp.path().join("out");
    let merge = format!("{}:IM_GROWTH", growth.display());
    run_pipeline(&input, &out, &["--merge", &merge]);

    let table = read_tsv(&out.join("measurements.tsv"));
    let n = table[0].len();
    assert_eq!(&table[0][n - 2..], &["IM_GROWTH_median", "IM_GROWTH_count"]);
    assert_eq!(&table[1][n - 2..], &["0.500000", "2"]);
    assert_eq!(&table[2][n - 2..], &["", "0"]);

    let v: Value = serde_json::from_slice(&fs::read(out.join("bashthebug.json")).unwrap()).unwrap();
    assert_eq!(v["merged_columns"][0]["column"], "IM_GROWTH");
    assert_eq!(v["merged_columns"][0]["matched_groups"], 1);
}

#[test]
fn colliding_merge_column_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let growth = tmp.path().join("growth.csv");
    fs::write(&growth, format!("filename,median\n{},0.25\n", IMAGE_A)).unwrap();
    let merge = format!("{}:median", growth.display());

    let mut cmd = Command::cargo_bin("kira-bashthebug").unwrap();
    cmd.arg("run")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(tmp.path().join("out"))
        .args(["--merge", &merge]);
    cmd.assert().failure();
}

#[test]
fn decode_policy_controls_unknown_drugs() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_export(
        &input,
        &[
            ExportRow::new("1", "alice", IMAGE_B, "3"),
            ExportRow::new("2", "alice", "02-0002-2017-7654321-07-zooniverse-XYZ", "3"),
        ],
    );

    let mut abort = Command::cargo_bin("kira-bashthebug").unwrap();
    abort
        .args(["decode", "--policy", "abort", "--input"])
        .arg(&input);
    abort.assert().failure();

    let mut encode = Command::cargo_bin("kira-bashthebug").unwrap();
    encode.args(["decode", "--input"]).arg(&input);
    let stdout = String::from_utf8(encode.assert().success().get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("-103\t1"));
    assert!(stdout.contains("3\t1"));

    let mut skip = Command::cargo_bin("kira-bashthebug").unwrap();
    skip.args(["decode", "--policy", "skip", "--input"]).arg(&input);
    let stdout = String::from_utf8(skip.assert().success().get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("rows skipped: 1"));
}

#[test]
fn unparsed_filename_is_kept_under_abort() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_export(
        &input,
        &[
            ExportRow::new("1", "alice", IMAGE_B, "3"),
            ExportRow::new("2", "bob", "scan_0042", "No Growth in wells"),
        ],
    );
    let out = tmp.path().join("out");
    run_pipeline(&input, &out, &["--policy", "abort"]);

    let classifications = read_tsv(&out.join("classifications.tsv"));
    let header = &classifications[0];
    let col = |name: &str| header.iter().position(|h| h == name).unwrap();
    assert_eq!(classifications.len(), 3);
    let unparsed = classifications
        .iter()
        .find(|r| r[col("classification_id")] == "2")
        .unwrap();
    assert_eq!(unparsed[col("filename")], "scan_0042");
    assert_eq!(unparsed[col("plate_image")], "");
    assert_eq!(unparsed[col("dilution_code")], "1");
}

#[test]
fn pipeline_outputs_are_deterministic() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.csv");
    write_fixture(&input);
    let out1 = tmp.path().join("out1");
    let out2 = tmp.path().join("out2");
    run_pipeline(&input, &out1, &["--threads", "1"]);
    run_pipeline(&input, &out2, &["--threads", "4"]);

    for name in ["classifications.tsv", "measurements.tsv", "users.tsv"] {
        assert_eq!(
            fs::read(out1.join(name)).unwrap(),
            fs::read(out2.join(name)).unwrap(),
            "{} differs between runs",
            name
        );
    }
}
