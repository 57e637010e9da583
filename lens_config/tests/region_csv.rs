use lens_config::{RegionCfg, load_region_csv};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_well_formed_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    fs::write(&path, "step_bound,code_per_step\n2,32\n52,16\n").unwrap();
    let rows = load_region_csv(&path).expect("load");
    assert_eq!(
        rows,
        vec![
            RegionCfg { step_bound: 2, code_per_step: 32 },
            RegionCfg { step_bound: 52, code_per_step: 16 },
        ]
    );
}

#[test]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    fs::write(&path, "step,increment\n2,32\n").unwrap();
    let err = load_region_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[test]
fn rejects_unordered_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    fs::write(&path, "step_bound,code_per_step\n10,16\n2,32\n").unwrap();
    let err = load_region_csv(&path).expect_err("unordered");
    assert!(format!("{err}").contains("strictly increasing"));
}

#[test]
fn reports_row_number_on_bad_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    fs::write(&path, "step_bound,code_per_step\n2,32\n52,-4\n").unwrap();
    let err = load_region_csv(&path).expect_err("negative increment");
    assert!(format!("{err}").contains("row 3"));
}

#[test]
fn rejects_empty_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    fs::write(&path, "step_bound,code_per_step\n").unwrap();
    let err = load_region_csv(&path).expect_err("empty");
    assert!(format!("{err}").contains("at least one"));
}
