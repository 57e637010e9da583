#![no_main]
use libfuzzer_sys::fuzz_target;

// The region CSV loader reads from a path, so stage each input in a temp file.
fuzz_target!(|data: &[u8]| {
    let path = std::env::temp_dir().join(format!("lens-fuzz-{}.csv", std::process::id()));
    if std::fs::write(&path, data).is_err() {
        return;
    }
    if let Ok(rows) = lens_config::load_region_csv(&path) {
        assert!(!rows.is_empty());
        assert!(rows.windows(2).all(|w| w[0].step_bound < w[1].step_bound));
    }
    let _ = std::fs::remove_file(&path);
});
