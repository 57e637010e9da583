#![no_main]
use libfuzzer_sys::fuzz_target;

// Parsing and validating arbitrary TOML must never panic.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = lens_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
