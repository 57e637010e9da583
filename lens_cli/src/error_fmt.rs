//! Human-readable error descriptions and structured JSON error formatting.

use lens_core::error::{ActuatorError, BuildError};

pub fn error_kind_name(e: &ActuatorError) -> &'static str {
    match e {
        ActuatorError::InvalidArgument(_) => "InvalidArgument",
        ActuatorError::Io(_) => "Io",
        ActuatorError::Power(_) => "Power",
        ActuatorError::Allocation => "Allocation",
        ActuatorError::NotReady => "NotReady",
        ActuatorError::Config(_) => "Config",
        ActuatorError::State(_) => "State",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid actuator parameters ({be}).\nLikely causes: Out-of-range codes or a malformed region table in the config.\nHow to fix: Edit [actuator] / [[regions]] in the TOML (or the region CSV), then rerun."
        );
    }

    if let Some(ae) = err.downcast_ref::<ActuatorError>() {
        return match ae {
            ActuatorError::Io(msg) => format!(
                "What happened: A register write to the actuator failed ({msg}).\nLikely causes: Wrong bus number or address, driver not powered, or wiring/pull-up issues.\nHow to fix: Check [bus] in the config and the enable line, then rerun."
            ),
            ActuatorError::Power(msg) => format!(
                "What happened: The actuator enable line could not be driven ({msg}).\nLikely causes: Wrong [pins] vcm_pwd or missing GPIO permissions.\nHow to fix: Fix the pin number and make sure the process can access GPIO."
            ),
            ActuatorError::NotReady => "What happened: A focus move was requested before the step table was built.\nLikely causes: Power-up did not complete.\nHow to fix: Run power-up first (the CLI does this for you); check earlier errors.".to_string(),
            ActuatorError::InvalidArgument(msg) => format!(
                "What happened: Invalid argument ({msg}).\nHow to fix: Use near or far with an integer step count, e.g. --step near:3."
            ),
            ActuatorError::Allocation => "What happened: The step table could not be allocated.\nLikely causes: total_steps far too large for available memory.\nHow to fix: Reduce actuator.total_steps.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nHow to fix: Pass --config with the path to your TOML file."
        );
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        let cause = err
            .chain()
            .nth(1)
            .map(|c| format!(" Cause: {c}"))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid or incomplete.{cause}\nLikely causes: Missing [pins] vcm_pwd or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("region csv must have headers") {
        return "Invalid headers in region CSV. Expected 'step_bound,code_per_step'.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 6;
    }
    match err.downcast_ref::<ActuatorError>() {
        Some(ActuatorError::InvalidArgument(_)) => 2,
        Some(ActuatorError::Io(_)) => 3,
        Some(ActuatorError::NotReady) => 4,
        Some(ActuatorError::Allocation) => 5,
        Some(ActuatorError::Config(_)) => 6,
        Some(ActuatorError::Power(_)) => 7,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(ae) = err.downcast_ref::<ActuatorError>() {
        error_kind_name(ae)
    } else if err.downcast_ref::<BuildError>().is_some() {
        "Config"
    } else {
        "Error"
    };
    json!({
        "reason": reason,
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
