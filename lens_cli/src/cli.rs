//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use lens_core::Direction;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "vcm", version, about = "VCM lens actuator tool")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/vcm.toml")]
    pub config: PathBuf,

    /// Optional region table CSV (strict header); overrides [[regions]]
    #[arg(long, value_name = "FILE")]
    pub regions: Option<PathBuf>,

    /// Output JSON instead of text (logs become JSON lines)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// One relative move, written `near:N` or `far:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepArg {
    pub dir: Direction,
    pub steps: i32,
}

pub fn parse_step(s: &str) -> Result<StepArg, String> {
    let (dir, steps) = s
        .split_once(':')
        .ok_or_else(|| format!("expected DIR:STEPS (e.g. near:3), got {s:?}"))?;
    let dir = dir.parse::<Direction>().map_err(|e| e.to_string())?;
    let steps = steps
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid step count {steps:?}: {e}"))?;
    Ok(StepArg { dir, steps })
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and print the step-to-code table
    Table,
    /// Power up, apply moves in order, report the final position
    Move {
        /// Relative move, repeatable: --step near:3 --step far:1
        #[arg(long = "step", value_name = "DIR:STEPS", value_parser = parse_step, required = true)]
        steps: Vec<StepArg>,
        /// Leave the actuator powered instead of parking and powering down
        #[arg(long, action = ArgAction::SetTrue)]
        keep_powered: bool,
    },
    /// Hunt between both ends of the range until done or Ctrl-C
    Sweep {
        /// Number of full near/far cycles (0 = until interrupted)
        #[arg(long, default_value_t = 1)]
        cycles: u32,
        /// Dwell at each end in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 50)]
        dwell_ms: u64,
    },
    /// Power up, exercise one coarse move, park and power down
    SelfCheck,
    /// Print lens optics and actuator parameters
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_args() {
        assert_eq!(
            parse_step("near:3"),
            Ok(StepArg {
                dir: Direction::Near,
                steps: 3
            })
        );
        assert_eq!(
            parse_step("FAR: 12"),
            Ok(StepArg {
                dir: Direction::Far,
                steps: 12
            })
        );
        assert!(parse_step("near").is_err());
        assert!(parse_step("up:1").is_err());
        assert!(parse_step("near:x").is_err());
    }
}
