mod cli;
mod error_fmt;
mod logging;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use lens_core::ActuatorError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::error!(error = %e, "command failed");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let text = std::fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {}", cli.config.display()))?;
    let cfg = lens_config::load_toml(&text).wrap_err("parse config")?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(ActuatorError::Config(format!("{e:#}"))))?;

    logging::init(&cli.log_level, cli.json, &cfg.logging)?;

    let csv_regions = cli
        .regions
        .as_deref()
        .map(lens_config::load_region_csv)
        .transpose()?;
    let resolved = run::resolve(&cfg, csv_regions.as_deref())?;
    tracing::debug!(
        model = resolved.model.name(),
        total_steps = resolved.params.total_steps,
        "config resolved"
    );

    match cli.cmd {
        Commands::Table => run::cmd_table(&resolved.params, cli.json),
        Commands::Info => run::cmd_info(&resolved, cli.json),
        Commands::Move {
            steps,
            keep_powered,
        } => {
            let hw = run::make_hw(&cfg)?;
            let act = run::build_actuator(resolved, (hw.bus, hw.power))?;
            run::cmd_move(&act, hw.log.as_ref(), &steps, keep_powered, cli.json)
        }
        Commands::Sweep { cycles, dwell_ms } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;
            let hw = run::make_hw(&cfg)?;
            let act = run::build_actuator(resolved, (hw.bus, hw.power))?;
            run::cmd_sweep(&act, cycles, dwell_ms, &shutdown, cli.json)
        }
        Commands::SelfCheck => {
            let hw = run::make_hw(&cfg)?;
            let act = run::build_actuator(resolved, (hw.bus, hw.power))?;
            run::cmd_self_check(&act, cli.json)
        }
    }
}
