//! Hardware assembly, config mapping and command execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use lens_config::{Config, RegionCfg};
use lens_core::conversions::{model_for, params_from_config};
use lens_core::{
    ActuatorError, ActuatorModel, ActuatorParams, Direction, FocusState, LensInfo, Result,
    StepTable, VcmActuator,
};
use lens_hardware::SimulatedBus;
use lens_traits::{Delay, PowerControl, RegisterBus, ThreadDelay};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::StepArg;

pub type Bus = Box<dyn RegisterBus + Send>;
pub type Power = Box<dyn PowerControl + Send>;
pub type Actuator = VcmActuator<Bus, Power>;

/// Concrete bus and enable line. `log` is a handle on the simulated bus, if any.
pub struct Hw {
    pub bus: Bus,
    pub power: Power,
    pub log: Option<SimulatedBus>,
}

/// Model, parameters and optics resolved from the config.
pub struct Resolved {
    pub model: Box<dyn ActuatorModel>,
    pub params: ActuatorParams,
    pub lens: LensInfo,
}

pub fn resolve(cfg: &Config, csv_regions: Option<&[RegionCfg]>) -> Result<Resolved> {
    let model = model_for(cfg.actuator.model);
    let params = params_from_config(cfg, model.as_ref(), csv_regions)?;
    let lens = cfg
        .lens
        .as_ref()
        .map_or_else(|| model.lens_info(), LensInfo::from);
    Ok(Resolved {
        model,
        params,
        lens,
    })
}

#[cfg(not(feature = "hardware"))]
pub fn make_hw(_cfg: &Config) -> Result<Hw> {
    let mut bus = SimulatedBus::new();
    // Test hook: fail the N-th register write attempt.
    if let Ok(v) = std::env::var("VCM_TEST_FAIL_WRITE") {
        let n: usize = v
            .trim()
            .parse()
            .wrap_err("VCM_TEST_FAIL_WRITE must be a positive integer")?;
        bus = bus.fail_at_write(n);
    }
    info!("using simulated actuator bus");
    Ok(Hw {
        bus: Box::new(bus.clone()),
        power: Box::new(lens_hardware::SimulatedPower::new()),
        log: Some(bus),
    })
}

#[cfg(feature = "hardware")]
pub fn make_hw(cfg: &Config) -> Result<Hw> {
    #[cfg(target_os = "linux")]
    {
        use lens_hardware::linux::{AddrWidth, GpioPower, I2cRegisterBus};

        let width = if cfg.bus.word_addressing {
            AddrWidth::Word
        } else {
            AddrWidth::Byte
        };
        let bus = I2cRegisterBus::open(cfg.bus.i2c_bus, cfg.bus.address, width, cfg.bus.retries)
            .map_err(|e| eyre::Report::new(ActuatorError::Io(e.to_string())))?;
        let power = GpioPower::new(cfg.pins.vcm_pwd)
            .map_err(|e| eyre::Report::new(ActuatorError::Power(e.to_string())))?;
        info!(
            i2c_bus = cfg.bus.i2c_bus,
            address = cfg.bus.address,
            vcm_pwd = cfg.pins.vcm_pwd,
            "using i2c actuator bus"
        );
        Ok(Hw {
            bus: Box::new(bus),
            power: Box::new(power),
            log: None,
        })
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = cfg;
        eyre::bail!("the hardware backend is only available on Linux")
    }
}

pub fn build_actuator(resolved: Resolved, hw: (Bus, Power)) -> Result<Actuator> {
    let (bus, power) = hw;
    VcmActuator::builder()
        .with_boxed_model(resolved.model)
        .with_params(resolved.params)
        .with_lens_info(resolved.lens)
        .with_bus(bus)
        .with_power(power)
        .build()
}

pub fn cmd_table(params: &ActuatorParams, json: bool) -> Result<()> {
    let table = StepTable::build(
        params.initial_code,
        params.total_steps,
        params.max_code,
        &params.regions,
    )?;
    if json {
        println!(
            "{}",
            json!({
                "total_steps": table.total_steps(),
                "codes": table.as_slice(),
            })
        );
    } else {
        println!("step  code");
        for (step, code) in table.as_slice().iter().enumerate() {
            println!("{step:>4}  {code:>4} (0x{code:03x})");
        }
    }
    Ok(())
}

pub fn cmd_info(resolved: &Resolved, json: bool) -> Result<()> {
    let p = &resolved.params;
    let l = &resolved.lens;
    if json {
        println!(
            "{}",
            json!({
                "model": resolved.model.name(),
                "i2c_address": resolved.model.i2c_address(),
                "total_steps": p.total_steps,
                "initial_code": p.initial_code,
                "max_code": p.max_code,
                "gross_steps": p.gross_steps,
                "fine_steps": p.fine_steps,
                "ringing": {
                    "ring_ctrl": p.ringing.ring_ctrl,
                    "mode": p.ringing.mode,
                    "freq": p.ringing.freq,
                },
                "lens": {
                    "focal_length_mm": l.focal_length.as_f64(),
                    "f_number": l.f_number.as_f64(),
                    "pixel_size_um": l.pixel_size.as_f64(),
                    "total_focus_distance_um": l.total_focus_distance.as_f64(),
                },
            })
        );
    } else {
        println!(
            "model: {} (i2c 0x{:02x})",
            resolved.model.name(),
            resolved.model.i2c_address()
        );
        println!(
            "steps: {} (gross {}, fine {})",
            p.total_steps, p.gross_steps, p.fine_steps
        );
        println!("codes: initial {}, max {}", p.initial_code, p.max_code);
        println!(
            "ringing: ctrl 0x{:02x}, mode 0x{:02x}, freq 0x{:02x}",
            p.ringing.ring_ctrl, p.ringing.mode, p.ringing.freq
        );
        println!(
            "lens: f={:.2} mm, F/{:.2}, pixel {:.2} um, focus travel {:.3} um",
            l.focal_length.as_f64(),
            l.f_number.as_f64(),
            l.pixel_size.as_f64(),
            l.total_focus_distance.as_f64()
        );
    }
    Ok(())
}

fn dir_name(d: Direction) -> &'static str {
    match d {
        Direction::Near => "near",
        Direction::Far => "far",
    }
}

/// Power down after a command, keeping the command's own error if it failed.
fn finish<T>(act: &Actuator, outcome: Result<T>) -> Result<T> {
    let off = act.power_down();
    match (outcome, off) {
        (Ok(v), Ok(())) => Ok(v),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), off) => {
            if let Err(off_err) = off {
                warn!(error = %off_err, "power down after failure also failed");
            }
            Err(e)
        }
    }
}

pub fn cmd_move(
    act: &Actuator,
    log: Option<&SimulatedBus>,
    steps: &[StepArg],
    keep_powered: bool,
    json: bool,
) -> Result<()> {
    if let Err(e) = act.power_up() {
        return finish(act, Err(e));
    }
    let outcome = steps
        .iter()
        .map(|s| act.move_focus(s.dir, s.steps).map(|st| (*s, st)))
        .collect::<Result<Vec<(StepArg, FocusState)>>>();
    let moves = if keep_powered {
        outcome?
    } else {
        finish(act, outcome)?
    };

    let last = moves.last().map(|(_, st)| *st);
    if json {
        let items: Vec<_> = moves
            .iter()
            .map(|(arg, st)| {
                json!({
                    "dir": dir_name(arg.dir),
                    "steps": arg.steps,
                    "step": st.step,
                    "code": st.code,
                })
            })
            .collect();
        let mut out = json!({
            "moves": items,
            "final": last.map(|st| json!({ "step": st.step, "code": st.code })),
            "powered": keep_powered,
        });
        if let Some(bus) = log {
            let writes: Vec<_> = bus.writes().iter().map(|w| [w.reg, w.value]).collect();
            out["bus_writes"] = json!(writes);
        }
        println!("{out}");
    } else {
        for (arg, st) in &moves {
            println!(
                "{} {:>3} -> step {:>3} code {:>4}",
                dir_name(arg.dir),
                arg.steps,
                st.step,
                st.code
            );
        }
        if let Some(st) = last {
            println!("final: step {} code {}", st.step, st.code);
        }
        if let Some(bus) = log {
            println!("bus writes: {}", bus.writes().len());
        }
    }
    Ok(())
}

/// Hunt end to end until `cycles` complete (0 = forever) or `shutdown` is set.
pub fn cmd_sweep(
    act: &Actuator,
    cycles: u32,
    dwell_ms: u64,
    shutdown: &Arc<AtomicBool>,
    json: bool,
) -> Result<()> {
    if let Err(e) = act.power_up() {
        return finish(act, Err(e));
    }
    let span = i32::from(act.params().total_steps);
    let dwell = ThreadDelay::new();
    let pause = Duration::from_millis(dwell_ms);

    let outcome = (|| -> Result<u32> {
        let mut done = 0u32;
        while cycles == 0 || done < cycles {
            if shutdown.load(Ordering::Relaxed) {
                info!(done, "sweep interrupted");
                break;
            }
            act.move_focus(Direction::Near, span)?;
            dwell.delay(pause);
            act.move_focus(Direction::Far, span)?;
            dwell.delay(pause);
            done += 1;
        }
        Ok(done)
    })();
    let done = finish(act, outcome)?;

    if json {
        println!(
            "{}",
            json!({ "cycles": done, "interrupted": shutdown.load(Ordering::Relaxed) })
        );
    } else {
        println!("sweep complete: {done} cycle(s)");
    }
    Ok(())
}

/// Power up, do one coarse move out and back, then power down.
pub fn cmd_self_check(act: &Actuator, json: bool) -> Result<()> {
    if let Err(e) = act.power_up() {
        return finish(act, Err(e));
    }
    let gross = i32::from(act.params().gross_steps.max(1));
    let outcome = (|| -> Result<FocusState> {
        let out = act.move_focus(Direction::Near, gross)?;
        let expected = act
            .table()?
            .and_then(|t| t.code(out.step))
            .ok_or(ActuatorError::NotReady)?;
        if out.code != expected {
            return Err(eyre::Report::new(ActuatorError::State(format!(
                "step {} reported code {} but table holds {}",
                out.step, out.code, expected
            ))));
        }
        act.move_focus(Direction::Far, gross)?;
        Ok(out)
    })();
    let probe = finish(act, outcome)?;

    if json {
        println!(
            "{}",
            json!({
                "ok": true,
                "model": act.model_name(),
                "probe": { "step": probe.step, "code": probe.code },
            })
        );
    } else {
        println!(
            "self-check ok: {} reached step {} (code {}) and parked",
            act.model_name(),
            probe.step,
            probe.code
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_hardware::SimulatedPower;

    fn sim_actuator() -> (Actuator, SimulatedBus) {
        let cfg = lens_config::load_toml("[pins]\nvcm_pwd = 17\n").unwrap();
        let resolved = resolve(&cfg, None).unwrap();
        let bus = SimulatedBus::new();
        let act = build_actuator(
            resolved,
            (Box::new(bus.clone()), Box::new(SimulatedPower::new())),
        )
        .unwrap();
        (act, bus)
    }

    #[test]
    fn move_parks_unless_kept_powered() {
        let (act, bus) = sim_actuator();
        let steps = [StepArg {
            dir: Direction::Near,
            steps: 3,
        }];
        cmd_move(&act, Some(&bus), &steps, false, true).unwrap();
        assert!(!act.is_ready());

        cmd_move(&act, Some(&bus), &steps, true, true).unwrap();
        assert_eq!(act.focus_state().unwrap().map(|s| s.step), Some(3));
    }

    #[test]
    fn sweep_stops_when_interrupted() {
        let (act, _bus) = sim_actuator();
        let stop = Arc::new(AtomicBool::new(true));
        cmd_sweep(&act, 0, 0, &stop, true).unwrap();
        assert!(!act.is_ready());
    }

    #[test]
    fn failed_power_up_drops_enable_line() {
        let cfg = lens_config::load_toml("[pins]\nvcm_pwd = 17\n").unwrap();
        let resolved = resolve(&cfg, None).unwrap();
        let bus = SimulatedBus::new().fail_at_write(1);
        let power = SimulatedPower::new();
        let act = build_actuator(
            resolved,
            (Box::new(bus.clone()), Box::new(power.clone())),
        )
        .unwrap();
        let steps = [StepArg {
            dir: Direction::Near,
            steps: 3,
        }];

        let err = cmd_move(&act, Some(&bus), &steps, true, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActuatorError>(),
            Some(ActuatorError::Io(_))
        ));
        assert!(!power.is_on());
        assert_eq!(power.transitions(), vec![true, false]);
    }

    #[test]
    fn self_check_passes_on_sim() {
        let (act, _bus) = sim_actuator();
        cmd_self_check(&act, false).unwrap();
    }
}
