//! Mapping from the TOML config (`lens_config`) into runtime types.

use lens_config::{Config, LensCfg, ModelKind, Ratio, RegionCfg, RingingCfg};

use crate::config::{ActuatorParams, LensInfo, Rational, RingingParams};
use crate::error::Result;
use crate::model::{ActuatorModel, Ov5693, Ov5693Rawchip};
use crate::table::{RegionBoundary, RegionMap};

pub fn model_for(kind: ModelKind) -> Box<dyn ActuatorModel> {
    match kind {
        ModelKind::Ov5693 => Box::new(Ov5693),
        ModelKind::Rawchip => Box::new(Ov5693Rawchip),
    }
}

impl From<&RegionCfg> for RegionBoundary {
    fn from(r: &RegionCfg) -> Self {
        RegionBoundary::new(r.step_bound, r.code_per_step)
    }
}

impl From<Ratio> for Rational {
    fn from(r: Ratio) -> Self {
        Rational::new(r.num, r.den)
    }
}

impl From<&LensCfg> for LensInfo {
    fn from(l: &LensCfg) -> Self {
        LensInfo {
            focal_length: l.focal_length.into(),
            f_number: l.f_number.into(),
            pixel_size: l.pixel_size.into(),
            total_focus_distance: l.total_focus_distance.into(),
        }
    }
}

/// Ringing registers from config; `base` supplies the frequency when the
/// config names neither a raw value nor a resonance.
pub fn ringing_from_config(r: &RingingCfg, base: RingingParams) -> RingingParams {
    let freq = match (r.freq, r.resonance_hz) {
        (Some(f), _) => f,
        (None, Some(hz)) => RingingParams::freq_for_resonance(hz),
        (None, None) => base.freq,
    };
    RingingParams {
        ring_ctrl: r.ring_ctrl,
        mode: r.mode,
        freq,
    }
}

/// Model defaults with the config's overrides applied.
///
/// `regions_override` (e.g. from a region CSV) wins over `[[regions]]`.
pub fn params_from_config(
    cfg: &Config,
    model: &dyn ActuatorModel,
    regions_override: Option<&[RegionCfg]>,
) -> Result<ActuatorParams> {
    let mut params = model.default_params();
    let a = &cfg.actuator;
    if let Some(v) = a.initial_code {
        params.initial_code = v;
    }
    if let Some(v) = a.total_steps {
        params.total_steps = v;
    }
    if let Some(v) = a.max_code {
        params.max_code = v;
    }
    if let Some(v) = a.gross_steps {
        params.gross_steps = v;
    }
    if let Some(v) = a.fine_steps {
        params.fine_steps = v;
    }

    let regions = regions_override.unwrap_or(cfg.regions.as_slice());
    if !regions.is_empty() {
        params.regions = RegionMap::new(regions.iter().map(RegionBoundary::from).collect())?;
    }
    params.ringing = ringing_from_config(&cfg.ringing, params.ringing);
    params.validate()?;
    Ok(params)
}
