#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and region table parsing for the lens actuator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The region CSV loader enforces headers and ordering so a tuned region
//!   table can be shipped next to the config without editing it.
use serde::Deserialize;
use serde::de::Deserializer;

/// Largest code the 10-bit VCM DAC accepts.
pub const DAC_MAX_CODE: u16 = 1023;

/// One region of the step table.
///
/// Region CSV schema, headers required:
/// step_bound,code_per_step
///
/// Example:
/// step_bound,code_per_step
/// 2,32
/// 52,16
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RegionCfg {
    pub step_bound: u16,
    pub code_per_step: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusCfg {
    /// Linux I2C adapter number (`/dev/i2c-N`)
    pub i2c_bus: u8,
    /// 7-bit peripheral address of the actuator driver
    pub address: u16,
    /// Attempts per register write at the bus layer (1 = no retry)
    pub retries: u32,
    /// Use 16-bit register addresses on the wire
    pub word_addressing: bool,
}

impl Default for BusCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x1C,
            retries: 1,
            word_addressing: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// Actuator enable (power-down) GPIO
    pub vcm_pwd: u8,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Ov5693,
    /// OV5693 driven through the rawchip AF path: 256 uniform steps
    Rawchip,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ActuatorCfg {
    pub model: ModelKind,
    /// Overrides of the model defaults; absent values keep the model's tuning.
    pub initial_code: Option<u16>,
    pub total_steps: Option<u16>,
    pub max_code: Option<u16>,
    pub gross_steps: Option<u16>,
    pub fine_steps: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RingingCfg {
    /// De-ring control register value
    pub ring_ctrl: u8,
    /// bit0: ring mode (1 = 1x period), bit1: PWM/linear drive
    pub mode: u8,
    /// Raw ringing frequency register value
    pub freq: Option<u8>,
    /// Mechanical resonance in Hz; derives `freq` when set
    pub resonance_hz: Option<f32>,
}

impl Default for RingingCfg {
    fn default() -> Self {
        Self {
            ring_ctrl: 0x02,
            mode: 0x03,
            freq: None,
            resonance_hz: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LensCfg {
    pub focal_length: Ratio,
    pub f_number: Ratio,
    pub pixel_size: Ratio,
    pub total_focus_distance: Ratio,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusCfg,
    pub pins: Pins,
    #[serde(default)]
    pub actuator: ActuatorCfg,
    /// Optional region table. Accepts either:
    /// - array of tables: [[regions]] step_bound = 2, code_per_step = 32
    /// - array of tuples: regions = [[2, 32], [52, 16]]
    #[serde(default, deserialize_with = "de_regions")]
    pub regions: Vec<RegionCfg>,
    #[serde(default)]
    pub ringing: RingingCfg,
    /// Optional lens optics override
    #[serde(default)]
    pub lens: Option<LensCfg>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegionToml {
    Tuple((u16, u16)),
    Table { step_bound: u16, code_per_step: u16 },
}

fn de_regions<'de, D>(deserializer: D) -> Result<Vec<RegionCfg>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<RegionToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for r in items {
            match r {
                RegionToml::Tuple((step_bound, code_per_step)) => out.push(RegionCfg {
                    step_bound,
                    code_per_step,
                }),
                RegionToml::Table {
                    step_bound,
                    code_per_step,
                } => out.push(RegionCfg {
                    step_bound,
                    code_per_step,
                }),
            }
        }
    }
    Ok(out)
}

/// Check that regions are non-empty and strictly increasing by `step_bound`.
pub fn validate_regions(regions: &[RegionCfg]) -> eyre::Result<()> {
    if regions.is_empty() {
        eyre::bail!("regions must contain at least one entry");
    }
    for (i, pair) in regions.windows(2).enumerate() {
        if pair[1].step_bound <= pair[0].step_bound {
            eyre::bail!(
                "regions must be strictly increasing by step_bound (index {} = {}, index {} = {})",
                i,
                pair[0].step_bound,
                i + 1,
                pair[1].step_bound
            );
        }
    }
    Ok(())
}

pub fn load_region_csv(path: &std::path::Path) -> eyre::Result<Vec<RegionCfg>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open region CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["step_bound", "code_per_step"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "region CSV must have headers 'step_bound,code_per_step', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<RegionCfg>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_regions(&rows)?;
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Bus
        if self.bus.address > 0x7F {
            eyre::bail!("bus.address must be a 7-bit address (<= 0x7f)");
        }
        if self.bus.retries == 0 {
            eyre::bail!("bus.retries must be >= 1");
        }
        if self.bus.retries > 100 {
            eyre::bail!("bus.retries is unreasonably large (>100)");
        }

        // Actuator
        if let Some(max) = self.actuator.max_code
            && max > DAC_MAX_CODE
        {
            eyre::bail!("actuator.max_code must be <= {DAC_MAX_CODE}");
        }
        if let (Some(init), Some(max)) = (self.actuator.initial_code, self.actuator.max_code)
            && init > max
        {
            eyre::bail!("actuator.initial_code must be <= actuator.max_code");
        }
        if let Some(init) = self.actuator.initial_code
            && init > DAC_MAX_CODE
        {
            eyre::bail!("actuator.initial_code must be <= {DAC_MAX_CODE}");
        }
        if let Some(steps) = self.actuator.total_steps
            && steps > 4096
        {
            eyre::bail!("actuator.total_steps is unreasonably large (>4096)");
        }

        // Regions are optional; when present they must be well-formed
        if !self.regions.is_empty() {
            validate_regions(&self.regions)?;
        }

        // Ringing
        if self.ringing.freq.is_some() && self.ringing.resonance_hz.is_some() {
            eyre::bail!("ringing.freq and ringing.resonance_hz are mutually exclusive");
        }
        if let Some(hz) = self.ringing.resonance_hz
            && !(hz.is_finite() && hz > 0.0)
        {
            eyre::bail!("ringing.resonance_hz must be > 0");
        }

        // Lens
        if let Some(lens) = &self.lens {
            for (name, r) in [
                ("focal_length", lens.focal_length),
                ("f_number", lens.f_number),
                ("pixel_size", lens.pixel_size),
                ("total_focus_distance", lens.total_focus_distance),
            ] {
                if r.den == 0 {
                    eyre::bail!("lens.{name}.den must be > 0");
                }
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
