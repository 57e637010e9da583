#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Lens actuator control (hardware-agnostic).
//!
//! This crate drives a voice-coil-motor autofocus actuator. All hardware
//! interactions go through `lens_traits::RegisterBus` and
//! `lens_traits::PowerControl`.
//!
//! ## Architecture
//!
//! - **Step table**: step index to DAC code, region-dependent increments (`table`)
//! - **Focus**: direction, clamped destination (`focus`)
//! - **Models**: register protocol and tuning per actuator (`model`)
//! - **Context**: `VcmActuator`, the Uninitialized/Ready state machine (`actuator`)
//! - **Configuration**: runtime parameters (`config`), TOML mapping (`conversions`)

pub mod actuator;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod focus;
pub mod hw_error;
pub mod model;
pub mod table;

pub use actuator::VcmActuator;
pub use builder::{ActuatorBuilder, Missing};
pub use config::{ActuatorParams, DAC_MAX_CODE, LensInfo, Rational, RingingParams};
pub use error::{ActuatorError, BuildError, Report, Result};
pub use focus::{Direction, FocusState, MOVE_FAR, MOVE_NEAR};
pub use model::{ActuatorModel, Ov5693, Ov5693Rawchip};
pub use table::{RegionBoundary, RegionMap, StepTable};
