//! Type-state builder for `VcmActuator`.
//!
//! `build()` only exists once both a bus and a power controller have been
//! supplied. The model defaults to the OV5693 and its tuning; parameters and
//! lens optics can be overridden before building.

use std::sync::{Arc, Mutex};

use lens_traits::{Delay, PowerControl, RegisterBus, ThreadDelay};

use crate::actuator::{ActuatorState, Inner, VcmActuator};
use crate::config::{ActuatorParams, LensInfo};
use crate::error::Result;
use crate::model::{ActuatorModel, Ov5693};

/// Placeholder for a capability not yet supplied.
#[derive(Debug, Default)]
pub struct Missing;

pub struct ActuatorBuilder<B, P> {
    bus: B,
    power: P,
    model: Option<Box<dyn ActuatorModel>>,
    params: Option<ActuatorParams>,
    lens: Option<LensInfo>,
    delay: Option<Arc<dyn Delay + Send + Sync>>,
}

impl Default for ActuatorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            bus: Missing,
            power: Missing,
            model: None,
            params: None,
            lens: None,
            delay: None,
        }
    }
}

impl<B, P> ActuatorBuilder<B, P> {
    pub fn with_bus<B2: RegisterBus>(self, bus: B2) -> ActuatorBuilder<B2, P> {
        ActuatorBuilder {
            bus,
            power: self.power,
            model: self.model,
            params: self.params,
            lens: self.lens,
            delay: self.delay,
        }
    }

    pub fn with_power<P2: PowerControl>(self, power: P2) -> ActuatorBuilder<B, P2> {
        ActuatorBuilder {
            bus: self.bus,
            power,
            model: self.model,
            params: self.params,
            lens: self.lens,
            delay: self.delay,
        }
    }

    pub fn with_model(mut self, model: impl ActuatorModel + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn with_boxed_model(mut self, model: Box<dyn ActuatorModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Replace the model's default parameters.
    pub fn with_params(mut self, params: ActuatorParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_lens_info(mut self, lens: LensInfo) -> Self {
        self.lens = Some(lens);
        self
    }

    pub fn with_delay(mut self, delay: impl Delay + Send + Sync + 'static) -> Self {
        self.delay = Some(Arc::new(delay));
        self
    }
}

impl<B: RegisterBus, P: PowerControl> ActuatorBuilder<B, P> {
    /// Validate parameters and construct the actuator in the Uninitialized state.
    pub fn build(self) -> Result<VcmActuator<B, P>> {
        let model = self
            .model
            .unwrap_or_else(|| Box::new(Ov5693) as Box<dyn ActuatorModel>);
        let params = self.params.unwrap_or_else(|| model.default_params());
        params.validate()?;
        let lens = self.lens.unwrap_or_else(|| model.lens_info());
        let delay = self
            .delay
            .unwrap_or_else(|| Arc::new(ThreadDelay::new()) as Arc<dyn Delay + Send + Sync>);

        tracing::debug!(
            model = model.name(),
            initial_code = params.initial_code,
            total_steps = params.total_steps,
            max_code = params.max_code,
            "actuator built"
        );

        Ok(VcmActuator {
            model,
            params,
            lens,
            delay,
            inner: Mutex::new(Inner {
                bus: self.bus,
                power: self.power,
                state: ActuatorState::Uninitialized,
            }),
        })
    }
}
