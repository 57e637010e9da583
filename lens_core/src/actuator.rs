//! The actuator context (`VcmActuator`).
//!
//! Owns the bus, the enable line and the step table. All state lives behind
//! one mutex, held for the whole of any table build, move or power sequence,
//! so a move can never observe a partially built table and at most one
//! position command is in flight.

use std::sync::{Arc, Mutex, MutexGuard};

use lens_traits::{Delay, PowerControl, RegisterBus};
use tracing::{debug, error, info, warn};

use crate::builder::ActuatorBuilder;
use crate::config::{ActuatorParams, LensInfo, POWER_SETTLE_MS};
use crate::error::{ActuatorError, Result};
use crate::focus::{Direction, FocusState, destination};
use crate::hw_error::map_hw_error;
use crate::model::ActuatorModel;
use crate::table::StepTable;

#[derive(Debug)]
pub(crate) enum ActuatorState {
    /// No table; no position writes permitted.
    Uninitialized,
    Ready { table: StepTable, current_step: u16 },
}

pub(crate) struct Inner<B, P> {
    pub(crate) bus: B,
    pub(crate) power: P,
    pub(crate) state: ActuatorState,
}

pub struct VcmActuator<B, P> {
    pub(crate) model: Box<dyn ActuatorModel>,
    pub(crate) params: ActuatorParams,
    pub(crate) lens: LensInfo,
    pub(crate) delay: Arc<dyn Delay + Send + Sync>,
    pub(crate) inner: Mutex<Inner<B, P>>,
}

impl<B: RegisterBus, P: PowerControl> core::fmt::Debug for VcmActuator<B, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VcmActuator")
            .field("model", &self.model.name())
            .field("total_steps", &self.params.total_steps)
            .field("state", &self.focus_state().ok().flatten())
            .finish()
    }
}

impl VcmActuator<crate::builder::Missing, crate::builder::Missing> {
    /// Start building an actuator.
    pub fn builder() -> ActuatorBuilder<crate::builder::Missing, crate::builder::Missing> {
        ActuatorBuilder::default()
    }
}

impl<B: RegisterBus, P: PowerControl> VcmActuator<B, P> {
    fn lock(&self) -> Result<MutexGuard<'_, Inner<B, P>>> {
        self.inner.lock().map_err(|_| {
            eyre::Report::new(ActuatorError::State("actuator lock poisoned".into()))
        })
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn params(&self) -> &ActuatorParams {
        &self.params
    }

    pub fn lens_info(&self) -> LensInfo {
        self.lens
    }

    /// `true` once the table is built. A poisoned lock reads as not ready;
    /// use `focus_state` to tell the two apart.
    pub fn is_ready(&self) -> bool {
        matches!(self.focus_state(), Ok(Some(_)))
    }

    /// Current step and code, or `None` before the table is built.
    pub fn focus_state(&self) -> Result<Option<FocusState>> {
        let inner = self.lock()?;
        Ok(match &inner.state {
            ActuatorState::Uninitialized => None,
            ActuatorState::Ready {
                table,
                current_step,
            } => table.code(*current_step).map(|code| FocusState {
                step: *current_step,
                code,
            }),
        })
    }

    /// Copy of the step table, if built.
    pub fn table(&self) -> Result<Option<StepTable>> {
        let inner = self.lock()?;
        Ok(match &inner.state {
            ActuatorState::Uninitialized => None,
            ActuatorState::Ready { table, .. } => Some(table.clone()),
        })
    }

    /// Program the ringing registers and build the step table.
    ///
    /// A second call on a built table does nothing and succeeds.
    pub fn init_table(&self) -> Result<()> {
        let mut inner = self.lock()?;
        self.init_table_locked(&mut inner)
    }

    fn init_table_locked(&self, inner: &mut Inner<B, P>) -> Result<()> {
        if matches!(inner.state, ActuatorState::Ready { .. }) {
            debug!(model = self.model.name(), "table already initialized");
            return Ok(());
        }

        self.model.configure(&mut inner.bus, &self.params.ringing)?;

        let table = StepTable::build(
            self.params.initial_code,
            self.params.total_steps,
            self.params.max_code,
            &self.params.regions,
        )
        .inspect_err(|e| error!(error = %e, "step table init failed"))?;

        info!(
            model = self.model.name(),
            total_steps = table.total_steps(),
            "step table ready"
        );
        inner.state = ActuatorState::Ready {
            table,
            current_step: 0,
        };
        Ok(())
    }

    /// Move by `num_steps` in `dir`, clamped to the table.
    ///
    /// A move that lands on the current step performs no bus traffic. The
    /// position advances only after the DAC write succeeds.
    pub fn move_focus(&self, dir: Direction, num_steps: i32) -> Result<FocusState> {
        let mut inner = self.lock()?;
        self.move_focus_locked(&mut inner, dir, num_steps)
    }

    /// `move_focus` with a raw direction code (`MOVE_NEAR`/`MOVE_FAR`).
    pub fn move_focus_raw(&self, dir: i32, num_steps: i32) -> Result<FocusState> {
        let dir = Direction::try_from(dir).map_err(|e| {
            error!(dir, "illegal focus direction");
            eyre::Report::new(e)
        })?;
        self.move_focus(dir, num_steps)
    }

    fn move_focus_locked(
        &self,
        inner: &mut Inner<B, P>,
        dir: Direction,
        num_steps: i32,
    ) -> Result<FocusState> {
        debug!(?dir, num_steps, "move focus");
        let Inner { bus, state, .. } = inner;
        let ActuatorState::Ready {
            table,
            current_step,
        } = state
        else {
            return Err(eyre::Report::new(ActuatorError::NotReady));
        };

        let dest = destination(*current_step, dir, num_steps, table.total_steps());
        let code = table.code(dest).ok_or_else(|| {
            eyre::Report::new(ActuatorError::State(format!("step {dest} outside table")))
        })?;
        if dest == *current_step {
            return Ok(FocusState { step: dest, code });
        }

        self.model
            .write_code(bus, code)
            .inspect_err(|e| error!(step = dest, code, error = %e, "focus move failed"))?;
        *current_step = dest;
        debug!(step = dest, code, "current step");
        Ok(FocusState { step: dest, code })
    }

    /// Write the initial code and reset the position to step 0.
    pub fn init_focus(&self) -> Result<FocusState> {
        let mut inner = self.lock()?;
        let Inner { bus, state, .. } = &mut *inner;
        let ActuatorState::Ready { current_step, .. } = state else {
            return Err(eyre::Report::new(ActuatorError::NotReady));
        };
        let code = self.params.initial_code;
        self.model
            .write_code(bus, code)
            .inspect_err(|e| error!(error = %e, "init focus write failed"))?;
        *current_step = 0;
        Ok(FocusState { step: 0, code })
    }

    /// Return the lens to step 0.
    pub fn set_default_focus(&self) -> Result<FocusState> {
        let mut inner = self.lock()?;
        self.set_default_focus_locked(&mut inner)
    }

    fn set_default_focus_locked(&self, inner: &mut Inner<B, P>) -> Result<FocusState> {
        let current = match &inner.state {
            ActuatorState::Uninitialized => {
                return Err(eyre::Report::new(ActuatorError::NotReady));
            }
            ActuatorState::Ready { current_step, .. } => *current_step,
        };
        self.move_focus_locked(inner, Direction::Far, i32::from(current))
    }

    /// Full re-initialisation: enable the driver, rebuild the table from
    /// scratch and take the driver out of standby.
    pub fn power_up(&self) -> Result<FocusState> {
        let mut inner = self.lock()?;
        info!(model = self.model.name(), "power up");

        self.power_on_locked(&mut inner)?;
        self.model.wake(&mut inner.bus, &self.params.ringing)?;

        inner.state = ActuatorState::Uninitialized;
        self.init_table_locked(&mut inner)
            .inspect_err(|e| error!(error = %e, "init table failed"))?;

        self.model.enable(&mut inner.bus)?;

        Ok(FocusState {
            step: 0,
            code: self.params.initial_code,
        })
    }

    /// Park the lens at step 0, drop the enable line and release the table.
    ///
    /// The enable line is dropped even when parking fails; the first error
    /// is returned. Moves return `NotReady` until the next `power_up`.
    pub fn power_down(&self) -> Result<()> {
        let mut inner = self.lock()?;
        info!(model = self.model.name(), "power down");

        let parked = if matches!(inner.state, ActuatorState::Ready { .. }) {
            self.set_default_focus_locked(&mut inner).map(|_| ())
        } else {
            Ok(())
        };
        if let Err(e) = &parked {
            warn!(error = %e, "default focus failed during power down");
        }
        let off = self.power_off_locked(&mut inner);
        inner.state = ActuatorState::Uninitialized;
        parked.and(off)
    }

    fn power_on_locked(&self, inner: &mut Inner<B, P>) -> Result<()> {
        self.delay.delay_ms(POWER_SETTLE_MS);
        inner.power.power_on().map_err(|e| {
            error!(error = %e, "actuator power on failed");
            eyre::Report::new(map_hw_error(e.as_ref()))
        })?;
        self.delay.delay_ms(POWER_SETTLE_MS);
        Ok(())
    }

    fn power_off_locked(&self, inner: &mut Inner<B, P>) -> Result<()> {
        self.delay.delay_ms(POWER_SETTLE_MS);
        inner.power.power_off().map_err(|e| {
            error!(error = %e, "actuator power off failed");
            eyre::Report::new(map_hw_error(e.as_ref()))
        })?;
        self.delay.delay_ms(POWER_SETTLE_MS);
        Ok(())
    }
}
