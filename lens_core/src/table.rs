//! Step-to-DAC-code table.
//!
//! The table maps a logical focus step to the code written to the VCM DAC.
//! Steps near the initial code move the lens in coarse increments (the
//! "nonlinear" regions), later steps in finer ones. Each region covers the
//! steps up to and including its `step_bound`; steps past the last bound use
//! the last region.

use crate::error::{ActuatorError, BuildError, Result};

/// Per-step code increment for all steps up to `step_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBoundary {
    pub step_bound: u16,
    pub code_per_step: u16,
}

impl RegionBoundary {
    pub const fn new(step_bound: u16, code_per_step: u16) -> Self {
        Self {
            step_bound,
            code_per_step,
        }
    }
}

/// Non-empty region list, strictly increasing by `step_bound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMap {
    regions: Vec<RegionBoundary>,
}

impl RegionMap {
    pub fn new(regions: Vec<RegionBoundary>) -> Result<Self> {
        if regions.is_empty() {
            return Err(eyre::Report::new(BuildError::EmptyRegions));
        }
        if let Some(i) = regions
            .windows(2)
            .position(|w| w[1].step_bound <= w[0].step_bound)
        {
            return Err(eyre::Report::new(BuildError::UnorderedRegions { index: i + 1 }));
        }
        Ok(Self { regions })
    }

    /// A single region applying `code_per_step` to every step.
    pub fn uniform(code_per_step: u16) -> Self {
        Self {
            regions: vec![RegionBoundary::new(u16::MAX, code_per_step)],
        }
    }

    pub fn regions(&self) -> &[RegionBoundary] {
        &self.regions
    }

    /// Increment applied when entering `step`.
    #[inline]
    pub fn code_per_step(&self, step: u16) -> u16 {
        self.regions
            .iter()
            .find(|r| r.step_bound >= step)
            .or_else(|| self.regions.last())
            .map_or(0, |r| r.code_per_step)
    }
}

/// Immutable table of DAC codes indexed by step, `0..=total_steps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTable {
    codes: Vec<u16>,
}

impl StepTable {
    /// Build the table: `codes[0] = initial_code`, then each step adds the
    /// increment of its region to the previous code, clamped to `max_code`.
    pub fn build(
        initial_code: u16,
        total_steps: u16,
        max_code: u16,
        regions: &RegionMap,
    ) -> Result<Self> {
        if initial_code > max_code {
            return Err(eyre::Report::new(ActuatorError::InvalidArgument(format!(
                "initial code {initial_code} exceeds max code {max_code}"
            ))));
        }

        let len = usize::from(total_steps) + 1;
        let mut codes: Vec<u16> = Vec::new();
        codes
            .try_reserve_exact(len)
            .map_err(|_| eyre::Report::new(ActuatorError::Allocation))?;

        codes.push(initial_code);
        let mut prev = initial_code;
        for step in 1..=total_steps {
            let next = u32::from(prev) + u32::from(regions.code_per_step(step));
            prev = next.min(u32::from(max_code)) as u16;
            codes.push(prev);
        }

        tracing::debug!(
            initial_code,
            total_steps,
            max_code,
            last_code = prev,
            "step table built"
        );
        Ok(Self { codes })
    }

    /// Code for `step`, or `None` past the end of the table.
    #[inline]
    pub fn code(&self, step: u16) -> Option<u16> {
        self.codes.get(usize::from(step)).copied()
    }

    #[inline]
    pub fn total_steps(&self) -> u16 {
        // Length is total_steps + 1 by construction, and total_steps is u16.
        (self.codes.len() - 1) as u16
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always false: the table holds at least the initial code.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
