use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ForecastError;
use crate::ForecastResult;

use super::assumptions::AssumptionSet;
use super::base::BaseFinancials;
use super::period::{Period, PriorState};
use super::projector::project_period;

/// Lifecycle of a [`ForecastEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Uninitialized,
    /// Inputs loaded, nothing projected yet
    Ready,
    /// The given number of periods has been produced
    Projecting(u32),
    Complete,
    /// A period failed; nothing at or after it will be produced
    Aborted(u32),
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "uninitialized"),
            EngineState::Ready => write!(f, "ready"),
            EngineState::Projecting(i) => write!(f, "projecting (period {i} done)"),
            EngineState::Complete => write!(f, "complete"),
            EngineState::Aborted(i) => write!(f, "aborted at period {i}"),
        }
    }
}

/// Drives the period-by-period recurrence over the forecast horizon.
///
/// Use [`ForecastEngine::run`] for a whole horizon at once, or
/// [`load`](ForecastEngine::load) and [`step`](ForecastEngine::step) to pull
/// periods one at a time. Stopping early needs no cleanup.
#[derive(Debug, Default)]
pub struct ForecastEngine<'a> {
    state: EngineState,
    assumptions: Option<&'a AssumptionSet>,
    prior: Option<PriorState>,
    periods: Vec<Period>,
}

impl<'a> ForecastEngine<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project the full horizon as a fold carrying the prior period.
    pub fn run(
        base: &BaseFinancials,
        assumptions: &AssumptionSet,
    ) -> ForecastResult<Vec<Period>> {
        base.validate()?;
        let horizon = assumptions.horizon();

        let (_, periods) = (1..=horizon).try_fold(
            (base.opening_state(), Vec::with_capacity(horizon as usize)),
            |(prior, mut periods), _| {
                let period = project_period(&prior, assumptions)?;
                let next = PriorState::from(&period);
                periods.push(period);
                Ok::<_, ForecastError>((next, periods))
            },
        )?;

        info!(horizon, "forecast complete");
        Ok(periods)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Periods produced so far, in order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn into_periods(self) -> Vec<Period> {
        self.periods
    }

    /// Validate the base year and move to `Ready`.
    pub fn load(
        &mut self,
        base: &'a BaseFinancials,
        assumptions: &'a AssumptionSet,
    ) -> ForecastResult<()> {
        if self.state != EngineState::Uninitialized {
            return Err(invalid_state("load", self.state));
        }
        base.validate()?;

        self.assumptions = Some(assumptions);
        self.prior = Some(base.opening_state());
        self.periods = Vec::with_capacity(assumptions.horizon() as usize);
        self.state = EngineState::Ready;
        debug!(
            fiscal_year = base.fiscal_year,
            horizon = assumptions.horizon(),
            "forecast engine ready"
        );
        Ok(())
    }

    /// Produce the next period. Returns `Ok(None)` once the horizon is done.
    ///
    /// Any error aborts the engine; later calls fail with `InvalidState`.
    pub fn step(&mut self) -> ForecastResult<Option<&Period>> {
        let assumptions = match (self.state, self.assumptions) {
            (EngineState::Complete, _) => return Ok(None),
            (EngineState::Ready | EngineState::Projecting(_), Some(a)) => a,
            (state, _) => return Err(invalid_state("step", state)),
        };

        let result = match self.prior.as_ref() {
            Some(prior) => project_period(prior, assumptions),
            None => return Err(invalid_state("step", self.state)),
        };

        match result {
            Ok(period) => {
                let index = period.index;
                self.prior = Some(PriorState::from(&period));
                self.periods.push(period);
                self.state = if index >= assumptions.horizon() {
                    EngineState::Complete
                } else {
                    EngineState::Projecting(index)
                };
                Ok(self.periods.last())
            }
            Err(e) => {
                let failed = self.periods.len() as u32 + 1;
                self.state = EngineState::Aborted(failed);
                self.prior = None;
                Err(e)
            }
        }
    }

    /// Step until the horizon is complete.
    pub fn run_to_completion(&mut self) -> ForecastResult<&[Period]> {
        while self.step()?.is_some() {}
        Ok(&self.periods)
    }
}

fn invalid_state(operation: &str, state: EngineState) -> ForecastError {
    ForecastError::InvalidState {
        operation: operation.to_string(),
        state: state.to_string(),
    }
}
