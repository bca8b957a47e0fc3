use crate::core::utils::geometry::Bounds;
use crate::engine::config::PolishConfig;
use crate::engine::error::EngineError;
use argmin::core::{
    CostFunction, Error as ArgminError, Executor, Gradient, LineSearch, State, TerminationReason,
};
use argmin::solver::linesearch::BacktrackingLineSearch;
use argmin::solver::linesearch::condition::ArmijoCondition;
use std::cell::{Cell, RefCell};
use tracing::{debug, instrument, trace};

const MAX_HALVINGS: u64 = 10;
const ARMIJO_CONSTANT: f64 = 1e-4;
const CONTRACTION: f64 = 0.5;

type Armijo = BacktrackingLineSearch<Vec<f64>, Vec<f64>, ArmijoCondition<f64>, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PolishOutcome {
    pub x: Vec<f64>,
    pub energy: f64,
    pub iterations: usize,
    pub evaluations: usize,
    /// Whether the polished point is strictly lower than the starting point.
    pub improved: bool,
}

/// The objective seen through the search box: every parameter is clamped before it
/// is evaluated, and the most recent evaluation is remembered so a gradient at an
/// accepted point does not pay for its base energy twice.
struct BoxedObjective<'a, F> {
    objective: &'a F,
    bounds: &'a Bounds,
    step: f64,
    evaluations: &'a Cell<usize>,
    last: &'a RefCell<Option<(Vec<f64>, f64)>>,
}

impl<F> Clone for BoxedObjective<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for BoxedObjective<'_, F> {}

impl<F: Fn(&[f64]) -> f64> BoxedObjective<'_, F> {
    fn project(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(axis, &value)| self.bounds.clamp(axis, value))
            .collect()
    }

    fn call(&self, x: &[f64]) -> f64 {
        self.evaluations.set(self.evaluations.get() + 1);
        (self.objective)(x)
    }

    fn energy_at(&self, x: &[f64]) -> f64 {
        let cached = self
            .last
            .borrow()
            .as_ref()
            .filter(|(seen, _)| seen.as_slice() == x)
            .map(|(_, energy)| *energy);
        if let Some(energy) = cached {
            return energy;
        }
        let energy = self.call(x);
        *self.last.borrow_mut() = Some((x.to_vec(), energy));
        energy
    }
}

impl<F: Fn(&[f64]) -> f64> CostFunction for BoxedObjective<'_, F> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        Ok(self.energy_at(&self.project(param)))
    }
}

impl<F: Fn(&[f64]) -> f64> Gradient for BoxedObjective<'_, F> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    /// Forward differences; the displacement points inward at an upper bound.
    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, ArgminError> {
        let x = self.project(param);
        let energy = self.energy_at(&x);
        let upper = self.bounds.upper();
        let mut displaced = x.clone();
        Ok((0..x.len())
            .map(|axis| {
                let h = if x[axis] + self.step > upper[axis] {
                    -self.step
                } else {
                    self.step
                };
                displaced[axis] = x[axis] + h;
                let derivative = (self.call(&displaced) - energy) / h;
                displaced[axis] = x[axis];
                derivative
            })
            .collect())
    }
}

/// Refines `start` by projected steepest descent inside `bounds`.
///
/// Each iteration backtracks along the normalized negative gradient until the
/// Armijo condition holds. The search stops once the gradient is flat or no step
/// lowers the energy.
///
/// # Errors
///
/// Returns [`EngineError::Polish`] if the line search cannot be set up or run.
#[instrument(skip_all, name = "polish", fields(dimension = start.len()))]
pub fn polish<F>(
    objective: F,
    bounds: &Bounds,
    start: &[f64],
    start_energy: f64,
    config: &PolishConfig,
) -> Result<PolishOutcome, EngineError>
where
    F: Fn(&[f64]) -> f64,
{
    let evaluations = Cell::new(0);
    let last = RefCell::new(Some((start.to_vec(), start_energy)));
    let problem = BoxedObjective {
        objective: &objective,
        bounds,
        step: config.finite_difference_step,
        evaluations: &evaluations,
        last: &last,
    };

    let mut x = start.to_vec();
    let mut energy = start_energy;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        let gradient = problem.gradient(&x).map_err(to_engine_error)?;
        let norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
        if !norm.is_finite() || norm < config.gradient_tolerance {
            debug!(norm, "Gradient is flat; stopping.");
            break;
        }
        let direction = gradient.iter().map(|g| -g / norm).collect();

        match backtrack(problem, &x, energy, gradient, direction, config.step_size)
            .map_err(to_engine_error)?
        {
            Some((candidate, candidate_energy)) => {
                trace!(iteration = iterations, energy = candidate_energy, "Step accepted.");
                x = candidate;
                energy = candidate_energy;
                iterations += 1;
            }
            None => {
                debug!(iteration = iterations, "No descent step found; stopping.");
                break;
            }
        }
    }

    Ok(PolishOutcome {
        x,
        energy,
        iterations,
        evaluations: evaluations.get(),
        improved: energy < start_energy,
    })
}

/// One Armijo backtracking search from `x`; `None` when no halving satisfied the condition.
fn backtrack<F: Fn(&[f64]) -> f64>(
    problem: BoxedObjective<'_, F>,
    x: &[f64],
    energy: f64,
    gradient: Vec<f64>,
    direction: Vec<f64>,
    step_size: f64,
) -> Result<Option<(Vec<f64>, f64)>, ArgminError> {
    let mut linesearch: Armijo =
        BacktrackingLineSearch::new(ArmijoCondition::new(ARMIJO_CONSTANT)?).rho(CONTRACTION)?;
    linesearch.search_direction(direction);
    linesearch.initial_step_length(step_size)?;

    let result = Executor::new(problem, linesearch)
        .configure(|state| {
            state
                .param(x.to_vec())
                .gradient(gradient)
                .cost(energy)
                .max_iters(MAX_HALVINGS)
        })
        .run()?;

    let state = result.state();
    if !matches!(
        state.get_termination_reason(),
        Some(TerminationReason::SolverConverged)
    ) {
        return Ok(None);
    }
    Ok(state
        .get_param()
        .map(|param| (problem.project(param), state.get_cost())))
}

fn to_engine_error(err: ArgminError) -> EngineError {
    EngineError::Polish(err.to_string())
}
