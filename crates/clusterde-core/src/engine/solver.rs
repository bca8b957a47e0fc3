use crate::core::utils::geometry::Bounds;
use crate::engine::config::{InitStrategy, SolverConfig};
use crate::engine::error::EngineError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const MIN_POPULATION: usize = 5;
pub const MSG_CONVERGED: &str = "Optimization terminated successfully.";
pub const MSG_MAX_ITERATIONS: &str = "Maximum number of iterations has been exceeded.";

const MACHINE_EPSILON: f64 = f64::EPSILON;

/// What the solver exposes about the population after each generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport<'a> {
    /// 1-based generation index.
    pub generation: usize,
    /// Best candidate so far, in problem coordinates.
    pub best: &'a [f64],
    pub best_energy: f64,
    /// `tolerance / relative spread`; it reaches 1 when the run would converge on relative spread alone.
    pub convergence: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub x: Vec<f64>,
    pub energy: f64,
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub message: String,
}

/// Population members kept in unit-cube coordinates with their energies.
struct Population {
    members: Vec<Vec<f64>>,
    energies: Vec<f64>,
    best: usize,
}

impl Population {
    fn best_member(&self) -> &[f64] {
        &self.members[self.best]
    }

    fn best_energy(&self) -> f64 {
        self.energies[self.best]
    }

    fn refresh_best(&mut self) {
        self.best = self
            .energies
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
    }

    fn mean_and_std(&self) -> (f64, f64) {
        let n = self.energies.len() as f64;
        let mean = self.energies.iter().sum::<f64>() / n;
        let variance = self.energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    /// Relative spread of the energies, `std / |mean|`.
    fn relative_spread(&self) -> f64 {
        let (mean, std) = self.mean_and_std();
        std / (mean.abs() + MACHINE_EPSILON)
    }

    fn is_converged(&self, tolerance: f64, abs_tolerance: f64) -> bool {
        let (mean, std) = self.mean_and_std();
        std <= abs_tolerance + tolerance * mean.abs()
    }
}

/// `best1bin` differential evolution over a box-constrained search space.
pub struct DifferentialEvolution<'a> {
    bounds: &'a Bounds,
    config: &'a SolverConfig,
}

impl<'a> DifferentialEvolution<'a> {
    pub fn new(bounds: &'a Bounds, config: &'a SolverConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if bounds.dimension() == 0 {
            return Err(EngineError::Initialization(
                "Search space has no dimensions.".to_string(),
            ));
        }
        Ok(Self { bounds, config })
    }

    pub fn population_len(&self) -> usize {
        (self.config.population_size * self.bounds.dimension()).max(MIN_POPULATION)
    }

    /// Minimizes `objective` inside the bounds.
    ///
    /// `on_generation` runs after every generation; an error from it stops the
    /// run and is returned unchanged.
    #[instrument(skip_all, name = "differential_evolution", fields(dimension = self.bounds.dimension()))]
    pub fn minimize<F, C>(&self, objective: F, mut on_generation: C) -> Result<SolverOutcome, EngineError>
    where
        F: Fn(&[f64]) -> f64 + Sync,
        C: FnMut(&GenerationReport<'_>) -> Result<(), EngineError>,
    {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let immediate = self.config.workers <= 1;

        let members = self.initial_members(&mut rng);
        let energies = self.evaluate_all(&objective, &members, immediate);
        let mut evaluations = members.len();
        let mut population = Population {
            members,
            energies,
            best: 0,
        };
        population.refresh_best();
        info!(
            members = population.members.len(),
            best_energy = population.best_energy(),
            "Initial population evaluated."
        );

        let mut converged = false;
        let mut generations = 0;
        for generation in 1..=self.config.max_iterations {
            let (lo, hi) = self.config.mutation;
            let scale = if hi > lo { rng.gen_range(lo..hi) } else { lo };

            evaluations += if immediate {
                self.evolve_immediate(&objective, &mut population, scale, &mut rng)
            } else {
                self.evolve_deferred(&objective, &mut population, scale, &mut rng)
            };
            generations = generation;

            let best = self.bounds.scale(population.best_member());
            let report = GenerationReport {
                generation,
                best: &best,
                best_energy: population.best_energy(),
                convergence: self.config.tolerance / population.relative_spread(),
                evaluations,
            };
            info!(
                generation,
                best_energy = report.best_energy,
                convergence = report.convergence,
                "Generation complete."
            );
            on_generation(&report)?;

            if population.is_converged(self.config.tolerance, self.config.abs_tolerance) {
                converged = true;
                break;
            }
        }

        let message = if converged {
            MSG_CONVERGED
        } else {
            MSG_MAX_ITERATIONS
        };
        info!(generations, evaluations, "{}", message);

        Ok(SolverOutcome {
            x: self.bounds.scale(population.best_member()),
            energy: population.best_energy(),
            generations,
            evaluations,
            converged,
            message: message.to_string(),
        })
    }

    fn initial_members(&self, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let size = self.population_len();
        let dimension = self.bounds.dimension();
        match self.config.init {
            InitStrategy::Random => (0..size)
                .map(|_| (0..dimension).map(|_| rng.r#gen::<f64>()).collect())
                .collect(),
            InitStrategy::LatinHypercube => {
                let segment = 1.0 / size as f64;
                let mut members = vec![vec![0.0; dimension]; size];
                let mut order: Vec<usize> = (0..size).collect();
                for axis in 0..dimension {
                    order.shuffle(rng);
                    for (stratum, &member) in order.iter().enumerate() {
                        members[member][axis] =
                            segment * (stratum as f64 + rng.r#gen::<f64>());
                    }
                }
                members
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all<F>(&self, objective: &F, members: &[Vec<f64>], serial: bool) -> Vec<f64>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        if serial {
            members
                .iter()
                .map(|m| objective(&self.bounds.scale(m)))
                .collect()
        } else {
            members
                .par_iter()
                .map(|m| objective(&self.bounds.scale(m)))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all<F>(&self, objective: &F, members: &[Vec<f64>], _serial: bool) -> Vec<f64>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        members
            .iter()
            .map(|m| objective(&self.bounds.scale(m)))
            .collect()
    }

    /// Builds the trial vector for `target` from the current population.
    fn trial(
        &self,
        population: &Population,
        target: usize,
        scale: f64,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let size = population.members.len();
        let dimension = self.bounds.dimension();

        let picks = rand::seq::index::sample(rng, size - 1, 2);
        let shift = |i: usize| if i >= target { i + 1 } else { i };
        let r0 = &population.members[shift(picks.index(0))];
        let r1 = &population.members[shift(picks.index(1))];
        let best = population.best_member();

        let mut trial = population.members[target].clone();
        let fill_point = rng.gen_range(0..dimension);
        for axis in 0..dimension {
            if axis == fill_point || rng.r#gen::<f64>() < self.config.recombination {
                trial[axis] = best[axis] + scale * (r0[axis] - r1[axis]);
            }
        }
        for value in trial.iter_mut() {
            if !(0.0..=1.0).contains(value) {
                *value = rng.r#gen::<f64>();
            }
        }
        trial
    }

    fn evolve_immediate<F>(
        &self,
        objective: &F,
        population: &mut Population,
        scale: f64,
        rng: &mut StdRng,
    ) -> usize
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let size = population.members.len();
        for target in 0..size {
            let trial = self.trial(population, target, scale, rng);
            let energy = objective(&self.bounds.scale(&trial));
            trace!(target, energy, "Trial evaluated.");
            if energy <= population.energies[target] {
                population.members[target] = trial;
                population.energies[target] = energy;
                if energy < population.best_energy() {
                    population.best = target;
                }
            }
        }
        size
    }

    fn evolve_deferred<F>(
        &self,
        objective: &F,
        population: &mut Population,
        scale: f64,
        rng: &mut StdRng,
    ) -> usize
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let size = population.members.len();
        let trials: Vec<Vec<f64>> = (0..size)
            .map(|target| self.trial(population, target, scale, rng))
            .collect();
        let energies = self.evaluate_all(objective, &trials, false);

        for (target, (trial, energy)) in trials.into_iter().zip(energies).enumerate() {
            if energy <= population.energies[target] {
                population.members[target] = trial;
                population.energies[target] = energy;
            }
        }
        population.refresh_best();
        size
    }
}
