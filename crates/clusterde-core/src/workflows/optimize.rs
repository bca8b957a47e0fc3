use crate::core::io::traits::StructureFile;
use crate::core::io::xyz::{XyzFile, XyzFrame};
use crate::core::models::cluster::Cluster;
use crate::core::programs::runner::ProgramRunner;
use crate::engine::config::OptimizationConfig;
use crate::engine::error::EngineError;
use crate::engine::objective::{EnergyCalculator, EvaluationError, EvaluationSummary};
use crate::engine::polish::polish;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::{DifferentialEvolution, GenerationReport};
use nalgebra::Point3;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub energy: f64,
    /// Flat `[x1, y1, z1, ...]` coordinates of the best geometry, in Angstroms.
    pub coordinates: Vec<f64>,
    pub symbols: Vec<String>,
    pub positions: Vec<Point3<f64>>,
    /// Termination message of the global search.
    pub message: String,
    pub converged: bool,
    pub generations: usize,
    /// Objective evaluations across global search and polishing.
    pub evaluations: usize,
    pub polished: bool,
    pub evaluation_summary: EvaluationSummary,
}

#[derive(Debug, Serialize)]
struct HistoryRecord {
    generation: usize,
    best_energy: f64,
    convergence: f64,
    evaluations: usize,
}

/// Finds the lowest-energy geometry of `cluster` and records it on disk.
///
/// The best candidate of every generation is appended to the trajectory file,
/// and the final geometry is written to the final-structure file. Both files are
/// replaced if they already exist.
#[instrument(skip_all, name = "optimization_workflow", fields(cluster = %cluster.formula_label()))]
pub fn run<R: ProgramRunner>(
    cluster: &Cluster,
    config: &OptimizationConfig,
    runner: R,
    reporter: &ProgressReporter,
) -> Result<OptimizationResult, EngineError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let bounds = cluster.search_bounds()?;
    info!(
        atoms = cluster.len(),
        half_edge = bounds.upper().first().copied().unwrap_or_default(),
        "Search box derived from atomic radii."
    );

    let calculator = EnergyCalculator::new(
        cluster.clone(),
        config.program.clone(),
        config.output.scratch_dir.clone(),
        runner,
    );
    let executable = calculator.locate_executable().map_err(|e| match e {
        EvaluationError::ExecutableNotFound { name } => EngineError::ExecutableNotFound { name },
        other => EngineError::Internal(other.to_string()),
    })?;
    info!(executable = %executable.display(), software = %config.program.software, "Using external program.");

    fs::create_dir_all(&config.output.scratch_dir).map_err(|source| EngineError::Io {
        path: config.output.scratch_dir.clone(),
        source,
    })?;
    remove_stale(&config.output.trajectory_path)?;
    remove_stale(&config.output.final_structure_path)?;
    let mut history = match &config.output.history_path {
        Some(path) => Some(csv::Writer::from_path(path).map_err(|source| EngineError::History {
            path: path.clone(),
            source,
        })?),
        None => None,
    };
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Global search ===
    reporter.report(Progress::PhaseStart {
        name: "Global Search",
    });
    let solver = DifferentialEvolution::new(&bounds, &config.solver)?;
    reporter.report(Progress::TaskStart {
        total_steps: config.solver.max_iterations as u64,
    });

    let outcome = solver.minimize(
        |x| calculator.fitness(x),
        |report| {
            record_generation(cluster, config, report, history.as_mut())?;
            reporter.report(Progress::StatusUpdate {
                text: format!(
                    "Gen {} | E = {:.8} | Convergence = {:.3e}",
                    report.generation, report.best_energy, report.convergence
                ),
            });
            reporter.report(Progress::TaskIncrement);
            Ok(())
        },
    )?;

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::Message(outcome.message.clone()));
    reporter.report(Progress::PhaseFinish);

    let mut coordinates = outcome.x;
    let mut energy = outcome.energy;
    let mut evaluations = outcome.evaluations;
    let mut polished = false;

    // === Phase 2: Polish (optional) ===
    if let Some(polish_config) = &config.polish {
        reporter.report(Progress::PhaseStart { name: "Polish" });
        let refined = polish(
            |x| calculator.fitness(x),
            &bounds,
            &coordinates,
            energy,
            polish_config,
        )?;
        evaluations += refined.evaluations;
        if refined.improved {
            info!(
                before = energy,
                after = refined.energy,
                "Polishing lowered the energy."
            );
            coordinates = refined.x;
            energy = refined.energy;
            polished = true;
        } else {
            info!("Polishing found no lower energy; keeping the global-search optimum.");
        }
        reporter.report(Progress::PhaseFinish);
    }

    // === Phase 3: Final structure ===
    let positions = cluster.positions(&coordinates)?;
    let frame = XyzFrame::new(
        format!("Energy: {}", energy),
        cluster.symbols().to_vec(),
        positions.clone(),
    );
    let final_path = &config.output.final_structure_path;
    XyzFile::write_to_path(&frame, final_path).map_err(|source| EngineError::Trajectory {
        path: final_path.clone(),
        source,
    })?;

    let evaluation_summary = calculator.summary();
    if evaluation_summary.failures() > 0 {
        warn!(
            failures = evaluation_summary.failures(),
            evaluations = evaluation_summary.evaluations,
            "Some energy evaluations failed and were scored with the failure penalty."
        );
    }
    info!(energy, evaluations, "Optimization workflow complete.");

    Ok(OptimizationResult {
        energy,
        coordinates,
        symbols: cluster.symbols().to_vec(),
        positions,
        message: outcome.message,
        converged: outcome.converged,
        generations: outcome.generations,
        evaluations,
        polished,
        evaluation_summary,
    })
}

fn record_generation(
    cluster: &Cluster,
    config: &OptimizationConfig,
    report: &GenerationReport<'_>,
    history: Option<&mut csv::Writer<File>>,
) -> Result<(), EngineError> {
    let frame = XyzFrame::new(
        format!("Convergence: {}", report.convergence),
        cluster.symbols().to_vec(),
        cluster.positions(report.best)?,
    );
    let trajectory = &config.output.trajectory_path;
    XyzFile::append_to_path(&frame, trajectory).map_err(|source| EngineError::Trajectory {
        path: trajectory.clone(),
        source,
    })?;

    if let (Some(writer), Some(path)) = (history, &config.output.history_path) {
        let to_history_error = |source: csv::Error| EngineError::History {
            path: path.clone(),
            source,
        };
        writer
            .serialize(HistoryRecord {
                generation: report.generation,
                best_energy: report.best_energy,
                convergence: report.convergence,
                evaluations: report.evaluations,
            })
            .map_err(to_history_error)?;
        writer
            .flush()
            .map_err(|e| to_history_error(csv::Error::from(e)))?;
    }
    Ok(())
}

fn remove_stale(path: &Path) -> Result<(), EngineError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(EngineError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::programs::parser::FAILURE_PENALTY;
    use crate::core::programs::runner::RunStatus;
    use crate::core::programs::Software;
    use crate::engine::config::{
        OptimizationConfigBuilder, OutputConfig, PolishConfig, SolverConfig,
    };
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Reads the ORCA deck it is given and reports `-1 + sum(x^2)` as the energy.
    struct QuadraticOrca;

    impl ProgramRunner for QuadraticOrca {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            Some(PathBuf::from(name))
        }

        fn run(&self, _: &Path, input: &Path, log: &Path, _: &Path) -> io::Result<RunStatus> {
            let deck = fs::read_to_string(input)?;
            let sum: f64 = deck
                .lines()
                .skip_while(|line| !line.starts_with("* xyz"))
                .skip(1)
                .take_while(|line| line.trim() != "*")
                .flat_map(|line| line.split_whitespace().skip(1))
                .map(|v| v.parse::<f64>().unwrap().powi(2))
                .sum();
            fs::write(log, format!("FINAL SINGLE POINT ENERGY   {:.10}\n", sum - 1.0))?;
            Ok(RunStatus::from_code(0))
        }
    }

    struct CrashingProgram;

    impl ProgramRunner for CrashingProgram {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            Some(PathBuf::from(name))
        }

        fn run(&self, _: &Path, _: &Path, log: &Path, _: &Path) -> io::Result<RunStatus> {
            fs::write(log, "segmentation fault\n")?;
            Ok(RunStatus::from_code(139))
        }
    }

    struct MissingProgram;

    impl ProgramRunner for MissingProgram {
        fn locate(&self, _: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, _: &Path, _: &Path, _: &Path, _: &Path) -> io::Result<RunStatus> {
            panic!("nothing should run without an executable");
        }
    }

    fn config_in(dir: &Path, history: bool) -> OptimizationConfig {
        OptimizationConfigBuilder::new()
            .software(Software::Orca)
            .keywords("! hf-3c")
            .solver_config(SolverConfig {
                max_iterations: 4,
                population_size: 2,
                seed: Some(17),
                ..Default::default()
            })
            .polish_config(Some(PolishConfig {
                max_iterations: 2,
                ..Default::default()
            }))
            .output_config(OutputConfig {
                trajectory_path: dir.join("best_trj.xyz"),
                final_structure_path: dir.join("best.xyz"),
                history_path: history.then(|| dir.join("history.csv")),
                scratch_dir: dir.join("scratch"),
            })
            .build()
            .unwrap()
    }

    fn dimer() -> Cluster {
        Cluster::new(&["H", "H"], 0, 1).unwrap()
    }

    #[test]
    fn run_records_trajectory_history_and_final_structure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), true);
        fs::write(&config.output.trajectory_path, "stale content\n").unwrap();

        let result = run(&dimer(), &config, QuadraticOrca, &ProgressReporter::new()).unwrap();

        let trajectory = XyzFile::read_from_path(&config.output.trajectory_path).unwrap();
        assert_eq!(trajectory.len(), result.generations);
        assert!(trajectory
            .iter()
            .all(|frame| frame.comment.starts_with("Convergence: ") && frame.len() == 2));

        let final_frames = XyzFile::read_from_path(&config.output.final_structure_path).unwrap();
        assert_eq!(final_frames.len(), 1);
        assert_eq!(final_frames[0].comment, format!("Energy: {}", result.energy));
        assert_eq!(final_frames[0].symbols, vec!["H", "H"]);

        let history = fs::read_to_string(config.output.history_path.as_ref().unwrap()).unwrap();
        let mut lines = history.lines();
        assert_eq!(
            lines.next(),
            Some("generation,best_energy,convergence,evaluations")
        );
        assert_eq!(lines.count(), result.generations);

        assert!(result.energy < 0.0);
        assert_eq!(result.coordinates.len(), 6);
        assert_eq!(result.evaluation_summary.failures(), 0);
        assert_eq!(result.evaluation_summary.evaluations, result.evaluations);
        assert_eq!(fs::read_dir(&config.output.scratch_dir).unwrap().count(), 0);
    }

    #[test]
    fn run_reports_phases_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), false);
        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::PhaseStart { name } = event {
                sink.lock().unwrap().push(name);
            }
        }));

        run(&dimer(), &config, QuadraticOrca, &reporter).unwrap();

        assert_eq!(
            *phases.lock().unwrap(),
            vec!["Preparation", "Global Search", "Polish"]
        );
    }

    #[test]
    fn run_without_executable_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), false);

        let result = run(&dimer(), &config, MissingProgram, &ProgressReporter::new());

        assert!(matches!(
            result,
            Err(EngineError::ExecutableNotFound { ref name }) if name == "orca"
        ));
        assert!(!config.output.trajectory_path.exists());
        assert!(!config.output.final_structure_path.exists());
    }

    #[test]
    fn failing_program_scores_every_geometry_with_the_penalty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), false);
        config.polish = None;

        let result = run(&dimer(), &config, CrashingProgram, &ProgressReporter::new()).unwrap();

        assert_eq!(result.energy, FAILURE_PENALTY);
        assert!(!result.polished);
        assert_eq!(
            result.evaluation_summary.non_zero_exit,
            result.evaluation_summary.evaluations
        );
    }
}
