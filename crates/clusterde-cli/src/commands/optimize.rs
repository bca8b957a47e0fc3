use crate::cli::OptimizeArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use clusterde::{
    core::io::xyz::format_atom_line, core::programs::runner::SubprocessRunner,
    engine::progress::ProgressReporter, workflows,
};
use tracing::{info, warn};

pub fn run(args: OptimizeArgs, quiet: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialConfig::from_file(path)?,
        None => PartialConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let app = partial_config.merge_with_cli(&args)?;
    let cluster = &app.cluster;
    let config = &app.core_config;

    let progress_handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting global optimization of {} ({} atoms) with {}...",
        cluster.formula_label(),
        cluster.len(),
        config.program.software
    );
    info!("Invoking the core optimization workflow...");

    let result = workflows::optimize::run(cluster, config, SubprocessRunner, &reporter)?;

    let summary = result.evaluation_summary;
    if summary.failures() > 0 {
        warn!(
            failures = summary.failures(),
            non_zero_exit = summary.non_zero_exit,
            marker_not_found = summary.marker_not_found,
            malformed_energy = summary.malformed_energy,
            "Energy evaluations failed during the run."
        );
        println!(
            "Warning: {} of {} energy evaluations failed and were penalized.",
            summary.failures(),
            summary.evaluations
        );
    }

    println!("{}", result.message);
    println!("Global Best");
    println!("Energy: {}", result.energy);
    println!("Coordinates");
    for (symbol, position) in result.symbols.iter().zip(&result.positions) {
        println!("{}", format_atom_line(symbol, position));
    }
    println!(
        "✓ Best structure written to: {}",
        config.output.final_structure_path.display()
    );

    Ok(())
}
