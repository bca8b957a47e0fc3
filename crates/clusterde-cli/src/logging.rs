use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing::Subscriber;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*, registry::LookupSpan};

/// Console level: warnings by default, one step more per `-v`, nothing with `-q`.
pub fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The log file keeps at least the per-generation summaries, whatever the console shows.
pub fn file_level(console: LevelFilter) -> LevelFilter {
    console.max(LevelFilter::INFO)
}

fn file_layer<S>(file: File, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(level)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let console = console_level(verbosity, quiet);
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console);

    let file_output = match log_file {
        Some(path) => Some(file_layer(File::create(path)?, file_level(console))),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_output)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info, warn};

    static INIT: Once = Once::new();

    #[test]
    fn verbosity_flags_map_to_console_levels() {
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(1, false), LevelFilter::INFO);
        assert_eq!(console_level(2, false), LevelFilter::DEBUG);
        assert_eq!(console_level(7, false), LevelFilter::TRACE);
        assert_eq!(console_level(2, true), LevelFilter::OFF);
    }

    #[test]
    fn file_level_never_drops_below_info() {
        assert_eq!(file_level(LevelFilter::OFF), LevelFilter::INFO);
        assert_eq!(file_level(LevelFilter::WARN), LevelFilter::INFO);
        assert_eq!(file_level(LevelFilter::DEBUG), LevelFilter::DEBUG);
        assert_eq!(file_level(LevelFilter::TRACE), LevelFilter::TRACE);
    }

    #[test]
    #[serial]
    fn global_logger_installs_once() {
        INIT.call_once(|| {
            setup_logging(3, false, None).unwrap();
        });
        warn!(generation = 3, "Energy evaluation failed");
        assert!(matches!(
            setup_logging(0, false, None),
            Err(CliError::Other(_))
        ));
    }

    #[test]
    #[serial]
    fn quiet_console_still_records_generations_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let file = File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(file_layer(file, file_level(console_level(0, true))));

        tracing::subscriber::with_default(subscriber, || {
            info!(generation = 4, best_energy = -40.5, "Generation complete.");
            debug!("Energy evaluation succeeded.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Generation complete."));
        assert!(content.contains("best_energy=-40.5"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains("Energy evaluation succeeded."));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir = Path::new("/");
        if cfg!(unix) && dir.is_dir() {
            let result = setup_logging(0, false, Some(dir));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
