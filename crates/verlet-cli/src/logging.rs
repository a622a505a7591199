use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: compact output on stderr, plus an uncolored file copy with
/// thread ids when `log_file` is given.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer);

    let installed = if let Some(path) = log_file {
        let file = File::create(&path).map_err(CliError::Io)?;

        let file_layer = fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true);

        subscriber.with(file_layer).try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, error, info, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn initialization_and_macros_work() {
        ensure_global_logger_is_set();

        error!("This is an error");
        warn!("This is a warning");
        info!("This is info");
        debug!("This is debug");
        trace!("This is trace");
    }

    #[test]
    #[serial]
    fn neighbor_list_build_logs_reach_a_file_layer() {
        use verletpp::core::crystal::UnitCell;
        use verletpp::engine::config::NeighborListConfig;
        use verletpp::engine::lists::VerletLists;
        use verletpp::engine::neighbor_list::NeighborList;

        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("build.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_thread_ids(true);
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::INFO)
            .with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            let crystal = Arc::new(UnitCell::cubic(30.0).unwrap());
            let mut builder =
                NeighborList::new(None, crystal, 2, NeighborListConfig::new(7.0, 1.0)).unwrap();
            let mut lists = VerletLists::new();
            builder
                .build_list(&[vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]], &mut lists, true, true)
                .unwrap();
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Neighbor list builder"));
        assert!(content.contains("Assignment to cells"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
