/// Logger setup for the viewer.
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Once;

/// Logger configuration.
///
/// `filter` follows the `env_logger` filter syntax (e.g. "info",
/// "offscope_core=debug,offscope_terminal=info").
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
///
/// The filter comes from the config, then `RUST_LOG`, and defaults to `warn`
/// so the picture is not overwritten by routine messages.
pub fn init_logging(config: &LoggingConfig) -> io::Result<()> {
    let file = match &config.log_file {
        Some(path) => Some(File::options().create(true).append(true).open(path)?),
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        if let Some(file) = file {
            builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .write_style(env_logger::WriteStyle::Never);
        }

        // A logger installed by someone else (e.g. a test harness) wins
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            filter: Some("debug".to_string()),
            log_file: Some(dir.path().join("missing").join("viewer.log")),
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            filter: Some("info".to_string()),
            log_file: Some(dir.path().join("viewer.log")),
        };
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
        assert!(dir.path().join("viewer.log").exists());
    }
}
