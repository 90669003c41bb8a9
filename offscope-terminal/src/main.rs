/// Offscope Terminal Viewer
///
/// Shows an OFF mesh (or a built-in cube) with smooth vertex normals, rendered
/// as ASCII art. Run with `--help` for the controls.
use std::env;
use std::io;
use std::process::ExitCode;

use offscope_core::Mesh;
use offscope_terminal::{
    config::USAGE, init_logging, ConfigError, LoggingConfig, TerminalApp, ViewerConfig,
};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let config = match ViewerConfig::from_args(args) {
        Ok(config) => config,
        Err(err @ ConfigError::Usage(_)) => {
            eprintln!("{}\n\n{}", err, USAGE);
            return ExitCode::from(2);
        }
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let logging = LoggingConfig {
        filter: config.log_filter.clone(),
        log_file: config.log_file.clone(),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("cannot open log file: {}", err);
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("viewer stopped: {}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ViewerConfig) -> io::Result<()> {
    let mut mesh = match &config.mesh {
        Some(path) => match Mesh::from_off_file(path) {
            Ok(mesh) => mesh,
            Err(err) => {
                log::error!("{}; showing the built-in cube instead", err);
                eprintln!("{}; showing the built-in cube instead", err);
                Mesh::cube(2.0)
            }
        },
        None => Mesh::cube(2.0),
    };
    if mesh.weight_mode() != config.normals {
        mesh.recompute_normals(config.normals);
    }

    let mut app = TerminalApp::new(mesh, config)?;
    app.run()
}
