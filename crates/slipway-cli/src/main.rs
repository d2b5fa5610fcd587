mod commands;

use clap::Parser;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_REMOTE_ERROR};
use slipway_core::runner::DEFAULT_TOOL;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "slipway",
    version,
    about = "Compose per-environment function configuration, run the deploy tool, and reconcile event sources"
)]
struct Cli {
    /// One of local, development, qa, production, run-local, or build-<development|qa|production>.
    run_type: String,

    /// Project root holding config.yaml and the config/ directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// External program used to deploy, build, or invoke the function.
    #[arg(long, default_value = DEFAULT_TOOL)]
    tool: String,

    /// Leave run_config.yaml in place after the run.
    #[arg(long, default_value_t = false)]
    keep_config: bool,

    /// Output the run report as structured JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false)]
    trace: bool,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = commands::run::run(
        &cli.root,
        &cli.run_type,
        &cli.tool,
        cli.keep_config,
        cli.json,
    );

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("remote error:") {
                EXIT_REMOTE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
