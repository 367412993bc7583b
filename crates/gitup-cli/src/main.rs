//! gitup CLI entry point

use clap::Parser;
use gitup_cli::cli::{report_error, Commands};
use gitup_cli::{Cli, Config, ExitCode, OutputFormatter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let creates_config = matches!(cli.command, Commands::Init(_));

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        // An explicitly named config file must be usable, unless `init` is
        // about to write it.
        Err(e) if cli.config.is_some() && !creates_config => {
            let formatter = OutputFormatter::new(cli.output.unwrap_or_default(), cli.verbose);
            report_error(&formatter, &format!("Config error: {e}"), ExitCode::InvalidInput);
            return ExitCode::InvalidInput.to_exit_code();
        }
        Err(e) => {
            if !creates_config {
                eprintln!("Warning: Config error: {e}");
                eprintln!("Using default configuration.");
            }
            Config::default()
        }
    };

    let config = config.with_overrides(&cli.overrides());
    if let Err(e) = config.validate() {
        let format = cli.output.or_else(|| config.output_format().ok()).unwrap_or_default();
        let formatter = OutputFormatter::new(format, cli.verbose);
        report_error(&formatter, &e.to_string(), ExitCode::InvalidInput);
        return ExitCode::InvalidInput.to_exit_code();
    }

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&config.updater.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.execute_with_config(config).await {
        Ok(code) => code.to_exit_code(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError.to_exit_code()
        }
    }
}

