//! CLI command definitions and argument parsing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gitup_updater::{
    recognized_headers, ErrorLog, ExtensionInventory, ExtensionKind, ExtensionRecord,
    FileInventory, GitHubTagClient, JsonFileStore, UpdateChecker,
};
use tracing::debug;

use crate::config::{CliOverrides, Config};
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// gitup - update checks for plugins and themes hosted on GitHub
#[derive(Parser, Debug)]
#[command(name = "gitup")]
#[command(version, about = "Update checks for plugins and themes hosted on GitHub")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format, overrides `[output] format` (default: table)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides `[github] api_base`
    #[arg(long, env = "GITUP_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// API token, overrides `[github] token`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an inventory for newer tagged versions
    Check(CheckArgs),
    /// Show recent failed checks
    Log,
    /// List the repository headers recognized in extension metadata
    Headers,
    /// Write a commented configuration file
    Init(InitArgs),
}

/// Which inventory sections to check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Plugins,
    Themes,
    #[default]
    All,
}

impl KindFilter {
    pub fn kinds(self) -> &'static [ExtensionKind] {
        match self {
            KindFilter::Plugins => &[ExtensionKind::Plugin],
            KindFilter::Themes => &[ExtensionKind::Theme],
            KindFilter::All => &[ExtensionKind::Plugin, ExtensionKind::Theme],
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Inventory file (TOML, or JSON with a .json extension)
    #[arg(long)]
    pub inventory: PathBuf,

    /// Inventory sections to check
    #[arg(long, value_enum, default_value_t = KindFilter::All)]
    pub kind: KindFilter,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Config values set by flags; unset flags leave the file's values alone.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_format: self.output.map(|format| format.to_string()),
            verbose: self.verbose.then_some(true),
            debug: self.debug.then_some(true),
            api_base: self.api_base.clone(),
            token: self.token.clone(),
        }
    }

    /// Execute the CLI command with a pre-loaded configuration
    ///
    /// Output settings come from `config`; `--output` and `--verbose` must
    /// already be applied to it as overrides.
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let formatter = OutputFormatter::new(config.output_format()?, config.output.verbose);

        match self.command {
            Commands::Check(args) => args.execute(&config, &formatter).await,
            Commands::Log => show_log(&config, &formatter),
            Commands::Headers => {
                print_nonempty(&formatter.format_headers(&recognized_headers(Vec::new())));
                Ok(ExitCode::Success)
            }
            Commands::Init(args) => {
                let path = match self.config.or_else(Config::default_path) {
                    Some(path) => path,
                    None => {
                        report_error(
                            &formatter,
                            "No config directory available; pass --config",
                            ExitCode::InvalidInput,
                        );
                        return Ok(ExitCode::InvalidInput);
                    }
                };
                args.execute(&path, &formatter)
            }
        }
    }
}

impl InitArgs {
    fn execute(&self, path: &Path, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        if path.exists() && !self.force {
            report_error(
                formatter,
                &format!("{} already exists; use --force to overwrite", path.display()),
                ExitCode::InvalidInput,
            );
            return Ok(ExitCode::InvalidInput);
        }

        Config::write_sample(path)?;
        print_nonempty(&formatter.format_written(path));
        Ok(ExitCode::Success)
    }
}

impl CheckArgs {
    async fn execute(&self, config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        let extensions = match load_extensions(&self.inventory, self.kind) {
            Ok(extensions) => extensions,
            Err(e) => {
                report_error(formatter, &e.to_string(), ExitCode::InvalidInput);
                return Ok(ExitCode::InvalidInput);
            }
        };
        formatter.progress(&format!(
            "Loaded {} extensions from {}",
            extensions.len(),
            self.inventory.display()
        ));

        let checker = build_checker(config)?;
        let decisions = checker.run(&extensions).await;
        debug!("Check finished with {} updates", decisions.len());

        print_nonempty(&formatter.format_decisions(&decisions));
        Ok(ExitCode::Success)
    }
}

/// Extensions of the selected kinds, in inventory order.
pub fn load_extensions(path: &Path, filter: KindFilter) -> anyhow::Result<Vec<ExtensionRecord>> {
    let inventory = FileInventory::load(path)?;
    let mut extensions = Vec::new();
    for kind in filter.kinds() {
        extensions.extend(inventory.extensions(*kind)?);
    }
    Ok(extensions)
}

fn open_error_log(config: &Config) -> anyhow::Result<ErrorLog> {
    let store = JsonFileStore::new(config.state_path()?);
    debug!("Using option store at {}", store.path().display());
    Ok(ErrorLog::with_capacity(
        Arc::new(store),
        config.updater.log.capacity,
    ))
}

fn build_checker(config: &Config) -> anyhow::Result<UpdateChecker> {
    let client = GitHubTagClient::new(config.updater.github.clone(), &config.updater.network)?;
    Ok(UpdateChecker::new(Arc::new(client), open_error_log(config)?))
}

fn show_log(config: &Config, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
    let entries = open_error_log(config)?.load()?;
    print_nonempty(&formatter.format_log(&entries));
    Ok(ExitCode::Success)
}

/// Print an error on the stream the output format expects.
pub fn report_error(formatter: &OutputFormatter, message: &str, code: ExitCode) {
    let output = formatter.format_error_with_code(message, code);
    match formatter.format() {
        OutputFormat::Json => println!("{output}"),
        OutputFormat::Table => eprintln!("{output}"),
        OutputFormat::Quiet => {}
    }
}

fn print_nonempty(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}
