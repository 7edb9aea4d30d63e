//! infra-mgr CLI
//!
//! Usage:
//!   infra-mgr setup [--config FILE] [--no-prompts] [--output-dir DIR]
//!   infra-mgr start [--watch] [--interval SECS] [--timeout SECS] [--sequential]
//!   infra-mgr stop  [--watch] [--interval SECS] [--timeout SECS] [--sequential]
//!   infra-mgr output NAME

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use infra_mgr::config::DEFAULT_CONFIG_FILE;
use infra_mgr::generate::write_configuration;
use infra_mgr::lifecycle::toggle_all;
use infra_mgr::{
    discover_targets, Action, AwsCli, Error, Mode, PollConfig, Settings, SystemRunner, Terraform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    /// Write backend.tf and locals.tf
    Setup,
    /// Start the database cluster and notebook instance
    Start,
    /// Stop the database cluster and notebook instance
    Stop,
    /// Print a Terraform output as JSON
    Output,
}

#[derive(Parser)]
#[command(name = "infra-mgr")]
#[command(about = "Generate Terraform configuration and toggle managed resources")]
struct Cli {
    /// Action to perform
    #[arg(value_enum)]
    action: Command,

    /// Output name for the `output` action
    #[arg(required_if_eq("action", "output"))]
    name: Option<String>,

    /// Settings file (YAML, or TOML with a .toml extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Use configuration file or default values without prompting
    #[arg(long)]
    no_prompts: bool,

    /// Show statuses until start or stop completes
    #[arg(short, long)]
    watch: bool,

    /// Seconds between status polls
    #[arg(long, default_value_t = 3)]
    interval: u64,

    /// Stop watching after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Toggle resources one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Directory for generated files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Terraform executable
    #[arg(long, default_value = "terraform")]
    terraform: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    match cli.action {
        Command::Setup => setup(cli),
        Command::Start => toggle(cli, Action::Start),
        Command::Stop => toggle(cli, Action::Stop),
        Command::Output => match &cli.name {
            Some(name) => output(cli, name),
            None => Cli::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "the output action requires a NAME",
                )
                .exit(),
        },
    }
}

fn output(cli: &Cli, name: &str) -> Result<(), Error> {
    let terraform = Terraform::new(SystemRunner::new()).with_binary(&cli.terraform);
    match terraform.output(name) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(Error::MissingOutput {
            name: name.to_string(),
        }),
    }
}

fn setup(cli: &Cli) -> Result<(), Error> {
    let mut settings = Settings::load(&cli.config)?;

    if !cli.no_prompts {
        let stdin = io::stdin();
        settings.prompt(&mut stdin.lock(), &mut io::stdout())?;
    }

    let resolved = settings.resolve()?;
    write_configuration(&resolved, &cli.output_dir)?;
    Ok(())
}

fn toggle(cli: &Cli, action: Action) -> Result<(), Error> {
    let settings = Settings::load(&cli.config)?;

    let terraform = Terraform::new(SystemRunner::new()).with_binary(&cli.terraform);
    let targets = discover_targets(&terraform);

    let mut aws = AwsCli::new(SystemRunner::new());
    if let Some(profile) = &settings.aws_profile {
        aws = aws.with_profile(profile);
    }
    if let Some(region) = &settings.aws_region {
        aws = aws.with_region(region);
    }

    let mut poll = PollConfig::new()
        .with_watch(cli.watch)
        .with_interval(Duration::from_secs(cli.interval));
    if let Some(timeout) = cli.timeout {
        poll = poll.with_timeout(Duration::from_secs(timeout));
    }
    let mode = if cli.sequential {
        Mode::Sequential
    } else {
        Mode::Concurrent
    };

    // Per-resource failures are logged by toggle_all and do not fail the command
    toggle_all(&aws, &targets, action, &poll, mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_requires_name() {
        let err = Cli::try_parse_from(["infra-mgr", "output"])
            .err()
            .expect("Should reject a missing NAME");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["infra-mgr", "output", "sgmkr_name"]).unwrap();
        assert_eq!(cli.action, Command::Output);
        assert_eq!(cli.name.as_deref(), Some("sgmkr_name"));
    }

    #[test]
    fn test_toggle_actions_take_no_name() {
        let cli = Cli::try_parse_from(["infra-mgr", "stop", "--watch"]).unwrap();
        assert_eq!(cli.action, Command::Stop);
        assert!(cli.watch);
        assert_eq!(cli.name, None);
    }
}
