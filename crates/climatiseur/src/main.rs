use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use climatiseur::config::Config;
use climatiseur::format_diagnostics;
use climatiseur::logging;
use climatiseur::logging::Destination;
use climatiseur::notify::SmtpMailer;
use climatiseur::scan;
use climatiseur::telemetry::InfluxClient;

/// Nag about doors and windows that fight the thermostat
#[derive(Parser, Debug)]
#[command(name = "climatiseur", version)]
struct Cli {
    /// Append log output to the log file (default)
    #[arg(long, overrides_with = "no_log")]
    log: bool,

    /// Log to standard error instead of the log file
    #[arg(long, overrides_with = "log")]
    no_log: bool,

    /// Log at debug level or more verbose
    #[arg(short, long)]
    verbose: bool,

    /// Config file (default: ~/.credentials/climatiseur.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run one evaluation cycle
    Scan {
        /// Log the alert but do not send mail
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Scan { dry_run: false }
    }
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Scan { dry_run } => {
            let telemetry = InfluxClient::new(&config.telemetry)?;
            let mailer = SmtpMailer::new(&config.mail)?;
            scan::run(config, &telemetry, &mailer, dry_run).await;
        }
    }
    Ok(())
}

// Single-threaded so the scoped subscriber covers every await point.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let (config, warnings) = match Config::from_file(&config_path) {
        Ok(loaded) => loaded,
        Err(diagnostics) => {
            eprint!("{}", format_diagnostics(&diagnostics.0));
            return;
        }
    };
    if !warnings.is_empty() {
        eprint!("{}", format_diagnostics(&warnings.0));
    }

    let destination = if cli.no_log && !cli.log {
        Destination::Stderr
    } else {
        Destination::File(config.log_file())
    };
    let _guard = logging::init(&config.logging, cli.verbose, &destination)
        .or_else(|e| {
            eprintln!("{:#}; logging to stderr", e);
            logging::init(&config.logging, cli.verbose, &Destination::Stderr)
        })
        .ok();

    tracing::info!("climatiseur starting");
    tracing::info!("Loaded config from: {}", config_path.display());

    if let Err(e) = run(cli.command.unwrap_or_default(), &config).await {
        tracing::error!("{:#}", e);
    }
}
