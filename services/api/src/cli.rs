use crate::demo::{run_demo, DemoArgs};
use crate::report::{run_report, run_territory, ReportArgs, TerritoryCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sales_analytics::config::AppConfig;
use sales_analytics::error::AppError;
use sales_analytics::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Sales Analytics",
    about = "Serve and run sales performance analytics over Lead Store exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Full analytics report over a lead export
    Report(ReportArgs),
    /// Territory and country rollups over a lead export and catalog
    Territory {
        #[command(subcommand)]
        command: TerritoryCommand,
    },
    /// Run the engine over a synthetic dataset
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args, offline_config()?.analytics),
        Command::Territory { command } => run_territory(command, offline_config()?.analytics),
        Command::Demo(args) => run_demo(args, offline_config()?.analytics),
    }
}

/// Configuration for one-shot commands; logs go to stderr so stdout stays machine readable.
fn offline_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}
