use crate::demo::{run_automation_pass, run_demo, AutomationRunArgs, DemoArgs};
use crate::server;
use agri_claims::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Agri Claims Orchestrator",
    about = "Run the weather-triggered claims automation service from the command line",
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
    /// Run claim automation against seeded or imported weather data
    Automation {
        #[command(subcommand)]
        command: AutomationCommand,
    },
    /// Run an end-to-end CLI demo covering ingestion, triggering, and review
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum AutomationCommand {
    /// Execute one evaluation pass and print the run report
    Run(AutomationRunArgs),
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
        Command::Automation {
            command: AutomationCommand::Run(args),
        } => run_automation_pass(args),
        Command::Demo(args) => run_demo(args),
    }
}
