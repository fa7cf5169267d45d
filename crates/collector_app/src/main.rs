mod cli;
mod logging;
mod render;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use collector_engine::{BackendClient, Dispatch, JobLifecycleController};
use collector_logging::{collector_error, collector_info, level_from_verbosity};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log, level_from_verbosity(cli.verbose));

    match run(&cli).await {
        Ok(code) => code,
        Err(err) => {
            collector_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::from(render::EXIT_FAILED)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Process { url, language } => {
            let controller = JobLifecycleController::from_settings(&cli.settings(), cli.auth())
                .context("invalid client settings")?;
            let dispatch = match controller.process_url(url, *language) {
                Ok(dispatch) => dispatch,
                Err(err) => {
                    eprintln!("Invalid input: {}", err.message);
                    return Ok(ExitCode::from(render::EXIT_FAILED));
                }
            };
            if dispatch == Dispatch::Ignored {
                bail!("a job is already in flight");
            }

            let view = tokio::select! {
                view = controller.wait_until_settled() => view,
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for ctrl-c")?;
                    collector_info!("Interrupted; cancelling the job");
                    controller.reset();
                    return Ok(ExitCode::from(render::EXIT_INTERRUPTED));
                }
            };
            Ok(render::report(&view))
        }
        Command::Health => {
            let client = BackendClient::new(&cli.settings()).context("invalid client settings")?;
            let status = client.health().await.context("health check failed")?;
            println!("{status}");
            if status == "healthy" {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(render::EXIT_FAILED))
            }
        }
    }
}
