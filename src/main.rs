use std::fmt::{Debug, Display};

use studio::campaign_delivery_worker::run_worker_until_stopped;
use studio::configuration::get_configuration;
use studio::startup::Application;
use studio::telemetry::{get_subscriber, init_subscriber};
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("studio".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration()?;
    let application = Application::build(config.clone()).await?;
    let app = tokio::spawn(application.run_until_stopped());
    let worker = tokio::spawn(run_worker_until_stopped(config));

    tokio::select! {
        outcome = app => report_exit("API", outcome),
        outcome = worker => report_exit("Campaign delivery worker", outcome),
    }

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete",
                task_name
            )
        }
    }
}
