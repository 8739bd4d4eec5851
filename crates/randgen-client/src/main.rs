mod config;
mod telemetry;

use clap::Parser;
use config::{ClientConfig, CliArgs, form_from_line};
use randgen_client::{controller::PageController, driver, page::TerminalPage};
use randgen_core::validate::FormData;
use telemetry::init_telemetry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const SUBMISSION_BUFFER: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ClientConfig::try_from(args)?;

    init_telemetry()?;
    tracing::info!(
        "Using {:?} against {}",
        config.transport,
        config.endpoints.generator_url()
    );

    let (tx, rx) = mpsc::channel(SUBMISSION_BUFFER);
    match config.submission {
        Some(form) => {
            // Capacity is left, and dropping `tx` ends input after this one.
            let _ = tx.try_send(form);
        }
        None => {
            tokio::spawn(read_submissions(tx));
        }
    }

    let controller = PageController::new(TerminalPage::stdio(), config.transport);
    let controller = driver::run(controller, config.endpoints, rx).await;
    tracing::info!("Finished in state {:?}", controller.state());
    Ok(())
}

/// Forwards stdin lines as submissions until EOF.
async fn read_submissions(submissions: mpsc::Sender<FormData>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(form) = form_from_line(&line) else {
                    continue;
                };
                if submissions.send(form).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {e}");
                break;
            }
        }
    }
}
