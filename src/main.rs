use clap::Parser;
use tracing_subscriber::EnvFilter;

use medsafe_cli::cli::{Cli, Commands};
use medsafe_cli::error::MedSafeError;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { sequential, turn } => {
            let result = match turn.pipeline() {
                Ok(pipeline) => medsafe_cli::cli::chat::run_stdio(pipeline, sequential).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => std::process::ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::ExitCode::from(1)
                }
            }
        }
        _ => match medsafe_cli::cli::run(cli).await {
            Ok(output) => {
                println!("{output}");
                std::process::ExitCode::SUCCESS
            }
            Err(err) => {
                if let Some(med_err) = err.downcast_ref::<MedSafeError>() {
                    eprintln!("Error: {med_err}");
                } else {
                    eprintln!("Error: {err}");
                }
                std::process::ExitCode::from(1)
            }
        },
    }
}
