//! tfpublish - Terraform provider publisher CLI

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tfpublish_cli::cmd;
use tfpublish_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "info,tfpublish_core=debug,tfpublish_cli=debug"
        } else {
            "info"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Publish(args) => cmd::publish::publish(&args).await,
        Commands::Inspect(args) => cmd::inspect::inspect(&args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            eprintln!("Error: {message}");
            if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
                println!("::error::{}", escape_workflow_data(&message));
            }
            ExitCode::FAILURE
        }
    }
}

/// Escape a message for a GitHub Actions workflow command.
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
