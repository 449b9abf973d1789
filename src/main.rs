use clap::{CommandFactory, Parser};
use sound_db::cli::{args::Args, commands};
use sound_db::SoundDbError;
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and exit
    if args.command.is_none() {
        if let Err(e) = Args::command().print_help() {
            eprintln!("Failed to print help: {}", e);
        }
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Commands are synchronous; run them off the async executor so the
        // signal handler stays responsive
        let worker = {
            let cancellation_token = cancellation_token.clone();
            tokio::task::spawn_blocking(move || commands::run(args, cancellation_token))
        };

        tokio::select! {
            joined = worker => {
                joined.unwrap_or_else(|e| Err(anyhow::anyhow!("Command task failed: {}", e)))
            }
            signal = tokio::signal::ctrl_c() => {
                cancellation_token.cancel();
                match signal {
                    Ok(()) => {
                        eprintln!("\nReceived CTRL+C, stopping...");
                        Err(anyhow::Error::from(SoundDbError::Interrupted {
                            reason: "interrupted by user".to_string(),
                        }))
                    }
                    Err(e) => Err(anyhow::anyhow!("Failed to listen for CTRL+C: {}", e)),
                }
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
