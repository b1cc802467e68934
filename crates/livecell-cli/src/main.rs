//! livecell CLI - drives the live incremental evaluation engine over a
//! watched file, either headlessly (`watch`) or behind an HTTP/WebSocket
//! front end (`serve`).

mod colors;
mod demo;
mod serve;
mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "livecell")]
#[command(about = "Live incremental evaluation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive HTTP/WebSocket server over a watched file
    Serve {
        /// Path to the file to watch
        path: String,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Watch a file and print each cell-status diff to stdout
    Watch {
        /// Path to the file to watch
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { path, port } => serve::execute(&path, port).await?,
        Commands::Watch { path } => watch::execute(&path).await?,
    }

    Ok(())
}
