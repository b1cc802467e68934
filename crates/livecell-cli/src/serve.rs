//! `serve` command: start the HTTP/WebSocket front end over a watched file.

use std::path::Path;
use std::sync::Arc;

use livecell_server::ServerConfig;
use livecell_watch::LineCellGrammar;

use crate::colors;
use crate::demo::{RunningTotal, SumEvaluator};

/// Start the interactive live-eval server.
pub async fn execute(path: &str, port: u16) -> anyhow::Result<()> {
    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }

    println!("\n{}livecell serve{}", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Watching:{} {}",
        colors::CYAN,
        colors::RESET,
        path.display()
    );

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        open_browser: false,
    };

    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!(
        "{}  ◆ WebSocket:{} ws://{}:{}/ws",
        colors::CYAN,
        colors::RESET,
        config.host,
        config.port
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    livecell_server::serve(
        path,
        LineCellGrammar,
        Arc::new(SumEvaluator),
        RunningTotal(0),
        config,
    )
    .await?;

    Ok(())
}
