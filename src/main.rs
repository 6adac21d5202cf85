use anyhow::Result;
use clap::Parser;

use maple_monster::{commands, Config, LinePrompt};

/// Scrape monster pages from the wiki, store them, and report on levels
#[derive(Parser, Debug)]
#[command(name = "maple-monster", version)]
struct Cli {
    /// insert | visualize (visual) | recommend | list | export; prompted when omitted
    command: Option<String>,

    /// Page URL for `insert`, target level for `recommend`; prompted when omitted
    value: Option<String>,
}

async fn run_cli(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    log::debug!("Using database {} (table {})", config.db_path.display(), config.table);

    let mut prompt = LinePrompt::new()?;
    commands::run(&config, cli.command, cli.value, &mut prompt).await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Failures abort the command, not the process
    if let Err(e) = run_cli(Cli::parse()).await {
        log::error!("{:#}", e);
        eprintln!("❌ {}", e);
    }
}
