use anyhow::Result;

use sowing_bot::config::Settings;
use sowing_bot::scheduler::Engine;
use sowing_bot::{logging, terminal};

#[tokio::main]
async fn main() {
    terminal::print_banner();
    logging::init();

    if let Err(e) = run().await {
        terminal::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // The only fatal failure: credentials must load before any cycle starts.
    let settings = Settings::load().await?;
    let engine = Engine::new(settings);
    engine.run().await
}
