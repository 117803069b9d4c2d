use clap::Parser;

use tiercache::cache::Cache;
use tiercache::cli::{Cli, execute_command, load_config};
use tiercache::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_config(&cli)?;
    init_logger(&settings.logger)?;

    tracing::debug!(
        version = tiercache::pkg_version(),
        backend = ?settings.cache.backend,
        "starting tiercache"
    );

    let cache = Cache::from_config(&settings.cache).await?;
    if let Some(output) = execute_command(&cli.command, &cache).await? {
        println!("{}", output);
    }

    Ok(())
}
