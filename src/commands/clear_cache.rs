use std::path::Path;

use anyhow::Result;
use notecal_core::config::Settings;
use notecal_core::state::{StateStore, cache_key};

pub async fn run(config_path: &Path) -> Result<()> {
    let settings = Settings::load(config_path)?;
    let request = settings.convert_request()?;
    let store = settings.state_store()?;

    let key = cache_key(&request);
    store.remove(&key).await?;
    tracing::info!(key = %key, dir = %store.dir().display(), "Removed cached sync state");
    println!("Cleared cached state in {}", store.dir().display());

    Ok(())
}
