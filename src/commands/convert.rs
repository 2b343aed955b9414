use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use notecal_core::Converter;
use notecal_core::config::Settings;
use notecal_core::remote::notion::NotionClient;
use notecal_core::sync::SyncReport;
use owo_colors::OwoColorize;

use super::create_spinner;

pub async fn run(config_path: &Path, output: Option<&Path>, token: &str, full: bool) -> Result<()> {
    let settings = Settings::load(config_path)?;
    let request = settings.convert_request()?;

    let client = Arc::new(NotionClient::new(token)?);
    let converter = Converter::new(client)
        .with_store(Arc::new(settings.state_store()?))
        .with_full_sync_interval(settings.full_sync_interval()?)
        .with_strict_storage(settings.strict_storage);

    if full {
        converter.clear_cache(&request).await?;
        tracing::info!(database_id = %request.database_id, "Cleared cached state for a full sync");
    }

    let spinner = create_spinner(format!("Converting {}", request.calendar_name))?;
    let result = converter.convert(&request).await;
    spinner.finish_and_clear();
    let conversion = result?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &conversion.document)
                .await
                .with_context(|| format!("Could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = conversion.document.len(), "Wrote calendar");
        }
        None => print!("{}", conversion.document),
    }

    eprintln!("{}", render_report(&conversion.report));
    if let Some(e) = &conversion.report.storage_error {
        eprintln!("{}", format!("Sync state not saved: {e}").yellow());
    }

    Ok(())
}

fn render_report(report: &SyncReport) -> String {
    let mode = if report.incremental { "incremental" } else { "full" };
    let mut line = format!(
        "{} {} events ({} sync: {} fetched, {} new, {} updated",
        "✓".green(),
        report.total,
        mode,
        report.fetched,
        report.inserted,
        report.updated
    );
    if report.skipped > 0 {
        line.push_str(&format!(", {}", format!("{} skipped", report.skipped).red()));
    }
    line.push(')');
    line
}
