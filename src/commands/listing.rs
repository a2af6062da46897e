//! `examwatch listing`: new entries on the public listing.

use std::time::Duration;

use anyhow::{Result, anyhow};
use examwatch_core::listing::{DEFAULT_PAGE_DELAY, ListingConfig, ListingFetcher};
use examwatch_core::pipeline::{ListingMode, check_listing, check_listing_with_progress};
use examwatch_core::store::JsonSeenStore;
use tracing::{info, warn};

use super::RunContext;
use crate::cli::ListingArgs;
use crate::output;

pub async fn run_listing_command(ctx: &RunContext, args: &ListingArgs) -> Result<()> {
    let url = args
        .url
        .clone()
        .or_else(|| ctx.file.listing_url.clone())
        .ok_or_else(|| anyhow!("No listing URL: pass --url or set `listing_url` in the config file"))?;

    let mut config = ListingConfig::new(url);
    if let Some(pattern) = &ctx.file.detail_pattern {
        config.detail_pattern.clone_from(pattern);
    }
    config.page_delay = args
        .page_delay
        .or(ctx.file.page_delay_ms)
        .map_or(DEFAULT_PAGE_DELAY, Duration::from_millis);

    let fetcher = ListingFetcher::new(ctx.http.clone(), &config)?;
    let store = JsonSeenStore::in_dir(&ctx.state_dir);

    let delta = if args.full {
        let bar = output::backfill_progress_bar(ctx.show_progress());
        let delta = check_listing_with_progress(&fetcher, &store, ListingMode::Backfill, |page| {
            output::advance_backfill(&bar, page);
        })
        .await;
        bar.finish_and_clear();
        delta?
    } else {
        check_listing(&fetcher, &store, ListingMode::Incremental).await?
    };

    if !delta.failed_offsets.is_empty() {
        warn!(
            failed = delta.failed_offsets.len(),
            offsets = ?delta.failed_offsets,
            "some listing pages could not be fetched"
        );
    }

    output::print_entries(&delta.new_entries, ctx.json)?;

    if args.no_commit {
        info!("Seen set left unchanged (--no-commit)");
    } else {
        let seen = delta.commit(&store).await?;
        info!(seen, path = %store.path().display(), "Seen set updated");
    }
    Ok(())
}
