//! `examwatch exams`: the member's exam table, optionally with results.

use anyhow::{Result, bail};
use examwatch_core::pipeline::collect_results;
use examwatch_core::store::JsonResultCache;

use super::RunContext;
use crate::cli::ExamsArgs;
use crate::output;

pub async fn run_exams_command(ctx: &RunContext, args: &ExamsArgs) -> Result<()> {
    let (client, identity, credentials) = ctx.portal(&args.portal)?;
    let records = client.exam_records(&identity, &credentials).await?;

    if !args.results {
        return output::print_exam_records(&records, ctx.json);
    }

    let cache = JsonResultCache::in_dir(&ctx.state_dir);
    let results = collect_results(&client, &identity, &credentials, &records, &cache).await?;
    output::print_record_results(&results, ctx.json)?;

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        bail!("{failed} of {} result documents could not be read", results.len());
    }
    Ok(())
}
