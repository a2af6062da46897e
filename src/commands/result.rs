use anyhow::Result;

use super::RunContext;
use crate::cli::ResultArgs;
use crate::output;

pub async fn run_result_command(ctx: &RunContext, args: &ResultArgs) -> Result<()> {
    let (client, identity, credentials) = ctx.portal(&args.portal)?;
    let result = client
        .exam_result(&identity, &credentials, &args.url)
        .await?;
    output::print_exam_result(&result, ctx.json)
}
