use affix_placement::RemediateOptions;

use crate::OutputFormat;
use crate::commands::Context;
use crate::report;

pub async fn run(
    ctx: &Context,
    cluster: Option<String>,
    workload: Option<String>,
    dry_run: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cluster = ctx.cluster(cluster)?;
    let options = RemediateOptions { dry_run, workload };
    let outcome = ctx.engine()?.remediate(&cluster, &options).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print!("{}", report::format_remediation(&outcome)),
    }

    let failed = outcome.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} workload(s) could not be remediated");
    }
    Ok(())
}
