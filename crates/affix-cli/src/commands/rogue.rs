use crate::OutputFormat;
use crate::commands::Context;
use crate::report;

pub fn run(ctx: &Context, cluster: Option<String>, apply: bool, format: OutputFormat) -> anyhow::Result<()> {
    let cluster = ctx.cluster(cluster)?;
    let results = ctx.engine()?.assign_rogues(&cluster, apply)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => print!("{}", report::format_rogues(&cluster, &results)),
    }
    Ok(())
}
