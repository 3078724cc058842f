use crate::OutputFormat;
use crate::commands::Context;
use crate::report;

pub fn run(ctx: &Context, cluster: Option<String>, format: OutputFormat) -> anyhow::Result<()> {
    let cluster = ctx.cluster(cluster)?;
    let outcome = ctx.engine()?.balance(&cluster)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print!("{}", report::format_balance(&outcome)),
    }
    Ok(())
}
