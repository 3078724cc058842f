use crate::OutputFormat;
use crate::commands::Context;
use crate::report;

pub async fn run(
    ctx: &Context,
    cluster: Option<String>,
    workload: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cluster = ctx.cluster(cluster)?;
    let engine = ctx.engine()?;
    let detections = match workload {
        Some(name) => vec![engine.detect_workload(&cluster, name)?],
        None => engine.detect(&cluster).await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detections)?),
        OutputFormat::Text => print!("{}", report::format_detections(&cluster, &detections)),
    }
    Ok(())
}
