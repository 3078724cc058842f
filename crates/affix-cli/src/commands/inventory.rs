use std::path::Path;

use affix_inventory::InventorySeed;

use crate::OutputFormat;
use crate::commands::Context;
use crate::report;

pub fn import(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let seed = InventorySeed::from_file(file)?;
    let summary = ctx.open_inventory()?.import(&seed)?;
    println!("✓ Imported {} into {}", file.display(), ctx.inventory_path.display());
    println!(
        "  {} clusters, {} hosts, {} workloads, {} groups, {} stores, {} pools",
        summary.clusters, summary.hosts, summary.workloads, summary.groups, summary.stores, summary.pools
    );
    Ok(())
}

pub fn tasks(ctx: &Context, format: OutputFormat) -> anyhow::Result<()> {
    let tasks = ctx.open_inventory()?.list_tasks()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Text => print!("{}", report::format_tasks(&tasks)),
    }
    Ok(())
}

pub fn complete(ctx: &Context, task: &str) -> anyhow::Result<()> {
    let record = ctx.open_inventory()?.complete_task(task)?;
    println!("✓ Completed {} ({})", record.handle.id, record.handle.workload);
    Ok(())
}
