use anyhow::Result;
use owo_colors::OwoColorize;
use scal_core::ScalConfig;

use super::open_store;

pub fn run(config: &ScalConfig) -> Result<()> {
    let store = open_store(config)?;
    let metrics = store.metrics();
    let tz = config.tz();

    println!("{}", "Assignments".bold());
    println!("  Total:        {}", metrics.total);
    println!("  Submitted:    {}", metrics.submitted.green());
    println!("  Unsubmitted:  {}", metrics.unsubmitted.yellow());
    println!("  Marked done:  {}", store.marks().len());
    println!("  Custom:       {}", store.custom_events().len());

    match store.catalog_generated_at() {
        Some(at) => println!(
            "  {}",
            format!("Catalog built {}", at.with_timezone(&tz).format("%b %-d at %-I:%M %p")).dimmed()
        ),
        None => println!("  {}", "No catalog yet, run `scal refresh`".dimmed()),
    }

    Ok(())
}
