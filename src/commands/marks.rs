use anyhow::Result;
use owo_colors::OwoColorize;
use scal_core::ScalConfig;

use super::open_store;

pub fn mark(config: &ScalConfig, id: &str, occ: Option<&str>) -> Result<()> {
    let store = open_store(config)?;

    if store.mark_done(id, occ)? {
        println!("{} Marked {} done", "✓".green(), label(id, occ));
    } else {
        println!("{}", format!("{} was already done", label(id, occ)).dimmed());
    }

    Ok(())
}

pub fn unmark(config: &ScalConfig, id: &str, occ: Option<&str>) -> Result<()> {
    let store = open_store(config)?;

    if store.unmark_done(id, occ)? {
        println!("{} Unmarked {}", "✓".green(), label(id, occ));
    } else {
        println!("{}", format!("{} was not marked", label(id, occ)).dimmed());
    }

    Ok(())
}

fn label(id: &str, occ: Option<&str>) -> String {
    match occ {
        Some(occ) => format!("{id}@{occ}"),
        None => id.to_string(),
    }
}
