use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use scal_core::ScalConfig;

pub fn run(path: Option<&Path>, init: bool) -> Result<()> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => ScalConfig::config_path()?,
    };

    if init {
        if config_path.exists() {
            println!("{}", format!("{} already exists", config_path.display()).dimmed());
        } else {
            ScalConfig::create_default_config(&config_path)?;
            println!("{} Wrote {}", "✓".green(), config_path.display());
        }
    }

    let config = ScalConfig::load(Some(&config_path))?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Data:    {}", config.data_dir().display());
    println!();
    println!("{}", "Effective settings".bold());
    print!("{}", config.to_redacted_toml()?);

    Ok(())
}
