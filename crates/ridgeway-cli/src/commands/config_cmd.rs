//! Config command

use crate::config::RidgewayConfig;
use anyhow::Result;

pub fn run(config: &RidgewayConfig) -> Result<()> {
    if config.sources.is_empty() {
        println!("# No config files found, showing defaults");
    } else {
        for source in &config.sources {
            println!("# Layer: {}", source.display());
        }
    }
    println!("{}", config.to_toml_string()?);
    Ok(())
}
