//! Show or save the effective configuration.

use reelsmith_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, save: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save()?;
        println!();
        println!("Saved to {}", path.display());
    }

    Ok(())
}
