//! Check system capabilities.

use reelsmith_common::config::AppConfig;
use reelsmith_platform_core::{all_required_available, check_capabilities, print_capability_report};
use reelsmith_render_engine::locator_from_config;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsmith System Check");
    println!("{}", "=".repeat(50));

    let locator = locator_from_config(config);
    let capabilities = check_capabilities(&locator);
    print_capability_report(&capabilities);

    let overlay = &config.overlay.image;
    println!();
    if overlay.is_file() {
        println!("[OK] Overlay image: {}", overlay.display());
    } else {
        println!(
            "[WARN] Overlay image {} not found; a transparent frame will be used",
            overlay.display()
        );
    }

    println!();
    if all_required_available(&capabilities) {
        println!("All required capabilities are available. Reelsmith is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
