//! Create the working layout.

use reelsmith_common::config::AppConfig;
use reelsmith_project_model::Workspace;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let workspace = Workspace::new(&config.workspace_dir, &config.pipeline.final_name)?;
    workspace.init()?;

    println!("Working root ready at {}", workspace.root().display());
    println!();
    println!("Directory structure:");
    println!("  {}/", workspace.root().display());
    println!("  ├── video/       (source1.mp4, source2.mp4, ...)");
    println!("  ├── audio/       (voice.mp3, optional)");
    println!("  ├── runs/        (per-run scratch, removed after each run)");
    println!("  └── {}", config.pipeline.final_name);

    Ok(())
}
