//! Run the assembly pipeline.

use std::io::Write;

use reelsmith_common::config::AppConfig;
use reelsmith_project_model::OverlayText;
use reelsmith_render_engine::{
    assemble, CancelToken, PipelineProgress, PipelineStage, ProgressCallback,
};

pub async fn run(
    config: AppConfig,
    heading: String,
    line_1: String,
    line_2: String,
    date: String,
) -> anyhow::Result<()> {
    println!("Assembling clips in {}", config.workspace_dir.display());

    let text = OverlayText {
        heading,
        line_1,
        line_2,
        date,
    };

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current step...");
            on_interrupt.cancel();
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: PipelineProgress| {
        if p.stage == PipelineStage::Failed {
            return;
        }
        print!("\r  [{:>3.0}%] {:<40}", p.fraction * 100.0, p.label);
        let _ = std::io::stdout().flush();
    });

    match assemble(config, text, Some(progress_cb), cancel).await {
        Ok(outcome) => {
            let artifact = &outcome.artifact;
            println!();
            println!("Assembly complete: {}", artifact.path.display());
            println!("  Size: {:.1} MiB", artifact.size_mib());
            println!("  Audio: {}", if artifact.has_audio { "muxed" } else { "none" });
            if let Some(plan) = &outcome.report.loop_plan {
                println!("  Video plays: {}", plan.loop_count);
            }
            for warning in &outcome.report.warnings {
                println!("  Warning: {warning}");
            }
            if let Some(report) = &outcome.report_path {
                println!("  Report: {}", report.display());
            }
            Ok(())
        }
        Err(failure) => {
            println!();
            Err(anyhow::Error::new(failure).context("Assembly failed"))
        }
    }
}
