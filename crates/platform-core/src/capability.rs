//! Host capability detection and guidance.
//!
//! Reelsmith needs the transcoder and prober binaries, a transcoder built
//! with the text-burn filter, and ideally a TrueType font.

use std::path::Path;
use std::process::Command;

use crate::locator::{EngineTool, ResourceLocator};

/// A host capability Reelsmith may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities and report status.
pub fn check_capabilities(locator: &dyn ResourceLocator) -> Vec<Capability> {
    let transcoder = locator.locate_engine(EngineTool::Transcoder);
    vec![
        check_engine(locator, EngineTool::Transcoder),
        check_engine(locator, EngineTool::Prober),
        check_drawtext(transcoder.as_deref()),
        check_font(locator),
    ]
}

fn check_engine(locator: &dyn ResourceLocator, tool: EngineTool) -> Capability {
    let found = locator.locate_engine(tool);
    let name = tool.binary_name();

    Capability {
        name: name.to_string(),
        description: match &found {
            Some(path) => format!("{name} at {}", path.display()),
            None => format!("{name} binary for rendering and probing"),
        },
        available: found.is_some(),
        required: true,
        fix_instructions: if found.is_none() {
            Some(format!(
                "Install FFmpeg (e.g. sudo apt install ffmpeg) or set engine.{name}_path in the config"
            ))
        } else {
            None
        },
    }
}

/// Check that the transcoder was built with the `drawtext` filter.
fn check_drawtext(transcoder: Option<&Path>) -> Capability {
    let available = transcoder
        .and_then(|bin| {
            Command::new(bin)
                .args(["-hide_banner", "-filters"])
                .output()
                .ok()
        })
        .map(|out| {
            String::from_utf8_lossy(&out.stdout)
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some("drawtext"))
        })
        .unwrap_or(false);

    Capability {
        name: "Text burn-in".to_string(),
        description: "drawtext filter (requires FFmpeg built with libfreetype)".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some("Install an FFmpeg build with --enable-libfreetype".to_string())
        },
    }
}

fn check_font(locator: &dyn ResourceLocator) -> Capability {
    let font = locator.locate_font();

    Capability {
        name: "Font".to_string(),
        description: match &font {
            Some(path) => format!("Text font at {}", path.display()),
            None => "TrueType font for burned-in text".to_string(),
        },
        available: font.is_some(),
        required: false, // engine falls back to its built-in font
        fix_instructions: if font.is_none() {
            Some("Install fonts-liberation or fonts-dejavu, or set overlay.font".to_string())
        } else {
            None
        },
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Reelsmith System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}

/// Whether every required capability is present.
pub fn all_required_available(capabilities: &[Capability]) -> bool {
    capabilities
        .iter()
        .filter(|c| c.required)
        .all(|c| c.available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::FixedLocator;

    #[test]
    fn test_missing_engines_are_required_failures() {
        let caps = check_capabilities(&FixedLocator::default());
        assert_eq!(caps.len(), 4);
        assert!(!all_required_available(&caps));

        let font = caps.iter().find(|c| c.name == "Font").unwrap();
        assert!(!font.required);
        assert!(font.fix_instructions.is_some());
    }

    #[test]
    fn test_drawtext_unavailable_without_transcoder() {
        let cap = check_drawtext(None);
        assert!(!cap.available);
        assert!(cap.required);
    }
}
