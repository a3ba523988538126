//! Overlay compositor: scales a clip, lays the overlay image over it and
//! burns in the four text lines.
//!
//! The graph has a fixed shape:
//!
//! ```text
//! [0:v] scale,setsar ─[bg]──┐
//!                           ├─ overlay ─ drawtext ×4 ─[vout]
//! [1:v] scale,setsar ─[ovr]─┘
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use reelsmith_project_model::artifact::{OUTPUT_HEIGHT, OUTPUT_WIDTH};
use reelsmith_project_model::overlay::OverlaySpec;

/// Label of the composited video stream.
pub const VIDEO_OUT_LABEL: &str = "vout";

const TEXT_COLOR: &str = "white";

/// Placement of one burned-in text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSlot {
    pub y: u32,
    pub font_size: u32,
}

/// Heading, line 1, line 2, date, top to bottom.
pub const TEXT_SLOTS: [TextSlot; 4] = [
    TextSlot::new(150, 68),
    TextSlot::new(250, 42),
    TextSlot::new(300, 42),
    TextSlot::new(400, 36),
];

impl TextSlot {
    const fn new(y: u32, font_size: u32) -> Self {
        Self { y, font_size }
    }
}

/// A complete `-filter_complex` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph(String);

impl FilterGraph {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FilterGraph> for OsString {
    fn from(graph: FilterGraph) -> Self {
        graph.0.into()
    }
}

/// Builds the per-clip filter graph for an [`OverlaySpec`].
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    width: u32,
    height: u32,
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
        }
    }
}

impl OverlayCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, spec: &OverlaySpec) -> FilterGraph {
        let (w, h) = (self.width, self.height);
        let mut graph = format!(
            "[0:v]scale={w}:{h},setsar=1[bg];[1:v]scale={w}:{h},setsar=1[ovr];[bg][ovr]overlay=0:0:shortest=1"
        );

        let lines = [&spec.heading, &spec.line_1, &spec.line_2, &spec.date];
        for (text, slot) in lines.into_iter().zip(TEXT_SLOTS) {
            graph.push(',');
            graph.push_str(&drawtext(text, slot, spec.font()));
        }

        graph.push_str(&format!("[{VIDEO_OUT_LABEL}]"));
        FilterGraph(graph)
    }
}

fn drawtext(text: &str, slot: TextSlot, font: Option<&Path>) -> String {
    let mut stage = String::from("drawtext=");
    if let Some(font) = font {
        stage.push_str(&format!(
            "fontfile='{}':",
            escape_drawtext(&font.to_string_lossy())
        ));
    }
    stage.push_str(&format!(
        "text='{}':fontcolor={TEXT_COLOR}:fontsize={}:x=(w-text_w)/2:y={}",
        escape_drawtext(text),
        slot.font_size,
        slot.y
    ));
    stage
}

/// Escape a value for a single-quoted `drawtext` option.
///
/// Backslashes are doubled first so the escapes added for quotes and colons
/// are not escaped again.
pub fn escape_drawtext(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("'\\''"),
            ':' => out.push_str("\\:"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reelsmith_project_model::overlay::OverlayText;
    use std::path::PathBuf;

    fn spec(font: Option<&str>) -> OverlaySpec {
        OverlaySpec::new(
            OverlayText::default(),
            font.map(PathBuf::from),
            "/w/overlay.png",
        )
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("plain"), "plain");
        assert_eq!(escape_drawtext("12:30"), "12\\:30");
        assert_eq!(escape_drawtext("it's"), "it'\\''s");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\b");
        assert_eq!(escape_drawtext("\\:"), "\\\\\\:");
    }

    #[test]
    fn test_graph_shape() {
        let graph = OverlayCompositor::new().build(&spec(Some("/fonts/Sans.ttf")));
        let graph = graph.as_str();

        assert!(graph.starts_with(
            "[0:v]scale=1280:720,setsar=1[bg];[1:v]scale=1280:720,setsar=1[ovr];[bg][ovr]overlay=0:0:shortest=1,drawtext="
        ));
        assert!(graph.ends_with("[vout]"));
        assert_eq!(graph.matches("drawtext=").count(), 4);
        assert_eq!(graph.matches("fontfile='/fonts/Sans.ttf'").count(), 4);
        assert!(graph.contains("text='HELLO':fontcolor=white:fontsize=68:x=(w-text_w)/2:y=150"));
        assert!(graph.contains("text='Name':fontcolor=white:fontsize=42:x=(w-text_w)/2:y=250"));
        assert!(graph.contains("text='Place':fontcolor=white:fontsize=42:x=(w-text_w)/2:y=300"));
        assert!(graph.contains("text='2026':fontcolor=white:fontsize=36:x=(w-text_w)/2:y=400"));
    }

    #[test]
    fn test_missing_font_omits_fontfile() {
        let graph = OverlayCompositor::new().build(&spec(None));
        assert!(!graph.as_str().contains("fontfile"));
        assert_eq!(graph.as_str().matches("drawtext=text=").count(), 4);
    }

    #[test]
    fn test_font_path_is_escaped() {
        let graph = OverlayCompositor::new().build(&spec(Some("C:/Fonts/it's.ttf")));
        assert!(graph
            .as_str()
            .contains("fontfile='C\\:/Fonts/it'\\''s.ttf'"));
    }

    #[test]
    fn test_text_is_escaped_once() {
        let mut s = spec(None);
        s.heading = "Time: 10:00".to_string();
        let graph = OverlayCompositor::new().build(&s);
        assert!(graph.as_str().contains("text='Time\\: 10\\:00'"));
        assert!(!graph.as_str().contains("\\\\:"));
    }

    /// Read an escaped value back left to right, as the filter parser does.
    ///
    /// Returns `None` on a bare quote, bare colon or dangling backslash.
    fn unescape(escaped: &str) -> Option<String> {
        let mut out = String::new();
        let mut rest = escaped;
        while let Some(ch) = rest.chars().next() {
            if let Some(tail) = rest.strip_prefix("'\\''") {
                out.push('\'');
                rest = tail;
                continue;
            }
            match ch {
                '\\' => {
                    let next = rest[1..].chars().next()?;
                    if next != '\\' && next != ':' {
                        return None;
                    }
                    out.push(next);
                    rest = &rest[2..];
                }
                '\'' | ':' => return None,
                other => {
                    out.push(other);
                    rest = &rest[other.len_utf8()..];
                }
            }
        }
        Some(out)
    }

    #[test]
    fn test_unescape_rejects_unescaped_input() {
        assert_eq!(unescape("a\\:b\\\\c'\\''d").as_deref(), Some("a:b\\c'd"));
        assert_eq!(unescape("a:b"), None);
        assert_eq!(unescape("it's"), None);
        assert_eq!(unescape("trailing\\"), None);
    }

    proptest! {
        #[test]
        fn prop_escaped_output_has_no_bare_colon(text in "[a-z:\\\\' ]{0,24}") {
            let escaped = escape_drawtext(&text);
            let bytes = escaped.as_bytes();
            for (i, b) in bytes.iter().enumerate() {
                if *b == b':' {
                    prop_assert!(i > 0 && bytes[i - 1] == b'\\');
                }
            }
        }

        #[test]
        fn prop_escape_round_trips(text in "[a-zA-Z0-9:'\\\\ é]{0,24}") {
            prop_assert_eq!(unescape(&escape_drawtext(&text)), Some(text));
        }
    }
}
