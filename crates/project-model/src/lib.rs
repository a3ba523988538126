//! Reelsmith Project Model
//!
//! Defines the data contracts shared by the assembly pipeline:
//! - **Clips:** discovered source files and their numeric ordering
//! - **Overlay:** the four burn-in text fields and the overlay references
//! - **Artifacts:** render jobs, part files, assembled video, final deliverable
//! - **Loop plan:** how many plays of the video cover the audio track
//! - **Workspace:** the on-disk layout of one working root and its per-run
//!   scratch directories

pub mod artifact;
pub mod catalog;
pub mod clip;
pub mod overlay;
pub mod plan;
pub mod workspace;

pub use artifact::*;
pub use catalog::*;
pub use clip::*;
pub use overlay::*;
pub use plan::*;
pub use workspace::*;
