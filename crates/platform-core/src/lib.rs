//! Reelsmith platform contracts.
//!
//! The assembly pipeline never looks up fonts or engine binaries on its own.
//! It asks a [`ResourceLocator`], which answers with an absolute path or
//! `None` for "unavailable". [`SystemLocator`] searches the host;
//! [`FixedLocator`] returns pre-set answers.

pub mod capability;
pub mod locator;

pub use capability::*;
pub use locator::*;
