//! # ink-layout: sheet tab layout for the Ink editor toolbar
//!
//! Decides which sheet tabs render inline and which move into the overflow
//! list, given the toolbar width.

pub mod tabs;

pub use tabs::{compute_tab_layout, LayoutError, TabLayout, TabMetrics, TabStrip};
