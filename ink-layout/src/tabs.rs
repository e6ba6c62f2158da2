//! Sheet tab overflow layout.
//!
//! ```text
//!  ┌──────────────────────────── container ────────────────────────────┐
//!  │ pad │ tab 0 │ tab 1 │ ... │ tab n-1 │ ▾ overflow │ + add │        │
//!  └───────────────────────────────────────────────────────────────────┘
//!  available   = container − dropdown − add − padding
//!  max_visible = max(1, ⌊available / tab_width⌋)
//! ```
//!
//! Tabs are estimated at a fixed width; text is never measured.

use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("invalid tab metrics: {0}")]
    InvalidMetrics(String),
}

/// Fixed widths (in pixels) of the toolbar pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabMetrics {
    tab_width: f32,
    dropdown_width: f32,
    add_button_width: f32,
    padding: f32,
}

impl Default for TabMetrics {
    fn default() -> Self {
        Self {
            tab_width: 150.0,
            dropdown_width: 50.0,
            add_button_width: 50.0,
            padding: 32.0,
        }
    }
}

impl TabMetrics {
    pub fn new(
        tab_width: f32,
        dropdown_width: f32,
        add_button_width: f32,
        padding: f32,
    ) -> Result<Self, LayoutError> {
        if !tab_width.is_finite() || tab_width <= 0.0 {
            return Err(LayoutError::InvalidMetrics(format!(
                "tab width must be positive, got {tab_width}"
            )));
        }
        for (name, value) in [
            ("dropdown width", dropdown_width),
            ("add button width", add_button_width),
            ("padding", padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidMetrics(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(Self {
            tab_width,
            dropdown_width,
            add_button_width,
            padding,
        })
    }

    pub fn tab_width(&self) -> f32 {
        self.tab_width
    }

    /// Width left for inline tabs in a container of `container_width`.
    pub fn available(&self, container_width: f32) -> f32 {
        container_width - self.dropdown_width - self.add_button_width - self.padding
    }

    /// How many tabs fit inline; never less than one.
    pub fn max_visible(&self, container_width: f32) -> usize {
        let fit = (self.available(container_width) / self.tab_width()).floor();
        if fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }
}

/// Split of sheet positions into inline tabs and overflow entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabLayout {
    pub visible: Vec<usize>,
    pub overflow: Vec<usize>,
}

impl TabLayout {
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }

    pub fn has_overflow(&self) -> bool {
        !self.overflow.is_empty()
    }
}

/// Pure layout of `sheet_count` tabs in a container `container_width` wide.
pub fn compute_tab_layout(
    sheet_count: usize,
    container_width: f32,
    metrics: &TabMetrics,
) -> TabLayout {
    let shown = metrics.max_visible(container_width).min(sheet_count);
    TabLayout {
        visible: (0..shown).collect(),
        overflow: (shown..sheet_count).collect(),
    }
}

/// Tab layout that recomputes only when the width or sheet count changes.
#[derive(Debug, Clone)]
pub struct TabStrip {
    metrics: TabMetrics,
    /// Inputs of the cached layout
    inputs: Option<(usize, f32)>,
    layout: TabLayout,
}

impl Default for TabStrip {
    fn default() -> Self {
        Self::new(TabMetrics::default())
    }
}

impl TabStrip {
    pub fn new(metrics: TabMetrics) -> Self {
        Self {
            metrics,
            inputs: None,
            layout: TabLayout::default(),
        }
    }

    pub fn metrics(&self) -> &TabMetrics {
        &self.metrics
    }

    /// Refresh for a resize or sheet-count change. Returns whether the
    /// layout was recomputed.
    pub fn update(&mut self, sheet_count: usize, container_width: f32) -> bool {
        if self.inputs == Some((sheet_count, container_width)) {
            return false;
        }
        self.layout = compute_tab_layout(sheet_count, container_width, &self.metrics);
        self.inputs = Some((sheet_count, container_width));
        debug!(
            "tab layout: {} visible, {} overflow (width {container_width})",
            self.layout.visible.len(),
            self.layout.overflow.len()
        );
        true
    }

    pub fn layout(&self) -> &TabLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_fit() {
        let metrics = TabMetrics::default();
        assert_eq!(metrics.tab_width(), 150.0);
        // 800 - 50 - 50 - 32 = 668 -> 4 tabs of 150
        assert_eq!(metrics.max_visible(800.0), 4);
        let layout = compute_tab_layout(6, 800.0, &metrics);
        assert_eq!(layout.visible, vec![0, 1, 2, 3]);
        assert_eq!(layout.overflow, vec![4, 5]);
        assert!(layout.has_overflow());
    }

    #[test]
    fn test_fewer_sheets_than_room() {
        let layout = compute_tab_layout(2, 2000.0, &TabMetrics::default());
        assert_eq!(layout.visible, vec![0, 1]);
        assert!(layout.overflow.is_empty());
    }

    #[test]
    fn test_zero_fit_still_shows_one_tab() {
        let metrics = TabMetrics::default();
        // 250 - 132 = 118 < 150
        assert_eq!(metrics.max_visible(250.0), 1);
        let layout = compute_tab_layout(3, 250.0, &metrics);
        assert_eq!(layout.visible, vec![0]);
        assert_eq!(layout.overflow, vec![1, 2]);
    }

    #[test]
    fn test_negative_space_still_shows_one_tab() {
        let layout = compute_tab_layout(3, 0.0, &TabMetrics::default());
        assert_eq!(layout.visible.len(), 1);
        assert_eq!(layout.overflow.len(), 2);
    }

    #[test]
    fn test_exact_fit_boundary() {
        let metrics = TabMetrics::default();
        assert_eq!(metrics.max_visible(132.0 + 300.0), 2);
        assert_eq!(metrics.max_visible(132.0 + 299.0), 1);
    }

    #[test]
    fn test_invalid_metrics_rejected() {
        assert!(TabMetrics::new(0.0, 50.0, 50.0, 32.0).is_err());
        assert!(TabMetrics::new(f32::NAN, 50.0, 50.0, 32.0).is_err());
        assert!(TabMetrics::new(150.0, -1.0, 50.0, 32.0).is_err());
        assert!(TabMetrics::new(120.0, 40.0, 40.0, 16.0).is_ok());
    }

    #[test]
    fn test_strip_recomputes_on_change_only() {
        let mut strip = TabStrip::default();
        assert!(strip.update(3, 800.0));
        assert!(!strip.update(3, 800.0));
        assert!(strip.update(4, 800.0));
        assert!(strip.update(4, 300.0));
        assert_eq!(strip.layout().visible, vec![0]);
        assert!(strip.layout().is_visible(0));
        assert!(!strip.layout().is_visible(1));
    }
}
