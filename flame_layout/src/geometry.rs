//! The tick to pixel mapping shared by [`crate::layout`] and [`crate::locate`].
//!
//! Both sides must agree to the last bit on where a bar starts and how wide it is,
//! otherwise a pointer over a drawn bar could find nothing, or the wrong node.
//! Nothing outside this module converts ticks to pixels.

use crate::{LayoutOptions, Node};

/// A position on the drawing surface, in device pixels from its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What part of the graph is shown, and on how many pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// The weight that spans the full width when zoomed out.
    pub total_ticks: f64,

    /// Start of the zoom window, as a fraction of `total_ticks`.
    pub range_min: f64,

    /// End of the zoom window, as a fraction of `total_ticks`.
    pub range_max: f64,

    /// Width of the drawing surface.
    pub width_px: f64,
}

impl Viewport {
    /// Fully zoomed out.
    pub fn new(total_ticks: f64, width_px: f64) -> Self {
        Self {
            total_ticks,
            range_min: 0.0,
            range_max: 1.0,
            width_px,
        }
    }

    /// Zoom into `[range_min, range_max]`.
    #[must_use]
    pub fn with_range(self, range_min: f64, range_max: f64) -> Self {
        Self {
            range_min,
            range_max,
            ..self
        }
    }

    /// The zoom window that shows exactly the ticks `[start, start + value)`.
    #[must_use]
    pub fn focused_on(self, start: f64, value: f64) -> Self {
        if self.total_ticks > 0.0 {
            self.with_range(start / self.total_ticks, (start + value) / self.total_ticks)
        } else {
            self
        }
    }
}

/// Width of a bar that survived culling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarWidth {
    pub width: f64,

    /// Too narrow for a label.
    pub collapsed: bool,
}

/// The resolved mapping for one [`Viewport`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarGeometry {
    pixels_per_tick: f64,
    /// First visible tick.
    min_tick: f64,
    /// Last visible tick.
    max_tick: f64,
}

impl BarGeometry {
    /// Returns `None` if nothing can be shown: no weight, no width or an empty zoom window.
    pub fn new(viewport: &Viewport) -> Option<Self> {
        let positive = |v: f64| v > 0.0 && v.is_finite();

        let range = viewport.range_max - viewport.range_min;
        if !(positive(viewport.total_ticks) && positive(viewport.width_px) && positive(range)) {
            return None;
        }

        let pixels_per_tick = viewport.width_px / viewport.total_ticks / range;
        if !positive(pixels_per_tick) {
            return None;
        }

        Some(Self {
            pixels_per_tick,
            min_tick: viewport.range_min * viewport.total_ticks,
            max_tick: viewport.range_max * viewport.total_ticks,
        })
    }

    #[inline]
    pub fn pixels_per_tick(&self) -> f64 {
        self.pixels_per_tick
    }

    /// Left edge of a bar starting at `start` ticks.
    #[inline]
    pub fn bar_x(&self, start: f64) -> f64 {
        (start - self.min_tick) * self.pixels_per_tick
    }

    /// Width of a bar of `value` ticks, or `None` if it is too narrow to draw.
    pub fn bar_width(&self, value: f64, options: &LayoutOptions) -> Option<BarWidth> {
        let raw = value * self.pixels_per_tick;
        let collapsed = raw <= options.collapse_threshold;
        let width = if collapsed {
            raw
        } else {
            raw - 2.0 * options.border_width
        };

        (width >= options.hide_threshold).then_some(BarWidth { width, collapsed })
    }

    /// The painted width of `node`, or `None` if layout skips it and its subtree.
    pub fn visible_width(&self, node: &Node, options: &LayoutOptions) -> Option<BarWidth> {
        if !self.is_in_window(node.start, node.value) {
            return None;
        }
        self.bar_width(node.value, options)
    }

    /// Does the tick span `[start, start + value)` overlap the zoom window?
    #[inline]
    pub fn is_in_window(&self, start: f64, value: f64) -> bool {
        start + value > self.min_tick && start < self.max_tick
    }
}

// ----------------------------------------------------------------------------

#[test]
fn test_degenerate_viewports() {
    assert_eq!(BarGeometry::new(&Viewport::new(0.0, 100.0)), None);
    assert_eq!(BarGeometry::new(&Viewport::new(100.0, 0.0)), None);
    assert_eq!(BarGeometry::new(&Viewport::new(100.0, -5.0)), None);
    assert_eq!(
        BarGeometry::new(&Viewport::new(100.0, 100.0).with_range(0.5, 0.5)),
        None
    );
    assert_eq!(
        BarGeometry::new(&Viewport::new(f64::NAN, 100.0)),
        None
    );
}

#[test]
fn test_bar_mapping() {
    let options = LayoutOptions::default();
    let geometry = BarGeometry::new(&Viewport::new(100.0, 200.0)).unwrap();
    assert_eq!(geometry.pixels_per_tick(), 2.0);
    assert_eq!(geometry.bar_x(25.0), 50.0);

    let wide = geometry.bar_width(50.0, &options).unwrap();
    assert_eq!(wide.width, 99.0);
    assert!(!wide.collapsed);

    let narrow = geometry.bar_width(2.0, &options).unwrap();
    assert_eq!(narrow.width, 4.0);
    assert!(narrow.collapsed);

    assert_eq!(geometry.bar_width(0.1, &options), None);
}

#[test]
fn test_zoomed_mapping() {
    let viewport = Viewport::new(100.0, 100.0).focused_on(50.0, 25.0);
    assert_eq!(viewport.range_min, 0.5);
    assert_eq!(viewport.range_max, 0.75);

    let geometry = BarGeometry::new(&viewport).unwrap();
    assert_eq!(geometry.pixels_per_tick(), 4.0);
    assert_eq!(geometry.bar_x(50.0), 0.0);
    assert_eq!(geometry.bar_x(75.0), 100.0);

    assert!(geometry.is_in_window(60.0, 1.0));
    assert!(geometry.is_in_window(0.0, 100.0));
    assert!(!geometry.is_in_window(0.0, 50.0));
    assert!(!geometry.is_in_window(75.0, 25.0));
}
