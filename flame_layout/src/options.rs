/// Height of one level of the graph, in device pixels at a pixel ratio of 1.
pub const PIXELS_PER_LEVEL: f64 = 22.0;

/// Bars this many pixels wide or narrower are drawn without label and border.
pub const COLLAPSE_THRESHOLD: f64 = 10.0;

/// Bars narrower than this are not drawn, and neither are their children.
pub const HIDE_THRESHOLD: f64 = 0.5;

/// Border on each side of a bar that is not collapsed.
pub const BAR_BORDER_WIDTH: f64 = 0.5;

/// Tunable constants of the layout.
///
/// All distances are in device pixels. Scale with [`Self::with_pixels_per_point`]
/// before laying out onto a high-dpi surface.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    /// Height of each level.
    pub row_height: f64,

    /// Bars at or below this width are flagged as collapsed: the label is left out.
    pub collapse_threshold: f64,

    /// Bars narrower than this aren't visited at all.
    pub hide_threshold: f64,

    /// Subtracted on both sides of every bar wider than [`Self::collapse_threshold`].
    pub border_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_height: PIXELS_PER_LEVEL,
            collapse_threshold: COLLAPSE_THRESHOLD,
            hide_threshold: HIDE_THRESHOLD,
            border_width: BAR_BORDER_WIDTH,
        }
    }
}

impl LayoutOptions {
    /// Scale the row height for a surface with this many device pixels per logical point.
    #[must_use]
    pub fn with_pixels_per_point(self, pixels_per_point: f64) -> Self {
        Self {
            row_height: self.row_height * pixels_per_point,
            ..self
        }
    }
}

#[test]
fn test_pixels_per_point() {
    let options = LayoutOptions::default().with_pixels_per_point(2.0);
    assert_eq!(options.row_height, 44.0);
    assert_eq!(options.collapse_threshold, COLLAPSE_THRESHOLD);
}
