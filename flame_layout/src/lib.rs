//! Layout and hit-testing for flame graphs.
//!
//! Turns a weighted call tree into pixel rectangles, and a pointer position back
//! into the node under it. Drawing is left to the caller, who receives one
//! [`VisitedBar`] per rectangle to paint.
//!
//! Usage:
//!
//! ```
//! use flame_layout::{CallTree, FlameGraphData, LayoutOptions, PixelPos, Viewport};
//!
//! let data = FlameGraphData::new(
//!     vec!["total".into(), "main".into(), "work".into()],
//!     vec![100.0, 60.0, 40.0],
//!     vec![0, 1, 2],
//!     vec![40.0, 20.0, 40.0],
//! )
//! .unwrap();
//! let tree = CallTree::from_data(&data);
//!
//! let options = LayoutOptions::default();
//! let viewport = Viewport::new(tree.total_ticks(), 800.0);
//!
//! flame_layout::layout(&tree, &data, &viewport, &options, |_bar| {
//!     // paint a rectangle at (x, y) of size (width, height),
//!     // with the label inside it unless the bar is collapsed.
//! });
//!
//! let hit = flame_layout::locate(&tree, &viewport, &options, PixelPos::new(10.0, 30.0));
//! assert_eq!(data.label(tree.node(hit.unwrap().node).first_row()), "main");
//! ```

mod data;
mod geometry;
mod layout;
mod locate;
mod options;
mod sandwich;
mod stats;
mod tree;

pub use data::{Error, Field, FieldValues, FlameGraphData, LabelId, Result};
pub use geometry::{BarGeometry, BarWidth, PixelPos, Viewport};
pub use layout::{VisitedBar, layout, rendered_levels, walk_tree};
pub use locate::{LocatedBar, locate, locate_with};
pub use options::{
    BAR_BORDER_WIDTH, COLLAPSE_THRESHOLD, HIDE_THRESHOLD, LayoutOptions, PIXELS_PER_LEVEL,
};
pub use stats::{LabelStats, SortBy, Sorting, label_stats};
pub use tree::{CallTree, Direction, Node, NodeId, WalkRoot};
