use crate::{BarGeometry, CallTree, LayoutOptions, NodeId, PixelPos, Viewport};

/// The bar under a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocatedBar {
    pub node: NodeId,

    /// Which level bucket of the tree the node is in.
    pub level_index: usize,

    /// Position of the node within its level bucket.
    pub bar_index: usize,
}

/// Find the bar [`crate::layout`] painted at `pos`, if any.
///
/// Returns `None` outside the graph, in the border between two bars,
/// and whenever `layout` would paint nothing.
pub fn locate(
    tree: &CallTree,
    viewport: &Viewport,
    options: &LayoutOptions,
    pos: PixelPos,
) -> Option<LocatedBar> {
    let geometry = BarGeometry::new(viewport)?;
    locate_with(tree, &geometry, options, pos)
}

/// Like [`locate`], with the geometry already resolved.
pub fn locate_with(
    tree: &CallTree,
    geometry: &BarGeometry,
    options: &LayoutOptions,
    pos: PixelPos,
) -> Option<LocatedBar> {
    let level_index = level_index(pos.y, options.row_height)?;
    let level = tree.level(level_index)?;
    let bar_index = bar_index(tree, level, geometry, options, pos.x)?;

    Some(LocatedBar {
        node: level[bar_index],
        level_index,
        bar_index,
    })
}

#[expect(clippy::cast_possible_truncation)]
fn level_index(y: f64, row_height: f64) -> Option<usize> {
    if !(y >= 0.0 && y.is_finite() && row_height > 0.0) {
        return None;
    }
    let index = (y / row_height).floor();
    (index < usize::MAX as f64).then_some(index as usize)
}

/// Binary search a level bucket for the bar containing `x`.
fn bar_index(
    tree: &CallTree,
    level: &[NodeId],
    geometry: &BarGeometry,
    options: &LayoutOptions,
    x: f64,
) -> Option<usize> {
    let mut low = 0;
    let mut high = level.len();

    while low < high {
        let mid = low + (high - low) / 2;
        let node = tree.node(level[mid]);

        let start_x = geometry.bar_x(node.start);
        let next_x = geometry.bar_x(node.stop());

        if x < start_x {
            high = mid;
        } else if next_x <= x {
            low = mid + 1;
        } else {
            // Within the span of this node, but maybe in its border, or in a bar that isn't painted.
            let bar = geometry.visible_width(node, options)?;
            if start_x + bar.width <= x {
                return None;
            }

            // Layout skips everything below a node it doesn't paint:
            let walked = tree
                .walk_ancestors(level[mid])
                .all(|id| geometry.visible_width(tree.node(id), options).is_some());
            return walked.then_some(mid);
        }
    }

    None
}
