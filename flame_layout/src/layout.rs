use crate::{
    BarGeometry, CallTree, FlameGraphData, LayoutOptions, NodeId, Viewport, WalkRoot,
};

/// One rectangle to paint, handed to the visitor of [`layout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisitedBar<'d> {
    pub node: NodeId,

    /// Left edge, in device pixels.
    pub x: f64,

    /// Top edge, in device pixels.
    pub y: f64,

    pub width: f64,
    pub height: f64,

    /// Function name of the node.
    pub label: &'d str,

    /// Too narrow for text: paint the rectangle, leave out the label.
    pub collapsed: bool,
}

/// Lay out every root of the tree, calling `visit` once per visible bar.
///
/// Bars are visited top-down and left to right: a node before its children,
/// siblings in order of their start. Nothing is visited if the viewport is empty
/// (no weight, no width, or an empty zoom window).
pub fn layout<'d>(
    tree: &CallTree,
    data: &'d FlameGraphData,
    viewport: &Viewport,
    options: &LayoutOptions,
    mut visit: impl FnMut(&VisitedBar<'d>),
) {
    let Some(geometry) = BarGeometry::new(viewport) else {
        return;
    };

    for root in tree.roots() {
        walk_tree(tree, data, *root, &geometry, options, &mut visit);
    }
}

/// Lay out the subtree reachable from one root.
///
/// Nodes outside the zoom window, and nodes too narrow to draw, are skipped
/// together with everything below them.
pub fn walk_tree<'d>(
    tree: &CallTree,
    data: &'d FlameGraphData,
    root: WalkRoot,
    geometry: &BarGeometry,
    options: &LayoutOptions,
    visit: &mut impl FnMut(&VisitedBar<'d>),
) {
    let mut stack = vec![root.node];

    while let Some(id) = stack.pop() {
        let node = tree.node(id);

        let Some(bar) = geometry.visible_width(node, options) else {
            continue;
        };

        let y = node.level as f64 * options.row_height;

        visit(&VisitedBar {
            node: id,
            x: geometry.bar_x(node.start),
            y,
            width: bar.width,
            height: options.row_height,
            label: data.label(node.first_row()),
            collapsed: bar.collapsed,
        });

        // Reversed, so the leftmost child is popped first:
        stack.extend(node.next(root.direction).iter().rev().copied());
    }
}

/// How many levels have at least one visible bar, counting from the top.
///
/// Useful for sizing the drawing surface.
pub fn rendered_levels(
    tree: &CallTree,
    data: &FlameGraphData,
    viewport: &Viewport,
    options: &LayoutOptions,
) -> usize {
    let mut num_levels = 0;
    layout(tree, data, viewport, options, |bar| {
        num_levels = num_levels.max(tree.node(bar.node).level + 1);
    });
    num_levels
}
