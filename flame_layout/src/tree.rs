use itertools::Itertools as _;
use log_once::warn_once;
use vec1::Vec1;

use crate::{FlameGraphData, LabelId};

/// Index of a [`Node`] in its [`CallTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One bar of the flame graph: a function at one call path.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Left edge, in ticks from the left of the whole graph.
    pub start: f64,

    /// Weight of this node including all its children.
    /// Whatever the children don't cover is self time.
    pub value: f64,

    /// Depth from the root (root = 0).
    pub level: usize,

    /// The rows of [`FlameGraphData`] aggregated into this node.
    /// More than one when several call paths got merged, e.g. in a sandwich view.
    pub row_refs: Vec1<usize>,

    /// Ordered by ascending [`Self::start`].
    pub children: Vec<NodeId>,

    /// At most one in a tree built from data.
    /// The callers half of a sandwich view walks these instead of the children.
    pub parents: Vec<NodeId>,
}

impl Node {
    /// Right edge, in ticks.
    #[inline]
    pub fn stop(&self) -> f64 {
        self.start + self.value
    }

    /// The row used for the label.
    #[inline]
    pub fn first_row(&self) -> usize {
        *self.row_refs.first()
    }

    #[inline]
    pub fn label_id(&self, data: &FlameGraphData) -> LabelId {
        data.label_id(self.first_row())
    }

    pub fn next(&self, direction: Direction) -> &[NodeId] {
        match direction {
            Direction::Children => &self.children,
            Direction::Parents => &self.parents,
        }
    }
}

/// Which links a walk follows from a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Children,
    Parents,
}

/// Where a layout walk starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkRoot {
    pub node: NodeId,
    pub direction: Direction,
}

/// A call tree, with all nodes also bucketed per level.
///
/// Immutable once built. Within each level, nodes are ordered by ascending
/// [`Node::start`]; this is what lets [`crate::locate`] binary search a level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallTree {
    nodes: Vec<Node>,
    levels: Vec<Vec<NodeId>>,
    roots: Vec<WalkRoot>,
    total_ticks: f64,

    /// The node a layout walk reaches each node from, `None` for walk roots.
    walked_from: Vec<Option<NodeId>>,
}

impl CallTree {
    /// Build the tree from rows in depth-first pre-order.
    ///
    /// A row becomes a child of the closest preceding row one level up.
    /// Children are laid out left to right from their parent's start.
    /// Input with children heavier than their parent is not corrected: the resulting
    /// bars may overlap. A row whose level jumps down by more than one is placed
    /// directly below the deepest open node.
    pub fn from_data(data: &FlameGraphData) -> Self {
        let mut builder = TreeBuilder::default();
        for row in 0..data.len() {
            builder.push_row(row, data.level(row), data.value(row));
        }
        let tree = builder.finish();

        log::debug!(
            "Built call tree: {} nodes on {} levels from {} rows, total {}",
            tree.len(),
            tree.depth(),
            data.len(),
            tree.total_ticks
        );

        tree
    }

    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        levels: Vec<Vec<NodeId>>,
        roots: Vec<WalkRoot>,
        total_ticks: f64,
    ) -> Self {
        let walked_from = walked_from(&nodes, &roots);
        let tree = Self {
            nodes,
            levels,
            roots,
            total_ticks,
            walked_from,
        };
        debug_assert!(
            tree.levels_are_ordered(),
            "level buckets must be ordered by start"
        );
        tree
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels, including empty ones.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// The weight that spans the whole width when zoomed out.
    pub fn total_ticks(&self) -> f64 {
        self.total_ticks
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// All nodes with their ids, in construction order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn levels(&self) -> &[Vec<NodeId>] {
        &self.levels
    }

    /// The nodes at one depth, ordered by start.
    pub fn level(&self, level: usize) -> Option<&[NodeId]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// Where layout walks start.
    pub fn roots(&self) -> &[WalkRoot] {
        &self.roots
    }

    /// The first root, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.roots.first().map(|root| root.node)
    }

    /// Parent, grandparent and so on, following the first parent link.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parents.first().copied(), |&parent| {
            self.node(parent).parents.first().copied()
        })
    }

    /// The nodes a layout walk passes through before reaching `id`, nearest first.
    ///
    /// For a tree built from data these are the [`Self::ancestors`]. In the callers
    /// half of a sandwich view they are the callees leading back to the function.
    pub fn walk_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.walked_from[id.0], |&previous| {
            self.walked_from[previous.0]
        })
    }

    /// All nodes whose label is `label`, in construction order.
    pub fn nodes_with_label(&self, data: &FlameGraphData, label: LabelId) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.label_id(data) == label)
            .map(|(id, _)| id)
            .collect()
    }

    fn levels_are_ordered(&self) -> bool {
        self.levels.iter().all(|level| {
            level
                .iter()
                .tuple_windows()
                .all(|(a, b)| self.node(*a).start <= self.node(*b).start)
        })
    }
}

fn walked_from(nodes: &[Node], roots: &[WalkRoot]) -> Vec<Option<NodeId>> {
    let mut walked_from = vec![None; nodes.len()];
    for root in roots {
        let mut stack = vec![root.node];
        while let Some(id) = stack.pop() {
            for &next in nodes[id.0].next(root.direction) {
                walked_from[next.0] = Some(id);
                stack.push(next);
            }
        }
    }
    walked_from
}

// ----------------------------------------------------------------------------

/// Folds rows into a tree with an explicit stack of the open node per depth.
#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<Node>,
    levels: Vec<Vec<NodeId>>,
    roots: Vec<WalkRoot>,

    /// `open[d]` is the latest node at depth `d` that can still take children.
    open: Vec<NodeId>,

    /// Where the next child of each node starts, indexed like `nodes`.
    next_child_start: Vec<f64>,

    /// Where the next root-level node starts.
    next_root_start: f64,
}

impl TreeBuilder {
    fn push_row(&mut self, row: usize, level: usize, value: f64) {
        if self.open.len() < level {
            warn_once!("Flame graph data skips a level: some bars will be attached too high up");
        }
        // A row below a gap goes one level under the deepest open node.
        let level = level.min(self.open.len());
        self.open.truncate(level);

        let parent = self.open.last().copied();
        let start = match parent {
            Some(parent) => {
                let start = self.next_child_start[parent.0];
                let parent_node = &self.nodes[parent.0];
                if start + value > parent_node.stop() {
                    warn_once!("Flame graph children outweigh their parent: bars will overlap");
                }
                start
            }
            None => self.next_root_start,
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            start,
            value,
            level,
            row_refs: Vec1::new(row),
            children: Vec::new(),
            parents: parent.into_iter().collect(),
        });
        self.next_child_start.push(start);

        match parent {
            Some(parent) => {
                self.nodes[parent.0].children.push(id);
                self.next_child_start[parent.0] = self.nodes[id.0].stop();
            }
            None => {
                self.roots.push(WalkRoot {
                    node: id,
                    direction: Direction::Children,
                });
                self.next_root_start = self.nodes[id.0].stop();
            }
        }

        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(id);
        self.open.push(id);
    }

    fn finish(self) -> CallTree {
        let total_ticks = self.next_root_start;
        CallTree::from_parts(self.nodes, self.levels, self.roots, total_ticks)
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
fn tree_from(rows: &[(&str, f64, usize)]) -> (FlameGraphData, CallTree) {
    let data = FlameGraphData::new(
        rows.iter().map(|(label, _, _)| (*label).to_owned()).collect(),
        rows.iter().map(|(_, value, _)| *value).collect(),
        rows.iter().map(|(_, _, level)| *level).collect(),
        vec![0.0; rows.len()],
    )
    .unwrap();
    let tree = CallTree::from_data(&data);
    (data, tree)
}

#[test]
fn test_build_tree() {
    let (data, tree) = tree_from(&[
        ("total", 100.0, 0),
        ("a", 40.0, 1),
        ("aa", 30.0, 2),
        ("b", 50.0, 1),
        ("ba", 10.0, 2),
        ("bb", 20.0, 2),
        ("bba", 5.0, 3),
    ]);

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.depth(), 4);
    assert_eq!(tree.total_ticks(), 100.0);

    let root = tree.root().unwrap();
    assert_eq!(tree.node(root).children.len(), 2);

    let starts: Vec<Vec<f64>> = tree
        .levels()
        .iter()
        .map(|level| level.iter().map(|id| tree.node(*id).start).collect())
        .collect();
    assert_eq!(
        starts,
        vec![vec![0.0], vec![0.0, 40.0], vec![0.0, 40.0, 50.0], vec![50.0]]
    );

    let bba = tree.level(3).unwrap()[0];
    assert_eq!(data.label(tree.node(bba).first_row()), "bba");
    let ancestors: Vec<&str> = tree
        .ancestors(bba)
        .map(|id| data.label(tree.node(id).first_row()))
        .collect();
    assert_eq!(ancestors, ["bb", "b", "total"]);
}

#[test]
fn test_empty_tree() {
    let (_, tree) = tree_from(&[]);
    assert!(tree.is_empty());
    assert_eq!(tree.total_ticks(), 0.0);
    assert_eq!(tree.root(), None);
    assert_eq!(tree.level(0), None);
}

#[test]
fn test_malformed_rows_do_not_panic() {
    use crate::{LayoutOptions, PixelPos, Viewport};

    // Children outweigh the parent, and levels are skipped.
    let (data, tree) = tree_from(&[
        ("total", 10.0, 0),
        ("a", 8.0, 1),
        ("b", 8.0, 1),
        ("deep", 1.0, 3),
        ("deeper", 1.0, usize::MAX),
    ]);
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.depth(), 4);
    assert_eq!(tree.node(tree.level(1).unwrap()[1]).start, 8.0);

    let deep = tree.level(2).unwrap()[0];
    assert_eq!(data.label(tree.node(deep).first_row()), "deep");
    assert_eq!(tree.node(deep).start, 8.0);
    assert_eq!(tree.node(deep).level, 2);

    let deeper = tree.level(3).unwrap()[0];
    assert_eq!(tree.node(deeper).parents, [deep]);

    let viewport = Viewport::new(tree.total_ticks(), 100.0);
    let options = LayoutOptions::default();
    let mut visited = vec![];
    crate::layout(&tree, &data, &viewport, &options, |bar| visited.push(bar.node));
    assert_eq!(visited.len(), 5);

    for &id in &visited {
        let node = tree.node(id);
        let pos = PixelPos::new(
            (node.start + 0.5) * 10.0,
            (node.level as f64 + 0.5) * options.row_height,
        );
        let hit = crate::locate(&tree, &viewport, &options, pos);
        assert!(hit.is_some(), "{}", data.label(node.first_row()));
    }
}

#[test]
fn test_nodes_with_label() {
    let (data, tree) = tree_from(&[
        ("total", 10.0, 0),
        ("f", 4.0, 1),
        ("g", 2.0, 2),
        ("g", 6.0, 1),
    ]);
    let g = data.find_label("g").unwrap();
    let found = tree.nodes_with_label(&data, g);
    assert_eq!(found.len(), 2);
    assert_eq!(tree.node(found[0]).level, 2);
    assert_eq!(tree.node(found[1]).start, 4.0);
}
