//! The sandwich view: everything around one function.
//!
//! For a chosen label the view shows, stacked on top of each other:
//!
//! * the callers: every call path leading to the function, merged by label and
//!   drawn upside down, so the function itself is the bottom row,
//! * an empty row,
//! * the callees: everything the function calls, merged by label, rooted at the
//!   function.
//!
//! Both halves are packed into one [`CallTree`] so layout and lookup work on it
//! unchanged.

use std::collections::VecDeque;

use indexmap::IndexMap;
use indexmap::map::Entry;
use vec1::Vec1;

use crate::{CallTree, Direction, FlameGraphData, LabelId, Node, NodeId, WalkRoot};

/// A node of the source tree, carrying the weight it contributes to the merge.
#[derive(Clone, Copy, Debug)]
struct Piece {
    node: NodeId,
    value: f64,
}

/// Pieces merged into one node of the new tree.
struct Pending {
    previous: Option<NodeId>,
    pieces: Vec1<Piece>,
    level: usize,
}

/// One half of a sandwich, before the halves are stacked.
#[derive(Default)]
struct Merged {
    nodes: Vec<Node>,
    levels: Vec<Vec<NodeId>>,
}

impl CallTree {
    /// Build the sandwich view of `label`, or `None` if no node carries it.
    ///
    /// When the function is recursive only the outermost calls are used,
    /// since the inner ones are already part of their weight.
    pub fn sandwich(&self, data: &FlameGraphData, label: &str) -> Option<Self> {
        let label = data.find_label(label)?;
        let matches = self.outermost_with_label(data, label);
        let (&first, rest) = matches.split_first()?;

        let mut pieces = Vec1::new(self.piece(first));
        for &node in rest {
            pieces.push(self.piece(node));
        }

        let mut callers = merge_pieces(self, data, pieces.clone(), Direction::Parents);
        callers.levels.reverse();
        let num_caller_levels = callers.levels.len();
        for (level, ids) in callers.levels.iter().enumerate() {
            for id in ids {
                callers.nodes[id.index()].level = level;
            }
        }

        let callees = merge_pieces(self, data, pieces, Direction::Children);
        let callee_offset = callers.nodes.len();
        let level_offset = num_caller_levels + 1;
        let total_ticks = callees.nodes.first().map_or(0.0, |root| root.value);

        let shift = |id: NodeId| NodeId::from_index(id.index() + callee_offset);

        let mut nodes = callers.nodes;
        nodes.extend(callees.nodes.into_iter().map(|mut node| {
            node.level += level_offset;
            node.children = node.children.into_iter().map(shift).collect();
            node.parents = node.parents.into_iter().map(shift).collect();
            node
        }));

        let mut levels = callers.levels;
        levels.push(Vec::new());
        levels.extend(
            callees
                .levels
                .into_iter()
                .map(|level| level.into_iter().map(shift).collect()),
        );

        // The first node created in each half is the merged function itself:
        let roots = vec![
            WalkRoot {
                node: NodeId::from_index(0),
                direction: Direction::Parents,
            },
            WalkRoot {
                node: NodeId::from_index(callee_offset),
                direction: Direction::Children,
            },
        ];

        log::debug!(
            "Sandwich of {:?}: {} matches, {} caller levels, {} nodes",
            data.label_text(label),
            matches.len(),
            num_caller_levels,
            nodes.len()
        );

        Some(Self::from_parts(nodes, levels, roots, total_ticks))
    }

    /// Nodes with this label that aren't nested inside another node with it.
    fn outermost_with_label(&self, data: &FlameGraphData, label: LabelId) -> Vec<NodeId> {
        self.nodes_with_label(data, label)
            .into_iter()
            .filter(|&id| {
                !self
                    .ancestors(id)
                    .any(|ancestor| self.node(ancestor).label_id(data) == label)
            })
            .collect()
    }

    fn piece(&self, node: NodeId) -> Piece {
        Piece {
            node,
            value: self.node(node).value,
        }
    }
}

/// Breadth-first merge of the pieces and everything reachable from them in `direction`.
///
/// Pieces reached from the same merged node are grouped by label. A merged node weighs
/// as much as its pieces together, and its children are laid out contiguously from its
/// start. Walking parents, every ancestor weighs as much as the piece it was reached
/// from, so a caller is only credited with the time it spent calling the function.
fn merge_pieces(
    tree: &CallTree,
    data: &FlameGraphData,
    roots: Vec1<Piece>,
    direction: Direction,
) -> Merged {
    let mut merged = Merged::default();
    let mut queue = VecDeque::from([Pending {
        previous: None,
        pieces: roots,
        level: 0,
    }]);

    while let Some(pending) = queue.pop_front() {
        let id = NodeId::from_index(merged.nodes.len());
        let value = pending.pieces.iter().map(|piece| piece.value).sum::<f64>();

        let mut row_refs = tree.node(pending.pieces.first().node).row_refs.clone();
        for piece in pending.pieces.iter().skip(1) {
            for &row in &tree.node(piece.node).row_refs {
                row_refs.push(row);
            }
        }

        let start = match pending.previous {
            Some(previous) => {
                let previous = &merged.nodes[previous.index()];
                previous
                    .next(direction)
                    .last()
                    .map_or(previous.start, |&sibling| merged.nodes[sibling.index()].stop())
            }
            None => 0.0,
        };

        let mut node = Node {
            start,
            value,
            level: pending.level,
            row_refs,
            children: Vec::new(),
            parents: Vec::new(),
        };
        if let Some(previous) = pending.previous {
            match direction {
                Direction::Children => {
                    node.parents.push(previous);
                    merged.nodes[previous.index()].children.push(id);
                }
                Direction::Parents => {
                    node.children.push(previous);
                    merged.nodes[previous.index()].parents.push(id);
                }
            }
        }
        merged.nodes.push(node);

        if merged.levels.len() <= pending.level {
            merged.levels.resize_with(pending.level + 1, Vec::new);
        }
        merged.levels[pending.level].push(id);

        let mut groups: IndexMap<LabelId, Vec1<Piece>> = IndexMap::new();
        for piece in &pending.pieces {
            for &next in tree.node(piece.node).next(direction) {
                let next_piece = match direction {
                    Direction::Children => tree.piece(next),
                    Direction::Parents => Piece {
                        node: next,
                        value: piece.value,
                    },
                };
                match groups.entry(tree.node(next).label_id(data)) {
                    Entry::Occupied(mut entry) => entry.get_mut().push(next_piece),
                    Entry::Vacant(entry) => {
                        entry.insert(Vec1::new(next_piece));
                    }
                }
            }
        }

        queue.extend(groups.into_values().map(|pieces| Pending {
            previous: Some(id),
            pieces,
            level: pending.level + 1,
        }));
    }

    merged
}
