#![allow(dead_code)]

use flame_layout::{CallTree, FlameGraphData, LayoutOptions, Viewport};

/// A bar as seen by the visitor, with the label copied out.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub level: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub collapsed: bool,
}

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Rows of `(label, value, level)` in depth-first pre-order. Self weights are derived.
pub fn profile(rows: &[(&str, f64, usize)]) -> (FlameGraphData, CallTree) {
    init_logging();

    let mut selfs: Vec<f64> = rows.iter().map(|(_, value, _)| *value).collect();
    for (row, (_, value, level)) in rows.iter().enumerate() {
        if let Some(parent) = rows[..row].iter().rposition(|(_, _, l)| l + 1 == *level) {
            selfs[parent] -= value;
        }
    }

    let data = FlameGraphData::new(
        rows.iter().map(|(label, _, _)| (*label).to_owned()).collect(),
        rows.iter().map(|(_, value, _)| *value).collect(),
        rows.iter().map(|(_, _, level)| *level).collect(),
        selfs,
    )
    .unwrap();
    let tree = CallTree::from_data(&data);
    (data, tree)
}

pub fn collect_bars(
    tree: &CallTree,
    data: &FlameGraphData,
    viewport: &Viewport,
    options: &LayoutOptions,
) -> Vec<Bar> {
    let mut bars = vec![];
    flame_layout::layout(tree, data, viewport, options, |bar| {
        bars.push(Bar {
            label: bar.label.to_owned(),
            level: tree.node(bar.node).level,
            x: bar.x,
            y: bar.y,
            width: bar.width,
            height: bar.height,
            collapsed: bar.collapsed,
        });
    });
    bars
}

/// A deterministic, well-formed profile with integer weights.
pub fn synthetic_rows(seed: u64, max_depth: usize) -> Vec<(String, f64, usize)> {
    fn next(state: &mut u64) -> u64 {
        *state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        *state >> 33
    }

    fn grow(
        rows: &mut Vec<(String, f64, usize)>,
        state: &mut u64,
        value: u64,
        level: usize,
        max_depth: usize,
    ) {
        let name = format!("fn_{}", next(state) % 12);
        rows.push((name, value as f64, level));
        if level + 1 >= max_depth || value < 2 {
            return;
        }

        let mut remaining = value - next(state) % (value / 2 + 1);
        let num_children = next(state) % 4;
        for _ in 0..num_children {
            if remaining == 0 {
                break;
            }
            let child = 1 + next(state) % remaining;
            grow(rows, state, child, level + 1, max_depth);
            remaining -= child;
        }
    }

    let mut rows = vec![];
    let mut state = seed;
    grow(&mut rows, &mut state, 10_000, 0, max_depth);
    rows
}

pub fn synthetic_profile(seed: u64, max_depth: usize) -> (FlameGraphData, CallTree) {
    let rows = synthetic_rows(seed, max_depth);
    let rows: Vec<(&str, f64, usize)> = rows
        .iter()
        .map(|(label, value, level)| (label.as_str(), *value, *level))
        .collect();
    profile(&rows)
}
