mod common;

use common::{Bar, collect_bars, profile, synthetic_profile};
use flame_layout::{CallTree, Field, FlameGraphData, LayoutOptions, PixelPos, Viewport, locate};

fn bar(label: &str, level: usize, x: f64, width: f64, collapsed: bool) -> Bar {
    Bar {
        label: label.to_owned(),
        level,
        x,
        y: level as f64 * 22.0,
        width,
        height: 22.0,
        collapsed,
    }
}

#[test]
fn single_full_width_node() {
    let (data, tree) = profile(&[("1", 100.0, 0)]);
    let bars = collect_bars(
        &tree,
        &data,
        &Viewport::new(tree.total_ticks(), 100.0),
        &LayoutOptions::default(),
    );
    assert_eq!(bars, vec![bar("1", 0, 0.0, 99.0, false)]); // -1 for border
}

#[test]
fn siblings_partition_their_parent() {
    let (data, tree) = profile(&[("1", 100.0, 0), ("2", 50.0, 1), ("3", 50.0, 1)]);
    let bars = collect_bars(
        &tree,
        &data,
        &Viewport::new(100.0, 100.0),
        &LayoutOptions::default(),
    );
    assert_eq!(
        bars,
        vec![
            bar("1", 0, 0.0, 99.0, false),
            bar("2", 1, 0.0, 49.0, false),
            bar("3", 1, 50.0, 49.0, false),
        ]
    );
    assert!(bars[1].x + bars[1].width < bars[2].x);
    assert_eq!(bars[1].width + bars[2].width, bars[0].width - 1.0);
}

#[test]
fn narrow_bars_are_collapsed() {
    let (data, tree) = profile(&[("1", 100.0, 0), ("2", 1.0, 1), ("3", 1.0, 1)]);
    let bars = collect_bars(
        &tree,
        &data,
        &Viewport::new(100.0, 100.0),
        &LayoutOptions::default(),
    );
    assert_eq!(
        bars,
        vec![
            bar("1", 0, 0.0, 99.0, false),
            bar("2", 1, 0.0, 1.0, true),
            bar("3", 1, 1.0, 1.0, true),
        ]
    );
}

#[test]
fn collapse_threshold_is_configurable() {
    let (data, tree) = profile(&[("1", 100.0, 0), ("2", 20.0, 1)]);
    let viewport = Viewport::new(100.0, 100.0);

    let bars = collect_bars(&tree, &data, &viewport, &LayoutOptions::default());
    assert!(!bars[1].collapsed);

    let options = LayoutOptions {
        collapse_threshold: 30.0,
        ..Default::default()
    };
    let bars = collect_bars(&tree, &data, &viewport, &options);
    assert!(bars[1].collapsed);
    assert_eq!(bars[1].width, 20.0);
}

#[test]
fn too_small_bars_are_skipped_with_their_children() {
    let (data, tree) = profile(&[
        ("1", 100.0, 0),
        ("2", 0.1, 1),
        ("2a", 0.1, 2),
        ("3", 0.1, 1),
        ("4", 50.0, 1),
        ("4a", 0.2, 2),
    ]);
    let bars = collect_bars(
        &tree,
        &data,
        &Viewport::new(100.0, 100.0),
        &LayoutOptions::default(),
    );
    let labels: Vec<&str> = bars.iter().map(|bar| bar.label.as_str()).collect();
    assert_eq!(labels, ["1", "4"]);
}

#[test]
fn visits_parents_before_children() {
    let (data, tree) = profile(&[
        ("root", 100.0, 0),
        ("a", 40.0, 1),
        ("aa", 20.0, 2),
        ("ab", 20.0, 2),
        ("b", 60.0, 1),
        ("ba", 60.0, 2),
    ]);
    let bars = collect_bars(
        &tree,
        &data,
        &Viewport::new(100.0, 1000.0),
        &LayoutOptions::default(),
    );
    let labels: Vec<&str> = bars.iter().map(|bar| bar.label.as_str()).collect();
    assert_eq!(labels, ["root", "a", "aa", "ab", "b", "ba"]);
    assert_eq!(bars[3].x, 200.0);
    assert_eq!(bars[4].x, 400.0);
    assert_eq!(bars[5].y, 44.0);
}

#[test]
fn layout_is_idempotent() {
    let (data, tree) = synthetic_profile(7, 12);
    let viewport = Viewport::new(tree.total_ticks(), 1234.0).with_range(0.1, 0.8);
    let options = LayoutOptions::default();

    let first = collect_bars(&tree, &data, &viewport, &options);
    let second = collect_bars(&tree, &data, &viewport, &options);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn zooming_scales_bars_and_culls_outside() {
    let (data, tree) = profile(&[
        ("root", 100.0, 0),
        ("a", 50.0, 1),
        ("b", 50.0, 1),
        ("ba", 25.0, 2),
    ]);
    let options = LayoutOptions::default();
    let full = Viewport::new(100.0, 100.0);

    let bars = collect_bars(&tree, &data, &full, &options);
    let ba = bars.iter().find(|bar| bar.label == "ba").unwrap();
    assert_eq!((ba.x, ba.width), (50.0, 24.0));

    let zoomed = full.with_range(0.5, 1.0);
    let bars = collect_bars(&tree, &data, &zoomed, &options);
    let labels: Vec<&str> = bars.iter().map(|bar| bar.label.as_str()).collect();
    assert_eq!(labels, ["root", "b", "ba"]);

    let ba = bars.iter().find(|bar| bar.label == "ba").unwrap();
    assert_eq!(ba.x, 0.0);
    assert_eq!(ba.width, 25.0 * 2.0 - 1.0);

    let root = &bars[0];
    assert_eq!(root.x, -100.0);
}

#[test]
fn degenerate_viewports_visit_nothing() {
    let (data, tree) = profile(&[("root", 100.0, 0), ("a", 50.0, 1)]);
    let options = LayoutOptions::default();

    for viewport in [
        Viewport::new(100.0, 0.0),
        Viewport::new(100.0, -10.0),
        Viewport::new(0.0, 100.0),
        Viewport::new(100.0, 100.0).with_range(0.3, 0.3),
        Viewport::new(100.0, 100.0).with_range(0.6, 0.2),
    ] {
        assert!(
            collect_bars(&tree, &data, &viewport, &options).is_empty(),
            "{viewport:?}"
        );
    }

    let (data, tree) = profile(&[]);
    let viewport = Viewport::new(tree.total_ticks(), 100.0);
    assert!(collect_bars(&tree, &data, &viewport, &options).is_empty());
}

#[test]
fn rendered_levels_counts_visible_rows() {
    let (data, tree) = profile(&[
        ("root", 1000.0, 0),
        ("a", 900.0, 1),
        ("b", 1.0, 1),
        ("ba", 1.0, 2),
        ("baa", 1.0, 3),
    ]);
    let options = LayoutOptions::default();

    let wide = Viewport::new(1000.0, 1000.0);
    assert_eq!(flame_layout::rendered_levels(&tree, &data, &wide, &options), 4);

    let narrow = Viewport::new(1000.0, 100.0);
    assert_eq!(flame_layout::rendered_levels(&tree, &data, &narrow, &options), 2);
}

#[test]
fn large_depth_gaps_are_closed() {
    common::init_logging();

    let data = FlameGraphData::from_fields(vec![
        Field::strings("label", ["root", "deep", "deeper"]),
        Field::numbers("value", [100.0, 50.0, 20.0]),
        Field::numbers("level", [0.0, 1e9, 4e9]),
        Field::numbers("self", [50.0, 30.0, 20.0]),
    ])
    .unwrap();
    let tree = CallTree::from_data(&data);
    assert_eq!(tree.depth(), 3);

    let viewport = Viewport::new(tree.total_ticks(), 100.0);
    let options = LayoutOptions::default();
    let bars = collect_bars(&tree, &data, &viewport, &options);
    assert_eq!(
        bars,
        vec![
            bar("root", 0, 0.0, 99.0, false),
            bar("deep", 1, 0.0, 49.0, false),
            bar("deeper", 2, 0.0, 19.0, false),
        ]
    );

    let hit = locate(&tree, &viewport, &options, PixelPos::new(10.0, 50.0)).unwrap();
    assert_eq!(data.label(tree.node(hit.node).first_row()), "deeper");
    assert_eq!(hit.level_index, 2);
}
