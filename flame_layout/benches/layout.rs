use criterion::{Criterion, criterion_group, criterion_main};
use flame_layout::{CallTree, FlameGraphData, LayoutOptions, PixelPos, Viewport};

/// A wide and deep profile: `fanout` children per node, `depth` levels.
fn profile(fanout: usize, depth: usize) -> FlameGraphData {
    fn grow(
        labels: &mut Vec<String>,
        values: &mut Vec<f64>,
        levels: &mut Vec<usize>,
        value: f64,
        level: usize,
        fanout: usize,
        depth: usize,
    ) {
        labels.push(format!("function_{}", (labels.len() * 7) % 97));
        values.push(value);
        levels.push(level);
        if level + 1 < depth {
            for _ in 0..fanout {
                grow(labels, values, levels, value / fanout as f64 * 0.9, level + 1, fanout, depth);
            }
        }
    }

    let (mut labels, mut values, mut levels) = (vec![], vec![], vec![]);
    grow(&mut labels, &mut values, &mut levels, 1e9, 0, fanout, depth);
    let selfs = vec![0.0; labels.len()];
    FlameGraphData::new(labels, values, levels, selfs).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let data = profile(4, 9);
    let options = LayoutOptions::default();

    c.bench_function("build_tree", |b| {
        b.iter(|| CallTree::from_data(&data));
    });

    let tree = CallTree::from_data(&data);
    let viewport = Viewport::new(tree.total_ticks(), 2560.0);

    c.bench_function("layout", |b| {
        b.iter(|| {
            let mut num_bars = 0;
            flame_layout::layout(&tree, &data, &viewport, &options, |_| num_bars += 1);
            num_bars
        });
    });

    c.bench_function("layout_zoomed", |b| {
        let viewport = viewport.with_range(0.3, 0.35);
        b.iter(|| {
            let mut num_bars = 0;
            flame_layout::layout(&tree, &data, &viewport, &options, |_| num_bars += 1);
            num_bars
        });
    });

    c.bench_function("locate", |b| {
        b.iter(|| {
            (0..100)
                .filter_map(|i| {
                    let pos = PixelPos::new(f64::from(i) * 25.6, f64::from(i % 9) * 22.0 + 1.0);
                    flame_layout::locate(&tree, &viewport, &options, pos)
                })
                .count()
        });
    });

    c.bench_function("sandwich", |b| {
        b.iter(|| tree.sandwich(&data, "function_42"));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
