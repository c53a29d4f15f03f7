//! Per-function totals: the numbers behind a "top functions" table.

use indexmap::IndexMap;

use crate::{FlameGraphData, LabelId};

/// Aggregated weights of all rows sharing one label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelStats<'d> {
    pub label: &'d str,

    /// Number of rows (call paths) with this label.
    pub count: usize,

    /// Sum of self weight.
    pub self_value: f64,

    /// Sum of total weight. Recursive calls are only counted once,
    /// at the outermost call.
    pub total_value: f64,

    /// Self weight on the right side of a diff profile.
    pub self_right: Option<f64>,

    /// Total weight on the right side of a diff profile.
    pub total_right: Option<f64>,
}

/// Sum up self and total weight per label, in order of first appearance.
pub fn label_stats(data: &FlameGraphData) -> Vec<LabelStats<'_>> {
    let mut stats: IndexMap<LabelId, LabelStats<'_>> = IndexMap::new();

    // Labels of the current call stack, root first.
    let mut stack: Vec<LabelId> = Vec::new();

    for row in 0..data.len() {
        let label = data.label_id(row);
        stack.truncate(data.level(row));
        let is_recursive = stack.contains(&label);
        stack.push(label);

        let entry = stats.entry(label).or_insert_with(|| LabelStats {
            label: data.label_text(label),
            count: 0,
            self_value: 0.0,
            total_value: 0.0,
            self_right: data.is_diff().then_some(0.0),
            total_right: data.is_diff().then_some(0.0),
        });

        entry.count += 1;
        entry.self_value += data.self_value(row);
        add_to(&mut entry.self_right, data.self_right(row));
        if !is_recursive {
            entry.total_value += data.value(row);
            add_to(&mut entry.total_right, data.value_right(row));
        }
    }

    stats.into_values().collect()
}

fn add_to(sum: &mut Option<f64>, value: Option<f64>) {
    if let (Some(sum), Some(value)) = (sum, value) {
        *sum += value;
    }
}

// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SortBy {
    Total,
    SelfTime,
    Name,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Sorting {
    pub sort_by: SortBy,
    pub reversed: bool,
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Total,
            reversed: false,
        }
    }
}

impl Sorting {
    /// Heaviest first, or names in natural order. `reversed` flips either.
    pub fn sort<'d>(self, mut stats: Vec<LabelStats<'d>>) -> Vec<LabelStats<'d>> {
        match self.sort_by {
            SortBy::Total => {
                stats.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
            }
            SortBy::SelfTime => {
                stats.sort_by(|a, b| b.self_value.total_cmp(&a.self_value));
            }
            SortBy::Name => {
                stats.sort_by(|a, b| natord::compare_ignore_case(a.label, b.label));
            }
        }
        if self.reversed {
            stats.reverse();
        }
        stats
    }
}

// ----------------------------------------------------------------------------

#[test]
fn test_label_stats() {
    let data = FlameGraphData::new(
        ["total", "f", "f", "g", "g"].map(String::from).to_vec(),
        vec![10.0, 6.0, 2.0, 2.0, 4.0],
        vec![0, 1, 2, 3, 1],
        vec![0.0, 4.0, 0.0, 2.0, 4.0],
    )
    .unwrap();

    let stats = label_stats(&data);
    let f = stats.iter().find(|s| s.label == "f").unwrap();
    assert_eq!(f.count, 2);
    assert_eq!(f.self_value, 4.0);
    assert_eq!(f.total_value, 6.0, "recursive call is inside the outer one");
    assert_eq!(f.self_right, None);

    let g = stats.iter().find(|s| s.label == "g").unwrap();
    assert_eq!(g.count, 2);
    assert_eq!(g.total_value, 6.0);
    assert_eq!(g.self_value, 6.0);

    let by_total = Sorting::default().sort(stats.clone());
    assert_eq!(by_total[0].label, "total");

    let by_self = Sorting {
        sort_by: SortBy::SelfTime,
        reversed: false,
    }
    .sort(stats.clone());
    assert_eq!(by_self[0].label, "g");

    let by_name = Sorting {
        sort_by: SortBy::Name,
        reversed: true,
    }
    .sort(stats);
    let names: Vec<&str> = by_name.iter().map(|s| s.label).collect();
    assert_eq!(names, ["total", "g", "f"]);
}

#[test]
fn test_diff_stats() {
    let data = FlameGraphData::new(
        vec!["total".into(), "a".into()],
        vec![5.0, 3.0],
        vec![0, 1],
        vec![2.0, 3.0],
    )
    .unwrap()
    .with_diff(vec![7.0, 1.0], vec![6.0, 1.0])
    .unwrap();

    let stats = label_stats(&data);
    assert_eq!(stats[0].total_right, Some(7.0));
    assert_eq!(stats[1].self_right, Some(1.0));
}
