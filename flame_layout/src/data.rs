//! The columnar profile store.
//!
//! A profile arrives as parallel columns, one row per call-tree node, in depth-first
//! pre-order:
//!
//! ```ignore
//!    label        str     Function name
//!    value        f64     Total weight of the node, including children
//!    level        usize   Depth from the root (root = 0)
//!    self         f64     Weight spent in the node itself
//!    valueRight   f64     Optional: total weight on the right side of a diff
//!    selfRight    f64     Optional: self weight on the right side of a diff
//! ```
//!
//! Labels are interned, so rows with the same function name share a [`LabelId`].

use anyhow::Context as _;
use indexmap::IndexSet;

/// Index of a unique label in a [`FlameGraphData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LabelId(usize);

impl LabelId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors that can happen when building a [`FlameGraphData`] from columns.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A required column was not provided.
    MissingColumn(&'static str),
    /// A column has a different number of rows than the `label` column.
    ColumnLength {
        column: &'static str,
        expected: usize,
        found: usize,
    },
    /// A column holds the wrong kind of values, e.g. strings where numbers were expected.
    ColumnType {
        column: String,
        expected: &'static str,
    },
    /// A weight is negative or not finite, or a level is not a whole non-negative number.
    InvalidValue {
        column: &'static str,
        row: usize,
        value: f64,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "missing column {column:?}"),
            Self::ColumnLength {
                column,
                expected,
                found,
            } => write!(
                f,
                "column {column:?} has {found} rows, expected {expected}"
            ),
            Self::ColumnType { column, expected } => {
                write!(f, "column {column:?} should hold {expected}")
            }
            Self::InvalidValue { column, row, value } => {
                write!(f, "invalid value {value} in column {column:?} at row {row}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Custom result type for building profile data.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct DiffColumns {
    values_right: Vec<f64>,
    selfs_right: Vec<f64>,
}

/// Read-only, row-indexed profile data backing a flame graph.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FlameGraphData {
    /// Unique labels, in order of first appearance.
    label_table: IndexSet<String>,
    labels: Vec<LabelId>,
    values: Vec<f64>,
    levels: Vec<usize>,
    selfs: Vec<f64>,
    diff: Option<DiffColumns>,
}

impl FlameGraphData {
    /// Build from the four required columns. All columns must have the same length.
    ///
    /// # Errors
    /// If the lengths differ, or a weight is negative or not finite.
    pub fn new(
        labels: Vec<String>,
        values: Vec<f64>,
        levels: Vec<usize>,
        selfs: Vec<f64>,
    ) -> Result<Self> {
        let num_rows = labels.len();
        check_len("value", num_rows, values.len())?;
        check_len("level", num_rows, levels.len())?;
        check_len("self", num_rows, selfs.len())?;
        check_weights("value", &values)?;
        check_weights("self", &selfs)?;

        let mut label_table = IndexSet::with_capacity(num_rows);
        let labels = labels
            .into_iter()
            .map(|label| LabelId(label_table.insert_full(label).0))
            .collect();

        Ok(Self {
            label_table,
            labels,
            values,
            levels,
            selfs,
            diff: None,
        })
    }

    /// Attach the right-hand columns of a differential profile.
    ///
    /// # Errors
    /// Same as [`Self::new`].
    pub fn with_diff(mut self, values_right: Vec<f64>, selfs_right: Vec<f64>) -> Result<Self> {
        check_len("valueRight", self.len(), values_right.len())?;
        check_len("selfRight", self.len(), selfs_right.len())?;
        check_weights("valueRight", &values_right)?;
        check_weights("selfRight", &selfs_right)?;
        self.diff = Some(DiffColumns {
            values_right,
            selfs_right,
        });
        Ok(self)
    }

    /// Build from named fields, the way a data frame hands them over.
    ///
    /// Recognized names are `label`, `value`, `level`, `self`, `valueRight` and `selfRight`.
    /// Other fields are ignored.
    ///
    /// # Errors
    /// If a required field is missing or has the wrong type, or the columns don't
    /// pass [`Self::new`]. Diff fields must come in pairs.
    pub fn from_fields(fields: Vec<Field>) -> anyhow::Result<Self> {
        let mut labels = None;
        let mut values = None;
        let mut levels = None;
        let mut selfs = None;
        let mut values_right = None;
        let mut selfs_right = None;

        for field in fields {
            let name = field.name.clone();
            match name.as_str() {
                "label" => labels = Some(field.into_strings()?),
                "value" => values = Some(field.into_numbers()?),
                "level" => levels = Some(field.into_numbers()?),
                "self" => selfs = Some(field.into_numbers()?),
                "valueRight" => values_right = Some(field.into_numbers()?),
                "selfRight" => selfs_right = Some(field.into_numbers()?),
                _ => {}
            }
        }

        let labels = labels.ok_or(Error::MissingColumn("label"))?;
        let values = values.ok_or(Error::MissingColumn("value"))?;
        let levels = levels.ok_or(Error::MissingColumn("level"))?;
        let selfs = selfs.ok_or(Error::MissingColumn("self"))?;
        let levels = levels_from_numbers(&levels)?;

        let data = Self::new(labels, values, levels, selfs).context("Building flame graph data")?;

        match (values_right, selfs_right) {
            (Some(values_right), Some(selfs_right)) => data
                .with_diff(values_right, selfs_right)
                .context("Attaching diff columns"),
            (None, None) => Ok(data),
            (Some(_), None) => Err(Error::MissingColumn("selfRight").into()),
            (None, Some(_)) => Err(Error::MissingColumn("valueRight").into()),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Is this a differential profile with right-hand columns?
    pub fn is_diff(&self) -> bool {
        self.diff.is_some()
    }

    #[inline]
    pub fn label_id(&self, row: usize) -> LabelId {
        self.labels[row]
    }

    /// The function name of a row.
    #[inline]
    pub fn label(&self, row: usize) -> &str {
        self.label_text(self.labels[row])
    }

    pub fn label_text(&self, id: LabelId) -> &str {
        self.label_table
            .get_index(id.0)
            .map_or("", String::as_str)
    }

    /// Look up the id of a label, if any row carries it.
    pub fn find_label(&self, label: &str) -> Option<LabelId> {
        self.label_table.get_index_of(label).map(LabelId)
    }

    /// All unique labels, in order of first appearance.
    pub fn unique_labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.label_table.iter().map(String::as_str)
    }

    #[inline]
    pub fn value(&self, row: usize) -> f64 {
        self.values[row]
    }

    #[inline]
    pub fn level(&self, row: usize) -> usize {
        self.levels[row]
    }

    #[inline]
    pub fn self_value(&self, row: usize) -> f64 {
        self.selfs[row]
    }

    pub fn value_right(&self, row: usize) -> Option<f64> {
        self.diff.as_ref().map(|diff| diff.values_right[row])
    }

    pub fn self_right(&self, row: usize) -> Option<f64> {
        self.diff.as_ref().map(|diff| diff.selfs_right[row])
    }

    /// Sum of `value` over several rows, e.g. the rows merged into one sandwich node.
    pub fn value_of(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&row| self.values[row]).sum()
    }

    /// Sum of `self` over several rows.
    pub fn self_of(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&row| self.selfs[row]).sum()
    }
}

// ----------------------------------------------------------------------------

/// The values of one named [`Field`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValues {
    Strings(Vec<String>),
    Numbers(Vec<f64>),
}

/// One named column of a data frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub values: FieldValues,
}

impl Field {
    pub fn strings(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Strings(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn numbers(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            values: FieldValues::Numbers(values.into_iter().collect()),
        }
    }

    fn into_strings(self) -> Result<Vec<String>> {
        match self.values {
            FieldValues::Strings(values) => Ok(values),
            FieldValues::Numbers(_) => Err(Error::ColumnType {
                column: self.name,
                expected: "strings",
            }),
        }
    }

    fn into_numbers(self) -> Result<Vec<f64>> {
        match self.values {
            FieldValues::Numbers(values) => Ok(values),
            FieldValues::Strings(_) => Err(Error::ColumnType {
                column: self.name,
                expected: "numbers",
            }),
        }
    }
}

fn check_len(column: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ColumnLength {
            column,
            expected,
            found,
        })
    }
}

fn check_weights(column: &'static str, weights: &[f64]) -> Result<()> {
    match weights
        .iter()
        .position(|weight| !weight.is_finite() || *weight < 0.0)
    {
        Some(row) => Err(Error::InvalidValue {
            column,
            row,
            value: weights[row],
        }),
        None => Ok(()),
    }
}

#[expect(clippy::cast_possible_truncation)]
fn levels_from_numbers(levels: &[f64]) -> Result<Vec<usize>> {
    levels
        .iter()
        .enumerate()
        .map(|(row, &level)| {
            if level.is_finite() && level >= 0.0 && level.fract() == 0.0 {
                Ok(level as usize)
            } else {
                Err(Error::InvalidValue {
                    column: "level",
                    row,
                    value: level,
                })
            }
        })
        .collect()
}

// ----------------------------------------------------------------------------

#[test]
fn test_interned_labels() {
    let data = FlameGraphData::new(
        vec!["total".into(), "main".into(), "work".into(), "main".into()],
        vec![10.0, 4.0, 2.0, 6.0],
        vec![0, 1, 2, 1],
        vec![0.0, 2.0, 2.0, 6.0],
    )
    .unwrap();

    assert_eq!(data.len(), 4);
    assert_eq!(data.label(3), "main");
    assert_eq!(data.label_id(1), data.label_id(3));
    assert_eq!(
        data.unique_labels().collect::<Vec<_>>(),
        ["total", "main", "work"]
    );
    assert_eq!(data.find_label("work"), Some(data.label_id(2)));
    assert_eq!(data.find_label("nope"), None);
    assert_eq!(data.value_of(&[1, 3]), 10.0);
    assert_eq!(data.self_of(&[1, 3]), 8.0);
    assert!(!data.is_diff());
    assert_eq!(data.value_right(0), None);
}

#[test]
fn test_column_errors() {
    let err = FlameGraphData::new(
        vec!["a".into(), "b".into()],
        vec![1.0],
        vec![0, 1],
        vec![0.0, 1.0],
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::ColumnLength {
            column: "value",
            expected: 2,
            found: 1
        }
    );

    let err = FlameGraphData::new(vec!["a".into()], vec![-1.0], vec![0], vec![0.0]).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { column: "value", row: 0, .. }));
}

#[test]
fn test_from_fields() {
    let data = FlameGraphData::from_fields(vec![
        Field::strings("label", ["total", "a"]),
        Field::numbers("level", [0.0, 1.0]),
        Field::numbers("value", [3.0, 2.0]),
        Field::numbers("self", [1.0, 2.0]),
        Field::numbers("valueRight", [5.0, 1.0]),
        Field::numbers("selfRight", [4.0, 1.0]),
        Field::strings("ignored", ["x", "y"]),
    ])
    .unwrap();
    assert!(data.is_diff());
    assert_eq!(data.level(1), 1);
    assert_eq!(data.value_right(0), Some(5.0));
    assert_eq!(data.self_right(1), Some(1.0));

    let err = FlameGraphData::from_fields(vec![
        Field::strings("label", ["total"]),
        Field::numbers("value", [3.0]),
        Field::numbers("self", [3.0]),
    ])
    .unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::MissingColumn("level"))
    );

    let err = FlameGraphData::from_fields(vec![
        Field::strings("label", ["total"]),
        Field::numbers("value", [3.0]),
        Field::numbers("level", [0.5]),
        Field::numbers("self", [3.0]),
    ])
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InvalidValue { column: "level", .. })
    ));
}
