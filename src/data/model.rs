use crate::error::PlotError;

// ---------------------------------------------------------------------------
// Column – one named numeric column of the CSV
// ---------------------------------------------------------------------------

/// A named column of numeric values. Missing cells are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded table, columns in file order.
///
/// Columns are expected to come in adjacent (wavelength, signal) pairs.
/// An odd trailing column is tolerated and ignored by [`Dataset::traces`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (length of the longest column).
    pub fn height(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    /// Number of traces the pairing convention yields: `floor(columns / 2)`.
    pub fn trace_count(&self) -> usize {
        self.columns.len() / 2
    }

    /// Whether the last column has no partner.
    pub fn has_unpaired_column(&self) -> bool {
        self.columns.len() % 2 == 1
    }

    /// Lazily pair columns `(0, 1), (2, 3), ...` into traces.
    ///
    /// Each item fails independently when its signal header carries no
    /// delay-time label.
    pub fn traces(&self) -> impl Iterator<Item = Result<Trace<'_>, PlotError>> + '_ {
        self.columns
            .chunks_exact(2)
            .enumerate()
            .map(|(index, pair)| {
                let (wavelength, signal) = (&pair[0], &pair[1]);
                let label = delay_label(&signal.name).ok_or_else(|| {
                    PlotError::MalformedInput(format!(
                        "column {} header {:?} has no delay-time label \
                         (expected e.g. \"Signal, 5ps\")",
                        2 * index + 1,
                        signal.name
                    ))
                })?;
                Ok(Trace {
                    index,
                    label,
                    wavelength,
                    signal,
                })
            })
    }
}

/// Collect all traces of a dataset, failing on the first unlabeled one.
pub fn extract_traces(dataset: &Dataset) -> Result<Vec<Trace<'_>>, PlotError> {
    dataset.traces().collect()
}

/// Delay-time label encoded in a signal header: the second comma-separated
/// token, trimmed. `"Signal, 5ps"` → `"5ps"`.
pub fn delay_label(header: &str) -> Option<&str> {
    header.split(',').nth(1).map(str::trim)
}

// ---------------------------------------------------------------------------
// Trace – one (wavelength, signal) column pair
// ---------------------------------------------------------------------------

/// A borrowed view of one column pair, in file order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace<'a> {
    /// Position among the dataset's traces (0-based).
    pub index: usize,
    /// Delay time taken from the signal header.
    pub label: &'a str,
    pub wavelength: &'a Column,
    pub signal: &'a Column,
}

impl<'a> Trace<'a> {
    /// Rows where both wavelength and signal are present, split into
    /// `(x, y)` vectors of equal length.
    pub fn samples(&self) -> (Vec<f64>, Vec<f64>) {
        self.wavelength
            .values
            .iter()
            .zip(&self.signal.values)
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .map(|(&x, &y)| (x, y))
            .unzip()
    }

    /// Number of usable rows (see [`Trace::samples`]).
    pub fn len(&self) -> usize {
        self.wavelength
            .values
            .iter()
            .zip(&self.signal.values)
            .filter(|(x, y)| !x.is_nan() && !y.is_nan())
            .count()
    }
}
