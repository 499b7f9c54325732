use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{Column, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transient-absorbance table from a CSV file.
///
/// Layout: one header row, then numeric rows. Columns alternate
/// `wavelength, signal, wavelength, signal, ...` and every signal header
/// carries its delay time after a comma (`"Signal, 5ps"`).
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    read_csv(file).with_context(|| format!("parsing {}", path.display()))
}

/// Parse CSV content from any reader.
///
/// Empty cells (and rows shorter than the header) become `NaN` so that
/// traces of different lengths can share one file. Any other non-numeric
/// cell is an error naming its row and column.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;

        if record.len() > headers.len() {
            bail!(
                "CSV row {}: {} fields but only {} headers",
                row_no + 1,
                record.len(),
                headers.len()
            );
        }

        for (col_idx, column) in values.iter_mut().enumerate() {
            let cell = record.get(col_idx).unwrap_or("");
            column.push(parse_cell(cell, row_no + 1, &headers[col_idx])?);
        }
    }

    // Drop the NaN tail shared by every column (trailing blank lines).
    let height = values
        .iter()
        .map(|col| col.iter().rposition(|v| !v.is_nan()).map_or(0, |i| i + 1))
        .max()
        .unwrap_or(0);
    for column in &mut values {
        column.truncate(height);
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();

    Ok(Dataset::new(columns))
}

fn parse_cell(cell: &str, row: usize, col: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .with_context(|| format!("Row {row}, column {col:?}: '{cell}' is not a number"))
}
