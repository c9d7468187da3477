//! # Export
//!
//! Spreadsheet-compatible CSV export of the ranked result table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tracing::info;

use crate::error::Result;
use crate::quant::portfolio::ResultTable;

/// Index column holding the zero-based draw number of each trial.
pub const INDEX_COLUMN: &str = "Trial";

/// Write the table as CSV: index column, one weight column per ticker, then
/// `Return`, `Volatility` and `Sharpe`, in ranking order.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
  let mut wtr = WriterBuilder::new().from_writer(writer);

  let mut header = vec![INDEX_COLUMN.to_string()];
  header.extend(table.columns());
  wtr.write_record(&header)?;

  for (i, trial) in table.trials().iter().enumerate() {
    let mut record = vec![trial.trial.to_string()];
    if let Some(row) = table.row(i) {
      record.extend(row.iter().map(|v| v.to_string()));
    }
    wtr.write_record(&record)?;
  }

  wtr.flush()?;
  Ok(())
}

/// Export the first `rows` rows (all rows when `None`) to `path`.
pub fn export_top_n(table: &ResultTable, path: impl AsRef<Path>, rows: Option<usize>) -> Result<()> {
  let path = path.as_ref();
  let selected = match rows {
    Some(n) => table.top_n(n),
    None => table.clone(),
  };
  let file = File::create(path)?;
  write_csv(&selected, file)?;
  info!(rows = selected.len(), path = %path.display(), "exported results");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quant::portfolio::SimulationTrial;
  use crate::quant::portfolio::WeightVector;

  fn table() -> ResultTable {
    let trials = (0..4)
      .map(|i| SimulationTrial {
        trial: i,
        weights: WeightVector::new(vec![0.25, 0.75]).unwrap(),
        expected_return: 0.1,
        volatility: 0.2,
        sharpe: i as f64,
      })
      .collect();
    ResultTable::from_trials(vec!["AAPL".into(), "MSFT".into()], trials)
  }

  #[test]
  fn csv_has_index_and_named_columns() {
    let mut buf = Vec::new();
    write_csv(&table(), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Trial,AAPL,MSFT,Return,Volatility,Sharpe");
    assert_eq!(lines[1], "3,0.25,0.75,0.1,0.2,3");
    assert_eq!(lines.len(), 5);
  }

  #[test]
  fn export_limits_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MCSimResults.csv");

    export_top_n(&table(), &path, Some(2)).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);

    export_top_n(&table(), &path, None).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 5);
  }
}
