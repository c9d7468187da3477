//! # Result Store
//!
//! A single slot holding the latest [`ResultTable`] as JSON. Writes go to a
//! temporary file in the same directory and are renamed over the slot, so a
//! failed write leaves the previous table readable.

use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;
use tracing::info;

use super::types::ResultTable;
use crate::error::PortfolioError;
use crate::error::Result;

/// Persistent home of the most recent simulation result.
#[derive(Clone, Debug)]
pub struct ResultStore {
  path: PathBuf,
}

impl ResultStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Replace the stored table with `table`.
  pub fn persist(&self, table: &ResultTable) -> Result<()> {
    let has_non_finite = (0..table.len())
      .filter_map(|i| table.row(i))
      .any(|row| row.iter().any(|v| !v.is_finite()));
    if has_non_finite {
      return Err(PortfolioError::persistence(
        &self.path,
        "result table contains non-finite values",
      ));
    }

    let bytes = serde_json::to_vec_pretty(table)
      .map_err(|e| PortfolioError::persistence(&self.path, e))?;

    let dir = match self.path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
      _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| PortfolioError::persistence(&dir, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| PortfolioError::persistence(&dir, e))?;
    tmp
      .write_all(&bytes)
      .and_then(|_| tmp.as_file().sync_all())
      .map_err(|e| PortfolioError::persistence(tmp.path(), e))?;
    tmp
      .persist(&self.path)
      .map_err(|e| PortfolioError::persistence(&self.path, e.error))?;

    info!(rows = table.len(), path = %self.path.display(), "persisted simulation result");
    Ok(())
  }

  /// Read the stored table.
  ///
  /// Returns [`PortfolioError::NoResult`] when no run has been persisted yet.
  pub fn load(&self) -> Result<ResultTable> {
    let bytes = match fs::read(&self.path) {
      Ok(b) => b,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(PortfolioError::NoResult(self.path.clone()));
      }
      Err(e) => return Err(PortfolioError::persistence(&self.path, e)),
    };
    let table: ResultTable =
      serde_json::from_slice(&bytes).map_err(|e| PortfolioError::persistence(&self.path, e))?;
    debug!(rows = table.len(), "loaded simulation result");
    Ok(table)
  }

  pub fn exists(&self) -> bool {
    self.path.is_file()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quant::portfolio::types::SimulationTrial;
  use crate::quant::portfolio::types::WeightVector;

  fn table(sharpes: &[f64]) -> ResultTable {
    let trials = sharpes
      .iter()
      .enumerate()
      .map(|(i, &s)| {
        let w0 = 1.0 / (i as f64 + 3.0);
        SimulationTrial {
          trial: i,
          weights: WeightVector::new(vec![w0, 1.0 - w0]).unwrap(),
          expected_return: 0.1 + 0.01 * i as f64,
          volatility: 0.17 + 0.003 * i as f64,
          sharpe: s,
        }
      })
      .collect();
    ResultTable::from_trials(vec!["AAPL".into(), "MSFT".into()], trials)
  }

  #[test]
  fn load_without_result_is_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("mc.json"));

    assert!(!store.exists());
    assert!(matches!(store.load(), Err(PortfolioError::NoResult(_))));
  }

  #[test]
  fn persist_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("nested").join("mc.json"));
    let original = table(&[0.4, 1.9, 0.4, 0.6667, 1.234567890123]);

    store.persist(&original).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, original);
    assert_eq!(loaded.columns(), original.columns());
  }

  #[test]
  fn persist_replaces_previous_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("mc.json"));

    store.persist(&table(&[1.0, 2.0, 3.0])).unwrap();
    let second = table(&[0.5]);
    store.persist(&second).unwrap();

    assert_eq!(store.load().unwrap(), second);
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
  }

  #[test]
  fn failed_persist_keeps_previous_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("mc.json"));
    let good = table(&[1.0, 0.5]);
    store.persist(&good).unwrap();

    let bad = table(&[f64::NAN]);
    assert!(matches!(
      store.persist(&bad),
      Err(PortfolioError::Persistence { .. })
    ));
    assert_eq!(store.load().unwrap(), good);
  }

  #[test]
  fn corrupt_artifact_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mc.json");
    fs::write(&path, b"{not json").unwrap();

    assert!(matches!(
      ResultStore::new(path).load(),
      Err(PortfolioError::Persistence { .. })
    ));
  }

  #[test]
  fn empty_table_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path().join("mc.json"));
    let empty = table(&[]);

    store.persist(&empty).unwrap();
    assert_eq!(store.load().unwrap(), empty);
  }
}
