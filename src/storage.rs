use crate::calculation::Calculation;
use crate::error::{CalcError, CalcResult};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent home of the calculation history.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> CalcResult<Vec<Calculation>>;

    fn save(&self, records: &[Calculation]) -> CalcResult<()>;

    /// Whether there is anything to load
    fn exists(&self) -> bool;

    /// Human-readable location for messages
    fn location(&self) -> String;
}

/// CSV file with an `operation,operand1,operand2,result,timestamp` header.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for CsvHistoryStore {
    fn load(&self) -> CalcResult<Vec<Calculation>> {
        if !self.path.exists() {
            return Err(CalcError::storage(format!(
                "History file not found: {}",
                self.path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<Calculation>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CalcError::storage(format!("Failed to load history: {}", e)))?;

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save(&self, records: &[Calculation]) -> CalcResult<()> {
        if records.is_empty() {
            return Err(CalcError::storage("No history to save"));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
