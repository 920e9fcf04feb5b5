use crate::analyzer::ChartData;
use crate::model::{MarketTable, StorageError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MARKET_DATA_FILE: &str = "market_data.json";

/// Writes pipeline outputs as JSON files under one directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_market_data(&self, table: &MarketTable) -> Result<PathBuf, StorageError> {
        self.write_json(MARKET_DATA_FILE, table)
    }

    /// Saved as `<title>.json`.
    pub fn save_chart(&self, chart: &ChartData) -> Result<PathBuf, StorageError> {
        self.write_json(&format!("{}.json", chart.title), chart)
    }

    pub fn load_market_data(&self) -> Result<MarketTable, StorageError> {
        let content = fs::read_to_string(self.root.join(MARKET_DATA_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        info!("Saved artifact: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarketRecord;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nse-market-data-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_market_data_round_trip_on_disk() {
        let dir = scratch_dir("market");
        let store = ArtifactStore::new(dir.join("nested"));
        let table = MarketTable {
            records: vec![
                MarketRecord { company: "B".into(), change: -1.0, fields: vec![("symbol".into(), Some("B".into()))] },
                MarketRecord { company: "A".into(), change: 2.5, fields: vec![("symbol".into(), None)] },
            ],
        };

        let path = store.save_market_data(&table).unwrap();
        assert!(path.ends_with(MARKET_DATA_FILE));
        assert!(path.starts_with(store.root()));
        assert_eq!(store.load_market_data().unwrap(), table);

        fs::remove_dir_all(&dir).unwrap();
    }
}
