/// Analysis products derived from persisted crawl output.
///
/// Submodules:
/// - `trend` — statistics, linear trends, decadal averages, tidal ranges.
/// - `report` — plain-text summary report.
/// - `decade_cycle` — polar decade-cycle projection and animation plan.

pub mod decade_cycle;
pub mod report;
pub mod trend;

use std::io;
use std::path::{Path, PathBuf};

use crate::model::{CrawlError, Dataset};
use crate::persist::{latest_full_csv, read_full_csv};

/// Loads the newest full CSV for `station_code` from `dir`.
pub fn load_latest(dir: &Path, station_code: &str) -> Result<(PathBuf, Dataset), CrawlError> {
    let path = latest_full_csv(dir, station_code)?.ok_or_else(|| {
        CrawlError::io(
            dir,
            io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "no HKO_{}_SeaLevel_Data_*.csv found, run the crawler first",
                    station_code
                ),
            ),
        )
    })?;
    let dataset = read_full_csv(&path)?;
    Ok((path, dataset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_latest_without_data_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match load_latest(dir.path(), "QUB") {
            Err(CrawlError::Io { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_latest_reads_newest_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("HKO_QUB_SeaLevel_Data_20240101_000000.csv"),
            "Year,Mean_Sea_Level_m\n1954,1.28\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("HKO_QUB_SeaLevel_Data_20250101_000000.csv"),
            "Year,Mean_Sea_Level_m\n1954,1.28\n2024,1.51\n",
        )
        .unwrap();

        let (path, dataset) = load_latest(dir.path(), "QUB").unwrap();
        assert!(path.ends_with("HKO_QUB_SeaLevel_Data_20250101_000000.csv"));
        assert_eq!(dataset.len(), 2);
    }
}
