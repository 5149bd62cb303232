//! CSV market data loading.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use crate::model::Bar;

/// Loads OHLCV bars from a headered CSV file.
///
/// Expected columns: `timestamp` (epoch milliseconds), `open`, `high`,
/// `low`, `close`, and optionally `volume`. Timestamps must be strictly
/// ascending; a violation aborts the load rather than producing a run
/// over silently reordered data.
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open bar data {}", path.display()))?;

    let mut bars: Vec<Bar> = Vec::new();
    for (index, row) in reader.deserialize::<Bar>().enumerate() {
        // Header occupies line 1, so data row n sits on line n + 1.
        let line = index + 2;
        let bar =
            row.with_context(|| format!("Bad bar on line {} of {}", line, path.display()))?;
        if let Some(prev) = bars.last() {
            if bar.timestamp <= prev.timestamp {
                bail!(
                    "Bar timestamps must be strictly ascending: line {} has {} after {}",
                    line,
                    bar.timestamp,
                    prev.timestamp
                );
            }
        }
        bars.push(bar);
    }

    info!("[DATA] Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_rows() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             1000,100.0,105.0,99.0,104.0,12.5\n\
             2000,104.0,110.0,103.0,108.0,7.0\n",
        );
        let bars = load_bars(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1000);
        assert_eq!(bars[0].high, 105.0);
        assert_eq!(bars[1].volume, 7.0);
    }

    #[test]
    fn test_volume_column_optional() {
        let file = write_csv(
            "timestamp,open,high,low,close\n\
             1000,100.0,105.0,99.0,104.0\n",
        );
        let bars = load_bars(file.path()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn test_header_only_gives_empty_sequence() {
        let file = write_csv("timestamp,open,high,low,close,volume\n");
        let bars = load_bars(file.path()).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn test_non_ascending_timestamps_rejected() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2000,100.0,105.0,99.0,104.0,1.0\n\
             2000,104.0,110.0,103.0,108.0,1.0\n",
        );
        let err = load_bars(file.path()).unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_malformed_row_names_line() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             1000,100.0,105.0,99.0,104.0,1.0\n\
             2000,not_a_number,110.0,103.0,108.0,1.0\n",
        );
        let err = load_bars(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_bars(Path::new("/nonexistent/bars.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
