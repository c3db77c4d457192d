use std::path::Path;

use polars::prelude::{DataFrame, LazyCsvReader, LazyFileListReader, PlPath};
use tracing::info;

use crate::error::{CotlensResult, IoError};

/// Reads a headered CSV file into a frame.
///
/// Date-looking columns are parsed eagerly; anything else is left to the
/// table constructors, which coerce dates and numbers themselves.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_csv(path: impl AsRef<Path>) -> CotlensResult<DataFrame> {
    let path = path.as_ref();
    let uri = path.to_str().ok_or_else(|| {
        IoError::ReadFailed(format!(
            "Path contains invalid UTF-8 characters: {}",
            path.display()
        ))
    })?;

    if !path.exists() {
        return Err(IoError::ReadFailed(format!("File not found: {}", path.display())).into());
    }

    let df = LazyCsvReader::new(PlPath::new(uri))
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| IoError::ReadFailed(format!("Failed to read '{}': {e}", path.display())))?;

    info!(rows = df.height(), columns = df.width(), "Read CSV");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use polars::prelude::DataType;

    use super::*;
    use crate::error::CotlensError;

    #[test]
    fn test_read_csv_parses_dates() {
        let dir = std::env::temp_dir().join(format!("cotlens-csv-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broker.csv");
        fs::write(
            &path,
            "date,entity_name,total_short\n2023-01-06,Alpha,-5\n2023-01-13,Alpha,-3\n",
        )
        .unwrap();

        let df = read_csv(&path).expect("Failed to read CSV");
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, CotlensError::Io(IoError::ReadFailed(_))));
    }
}
