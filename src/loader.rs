//! CSV loading into a [`Table`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::{PipelineError, Result, Stage};
use crate::table::Table;

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Reads a headered CSV file into memory.
///
/// Files ending in `.gz` are decompressed on the fly.
///
/// # Errors
///
/// [`PipelineError::FileNotFound`] when `path` does not exist and
/// [`PipelineError::Parse`] when the content is not well-formed delimited
/// text (ragged rows, invalid UTF-8, no header row).
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::FileNotFound {
            stage: Stage::Load,
            path: path.to_path_buf(),
        },
        _ => PipelineError::io(Stage::Load, path, e),
    })?;

    let reader: Box<dyn Read> = if is_gzip(path) {
        debug!("Decompressing gzip input");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let table = read_table(reader, path)?;
    info!(rows = table.height(), columns = table.width(), "Loaded table");
    Ok(table)
}

/// Parses CSV text from any reader. `origin` is only used in error messages.
pub fn read_table<R: Read>(reader: R, origin: &Path) -> Result<Table> {
    let parse_error = |message: String, source: Option<csv::Error>| PipelineError::Parse {
        stage: Stage::Load,
        path: origin.to_path_buf(),
        message,
        source,
    };

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| parse_error(e.to_string(), Some(e)))?
        .clone();

    if headers.is_empty() {
        return Err(parse_error("no header row".to_string(), None));
    }

    let columns: Vec<String> = headers.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| parse_error(e.to_string(), Some(e)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::table::ColumnKind;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_infers_kinds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(
            &path,
            "Year,Carrier_Name,Distance\n2023,Acme,10.5\n2024,Globex,7\n",
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.columns(), &["Year", "Carrier_Name", "Distance"]);
        assert_eq!(
            table.kinds(),
            &[ColumnKind::Integer, ColumnKind::Text, ColumnKind::Float]
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_table(&dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.stage(), Stage::Load);
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        let err = load_table(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let err = load_table(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_load_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.csv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"a,b\n1,x\n").unwrap();
        encoder.finish().unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.rows()[0], vec!["1", "x"]);
    }
}
