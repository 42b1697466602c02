//! Output persistence for the enriched table and the delay report.
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! failed run never leaves a partial file under the final path.

use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::analyzers::types::DelayReport;
use crate::error::{PipelineError, Result, Stage};
use crate::loader::is_gzip;
use crate::table::Table;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &DelayReport) {
    debug!("{:#?}", report);
}

/// Mode for a fresh output file; the process umask still applies.
#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

/// Creates the parent directory of `path` and a temp file beside it.
fn staging_file(path: &Path, stage: Stage) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(stage, parent, e))?;

    let mut builder = Builder::new();
    if let Some(permissions) = default_permissions() {
        builder.permissions(permissions);
    }
    builder
        .tempfile_in(parent)
        .map_err(|e| PipelineError::io(stage, parent, e))
}

/// Renames the staged file onto `path`, keeping the permissions of any file
/// it replaces.
fn commit(staged: NamedTempFile, path: &Path, stage: Stage) -> Result<()> {
    if let Ok(existing) = std::fs::metadata(path) {
        staged
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| PipelineError::io(stage, path, e))?;
    }
    staged
        .persist(path)
        .map_err(|e| PipelineError::io(stage, path, e.error))?;
    Ok(())
}

fn write_csv<W: Write>(sink: W, table: &Table) -> csv::Result<W> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Writes `table` as a headered CSV to `path`, without any row index.
///
/// Parent directories are created as needed. Paths ending in `.gz` are
/// gzip-compressed.
#[tracing::instrument(skip(table), fields(path = %path.display(), rows = table.height()))]
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let staged = staging_file(path, Stage::Write)?;
    let to_io = |e: csv::Error| PipelineError::io(Stage::Write, path, std::io::Error::other(e));

    let staged = if is_gzip(path) {
        let encoder = GzEncoder::new(staged, Compression::default());
        write_csv(encoder, table)
            .map_err(to_io)?
            .finish()
            .map_err(|e| PipelineError::io(Stage::Write, path, e))?
    } else {
        write_csv(staged, table).map_err(to_io)?
    };

    staged
        .as_file()
        .sync_all()
        .map_err(|e| PipelineError::io(Stage::Write, path, e))?;
    commit(staged, path, Stage::Write)?;

    info!(columns = table.width(), "Wrote table");
    Ok(())
}

/// Writes the report as pretty-printed JSON to `path`.
#[tracing::instrument(skip(report), fields(path = %path.display()))]
pub fn write_report_json(path: &Path, report: &DelayReport) -> Result<()> {
    let mut staged = staging_file(path, Stage::Report)?;

    serde_json::to_writer_pretty(&mut staged, report)
        .map_err(|e| PipelineError::io(Stage::Report, path, e.into()))?;
    staged
        .write_all(b"\n")
        .map_err(|e| PipelineError::io(Stage::Report, path, e))?;
    commit(staged, path, Stage::Report)?;

    info!("Wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loader::load_table;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Table {
        Table::new(
            vec!["a".to_string(), "note".to_string()],
            vec![
                vec!["1".to_string(), "plain".to_string()],
                vec!["2".to_string(), "has, comma".to_string()],
            ],
        )
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/processed/out.csv");

        write_table(&path, &sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a,note\n1,plain\n2,\"has, comma\"\n");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        write_table(&path, &sample()).unwrap();
        write_table(&path, &sample()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_header_only_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let table = Table::new(vec!["a".to_string(), "b".to_string()], Vec::new());

        write_table(&path, &table).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
    }

    #[test]
    fn test_gzip_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv.gz");

        write_table(&path, &sample()).unwrap();
        let back = load_table(&path).unwrap();
        assert_eq!(back, sample());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_output_has_regular_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let table_path = dir.path().join("out.csv");
        let report_path = dir.path().join("report.json");
        let plain_path = dir.path().join("plain.txt");

        write_table(&table_path, &sample()).unwrap();
        fs::write(&plain_path, "x").unwrap();

        fn mode(p: &Path) -> u32 {
            fs::metadata(p).unwrap().permissions().mode() & 0o777
        }
        assert_eq!(mode(&table_path), mode(&plain_path));

        let e = crate::features::derive_features(
            Table::new(
                ["Year", "Month", "DayofMonth", "Shipment_Delay"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                vec![["2023", "1", "30", "3"].iter().map(|c| c.to_string()).collect()],
            ),
            crate::features::InvalidRowPolicy::Fail,
        )
        .unwrap();
        let report = crate::analyzers::report::build_report(&e, &[]).unwrap();
        write_report_json(&report_path, &report).unwrap();
        assert_eq!(mode(&report_path), mode(&plain_path));
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_table(&path, &sample()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert!(fs::read_to_string(&path).unwrap().starts_with("a,note"));
    }

    #[test]
    fn test_write_into_file_as_directory_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = write_table(&blocker.join("out.csv"), &sample()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.stage(), Stage::Write);
    }
}
